//! WFS 2.0.0 capabilities (OWS Common 1.1)

use super::{normalize_keywords, TypeTag, VersionSchema};
use crate::error::Result;
use crate::namespaces::NamespaceBindings;
use crate::schema::{FieldRule, SchemaDefinition};
use crate::versions::ProtocolVersion;

pub(super) fn schema() -> Result<VersionSchema> {
    let ns = NamespaceBindings::new()
        .with("wfs", "http://www.opengis.net/wfs/2.0")
        .with("fes", "http://www.opengis.net/fes/2.0")
        .with("ows", "http://www.opengis.net/ows/1.1");

    let schema = SchemaDefinition::builder(ns)
        .rules(
            TypeTag::Capabilities,
            vec![
                FieldRule::object("./ows:ServiceIdentification", "service", TypeTag::Service),
                FieldRule::objects(
                    "./wfs:FeatureTypeList/wfs:FeatureType",
                    "featureTypes",
                    TypeTag::FeatureType,
                ),
            ],
        )
        .rules(
            TypeTag::Service,
            vec![
                FieldRule::text("./ows:Title", "title"),
                FieldRule::text("./ows:Abstract", "abstract"),
                FieldRule::texts("./ows:Keywords/ows:Keyword", "keywords"),
                FieldRule::text("./ows:ServiceType", "serviceType"),
                FieldRule::text("./ows:ServiceTypeVersion", "serviceTypeVersion"),
                FieldRule::text("./ows:Fees", "fees"),
                FieldRule::text("./ows:AccessConstraints", "accessConstraints"),
            ],
        )
        .rules(
            TypeTag::FeatureType,
            vec![
                FieldRule::text("./wfs:Name", "name"),
                FieldRule::text("./wfs:Title", "title"),
                FieldRule::text("./wfs:Abstract", "abstract"),
                FieldRule::texts("./ows:Keywords/ows:Keyword", "keywords"),
                FieldRule::text("./wfs:DefaultCRS", "defaultCrs"),
                FieldRule::texts("./wfs:OtherCRS", "otherCrs"),
                FieldRule::object("./ows:WGS84BoundingBox", "wgs84BoundingBox", TypeTag::BoundingBox),
            ],
        )
        .rules(
            TypeTag::BoundingBox,
            vec![
                FieldRule::text("./ows:LowerCorner", "lowerCorner"),
                FieldRule::text("./ows:UpperCorner", "upperCorner"),
            ],
        )
        .build()?;

    VersionSchema::new(ProtocolVersion::new(2, 0, 0), schema, normalize_keywords)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::documents::XmlDocument;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_decode_keywords_match_comma_joined_form() {
        let xml = r#"<wfs:WFS_Capabilities version="2.0.0"
    xmlns:wfs="http://www.opengis.net/wfs/2.0" xmlns:ows="http://www.opengis.net/ows/1.1">
  <wfs:FeatureTypeList>
    <wfs:FeatureType>
      <wfs:Name>ns:rivers</wfs:Name>
      <ows:Keywords><ows:Keyword>alpha</ows:Keyword><ows:Keyword>beta</ows:Keyword><ows:Keyword>gamma</ows:Keyword></ows:Keywords>
    </wfs:FeatureType>
  </wfs:FeatureTypeList>
</wfs:WFS_Capabilities>"#;
        let doc = XmlDocument::parse(xml).unwrap();
        let result = schema().unwrap().decode(doc.root()).unwrap();

        assert!(result.service.is_none());
        assert_eq!(
            result.feature_types[0].keywords,
            Some(vec!["alpha".to_string(), "beta".to_string(), "gamma".to_string()])
        );
    }

    #[test]
    fn test_wrong_namespace_is_not_matched() {
        // 1.1.0 namespaces do not satisfy the 2.0.0 table
        let xml = r#"<wfs:WFS_Capabilities version="2.0.0" xmlns:wfs="http://www.opengis.net/wfs">
  <wfs:FeatureTypeList><wfs:FeatureType><wfs:Name>x</wfs:Name></wfs:FeatureType></wfs:FeatureTypeList>
</wfs:WFS_Capabilities>"#;
        let doc = XmlDocument::parse(xml).unwrap();
        let result = schema().unwrap().decode(doc.root()).unwrap();
        assert!(result.feature_types.is_empty());
    }
}
