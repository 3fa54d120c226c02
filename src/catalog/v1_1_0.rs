//! WFS 1.1.0 capabilities (OWS Common 1.0)

use super::{normalize_keywords, TypeTag, VersionSchema};
use crate::error::Result;
use crate::namespaces::NamespaceBindings;
use crate::schema::{FieldRule, SchemaDefinition};
use crate::versions::ProtocolVersion;

pub(super) fn schema() -> Result<VersionSchema> {
    let ns = NamespaceBindings::new()
        .with("wfs", "http://www.opengis.net/wfs")
        .with("ogc", "http://www.opengis.net/ogc")
        .with("ows", "http://www.opengis.net/ows");

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
                FieldRule::text("./wfs:DefaultSRS", "defaultCrs"),
                FieldRule::texts("./wfs:OtherSRS", "otherCrs"),
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

    VersionSchema::new(ProtocolVersion::new(1, 1, 0), schema, normalize_keywords)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::documents::XmlDocument;

    const CAPABILITIES: &str = r#"<wfs:WFS_Capabilities version="1.1.0"
    xmlns:wfs="http://www.opengis.net/wfs"
    xmlns:ows="http://www.opengis.net/ows">
  <ows:ServiceIdentification>
    <ows:Title>Example 1.1</ows:Title>
    <ows:Keywords>
      <ows:Keyword>alpha</ows:Keyword>
      <ows:Keyword> beta </ows:Keyword>
      <ows:Keyword>gamma</ows:Keyword>
    </ows:Keywords>
    <ows:ServiceType>WFS</ows:ServiceType>
    <ows:ServiceTypeVersion>1.1.0</ows:ServiceTypeVersion>
  </ows:ServiceIdentification>
  <wfs:FeatureTypeList>
    <wfs:FeatureType>
      <wfs:Name>topp:states</wfs:Name>
      <wfs:DefaultSRS>urn:ogc:def:crs:EPSG::4326</wfs:DefaultSRS>
      <wfs:OtherSRS>urn:ogc:def:crs:EPSG::3857</wfs:OtherSRS>
      <wfs:OtherSRS>urn:ogc:def:crs:EPSG::900913</wfs:OtherSRS>
      <ows:WGS84BoundingBox>
        <ows:LowerCorner>-124.7 24.9</ows:LowerCorner>
        <ows:UpperCorner>-66.9 49.3</ows:UpperCorner>
      </ows:WGS84BoundingBox>
    </wfs:FeatureType>
  </wfs:FeatureTypeList>
</wfs:WFS_Capabilities>"#;

    #[test]
    fn test_decode() {
        let doc = XmlDocument::parse(CAPABILITIES).unwrap();
        let result = schema().unwrap().decode(doc.root()).unwrap();

        let service = result.service.unwrap();
        assert_eq!(service.title.as_deref(), Some("Example 1.1"));
        assert_eq!(service.service_type.as_deref(), Some("WFS"));
        assert_eq!(
            service.keywords,
            Some(vec!["alpha".to_string(), "beta".to_string(), "gamma".to_string()])
        );

        let states = &result.feature_types[0];
        assert_eq!(states.default_crs.as_deref(), Some("urn:ogc:def:crs:EPSG::4326"));
        assert_eq!(states.other_crs.as_ref().map(Vec::len), Some(2));
        let bbox = states.wgs84_bounding_box.as_ref().unwrap();
        assert_eq!(bbox.upper_corner.as_deref(), Some("-66.9 49.3"));
    }
}
