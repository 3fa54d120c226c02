//! WFS 1.0.0 capabilities
//!
//! Service metadata lives in `wfs:Service`, keywords are a single
//! comma-separated `wfs:Keywords` element and extents are the four attributes
//! of `wfs:LatLongBoundingBox`.

use super::{for_each_feature_type, normalize_keywords, TypeTag, VersionSchema};
use crate::error::Result;
use crate::mapper::{MappedObject, MappedValue};
use crate::namespaces::NamespaceBindings;
use crate::schema::{FieldRule, SchemaDefinition};
use crate::versions::ProtocolVersion;

pub(super) fn schema() -> Result<VersionSchema> {
    let ns = NamespaceBindings::new()
        .with("wfs", "http://www.opengis.net/wfs")
        .with("ogc", "http://www.opengis.net/ogc");

    let schema = SchemaDefinition::builder(ns)
        .rules(
            TypeTag::Capabilities,
            vec![
                FieldRule::object("./wfs:Service", "service", TypeTag::Service),
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
                FieldRule::text("../@version", "serviceTypeVersion"),
                FieldRule::text("./wfs:Name", "name"),
                FieldRule::text("./wfs:Title", "title"),
                FieldRule::text("./wfs:Abstract", "abstract"),
                FieldRule::text("./wfs:Keywords", "keywords"),
                FieldRule::text("./wfs:OnlineResource", "location"),
                FieldRule::text("./wfs:Fees", "fees"),
                FieldRule::text("./wfs:AccessConstraints", "accessConstraints"),
            ],
        )
        .rules(
            TypeTag::FeatureType,
            vec![
                FieldRule::text("./wfs:Name", "name"),
                FieldRule::text("./wfs:Title", "title"),
                FieldRule::text("./wfs:Abstract", "abstract"),
                FieldRule::text("./wfs:Keywords", "keywords"),
                FieldRule::text("./wfs:SRS", "defaultCrs"),
                FieldRule::object(
                    "./wfs:LatLongBoundingBox",
                    "wgs84BoundingBox",
                    TypeTag::LatLongBoundingBox,
                ),
            ],
        )
        .rules(
            TypeTag::LatLongBoundingBox,
            vec![
                FieldRule::text("./@minx", "minx"),
                FieldRule::text("./@miny", "miny"),
                FieldRule::text("./@maxx", "maxx"),
                FieldRule::text("./@maxy", "maxy"),
            ],
        )
        .build()?;

    VersionSchema::new(ProtocolVersion::new(1, 0, 0), schema, normalize)
}

fn normalize(capabilities: &mut MappedObject) {
    normalize_keywords(capabilities);
    for_each_feature_type(capabilities, fold_lat_long_box);
}

/// Rewrite `{minx, miny, maxx, maxy}` as OWS-style corners; incomplete boxes are dropped
fn fold_lat_long_box(feature_type: &mut MappedObject) {
    let Some(MappedValue::Object(attrs)) = feature_type.shift_remove("wgs84BoundingBox") else {
        return;
    };

    let get = |key: &str| attrs.get(key).and_then(MappedValue::as_text);
    if let (Some(minx), Some(miny), Some(maxx), Some(maxy)) =
        (get("minx"), get("miny"), get("maxx"), get("maxy"))
    {
        let mut corners = MappedObject::new();
        corners.insert(
            "lowerCorner".to_string(),
            MappedValue::Text(format!("{} {}", minx, miny)),
        );
        corners.insert(
            "upperCorner".to_string(),
            MappedValue::Text(format!("{} {}", maxx, maxy)),
        );
        feature_type.insert("wgs84BoundingBox".to_string(), MappedValue::Object(corners));
    }
}
