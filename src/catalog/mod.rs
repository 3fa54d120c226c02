//! Version schema catalog
//!
//! One [`VersionSchema`] per supported WFS version: namespace bindings, the
//! field-rule table, and a normalization pass reconciling representational
//! differences the generic mapper cannot express (comma-joined keywords,
//! attribute-style bounding boxes).
//!
//! The [`VersionRegistry`] is a plain immutable value. Build it once (usually
//! with [`VersionRegistry::standard`]) and share it between clients.

mod v1_0_0;
mod v1_1_0;
mod v2_0_0;

use std::fmt;

use crate::capabilities::CapabilitiesResult;
use crate::documents::XmlNode;
use crate::error::{Error, Result};
use crate::mapper::{DocumentMapper, MappedObject, MappedValue};
use crate::schema::SchemaDefinition;
use crate::versions::{ProtocolVersion, VersionSet};

/// Local name of the capabilities root element in every WFS version
pub const CAPABILITIES_ROOT: &str = "WFS_Capabilities";

/// Value of the `service` query parameter
pub const SERVICE_ID: &str = "WFS";

/// Object types of the capabilities tables
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeTag {
    /// Document root
    Capabilities,
    /// Service identification
    Service,
    /// One feature type entry
    FeatureType,
    /// OWS `WGS84BoundingBox`
    BoundingBox,
    /// WFS 1.0.0 `LatLongBoundingBox`
    LatLongBoundingBox,
}

/// Post-mapping normalization step
pub type Normalizer = fn(&mut MappedObject);

/// Schema and normalization for one protocol version
#[derive(Clone)]
pub struct VersionSchema {
    version: ProtocolVersion,
    schema: SchemaDefinition<TypeTag>,
    normalize: Normalizer,
}

impl fmt::Debug for VersionSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VersionSchema")
            .field("version", &self.version)
            .field("schema", &self.schema)
            .finish_non_exhaustive()
    }
}

impl VersionSchema {
    /// Bundle a version with its table and normalization pass
    pub fn new(
        version: ProtocolVersion,
        schema: SchemaDefinition<TypeTag>,
        normalize: Normalizer,
    ) -> Result<Self> {
        if !schema.contains(TypeTag::Capabilities) {
            return Err(Error::Config(format!(
                "Schema for version {} has no capabilities root type",
                version
            )));
        }
        Ok(Self {
            version,
            schema,
            normalize,
        })
    }

    /// Protocol version
    pub fn version(&self) -> &ProtocolVersion {
        &self.version
    }

    /// Field-rule table
    pub fn schema(&self) -> &SchemaDefinition<TypeTag> {
        &self.schema
    }

    /// Map and normalize a capabilities root element, without converting to types
    pub fn map(&self, root: XmlNode<'_, '_>) -> Option<MappedObject> {
        let mut mapped = DocumentMapper::new(&self.schema).build_object(Some(root), TypeTag::Capabilities)?;
        (self.normalize)(&mut mapped);
        if mapped.is_empty() {
            None
        } else {
            Some(mapped)
        }
    }

    /// Decode a capabilities root element
    pub fn decode(&self, root: XmlNode<'_, '_>) -> Result<CapabilitiesResult> {
        CapabilitiesResult::from_mapped(self.map(root))
    }
}

/// Supported versions, highest first, each bound to one schema
#[derive(Debug, Clone)]
pub struct VersionRegistry {
    versions: VersionSet,
    schemas: Vec<VersionSchema>,
}

impl VersionRegistry {
    /// Build a registry from schemas listed highest version first
    pub fn new(schemas: Vec<VersionSchema>) -> Result<Self> {
        let versions = VersionSet::new(schemas.iter().map(|s| s.version.clone()).collect())?;
        Ok(Self { versions, schemas })
    }

    /// WFS 2.0.0, 1.1.0 and 1.0.0
    pub fn standard() -> Result<Self> {
        Self::new(vec![v2_0_0::schema()?, v1_1_0::schema()?, v1_0_0::schema()?])
    }

    /// The supported versions
    pub fn versions(&self) -> &VersionSet {
        &self.versions
    }

    /// Schema of a version
    pub fn get(&self, version: &ProtocolVersion) -> Option<&VersionSchema> {
        self.schemas.iter().find(|s| &s.version == version)
    }

    /// Resolve a caller-pinned version string
    pub fn resolve(&self, version: &str) -> Result<ProtocolVersion> {
        ProtocolVersion::parse(version)
            .and_then(|v| self.versions.get(&v).cloned())
            .ok_or_else(|| Error::UnsupportedVersion(version.to_string()))
    }
}

/// Split comma-joined keywords, trim, drop empties
///
/// Repeated-element keywords arrive as a list and are only trimmed.
pub(crate) fn normalize_keyword_value(value: MappedValue) -> Option<MappedValue> {
    fn clean<'a>(parts: impl Iterator<Item = &'a str>) -> Vec<MappedValue> {
        parts
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .map(|k| MappedValue::Text(k.to_string()))
            .collect()
    }

    let keywords = match &value {
        MappedValue::Text(joined) => clean(joined.split(',')),
        MappedValue::List(items) => clean(items.iter().filter_map(MappedValue::as_text)),
        MappedValue::Object(_) => Vec::new(),
    };

    if keywords.is_empty() {
        None
    } else {
        Some(MappedValue::List(keywords))
    }
}

fn normalize_keywords_in(object: &mut MappedObject) {
    if let Some(value) = object.shift_remove("keywords") {
        if let Some(keywords) = normalize_keyword_value(value) {
            object.insert("keywords".to_string(), keywords);
        }
    }
}

/// Normalize keywords of the service and of every feature type
///
/// Objects emptied by the pass are removed, keeping absence contagious.
pub(crate) fn normalize_keywords(capabilities: &mut MappedObject) {
    if let Some(service) = capabilities.get_mut("service").and_then(MappedValue::as_object_mut) {
        normalize_keywords_in(service);
        if service.is_empty() {
            capabilities.shift_remove("service");
        }
    }

    for_each_feature_type(capabilities, normalize_keywords_in);
}

/// Apply `f` to every feature type object, dropping those left empty
pub(crate) fn for_each_feature_type(capabilities: &mut MappedObject, f: impl Fn(&mut MappedObject)) {
    let Some(MappedValue::List(items)) = capabilities.get_mut("featureTypes") else {
        return;
    };

    for item in items.iter_mut() {
        if let Some(object) = item.as_object_mut() {
            f(object);
        }
    }
    items.retain(|item| item.as_object().map_or(true, |o| !o.is_empty()));

    if items.is_empty() {
        capabilities.shift_remove("featureTypes");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::documents::XmlDocument;
    use pretty_assertions::assert_eq;

    fn texts(items: &[&str]) -> MappedValue {
        MappedValue::List(items.iter().map(|s| MappedValue::Text(s.to_string())).collect())
    }

    #[test]
    fn test_comma_joined_keywords() {
        let value = MappedValue::Text("alpha, beta ,gamma".to_string());
        assert_eq!(
            normalize_keyword_value(value),
            Some(texts(&["alpha", "beta", "gamma"]))
        );
    }

    #[test]
    fn test_repeated_keywords() {
        assert_eq!(
            normalize_keyword_value(texts(&["alpha", " beta", "gamma "])),
            Some(texts(&["alpha", "beta", "gamma"]))
        );
    }

    #[test]
    fn test_blank_keywords_are_absent() {
        assert_eq!(normalize_keyword_value(MappedValue::Text(" , ,".to_string())), None);
    }

    #[test]
    fn test_service_with_only_blank_keywords_collapses() {
        let mut service = MappedObject::new();
        service.insert("keywords".into(), MappedValue::Text(",".into()));
        let mut capabilities = MappedObject::new();
        capabilities.insert("service".into(), MappedValue::Object(service));

        normalize_keywords(&mut capabilities);
        assert!(capabilities.is_empty());
    }

    #[test]
    fn test_standard_registry() {
        let registry = VersionRegistry::standard().unwrap();
        let versions: Vec<String> = registry.versions().iter().map(|v| v.to_string()).collect();
        assert_eq!(versions, vec!["2.0.0", "1.1.0", "1.0.0"]);
        for version in registry.versions().iter() {
            assert_eq!(registry.get(version).unwrap().version(), version);
        }
    }

    #[test]
    fn test_resolve_pinned_version() {
        let registry = VersionRegistry::standard().unwrap();
        assert_eq!(registry.resolve("1.1.0").unwrap().to_string(), "1.1.0");
        assert!(matches!(registry.resolve("3.0.0"), Err(Error::UnsupportedVersion(_))));
        assert!(matches!(registry.resolve("1.1"), Err(Error::UnsupportedVersion(_))));
        assert_eq!(registry.resolve("1.1.0+local").unwrap().to_string(), "1.1.0");
    }

    #[test]
    fn test_registry_rejects_unordered_schemas() {
        let result = VersionRegistry::new(vec![
            v1_0_0::schema().unwrap(),
            v2_0_0::schema().unwrap(),
        ]);
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_empty_document_decodes_to_empty_result() {
        let registry = VersionRegistry::standard().unwrap();
        let doc = XmlDocument::parse(r#"<WFS_Capabilities version="2.0.0"/>"#).unwrap();
        let schema = registry.get(&"2.0.0".parse().unwrap()).unwrap();
        let result = schema.decode(doc.root()).unwrap();
        assert_eq!(result, CapabilitiesResult::default());
    }
}
