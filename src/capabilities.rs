//! Normalized capabilities result
//!
//! Every protocol version decodes into the same typed structures. Field names
//! serialize in camelCase, matching the destination keys of the field rules.

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::mapper::MappedObject;

/// Decoded capabilities document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CapabilitiesResult {
    /// Service identification, absent when the document has none
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service: Option<ServiceInfo>,
    /// Feature types in document order
    pub feature_types: Vec<FeatureTypeInfo>,
}

impl CapabilitiesResult {
    /// Convert a normalized value tree
    pub fn from_mapped(mapped: Option<MappedObject>) -> Result<Self> {
        match mapped {
            Some(object) => Ok(serde_json::from_value(serde_json::to_value(object)?)?),
            None => Ok(Self::default()),
        }
    }
}

/// Service metadata
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ServiceInfo {
    /// Service name (1.0.0 only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Human readable title
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Description
    #[serde(rename = "abstract", skip_serializing_if = "Option::is_none")]
    pub abstract_text: Option<String>,
    /// Trimmed, non-empty keywords
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keywords: Option<Vec<String>>,
    /// Service type, e.g. `WFS`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service_type: Option<String>,
    /// Protocol version the document was produced for
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service_type_version: Option<String>,
    /// Online resource (1.0.0 only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    /// Fees
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fees: Option<String>,
    /// Access constraints
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access_constraints: Option<String>,
}

/// One feature type
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FeatureTypeInfo {
    /// Qualified type name, e.g. `topp:states`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Human readable title
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Description
    #[serde(rename = "abstract", skip_serializing_if = "Option::is_none")]
    pub abstract_text: Option<String>,
    /// Trimmed, non-empty keywords
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keywords: Option<Vec<String>>,
    /// Default coordinate reference system
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_crs: Option<String>,
    /// Additional coordinate reference systems
    #[serde(skip_serializing_if = "Option::is_none")]
    pub other_crs: Option<Vec<String>>,
    /// Extent in WGS84 longitude/latitude
    #[serde(rename = "wgs84BoundingBox", skip_serializing_if = "Option::is_none")]
    pub wgs84_bounding_box: Option<BoundingBox>,
}

/// Bounding box corners as `"lon lat"` pairs
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BoundingBox {
    /// South-west corner
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lower_corner: Option<String>,
    /// North-east corner
    #[serde(skip_serializing_if = "Option::is_none")]
    pub upper_corner: Option<String>,
}
