//! VirtualMachineImage resource declaration
//!
//! Harvester-style VM image (`harvesterhci.io/v1beta1`). Lifecycle is driven
//! by the `Initialized` and `Imported` conditions plus a numeric progress;
//! the derivation itself lives in the status engine.

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::types::{find_condition, Condition};

/// Condition type set once the backing storage for an image exists
pub const CONDITION_INITIALIZED: &str = "Initialized";
/// Condition type tracking the import of image content
pub const CONDITION_IMPORTED: &str = "Imported";
/// Condition type set when the importer gave up retrying
pub const CONDITION_RETRY_LIMIT_EXCEEDED: &str = "RetryLimitExceeded";

/// Declared origin of an image's content
#[derive(Clone, Copy, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
#[non_exhaustive]
pub enum ImageSourceType {
    /// Content is downloaded from a URL
    #[default]
    Download,
    /// Content is uploaded through the local side channel
    Upload,
    /// Content comes from a snapshot restore
    Restore,
    /// Content is cloned from another image
    Clone,
    /// Content is exported from an existing volume
    #[serde(rename = "export-from-volume")]
    ExportFromVolume,
    /// Any source type this crate does not recognize
    #[serde(other)]
    Unrecognized,
}

/// Specification for a VirtualMachineImage
#[derive(CustomResource, Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[kube(
    group = "harvesterhci.io",
    version = "v1beta1",
    kind = "VirtualMachineImage",
    plural = "virtualmachineimages",
    shortname = "vmimage",
    status = "VirtualMachineImageStatus",
    namespaced,
    printcolumn = r#"{"name":"Display-Name","type":"string","jsonPath":".spec.displayName"}"#,
    printcolumn = r#"{"name":"Progress","type":"integer","jsonPath":".status.progress"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct VirtualMachineImageSpec {
    /// Human-facing image name
    #[serde(default)]
    pub display_name: String,

    /// Where the image content comes from; absent means download
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_type: Option<ImageSourceType>,

    /// Download URL, for download-sourced images
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// Status reported by the image controller
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct VirtualMachineImageStatus {
    /// Conditions reported for the image
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<Condition>,

    /// Import/upload progress percentage (0-100)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub progress: Option<u8>,

    /// Stored size in bytes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<i64>,
}

impl VirtualMachineImageStatus {
    /// Add a condition and return self for chaining
    pub fn condition(mut self, condition: Condition) -> Self {
        self.conditions.retain(|c| c.type_ != condition.type_);
        self.conditions.push(condition);
        self
    }

    /// Set the progress and return self for chaining
    pub fn progress(mut self, progress: u8) -> Self {
        self.progress = Some(progress);
        self
    }
}

impl VirtualMachineImage {
    /// Declared source type, defaulting to download when unset
    pub fn source_type(&self) -> ImageSourceType {
        self.spec.source_type.unwrap_or_default()
    }

    /// Conditions reported for the image (empty when status is absent)
    pub fn conditions(&self) -> &[Condition] {
        self.status
            .as_ref()
            .map(|s| s.conditions.as_slice())
            .unwrap_or(&[])
    }

    /// The Initialized condition, when present
    pub fn initialized_condition(&self) -> Option<&Condition> {
        find_condition(self.conditions(), CONDITION_INITIALIZED)
    }

    /// The Imported condition, when present
    pub fn imported_condition(&self) -> Option<&Condition> {
        find_condition(self.conditions(), CONDITION_IMPORTED)
    }

    /// The RetryLimitExceeded condition, when present
    pub fn retry_limit_condition(&self) -> Option<&Condition> {
        find_condition(self.conditions(), CONDITION_RETRY_LIMIT_EXCEEDED)
    }

    /// Progress percentage, defaulting to 0
    pub fn progress(&self) -> u8 {
        self.status.as_ref().and_then(|s| s.progress).unwrap_or(0)
    }
}
