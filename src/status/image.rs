//! Image lifecycle derivation
//!
//! The image engine mirrors the machine engine at a smaller scale: two named
//! conditions plus a locally-tracked upload error determine one display
//! state. The upload error channel exists because upload failures happen on
//! the client side of the transfer and never reach the control plane's
//! conditions.

use crate::crd::{Condition, ConditionStatus, ImageSourceType, VirtualMachineImage};

/// Effective lifecycle state of an image
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub enum ImageState {
    /// Content is being rebuilt from a snapshot restore
    Restoring,
    /// Content is being fetched from its URL
    Downloading,
    /// Content is arriving through the upload side channel
    Uploading,
    /// Content is being exported out of a volume
    Exporting,
    /// Import or upload failed
    Failed,
    /// Imported and serviceable
    Active,
}

impl std::fmt::Display for ImageState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Restoring => write!(f, "Restoring"),
            Self::Downloading => write!(f, "Downloading"),
            Self::Uploading => write!(f, "Uploading"),
            Self::Exporting => write!(f, "Exporting"),
            Self::Failed => write!(f, "Failed"),
            Self::Active => write!(f, "Active"),
        }
    }
}

/// Derive the display state of an image
///
/// The upload error wins over everything the control plane reports. While
/// the Imported condition sits at Unknown the declared source type picks the
/// in-flight wording; a source the engine does not recognize reads as an
/// export. A condition carrying text means the import failed.
pub fn image_state(image: &VirtualMachineImage, upload_error: Option<&str>) -> ImageState {
    if has_text(upload_error) {
        return ImageState::Failed;
    }

    let initialized = image.initialized_condition();
    let imported = image.imported_condition();

    if imported.map(|c| c.status) == Some(ConditionStatus::Unknown) {
        return match image.spec.source_type {
            Some(ImageSourceType::Restore) => ImageState::Restoring,
            Some(ImageSourceType::Download) => ImageState::Downloading,
            Some(ImageSourceType::Upload) => ImageState::Uploading,
            _ => ImageState::Exporting,
        };
    }

    if has_condition_text(initialized) || has_condition_text(imported) {
        return ImageState::Failed;
    }

    ImageState::Active
}

/// Whether the image is serviceable
///
/// Requires full progress and neither gating condition reporting False.
pub fn is_ready(image: &VirtualMachineImage) -> bool {
    !condition_false(image.initialized_condition())
        && !condition_false(image.imported_condition())
        && image.progress() == 100
}

/// Whether the image is in an error condition, independent of display state
pub fn image_error(image: &VirtualMachineImage, upload_error: Option<&str>) -> bool {
    condition_false(image.initialized_condition())
        || condition_false(image.imported_condition())
        || has_text(upload_error)
}

/// First explanatory message, capitalized the way operators see it
///
/// The upload error comes first, then the conditions in fixed order:
/// Initialized, Imported, RetryLimitExceeded.
pub fn image_message(image: &VirtualMachineImage, upload_error: Option<&str>) -> Option<String> {
    if let Some(error) = upload_error.filter(|e| !e.is_empty()) {
        return Some(ucfirst(error));
    }

    [
        image.initialized_condition(),
        image.imported_condition(),
        image.retry_limit_condition(),
    ]
    .into_iter()
    .flatten()
    .find_map(|condition| condition.message.as_deref().filter(|m| !m.is_empty()))
    .map(ucfirst)
}

fn has_text(value: Option<&str>) -> bool {
    value.is_some_and(|v| !v.is_empty())
}

fn has_condition_text(condition: Option<&Condition>) -> bool {
    has_text(condition.and_then(|c| c.message.as_deref()))
}

fn condition_false(condition: Option<&Condition>) -> bool {
    condition.is_some_and(|c| c.status == ConditionStatus::False)
}

fn ucfirst(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
