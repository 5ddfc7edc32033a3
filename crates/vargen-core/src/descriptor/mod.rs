//! Variable type descriptors and template placeholder expansion.

pub mod metadata;
pub mod model;

pub use model::{Referability, TypeDescriptor};

/// Placeholder replaced by the descriptor name.
pub const PLACEHOLDER_NAME: &str = "@Name@";
/// Placeholder replaced by the wrapped target type.
pub const PLACEHOLDER_TYPE: &str = "@Type@";
/// Placeholder replaced by the canonical referability text.
pub const PLACEHOLDER_REFERABLE: &str = "@Referable@";
/// Placeholder replaced by the menu order.
pub const PLACEHOLDER_ORDER: &str = "@Order@";

/// Substitute the four template placeholders in `text`.
///
/// Used for both template bodies and output file names.
pub fn expand_placeholders(text: &str, descriptor: &TypeDescriptor) -> String {
    text.replace(PLACEHOLDER_NAME, &descriptor.name)
        .replace(PLACEHOLDER_TYPE, &descriptor.target_type)
        .replace(PLACEHOLDER_REFERABLE, descriptor.referability.as_str())
        .replace(PLACEHOLDER_ORDER, &descriptor.menu_order.to_string())
}
