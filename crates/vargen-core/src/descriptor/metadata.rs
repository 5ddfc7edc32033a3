//! Embedded metadata block codec.
//!
//! Every generated artifact carries its [`TypeDescriptor`] in a comment block
//! at the end of the file:
//!
//! ```text
//! /* vargen:metadata
//! name = "Meter"
//! type = "float"
//! referability = "Value"
//! menuOrder = 1
//! builtin = false
//! vargen:end */
//! ```
//!
//! Decoding matches fields by name. Renaming one of them breaks every
//! artifact generated before the rename.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::model::{Referability, TypeDescriptor};

/// Opening line of a metadata block.
pub const METADATA_HEADER: &str = "/* vargen:metadata";
/// Closing line of a metadata block.
pub const METADATA_FOOTER: &str = "vargen:end */";

/// Structural failure while decoding a metadata block.
#[derive(Error, Debug)]
pub enum MetadataError {
    #[error("no metadata header found")]
    MissingHeader,

    #[error("metadata header is not closed by a footer")]
    MissingFooter,

    #[error("malformed metadata: {0}")]
    Malformed(#[from] toml::de::Error),

    #[error("failed to encode metadata: {0}")]
    Encode(#[from] toml::ser::Error),
}

/// On-disk field layout. Field names are part of the file format.
#[derive(Debug, Serialize, Deserialize)]
struct MetadataFields {
    name: String,
    #[serde(rename = "type")]
    target_type: String,
    #[serde(default)]
    referability: String,
    #[serde(rename = "menuOrder", default)]
    menu_order: i32,
    #[serde(default)]
    builtin: bool,
}

/// Serialize a descriptor into a self-contained metadata block, ending in a newline.
pub fn encode(descriptor: &TypeDescriptor) -> Result<String, MetadataError> {
    let fields = MetadataFields {
        name: descriptor.name.clone(),
        target_type: descriptor.target_type.clone(),
        referability: descriptor.referability.as_str().to_string(),
        menu_order: descriptor.menu_order,
        builtin: descriptor.builtin,
    };
    let body = toml::to_string(&fields)?;

    let mut block = String::with_capacity(body.len() + METADATA_HEADER.len() + METADATA_FOOTER.len() + 2);
    block.push_str(METADATA_HEADER);
    block.push('\n');
    block.push_str(&body);
    if !body.ends_with('\n') {
        block.push('\n');
    }
    block.push_str(METADATA_FOOTER);
    block.push('\n');
    Ok(block)
}

/// Decode the first metadata block found in `text`. Later blocks are ignored.
///
/// An unrecognised `referability` decodes to [`Referability::Unknown`] rather
/// than failing.
pub fn decode(text: &str) -> Result<TypeDescriptor, MetadataError> {
    let interior = locate(text)?;
    let fields: MetadataFields = toml::from_str(interior)?;

    Ok(TypeDescriptor {
        name: fields.name,
        target_type: fields.target_type,
        referability: Referability::from_str(&fields.referability),
        menu_order: fields.menu_order,
        builtin: fields.builtin,
    })
}

/// Append a metadata block to generated source text.
pub fn append_block(body: &str, descriptor: &TypeDescriptor) -> Result<String, MetadataError> {
    let block = encode(descriptor)?;
    let mut out = String::with_capacity(body.len() + block.len() + 2);
    out.push_str(body);
    if !body.is_empty() && !body.ends_with('\n') {
        out.push('\n');
    }
    out.push('\n');
    out.push_str(&block);
    Ok(out)
}

/// Slice between the first header and the footer that follows it.
fn locate(text: &str) -> Result<&str, MetadataError> {
    let start = text.find(METADATA_HEADER).ok_or(MetadataError::MissingHeader)?;
    let after_header = &text[start + METADATA_HEADER.len()..];
    let end = after_header.find(METADATA_FOOTER).ok_or(MetadataError::MissingFooter)?;
    Ok(&after_header[..end])
}
