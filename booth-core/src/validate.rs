// SPDX-License-Identifier: MIT OR Apache-2.0

//! Structural checks for incoming document bodies and attachment names.
//!
//! The checks are shallow: they only look at reserved keys, naming rules and whether input is
//! well-formed text, never at what the application data means.
use crate::error::ValidationError;
use crate::value::Body;

/// Keys starting with this character are reserved for the store.
pub const RESERVED_PREFIX: char = '_';

pub const ID_KEY: &str = "_id";
pub const REV_KEY: &str = "_rev";
pub const DELETED_KEY: &str = "_deleted";
pub const ATTACHMENTS_KEY: &str = "_attachments";

/// Only present in read projections, never accepted on write.
pub const CONFLICTS_KEY: &str = "_conflicts";

/// Reserved keys an incoming body may carry.
pub const RESERVED_KEYS: [&str; 4] = [ID_KEY, REV_KEY, DELETED_KEY, ATTACHMENTS_KEY];

/// Returns true if the key belongs to the store rather than the application.
pub fn is_reserved(key: &str) -> bool {
    key.starts_with(RESERVED_PREFIX)
}

/// Checks that every key starting with the reserved prefix is one of the reserved keys.
pub fn validate_keys(body: &Body) -> Result<(), ValidationError> {
    match body
        .keys()
        .find(|key| is_reserved(key) && !RESERVED_KEYS.contains(&key.as_str()))
    {
        Some(key) => Err(ValidationError::ReservedKey(key.to_owned())),
        None => Ok(()),
    }
}

/// Decodes bytes as UTF-8 text.
pub fn validate_text(bytes: &[u8]) -> Result<&str, ValidationError> {
    std::str::from_utf8(bytes).map_err(|_| ValidationError::InvalidText)
}

/// Checks an attachment name is well-formed text and does not use the reserved prefix.
pub fn validate_attachment_name(name: &[u8]) -> Result<&str, ValidationError> {
    let name = validate_text(name)?;

    if is_reserved(name) {
        return Err(ValidationError::ReservedAttachmentName(name.to_owned()));
    }

    Ok(name)
}
