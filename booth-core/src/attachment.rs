// SPDX-License-Identifier: MIT OR Apache-2.0

//! Named binary payloads attached to a document.
//!
//! Attachments arrive either through the attachments key of a document body, where they are
//! reconciled against what is already stored, or through the single-attachment write operation.
//! On read they are projected either inline (payload base64-encoded) or as stubs (metadata only).
use std::collections::BTreeMap;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

use crate::error::ValidationError;
use crate::validate::validate_attachment_name;
use crate::value::{Map, Value};

/// Content type assumed when none was ever declared.
pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

const DATA_KEY: &str = "data";
const CONTENT_TYPE_KEY: &str = "content_type";
const LENGTH_KEY: &str = "length";

/// Binary payload with its metadata.
///
/// The length is always derived from the payload and can not disagree with it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Attachment {
    data: Vec<u8>,
    content_type: String,
}

impl Attachment {
    pub fn new(data: impl Into<Vec<u8>>, content_type: &str) -> Self {
        Self {
            data: data.into(),
            content_type: content_type.to_owned(),
        }
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    /// Byte length of the payload.
    pub fn length(&self) -> usize {
        self.data.len()
    }

    fn stub(&self) -> Value {
        let mut map = Map::new();
        map.insert(CONTENT_TYPE_KEY.into(), self.content_type.as_str().into());
        map.insert(LENGTH_KEY.into(), (self.length() as u64).into());
        Value::Object(map)
    }

    fn inline(&self) -> Value {
        let mut map = Map::new();
        map.insert(CONTENT_TYPE_KEY.into(), self.content_type.as_str().into());
        map.insert(LENGTH_KEY.into(), (self.length() as u64).into());
        map.insert(DATA_KEY.into(), STANDARD.encode(&self.data).into());
        Value::Object(map)
    }
}

/// How attachments appear in a read projection.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum AttachmentMode {
    /// Metadata only, omitted entirely when there are no attachments.
    #[default]
    Stubs,

    /// Metadata plus the base64-encoded payload.
    Inline,
}

/// Attachments of a document, keyed by name.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AttachmentStore(BTreeMap<String, Attachment>);

impl AttachmentStore {
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&Attachment> {
        self.0.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &String> {
        self.0.keys()
    }

    /// Inserts or replaces an attachment.
    ///
    /// Names are expected to be validated by the caller.
    pub(crate) fn put(&mut self, name: &str, attachment: Attachment) -> Option<Attachment> {
        self.0.insert(name.to_owned(), attachment)
    }

    pub(crate) fn remove(&mut self, name: &str) -> Option<Attachment> {
        self.0.remove(name)
    }

    /// Merges the attachments key of an incoming body into this store.
    ///
    /// Every mentioned name is validated and resolved before anything is written, so on error the
    /// store is left unchanged. Names which are not mentioned stay untouched. A `null` entry
    /// removes the attachment.
    pub fn reconcile(&mut self, incoming: &Value) -> Result<(), ValidationError> {
        let staged = self.stage(incoming)?;

        for (name, attachment) in staged {
            match attachment {
                Some(attachment) => {
                    self.put(&name, attachment);
                }
                None => {
                    self.remove(&name);
                }
            }
        }

        Ok(())
    }

    fn stage(&self, incoming: &Value) -> Result<Vec<(String, Option<Attachment>)>, ValidationError> {
        let entries = match incoming {
            Value::Object(entries) => entries,
            // Explicitly nulled attachments key means "nothing to reconcile"
            Value::Null => return Ok(Vec::new()),
            _ => return Err(ValidationError::MalformedAttachments),
        };

        let mut staged = Vec::with_capacity(entries.len());

        for (name, value) in entries {
            let name = validate_attachment_name(name.as_bytes())?;

            let resolved = match value {
                Value::Null => None,
                Value::Object(declared) => Some(self.resolve(name, declared)?),
                _ => return Err(ValidationError::MalformedAttachments),
            };

            staged.push((name.to_owned(), resolved));
        }

        Ok(staged)
    }

    /// Resolves the payload of one declared attachment.
    ///
    /// Inline data is authoritative. A stub without data carries the stored payload forward.
    fn resolve(&self, name: &str, declared: &Map) -> Result<Attachment, ValidationError> {
        let existing = self.get(name);

        let data = match declared.get(DATA_KEY) {
            Some(Value::String(encoded)) => decode(encoded)
                .map_err(|_| ValidationError::InvalidAttachmentData(name.to_owned()))?,
            Some(Value::Null) | None => match existing {
                Some(existing) => existing.data.clone(),
                None => return Err(ValidationError::MissingAttachmentData(name.to_owned())),
            },
            Some(_) => return Err(ValidationError::InvalidAttachmentData(name.to_owned())),
        };

        let content_type = match declared.get(CONTENT_TYPE_KEY).and_then(Value::as_str) {
            Some(content_type) => content_type,
            None => existing
                .map(Attachment::content_type)
                .unwrap_or(DEFAULT_CONTENT_TYPE),
        };

        // Any declared length is ignored, it is always derived from the payload
        Ok(Attachment::new(data, content_type))
    }

    /// Projects all attachments as metadata-only stubs.
    pub fn stubs(&self) -> Value {
        Value::Object(
            self.0
                .iter()
                .map(|(name, attachment)| (name.clone(), attachment.stub()))
                .collect(),
        )
    }

    /// Projects all attachments with their payload base64-encoded.
    pub fn inline(&self) -> Value {
        Value::Object(
            self.0
                .iter()
                .map(|(name, attachment)| (name.clone(), attachment.inline()))
                .collect(),
        )
    }

    /// Projection for a read, `None` when the attachments key should be omitted.
    pub fn project(&self, mode: AttachmentMode) -> Option<Value> {
        match mode {
            AttachmentMode::Inline => Some(self.inline()),
            AttachmentMode::Stubs if self.is_empty() => None,
            AttachmentMode::Stubs => Some(self.stubs()),
        }
    }
}

fn decode(encoded: &str) -> Result<Vec<u8>, base64::DecodeError> {
    // Tolerate line-wrapped base64 as produced by many encoders
    let compact: String = encoded
        .chars()
        .filter(|c| !c.is_ascii_whitespace())
        .collect();
    STANDARD.decode(compact)
}
