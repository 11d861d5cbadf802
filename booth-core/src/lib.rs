// SPDX-License-Identifier: MIT OR Apache-2.0

//! Versioned documents with revisions, conflict branches and binary attachments.
//!
//! A [`Document`] is a key/value record identified by a stable id. Every successful write produces
//! a new, immutable [`RevisionBranch`] under a fresh opaque [`RevisionId`]. Writers have to present
//! the current revision: a stale write is either rejected with a conflict or, when branching is
//! allowed, preserved as a sibling conflict branch while the current revision stays in place.
//!
//! Revision ids are drawn from an injected [`IdentifierSource`], which keeps the engine free of
//! global state and lets tests supply deterministic ids.
//!
//! ```
//! # use std::sync::Arc;
//! # use booth_core::{Body, Document, RandomIdentifiers, ReadOptions, UpdateOptions};
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let body: Body = serde_json::from_str(r#"{"_id": "panda", "name": "Panda Cafe"}"#)?;
//! let (mut document, created) = Document::new(body, Arc::new(RandomIdentifiers::new()))?;
//!
//! // Updates need to present the current revision
//! let mut update: Body = serde_json::from_str(r#"{"_id": "panda", "name": "Panda Cafe!"}"#)?;
//! update.insert("_rev", created.revision().as_str());
//! let updated = document.update(update, &UpdateOptions::default())?;
//!
//! let view = document.read(&ReadOptions::default())?;
//! assert_eq!(view.get("_rev").and_then(|rev| rev.as_str()), Some(updated.revision().as_str()));
//! # Ok(())
//! # }
//! ```
pub mod attachment;
mod branch;
mod document;
pub mod error;
pub mod identifier;
pub mod options;
#[cfg(any(test, feature = "test_utils"))]
pub mod test_utils;
pub mod validate;
pub mod value;

pub use attachment::{Attachment, AttachmentMode, AttachmentStore};
pub use branch::RevisionBranch;
pub use document::{ConflictBranch, Document, Line, WriteOutcome};
pub use error::{DocumentError, ErrorClass, ValidationError};
pub use identifier::{DocumentId, IdentifierSource, RandomIdentifiers, RevisionId};
pub use options::{ReadOptions, UpdateOptions};
pub use value::{Body, Map, Value};
