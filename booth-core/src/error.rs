// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for validating, updating and reading documents.
//!
//! Every error carries an [`ErrorClass`] with a numeric code and a machine-readable kind tag, so
//! an outer transport layer can translate it 1:1 into a response without inspecting messages.
use thiserror::Error;

use crate::identifier::{DocumentId, RevisionId};

/// Broad category of a failure, with the numeric code callers map onto their transport.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorClass {
    BadRequest,
    NotFound,
    Conflict,
    Validation,
    Internal,
}

impl ErrorClass {
    /// Numeric code of this class, following HTTP status semantics.
    pub fn code(&self) -> u16 {
        match self {
            ErrorClass::BadRequest => 400,
            ErrorClass::NotFound => 404,
            ErrorClass::Conflict => 409,
            ErrorClass::Validation => 400,
            ErrorClass::Internal => 500,
        }
    }

    /// Short machine-readable tag of this class.
    pub fn kind(&self) -> &'static str {
        match self {
            ErrorClass::BadRequest => "bad_request",
            ErrorClass::NotFound => "not_found",
            ErrorClass::Conflict => "conflict",
            ErrorClass::Validation => "doc_validation",
            ErrorClass::Internal => "internal_error",
        }
    }
}

/// Structural problems found in an incoming document body or attachment.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Only the reserved keys may start with the reserved prefix.
    #[error("bad special field '{0}'")]
    ReservedKey(String),

    /// Attachment names must not start with the reserved prefix.
    #[error("attachment name can't start with '_': '{0}'")]
    ReservedAttachmentName(String),

    /// Input was not well-formed text.
    #[error("invalid unicode")]
    InvalidText,

    /// The attachments key must hold an object of attachment objects.
    #[error("'_attachments' must be an object of attachment objects")]
    MalformedAttachments,

    /// Inline attachment data could not be decoded.
    #[error("invalid base64 data for attachment '{0}'")]
    InvalidAttachmentData(String),

    /// Attachment stub refers to a payload which does not exist.
    #[error("attachment stub '{0}' has no data and no stored payload")]
    MissingAttachmentData(String),
}

impl ValidationError {
    pub fn class(&self) -> ErrorClass {
        match self {
            ValidationError::ReservedKey(_) => ErrorClass::Validation,
            _ => ErrorClass::BadRequest,
        }
    }
}

/// Error types for operations on a `Document`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DocumentError {
    /// A document can only be constructed from a body carrying a non-empty identifier.
    #[error("document requires an _id")]
    MissingIdentity,

    /// The body's identifier is absent or does not match the document.
    #[error("id mismatch, doc._id must match {expected}")]
    IdentityMismatch { expected: DocumentId },

    /// A write did not present the current revision.
    #[error("rev mismatch, need '{required}' for docid '{id}'")]
    RevisionConflict {
        id: DocumentId,
        required: RevisionId,
    },

    /// The incoming body or attachment is structurally invalid.
    #[error(transparent)]
    SchemaViolation(#[from] ValidationError),

    #[error("missing attachment '{name}' for docid '{id}'")]
    AttachmentNotFound { id: DocumentId, name: String },

    /// The requested revision is neither the current one nor a known conflict.
    #[error("missing revision '{revision}' for docid '{id}'")]
    RevisionNotFound {
        id: DocumentId,
        revision: RevisionId,
    },

    /// Stored state violates an invariant which valid writes can not produce.
    #[error("internal invariant violated: {0}")]
    Internal(String),
}

impl DocumentError {
    pub fn class(&self) -> ErrorClass {
        match self {
            DocumentError::MissingIdentity => ErrorClass::BadRequest,
            DocumentError::IdentityMismatch { .. } => ErrorClass::BadRequest,
            DocumentError::RevisionConflict { .. } => ErrorClass::Conflict,
            DocumentError::SchemaViolation(err) => err.class(),
            DocumentError::AttachmentNotFound { .. } => ErrorClass::NotFound,
            DocumentError::RevisionNotFound { .. } => ErrorClass::NotFound,
            DocumentError::Internal(_) => ErrorClass::Internal,
        }
    }

    /// Numeric code, see [`ErrorClass::code`].
    pub fn code(&self) -> u16 {
        self.class().code()
    }

    /// Machine-readable kind tag, see [`ErrorClass::kind`].
    pub fn kind(&self) -> &'static str {
        self.class().kind()
    }

    /// Id of the document this error refers to, if it carries one.
    pub fn document_id(&self) -> Option<&DocumentId> {
        match self {
            DocumentError::IdentityMismatch { expected } => Some(expected),
            DocumentError::RevisionConflict { id, .. } => Some(id),
            DocumentError::AttachmentNotFound { id, .. } => Some(id),
            DocumentError::RevisionNotFound { id, .. } => Some(id),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::identifier::{DocumentId, RevisionId};

    use super::{DocumentError, ValidationError};

    #[test]
    fn classes_and_messages() {
        let err = DocumentError::RevisionConflict {
            id: DocumentId::from("d1"),
            required: RevisionId::from("r2"),
        };
        assert_eq!(err.code(), 409);
        assert_eq!(err.kind(), "conflict");
        assert_eq!(err.to_string(), "rev mismatch, need 'r2' for docid 'd1'");
        assert_eq!(err.document_id(), Some(&DocumentId::from("d1")));

        let err: DocumentError = ValidationError::ReservedKey("_bogus".into()).into();
        assert_eq!(err.code(), 400);
        assert_eq!(err.kind(), "doc_validation");
        assert_eq!(err.to_string(), "bad special field '_bogus'");
        assert_eq!(err.document_id(), None);

        let err: DocumentError = ValidationError::InvalidText.into();
        assert_eq!(err.kind(), "bad_request");

        let err = DocumentError::AttachmentNotFound {
            id: DocumentId::from("d1"),
            name: "foo.txt".into(),
        };
        assert_eq!(err.code(), 404);
        assert_eq!(err.kind(), "not_found");
        assert_eq!(err.to_string(), "missing attachment 'foo.txt' for docid 'd1'");
        assert_eq!(err.document_id(), Some(&DocumentId::from("d1")));

        assert_eq!(DocumentError::Internal("boom".into()).code(), 500);
    }
}
