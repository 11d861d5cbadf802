// SPDX-License-Identifier: MIT OR Apache-2.0

use booth_core::{DocumentError, DocumentId, ErrorClass};
use thiserror::Error;

/// Error types for `DocumentStore` implementations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// No document is stored under this id.
    #[error("No doc with id: {0}")]
    DocumentNotFound(DocumentId),

    /// Handle errors from operations on a document.
    #[error(transparent)]
    Document(#[from] DocumentError),
}

impl StoreError {
    pub fn class(&self) -> ErrorClass {
        match self {
            StoreError::DocumentNotFound(_) => ErrorClass::NotFound,
            StoreError::Document(err) => err.class(),
        }
    }

    pub fn code(&self) -> u16 {
        self.class().code()
    }

    pub fn kind(&self) -> &'static str {
        self.class().kind()
    }

    pub fn document_id(&self) -> Option<&DocumentId> {
        match self {
            StoreError::DocumentNotFound(id) => Some(id),
            StoreError::Document(err) => err.document_id(),
        }
    }
}
