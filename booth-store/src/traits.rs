// SPDX-License-Identifier: MIT OR Apache-2.0

use std::fmt::{Debug, Display};

use booth_core::{
    Attachment, Body, DocumentId, ReadOptions, RevisionId, UpdateOptions, WriteOutcome,
};

/// Interface for creating, updating, reading and deleting documents.
///
/// Two variants of the trait are provided: one which is thread-safe (implementing `Send`) and one
/// which is purely intended for single-threaded execution contexts.
///
/// Writes to the same document are strictly ordered, writes to different documents may run
/// concurrently.
#[trait_variant::make(DocumentStore: Send)]
pub trait LocalDocumentStore: Clone {
    type Error: Display + Debug;

    /// Create a document with a server-assigned id.
    ///
    /// A fresh id is only assigned when the body carries no `_id`, otherwise this behaves like
    /// `put`.
    async fn post(&self, body: Body, options: &UpdateOptions) -> Result<WriteOutcome, Self::Error>;

    /// Create a document, or update it if one with the body's `_id` already exists.
    async fn put(&self, body: Body, options: &UpdateOptions) -> Result<WriteOutcome, Self::Error>;

    /// Read a projection of a document.
    async fn get(&self, id: &DocumentId, options: &ReadOptions) -> Result<Body, Self::Error>;

    /// Mark a document as deleted, presenting its current revision.
    async fn delete(
        &self,
        id: &DocumentId,
        revision: &RevisionId,
    ) -> Result<WriteOutcome, Self::Error>;

    /// Get an attachment of a document.
    async fn get_attachment(&self, id: &DocumentId, name: &str)
    -> Result<Attachment, Self::Error>;

    /// Write or, when passing `None`, remove an attachment of a document.
    async fn put_attachment(
        &self,
        id: &DocumentId,
        revision: &RevisionId,
        name: &str,
        attachment: Option<Attachment>,
    ) -> Result<WriteOutcome, Self::Error>;

    /// Number of stored documents, tombstones included.
    async fn doc_count(&self) -> Result<usize, Self::Error>;

    /// Sequence number of the latest committed write, 0 for an empty store.
    async fn update_seq(&self) -> Result<u64, Self::Error>;
}
