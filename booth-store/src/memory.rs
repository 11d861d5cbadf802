// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory persistence for booth documents.
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use booth_core::validate::ID_KEY;
use booth_core::{
    Attachment, Body, Document, DocumentError, DocumentId, IdentifierSource, RandomIdentifiers,
    ReadOptions, RevisionId, UpdateOptions, Value, WriteOutcome,
};
use tokio::sync::Mutex;
use tracing::{debug, trace};

use crate::config::Config;
use crate::error::StoreError;
use crate::traits::DocumentStore;

type SharedDocument = Arc<Mutex<Document>>;

/// An in-memory store for documents.
///
/// The map of documents sits behind an `RwLock` which is only held for lookups and inserts, never
/// across an await point. Each document has its own exclusive lock, so two writes racing on the
/// same id are strictly ordered while different documents do not block each other.
///
/// This does not persist data permanently, all changes are lost when the process ends.
#[derive(Clone)]
pub struct MemoryStore {
    documents: Arc<RwLock<HashMap<DocumentId, SharedDocument>>>,
    update_seq: Arc<AtomicU64>,
    identifiers: Arc<dyn IdentifierSource>,
    config: Config,
}

impl MemoryStore {
    /// Create a new in-memory store drawing random identifiers.
    pub fn new(config: Config) -> Self {
        Self::with_identifiers(config, Arc::new(RandomIdentifiers::new()))
    }

    /// Create a new in-memory store drawing identifiers from the given source.
    pub fn with_identifiers(config: Config, identifiers: Arc<dyn IdentifierSource>) -> Self {
        Self {
            documents: Arc::new(RwLock::new(HashMap::new())),
            update_seq: Arc::new(AtomicU64::new(0)),
            identifiers,
            config,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Obtain a read-lock on the document map.
    fn read_documents(&self) -> RwLockReadGuard<'_, HashMap<DocumentId, SharedDocument>> {
        self.documents
            .read()
            .expect("acquire shared read access on documents")
    }

    /// Obtain a write-lock on the document map.
    fn write_documents(&self) -> RwLockWriteGuard<'_, HashMap<DocumentId, SharedDocument>> {
        self.documents
            .write()
            .expect("acquire exclusive write access on documents")
    }

    fn document(&self, id: &DocumentId) -> Result<SharedDocument, StoreError> {
        self.read_documents()
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::DocumentNotFound(id.clone()))
    }

    fn next_seq(&self) -> u64 {
        self.update_seq.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn update_options(&self, options: &UpdateOptions) -> UpdateOptions {
        options.allow_branching(options.is_branching() || self.config.allow_branching)
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new(Config::default())
    }
}

impl fmt::Debug for MemoryStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryStore")
            .field("documents", &self.read_documents().len())
            .field("update_seq", &self.update_seq.load(Ordering::SeqCst))
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl DocumentStore for MemoryStore {
    type Error = StoreError;

    async fn post(
        &self,
        mut body: Body,
        options: &UpdateOptions,
    ) -> Result<WriteOutcome, Self::Error> {
        if !body.contains_key(ID_KEY) {
            body.insert(ID_KEY, Value::String(self.identifiers.next_id()));
        }

        self.put(body, options).await
    }

    async fn put(&self, body: Body, options: &UpdateOptions) -> Result<WriteOutcome, Self::Error> {
        let id = match body.get(ID_KEY).and_then(Value::as_str) {
            Some(id) if !id.is_empty() => DocumentId::new(id),
            _ => return Err(DocumentError::MissingIdentity.into()),
        };

        let existing = {
            let mut documents = self.write_documents();
            match documents.get(&id) {
                Some(document) => document.clone(),
                None => {
                    let (mut document, outcome) = Document::new(body, self.identifiers.clone())?;
                    document.set_seq(self.next_seq());
                    documents.insert(id, Arc::new(Mutex::new(document)));
                    debug!(id = %outcome.id(), rev = %outcome.revision(), "inserted document");
                    return Ok(outcome);
                }
            }
        };

        let mut document = existing.lock().await;
        trace!(id = %id, "acquired document lock");

        let outcome = document.update(body, &self.update_options(options))?;
        document.set_seq(self.next_seq());

        Ok(outcome)
    }

    async fn get(&self, id: &DocumentId, options: &ReadOptions) -> Result<Body, Self::Error> {
        let document = self.document(id)?;
        let document = document.lock().await;
        Ok(document.read(options)?)
    }

    async fn delete(
        &self,
        id: &DocumentId,
        revision: &RevisionId,
    ) -> Result<WriteOutcome, Self::Error> {
        let document = self.document(id)?;
        let mut document = document.lock().await;
        trace!(id = %id, "acquired document lock");

        let outcome = document.delete(revision)?;
        document.set_seq(self.next_seq());
        debug!(id = %id, rev = %outcome.revision(), "deleted document");

        Ok(outcome)
    }

    async fn get_attachment(
        &self,
        id: &DocumentId,
        name: &str,
    ) -> Result<Attachment, Self::Error> {
        let document = self.document(id)?;
        let document = document.lock().await;
        Ok(document.attachment(name)?.clone())
    }

    async fn put_attachment(
        &self,
        id: &DocumentId,
        revision: &RevisionId,
        name: &str,
        attachment: Option<Attachment>,
    ) -> Result<WriteOutcome, Self::Error> {
        let document = self.document(id)?;
        let mut document = document.lock().await;
        trace!(id = %id, "acquired document lock");

        let outcome = document.attachment_write(revision, name, attachment)?;
        document.set_seq(self.next_seq());

        Ok(outcome)
    }

    async fn doc_count(&self) -> Result<usize, Self::Error> {
        Ok(self.read_documents().len())
    }

    async fn update_seq(&self) -> Result<u64, Self::Error> {
        Ok(self.update_seq.load(Ordering::SeqCst))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use assert_matches::assert_matches;
    use booth_core::test_utils::{SequentialIdentifiers, setup_logging};
    use booth_core::{
        Attachment, Body, DocumentError, DocumentId, ReadOptions, RevisionId, UpdateOptions,
        ValidationError,
    };

    use crate::config::Config;
    use crate::error::StoreError;
    use crate::traits::DocumentStore;

    use super::MemoryStore;

    fn body(json: &str) -> Body {
        serde_json::from_str(json).unwrap()
    }

    fn store(config: Config) -> MemoryStore {
        setup_logging();
        MemoryStore::with_identifiers(config, Arc::new(SequentialIdentifiers::new("r")))
    }

    #[tokio::test]
    async fn put_get_update() {
        let store = store(Config::default());
        let id = DocumentId::from("d1");

        let created = store
            .put(body(r#"{"_id": "d1", "a": 1}"#), &UpdateOptions::default())
            .await
            .unwrap();
        assert_eq!(created.revision(), &RevisionId::from("r1"));
        assert_eq!(created.old_seq(), None);

        let updated = store
            .put(
                body(r#"{"_id": "d1", "_rev": "r1", "a": 2}"#),
                &UpdateOptions::default(),
            )
            .await
            .unwrap();
        assert_eq!(updated.revision(), &RevisionId::from("r2"));
        assert_eq!(updated.old_seq(), Some(1));

        let view = store.get(&id, &ReadOptions::default()).await.unwrap();
        assert_eq!(
            serde_json::to_string(&view).unwrap(),
            r#"{"_id":"d1","_rev":"r2","a":2}"#
        );

        assert_eq!(store.doc_count().await.unwrap(), 1);
        assert_eq!(store.update_seq().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn post_assigns_id() {
        let store = store(Config::default());

        let outcome = store
            .post(body(r#"{"a": 1}"#), &UpdateOptions::default())
            .await
            .unwrap();
        // First identifier goes to the document, second one to its revision
        assert_eq!(outcome.id(), &DocumentId::from("r1"));
        assert_eq!(outcome.revision(), &RevisionId::from("r2"));

        let outcome = store
            .post(body(r#"{"_id": "mine"}"#), &UpdateOptions::default())
            .await
            .unwrap();
        assert_eq!(outcome.id(), &DocumentId::from("mine"));
        assert_eq!(store.doc_count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn put_requires_id() {
        let store = store(Config::default());
        let result = store.put(body(r#"{"a": 1}"#), &UpdateOptions::default()).await;
        assert_matches!(
            result,
            Err(StoreError::Document(DocumentError::MissingIdentity))
        );
        assert_eq!(store.doc_count().await.unwrap(), 0);
        assert_eq!(store.update_seq().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn unknown_documents() {
        let store = store(Config::default());
        let id = DocumentId::from("ghost");

        let err = store.get(&id, &ReadOptions::default()).await.unwrap_err();
        assert_eq!(err, StoreError::DocumentNotFound(id.clone()));
        assert_eq!(err.code(), 404);
        assert_eq!(err.kind(), "not_found");
        assert_eq!(err.to_string(), "No doc with id: ghost");

        assert_matches!(
            store.delete(&id, &RevisionId::from("r1")).await,
            Err(StoreError::DocumentNotFound(_))
        );
        assert_matches!(
            store.get_attachment(&id, "a.txt").await,
            Err(StoreError::DocumentNotFound(_))
        );
    }

    #[tokio::test]
    async fn conflicts_and_branching() {
        let store = store(Config::default());
        let id = DocumentId::from("d1");

        store
            .put(body(r#"{"_id": "d1", "a": 1}"#), &UpdateOptions::default())
            .await
            .unwrap();
        store
            .put(
                body(r#"{"_id": "d1", "_rev": "r1", "a": 2}"#),
                &UpdateOptions::default(),
            )
            .await
            .unwrap();

        let err = store
            .put(
                body(r#"{"_id": "d1", "_rev": "r1", "a": 3}"#),
                &UpdateOptions::default(),
            )
            .await
            .unwrap_err();
        assert_eq!(err.code(), 409);
        assert_eq!(err.document_id(), Some(&id));

        let outcome = store
            .put(
                body(r#"{"_id": "d1", "_rev": "r1", "a": 3}"#),
                &UpdateOptions::new().allow_branching(true),
            )
            .await
            .unwrap();
        assert!(outcome.is_conflict());
        // Conflict branches are writes too and stamp the document
        assert_eq!(outcome.old_seq(), Some(2));
        assert_eq!(store.update_seq().await.unwrap(), 3);

        let view = store
            .get(&id, &ReadOptions::new().conflicts(true))
            .await
            .unwrap();
        assert_eq!(
            serde_json::to_string(&view).unwrap(),
            r#"{"_conflicts":["r3"],"_id":"d1","_rev":"r2","a":2}"#
        );
    }

    #[tokio::test]
    async fn configured_branching() {
        let store = store(Config {
            allow_branching: true,
        });
        assert!(store.config().allow_branching);

        store
            .put(body(r#"{"_id": "d1"}"#), &UpdateOptions::default())
            .await
            .unwrap();
        let outcome = store
            .put(
                body(r#"{"_id": "d1", "_rev": "stale"}"#),
                &UpdateOptions::default(),
            )
            .await
            .unwrap();
        assert!(outcome.is_conflict());
    }

    #[tokio::test]
    async fn delete_and_attachments() {
        let store = store(Config::default());
        let id = DocumentId::from("d1");

        store
            .put(body(r#"{"_id": "d1", "a": 1}"#), &UpdateOptions::default())
            .await
            .unwrap();

        let outcome = store
            .put_attachment(
                &id,
                &RevisionId::from("r1"),
                "hello.txt",
                Some(Attachment::new(b"hello".to_vec(), "text/plain")),
            )
            .await
            .unwrap();
        assert_eq!(outcome.revision(), &RevisionId::from("r2"));

        let attachment = store.get_attachment(&id, "hello.txt").await.unwrap();
        assert_eq!(attachment.data(), b"hello");

        assert_matches!(
            store
                .put_attachment(&id, &RevisionId::from("r2"), "_hidden", None)
                .await,
            Err(StoreError::Document(DocumentError::SchemaViolation(
                ValidationError::ReservedAttachmentName(_)
            )))
        );

        let err = store.get_attachment(&id, "missing").await.unwrap_err();
        assert_eq!(err.code(), 404);
        assert_eq!(err.document_id(), Some(&id));

        let outcome = store.delete(&id, &RevisionId::from("r2")).await.unwrap();
        assert_eq!(outcome.revision(), &RevisionId::from("r3"));

        let view = store.get(&id, &ReadOptions::default()).await.unwrap();
        assert_eq!(
            serde_json::to_string(&view).unwrap(),
            r#"{"_attachments":{"hello.txt":{"content_type":"text/plain","length":5}},"_deleted":true,"_id":"d1","_rev":"r3","a":1}"#
        );

        // Tombstones still count
        assert_eq!(store.doc_count().await.unwrap(), 1);
        assert_eq!(store.update_seq().await.unwrap(), 3);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn racing_writers_are_ordered() {
        let store = store(Config::default());
        store
            .put(body(r#"{"_id": "d1", "n": 0}"#), &UpdateOptions::default())
            .await
            .unwrap();

        let mut handles = Vec::new();
        for n in 1..=64i64 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                let mut update = Body::new();
                update.insert("_id", "d1");
                update.insert("_rev", "r1");
                update.insert("n", n);
                store.put(update, &UpdateOptions::default()).await
            }));
        }

        let mut succeeded = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => succeeded += 1,
                Err(err) => assert_eq!(err.code(), 409),
            }
        }

        // All writers presented r1, only the first one to get the lock wins
        assert_eq!(succeeded, 1);
        assert_eq!(store.update_seq().await.unwrap(), 2);
    }
}
