// SPDX-License-Identifier: MIT OR Apache-2.0

use std::fmt;
use std::sync::Arc;

use tracing::debug;

use crate::attachment::{Attachment, AttachmentStore};
use crate::branch::RevisionBranch;
use crate::error::DocumentError;
use crate::identifier::{DocumentId, IdentifierSource, RevisionId};
use crate::options::{ReadOptions, UpdateOptions};
use crate::validate::{
    ATTACHMENTS_KEY, CONFLICTS_KEY, DELETED_KEY, ID_KEY, RESERVED_KEYS, REV_KEY, is_reserved,
    validate_attachment_name, validate_keys,
};
use crate::value::{Body, Value};

/// Which line of a document a successful write landed on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Line {
    /// The write replaced the current revision.
    Main,

    /// The write was kept as a conflict branch next to the current revision.
    Conflict,
}

/// Result of a successful write.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WriteOutcome {
    id: DocumentId,
    revision: RevisionId,
    line: Line,
    old_seq: Option<u64>,
}

impl WriteOutcome {
    pub fn id(&self) -> &DocumentId {
        &self.id
    }

    /// Revision created by this write.
    pub fn revision(&self) -> &RevisionId {
        &self.revision
    }

    pub fn line(&self) -> Line {
        self.line
    }

    /// Returns true if the write was preserved as a conflict branch.
    pub fn is_conflict(&self) -> bool {
        self.line == Line::Conflict
    }

    /// Update sequence the document had before this write, if it was ever stamped with one.
    pub fn old_seq(&self) -> Option<u64> {
        self.old_seq
    }
}

/// Branch created by a concurrent write which did not present the current revision.
///
/// Unlike the main line, which shares the document's attachments across revisions, a conflict
/// branch keeps the attachments its writer declared.
#[derive(Clone, Debug, PartialEq)]
pub struct ConflictBranch {
    branch: RevisionBranch,
    attachments: AttachmentStore,
}

impl ConflictBranch {
    pub fn branch(&self) -> &RevisionBranch {
        &self.branch
    }

    pub fn attachments(&self) -> &AttachmentStore {
        &self.attachments
    }
}

/// A versioned record identified by a stable id.
///
/// A document always holds exactly one current revision plus an ordered list of conflict
/// branches. Every write either fully commits a new revision or leaves the document unchanged.
///
/// All operations are plain synchronous state transitions. Callers sharing a document between
/// tasks have to serialize access to it, for example by holding it behind a lock.
#[derive(Clone)]
pub struct Document {
    id: DocumentId,
    current: RevisionBranch,
    conflicts: Vec<ConflictBranch>,
    attachments: AttachmentStore,
    seq: Option<u64>,
    identifiers: Arc<dyn IdentifierSource>,
}

impl Document {
    /// Construct a document from its first body.
    ///
    /// The body needs to carry a non-empty `_id`. A revision is always generated, even if the body
    /// already declares one.
    pub fn new(
        body: Body,
        identifiers: Arc<dyn IdentifierSource>,
    ) -> Result<(Self, WriteOutcome), DocumentError> {
        let id = match body.get(ID_KEY).and_then(Value::as_str) {
            Some(id) if !id.is_empty() => DocumentId::new(id),
            _ => return Err(DocumentError::MissingIdentity),
        };

        let mut attachments = AttachmentStore::new();
        let current = build_branch(&id, &body, &mut attachments, identifiers.as_ref())?;

        debug!(id = %id, rev = %current.revision(), "created document");

        let outcome = WriteOutcome {
            id: id.clone(),
            revision: current.revision().clone(),
            line: Line::Main,
            old_seq: None,
        };

        let document = Self {
            id,
            current,
            conflicts: Vec::new(),
            attachments,
            seq: None,
            identifiers,
        };

        Ok((document, outcome))
    }

    pub fn id(&self) -> &DocumentId {
        &self.id
    }

    /// Revision id of the current branch.
    pub fn revision(&self) -> &RevisionId {
        self.current.revision()
    }

    /// The branch authoritative for reads which do not target a specific revision.
    pub fn current(&self) -> &RevisionBranch {
        &self.current
    }

    /// Conflict branches in insertion order.
    pub fn conflicts(&self) -> &[ConflictBranch] {
        &self.conflicts
    }

    /// Revision ids of all conflict branches in insertion order.
    pub fn conflict_revisions(&self) -> Vec<&RevisionId> {
        self.conflicts
            .iter()
            .map(|conflict| conflict.branch.revision())
            .collect()
    }

    /// Returns true if the current revision is a tombstone.
    pub fn is_deleted(&self) -> bool {
        self.current.is_deleted()
    }

    pub fn attachments(&self) -> &AttachmentStore {
        &self.attachments
    }

    /// Entity tag of the current revision: the revision id in double quotes.
    pub fn etag(&self) -> String {
        format!("\"{}\"", self.current.revision())
    }

    /// Update sequence this document was last stamped with by its store.
    pub fn seq(&self) -> Option<u64> {
        self.seq
    }

    pub fn set_seq(&mut self, seq: u64) {
        self.seq = Some(seq);
    }

    /// Apply a new body to this document.
    ///
    /// The body has to carry this document's `_id`. Unless the current revision is a tombstone,
    /// it also has to carry the current `_rev`. A stale or missing revision is rejected with
    /// `RevisionConflict`, or kept as a new conflict branch when branching is allowed, in which
    /// case the current revision is left untouched.
    pub fn update(
        &mut self,
        body: Body,
        options: &UpdateOptions,
    ) -> Result<WriteOutcome, DocumentError> {
        self.check_identity(&body)?;

        if self.requires_revision() && !self.presents_current_revision(&body) {
            if options.is_branching() {
                return self.write_conflict(&body);
            }

            return Err(self.revision_conflict());
        }

        let current = build_branch(
            &self.id,
            &body,
            &mut self.attachments,
            self.identifiers.as_ref(),
        )?;

        debug!(
            id = %self.id,
            rev = %current.revision(),
            deleted = current.is_deleted(),
            "committed update"
        );

        self.current = current;
        Ok(self.main_outcome())
    }

    /// Mark this document as deleted.
    ///
    /// The tombstone keeps the last body and the attachments. The current revision has to be
    /// presented, deletes are never branched.
    pub fn delete(&mut self, revision: &RevisionId) -> Result<WriteOutcome, DocumentError> {
        let mut body = self.current.body().clone();
        body.insert(ID_KEY, self.id.as_str());
        body.insert(REV_KEY, revision.as_str());
        body.insert(DELETED_KEY, true);

        self.update(body, &UpdateOptions::default())
    }

    /// Project the current revision, or the one targeted by the options, for a read.
    ///
    /// The projection is a copy of the stored body with the reserved keys overlaid; stored state
    /// is never touched.
    pub fn read(&self, options: &ReadOptions) -> Result<Body, DocumentError> {
        match options.target_revision() {
            Some(revision) if revision != self.current.revision() => {
                let conflict = self
                    .conflicts
                    .iter()
                    .find(|conflict| conflict.branch.revision() == revision)
                    .ok_or_else(|| DocumentError::RevisionNotFound {
                        id: self.id.clone(),
                        revision: revision.clone(),
                    })?;

                // Conflict branches have no siblings of their own
                project(&conflict.branch, &conflict.attachments, &[], options)
            }
            _ => project(
                &self.current,
                &self.attachments,
                &self.conflict_revisions(),
                options,
            ),
        }
    }

    /// Get the attachment stored under this name.
    pub fn attachment(&self, name: &str) -> Result<&Attachment, DocumentError> {
        self.attachments
            .get(name)
            .ok_or_else(|| DocumentError::AttachmentNotFound {
                id: self.id.clone(),
                name: name.to_owned(),
            })
    }

    /// Write or remove a single attachment.
    ///
    /// `None` removes the attachment, which is not an error when it does not exist. Either way
    /// the current revision advances while the body stays the same.
    pub fn attachment_write(
        &mut self,
        expected: &RevisionId,
        name: impl AsRef<[u8]>,
        attachment: Option<Attachment>,
    ) -> Result<WriteOutcome, DocumentError> {
        if expected != self.current.revision() {
            return Err(self.revision_conflict());
        }

        let name = validate_attachment_name(name.as_ref())?;

        match attachment {
            Some(attachment) => {
                self.attachments.put(name, attachment);
            }
            None => {
                self.attachments.remove(name);
            }
        }

        let revision = RevisionId::generate(self.identifiers.as_ref());
        self.current = self.current.with_revision(revision);

        debug!(id = %self.id, rev = %self.current.revision(), name, "wrote attachment");

        Ok(self.main_outcome())
    }

    fn check_identity(&self, body: &Body) -> Result<(), DocumentError> {
        match body.get(ID_KEY).and_then(Value::as_str) {
            Some(id) if id == self.id.as_str() => Ok(()),
            _ => Err(DocumentError::IdentityMismatch {
                expected: self.id.clone(),
            }),
        }
    }

    /// Tombstones accept any write, everything else has to present the current revision.
    fn requires_revision(&self) -> bool {
        !self.current.is_deleted() && !self.current.revision().as_str().is_empty()
    }

    fn presents_current_revision(&self, body: &Body) -> bool {
        body.get(REV_KEY).and_then(Value::as_str) == Some(self.current.revision().as_str())
    }

    fn revision_conflict(&self) -> DocumentError {
        DocumentError::RevisionConflict {
            id: self.id.clone(),
            required: self.current.revision().clone(),
        }
    }

    fn write_conflict(&mut self, body: &Body) -> Result<WriteOutcome, DocumentError> {
        let mut attachments = AttachmentStore::new();
        let branch = build_branch(&self.id, body, &mut attachments, self.identifiers.as_ref())?;

        debug!(
            id = %self.id,
            rev = %branch.revision(),
            current = %self.current.revision(),
            "kept write as conflict branch"
        );

        let outcome = WriteOutcome {
            id: self.id.clone(),
            revision: branch.revision().clone(),
            line: Line::Conflict,
            old_seq: self.seq,
        };

        self.conflicts.push(ConflictBranch {
            branch,
            attachments,
        });

        Ok(outcome)
    }

    fn main_outcome(&self) -> WriteOutcome {
        WriteOutcome {
            id: self.id.clone(),
            revision: self.current.revision().clone(),
            line: Line::Main,
            old_seq: self.seq,
        }
    }
}

impl fmt::Debug for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Document")
            .field("id", &self.id)
            .field("current", &self.current)
            .field("conflicts", &self.conflicts)
            .field("attachments", &self.attachments)
            .field("seq", &self.seq)
            .finish_non_exhaustive()
    }
}

impl fmt::Display for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<Document {}>", self.id)
    }
}

/// Validate a body and build the branch it describes.
///
/// Attachments are reconciled into the given store, which happens atomically. Nothing after that
/// step can fail, so either a branch is returned and the store is updated, or neither.
fn build_branch(
    id: &DocumentId,
    body: &Body,
    attachments: &mut AttachmentStore,
    identifiers: &dyn IdentifierSource,
) -> Result<RevisionBranch, DocumentError> {
    validate_keys(body)?;

    if let Some(incoming) = body.get(ATTACHMENTS_KEY) {
        attachments.reconcile(incoming)?;
    }

    let deleted = body.get(DELETED_KEY).is_some_and(Value::is_truthy);
    let revision = RevisionId::generate(identifiers);

    Ok(RevisionBranch::new(
        id.clone(),
        revision,
        body.without(&RESERVED_KEYS),
        deleted,
    ))
}

/// Overlay the reserved keys onto a copy of the branch's body.
fn project(
    branch: &RevisionBranch,
    attachments: &AttachmentStore,
    conflicts: &[&RevisionId],
    options: &ReadOptions,
) -> Result<Body, DocumentError> {
    if let Some(key) = branch.body().keys().find(|key| is_reserved(key)) {
        return Err(DocumentError::Internal(format!(
            "stored body of '{}' holds reserved key '{}'",
            branch.id(),
            key
        )));
    }

    let mut view = branch.body().clone();
    view.insert(ID_KEY, branch.id().as_str());
    view.insert(REV_KEY, branch.revision().as_str());

    if branch.is_deleted() {
        view.insert(DELETED_KEY, true);
    }

    if let Some(projected) = attachments.project(options.attachment_mode()) {
        view.insert(ATTACHMENTS_KEY, projected);
    }

    if options.include_conflicts() {
        let revisions: Vec<Value> = conflicts
            .iter()
            .map(|revision| Value::from(revision.as_str()))
            .collect();
        view.insert(CONFLICTS_KEY, revisions);
    }

    Ok(view)
}
