// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::identifier::{DocumentId, RevisionId};
use crate::value::Body;

/// Snapshot of a document's body, revision and deletion flag at one point in its history.
///
/// Branches are never edited in place: every write builds a new one. The body only holds
/// application data, reserved keys are stripped before a branch is built and injected again when
/// it is projected for a read.
#[derive(Clone, Debug, PartialEq)]
pub struct RevisionBranch {
    id: DocumentId,
    revision: RevisionId,
    body: Body,
    deleted: bool,
}

impl RevisionBranch {
    pub(crate) fn new(id: DocumentId, revision: RevisionId, body: Body, deleted: bool) -> Self {
        Self {
            id,
            revision,
            body,
            deleted,
        }
    }

    /// Copy of this branch under a new revision, with body and deletion flag unchanged.
    pub(crate) fn with_revision(&self, revision: RevisionId) -> Self {
        Self {
            revision,
            ..self.clone()
        }
    }

    pub fn id(&self) -> &DocumentId {
        &self.id
    }

    pub fn revision(&self) -> &RevisionId {
        &self.revision
    }

    pub fn body(&self) -> &Body {
        &self.body
    }

    /// Returns true if this branch is a tombstone.
    pub fn is_deleted(&self) -> bool {
        self.deleted
    }
}
