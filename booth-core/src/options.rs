// SPDX-License-Identifier: MIT OR Apache-2.0

//! Options controlling reads and writes of a document.
//!
//! Options can be built with the setters or parsed from string query parameters, in which case
//! only the literal value `"true"` switches a flag on.
use crate::attachment::AttachmentMode;
use crate::identifier::RevisionId;

pub const REV_PARAM: &str = "rev";
pub const ATTACHMENTS_PARAM: &str = "attachments";
pub const CONFLICTS_PARAM: &str = "conflicts";
pub const ALL_OR_NOTHING_PARAM: &str = "all_or_nothing";

fn is_true(value: &str) -> bool {
    value == "true"
}

/// Controls which revision a read targets and what the projection includes.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ReadOptions {
    pub(crate) revision: Option<RevisionId>,
    pub(crate) attachments: AttachmentMode,
    pub(crate) conflicts: bool,
}

impl ReadOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Target a specific historical or conflicting revision.
    pub fn revision(mut self, revision: impl Into<RevisionId>) -> Self {
        self.revision = Some(revision.into());
        self
    }

    /// Embed attachment payloads instead of metadata stubs.
    pub fn inline_attachments(mut self, inline: bool) -> Self {
        self.attachments = if inline {
            AttachmentMode::Inline
        } else {
            AttachmentMode::Stubs
        };
        self
    }

    /// Include the revision ids of conflicting branches.
    pub fn conflicts(mut self, conflicts: bool) -> Self {
        self.conflicts = conflicts;
        self
    }

    pub fn target_revision(&self) -> Option<&RevisionId> {
        self.revision.as_ref()
    }

    pub fn attachment_mode(&self) -> AttachmentMode {
        self.attachments
    }

    pub fn include_conflicts(&self) -> bool {
        self.conflicts
    }

    /// Parses options from query parameters, unknown parameters are ignored.
    pub fn from_params<'a>(params: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        let mut options = Self::default();

        for (key, value) in params {
            match key {
                REV_PARAM => options = options.revision(value),
                ATTACHMENTS_PARAM => options = options.inline_attachments(is_true(value)),
                CONFLICTS_PARAM => options = options.conflicts(is_true(value)),
                _ => (),
            }
        }

        options
    }
}

/// Controls how a write treats a stale revision.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct UpdateOptions {
    pub(crate) allow_branching: bool,
}

impl UpdateOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep a write with a stale revision as a conflict branch instead of rejecting it.
    pub fn allow_branching(mut self, allow: bool) -> Self {
        self.allow_branching = allow;
        self
    }

    pub fn is_branching(&self) -> bool {
        self.allow_branching
    }

    /// Parses options from query parameters, unknown parameters are ignored.
    pub fn from_params<'a>(params: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        let mut options = Self::default();

        for (key, value) in params {
            if key == ALL_OR_NOTHING_PARAM {
                options = options.allow_branching(is_true(value));
            }
        }

        options
    }
}

#[cfg(test)]
mod tests {
    use crate::attachment::AttachmentMode;
    use crate::identifier::RevisionId;

    use super::{ReadOptions, UpdateOptions};

    #[test]
    fn read_options_from_params() {
        let options = ReadOptions::from_params([
            ("rev", "r1"),
            ("attachments", "true"),
            ("conflicts", "yes"),
            ("other", "true"),
        ]);

        assert_eq!(options.target_revision(), Some(&RevisionId::from("r1")));
        assert_eq!(options.attachment_mode(), AttachmentMode::Inline);
        assert!(!options.include_conflicts());

        let options = ReadOptions::from_params(Vec::new());
        assert_eq!(options, ReadOptions::default());
        assert_eq!(options.attachment_mode(), AttachmentMode::Stubs);
    }

    #[test]
    fn update_options_from_params() {
        assert!(UpdateOptions::from_params([("all_or_nothing", "true")]).is_branching());
        assert!(!UpdateOptions::from_params([("all_or_nothing", "1")]).is_branching());
        assert!(!UpdateOptions::default().is_branching());
    }
}
