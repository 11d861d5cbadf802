// SPDX-License-Identifier: MIT OR Apache-2.0

//! Deterministic helpers for tests.
use std::sync::atomic::{AtomicU64, Ordering};

use crate::identifier::IdentifierSource;

/// Identifier source yielding `prefix` followed by an increasing counter, starting at 1.
#[derive(Debug)]
pub struct SequentialIdentifiers {
    prefix: String,
    counter: AtomicU64,
}

impl SequentialIdentifiers {
    pub fn new(prefix: &str) -> Self {
        Self {
            prefix: prefix.to_owned(),
            counter: AtomicU64::new(0),
        }
    }

    /// Number of identifiers handed out so far.
    pub fn issued(&self) -> u64 {
        self.counter.load(Ordering::SeqCst)
    }
}

impl IdentifierSource for SequentialIdentifiers {
    fn next_id(&self) -> String {
        let next = self.counter.fetch_add(1, Ordering::SeqCst) + 1;
        format!("{}{}", self.prefix, next)
    }
}

/// Install a log subscriber when `RUST_LOG` is set.
pub fn setup_logging() {
    if std::env::var("RUST_LOG").is_ok() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .try_init();
    }
}
