// SPDX-License-Identifier: MIT OR Apache-2.0

#![cfg_attr(doctest, doc=include_str!("../README.md"))]

//! Persistence layer for booth documents.
//!
//! A store maps document ids to [`Document`](booth_core::Document)s and routes every request
//! through the document engine of `booth-core`. The store itself adds what a single document can
//! not know about:
//!
//! - Creating documents on first write and assigning ids when a client posts without one.
//! - Serialising concurrent writers. Writes to the same document are strictly ordered, writes to
//!   different documents do not block each other.
//! - A store-wide update sequence, stamped onto each document after every successful write.
//!
//! ## Store implementations
//!
//! An in-memory storage solution is provided in the form of a `MemoryStore` which implements
//! `DocumentStore`. The store is gated by the `memory` feature flag and is enabled by default.
pub mod config;
pub mod error;
#[cfg(feature = "memory")]
pub mod memory;
pub mod traits;

pub use config::Config;
pub use error::StoreError;
#[cfg(feature = "memory")]
pub use memory::MemoryStore;
pub use traits::{DocumentStore, LocalDocumentStore};
