//! `tinybase` — the page-granular durable storage and Volcano-style
//! execution substrate of a teaching-oriented relational database engine.
//!
//! The module tree mirrors the dependency order of section 2's component
//! table: raw disk I/O and the buffer pool at the bottom, the copy-on-write
//! trie and the extendible hash index built on top of it, and the
//! executors and optimizer rules at the top, driving everything below
//! through the external-collaborator contracts of section 6.

pub mod buffer;
pub mod catalog;
pub mod common;
pub mod container;
pub mod execution;
pub mod expression;
pub mod optimizer;
pub mod storage;
pub mod types;

use std::sync::Once;

static TRACING_INIT: Once = Once::new();

/// Installs a `tracing-subscriber` `fmt` layer driven by `RUST_LOG`, once
/// per process. Safe to call from every test that wants logging: repeated
/// calls (e.g. across a test binary's many `#[test]` functions) are
/// no-ops after the first.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init()
            .ok();
    });
}
