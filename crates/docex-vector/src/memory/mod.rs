//! In-process backend.
//!
//! [`InMemoryServer`] emulates the parts of a Milvus server the provisioning
//! pipeline touches: collections with a fixed schema, at most one index per
//! field, and inserts that only count towards the row count after a flush.
//! It backs the test suite and the CLI's dry-run mode.

mod backend;

pub use backend::{InMemoryBackend, InMemoryConnector, InMemoryServer};
