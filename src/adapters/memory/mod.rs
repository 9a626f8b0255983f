//! In-memory lineage store
//!
//! Used for dry runs and tests. Implements the same transactional contract
//! as the PostgreSQL backend.

pub mod store;

pub use store::{FailurePoint, MemoryStore};
