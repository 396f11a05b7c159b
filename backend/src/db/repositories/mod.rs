//! Repository implementations.
//!
//! - `local`: in-memory implementation for the server and for tests
pub mod local;

pub use local::LocalRepository;
