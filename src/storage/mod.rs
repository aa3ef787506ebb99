//! Key-value persistence for mathce1.
//!
//! Progression, sessions, badges and child profiles are each stored as one
//! JSON blob under a fixed key. Backends only move `serde_json::Value`s
//! around; [`JsonStorage`] adds typed access with fail-open defaults.

pub mod file;
pub mod json;
pub mod memory;
pub mod traits;

pub use file::FileStore;
pub use json::{keys, JsonStorage, KEY_PREFIX};
pub use memory::MemoryStore;
pub use traits::KeyValueStore;
