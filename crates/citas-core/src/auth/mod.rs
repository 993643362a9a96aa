//! Authentication module for managing the user session and its storage.
//!
//! This module provides:
//! - `Session`: the held bearer token and its durable mirror
//! - `Storage`: key-value persistence, with file, keychain and in-memory
//!   backends
//!
//! The token lives under `authToken` and the user record under `usuario`.

pub mod credentials;
pub mod session;
pub mod storage;

pub use credentials::KeyringStorage;
pub use session::{Session, TOKEN_KEY, USER_KEY};
pub use storage::{FileStorage, MemoryStorage, Storage};
