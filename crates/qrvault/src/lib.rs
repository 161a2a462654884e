//! `qrvault` - Anonymous per-client history of generated QR codes
//!
//! This library provides the storage, operations and HTTP API behind the
//! `qrvault` binary. Clients are identified only by an opaque identifier they
//! generate themselves; each client owns a list of saved QR payloads.

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

pub mod api;
pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod record;
pub mod server;
pub mod storage;
pub mod vault;

pub use api::{api_routes, AppState};
pub use config::Config;
pub use error::{Error, Result};
pub use logging::init_logging;
pub use record::{Client, Record};
pub use server::Server;
pub use storage::{Session, Storage, StorageStats};
