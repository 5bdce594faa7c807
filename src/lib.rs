//! s3-assets - static files mirrored into S3
//!
//! Reconciles a local directory with a bucket (upload everything local,
//! delete everything remote-only) and resolves asset keys to public URLs
//! for a serving layer.

pub mod assets;
pub mod error;
pub mod inventory;
pub mod resolver;
pub mod serve;
pub mod store;
pub mod sync;
pub mod types;

pub use assets::{AssetStorage, SyncPlan};
pub use error::{AssetError, Result};
pub use resolver::UrlResolver;
pub use sync::Inventory;
pub use types::*;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
