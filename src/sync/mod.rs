//! Directory → bucket reconciliation
//!
//! A pass scans the static directory, lists the bucket, merges both into an
//! [`Inventory`], deletes remote-only objects and re-uploads every local
//! file. Nothing is cached between passes.

mod executor;
mod reconcile;

pub use executor::{build_inventory, sync, sync_inventory};
pub use reconcile::Inventory;
