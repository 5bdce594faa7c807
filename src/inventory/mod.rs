//! Inventories of the two sides of a sync
//!
//! The local side comes from walking the static directory, the remote side
//! from the bucket listing. Both are rebuilt on every pass.

mod local;
mod remote;

pub use local::{guess_content_type, scan_local};
pub use remote::fetch_remote;
