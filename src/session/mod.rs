//! Saved scans.
//!
//! A session keeps the result of a finished scan (duplicate groups with
//! each file's resolved path or resolution error, the settings used and the
//! scan statistics) so it can be rendered again with `drivedupe load`
//! without touching the network.
//!
//! * [`data`]: serializable session model and conversions to and from reports
//! * [`io`]: saving and loading with a SHA-256 integrity checksum

pub mod data;
pub mod io;

pub use data::{Session, SessionFile, SessionGroup, SessionSettings, UnresolvedFile, SESSION_VERSION};
