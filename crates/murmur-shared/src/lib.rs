//! # murmur-shared
//!
//! Identifiers, domain models and the host protocol shared by every Murmur
//! crate.

pub mod constants;
pub mod error;
pub mod models;
pub mod protocol;
pub mod types;

pub use error::ProtocolError;
