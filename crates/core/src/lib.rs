// crates/core/src/lib.rs
//! Domain types shared by the watchtower storage and server crates.

pub mod error;
pub mod filter;
pub mod paths;
pub mod types;

pub use error::*;
pub use filter::PathFilter;
pub use types::*;
