//! Filesystem observation: the notify adapter, the per-session event
//! pipeline and the single-slot session manager.

pub mod adapter;
pub mod pipeline;
pub mod session;

pub use pipeline::EventPipeline;
pub use session::{SessionManager, SessionStatus, WatchError};
