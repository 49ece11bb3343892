//! # Contracts
//!
//! Frozen interface contracts shared by every crate in the workspace.
//! Business crates depend on this crate only; reverse dependencies are prohibited.
//!
//! ## Time Model
//! - Dispatch payloads carry a wall-clock capture timestamp (`DateTime<Utc>`)
//!   taken when the producer submits, never when the consumer writes.

mod blueprint;
mod error;
mod payload;
mod sink;
mod stats;
mod user;

pub use blueprint::*;
pub use error::*;
pub use payload::*;
pub use sink::*;
pub use stats::DispatchSnapshot;
pub use user::*;
