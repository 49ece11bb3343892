//! # Admission
//!
//! 准入限流模块。
//!
//! 负责：
//! - 令牌桶 (`TokenBucket`)：按经过时间惰性补充
//! - 可整体替换的共享闸门 (`AdmissionGate`)
//! - axum 中间件：拒绝时返回 429 并触发 `RejectionHook`

pub mod bucket;
pub mod gate;
pub mod layer;

pub use bucket::TokenBucket;
pub use contracts::RateLimitConfig;
pub use gate::AdmissionGate;
pub use layer::{admit, Admission, RejectionHook, REJECTION_BODY};
