//! # User Service
//!
//! 用户管理 HTTP 服务与组合根。
//!
//! 负责：
//! - 内存用户存储 (`UserStore`)
//! - CRUD 处理函数，副作用通过三个分发器异步投递
//! - 中间件装配：准入 → 观测 → 超时 → 路由
//! - 分发器的创建与按序排空

pub mod effects;
pub mod error;
pub mod handlers;
pub mod rejection;
pub mod router;
pub mod runtime;
pub mod state;
pub mod store;

pub use effects::SideEffects;
pub use error::ApiError;
pub use rejection::RejectionRecorder;
pub use router::build_router;
pub use runtime::{BootstrapError, Dispatchers, Service};
pub use state::AppState;
pub use store::{StoreError, UserStore};
