//! Memory Layer - In-Memory State Management
//!
//! 实现 SessionManager，管理会话和运行状态

mod session_manager;

pub use session_manager::InMemorySessionManager;
