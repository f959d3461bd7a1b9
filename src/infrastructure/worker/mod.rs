//! Worker Layer - Background Task Processing
//!
//! 实现 SessionReaper，回收长时间空闲的会话

mod session_reaper;

pub use session_reaper::{SessionReaper, SessionReaperConfig};
