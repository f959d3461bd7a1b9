//! Infrastructure Adapters
//!
//! 六边形架构的适配器实现

pub mod elevenlabs;
pub mod fake;
pub mod gemini;
pub mod storage;

pub use elevenlabs::*;
pub use fake::*;
pub use gemini::*;
pub use storage::*;
