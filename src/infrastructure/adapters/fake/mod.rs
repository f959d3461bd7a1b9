//! Fake Adapters - 离线实现
//!
//! dry-run 模式和测试使用，不访问任何外部服务

mod fake_generator;
mod fake_stager;
mod fake_synthesizer;

pub use fake_generator::FakeScriptGenerator;
pub use fake_stager::FakeDocumentStager;
pub use fake_synthesizer::FakeVoiceSynthesizer;

use std::sync::{Mutex, MutexGuard};

/// 记录类字段加锁，忽略 poison
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}
