//! Events - 运行事件推送

mod publisher;

pub use publisher::{EventPublisher, WsEvent};
