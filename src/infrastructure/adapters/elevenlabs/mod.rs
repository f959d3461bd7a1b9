//! ElevenLabs Adapter - 语音合成

mod client;

pub use client::{ElevenLabsClient, ElevenLabsClientConfig};
