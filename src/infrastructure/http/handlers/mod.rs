//! HTTP Handlers

mod audio;
mod ping;
mod run;
mod session;
mod voice;
mod websocket;

pub use audio::*;
pub use ping::*;
pub use run::*;
pub use session::*;
pub use voice::*;
pub use websocket::*;
