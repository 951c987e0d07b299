//! HTTP Handlers

mod library;
mod ping;
mod websocket;

pub use library::*;
pub use ping::*;
pub use websocket::*;
