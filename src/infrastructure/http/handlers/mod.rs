//! HTTP Handlers

mod book;
mod chapter;
mod outline;
mod ping;
mod websocket;

pub use book::*;
pub use chapter::*;
pub use outline::*;
pub use ping::*;
pub use websocket::*;
