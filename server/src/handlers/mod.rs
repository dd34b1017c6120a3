//! Connection handlers.

mod websocket;

pub use websocket::handle_websocket_connection;
