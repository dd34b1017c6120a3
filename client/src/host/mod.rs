//! Host-side helpers: the pieces a media player application keeps next to
//! its [`Reconciler`](reelsync_engine::Reconciler).

mod chat;
mod player;

pub use chat::{export_file_name, ChatLog};
pub use player::SimulatedPlayer;
