//! HTTP API handlers for vaidya-hub
//!
//! JSON over HTTP plus one SSE stream for notices and domain events.

pub mod catalog;
pub mod chat;
pub mod game;
pub mod health;
pub mod progress;
pub mod remedies;
pub mod settings;
pub mod speech;
pub mod sse;

pub use catalog::catalog_routes;
pub use chat::chat_routes;
pub use game::game_routes;
pub use health::health_routes;
pub use progress::progress_routes;
pub use remedies::remedy_routes;
pub use settings::settings_routes;
pub use speech::speech_routes;
pub use sse::event_stream;
