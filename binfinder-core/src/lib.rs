//! Core types and conversation wiring for the binfinder waste disposal assistant.

/// Waste categories and the ordered label-to-bin rule table.
pub mod category;
/// Serde settings for search plans and backend endpoints.
pub mod config;
/// Great-circle distance, ranking, and map links.
pub mod geo;
/// Shared `GeoJSON` wire types and the fetch helper used by provider adapters.
pub mod geojson;
/// Translation of outbound replies into the user's language.
pub mod localizer;
/// Domain models shared by the router and all providers.
pub mod model;
/// Registry for plugging facility providers into the service.
pub mod plugin;
/// Traits describing providers and external collaborators, plus the error taxonomy.
pub mod ports;
/// Conversation state machine turning inbound events into replies.
pub mod router;
/// Facility lookup facade combining the registry, timeouts, and ranking.
pub mod service;
/// Per-user conversation state and its keyed store.
pub mod state;

pub use category::*;
pub use config::*;
pub use geo::*;
pub use localizer::*;
pub use model::*;
pub use plugin::*;
pub use ports::*;
pub use router::*;
pub use service::*;
pub use state::*;
