//! PlayIt Live integration
//!
//! Wire models, the upstream traits the pipeline depends on, and the
//! reqwest-backed client implementing them.

pub mod client;
pub mod gateway;
pub mod models;

pub use client::PlayItLiveClient;
pub use gateway::{GatewayError, PlayoutLog, TrackLibrary};
pub use models::{AdditionalField, PlayoutItem, PlayoutItemKind, TrackGroup, TrackListItem};
