//! Telemetry provider access: the channel feed wire types and an HTTP
//! client that fetches the most recent reading.

pub mod client;
pub mod models;

pub use client::{TelemetrySource, ThingSpeakClient};
pub use models::{ChannelInfo, FeedEntry, FeedResponse};
