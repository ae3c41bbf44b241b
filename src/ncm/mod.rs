//! Client side of the NetEase Cloud Music API.

pub mod api;
pub mod models;
pub mod resolve;

pub use api::NcmClient;
pub use resolve::TrackResolver;
