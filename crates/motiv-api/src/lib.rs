// motiv-api: Async Rust client for the Motiv vendor API (Parse-hosted backend)

pub mod auth;
pub mod client;
pub mod error;
pub mod models;
pub mod records;
pub mod session;
pub mod transport;

pub use client::MotivClient;
pub use error::Error;
pub use models::{HeartRateRecord, SleepEvent, UserProfile};
pub use session::Session;
pub use transport::TransportConfig;
