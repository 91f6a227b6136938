//! Google Calendar integration: OAuth credential lifecycle and event queries.

pub mod client;
pub mod config;
pub mod oauth;
pub mod store;
pub mod tokens;

pub use client::CalendarClient;
pub use config::{GoogleConfig, OAuthCredentials};
pub use oauth::OAuthClient;
pub use store::CredentialStore;
pub use tokens::{TokenInfo, TokenStorage};
