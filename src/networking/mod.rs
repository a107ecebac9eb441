//! Networking for the MediaWiki action API.
//!
//! This module provides:
//! - a blocking HTTP transport that keeps session cookies between calls
//! - per purpose token retrieval with caching
//! - the login handshake and wiki family credentials
//!
//! ## Usage - Blocking (default)
//!
//! ```no_run
//! use wikibot_core::networking::{Client, CredentialStore};
//!
//! let store = CredentialStore::load("config.json").expect("Failed to load credentials");
//! let wiki = store.family("testwiki").expect("Unknown family");
//!
//! let client = Client::from_family(wiki, Some("ExampleBot/0.1 (bot@example.org)"))
//!     .expect("Failed to create client");
//! client.login_family(wiki).expect("Login failed");
//!
//! let csrf = client.get_token("csrf").expect("Failed to get token");
//! ```

// Module declarations
pub mod auth;
pub mod client;

// Re-export commonly used items for convenience
pub use auth::blocking::LOGIN_TOKEN;
pub use auth::{CredentialStore, Family, LOGIN_SUCCESS, LoginState};
pub use client::blocking::{
    ApiResponse, Client, ClientOptions, DEFAULT_TIMEOUT, DEFAULT_USER_AGENT, FORMAT_PARAMS,
    create_client,
};

// Re-export types from dependencies for convenience
pub use reqwest::Error as NetworkError;
pub use reqwest::blocking::ClientBuilder;
pub use reqwest::cookie::Jar;
