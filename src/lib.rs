//! # wikibot-core
//!
//! Client core for bots talking to a MediaWiki wiki's action API.
//!
//! It covers the parts every bot needs before doing real work:
//! - encoding request parameters the way MediaWiki expects ([`Values`])
//! - authenticated GET/POST calls with a persistent cookie jar ([`Client::get`], [`Client::post`])
//! - fetching and caching security tokens ([`Client::get_token`])
//! - logging in, optionally from a credentials file ([`Client::login`], [`CredentialStore`])
//!
//! Nothing is retried. Every error reaches the caller as a [`WikiError`].

pub mod errors;
pub mod networking;
pub mod params;
mod utils;

pub use errors::{ApiError, Result, TransportError, WikiError};
pub use networking::{Client, ClientOptions, CredentialStore, Family, LoginState};
pub use params::Values;
