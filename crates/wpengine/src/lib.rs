//! # WP Engine
//!
//! Resource kinds and a blocking HTTP client for the WP Engine hosting API,
//! ready to be driven by the [`reconcile`] engine.
//!
//! ## Modules
//!
//! - [`kinds`]: Schema tables for accounts, users, sites, installs, domains,
//!   SSH keys and CDNs, collected in [`CATALOG`]
//! - [`endpoint`]: Collection and item paths per kind
//! - [`client`]: [`ApiClient`], the `RemoteClient` over HTTPS
//!
//! Authentication is a bearer token; obtain one from the WP Engine user
//! portal's API access page.

pub mod client;
pub mod endpoint;
pub mod kinds;

pub use client::{ApiClient, DEFAULT_BASE_URL, DEFAULT_TIMEOUT, classify};
pub use endpoint::Endpoint;
pub use kinds::CATALOG;
