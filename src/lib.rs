//! # passport-admin - Passport realm administration client
//!
//! A typed async Rust client for the Passport realm-scoped administration
//! REST API. The crate turns a declarative resource table (HTTP method,
//! path template, query allow-list) into callable operations, handling
//! bearer-token authentication with silent refresh, JSON encoding and
//! decoding, and typed error classification.
//!
//! ## Features
//!
//! - Declarative operation registry validated at client construction
//! - Path templates with per-call placeholder resolution and escaping
//! - Query allow-lists: unrecognized caller keys never reach the wire
//! - Just-in-time token refresh with a single shared in-flight renewal
//!   and an observable "re-authentication required" state
//! - Typed network errors carrying HTTP status and parsed error body
//! - Per-call cancellation distinct from failure
//!
//! ## Basic Usage
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use passport_admin::{
//!     AdminClient, AdminOp, CallOptions, Config, Params, TokenProvider, TokenSet, TokenSource,
//! };
//!
//! # struct MySource;
//! # #[async_trait::async_trait]
//! # impl TokenSource for MySource {
//! #     async fn refresh(&self, _: &str) -> passport_admin::Result<TokenSet> { unimplemented!() }
//! #     async fn login(&self) -> passport_admin::Result<TokenSet> { unimplemented!() }
//! # }
//! # async fn run() -> passport_admin::Result<()> {
//! let tokens = Arc::new(TokenProvider::new(Arc::new(MySource)));
//! tokens
//!     .set_token_set(TokenSet::new("access".into(), Some("refresh".into()), 300))
//!     .await;
//!
//! let config = Config::new("https://id.example.com/", "master")?;
//! let client = AdminClient::new(config, tokens)?;
//!
//! let mut params = Params::new();
//! params.insert("first".into(), passport_admin::json!(0));
//! params.insert("max".into(), passport_admin::json!(20));
//!
//! let principals: Vec<passport_admin::PrincipalRepresentation> = client
//!     .apply(AdminOp::ListPrincipals, &params, None, CallOptions::default())
//!     .await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Failure handling
//!
//! All HTTP-level failures surface as [`AdminError::Http`] carrying a
//! [`NetworkError`] with the response status and parsed body, so calling
//! code has one shape to branch on:
//!
//! ```no_run
//! # use passport_admin::{AdminError, Result};
//! # fn handle(result: Result<()>) {
//! match result {
//!     Err(err) if err.is_permission_denied() => { /* sign out */ }
//!     Err(err) if err.is_not_found() => { /* absent resource */ }
//!     Err(err) if err.is_cancelled() => { /* ignore */ }
//!     Err(err) => eprintln!("request failed: {err}"),
//!     Ok(value) => { /* use value */ }
//! }
//! # }
//! ```

pub mod client;
pub mod error;
pub mod path;
pub mod query;
pub mod resource;
pub mod rest;
pub mod token;
pub mod types;

// Re-export main types for convenience
pub use client::Config;
pub use error::{AdminError, ErrorBody, NetworkError, Result};
pub use resource::{AdminOp, Params, ResourceDescriptor};
pub use rest::{AdminClient, CallOptions};
pub use token::{AuthState, TokenProvider, TokenSet, TokenSource};
pub use types::{AgencyConfigRepresentation, PrincipalRepresentation, SuspendRequest};

// Re-export serde_json for convenience
pub use serde_json::json;
