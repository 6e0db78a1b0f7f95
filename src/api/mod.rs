//! Investigation backend and identity provider clients.
//!
//! This module provides the interface for talking to the backend REST API,
//! its import progress stream and the identity provider's session endpoint.

pub mod auth;
mod client;
pub mod error;
mod progress;
mod session;
pub mod types;

pub use auth::SessionToken;
pub use client::GatewayClient;
pub use error::{ApiError, AuthRedirect, FailureKind, RemoteFailure};
pub use progress::{ImportEvent, ImportProgressStream, SseParser};
pub use session::{login_url, GuardOutcome, IdentityClient};
pub use types::{Message, NetworkGraph, Project, SearchRequest, Session, TreeNode};
