//! Client-side session management for the ProfitWavy investment app.
//!
//! SYSTEM CONTEXT
//! ==============
//! Sits between user-facing pages (or the `profitwavy` CLI) and the HTTP
//! backend. Persists the bearer token and a cached user, attaches the token
//! to protected calls, and turns a server-side rejection into a single
//! local logout plus one redirect to the login page.
//!
//! LAYOUT
//! ======
//! - `store`: credential store over a pluggable key-value backend
//! - `net`: request dispatcher and HTTP transport
//! - `session`: lifecycle state machine and redirect policy
//! - `auth`: register, login, profile and logout operations
//! - `config`: environment-driven settings

pub mod auth;
pub mod config;
pub mod net;
pub mod session;
pub mod store;

pub use auth::AuthClient;
pub use config::SessionConfig;
pub use net::{ApiError, Dispatcher, ReqwestTransport};
pub use session::{PageKind, SessionController, SessionState};
pub use store::{CredentialStore, User};
