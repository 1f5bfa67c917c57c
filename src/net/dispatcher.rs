//! Request dispatcher: one logical HTTP call, no retries.
//!
//! Attaches the bearer token when asked, sends everything as JSON, and
//! turns the HTTP status into either a JSON value or an [`ApiError`]. A 401
//! clears the credential store and then tells the session controller,
//! unless the credential changed while the request was in flight.

use std::sync::Arc;

use serde_json::Value;

use super::transport::Transport;
use super::types::{ApiError, GENERIC_FAILURE_MESSAGE, HttpMethod, OutboundRequest, PendingRequest, TransportResponse};
use crate::config::normalize_base;
use crate::session::SessionController;
use crate::store::CredentialStore;

#[derive(Clone)]
pub struct Dispatcher {
    base_url: String,
    transport: Arc<dyn Transport>,
    store: CredentialStore,
    session: SessionController,
}

impl Dispatcher {
    #[must_use]
    pub fn new(
        base_url: &str,
        transport: Arc<dyn Transport>,
        store: CredentialStore,
        session: SessionController,
    ) -> Self {
        Self { base_url: normalize_base(base_url), transport, store, session }
    }

    #[must_use]
    pub fn store(&self) -> &CredentialStore {
        &self.store
    }

    #[must_use]
    pub fn session(&self) -> &SessionController {
        &self.session
    }

    /// Send one request.
    ///
    /// # Errors
    ///
    /// - [`ApiError::Network`] when no response arrived
    /// - [`ApiError::AuthenticationExpired`] on 401 (store already cleared)
    /// - [`ApiError::EndpointNotFound`] on 404
    /// - [`ApiError::RequestFailed`] on any other non-2xx status
    pub async fn send(
        &self,
        method: HttpMethod,
        path: &str,
        body: Option<Value>,
        requires_auth: bool,
    ) -> Result<Value, ApiError> {
        self.dispatch(PendingRequest { method, path: path.to_owned(), body, requires_auth })
            .await
    }

    /// Send a [`PendingRequest`]. See [`Dispatcher::send`].
    ///
    /// # Errors
    ///
    /// Same as [`Dispatcher::send`].
    pub async fn dispatch(&self, request: PendingRequest) -> Result<Value, ApiError> {
        let outbound = self.resolve(&request);
        let generation = self.store.generation();
        let response = match self.transport.execute(&outbound).await {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(method = %request.method, path = %request.path, error = %e, "request did not complete");
                return Err(e);
            }
        };

        tracing::debug!(method = %request.method, path = %request.path, status = response.status, "response received");
        let result = classify_response(&request.path, &response);
        if matches!(result, Err(ApiError::AuthenticationExpired)) {
            if self.store.clear_if_current(generation) {
                self.session.on_unauthorized();
                self.session.on_cleared();
            } else {
                tracing::debug!(path = %request.path, "401 for a superseded session, ignoring");
            }
        }
        result
    }

    fn resolve(&self, request: &PendingRequest) -> OutboundRequest {
        let mut headers = vec![("Content-Type".to_owned(), "application/json".to_owned())];
        if request.requires_auth {
            match self.store.load_token() {
                Some(token) => headers.push(("Authorization".to_owned(), format!("Bearer {token}"))),
                // A server-set session cookie may still satisfy the call.
                None => tracing::debug!(path = %request.path, "no bearer token, sending unauthenticated"),
            }
        }

        let body = if request.method.carries_body() {
            request.body.as_ref().map(Value::to_string)
        } else {
            None
        };

        OutboundRequest { method: request.method, url: format!("{}{}", self.base_url, request.path), headers, body }
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

/// Map status + body to the call's outcome. Pure, no side effects.
pub(crate) fn classify_response(path: &str, response: &TransportResponse) -> Result<Value, ApiError> {
    let parsed = serde_json::from_str::<Value>(&response.body).ok();
    match response.status {
        200..=299 => Ok(parsed.unwrap_or_else(|| serde_json::json!({ "message": response.body }))),
        401 => Err(ApiError::AuthenticationExpired),
        404 => Err(ApiError::EndpointNotFound { path: path.to_owned() }),
        status => {
            let message = parsed
                .as_ref()
                .and_then(|v| v.get("message"))
                .and_then(Value::as_str)
                .filter(|m| !m.is_empty())
                .unwrap_or(GENERIC_FAILURE_MESSAGE)
                .to_owned();
            Err(ApiError::RequestFailed { status, message })
        }
    }
}

#[cfg(test)]
#[path = "dispatcher_test.rs"]
mod tests;
