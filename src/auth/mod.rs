//! Auth operations — register, login, profile fetch, logout.
//!
//! SYSTEM CONTEXT
//! ==============
//! Thin use-cases on top of the dispatcher. Local validation runs first and
//! never reaches the network; successful register/login write the returned
//! token and user into the credential store.
//!
//! ERROR HANDLING
//! ==============
//! User-initiated calls return `Result<_, ApiError>`. `refresh_profile` is
//! the passive variant: it logs and swallows failures so a flaky network
//! never logs anyone out. A 401 is still handled by the dispatcher.

pub mod validation;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::net::{ApiError, Dispatcher, HttpMethod};
use crate::store::User;
use validation::mask_phone;

pub const REGISTER_PATH: &str = "/auth/register";
pub const LOGIN_PATH: &str = "/auth/login";
pub const ME_PATH: &str = "/auth/me";
pub const LOGOUT_PATH: &str = "/auth/logout";

/// `{token, user}` as returned by register and login.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct AuthResponse {
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub user: Option<User>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RegisterRequest<'a> {
    full_name: &'a str,
    phone: &'a str,
    password: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    referral_code: Option<&'a str>,
}

#[derive(Serialize)]
struct LoginRequest<'a> {
    phone: &'a str,
    password: &'a str,
}

#[derive(Deserialize)]
struct MeResponse {
    user: User,
}

#[derive(Debug, Clone)]
pub struct AuthClient {
    dispatcher: Dispatcher,
}

impl AuthClient {
    #[must_use]
    pub fn new(dispatcher: Dispatcher) -> Self {
        Self { dispatcher }
    }

    #[must_use]
    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Create an account and start a session.
    ///
    /// # Errors
    ///
    /// [`ApiError::Validation`] before any network call when a field is
    /// invalid; otherwise whatever the dispatcher returns.
    pub async fn register(
        &self,
        full_name: &str,
        phone: &str,
        password: &str,
        referral_code: Option<&str>,
    ) -> Result<AuthResponse, ApiError> {
        let reg = validation::validate_registration(full_name, phone, password, referral_code)?;
        let body = RegisterRequest {
            full_name: &reg.full_name,
            phone: &reg.phone,
            password: &reg.password,
            referral_code: reg.referral_code.as_deref(),
        };

        let value = self
            .dispatcher
            .send(HttpMethod::Post, REGISTER_PATH, Some(to_body(&body)?), false)
            .await?;
        let response = self.establish(value)?;
        tracing::info!(phone = %mask_phone(&reg.phone), referred = reg.referral_code.is_some(), "registered");
        Ok(response)
    }

    /// Log in with phone + password and start a session.
    ///
    /// # Errors
    ///
    /// [`ApiError::Validation`] before any network call when the phone shape
    /// or password length is wrong; otherwise whatever the dispatcher returns.
    pub async fn login(&self, phone: &str, password: &str) -> Result<AuthResponse, ApiError> {
        validation::validate_phone(phone)?;
        validation::validate_password_length(password)?;

        let body = LoginRequest { phone, password };
        let value = self
            .dispatcher
            .send(HttpMethod::Post, LOGIN_PATH, Some(to_body(&body)?), false)
            .await?;
        let response = self.establish(value)?;
        tracing::info!(phone = %mask_phone(phone), "logged in");
        Ok(response)
    }

    /// Fetch the current profile and refresh the cached user.
    ///
    /// The cache write is skipped when the store was cleared while the call
    /// was in flight, so a concurrent logout always wins.
    ///
    /// # Errors
    ///
    /// Whatever the dispatcher returns, or [`ApiError::MalformedResponse`]
    /// when the body has no `user`.
    pub async fn get_me(&self) -> Result<User, ApiError> {
        let store = self.dispatcher.store();
        let generation = store.generation();
        let value = self.dispatcher.send(HttpMethod::Get, ME_PATH, None, true).await?;
        let MeResponse { user } =
            serde_json::from_value(value).map_err(|e| ApiError::MalformedResponse(e.to_string()))?;
        store.save_user_if_current(generation, &user);
        Ok(user)
    }

    /// Passive background refresh. Never fails; errors are logged.
    pub async fn refresh_profile(&self) -> Option<User> {
        match self.get_me().await {
            Ok(user) => Some(user),
            Err(e) => {
                tracing::warn!(code = e.error_code(), error = %e, "profile refresh failed");
                None
            }
        }
    }

    /// Best-effort server logout, then unconditional local clear and
    /// redirect to login.
    pub async fn logout(&self) {
        if let Err(e) = self
            .dispatcher
            .send(HttpMethod::Post, LOGOUT_PATH, Some(Value::Object(serde_json::Map::new())), true)
            .await
        {
            tracing::debug!(error = %e, "server logout failed, clearing locally anyway");
        }
        self.dispatcher.store().clear();
        self.dispatcher.session().on_logout();
        tracing::info!("logged out");
    }

    fn establish(&self, value: Value) -> Result<AuthResponse, ApiError> {
        let response: AuthResponse =
            serde_json::from_value(value).map_err(|e| ApiError::MalformedResponse(e.to_string()))?;
        if response.token.is_none() && response.user.is_none() {
            return Err(ApiError::MalformedResponse("response carried neither token nor user".to_owned()));
        }
        self.dispatcher
            .store()
            .save(response.token.as_deref(), response.user.as_ref());
        self.dispatcher.session().on_authenticated();
        Ok(response)
    }
}

fn to_body<T: Serialize>(body: &T) -> Result<Value, ApiError> {
    serde_json::to_value(body).map_err(|e| ApiError::Validation(e.to_string()))
}

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;
