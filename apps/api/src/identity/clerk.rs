//! Clerk backend API implementation of [`IdentityProvider`].
//!
//! Plan is read from `public_metadata.plan`, the counter from
//! `private_metadata.free_usage`.

use async_trait::async_trait;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use reqwest::{Client, Response};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

use super::{IdentityError, IdentityProvider};
use crate::models::user::{Caller, Entitlement, Tier};

#[derive(Debug, Deserialize)]
struct SessionClaims {
    sid: String,
}

#[derive(Debug, Deserialize)]
struct ClerkSession {
    user_id: String,
    status: String,
}

#[derive(Debug, Deserialize)]
struct ClerkUser {
    #[serde(default)]
    public_metadata: Value,
    #[serde(default)]
    private_metadata: Value,
}

#[derive(Debug, Deserialize)]
struct ClerkErrors {
    errors: Vec<ClerkErrorBody>,
}

#[derive(Debug, Deserialize)]
struct ClerkErrorBody {
    message: String,
    long_message: Option<String>,
}

#[derive(Clone)]
pub struct ClerkIdentity {
    client: Client,
    api_url: String,
    secret_key: String,
}

impl ClerkIdentity {
    pub fn new(api_url: &str, secret_key: String) -> Result<Self, IdentityError> {
        Ok(Self {
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(30))
                .build()?,
            api_url: api_url.trim_end_matches('/').to_string(),
            secret_key,
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/v1/{}", self.api_url, path)
    }
}

#[async_trait]
impl IdentityProvider for ClerkIdentity {
    async fn authenticate(&self, token: &str) -> Result<Caller, IdentityError> {
        let session_id = session_id_from_token(token)?;

        // TODO: verify the JWT locally against Clerk's JWKS instead; this
        // endpoint is deprecated and costs a round trip per request.
        let response = self
            .client
            .post(self.endpoint(&format!("sessions/{session_id}/verify")))
            .bearer_auth(&self.secret_key)
            .json(&json!({ "token": token }))
            .send()
            .await?;
        let session: ClerkSession = ensure_success(response).await?.json().await?;

        if session.status != "active" {
            return Err(IdentityError::InvalidToken(format!(
                "session {session_id} is {}",
                session.status
            )));
        }

        debug!("Verified session {session_id} for user {}", session.user_id);
        Ok(Caller {
            user_id: session.user_id,
        })
    }

    async fn entitlement(&self, user_id: &str) -> Result<Entitlement, IdentityError> {
        let response = self
            .client
            .get(self.endpoint(&format!("users/{user_id}")))
            .bearer_auth(&self.secret_key)
            .send()
            .await?;
        let user: ClerkUser = ensure_success(response).await?.json().await?;

        Ok(entitlement_from_metadata(
            &user.public_metadata,
            &user.private_metadata,
        ))
    }

    async fn record_free_usage(
        &self,
        user_id: &str,
        free_usage: u32,
    ) -> Result<(), IdentityError> {
        // Clerk deep-merges metadata, so other private keys survive this PATCH.
        let response = self
            .client
            .patch(self.endpoint(&format!("users/{user_id}/metadata")))
            .bearer_auth(&self.secret_key)
            .json(&json!({ "private_metadata": { "free_usage": free_usage } }))
            .send()
            .await?;
        ensure_success(response).await?;
        Ok(())
    }
}

async fn ensure_success(response: Response) -> Result<Response, IdentityError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ClerkErrors>(&body)
        .ok()
        .and_then(|e| e.errors.into_iter().next())
        .map(|e| e.long_message.unwrap_or(e.message))
        .unwrap_or(body);

    Err(IdentityError::Api {
        status: status.as_u16(),
        message,
    })
}

/// Reads the `sid` claim from a session JWT without checking its signature.
/// The session is verified server-side afterwards.
fn session_id_from_token(token: &str) -> Result<String, IdentityError> {
    let mut parts = token.split('.');
    let payload = match (parts.next(), parts.next(), parts.next(), parts.next()) {
        (Some(_), Some(payload), Some(_), None) => payload,
        _ => return Err(IdentityError::InvalidToken("malformed JWT".to_string())),
    };

    let decoded = URL_SAFE_NO_PAD
        .decode(payload.trim_end_matches('='))
        .map_err(|e| IdentityError::InvalidToken(format!("payload is not base64url: {e}")))?;
    let claims: SessionClaims = serde_json::from_slice(&decoded)
        .map_err(|e| IdentityError::InvalidToken(format!("missing sid claim: {e}")))?;

    Ok(claims.sid)
}

fn entitlement_from_metadata(public: &Value, private: &Value) -> Entitlement {
    let tier = Tier::from_plan(public.get("plan").and_then(Value::as_str));
    let free_usage = private
        .get("free_usage")
        .and_then(Value::as_u64)
        .map(|n| u32::try_from(n).unwrap_or(u32::MAX))
        .unwrap_or(0);

    Entitlement { tier, free_usage }
}
