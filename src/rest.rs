use std::sync::Arc;

use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Response};
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::client::{create_admin_client, Config};
use crate::error::{AdminError, NetworkError, Result};
use crate::path;
use crate::query;
use crate::resource::{AdminOp, Params};
use crate::token::TokenProvider;

/// Per-call options for a dispatched request
#[derive(Debug, Clone, Default)]
pub struct CallOptions {
    /// Cancels the in-flight call; the call settles with
    /// [`AdminError::Cancelled`] instead of a network error
    pub cancel: Option<CancellationToken>,
}

impl CallOptions {
    /// Options carrying a cancellation token
    pub fn cancellable(cancel: CancellationToken) -> Self {
        CallOptions {
            cancel: Some(cancel),
        }
    }
}

/// Client for the realm administration REST API.
///
/// Holds the HTTP connection pool, the client configuration and a shared
/// [`TokenProvider`]. Each registered [`AdminOp`] becomes callable through
/// [`execute`](AdminClient::execute) (raw JSON) or
/// [`apply`](AdminClient::apply) (typed).
pub struct AdminClient {
    /// HTTP client
    client: Client,
    /// Configuration
    config: Config,
    /// Bearer token provider shared across derived clients
    tokens: Arc<TokenProvider>,
}

impl AdminClient {
    /// Create a new admin client.
    ///
    /// Validates every registered resource descriptor once, so a malformed
    /// path template fails here rather than on first dispatch.
    pub fn new(config: Config, tokens: Arc<TokenProvider>) -> Result<Self> {
        crate::resource::validate_registry()?;

        Ok(AdminClient {
            client: create_admin_client(),
            config,
            tokens,
        })
    }

    /// Derive a client addressing another realm.
    ///
    /// The connection pool and token provider are shared; the original
    /// client keeps its realm.
    pub fn with_realm(&self, realm: impl Into<String>) -> Self {
        AdminClient {
            client: self.client.clone(),
            config: self.config.with_realm(realm),
            tokens: self.tokens.clone(),
        }
    }

    /// Get the client configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Get the shared token provider
    pub fn tokens(&self) -> &Arc<TokenProvider> {
        &self.tokens
    }

    /// Execute an operation and unmarshal the JSON result into `T`.
    ///
    /// An empty response body (e.g. 204 from a delete) deserializes from
    /// JSON null, so `T = ()` works for action operations.
    pub async fn apply<T>(
        &self,
        op: AdminOp,
        params: &Params,
        body: Option<&Value>,
        options: CallOptions,
    ) -> Result<T>
    where
        T: serde::de::DeserializeOwned,
    {
        let value = self.execute(op, params, body, options).await?;
        serde_json::from_value(value.unwrap_or(Value::Null)).map_err(AdminError::from)
    }

    /// Execute an operation and return the raw JSON result.
    ///
    /// Returns `Ok(None)` for responses without a JSON body (204, empty
    /// bodies, non-JSON content types on success).
    pub async fn execute(
        &self,
        op: AdminOp,
        params: &Params,
        body: Option<&Value>,
        options: CallOptions,
    ) -> Result<Option<Value>> {
        let descriptor = op.descriptor();

        // Path resolution sees the caller's parameters plus the realm from
        // the client context.
        let mut path_params = params.clone();
        path_params.insert("realm".to_string(), Value::String(self.config.realm().to_string()));
        let resolved = path::resolve(descriptor.path, &path_params)?;

        let mut url = self.config.base_url().join(&resolved)?;
        for (key, value) in query::normalize(descriptor.query_keys, params) {
            url.query_pairs_mut().append_pair(&key, &value);
        }

        // Token acquisition completes before the request is built, so a
        // pending refresh can never race the header snapshot.
        let token = self.tokens.get_access_token().await;

        let mut request = self.client.request(descriptor.method.clone(), url);
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }
        if let Some(body) = body {
            request = request
                .header(CONTENT_TYPE, "application/json")
                .body(serde_json::to_vec(body)?);
        }

        let started = std::time::Instant::now();
        let call = async {
            let response = request.send().await?;
            let status = response.status();
            let json = declares_json(&response);
            let bytes = response.bytes().await?;
            Ok::<_, AdminError>((status, json, bytes))
        };

        let (status, json, bytes) = match options.cancel {
            Some(cancel) => tokio::select! {
                _ = cancel.cancelled() => return Err(AdminError::Cancelled),
                result = call => result?,
            },
            None => call.await?,
        };

        debug!(
            method = %descriptor.method,
            path = %resolved,
            status = status.as_u16(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "dispatched"
        );

        if !status.is_success() {
            return Err(AdminError::Http(NetworkError::classify(status, &bytes)));
        }

        if bytes.is_empty() || !json {
            return Ok(None);
        }
        Ok(Some(serde_json::from_slice(&bytes)?))
    }
}

/// Check whether the response declares a JSON body
fn declares_json(response: &Response) -> bool {
    response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.starts_with("application/json"))
        .unwrap_or(false)
}

impl Clone for AdminClient {
    fn clone(&self) -> Self {
        AdminClient {
            client: self.client.clone(),
            config: self.config.clone(),
            tokens: self.tokens.clone(),
        }
    }
}
