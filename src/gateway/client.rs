use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, Url};
use serde::Serialize;

use crate::core::types::MatchId;
use crate::gateway::config::{GatewayConfig, GatewayError, CSRF_HEADER};
use crate::gateway::wire::{
    interpret_create, interpret_delete, CreateMatchRequest, CreateOutcome, DeleteMatchRequest,
    DeleteOutcome, TransportFailure,
};

/// The two server calls a reconciliation session makes.
///
/// Implementations never fail: every problem is folded into the outcome type.
#[allow(async_fn_in_trait)]
pub trait MatchGateway {
    async fn create_match(&self, request: &CreateMatchRequest) -> CreateOutcome;

    async fn delete_match(&self, match_id: &MatchId) -> DeleteOutcome;
}

/// HTTP implementation posting JSON to the configured endpoints
#[derive(Debug, Clone)]
pub struct HttpGateway {
    client: Client,
    config: GatewayConfig,
}

impl HttpGateway {
    /// Build a gateway; the CSRF token, when set, becomes a default header
    ///
    /// # Errors
    ///
    /// Returns an error if the token is not a valid header value or the HTTP
    /// client cannot be constructed.
    pub fn new(config: GatewayConfig) -> Result<Self, GatewayError> {
        let mut headers = HeaderMap::new();
        if let Some(token) = &config.csrf_token {
            let value = HeaderValue::from_str(token).map_err(|_| GatewayError::InvalidToken)?;
            headers.insert(HeaderName::from_static(CSRF_HEADER), value);
        }
        let client = Client::builder().default_headers(headers).build()?;
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    /// POST a JSON body, returning status and raw body bytes
    async fn post<T: Serialize + ?Sized>(
        &self,
        url: &Url,
        body: &T,
    ) -> Result<(u16, Vec<u8>), TransportFailure> {
        let response = self
            .client
            .post(url.clone())
            .json(body)
            .send()
            .await
            .map_err(|e| TransportFailure::Network(e.to_string()))?;
        let status = response.status().as_u16();
        let bytes = response
            .bytes()
            .await
            .map_err(|e| TransportFailure::Network(e.to_string()))?;
        Ok((status, bytes.to_vec()))
    }
}

impl MatchGateway for HttpGateway {
    async fn create_match(&self, request: &CreateMatchRequest) -> CreateOutcome {
        tracing::debug!(
            url = %self.config.match_url,
            bank = request.bank_ids.len(),
            gl = request.gl_ids.len(),
            "Creating match"
        );
        match self.post(&self.config.match_url, &request.body()).await {
            Ok((status, body)) => interpret_create(request, status, &body),
            Err(failure) => CreateOutcome::TransportFailure(failure),
        }
    }

    async fn delete_match(&self, match_id: &MatchId) -> DeleteOutcome {
        tracing::debug!(url = %self.config.unmatch_url, %match_id, "Deleting match");
        let body = DeleteMatchRequest { match_id };
        match self.post(&self.config.unmatch_url, &body).await {
            Ok((status, body)) => interpret_delete(status, &body),
            Err(failure) => DeleteOutcome::TransportFailure(failure),
        }
    }
}
