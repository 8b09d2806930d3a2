use reqwest::Url;
use thiserror::Error;

/// Header carrying the opaque anti-forgery token on every call (`X-CSRFToken`)
pub const CSRF_HEADER: &str = "x-csrftoken";

#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("No {0} endpoint configured: pass --server and --session, or --{0}-url")]
    MissingEndpoint(&'static str),

    #[error("Invalid URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("Invalid CSRF token: not a valid header value")]
    InvalidToken,

    #[error("Failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}

/// Where the match endpoints live and what to send with each call
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub match_url: Url,
    pub unmatch_url: Url,
    pub csrf_token: Option<String>,
}

fn parse_url(raw: &str) -> Result<Url, GatewayError> {
    Url::parse(raw).map_err(|e| GatewayError::InvalidUrl {
        url: raw.to_string(),
        reason: e.to_string(),
    })
}

impl GatewayConfig {
    /// Use explicit endpoint URLs
    ///
    /// # Errors
    ///
    /// Returns `GatewayError::InvalidUrl` if either URL does not parse.
    pub fn new(match_url: &str, unmatch_url: &str) -> Result<Self, GatewayError> {
        Ok(Self {
            match_url: parse_url(match_url)?,
            unmatch_url: parse_url(unmatch_url)?,
            csrf_token: None,
        })
    }

    /// Derive both endpoints from the server root and a reconciliation session:
    /// `{server}/reconcile/{session}/match/` and `.../unmatch/`
    ///
    /// # Errors
    ///
    /// Returns `GatewayError::InvalidUrl` if the server URL does not parse.
    pub fn for_session(server: &str, session_id: u64) -> Result<Self, GatewayError> {
        let base = server.trim_end_matches('/');
        Self::new(
            &format!("{base}/reconcile/{session_id}/match/"),
            &format!("{base}/reconcile/{session_id}/unmatch/"),
        )
    }

    /// Resolve endpoints from optional pieces. Explicit URLs win over the
    /// server/session layout.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError::MissingEndpoint` when an endpoint cannot be
    /// determined, or `GatewayError::InvalidUrl` when one does not parse.
    pub fn resolve(
        server: Option<&str>,
        session_id: Option<u64>,
        match_url: Option<&str>,
        unmatch_url: Option<&str>,
    ) -> Result<Self, GatewayError> {
        let derived = match (server, session_id) {
            (Some(server), Some(session)) => Some(Self::for_session(server, session)?),
            _ => None,
        };

        let match_url = match (match_url, &derived) {
            (Some(url), _) => parse_url(url)?,
            (None, Some(d)) => d.match_url.clone(),
            (None, None) => return Err(GatewayError::MissingEndpoint("match")),
        };
        let unmatch_url = match (unmatch_url, &derived) {
            (Some(url), _) => parse_url(url)?,
            (None, Some(d)) => d.unmatch_url.clone(),
            (None, None) => return Err(GatewayError::MissingEndpoint("unmatch")),
        };

        Ok(Self {
            match_url,
            unmatch_url,
            csrf_token: None,
        })
    }

    #[must_use]
    pub fn with_csrf_token(mut self, token: Option<String>) -> Self {
        self.csrf_token = token.filter(|t| !t.is_empty());
        self
    }
}
