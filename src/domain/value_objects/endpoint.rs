use http::uri::Authority;

use crate::domain::errors::ValidationError;

/// A backend address in `host[:port]` form.
///
/// Transport is always TLS, so an endpoint never carries a scheme.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint(Authority);

impl Endpoint {
    pub fn parse(value: &str) -> Result<Self, ValidationError> {
        let value = value.trim();
        if value.is_empty() {
            return Err(ValidationError::EmptyEndpoint);
        }

        let invalid = |reason: &str| ValidationError::InvalidEndpoint {
            value: value.to_string(),
            reason: reason.to_string(),
        };

        if value.contains("://") {
            return Err(invalid("expected host[:port] without a scheme"));
        }

        let authority: Authority = value.parse().map_err(|e: http::uri::InvalidUri| {
            invalid(&e.to_string())
        })?;

        if value.contains('@') {
            return Err(invalid("credentials must not be embedded in the endpoint"));
        }

        if authority.host().is_empty() {
            return Err(invalid("missing host"));
        }

        Ok(Self(authority))
    }

    pub fn host(&self) -> &str {
        self.0.host()
    }

    pub fn port(&self) -> Option<u16> {
        self.0.port_u16()
    }

    /// The URL the transport session connects to
    pub fn https_url(&self) -> String {
        format!("https://{}", self.0)
    }
}

impl std::fmt::Display for Endpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
