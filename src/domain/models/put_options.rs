use std::collections::BTreeMap;

use crate::domain::errors::ValidationError;

/// Content type used when [`PutOptions::content_type`] is unset
pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// Options attached to an uploaded object.
///
/// Every field is optional. An unset content type uploads as
/// `application/octet-stream`; the remaining headers are only sent when set.
/// User metadata keys are sent without any backend-specific prefix; the
/// backend adds its own (`x-amz-meta-` for S3).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PutOptions {
    pub content_type: Option<String>,
    pub content_encoding: Option<String>,
    pub content_disposition: Option<String>,
    pub cache_control: Option<String>,
    pub user_metadata: BTreeMap<String, String>,
}

impl PutOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    pub fn with_content_encoding(mut self, encoding: impl Into<String>) -> Self {
        self.content_encoding = Some(encoding.into());
        self
    }

    pub fn with_content_disposition(mut self, disposition: impl Into<String>) -> Self {
        self.content_disposition = Some(disposition.into());
        self
    }

    pub fn with_cache_control(mut self, cache_control: impl Into<String>) -> Self {
        self.cache_control = Some(cache_control.into());
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.user_metadata.insert(key.into(), value.into());
        self
    }

    /// The content type that will actually be sent
    pub fn effective_content_type(&self) -> &str {
        self.content_type.as_deref().unwrap_or(DEFAULT_CONTENT_TYPE)
    }

    /// Check that every field can be sent as an HTTP header
    pub fn validate(&self) -> Result<(), ValidationError> {
        let headers = [
            ("content_type", &self.content_type),
            ("content_encoding", &self.content_encoding),
            ("content_disposition", &self.content_disposition),
            ("cache_control", &self.cache_control),
        ];
        for (field, value) in headers {
            if let Some(value) = value {
                check_header_value(field, value)?;
            }
        }

        for (key, value) in &self.user_metadata {
            let valid_key = !key.is_empty()
                && key
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
            if !valid_key {
                return Err(ValidationError::InvalidMetadataKey(key.clone()));
            }
            check_header_value(key, value)?;
        }

        Ok(())
    }
}

fn check_header_value(field: &str, value: &str) -> Result<(), ValidationError> {
    if value.chars().any(|c| c.is_control()) {
        return Err(ValidationError::InvalidHeaderValue {
            field: field.to_string(),
            value: value.to_string(),
        });
    }
    Ok(())
}
