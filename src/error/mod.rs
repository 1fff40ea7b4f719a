use thiserror::Error;

use crate::notification::Channel;
use crate::store::StoreError;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error(
        "Template not found: tenant={tenant_id} channel={channel} type={template_type} locale={locale}"
    )]
    NotFound {
        tenant_id: String,
        channel: Channel,
        template_type: String,
        locale: String,
    },

    #[error("Template store error: {0}")]
    Store(#[from] StoreError),

    #[error("Encoding error: {0}")]
    Encoding(String),

    #[error("Invalid template: {0}")]
    InvalidTemplate(String),

    #[error("Invalid channel: {0}")]
    InvalidChannel(String),

    #[error("Unknown tenant domain: {0}")]
    UnknownTenant(String),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),
}

impl EngineError {
    /// Stable machine-readable code for this error
    pub fn code(&self) -> &'static str {
        match self {
            EngineError::NotFound { .. } => "TEMPLATE_NOT_FOUND",
            EngineError::Store(_) => "STORE_ERROR",
            EngineError::Encoding(_) => "ENCODING_ERROR",
            EngineError::InvalidTemplate(_) => "INVALID_TEMPLATE",
            EngineError::InvalidChannel(_) => "INVALID_CHANNEL",
            EngineError::UnknownTenant(_) => "UNKNOWN_TENANT",
            EngineError::Config(_) => "CONFIG_ERROR",
        }
    }

    /// Whether the failure is confined to a single notification.
    ///
    /// Callers processing a batch can skip the affected recipient and carry on
    /// when this returns `true`. Store, channel and configuration faults affect
    /// every notification and should abort the request instead, as should an
    /// unknown tenant.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            EngineError::NotFound { .. }
                | EngineError::Encoding(_)
                | EngineError::InvalidTemplate(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_is_recoverable() {
        let err = EngineError::NotFound {
            tenant_id: "acme".to_string(),
            channel: Channel::Email,
            template_type: "passwordReset".to_string(),
            locale: "en_US".to_string(),
        };
        assert!(err.is_recoverable());
        assert_eq!(err.code(), "TEMPLATE_NOT_FOUND");
        assert!(err.to_string().contains("passwordReset"));
    }

    #[test]
    fn test_store_error_aborts() {
        let err: EngineError = StoreError::Unavailable("connection refused".to_string()).into();
        assert!(!err.is_recoverable());
        assert_eq!(err.code(), "STORE_ERROR");
    }

    #[test]
    fn test_invalid_channel_aborts() {
        let err = EngineError::InvalidChannel("fax".to_string());
        assert!(!err.is_recoverable());
        assert_eq!(err.to_string(), "Invalid channel: fax");
    }
}
