use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::channel::Channel;
use crate::template::Placeholders;

/// A notification rendered from a template, ready for a delivery adapter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderedNotification {
    /// Unique identifier for this notification
    pub id: Uuid,
    /// When the notification was rendered
    pub created_at: DateTime<Utc>,
    /// Delivery channel
    pub channel: Channel,
    /// Template type it was rendered from (e.g., "passwordReset")
    pub template_type: String,
    /// Locale of the template actually used
    pub locale: String,
    /// MIME type of the body
    pub content_type: String,
    /// Recipient address (email address, phone number, device token)
    pub send_to: String,
    /// Sender address (optional)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub send_from: Option<String>,
    /// Rendered subject (email only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    /// Rendered body
    pub body: String,
    /// Rendered footer (email only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub footer: Option<String>,
}

/// Everything needed to resolve and render one notification
#[derive(Debug, Clone)]
pub struct NotificationRequest {
    /// Tenant the recipient belongs to
    pub tenant_id: String,
    /// Application that triggered the event (optional)
    pub application_id: Option<String>,
    /// Delivery channel
    pub channel: Channel,
    /// Template type, e.g. "passwordReset"
    pub template_type: String,
    /// Locale requested for the recipient, in any common form
    pub locale: String,
    /// Placeholder values
    pub placeholders: Placeholders,
    /// Recipient address
    pub send_to: String,
    /// Sender address (optional)
    pub send_from: Option<String>,
}

impl NotificationRequest {
    /// Create a request for the tenant's default application and locale
    pub fn new(
        tenant_id: impl Into<String>,
        channel: Channel,
        template_type: impl Into<String>,
        send_to: impl Into<String>,
    ) -> Self {
        Self {
            tenant_id: tenant_id.into(),
            application_id: None,
            channel,
            template_type: template_type.into(),
            locale: String::new(),
            placeholders: Placeholders::new(),
            send_to: send_to.into(),
            send_from: None,
        }
    }

    /// Set the application
    pub fn application(mut self, application_id: impl Into<String>) -> Self {
        self.application_id = Some(application_id.into());
        self
    }

    /// Set the requested locale
    pub fn locale(mut self, locale: impl Into<String>) -> Self {
        self.locale = locale.into();
        self
    }

    /// Set the placeholder values
    pub fn placeholders(mut self, placeholders: Placeholders) -> Self {
        self.placeholders = placeholders;
        self
    }

    /// Set the sender address
    pub fn send_from(mut self, send_from: impl Into<String>) -> Self {
        self.send_from = Some(send_from.into());
        self
    }
}
