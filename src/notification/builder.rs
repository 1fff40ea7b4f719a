//! Channel notification builder

use chrono::Utc;
use uuid::Uuid;

use super::channel::Channel;
use super::types::RenderedNotification;
use crate::error::{EngineError, Result};
use crate::metrics::RenderMetrics;
use crate::template::{normalize_content_type, PlaceholderEngine, Placeholders, Template};

/// Renders resolved templates into channel-specific notifications.
///
/// One builder serves every channel; what differs per channel lives in its
/// [`ChannelDescriptor`](super::ChannelDescriptor).
#[derive(Debug, Clone, Default)]
pub struct ChannelNotificationBuilder {
    engine: PlaceholderEngine,
}

impl ChannelNotificationBuilder {
    pub fn new(engine: PlaceholderEngine) -> Self {
        Self { engine }
    }

    /// Render `template` for `channel`
    pub fn build(
        &self,
        channel: Channel,
        template: &Template,
        placeholders: &Placeholders,
        send_to: &str,
        send_from: Option<&str>,
    ) -> Result<RenderedNotification> {
        let descriptor = channel.descriptor();

        let rendered = self.render_parts(
            descriptor.renders_subject,
            descriptor.renders_footer,
            template,
            placeholders,
        );
        let (subject, body, footer) = match rendered {
            Ok(parts) => parts,
            Err(e) => {
                RenderMetrics::record_failure(e.code());
                return Err(e);
            }
        };

        if body.trim().is_empty() {
            RenderMetrics::record_failure("empty_body");
            return Err(EngineError::InvalidTemplate(format!(
                "Template '{}' ({}) rendered an empty body for {}",
                template.template_type, template.locale, channel
            )));
        }

        let content_type = if template.content_type.trim().is_empty() {
            descriptor.default_content_type.to_string()
        } else {
            normalize_content_type(&template.content_type)
        };

        RenderMetrics::record_rendered(channel);
        tracing::debug!(
            channel = %channel,
            template_type = %template.template_type,
            locale = %template.locale,
            "Notification rendered"
        );

        Ok(RenderedNotification {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            channel,
            template_type: template.template_type.clone(),
            locale: template.locale.clone(),
            content_type,
            send_to: send_to.to_string(),
            send_from: send_from.map(str::to_string),
            subject,
            body,
            footer,
        })
    }

    fn render_parts(
        &self,
        with_subject: bool,
        with_footer: bool,
        template: &Template,
        placeholders: &Placeholders,
    ) -> Result<(Option<String>, String, Option<String>)> {
        let subject = if with_subject {
            self.engine
                .render_optional(template.subject.as_deref(), placeholders)?
        } else {
            None
        };
        let body = self.engine.render(&template.body, placeholders)?;
        let footer = if with_footer {
            self.engine
                .render_optional(template.footer.as_deref(), placeholders)?
        } else {
            None
        };
        Ok((subject, body, footer))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn email_template() -> Template {
        Template::new("accountConfirmation", "en_US", "Click {{url:link}}")
            .with_subject("Hi {{name}}")
            .with_footer("Bye")
    }

    fn values() -> Placeholders {
        Placeholders::new()
            .with("name", "Jo")
            .with("link", "http://a?b=c")
    }

    #[test]
    fn test_email_renders_all_parts() {
        let builder = ChannelNotificationBuilder::default();
        let notification = builder
            .build(
                Channel::Email,
                &email_template(),
                &values(),
                "jo@example.com",
                Some("noreply@example.com"),
            )
            .unwrap();

        assert_eq!(notification.subject.as_deref(), Some("Hi Jo"));
        assert_eq!(notification.body, "Click http%3A%2F%2Fa%3Fb%3Dc");
        assert_eq!(notification.footer.as_deref(), Some("Bye"));
        assert_eq!(notification.send_to, "jo@example.com");
        assert_eq!(notification.send_from.as_deref(), Some("noreply@example.com"));
        assert_eq!(notification.content_type, "text/plain");
    }

    #[test]
    fn test_sms_renders_body_only() {
        let builder = ChannelNotificationBuilder::default();
        let notification = builder
            .build(Channel::Sms, &email_template(), &values(), "+15550100", None)
            .unwrap();

        assert!(notification.subject.is_none());
        assert!(notification.footer.is_none());
        assert_eq!(notification.body, "Click http%3A%2F%2Fa%3Fb%3Dc");
    }

    #[test]
    fn test_email_without_subject_skips_it() {
        let builder = ChannelNotificationBuilder::default();
        let template = Template::new("welcome", "en_US", "Welcome {{name}}");
        let notification = builder
            .build(Channel::Email, &template, &values(), "jo@example.com", None)
            .unwrap();

        assert!(notification.subject.is_none());
        assert!(notification.footer.is_none());
        assert_eq!(notification.body, "Welcome Jo");
    }

    #[test]
    fn test_empty_body_after_substitution_is_invalid() {
        let builder = ChannelNotificationBuilder::default();
        let template = Template::new("blank", "en_US", "{{content}}");
        let values = Placeholders::new().with("content", "  ");

        assert!(matches!(
            builder.build(Channel::Push, &template, &values, "device-token", None),
            Err(EngineError::InvalidTemplate(_))
        ));
    }

    #[test]
    fn test_html_content_type_gets_charset() {
        let builder = ChannelNotificationBuilder::default();
        let template = email_template().with_content_type("text/html");
        let notification = builder
            .build(Channel::Email, &template, &values(), "jo@example.com", None)
            .unwrap();

        assert_eq!(notification.content_type, "text/html; charset=UTF-8");
    }

    #[test]
    fn test_encoding_failure_propagates() {
        let builder = ChannelNotificationBuilder::new(PlaceholderEngine::new("ISO-8859-1"));
        let values = Placeholders::new().with("link", "https://例え.jp");

        assert!(matches!(
            builder.build(Channel::Email, &email_template(), &values, "jo@example.com", None),
            Err(EngineError::Encoding(_))
        ));
    }

    #[test]
    fn test_each_render_gets_a_new_id() {
        let builder = ChannelNotificationBuilder::default();
        let a = builder
            .build(Channel::Sms, &email_template(), &values(), "+1", None)
            .unwrap();
        let b = builder
            .build(Channel::Sms, &email_template(), &values(), "+1", None)
            .unwrap();
        assert_ne!(a.id, b.id);
    }
}
