//! Delivery channels and their rendering rules

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};

/// Delivery medium of a notification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    Email,
    Sms,
    Push,
}

impl Channel {
    pub const ALL: [Channel; 3] = [Channel::Email, Channel::Sms, Channel::Push];

    pub fn as_str(&self) -> &'static str {
        match self {
            Channel::Email => "email",
            Channel::Sms => "sms",
            Channel::Push => "push",
        }
    }

    /// Store path under which this channel's templates live
    pub fn base_path(&self) -> &'static str {
        match self {
            Channel::Email => "/identity/email",
            Channel::Sms => "/identity/sms",
            Channel::Push => "/identity/push",
        }
    }

    /// Store path of one template type
    pub fn template_path(&self, template_type: &str) -> String {
        format!("{}/{}", self.base_path(), template_type)
    }

    /// Map a store path (base or template path) back to its channel
    pub fn from_path(path: &str) -> Result<Self> {
        Channel::ALL
            .into_iter()
            .find(|channel| {
                let base = channel.base_path();
                path == base
                    || path
                        .strip_prefix(base)
                        .is_some_and(|rest| rest.starts_with('/'))
            })
            .ok_or_else(|| EngineError::InvalidChannel(format!("unknown template path {}", path)))
    }

    /// Rendering rules for this channel
    pub fn descriptor(&self) -> ChannelDescriptor {
        match self {
            Channel::Email => ChannelDescriptor {
                renders_subject: true,
                renders_footer: true,
                default_content_type: "text/plain",
            },
            Channel::Sms => ChannelDescriptor {
                renders_subject: false,
                renders_footer: false,
                default_content_type: "text/plain",
            },
            Channel::Push => ChannelDescriptor {
                renders_subject: false,
                renders_footer: false,
                default_content_type: "text/plain",
            },
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Channel {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "email" => Ok(Channel::Email),
            "sms" => Ok(Channel::Sms),
            "push" => Ok(Channel::Push),
            other => Err(EngineError::InvalidChannel(other.to_string())),
        }
    }
}

/// Channel behaviour expressed as data
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelDescriptor {
    /// Whether the channel carries a subject line
    pub renders_subject: bool,
    /// Whether the channel carries a footer
    pub renders_footer: bool,
    /// Content type used when the template has none
    pub default_content_type: &'static str,
}
