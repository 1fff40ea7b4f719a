//! Channel-specific notification rendering.
//!
//! A single [`ChannelNotificationBuilder`] renders every channel. Email carries
//! subject, body and footer; SMS and push carry the body only. The rendered
//! [`RenderedNotification`] is handed to an external delivery adapter.

mod builder;
mod channel;
mod types;

pub use builder::ChannelNotificationBuilder;
pub use channel::{Channel, ChannelDescriptor};
pub use types::{NotificationRequest, RenderedNotification};
