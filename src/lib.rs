// Shared components
pub mod config;
pub mod error;
pub mod metrics;
pub mod telemetry;

// Template model and rendering
pub mod locale;
pub mod notification;
pub mod template;

// Resolution
pub mod cache;
pub mod resolver;
pub mod store;
pub mod tenant;

// Facade
pub mod engine;

pub use engine::NotificationTemplateEngine;
pub use error::{EngineError, Result};
