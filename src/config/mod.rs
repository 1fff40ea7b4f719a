mod settings;

pub use settings::{CacheConfig, EngineConfig, OtelConfig, Settings, StoreConfig, TenantConfig};
