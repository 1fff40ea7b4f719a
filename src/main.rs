use std::sync::Arc;

use anyhow::{bail, Context, Result};

use notification_template_engine::config::Settings;
use notification_template_engine::notification::{Channel, NotificationRequest};
use notification_template_engine::store::InMemoryTemplateStore;
use notification_template_engine::telemetry::init_telemetry;
use notification_template_engine::template::Placeholders;
use notification_template_engine::tenant::{StaticTenantDirectory, TenantDirectory};
use notification_template_engine::NotificationTemplateEngine;

const USAGE: &str =
    "usage: notification-template-engine <channel> <tenant_domain> <template_type> <locale> <send_to> [key=value ...]";

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration
    let settings = Settings::new()?;
    let _telemetry = init_telemetry(&settings.otel)?;
    tracing::info!("Configuration loaded");

    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.len() < 5 {
        bail!(USAGE);
    }

    let channel: Channel = args[0].parse()?;
    let tenant_domain = &args[1];
    let placeholders = parse_placeholders(&args[5..])?;

    let store = match &settings.store.seed_file {
        Some(path) => InMemoryTemplateStore::from_seed_file(path)
            .with_context(|| format!("Failed to seed template store from {}", path))?,
        None => {
            tracing::warn!("No seed file configured, template store is empty");
            InMemoryTemplateStore::new()
        }
    };

    let tenants = Arc::new(StaticTenantDirectory::from_config(&settings.tenant));
    let tenant_id = tenants
        .tenant_id(tenant_domain)
        .await?
        .with_context(|| format!("Unknown tenant domain {}", tenant_domain))?;

    let engine = NotificationTemplateEngine::new(&settings, Arc::new(store), tenants);

    let request = NotificationRequest::new(tenant_id, channel, &args[2], &args[4])
        .locale(&args[3])
        .placeholders(placeholders);
    let notification = engine.notify(request).await?;

    println!("{}", serde_json::to_string_pretty(&notification)?);
    Ok(())
}

fn parse_placeholders(args: &[String]) -> Result<Placeholders> {
    args.iter()
        .map(|arg| match arg.split_once('=') {
            Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
            _ => bail!("Invalid placeholder '{}', expected key=value", arg),
        })
        .collect()
}
