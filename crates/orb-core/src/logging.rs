use crate::{errors::Error, Result};

/// Initialize logging/tracing for the bot.
pub fn init(service_name: &str) -> Result<()> {
    use tracing_subscriber::{fmt, EnvFilter};

    // Can be overridden with `RUST_LOG`.
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter(service_name)));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_ansi(true)
        .try_init()
        .map_err(|e| Error::Config(format!("logging init failed: {e}")))?;

    Ok(())
}

/// Default directives: info everywhere, including our own crates.
pub fn default_filter(service_name: &str) -> String {
    format!("info,orb=info,orb_core=info,orb_openrouter=info,orb_telegram=info,{service_name}=info")
}
