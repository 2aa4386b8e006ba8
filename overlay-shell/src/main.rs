//! # Photo Overlay Camera
//!
//! Headless overlay session runner.

use clap::Parser;
use overlay_shell::{CliArgs, ShellConfig};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize tracing, honouring `RUST_LOG` and `RUST_LOG_FORMAT=json`.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new("info,overlay_core=debug,overlay_renderer=debug,overlay_shell=debug")
    });

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_writer(std::io::stderr);

    if std::env::var("RUST_LOG_FORMAT").as_deref() == Ok("json") {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer.json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer)
            .init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let args = CliArgs::parse();
    let shell = ShellConfig::from(args);
    tracing::info!("Starting overlay-camera");

    let report = overlay_shell::run(&shell).await?;

    for reference in &report.exports {
        println!("saved {reference}");
    }
    for message in &report.messages {
        println!("note: {message}");
    }

    tracing::info!(exports = report.exports.len(), "overlay-camera finished");
    Ok(())
}
