//! # Photo Overlay Shell
//!
//! Headless host for the overlay engine. Stands in for the camera UI: it
//! loads a session configuration, replays a JSON script of user interactions
//! against a [`Session`], and writes exports to a directory.
//!
//! ## Usage
//!
//! ```bash
//! cargo run -p overlay-shell -- --config session.json --script demo.json --output-dir out
//! ```
//!
//! ## Architecture
//!
//! - `CliArgs` - Command-line arguments parsed with clap
//! - `ShellConfig` - Resolved paths and canvas overrides
//! - `ShellRunner` - Feeds script steps into the session and collects side effects
//! - `DirectoryPersistence` - Writes PNG exports under the output directory

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]

mod script;
mod storage;

pub use script::{RunReport, Script, ScriptError, ShellRunner, ShellStep};
pub use storage::DirectoryPersistence;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use overlay_core::{ColorRef, ImageRef, RasterHandle, Session, SessionConfig};
use overlay_renderer::{Compositor, DefaultResolver, ResourceResolver};

/// Command-line arguments for overlay-camera.
#[derive(Debug, Clone, Parser)]
#[command(name = "overlay-camera")]
#[command(about = "Replay overlay editing sessions and export the results")]
#[command(version)]
pub struct CliArgs {
    /// Session configuration JSON
    #[arg(long, env = "OVERLAY_CONFIG")]
    pub config: Option<PathBuf>,

    /// Script of interaction steps (a built-in demo runs when absent)
    #[arg(long, env = "OVERLAY_SCRIPT")]
    pub script: Option<PathBuf>,

    /// Image used as the camera frame (a grey frame when absent)
    #[arg(long, env = "OVERLAY_PREVIEW")]
    pub preview: Option<PathBuf>,

    /// Directory exports are written under
    #[arg(long, env = "OVERLAY_OUTPUT_DIR", default_value = "exports")]
    pub output_dir: PathBuf,

    /// Directory relative image paths are resolved against
    #[arg(long, env = "OVERLAY_ASSET_DIR")]
    pub assets: Option<PathBuf>,

    /// Override the canvas width in pixels
    #[arg(long)]
    pub width: Option<u32>,

    /// Override the canvas height in pixels
    #[arg(long)]
    pub height: Option<u32>,
}

/// Resolved shell configuration.
#[derive(Debug, Clone, Default)]
pub struct ShellConfig {
    /// Session configuration file.
    pub config_path: Option<PathBuf>,
    /// Script file.
    pub script_path: Option<PathBuf>,
    /// Camera frame image.
    pub preview_path: Option<PathBuf>,
    /// Export root.
    pub output_dir: PathBuf,
    /// Base directory for relative image paths.
    pub asset_dir: Option<PathBuf>,
    /// Canvas width override.
    pub width: Option<u32>,
    /// Canvas height override.
    pub height: Option<u32>,
}

impl From<CliArgs> for ShellConfig {
    fn from(args: CliArgs) -> Self {
        Self {
            config_path: args.config,
            script_path: args.script,
            preview_path: args.preview,
            output_dir: args.output_dir,
            asset_dir: args.assets,
            width: args.width,
            height: args.height,
        }
    }
}

impl ShellConfig {
    /// Load the session configuration and apply canvas overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or the result is invalid.
    pub fn session_config(&self) -> anyhow::Result<SessionConfig> {
        let mut config = match &self.config_path {
            Some(path) => {
                let json = std::fs::read_to_string(path)
                    .with_context(|| format!("reading {}", path.display()))?;
                SessionConfig::from_json(&json)?
            }
            None => SessionConfig::default(),
        };
        if let Some(width) = self.width {
            config.render.canvas_width = width;
        }
        if let Some(height) = self.height {
            config.render.canvas_height = height;
        }
        config.validate()?;
        Ok(config)
    }

    /// Load the script, or the demo when none is configured.
    ///
    /// # Errors
    ///
    /// Returns an error if the script file cannot be read or parsed.
    pub fn script(&self) -> Result<Script, ScriptError> {
        self.script_path
            .as_deref()
            .map_or_else(|| Ok(Script::demo()), Script::load)
    }
}

/// Run the configured script end to end.
///
/// # Errors
///
/// Returns an error if configuration, script or camera frame cannot be loaded.
pub async fn run(shell: &ShellConfig) -> anyhow::Result<RunReport> {
    let config = Arc::new(shell.session_config()?);
    let script = shell.script()?;

    let mut resolver = DefaultResolver::new();
    if let Some(dir) = &shell.asset_dir {
        resolver = resolver.with_base_dir(dir);
    }

    let camera_frame = match &shell.preview_path {
        Some(path) => resolver
            .load_image(&ImageRef::new(path.display().to_string()))
            .with_context(|| format!("loading camera frame {}", path.display()))?,
        None => RasterHandle::solid(
            config.render.canvas_width,
            config.render.canvas_height,
            ColorRef::rgb(0x80, 0x80, 0x80),
        ),
    };

    let compositor = Arc::new(Compositor::new(Arc::clone(&config), Arc::new(resolver)));
    let persistence = Arc::new(DirectoryPersistence::new(&shell.output_dir));
    let session = Session::with_shared_config(config);

    tracing::info!(
        steps = script.steps.len(),
        output = %shell.output_dir.display(),
        "running script"
    );
    ShellRunner::new(session, compositor, persistence, camera_frame)?
        .run(&script)
        .await
}
