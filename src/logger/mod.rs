//! Logger setup based on `tracing-subscriber`:
//! - console output with TTY-aware color control
//! - optional file output in Full, Compact or JSON format

pub mod config;
pub mod error;
pub(crate) mod writer;

pub use config::*;
pub use error::LoggerError;

use std::io::IsTerminal;
use tracing_subscriber::{EnvFilter, Layer, fmt, layer::SubscriberExt, util::SubscriberInitExt};

type BoxedLayer = Box<dyn Layer<tracing_subscriber::Registry> + Send + Sync>;

/// Initialize the global subscriber with the given configuration
pub fn init_logger(config: LoggerConfig) -> anyhow::Result<()> {
    config.validate()?;

    let filter = EnvFilter::try_new(&config.level).unwrap_or_else(|_| EnvFilter::new("info"));

    let mut layers: Vec<BoxedLayer> = Vec::new();

    // The file layer goes first so console ANSI codes never leak into the file
    // (tokio-rs/tracing#1817).
    if config.file.enabled {
        layers.push(file_layer(&config.file)?);
    }
    if config.console.enabled {
        let use_ansi = config.console.colored && std::io::stdout().is_terminal();
        layers.push(
            fmt::layer()
                .with_ansi(use_ansi)
                .with_target(true)
                .with_level(true)
                .boxed(),
        );
    }

    tracing_subscriber::registry()
        .with(layers)
        .with(filter)
        .try_init()?;

    Ok(())
}

fn file_layer(config: &FileConfig) -> anyhow::Result<BoxedLayer> {
    let writer = writer::open_log_file(config)?;

    let layer = match config.format {
        LogFormat::Full => fmt::layer()
            .with_ansi(false)
            .with_target(true)
            .with_writer(writer)
            .boxed(),
        LogFormat::Compact => fmt::layer()
            .with_ansi(false)
            .with_target(true)
            .compact()
            .with_writer(writer)
            .boxed(),
        LogFormat::Json => fmt::layer()
            .with_ansi(false)
            .json()
            .with_writer(writer)
            .boxed(),
    };
    Ok(layer)
}
