mod app;
mod config;
mod renderer;
mod transport;
mod tree;

use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use rf_timeline_core::{RunModel, TimelineEngine, Transport};
use tracing_subscriber::EnvFilter;

use crate::app::{App, Live};
use crate::config::AppConfig;
use crate::transport::FileTransport;

/// Interactive timeline for Robot Framework runs.
#[derive(Debug, Parser)]
#[command(name = "rf-timeline", version, about)]
struct Cli {
    /// Run-model JSON file.
    model: PathBuf,

    /// Re-read the model file while the run is in progress.
    #[arg(long)]
    live: bool,

    /// Live-mode poll interval in milliseconds (overrides config).
    #[arg(long, value_name = "MS")]
    poll_ms: Option<u64>,

    /// Configuration file layered over the user config.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Write logs here instead of discarding them.
    #[arg(long, value_name = "PATH")]
    log_file: Option<PathBuf>,

    /// Render the first frame as SVG to this path and exit.
    #[arg(long, value_name = "PATH")]
    snapshot: Option<PathBuf>,

    /// Snapshot width in pixels.
    #[arg(long, default_value_t = 1200.0, requires = "snapshot")]
    width: f64,

    /// Use the dark palette for snapshots.
    #[arg(long, requires = "snapshot")]
    dark: bool,
}

/// Logs go to a file (the terminal is in the alternate screen), filtered by
/// `RUST_LOG` with `info` as the default.
fn init_tracing(log_file: Option<&Path>) -> Result<()> {
    let Some(path) = log_file else {
        return Ok(());
    };
    let file = File::create(path).with_context(|| format!("failed to create log file {}", path.display()))?;
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    // try_init: a subscriber may already be installed when embedded.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .try_init();
    Ok(())
}

fn write_snapshot(engine: &mut TimelineEngine, path: &Path, width: f64, dark: bool) -> Result<()> {
    let height = engine.content_height().max(1.0);
    engine.resize(width, height);
    let svg = rf_timeline_core::svg::render_svg(&engine.render(), width, height, &engine.config().colors, dark);
    std::fs::write(path, svg).with_context(|| format!("failed to write {}", path.display()))?;
    tracing::info!(path = %path.display(), width, height, "snapshot written");
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_file.as_deref())?;

    let config = AppConfig::load_from(cli.config.as_deref()).context("failed to load configuration")?;
    tracing::debug!(?config, "loaded configuration");

    let data = std::fs::read(&cli.model).with_context(|| format!("failed to read {}", cli.model.display()))?;
    let model = RunModel::from_json(&data).with_context(|| format!("failed to parse {}", cli.model.display()))?;

    if let Some(path) = &cli.snapshot {
        let mut engine = TimelineEngine::new(&model, config.timeline.clone());
        return write_snapshot(&mut engine, path, cli.width, cli.dark);
    }

    let engine = TimelineEngine::new(&model, app::terminal_config(&config.timeline));
    let live = if cli.live {
        let mut transport = FileTransport::new(&cli.model);
        transport.mark_seen()?;
        let interval = Duration::from_millis(cli.poll_ms.unwrap_or(config.poll_ms).max(50));
        Some(Live::new(Box::new(transport) as Box<dyn Transport>, interval))
    } else {
        None
    };

    App::new(engine, config.tree_width, live).run()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_parses_live_options() {
        let cli = Cli::try_parse_from(["rf-timeline", "run.json", "--live", "--poll-ms", "250"]).unwrap();
        assert!(cli.live);
        assert_eq!(cli.poll_ms, Some(250));
        assert!(cli.snapshot.is_none());
    }

    #[test]
    fn snapshot_only_flags_require_snapshot() {
        assert!(Cli::try_parse_from(["rf-timeline", "run.json", "--dark"]).is_err());
        assert!(Cli::try_parse_from(["rf-timeline", "run.json", "--snapshot", "out.svg", "--dark"]).is_ok());
    }

    #[test]
    fn snapshot_writes_svg_with_all_spans() {
        let model = RunModel::from_json(
            br#"{"suites":[{"name":"S","id":"s1","status":"PASS","start_time":0.0,"end_time":2.0,
                "children":[{"name":"T","id":"t1","status":"FAIL","start_time":0.5,"end_time":1.5}]}]}"#,
        )
        .unwrap();
        let mut engine = TimelineEngine::new(&model, AppConfig::default().timeline);
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.svg");
        write_snapshot(&mut engine, &path, 800.0, false).unwrap();

        let svg = std::fs::read_to_string(&path).unwrap();
        assert!(svg.starts_with("<svg"));
        assert!(svg.contains(r#"data-span-id="s1""#));
        assert!(svg.contains(r#"data-span-id="t1""#));
    }
}
