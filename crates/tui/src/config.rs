//! Configuration loading for the terminal viewer.

use std::path::{Path, PathBuf};

use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use rf_timeline_core::TimelineConfig;
use serde::{Deserialize, Serialize};

/// Viewer configuration: engine tunables plus host-only settings.
///
/// Engine keys sit at the top level of the TOML file, status colors under
/// `[colors]`. Environment overrides use `RF_TIMELINE_` with `__` as the
/// nesting separator (`RF_TIMELINE_COLORS__FAIL="#ff0000"`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Live-mode poll interval in milliseconds.
    pub poll_ms: u64,
    /// Width of the tree pane in terminal columns.
    pub tree_width: u16,
    #[serde(flatten)]
    pub timeline: TimelineConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            poll_ms: 1000,
            tree_width: 36,
            timeline: TimelineConfig::default(),
        }
    }
}

impl AppConfig {
    /// Loads configuration, optionally from a specific file on top of the
    /// user config directory.
    #[expect(
        clippy::result_large_err,
        reason = "figment::Error is large but only returned at startup"
    )]
    pub fn load_from(config_path: Option<&Path>) -> Result<Self, figment::Error> {
        Self::load_layers(dirs_config_path().as_deref(), config_path)
    }

    #[expect(
        clippy::result_large_err,
        reason = "figment::Error is large but only returned at startup"
    )]
    fn load_layers(config_dir: Option<&Path>, config_path: Option<&Path>) -> Result<Self, figment::Error> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Some(dir) = config_dir {
            figment = figment.merge(Toml::file(dir.join("config.toml")));
        }
        if let Some(path) = config_path {
            figment = figment.merge(Toml::file(path));
        }
        figment = figment.merge(Env::prefixed("RF_TIMELINE_").split("__"));

        let mut config: Self = figment.extract()?;
        config.timeline = config.timeline.sanitized();
        config.poll_ms = config.poll_ms.max(50);
        Ok(config)
    }
}

/// Platform config directory for the viewer.
///
/// On Linux: `~/.config/rf-timeline`
fn dirs_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("rf-timeline"))
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use rf_timeline_core::StatusColors;
    use rf_timeline_protocol::Color;

    use super::*;

    fn toml_file(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new()
            .suffix(".toml")
            .tempfile()
            .unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn missing_files_yield_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig::load_layers(Some(dir.path()), None).unwrap();
        assert_eq!(config.timeline, TimelineConfig::default());
        assert_eq!(config.poll_ms, 1000);
    }

    #[test]
    fn file_overrides_only_what_it_names() {
        let file = toml_file(
            r##"
poll_ms = 250
lane_height = 30.0

[colors]
fail = "#123456"
"##,
        );
        let config = AppConfig::load_layers(None, Some(file.path())).unwrap();
        assert_eq!(config.poll_ms, 250);
        assert_eq!(config.timeline.lane_height, 30.0);
        assert_eq!(config.timeline.axis_height, TimelineConfig::default().axis_height);
        assert_eq!(config.timeline.colors.fail, Color::from_hex(0x123456));
        assert_eq!(config.timeline.colors.pass, StatusColors::default().pass);
    }

    #[test]
    fn explicit_file_wins_over_user_dir() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("config.toml"), "tree_width = 20\npoll_ms = 400\n").unwrap();
        let file = toml_file("poll_ms = 700\n");
        let config = AppConfig::load_layers(Some(dir.path()), Some(file.path())).unwrap();
        assert_eq!(config.tree_width, 20);
        assert_eq!(config.poll_ms, 700);
    }

    #[test]
    fn out_of_range_values_are_repaired() {
        let file = toml_file("min_zoom = 8.0\nmax_zoom = 2.0\npoll_ms = 0\n");
        let config = AppConfig::load_layers(None, Some(file.path())).unwrap();
        assert_eq!(config.timeline.max_zoom, 8.0);
        assert_eq!(config.poll_ms, 50);
    }

    #[test]
    fn bad_color_is_an_error() {
        let file = toml_file("[colors]\npass = \"green\"\n");
        assert!(AppConfig::load_layers(None, Some(file.path())).is_err());
    }
}
