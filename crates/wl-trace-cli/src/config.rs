// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Config file and the resolved settings both subcommands run with
//!
//! ```toml
//! filter = "wl_surface|xdg_"
//! ignore = "wl_callback"
//! schema = ["/usr/share/wl-trace/viewporter.json"]
//! capture = "/tmp/session.wlcap"
//! log-level = "debug"
//! ```
//!
//! Command-line and environment values override the file.

use crate::TraceArgs;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use wl_trace_decoder::Filter;
use wl_trace_logging::LoggingConfig;
use wl_trace_schema::Schema;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub filter: Option<String>,
    pub ignore: Option<String>,
    /// JSON protocol tables merged over the built-in one, in order
    pub schema: Vec<PathBuf>,
    pub capture: Option<PathBuf>,

    #[serde(flatten)]
    pub logging: LoggingConfig,
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        Self::from_toml_str(&text).with_context(|| format!("parsing config {}", path.display()))
    }

    pub fn from_toml_str(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }
}

/// Everything the observer needs, after merging config and command line
pub struct Settings {
    pub filter: Filter,
    pub schema: Arc<Schema>,
    /// Capture path from the config file; `run --capture` overrides it
    pub capture: Option<PathBuf>,
}

impl Settings {
    pub fn new(filter: Filter, schema: Schema) -> Self {
        Self {
            filter,
            schema: Arc::new(schema),
            capture: None,
        }
    }

    pub fn resolve(trace: &TraceArgs, config: &Config) -> Result<Self> {
        let include = trace.filter.as_deref().or(config.filter.as_deref());
        let exclude = trace.ignore.as_deref().or(config.ignore.as_deref());
        let filter = Filter::new(include, exclude).context("invalid filter pattern")?;

        let mut schema = Schema::builtin();
        for path in config.schema.iter().chain(&trace.schema) {
            let table = Schema::from_json_file(path)
                .with_context(|| format!("loading schema table {}", path.display()))?;
            schema.merge(table);
        }

        Ok(Self {
            filter,
            schema: Arc::new(schema),
            capture: config.capture.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wl_trace_logging::CliLogLevel;

    #[test]
    fn test_parse_full_config() {
        let config = Config::from_toml_str(
            r#"
            filter = "wl_surface"
            ignore = "frame"
            schema = ["a.json", "b.json"]
            capture = "/tmp/out.wlcap"
            log-level = "warn"
            "#,
        )
        .unwrap();

        assert_eq!(config.filter.as_deref(), Some("wl_surface"));
        assert_eq!(config.ignore.as_deref(), Some("frame"));
        assert_eq!(config.schema, vec![PathBuf::from("a.json"), PathBuf::from("b.json")]);
        assert_eq!(config.capture, Some(PathBuf::from("/tmp/out.wlcap")));
        assert_eq!(config.logging.level, Some(CliLogLevel::Warn));
    }

    #[test]
    fn test_empty_config() {
        assert_eq!(Config::from_toml_str("").unwrap(), Config::default());
    }

    #[test]
    fn test_bad_config_is_an_error() {
        assert!(Config::from_toml_str("schema = 3").is_err());
    }

    #[test]
    fn test_command_line_overrides_config() {
        let config = Config {
            filter: Some("wl_surface".into()),
            ignore: Some("wl_callback".into()),
            ..Default::default()
        };
        let trace = TraceArgs {
            filter: Some("xdg_".into()),
            ..Default::default()
        };

        let settings = Settings::resolve(&trace, &config).unwrap();
        assert!(settings.filter.allows("3 xdg_surface.ack_configure(7)"));
        assert!(!settings.filter.allows("3 wl_surface.commit()"));
        assert!(!settings.filter.allows("4 xdg_wm_base.pong(1) wl_callback"));
    }

    #[test]
    fn test_invalid_pattern_is_rejected() {
        let trace = TraceArgs {
            ignore: Some("(".into()),
            ..Default::default()
        };
        assert!(Settings::resolve(&trace, &Config::default()).is_err());
    }

    #[test]
    fn test_missing_schema_file_is_reported() {
        let trace = TraceArgs {
            schema: vec![PathBuf::from("/nonexistent/wl-trace/table.json")],
            ..Default::default()
        };
        let err = match Settings::resolve(&trace, &Config::default()) {
            Ok(_) => panic!("missing table accepted"),
            Err(e) => e,
        };
        assert!(format!("{err:#}").contains("/nonexistent/wl-trace/table.json"));
    }
}
