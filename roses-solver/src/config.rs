//! Analyzer configuration from file and flags.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use roses_core::AnalyzerConfig;
use tracing::debug;

use crate::cli::SearchArgs;

/// Load settings from an optional TOML file, then apply flag overrides.
///
/// ```toml
/// closed_form = true
/// winning_cache_threshold = 18
///
/// [limits]
/// max_nodes = 5000000
/// time_budget_ms = 10000
/// ```
pub fn load(path: Option<&Path>, args: &SearchArgs) -> Result<AnalyzerConfig> {
    let mut config = match path {
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("reading config {}", path.display()))?;
            parse(&text).with_context(|| format!("parsing config {}", path.display()))?
        }
        None => AnalyzerConfig::default(),
    };
    apply(&mut config, args);
    debug!(?config, "analyzer config");
    Ok(config)
}

fn parse(text: &str) -> Result<AnalyzerConfig> {
    Ok(toml::from_str(text)?)
}

fn apply(config: &mut AnalyzerConfig, args: &SearchArgs) {
    if let Some(max) = args.max_nodes {
        config.limits.max_nodes = Some(max);
    }
    if let Some(max) = args.max_depth {
        config.limits.max_depth = Some(max);
    }
    if let Some(ms) = args.timeout_ms {
        config.limits.time_budget_ms = Some(ms);
    }
    if args.no_closed_form {
        config.closed_form = false;
    }
    if let Some(threshold) = args.win_cache_threshold {
        config.winning_cache_threshold = threshold;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_partial_file() {
        let config = parse("[limits]\nmax_nodes = 42\n").unwrap();
        assert!(config.closed_form);
        assert_eq!(config.winning_cache_threshold, 18);
        assert_eq!(config.limits.max_nodes, Some(42));
    }

    #[test]
    fn test_parse_rejects_bad_types() {
        assert!(parse("closed_form = \"yes\"").is_err());
    }

    #[test]
    fn test_flags_override_file() {
        let mut config = parse("closed_form = true\nwinning_cache_threshold = 30\n").unwrap();
        let args = SearchArgs {
            no_closed_form: true,
            timeout_ms: Some(250),
            ..SearchArgs::default()
        };
        apply(&mut config, &args);
        assert!(!config.closed_form);
        assert_eq!(config.winning_cache_threshold, 30);
        assert_eq!(config.limits.time_budget_ms, Some(250));
        assert_eq!(config.limits.max_nodes, None);
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let path = std::env::temp_dir().join("roses_solver_missing_config.toml");
        std::fs::remove_file(&path).ok();
        assert!(load(Some(&path), &SearchArgs::default()).is_err());
    }

    #[test]
    fn test_load_from_file() {
        let path = std::env::temp_dir().join("roses_solver_test_config.toml");
        std::fs::write(&path, "[limits]\nmax_depth = 12\n").unwrap();
        let config = load(Some(&path), &SearchArgs::default()).unwrap();
        assert_eq!(config.limits.max_depth, Some(12));
        std::fs::remove_file(&path).ok();
    }
}
