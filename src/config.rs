use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use crate::tree_context::ContextTuning;

/// Largest accepted `context.top_margin`, in lines.
const MAX_TOP_MARGIN: usize = 1000;

/// Global configuration for grep-ast
/// All fields are optional to support partial configurations and merging
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct GrepAstConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub defaults: Option<DefaultsConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display: Option<DisplayConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<ContextConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct DefaultsConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_level: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ignore_case: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub no_gitignore: Option<bool>,
    /// Encoding label used to decode source files, e.g. "utf-8" or "latin1"
    #[serde(skip_serializing_if = "Option::is_none")]
    pub encoding: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct DisplayConfig {
    /// "auto", "always" or "never"
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line_number: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ContextConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_context: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub child_context: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub header_max_lines: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub whole_scope_lines: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sample_fraction: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sample_min: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sample_max: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_margin: Option<usize>,
}

/// Configuration with every default filled in
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedConfig {
    pub defaults: ResolvedDefaultsConfig,
    pub display: ResolvedDisplayConfig,
    pub context: ResolvedContextConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedDefaultsConfig {
    pub log_level: String,
    pub ignore_case: bool,
    pub no_gitignore: bool,
    pub encoding: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedDisplayConfig {
    pub color: String,
    pub line_number: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedContextConfig {
    pub parent_context: bool,
    pub child_context: bool,
    pub tuning: ContextTuning,
}

impl GrepAstConfig {
    /// Load configuration from multiple levels and merge them
    pub fn load() -> Result<ResolvedConfig> {
        let mut merged = GrepAstConfig::default();
        for config in Self::load_all_configs() {
            merged = Self::merge_configs(merged, config);
        }

        merged.apply_env_overrides();

        let resolved = merged.resolve_with_defaults();
        resolved.validate()?;
        Ok(resolved)
    }

    /// Get all configuration file paths in priority order
    fn get_config_paths() -> Vec<PathBuf> {
        let mut paths = Vec::new();

        // 1. Global config: ~/.grep-ast/settings.json
        if let Ok(home) = env::var("HOME") {
            paths.push(PathBuf::from(home).join(".grep-ast").join("settings.json"));
        } else if let Some(home_dir) = dirs::home_dir() {
            paths.push(home_dir.join(".grep-ast").join("settings.json"));
        }

        // 2. Project config, then its untracked local override
        paths.push(PathBuf::from(".grep-ast").join("settings.json"));
        paths.push(PathBuf::from(".grep-ast").join("settings.local.json"));

        // 3. Custom path via environment variable - highest precedence
        if let Ok(custom_path) = env::var("GREP_AST_CONFIG_PATH") {
            let custom = PathBuf::from(&custom_path);
            if custom_path.ends_with('/') || custom_path.ends_with('\\') {
                paths.push(custom.join("settings.json"));
            } else {
                paths.push(custom);
            }
        }

        paths
    }

    /// Load all configuration files that exist; unreadable ones are skipped
    fn load_all_configs() -> Vec<GrepAstConfig> {
        Self::get_config_paths()
            .into_iter()
            .filter(|path| fs::metadata(path).is_ok_and(|metadata| metadata.is_file()))
            .filter_map(|path| match Self::load_from_file(&path) {
                Ok(config) => Some(config),
                Err(e) => {
                    tracing::warn!("Ignoring config file: {e:#}");
                    None
                }
            })
            .collect()
    }

    /// Load a single configuration file
    pub fn load_from_file(path: &Path) -> Result<GrepAstConfig> {
        let bytes = fs::read(path).context(format!("Failed to read config file: {path:?}"))?;

        // Strip UTF-8 BOM if present
        let content_bytes = bytes.strip_prefix(&[0xEF, 0xBB, 0xBF]).unwrap_or(&bytes);

        let config: GrepAstConfig = serde_json::from_slice(content_bytes)
            .context(format!("Failed to parse config file: {path:?}"))?;

        Ok(config)
    }

    /// Deep merge two configurations, with `other` taking precedence
    fn merge_configs(mut base: GrepAstConfig, other: GrepAstConfig) -> GrepAstConfig {
        if let Some(other_defaults) = other.defaults {
            let base_defaults = base.defaults.get_or_insert_with(DefaultsConfig::default);
            if other_defaults.log_level.is_some() {
                base_defaults.log_level = other_defaults.log_level;
            }
            if other_defaults.ignore_case.is_some() {
                base_defaults.ignore_case = other_defaults.ignore_case;
            }
            if other_defaults.no_gitignore.is_some() {
                base_defaults.no_gitignore = other_defaults.no_gitignore;
            }
            if other_defaults.encoding.is_some() {
                base_defaults.encoding = other_defaults.encoding;
            }
        }

        if let Some(other_display) = other.display {
            let base_display = base.display.get_or_insert_with(DisplayConfig::default);
            if other_display.color.is_some() {
                base_display.color = other_display.color;
            }
            if other_display.line_number.is_some() {
                base_display.line_number = other_display.line_number;
            }
        }

        if let Some(other_context) = other.context {
            let base_context = base.context.get_or_insert_with(ContextConfig::default);
            if other_context.parent_context.is_some() {
                base_context.parent_context = other_context.parent_context;
            }
            if other_context.child_context.is_some() {
                base_context.child_context = other_context.child_context;
            }
            if other_context.header_max_lines.is_some() {
                base_context.header_max_lines = other_context.header_max_lines;
            }
            if other_context.whole_scope_lines.is_some() {
                base_context.whole_scope_lines = other_context.whole_scope_lines;
            }
            if other_context.sample_fraction.is_some() {
                base_context.sample_fraction = other_context.sample_fraction;
            }
            if other_context.sample_min.is_some() {
                base_context.sample_min = other_context.sample_min;
            }
            if other_context.sample_max.is_some() {
                base_context.sample_max = other_context.sample_max;
            }
            if other_context.top_margin.is_some() {
                base_context.top_margin = other_context.top_margin;
            }
        }

        base
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(&mut self) {
        let defaults = self.defaults.get_or_insert_with(DefaultsConfig::default);
        if let Ok(val) = env::var("GREP_AST_LOG_LEVEL") {
            defaults.log_level = Some(val);
        }
        if let Ok(val) = env::var("GREP_AST_IGNORE_CASE") {
            defaults.ignore_case = Some(parse_bool(&val));
        }
        if let Ok(val) = env::var("GREP_AST_NO_GITIGNORE") {
            defaults.no_gitignore = Some(parse_bool(&val));
        }
        if let Ok(val) = env::var("GREP_AST_ENCODING") {
            defaults.encoding = Some(val);
        }

        let display = self.display.get_or_insert_with(DisplayConfig::default);
        if let Ok(val) = env::var("GREP_AST_COLOR") {
            display.color = Some(val);
        }
        if let Ok(val) = env::var("GREP_AST_LINE_NUMBER") {
            display.line_number = Some(parse_bool(&val));
        }

        let context = self.context.get_or_insert_with(ContextConfig::default);
        if let Ok(val) = env::var("GREP_AST_PARENT_CONTEXT") {
            context.parent_context = Some(parse_bool(&val));
        }
        if let Ok(val) = env::var("GREP_AST_CHILD_CONTEXT") {
            context.child_context = Some(parse_bool(&val));
        }
    }

    /// Fill every unset field with its default
    pub fn resolve_with_defaults(self) -> ResolvedConfig {
        let defaults = self.defaults.unwrap_or_default();
        let display = self.display.unwrap_or_default();
        let context = self.context.unwrap_or_default();
        let tuning = ContextTuning::default();

        ResolvedConfig {
            defaults: ResolvedDefaultsConfig {
                log_level: defaults.log_level.unwrap_or_else(|| "warn".to_string()),
                ignore_case: defaults.ignore_case.unwrap_or(false),
                no_gitignore: defaults.no_gitignore.unwrap_or(false),
                encoding: defaults.encoding.unwrap_or_else(|| "utf-8".to_string()),
            },
            display: ResolvedDisplayConfig {
                color: display.color.unwrap_or_else(|| "auto".to_string()),
                line_number: display.line_number.unwrap_or(false),
            },
            context: ResolvedContextConfig {
                parent_context: context.parent_context.unwrap_or(true),
                child_context: context.child_context.unwrap_or(true),
                tuning: ContextTuning {
                    header_max_lines: context.header_max_lines.unwrap_or(tuning.header_max_lines),
                    whole_scope_lines: context
                        .whole_scope_lines
                        .unwrap_or(tuning.whole_scope_lines),
                    sample_fraction: context.sample_fraction.unwrap_or(tuning.sample_fraction),
                    sample_min: context.sample_min.unwrap_or(tuning.sample_min),
                    sample_max: context.sample_max.unwrap_or(tuning.sample_max),
                    top_margin: context.top_margin.unwrap_or(tuning.top_margin),
                },
            },
        }
    }
}

impl ResolvedConfig {
    /// Validate the resolved configuration
    pub fn validate(&self) -> Result<()> {
        let valid_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_levels.contains(&self.defaults.log_level.to_lowercase().as_str()) {
            anyhow::bail!(
                "Invalid log_level '{}'. Must be one of: {}",
                self.defaults.log_level,
                valid_levels.join(", ")
            );
        }

        let valid_colors = ["auto", "always", "never"];
        if !valid_colors.contains(&self.display.color.as_str()) {
            anyhow::bail!(
                "Invalid color '{}'. Must be one of: {}",
                self.display.color,
                valid_colors.join(", ")
            );
        }

        if encoding_rs::Encoding::for_label(self.defaults.encoding.as_bytes()).is_none() {
            anyhow::bail!("Unknown encoding '{}'", self.defaults.encoding);
        }

        let tuning = &self.context.tuning;
        if tuning.header_max_lines == 0 {
            anyhow::bail!("header_max_lines must be at least 1");
        }
        if tuning.sample_min > tuning.sample_max {
            anyhow::bail!(
                "sample_min ({}) must not exceed sample_max ({})",
                tuning.sample_min,
                tuning.sample_max
            );
        }
        if tuning.top_margin > MAX_TOP_MARGIN {
            anyhow::bail!(
                "top_margin must be at most {}, got {}",
                MAX_TOP_MARGIN,
                tuning.top_margin
            );
        }
        if !(0.0..=1.0).contains(&tuning.sample_fraction) {
            anyhow::bail!(
                "sample_fraction must be between 0 and 1, got {}",
                tuning.sample_fraction
            );
        }

        Ok(())
    }

    pub fn to_json_string(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("Failed to serialize configuration to JSON")
    }
}

fn parse_bool(value: &str) -> bool {
    value == "1" || value.eq_ignore_ascii_case("true")
}

/// Get the global configuration instance
/// This loads the configuration once and caches it for the lifetime of the program
pub fn get_config() -> &'static ResolvedConfig {
    use std::sync::OnceLock;
    static CONFIG: OnceLock<ResolvedConfig> = OnceLock::new();

    CONFIG.get_or_init(|| {
        GrepAstConfig::load().unwrap_or_else(|e| {
            eprintln!("Warning: Failed to load configuration: {e}");
            GrepAstConfig::default().resolve_with_defaults()
        })
    })
}
