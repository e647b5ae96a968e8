// Copyright (c) The stepbridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration for stepbridge.
//!
//! Configuration is layered, from lowest to highest priority:
//!
//! 1. the embedded defaults in `default-config.toml`
//! 2. a user config file, by default `.config/stepbridge.toml` in the workspace root
//! 3. the `STEPBRIDGE_OUTPUT_DIR` environment variable, for the output directory

use crate::errors::{ConfigParseError, ConfigParseErrorKind};
use camino::{Utf8Path, Utf8PathBuf};
use config::{Config, ConfigBuilder, ConfigError, File, FileFormat, builder::DefaultState};
use serde::Deserialize;
use std::collections::BTreeSet;
use tracing::warn;

/// Handles warnings produced while loading configuration.
///
/// The default implementation, [`DefaultConfigWarnings`], logs warnings. Tests
/// can collect them instead.
pub trait ConfigWarnings {
    /// Handle unknown configuration keys found in a config file.
    fn unknown_config_keys(
        &mut self,
        config_file: &Utf8Path,
        workspace_root: &Utf8Path,
        unknown: &BTreeSet<String>,
    );
}

/// Default implementation of [`ConfigWarnings`] that logs warnings using the
/// tracing crate.
pub struct DefaultConfigWarnings;

impl ConfigWarnings for DefaultConfigWarnings {
    fn unknown_config_keys(
        &mut self,
        config_file: &Utf8Path,
        workspace_root: &Utf8Path,
        unknown: &BTreeSet<String>,
    ) {
        let unknown_str = match unknown.iter().collect::<Vec<_>>().as_slice() {
            // Print this on the same line.
            [key] => format!("key: {key}"),
            keys => {
                let mut s = String::from("keys:\n");
                for key in keys {
                    s.push_str("\n  - ");
                    s.push_str(key);
                }
                s
            }
        };

        warn!(
            "in config file {}, ignoring unknown configuration {unknown_str}",
            config_file
                .strip_prefix(workspace_root)
                .unwrap_or(config_file),
        )
    }
}

/// Resolved stepbridge configuration.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct BridgeConfig {
    output_dir: Utf8PathBuf,
    dialect_extension: String,
    test_source: String,
    default_test_name: String,
}

impl BridgeConfig {
    /// The default configuration, embedded in the binary.
    pub const DEFAULT_CONFIG: &'static str = include_str!("../default-config.toml");

    /// The path of the config file, relative to the workspace root.
    pub const CONFIG_PATH: &'static str = ".config/stepbridge.toml";

    /// The environment variable that overrides the output directory.
    pub const OUTPUT_DIR_ENV: &'static str = "STEPBRIDGE_OUTPUT_DIR";

    /// Reads the configuration from the default config, a config file and the
    /// environment.
    ///
    /// If `config_file` is `None`, `.config/stepbridge.toml` in the workspace
    /// root is read if it exists. Unknown keys are logged as warnings.
    pub fn from_sources(
        workspace_root: impl Into<Utf8PathBuf>,
        config_file: Option<&Utf8Path>,
    ) -> Result<Self, ConfigParseError> {
        Self::from_sources_with_warnings(workspace_root, config_file, &mut DefaultConfigWarnings)
    }

    /// Reads the configuration with custom warning handling.
    pub fn from_sources_with_warnings(
        workspace_root: impl Into<Utf8PathBuf>,
        config_file: Option<&Utf8Path>,
        warnings: &mut impl ConfigWarnings,
    ) -> Result<Self, ConfigParseError> {
        let output_dir_override = std::env::var(Self::OUTPUT_DIR_ENV).ok();
        Self::from_sources_impl(
            workspace_root,
            config_file,
            output_dir_override.as_deref(),
            warnings,
        )
    }

    /// Returns the configuration made of the embedded defaults alone.
    pub fn default_config(workspace_root: impl Into<Utf8PathBuf>) -> Result<Self, ConfigParseError> {
        let workspace_root = workspace_root.into();
        let (config, _unknown) = Self::build_and_deserialize_config(&Self::make_default_config())
            .map_err(|kind| ConfigParseError::new(None, kind))?;
        Ok(config.into_config(&workspace_root))
    }

    // The environment is passed in so tests don't depend on it.
    pub(crate) fn from_sources_impl(
        workspace_root: impl Into<Utf8PathBuf>,
        config_file: Option<&Utf8Path>,
        output_dir_override: Option<&str>,
        warnings: &mut impl ConfigWarnings,
    ) -> Result<Self, ConfigParseError> {
        let workspace_root = workspace_root.into();
        let (config_file, source) = match config_file {
            Some(file) => (file.to_owned(), File::new(file.as_str(), FileFormat::Toml)),
            None => {
                let config_file = workspace_root.join(Self::CONFIG_PATH);
                let source = File::new(config_file.as_str(), FileFormat::Toml).required(false);
                (config_file, source)
            }
        };

        let mut builder = Self::make_default_config().add_source(source);
        if let Some(output_dir) = output_dir_override.filter(|dir| !dir.is_empty()) {
            builder = builder
                .set_override("output-dir", output_dir)
                .map_err(|error| {
                    ConfigParseError::new(
                        Some(config_file.clone()),
                        ConfigParseErrorKind::BuildError(Box::new(error)),
                    )
                })?;
        }

        let (config, unknown) = Self::build_and_deserialize_config(&builder)
            .map_err(|kind| ConfigParseError::new(Some(config_file.clone()), kind))?;
        if !unknown.is_empty() {
            warnings.unknown_config_keys(&config_file, &workspace_root, &unknown);
        }

        Ok(config.into_config(&workspace_root))
    }

    /// Returns the directory reports are written to.
    pub fn output_dir(&self) -> &Utf8Path {
        &self.output_dir
    }

    /// Returns the extension marker identifying dialect test classes.
    pub fn dialect_extension(&self) -> &str {
        &self.dialect_extension
    }

    /// Returns the test source kind announced to the event bus.
    pub fn test_source(&self) -> &str {
        &self.test_source
    }

    /// Returns the name used for tests whose name cannot be determined.
    pub fn default_test_name(&self) -> &str {
        &self.default_test_name
    }

    fn make_default_config() -> ConfigBuilder<DefaultState> {
        Config::builder().add_source(File::from_str(Self::DEFAULT_CONFIG, FileFormat::Toml))
    }

    /// This returns a tuple of (config, ignored paths).
    fn build_and_deserialize_config(
        builder: &ConfigBuilder<DefaultState>,
    ) -> Result<(BridgeConfigDeserialize, BTreeSet<String>), ConfigParseErrorKind> {
        let config = builder
            .build_cloned()
            .map_err(|error| ConfigParseErrorKind::BuildError(Box::new(error)))?;

        let mut ignored = BTreeSet::new();
        let mut cb = |path: serde_ignored::Path| {
            ignored.insert(path.to_string());
        };
        let ignored_de = serde_ignored::Deserializer::new(config, &mut cb);
        let config: BridgeConfigDeserialize = serde_path_to_error::deserialize(ignored_de)
            .map_err(|error| {
                // The key is reported by serde_path_to_error, so drop it from
                // the config error.
                let path = error.path().clone();
                let error = match error.into_inner() {
                    ConfigError::At { error, .. } => *error,
                    other => other,
                };
                ConfigParseErrorKind::DeserializeError(Box::new(serde_path_to_error::Error::new(
                    path, error,
                )))
            })?;

        Ok((config, ignored))
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct BridgeConfigDeserialize {
    output_dir: Utf8PathBuf,
    dialect_extension: String,
    test_source: String,
    default_test_name: String,
}

impl BridgeConfigDeserialize {
    fn into_config(self, workspace_root: &Utf8Path) -> BridgeConfig {
        BridgeConfig {
            // An absolute output dir replaces the workspace root when joined.
            output_dir: workspace_root.join(self.output_dir),
            dialect_extension: self.dialect_extension,
            test_source: self.test_source,
            default_test_name: self.default_test_name,
        }
    }
}
