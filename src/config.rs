//! Configuration management with layered loading
//!
//! Precedence (lowest to highest):
//! 1. Compiled defaults
//! 2. Global config: `$XDG_CONFIG_HOME/closure-tree/closure-tree.toml`
//! 3. Local config: `./.closure-tree.toml`, or the file given with `--config`
//! 4. Environment variables: `CLOSURE_TREE__*` (e.g. `CLOSURE_TREE__BENCHMARK__BRANCHING=3`)

use std::path::{Path, PathBuf};

use config::{Config, ConfigError, Environment, File};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::application::services::BenchmarkOptions;
use crate::application::{ApplicationError, ReportFormat};
use crate::domain::{DeleteMode, TreeShape};

/// Per-node branching drawn from a range instead of a fixed factor.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct RandomShapeConfig {
    pub min_branching: usize,
    pub max_branching: usize,
    pub seed: u64,
}

impl Default for RandomShapeConfig {
    fn default() -> Self {
        Self {
            min_branching: 1,
            max_branching: 3,
            seed: 42,
        }
    }
}

/// Which trees to build and how to tear them down.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct BenchmarkConfig {
    /// Children per node for uniform trees
    pub branching: usize,
    /// One configuration per entry (generations below the root)
    pub depths: Vec<usize>,
    /// Mode used when timing deletion of the root
    pub delete_mode: DeleteMode,
    /// Time deletion of the root after sampling
    pub measure_deletion: bool,
    /// Run configurations on the rayon pool
    pub parallel: bool,
    /// Randomized branching; replaces `branching` when set
    pub random: Option<RandomShapeConfig>,
}

impl Default for BenchmarkConfig {
    fn default() -> Self {
        Self {
            branching: 2,
            depths: vec![1, 2, 3, 4, 5, 6, 7, 8],
            delete_mode: DeleteMode::Cascade,
            measure_deletion: true,
            parallel: false,
            random: None,
        }
    }
}

/// How results are rendered.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(default)]
pub struct ReportConfig {
    pub format: ReportFormat,
    /// Also print every per-node sample
    pub per_node: bool,
    /// Write the report to this file instead of stdout
    pub output: Option<PathBuf>,
}

/// Unified configuration for closure-tree.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(default)]
pub struct Settings {
    pub benchmark: BenchmarkConfig,
    pub report: ReportConfig,
}

/// Get the XDG config directory for closure-tree.
pub fn global_config_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "closure-tree").map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the global config file.
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("closure-tree.toml"))
}

/// Get the path to the local config file in the working directory.
pub fn local_config_path() -> PathBuf {
    PathBuf::from(".closure-tree.toml")
}

impl Settings {
    /// Load settings with layered precedence.
    ///
    /// # Arguments
    /// * `config_file` - Explicit config file; replaces the local `.closure-tree.toml` lookup
    ///   and must exist
    pub fn load(config_file: Option<&Path>) -> Result<Self, ApplicationError> {
        let defaults = Config::try_from(&Settings::default()).map_err(config_err)?;
        let mut builder = Config::builder().add_source(defaults);

        if let Some(global_path) = global_config_path() {
            builder = builder.add_source(File::from(global_path).required(false));
        }

        builder = match config_file {
            Some(path) => builder.add_source(File::from(path).required(true)),
            None => builder.add_source(File::from(local_config_path()).required(false)),
        };

        builder = builder.add_source(
            Environment::with_prefix("CLOSURE_TREE")
                .separator("__")
                .list_separator(",")
                .with_list_parse_key("benchmark.depths")
                .try_parsing(true),
        );

        let config = builder.build().map_err(config_err)?;
        let mut settings: Self = config.try_deserialize().map_err(config_err)?;

        settings.expand_paths();
        Ok(settings)
    }

    /// Expand shell variables and tilde in path-like fields.
    fn expand_paths(&mut self) {
        if let Some(output) = self.report.output.as_ref() {
            let raw = output.to_string_lossy();
            let expanded = shellexpand::full(raw.as_ref())
                .map(|s| s.into_owned())
                .unwrap_or_else(|_| raw.to_string());
            self.report.output = Some(PathBuf::from(expanded));
        }
    }

    /// One tree shape per configured depth.
    pub fn shapes(&self) -> Vec<TreeShape> {
        let bench = &self.benchmark;
        bench
            .depths
            .iter()
            .map(|&depth| match &bench.random {
                Some(random) => TreeShape::Random {
                    min_branching: random.min_branching,
                    max_branching: random.max_branching,
                    depth,
                    seed: random.seed,
                },
                None => TreeShape::uniform(bench.branching, depth),
            })
            .collect()
    }

    pub fn benchmark_options(&self) -> BenchmarkOptions {
        BenchmarkOptions {
            delete_mode: self.benchmark.delete_mode,
            measure_deletion: self.benchmark.measure_deletion,
            parallel: self.benchmark.parallel,
        }
    }

    /// Show the effective configuration as TOML.
    pub fn to_toml(&self) -> Result<String, ApplicationError> {
        toml::to_string_pretty(self).map_err(|e| ApplicationError::Config {
            message: format!("serialize config: {e}"),
        })
    }

    /// Generate a template config file.
    pub fn template() -> String {
        r#"# closure-tree configuration
#
# Locations (by precedence, lowest to highest):
#   Global: ~/.config/closure-tree/closure-tree.toml
#   Local:  ./.closure-tree.toml (or --config <file>)
#   Env:    CLOSURE_TREE__<SECTION>__<KEY>, e.g. CLOSURE_TREE__BENCHMARK__DEPTHS=1,2,3

[benchmark]
# Children per node
# branching = 2

# One benchmark configuration per depth (generations below the root)
# depths = [1, 2, 3, 4, 5, 6, 7, 8]

# Deletion mode timed at the end of each run: "cascade" or "promote_children"
# delete_mode = "cascade"

# Time deletion of the root after sampling
# measure_deletion = true

# Run configurations in parallel, one independent tree each
# parallel = false

# Randomized branching (replaces `branching`)
# [benchmark.random]
# min_branching = 1
# max_branching = 3
# seed = 42

[report]
# "text" or "csv"
# format = "text"

# Print every per-node sample
# per_node = false

# Write the report to a file instead of stdout
# output = "~/closure-tree-results.csv"
"#
        .to_string()
    }
}

fn config_err(e: ConfigError) -> ApplicationError {
    ApplicationError::Config {
        message: e.to_string(),
    }
}
