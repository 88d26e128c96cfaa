use crate::cli::CompareArgs;
use crate::error::{CliError, Result};
use rmsdkit::engine::config::{self as core_config, Method};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::debug;

const DEFAULT_OUTPUT_FILE: &str = "rmsd_results.csv";
const DEFAULT_OUTPUT_DIRECTORY: &str = "results";

#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
struct PartialRobustConfig {
    cutoff: Option<f64>,
    max_cycles: Option<usize>,
    chain_reference: Option<String>,
    chain_candidate: Option<String>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields)]
struct PartialOutputConfig {
    file: Option<PathBuf>,
    directory: Option<PathBuf>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields)]
pub struct PartialComparisonConfig {
    method: Option<Method>,
    threshold: Option<f64>,
    robust: Option<PartialRobustConfig>,
    output: Option<PartialOutputConfig>,
}

/// Settings of one `compare` run after merging every configuration layer.
#[derive(Debug, Clone, PartialEq)]
pub struct CompareSettings {
    pub core: core_config::ComparisonConfig,
    pub output_path: PathBuf,
}

impl PartialComparisonConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        debug!("Loading configuration from file: {:?}", path);
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| CliError::FileParsing {
            path: path.to_path_buf(),
            source: e.into(),
        })
    }

    /// Loads the file named by `--config`, or starts empty when there is none.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => Ok(Self::default()),
        }
    }

    pub fn merge_with_cli(mut self, args: &CompareArgs) -> Result<CompareSettings> {
        self.apply_set_values(&args.set_values)?;

        let robust = self.robust.take().unwrap_or_default();
        let output = self.output.take().unwrap_or_default();

        let mut builder = core_config::ComparisonConfigBuilder::new()
            .chain_reference(args.chain_ref.clone().or(robust.chain_reference))
            .chain_candidate(args.chain_mob.clone().or(robust.chain_candidate));

        if let Some(method) = args.method.or(self.method) {
            builder = builder.method(method);
        }
        if let Some(threshold) = args.threshold.or(self.threshold) {
            builder = builder.threshold(threshold);
        }
        if let Some(cutoff) = args.cutoff.or(robust.cutoff) {
            builder = builder.cutoff(cutoff);
        }
        if let Some(cycles) = args.cycles.or(robust.max_cycles) {
            builder = builder.max_cycles(cycles);
        }
        let core = builder
            .build()
            .map_err(|e| CliError::Config(e.to_string()))?;

        let file = args
            .output
            .clone()
            .or(output.file)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_FILE));
        let directory = args
            .outdir
            .clone()
            .or(output.directory)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_DIRECTORY));

        Ok(CompareSettings {
            core,
            output_path: directory.join(file),
        })
    }

    fn apply_set_values(&mut self, set_values: &[String]) -> Result<()> {
        for kv_pair in set_values {
            let (key, value_str) = kv_pair.split_once('=').ok_or_else(|| {
                CliError::Config(format!(
                    "Invalid --set format: '{}'. Expected KEY=VALUE.",
                    kv_pair
                ))
            })?;

            match key {
                "method" => {
                    self.method = Some(
                        Method::from_str(value_str).map_err(|e| CliError::Config(e.to_string()))?,
                    );
                }
                "threshold" => self.threshold = Some(parse_value(key, value_str)?),
                "robust.cutoff" => {
                    self.robust.get_or_insert_with(Default::default).cutoff =
                        Some(parse_value(key, value_str)?);
                }
                "robust.max-cycles" => {
                    self.robust.get_or_insert_with(Default::default).max_cycles =
                        Some(parse_value(key, value_str)?);
                }
                "robust.chain-reference" => {
                    self.robust
                        .get_or_insert_with(Default::default)
                        .chain_reference = Some(value_str.to_string());
                }
                "robust.chain-candidate" => {
                    self.robust
                        .get_or_insert_with(Default::default)
                        .chain_candidate = Some(value_str.to_string());
                }
                "output.file" => {
                    self.output.get_or_insert_with(Default::default).file =
                        Some(PathBuf::from(value_str));
                }
                "output.directory" => {
                    self.output.get_or_insert_with(Default::default).directory =
                        Some(PathBuf::from(value_str));
                }
                _ => {
                    return Err(CliError::Config(format!(
                        "Unsupported configuration key for --set: '{}'",
                        key
                    )));
                }
            }
        }
        Ok(())
    }
}

fn parse_value<T: FromStr>(key: &str, value_str: &str) -> Result<T> {
    value_str.trim().parse().map_err(|_| {
        CliError::Config(format!("Invalid value for {}: {}", key, value_str))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{Cli, Commands};
    use clap::Parser;
    use std::fs;
    use tempfile::TempDir;

    fn write_config_file(dir: &TempDir, content: &str) -> PathBuf {
        let file_path = dir.path().join("rmsdkit.toml");
        fs::write(&file_path, content).unwrap();
        file_path
    }

    fn compare_args(extra: &[&str]) -> CompareArgs {
        let mut argv = vec!["rmsdkit", "compare", "--reference", "ref.pdb"];
        argv.extend_from_slice(extra);
        let Commands::Compare(args) = Cli::parse_from(argv).command;
        args
    }

    #[test]
    fn defaults_apply_without_file_or_flags() {
        let settings = PartialComparisonConfig::default()
            .merge_with_cli(&compare_args(&[]))
            .unwrap();

        assert_eq!(settings.core, core_config::ComparisonConfig::default());
        assert_eq!(
            settings.output_path,
            Path::new("results").join("rmsd_results.csv")
        );
    }

    #[test]
    fn file_values_are_loaded() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config_file(
            &dir,
            r#"
            method = "robust"
            threshold = 1.5

            [robust]
            cutoff = 3.0
            max-cycles = 8
            chain-reference = "A"
            chain-candidate = "B"

            [output]
            file = "scores.csv"
            directory = "out"
            "#,
        );

        let settings = PartialComparisonConfig::from_file(&path)
            .unwrap()
            .merge_with_cli(&compare_args(&[]))
            .unwrap();

        assert_eq!(settings.core.method, Method::Robust);
        assert_eq!(settings.core.threshold, 1.5);
        assert_eq!(settings.core.robust.cutoff, 3.0);
        assert_eq!(settings.core.robust.max_cycles, 8);
        assert_eq!(settings.core.chain_reference.as_deref(), Some("A"));
        assert_eq!(settings.core.chain_candidate.as_deref(), Some("B"));
        assert_eq!(settings.output_path, Path::new("out").join("scores.csv"));
    }

    #[test]
    fn cli_flags_override_set_values_and_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config_file(
            &dir,
            r#"
            method = "kabsch"
            threshold = 1.0
            [robust]
            cutoff = 3.0
            "#,
        );

        let args = compare_args(&[
            "--threshold",
            "4.0",
            "--outdir",
            "elsewhere",
            "-S",
            "threshold=2.5",
            "-S",
            "robust.cutoff=1.25",
            "-S",
            "method=robust",
        ]);
        let settings = PartialComparisonConfig::from_file(&path)
            .unwrap()
            .merge_with_cli(&args)
            .unwrap();

        assert_eq!(settings.core.threshold, 4.0);
        assert_eq!(settings.core.robust.cutoff, 1.25);
        assert_eq!(settings.core.method, Method::Robust);
        assert_eq!(
            settings.output_path,
            Path::new("elsewhere").join("rmsd_results.csv")
        );
    }

    #[test]
    fn unknown_file_keys_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config_file(&dir, "iterations = 3\n");

        let result = PartialComparisonConfig::from_file(&path);
        assert!(matches!(result, Err(CliError::FileParsing { .. })));
    }

    #[test]
    fn malformed_set_values_are_rejected() {
        for bad in ["threshold", "threshold=abc", "robust.unknown=1", "method=pymol2"] {
            let args = compare_args(&["-S", bad]);
            let result = PartialComparisonConfig::default().merge_with_cli(&args);
            assert!(matches!(result, Err(CliError::Config(_))), "{bad}");
        }
    }

    #[test]
    fn invalid_values_fail_validation() {
        let args = compare_args(&["--cutoff", "0", "--cycles", "0"]);
        let result = PartialComparisonConfig::default().merge_with_cli(&args);
        assert!(matches!(result, Err(CliError::Config(_))));
    }
}
