//! cachegrid.toml configuration parser.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Default file name looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "cachegrid.toml";

/// Default suffix appended to an input file name to form its output name.
pub const DEFAULT_OUTPUT_SUFFIX: &str = ".out";

/// Default number of progress reports per optimizer run.
pub const DEFAULT_PROGRESS_STEPS: usize = 10;

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct CacheGridConfig {
    #[serde(default)]
    pub run: RunConfig,
    #[serde(default)]
    pub log: LogConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct RunConfig {
    /// Input files solved in order when none are given on the command line.
    #[serde(default)]
    pub inputs: Vec<PathBuf>,
    /// Where output files go. Defaults to each input's own directory.
    pub output_dir: Option<PathBuf>,
    pub output_suffix: Option<String>,
    /// How many progress lines to log per run (0 disables them).
    pub progress_steps: Option<usize>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct LogConfig {
    /// `tracing_subscriber::EnvFilter` directive, e.g. `"info,cachegrid=debug"`.
    pub filter: Option<String>,
}

impl CacheGridConfig {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })
    }

    /// Load `path` if given, else `cachegrid.toml` in `dir` if it exists,
    /// else defaults.
    pub fn discover(path: Option<&Path>, dir: &Path) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::from_file(path),
            None => {
                let candidate = dir.join(DEFAULT_CONFIG_FILE);
                if candidate.is_file() {
                    Self::from_file(&candidate)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn output_suffix(&self) -> &str {
        self.run
            .output_suffix
            .as_deref()
            .unwrap_or(DEFAULT_OUTPUT_SUFFIX)
    }

    pub fn progress_steps(&self) -> usize {
        self.run.progress_steps.unwrap_or(DEFAULT_PROGRESS_STEPS)
    }

    /// Output path for `input`: `<output_dir or input dir>/<file name><suffix>`.
    pub fn output_path_for(&self, input: &Path) -> PathBuf {
        let mut name = input
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "solution".into());
        name.push(self.output_suffix());

        match &self.run.output_dir {
            Some(dir) => dir.join(name),
            None => input.with_file_name(name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full() {
        let toml_str = r#"
[run]
inputs = ["kittens.in", "me_at_the_zoo.in"]
output_dir = "out"
output_suffix = ".sol"
progress_steps = 4

[log]
filter = "debug"
"#;
        let config: CacheGridConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.run.inputs.len(), 2);
        assert_eq!(config.output_suffix(), ".sol");
        assert_eq!(config.progress_steps(), 4);
        assert_eq!(config.log.filter.as_deref(), Some("debug"));
        assert_eq!(
            config.output_path_for(Path::new("data/kittens.in")),
            PathBuf::from("out/kittens.in.sol")
        );
    }

    #[test]
    fn test_parse_empty_uses_defaults() {
        let config: CacheGridConfig = toml::from_str("").unwrap();
        assert!(config.run.inputs.is_empty());
        assert_eq!(config.output_suffix(), ".out");
        assert_eq!(config.progress_steps(), 10);
        assert_eq!(
            config.output_path_for(Path::new("data/kittens.in")),
            PathBuf::from("data/kittens.in.out")
        );
    }

    #[test]
    fn test_roundtrip_toml() {
        let mut config = CacheGridConfig::default();
        config.run.output_dir = Some(PathBuf::from("out"));
        let toml_str = config.to_toml_string().unwrap();
        assert!(toml_str.contains("output_dir"));
        let parsed: CacheGridConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_discover() {
        let dir = tempfile::tempdir().unwrap();
        let config = CacheGridConfig::discover(None, dir.path()).unwrap();
        assert_eq!(config, CacheGridConfig::default());

        std::fs::write(dir.path().join(DEFAULT_CONFIG_FILE), "[log]\nfilter = \"warn\"\n").unwrap();
        let config = CacheGridConfig::discover(None, dir.path()).unwrap();
        assert_eq!(config.log.filter.as_deref(), Some("warn"));

        let bad = dir.path().join("bad.toml");
        std::fs::write(&bad, "[run\n").unwrap();
        let err = CacheGridConfig::discover(Some(&bad), dir.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }
}
