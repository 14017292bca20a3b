use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use tracing::debug;

/// Root configuration, deserialized from `.go-license-checkr/config.toml`.
///
/// Every field is optional in the file; missing ones take the built-in default.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Git remotes to try when deriving license URLs, most preferred first.
    pub git_remotes: Vec<String>,
    /// Minimum classifier confidence for a license to be named.
    pub confidence_threshold: f64,
    /// Worker threads; `None` lets rayon pick the CPU count.
    pub jobs: Option<usize>,
    /// Go runtime root. Queried from `go env GOROOT` when unset.
    pub goroot: Option<PathBuf>,
    /// Directories at which license discovery stops climbing (e.g. GOPATH).
    pub stop_dirs: Vec<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            git_remotes: vec!["origin".to_string(), "upstream".to_string()],
            confidence_threshold: 0.9,
            jobs: None,
            goroot: None,
            stop_dirs: Vec::new(),
        }
    }
}

impl Config {
    /// Command-line values win over the file. An empty `git_remotes` keeps the configured list.
    pub fn with_overrides(
        mut self,
        git_remotes: Vec<String>,
        confidence_threshold: Option<f64>,
        jobs: Option<usize>,
    ) -> Self {
        if !git_remotes.is_empty() {
            self.git_remotes = git_remotes;
        }
        if let Some(threshold) = confidence_threshold {
            self.confidence_threshold = threshold;
        }
        if jobs.is_some() {
            self.jobs = jobs;
        }
        self
    }

    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.confidence_threshold) {
            bail!(
                "confidence threshold must be between 0.0 and 1.0, got {}",
                self.confidence_threshold
            );
        }
        if self.jobs == Some(0) {
            bail!("jobs must be at least 1");
        }
        if self.git_remotes.iter().any(|r| r.trim().is_empty()) {
            bail!("git remote names must not be empty");
        }
        Ok(())
    }
}

fn read_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("reading config {}", path.display()))?;
    let config = toml::from_str(&content).with_context(|| format!("parsing config {}", path.display()))?;
    debug!(path = %path.display(), "loaded config");
    Ok(config)
}

/// Load the configuration, searching in order:
///
/// 1. `config_override`, the path passed via `--config`
/// 2. `<project_path>/.go-license-checkr/config.toml`
/// 3. `~/.config/go-license-checkr/config.toml`
/// 4. Built-in [`Config::default`]
pub fn load_config(project_path: &Path, config_override: Option<&Path>) -> Result<Config> {
    if let Some(path) = config_override {
        return read_config(path);
    }

    let project_config = project_path.join(".go-license-checkr").join("config.toml");
    if project_config.exists() {
        return read_config(&project_config);
    }

    if let Some(home) = dirs::home_dir() {
        let home_config = home
            .join(".config")
            .join("go-license-checkr")
            .join("config.toml");
        if home_config.exists() {
            return read_config(&home_config);
        }
    }

    Ok(Config::default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_project_config_is_found() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join(".go-license-checkr");
        fs::create_dir_all(&dir).unwrap();
        fs::write(
            dir.join("config.toml"),
            "git_remotes = [\"upstream\"]\nconfidence_threshold = 0.75\nstop_dirs = [\"/go\"]\n",
        )
        .unwrap();

        let config = load_config(tmp.path(), None).unwrap();
        assert_eq!(
            config,
            Config {
                git_remotes: vec!["upstream".to_string()],
                confidence_threshold: 0.75,
                jobs: None,
                goroot: None,
                stop_dirs: vec![PathBuf::from("/go")],
            }
        );
    }

    #[test]
    fn test_override_path_wins() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join(".go-license-checkr");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("config.toml"), "jobs = 2\n").unwrap();
        let other = tmp.path().join("other.toml");
        fs::write(&other, "jobs = 8\n").unwrap();

        let config = load_config(tmp.path(), Some(&other)).unwrap();
        assert_eq!(config.jobs, Some(8));
        assert_eq!(config.git_remotes, vec!["origin", "upstream"]);
    }

    #[test]
    fn test_missing_override_is_error() {
        let tmp = TempDir::new().unwrap();
        assert!(load_config(tmp.path(), Some(&tmp.path().join("nope.toml"))).is_err());
    }

    #[test]
    fn test_unknown_field_is_rejected() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("c.toml");
        fs::write(&path, "remotes = [\"origin\"]\n").unwrap();
        assert!(load_config(tmp.path(), Some(&path)).is_err());
    }

    #[test]
    fn test_cli_overrides() {
        let config = Config::default().with_overrides(vec!["fork".to_string()], Some(0.5), Some(3));
        assert_eq!(config.git_remotes, vec!["fork"]);
        assert_eq!(config.confidence_threshold, 0.5);
        assert_eq!(config.jobs, Some(3));

        let config = Config::default().with_overrides(Vec::new(), None, None);
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_validate() {
        assert!(Config::default().validate().is_ok());
        assert!(Config::default().with_overrides(vec![], Some(1.5), None).validate().is_err());
        assert!(Config::default().with_overrides(vec![], None, Some(0)).validate().is_err());
    }
}
