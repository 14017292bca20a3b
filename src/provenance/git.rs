//! Local Git working copies as a provenance source.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::OnceLock;

use regex::Regex;
use tracing::trace;

use crate::error::ProvenanceError;
use crate::models::ProvenanceResult;

use super::{hosts, relative_slash_path};

/// Read-only access to the Git metadata of a working copy.
pub trait GitLookup: Sync {
    /// Root of the working copy containing `path`, if any.
    fn repo_root(&self, path: &Path) -> Option<PathBuf>;

    /// Configured remotes of the repository at `root`, name to URL.
    fn remotes(&self, root: &Path) -> Result<HashMap<String, String>, ProvenanceError>;
}

/// Uses the `git` binary for remote lookups.
#[derive(Debug, Default, Clone, Copy)]
pub struct GitCli;

impl GitLookup for GitCli {
    fn repo_root(&self, path: &Path) -> Option<PathBuf> {
        let start = if path.is_dir() { path } else { path.parent()? };
        start
            .ancestors()
            .find(|dir| dir.join(".git").exists())
            .map(Path::to_path_buf)
    }

    fn remotes(&self, root: &Path) -> Result<HashMap<String, String>, ProvenanceError> {
        let output = Command::new("git")
            .arg("-C")
            .arg(root)
            .args(["config", "--get-regexp", r"^remote\..*\.url$"])
            .output()
            .map_err(|e| ProvenanceError::Git {
                path: root.to_path_buf(),
                reason: e.to_string(),
            })?;

        // `git config --get-regexp` exits with 1 when nothing matches.
        if !output.status.success() && output.status.code() != Some(1) {
            return Err(ProvenanceError::Git {
                path: root.to_path_buf(),
                reason: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(parse_remotes(&String::from_utf8_lossy(&output.stdout)))
    }
}

/// Parse `remote.<name>.url <url>` lines.
pub fn parse_remotes(config: &str) -> HashMap<String, String> {
    config
        .lines()
        .filter_map(|line| {
            let (key, url) = line.trim().split_once(char::is_whitespace)?;
            let name = key.strip_prefix("remote.")?.strip_suffix(".url")?;
            Some((name.to_string(), url.trim().to_string()))
        })
        .collect()
}

/// Host and repository path of a remote.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteUrl {
    pub host: String,
    pub path: String,
}

/// Parse `https://`, `ssh://`, `git://` and scp-like `user@host:path` remotes.
pub fn parse_remote_url(url: &str) -> Result<RemoteUrl, ProvenanceError> {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| {
        Regex::new(r"^(?:[a-z][a-z0-9+.-]*://)?(?:[^@/]+@)?([^/:@]+)(?::\d+)?[:/](.+?)(?:\.git)?/?$")
            .expect("valid pattern")
    });

    let caps = re
        .captures(url.trim())
        .ok_or_else(|| ProvenanceError::RemoteUrl(url.to_string()))?;
    let host = caps[1].to_lowercase();
    let path = caps[2].trim_start_matches('/').to_string();

    // Azure DevOps SSH remotes: ssh.dev.azure.com:v3/<org>/<project>/<repo>
    if host == "ssh.dev.azure.com" {
        let parts: Vec<&str> = path.split('/').collect();
        if let ["v3", org, project, repo] = parts.as_slice() {
            return Ok(RemoteUrl {
                host: "dev.azure.com".to_string(),
                path: format!("{org}/{project}/_git/{repo}"),
            });
        }
    }

    Ok(RemoteUrl { host, path })
}

/// Location of `file` inside the working copy at `root`, browsed through `remote_url`.
pub fn file_url(root: &Path, file: &Path, remote_url: &str) -> Result<ProvenanceResult, ProvenanceError> {
    let rel = relative_slash_path(file, root)?;
    let remote = parse_remote_url(remote_url)?;
    trace!(host = %remote.host, repo = %remote.path, file = %rel, "git remote candidate");
    hosts::repository_file(&remote.host, &remote.path, &rel)
}
