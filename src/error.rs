//! Error taxonomy.
//!
//! Only [`GraphError`] aborts a run. The other kinds are per-package or
//! per-library and degrade to a sentinel in the report.

use std::path::PathBuf;

use thiserror::Error;

/// Loading or walking the package graph failed. Fatal for the whole run.
#[derive(Error, Debug)]
pub enum GraphError {
    #[error("failed to run `{command}`: {source}")]
    Spawn {
        command: String,
        source: std::io::Error,
    },

    #[error("`{command}` failed: {stderr}")]
    Command { command: String, stderr: String },

    #[error("invalid `go list` output: {0}")]
    Decode(#[from] serde_json::Error),

    /// Every load error of every reachable package, one `path: error` per line.
    #[error("errors for {roots:?}:{}", format_package_errors(.errors))]
    Packages {
        roots: Vec<String>,
        errors: Vec<(String, String)>,
    },
}

fn format_package_errors(errors: &[(String, String)]) -> String {
    errors
        .iter()
        .map(|(pkg, err)| format!("\n{pkg}: {err}"))
        .collect()
}

#[derive(Error, Debug)]
pub enum LicenseDiscoveryError {
    #[error("cannot read directory '{path}': {source}")]
    ReadDir {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("package directory is not absolute: {0}")]
    RelativeDir(PathBuf),
}

#[derive(Error, Debug)]
pub enum ProvenanceError {
    #[error("unsupported package host {host:?} for {library:?}")]
    UnsupportedHost { host: String, library: String },

    #[error("cannot determine URL for {library:?} package")]
    MalformedName { library: String },

    #[error("library {library:?} has no license file")]
    NoLicense { library: String },

    #[error("unsupported Git repository host {0:?}")]
    UnsupportedGitHost(String),

    #[error("cannot parse Git remote URL {0:?}")]
    RemoteUrl(String),

    #[error("Git remote {0:?} is not configured")]
    MissingRemote(String),

    #[error("git lookup failed in '{path}': {reason}")]
    Git { path: PathBuf, reason: String },

    #[error("'{file}' is not inside '{base}'")]
    OutsideBase { file: PathBuf, base: PathBuf },

    #[error("no license URL for {library:?} (host {host:?}):{}", format_attempts(.attempts))]
    Unresolved {
        host: String,
        library: String,
        attempts: Vec<String>,
    },
}

fn format_attempts(attempts: &[String]) -> String {
    attempts.iter().map(|a| format!("\n- {a}")).collect()
}

#[derive(Error, Debug)]
pub enum ClassificationError {
    #[error("failed to read license file '{path}': {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("no known license in '{path}' (best: {best} at {confidence:.2})")]
    BelowThreshold {
        path: PathBuf,
        best: String,
        confidence: f64,
    },
}
