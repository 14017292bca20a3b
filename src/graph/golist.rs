use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::Command;

use serde::Deserialize;
use tracing::{debug, info};

use super::{GraphWalker, PackageGraph};
use crate::error::GraphError;
use crate::models::Package;

const GO_COMMAND: &str = "go";
const GO_LIST_ARGS: &[&str] = &["list", "-e", "-deps", "-json"];
const GO_ENV_GOROOT_ARGS: &[&str] = &["env", "GOROOT"];
const GO_ENV_GOPATH_ARGS: &[&str] = &["env", "GOPATH"];

/// One object of the `go list -json` stream. Only the fields we use.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct GoListPackage {
    import_path: String,
    #[serde(default)]
    dir: Option<PathBuf>,
    #[serde(default)]
    go_files: Vec<String>,
    #[serde(default)]
    cgo_files: Vec<String>,
    #[serde(default)]
    c_files: Vec<String>,
    #[serde(default, rename = "CXXFiles")]
    cxx_files: Vec<String>,
    #[serde(default)]
    m_files: Vec<String>,
    #[serde(default)]
    h_files: Vec<String>,
    #[serde(default)]
    f_files: Vec<String>,
    #[serde(default)]
    s_files: Vec<String>,
    #[serde(default)]
    swig_files: Vec<String>,
    #[serde(default, rename = "SwigCXXFiles")]
    swig_cxx_files: Vec<String>,
    #[serde(default)]
    syso_files: Vec<String>,
    #[serde(default)]
    imports: Vec<String>,
    #[serde(default)]
    import_map: HashMap<String, String>,
    #[serde(default)]
    dep_only: bool,
    #[serde(default)]
    error: Option<GoListError>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct GoListError {
    err: String,
}

impl GoListPackage {
    fn into_package(self) -> (Package, Vec<String>, bool) {
        let dir = self.dir.clone().unwrap_or_default();
        let abs = |files: Vec<String>| -> Vec<PathBuf> {
            files.into_iter().map(|f| dir.join(f)).collect()
        };

        let go_files = abs([self.go_files, self.cgo_files].concat());
        let other_files = abs(
            [
                self.c_files,
                self.cxx_files,
                self.m_files,
                self.h_files,
                self.f_files,
                self.s_files,
                self.swig_files,
                self.swig_cxx_files,
                self.syso_files,
            ]
            .concat(),
        );

        let imports = self
            .imports
            .into_iter()
            .map(|imp| self.import_map.get(&imp).cloned().unwrap_or(imp))
            .collect();

        let package = Package {
            dir: self.dir,
            go_files,
            other_files,
            errors: self.error.map(|e| vec![e.err]).unwrap_or_default(),
            ..Package::new(self.import_path)
        };
        (package, imports, !self.dep_only)
    }
}

/// Decode a `go list -json` stream into a graph.
pub fn parse_go_list(output: &str) -> Result<PackageGraph, GraphError> {
    let mut graph = PackageGraph::new();
    let mut edges = Vec::new();

    for entry in serde_json::Deserializer::from_str(output).into_iter::<GoListPackage>() {
        let (package, imports, is_root) = entry?.into_package();
        let idx = graph.add(package);
        if is_root {
            graph.add_root(idx);
        }
        edges.push((idx, imports));
    }

    for (from, imports) in edges {
        for imp in imports {
            match graph.find(&imp) {
                Some(to) => graph.link(from, to),
                None => debug!(import = %imp, "import not present in go list output"),
            }
        }
    }

    Ok(graph)
}

/// Loads the import graph with `go list -deps -json`.
pub struct GoListWalker {
    dir: PathBuf,
}

impl GoListWalker {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl GraphWalker for GoListWalker {
    fn load(&self, entry_points: &[String]) -> Result<PackageGraph, GraphError> {
        let command = format!("{} {} {}", GO_COMMAND, GO_LIST_ARGS.join(" "), entry_points.join(" "));
        info!(dir = %self.dir.display(), "{command}");

        let output = Command::new(GO_COMMAND)
            .args(GO_LIST_ARGS)
            .args(entry_points)
            .current_dir(&self.dir)
            .output()
            .map_err(|source| GraphError::Spawn {
                command: command.clone(),
                source,
            })?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        if !output.status.success() && stdout.trim().is_empty() {
            return Err(GraphError::Command {
                command,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let graph = parse_go_list(&stdout)?;
        debug!(packages = graph.len(), "loaded package graph");
        Ok(graph)
    }
}

/// Queries the Go toolchain environment.
pub struct GoEnv;

impl GoEnv {
    /// The runtime root standard-library sources live under.
    pub fn goroot(dir: &Path) -> Result<PathBuf, GraphError> {
        Ok(PathBuf::from(go_env(dir, GO_ENV_GOROOT_ARGS)?))
    }

    /// The `src` directory of every GOPATH entry.
    pub fn gopath_src_dirs(dir: &Path) -> Result<Vec<PathBuf>, GraphError> {
        Ok(parse_gopath(&go_env(dir, GO_ENV_GOPATH_ARGS)?))
    }
}

fn go_env(dir: &Path, args: &[&str]) -> Result<String, GraphError> {
    let command = format!("{} {}", GO_COMMAND, args.join(" "));
    let output = Command::new(GO_COMMAND)
        .args(args)
        .current_dir(dir)
        .output()
        .map_err(|source| GraphError::Spawn {
            command: command.clone(),
            source,
        })?;

    if !output.status.success() {
        return Err(GraphError::Command {
            command,
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }

    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
}

/// Split a GOPATH list (platform path separator) into its `src` directories.
pub fn parse_gopath(gopath: &str) -> Vec<PathBuf> {
    std::env::split_paths(gopath.trim())
        .filter(|p| !p.as_os_str().is_empty())
        .map(|p| p.join("src"))
        .collect()
}
