//! Derives where a library's license file can be browsed online.
//!
//! Two strategies, in order:
//! 1. [`git`]: the Git remotes of the working copy holding the file.
//! 2. [`hosts`]: hosting conventions of the library's import path.
//!
//! Nothing here touches the network.

use std::path::{Component, Path};

use tracing::debug;

use crate::error::ProvenanceError;
use crate::models::{Library, ProvenanceResult};

pub mod git;
pub mod hosts;

pub use git::{GitCli, GitLookup};

/// Caller preferences for [`ProvenanceResolver`].
#[derive(Debug, Clone)]
pub struct ResolveOptions {
    /// Remote names to try, most preferred first.
    pub git_remotes: Vec<String>,
}

impl Default for ResolveOptions {
    fn default() -> Self {
        Self {
            git_remotes: vec!["origin".to_string(), "upstream".to_string()],
        }
    }
}

pub struct ProvenanceResolver {
    options: ResolveOptions,
    git: Box<dyn GitLookup>,
}

impl ProvenanceResolver {
    pub fn new(options: ResolveOptions, git: Box<dyn GitLookup>) -> Self {
        Self { options, git }
    }

    /// URL of the library's license file. `Ok(None)` when the library ships
    /// with Go and has no separate license.
    pub fn resolve(&self, library: &Library) -> Result<Option<String>, ProvenanceError> {
        let license = library
            .license_path
            .as_deref()
            .ok_or_else(|| ProvenanceError::NoLicense {
                library: library.name(),
            })?;
        Ok(self.resolve_file(library, license)?.url())
    }

    /// Location of any file belonging to `library`.
    pub fn resolve_file(&self, library: &Library, file: &Path) -> Result<ProvenanceResult, ProvenanceError> {
        let mut attempts = Vec::new();

        if let Some(root) = self.git.repo_root(file) {
            match self.from_git_remotes(&root, file) {
                Ok(result) => return Ok(result),
                Err(errors) => attempts.extend(errors),
            }
        }

        let name = library.unvendored_name();
        let base = library
            .license_path
            .as_deref()
            .and_then(Path::parent)
            .or_else(|| file.parent())
            .unwrap_or(Path::new(""));
        let rel = relative_slash_path(file, base)?;

        match hosts::resolve_import_path(&name, &rel) {
            Ok(result) => Ok(result),
            Err(err) if attempts.is_empty() => Err(err),
            Err(err) => {
                attempts.push(err.to_string());
                let host = name.split('/').next().unwrap_or_default().to_string();
                Err(ProvenanceError::Unresolved {
                    host,
                    library: name,
                    attempts,
                })
            }
        }
    }

    fn from_git_remotes(&self, root: &Path, file: &Path) -> Result<ProvenanceResult, Vec<String>> {
        let remotes = self.git.remotes(root).map_err(|e| vec![e.to_string()])?;
        let mut errors = Vec::new();

        for name in &self.options.git_remotes {
            let Some(url) = remotes.get(name) else {
                errors.push(ProvenanceError::MissingRemote(name.clone()).to_string());
                continue;
            };
            match git::file_url(root, file, url) {
                Ok(result) => {
                    debug!(remote = %name, file = %file.display(), "resolved through git remote");
                    return Ok(result);
                }
                Err(err) => errors.push(format!("remote {name:?}: {err}")),
            }
        }

        Err(errors)
    }
}

/// `file` relative to `base` as a `/`-separated path. `file` must be inside `base`.
pub(crate) fn relative_slash_path(file: &Path, base: &Path) -> Result<String, ProvenanceError> {
    let outside = || ProvenanceError::OutsideBase {
        file: file.to_path_buf(),
        base: base.to_path_buf(),
    };
    let rel = pathdiff::diff_paths(file, base).ok_or_else(outside)?;

    let mut parts = Vec::new();
    for component in rel.components() {
        match component {
            Component::Normal(part) => parts.push(part.to_string_lossy().into_owned()),
            Component::CurDir => {}
            _ => return Err(outside()),
        }
    }
    Ok(parts.join("/"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::path::PathBuf;

    /// A single fake working copy at `root`.
    struct FakeGit {
        root: Option<PathBuf>,
        remotes: HashMap<String, String>,
    }

    impl FakeGit {
        fn none() -> Box<Self> {
            Box::new(Self {
                root: None,
                remotes: HashMap::new(),
            })
        }

        fn at(root: &str, remotes: &[(&str, &str)]) -> Box<Self> {
            Box::new(Self {
                root: Some(PathBuf::from(root)),
                remotes: remotes
                    .iter()
                    .map(|(n, u)| (n.to_string(), u.to_string()))
                    .collect(),
            })
        }
    }

    impl GitLookup for FakeGit {
        fn repo_root(&self, path: &Path) -> Option<PathBuf> {
            self.root.clone().filter(|r| path.starts_with(r))
        }

        fn remotes(&self, _root: &Path) -> Result<HashMap<String, String>, ProvenanceError> {
            Ok(self.remotes.clone())
        }
    }

    fn library(license: &str, packages: &[&str]) -> Library {
        Library::new(
            Some(PathBuf::from(license)),
            packages.iter().map(|p| p.to_string()).collect(),
        )
    }

    #[test]
    fn test_import_path_when_not_in_git() {
        let resolver = ProvenanceResolver::new(ResolveOptions::default(), FakeGit::none());
        let lib = library(
            "/go/pkg/mod/github.com/foo/bar@v2.1.0/LICENSE",
            &["github.com/foo/bar/v2", "github.com/foo/bar/v2/baz"],
        );
        assert_eq!(
            resolver.resolve(&lib).unwrap().as_deref(),
            Some("https://github.com/foo/bar/blob/master/LICENSE")
        );
    }

    #[test]
    fn test_git_remote_preference_order() {
        let git = FakeGit::at(
            "/work/app",
            &[
                ("origin", "git@github.com:me/app-fork.git"),
                ("upstream", "https://github.com/org/app"),
            ],
        );
        let options = ResolveOptions {
            git_remotes: vec!["upstream".to_string(), "origin".to_string()],
        };
        let resolver = ProvenanceResolver::new(options, git);
        let lib = library("/work/app/vendor/example.org/x/LICENSE", &["example.com/app/vendor/example.org/x"]);

        assert_eq!(
            resolver.resolve(&lib).unwrap().as_deref(),
            Some("https://github.com/org/app/blob/master/vendor/example.org/x/LICENSE")
        );
    }

    #[test]
    fn test_falls_through_to_import_path() {
        let git = FakeGit::at("/work/lib", &[("origin", "https://git.internal.example/lib.git")]);
        let resolver = ProvenanceResolver::new(ResolveOptions::default(), git);
        let lib = library("/work/lib/LICENSE", &["gitlab.com/group/lib"]);

        assert_eq!(
            resolver.resolve(&lib).unwrap().as_deref(),
            Some("https://gitlab.com/group/lib/-/raw/master/LICENSE")
        );
    }

    #[test]
    fn test_both_strategies_fail() {
        let git = FakeGit::at("/work/lib", &[]);
        let resolver = ProvenanceResolver::new(ResolveOptions::default(), git);
        let lib = library("/work/lib/LICENSE", &["example.org/lib"]);

        match resolver.resolve(&lib).unwrap_err() {
            ProvenanceError::Unresolved {
                host,
                library,
                attempts,
            } => {
                assert_eq!(host, "example.org");
                assert_eq!(library, "example.org/lib");
                assert_eq!(attempts.len(), 3);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_unsupported_host_without_git() {
        let resolver = ProvenanceResolver::new(ResolveOptions::default(), FakeGit::none());
        let lib = library("/mod/example.org/lib/LICENSE", &["example.org/lib"]);
        assert!(matches!(
            resolver.resolve(&lib),
            Err(ProvenanceError::UnsupportedHost { host, .. }) if host == "example.org"
        ));
    }

    #[test]
    fn test_unvendored_name_is_used() {
        let resolver = ProvenanceResolver::new(ResolveOptions::default(), FakeGit::none());
        let lib = library(
            "/src/app/vendor/github.com/foo/bar/LICENSE",
            &["example.com/app/vendor/github.com/foo/bar"],
        );
        assert_eq!(
            resolver.resolve(&lib).unwrap().as_deref(),
            Some("https://github.com/foo/bar/blob/master/LICENSE")
        );
    }

    #[test]
    fn test_go_distribution_resolves_to_none() {
        let resolver = ProvenanceResolver::new(ResolveOptions::default(), FakeGit::none());
        let lib = library("/mod/golang.org/x/net@v0.1.0/LICENSE", &["golang.org/x/net/http2"]);
        assert_eq!(resolver.resolve(&lib).unwrap(), None);
    }

    #[test]
    fn test_unlicensed_library_is_error() {
        let resolver = ProvenanceResolver::new(ResolveOptions::default(), FakeGit::none());
        let lib = Library::new(None, vec!["github.com/a/b".to_string()]);
        assert!(matches!(resolver.resolve(&lib), Err(ProvenanceError::NoLicense { .. })));
    }

    #[test]
    fn test_relative_slash_path() {
        assert_eq!(
            relative_slash_path(Path::new("/a/b/c/LICENSE"), Path::new("/a/b")).unwrap(),
            "c/LICENSE"
        );
        assert!(relative_slash_path(Path::new("/x/LICENSE"), Path::new("/a/b")).is_err());
    }
}
