use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use regex::Regex;
use tracing::trace;

use crate::error::LicenseDiscoveryError;

/// Locates the license file governing a directory.
pub trait LicenseFinder: Sync {
    /// `Ok(None)` means no license file governs `dir`.
    fn find_nearest(&self, dir: &Path) -> Result<Option<PathBuf>, LicenseDiscoveryError>;
}

fn license_file_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(?i)(un)?licen[cs]e([._-].+)?$|^(?i)copying([._-].+)?$")
            .expect("license file pattern is valid")
    })
}

pub fn is_license_file_name(name: &str) -> bool {
    license_file_regex().is_match(name) && !name.ends_with(".go")
}

/// Walks from a package directory towards the filesystem root.
///
/// The walk ends after a directory holding `go.mod` (module root), before a
/// `vendor` directory, and before any of `stop_dirs`.
#[derive(Debug, Clone, Default)]
pub struct FsLicenseFinder {
    stop_dirs: Vec<PathBuf>,
}

impl FsLicenseFinder {
    pub fn new(stop_dirs: Vec<PathBuf>) -> Self {
        Self { stop_dirs }
    }

    fn is_stop_dir(&self, dir: &Path) -> bool {
        dir.file_name().is_some_and(|n| n == "vendor") || self.stop_dirs.iter().any(|s| s == dir)
    }
}

impl LicenseFinder for FsLicenseFinder {
    fn find_nearest(&self, dir: &Path) -> Result<Option<PathBuf>, LicenseDiscoveryError> {
        if !dir.is_absolute() {
            return Err(LicenseDiscoveryError::RelativeDir(dir.to_path_buf()));
        }

        let mut current = Some(dir);
        while let Some(dir) = current {
            if self.is_stop_dir(dir) {
                break;
            }
            trace!(dir = %dir.display(), "looking for license file");

            let entries = std::fs::read_dir(dir).map_err(|source| LicenseDiscoveryError::ReadDir {
                path: dir.to_path_buf(),
                source,
            })?;

            let mut names = Vec::new();
            let mut module_root = false;
            for entry in entries {
                let entry = entry.map_err(|source| LicenseDiscoveryError::ReadDir {
                    path: dir.to_path_buf(),
                    source,
                })?;
                let name = entry.file_name().to_string_lossy().into_owned();
                if !entry.path().is_file() {
                    continue;
                }
                if name == "go.mod" {
                    module_root = true;
                } else if is_license_file_name(&name) {
                    names.push(name);
                }
            }

            names.sort();
            if let Some(name) = names.first() {
                return Ok(Some(dir.join(name)));
            }
            if module_root {
                break;
            }
            current = dir.parent();
        }

        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn touch(path: &Path) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, "x").unwrap();
    }

    #[test]
    fn test_license_file_names() {
        for name in ["LICENSE", "license.txt", "LICENCE.md", "COPYING", "LICENSE-APACHE", "UNLICENSE"] {
            assert!(is_license_file_name(name), "{name}");
        }
        for name in ["README.md", "license.go", "mylicense", "LICENSES"] {
            assert!(!is_license_file_name(name), "{name}");
        }
    }

    #[test]
    fn test_finds_license_in_ancestor() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().join("github.com/foo/bar");
        touch(&root.join("LICENSE"));
        touch(&root.join("pkg/util/util.go"));

        let found = FsLicenseFinder::default()
            .find_nearest(&root.join("pkg/util"))
            .unwrap();
        assert_eq!(found, Some(root.join("LICENSE")));
    }

    #[test]
    fn test_nearest_license_wins() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().join("mono");
        touch(&root.join("LICENSE"));
        touch(&root.join("sub/COPYING"));

        let found = FsLicenseFinder::default().find_nearest(&root.join("sub")).unwrap();
        assert_eq!(found, Some(root.join("sub/COPYING")));
    }

    #[test]
    fn test_stops_at_module_root() {
        let tmp = TempDir::new().unwrap();
        touch(&tmp.path().join("LICENSE"));
        let module = tmp.path().join("module");
        touch(&module.join("go.mod"));
        touch(&module.join("a/a.go"));

        let found = FsLicenseFinder::default().find_nearest(&module.join("a")).unwrap();
        assert_eq!(found, None);
    }

    #[test]
    fn test_stops_before_vendor_and_stop_dirs() {
        let tmp = TempDir::new().unwrap();
        touch(&tmp.path().join("app/LICENSE"));
        let vendored = tmp.path().join("app/vendor/example.org/lib");
        touch(&vendored.join("lib.go"));

        let finder = FsLicenseFinder::default();
        assert_eq!(finder.find_nearest(&vendored).unwrap(), None);

        touch(&tmp.path().join("gopath/LICENSE"));
        let pkg = tmp.path().join("gopath/src/example.org/p");
        touch(&pkg.join("p.go"));
        let finder = FsLicenseFinder::new(vec![tmp.path().join("gopath/src")]);
        assert_eq!(finder.find_nearest(&pkg).unwrap(), None);
    }

    #[test]
    fn test_relative_dir_is_error() {
        let err = FsLicenseFinder::default()
            .find_nearest(Path::new("relative/dir"))
            .unwrap_err();
        assert!(matches!(err, LicenseDiscoveryError::RelativeDir(_)));
    }

    #[test]
    fn test_missing_dir_is_error() {
        let tmp = TempDir::new().unwrap();
        let err = FsLicenseFinder::default()
            .find_nearest(&tmp.path().join("gone"))
            .unwrap_err();
        assert!(matches!(err, LicenseDiscoveryError::ReadDir { .. }));
    }
}
