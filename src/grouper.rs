//! Groups the packages of an import graph into libraries sharing a license file.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use rayon::prelude::*;
use tracing::{debug, warn};

use crate::error::GraphError;
use crate::graph::PackageGraph;
use crate::license::LicenseFinder;
use crate::models::{Library, SkipReason, SkippedLibrary};

/// Result of [`group`], sorted for stable output.
#[derive(Debug, Default)]
pub struct Grouping {
    pub libraries: Vec<Library>,
    pub skipped: Vec<SkippedLibrary>,
}

/// Walk `graph` and group every reachable, non-standard package by the
/// license file governing its directory.
///
/// Any package load error fails the whole run. License lookups run in
/// parallel on the current rayon pool.
pub fn group(
    graph: &PackageGraph,
    finder: &dyn LicenseFinder,
    goroot: &Path,
) -> Result<Grouping, GraphError> {
    let mut errors = Vec::new();
    let mut skipped = Vec::new();
    let mut candidates: Vec<(String, PathBuf)> = Vec::new();

    graph.visit(|pkg| {
        if !pkg.errors.is_empty() {
            errors.extend(
                pkg.errors
                    .iter()
                    .map(|e| (pkg.import_path.clone(), e.clone())),
            );
            return true;
        }
        if is_std_lib(&pkg.go_files, goroot) {
            skipped.push(SkippedLibrary {
                package_path: pkg.import_path.clone(),
                reason: SkipReason::StandardLibrary,
            });
            return true;
        }
        if pkg.is_empty() {
            debug!(package = %pkg.import_path, "empty package");
            return true;
        }
        if !pkg.other_files.is_empty() {
            let files = pkg
                .other_files
                .iter()
                .map(|f| f.display().to_string())
                .collect();
            skipped.push(SkippedLibrary {
                package_path: pkg.import_path.clone(),
                reason: SkipReason::NonAnalyzableFiles(files),
            });
        }
        if let Some(dir) = pkg.license_dir() {
            candidates.push((pkg.import_path.clone(), dir.to_path_buf()));
        }
        true
    });

    if !errors.is_empty() {
        return Err(GraphError::Packages {
            roots: graph.roots().map(|p| p.import_path.clone()).collect(),
            errors,
        });
    }

    let lookups: Vec<_> = candidates
        .par_iter()
        .map(|(path, dir)| (path, finder.find_nearest(dir)))
        .collect();

    let mut by_license: BTreeMap<Option<PathBuf>, Vec<String>> = BTreeMap::new();
    for (path, lookup) in lookups {
        let license = match lookup {
            Ok(license) => license,
            Err(err) => {
                warn!(package = %path, "failed to find license: {err}");
                skipped.push(SkippedLibrary {
                    package_path: path.clone(),
                    reason: SkipReason::LicenseDiscoveryFailed(err.to_string()),
                });
                None
            }
        };
        by_license.entry(license).or_default().push(path.clone());
    }

    let mut libraries = Vec::new();
    for (license, packages) in by_license {
        match license {
            // Unlicensed packages are never merged.
            None => libraries.extend(packages.into_iter().map(|p| Library::new(None, vec![p]))),
            Some(path) => libraries.push(Library::new(Some(path), packages)),
        }
    }

    libraries.sort_by_cached_key(|l| (l.name(), l.license_path.clone()));
    skipped.sort();

    debug!(
        libraries = libraries.len(),
        skipped = skipped.len(),
        "grouped packages"
    );
    Ok(Grouping { libraries, skipped })
}

fn is_std_lib(go_files: &[PathBuf], goroot: &Path) -> bool {
    !goroot.as_os_str().is_empty() && go_files.first().is_some_and(|f| f.starts_with(goroot))
}
