use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Sentinel written when a license URL or family could not be determined.
pub const UNKNOWN: &str = "Unknown";

/// Written instead of a URL for packages shipped with the Go distribution.
pub const NOT_APPLICABLE: &str = "n/a";

/// A Go package as loaded from the build graph.
#[derive(Debug, Clone, Default)]
pub struct Package {
    pub import_path: String,
    pub dir: Option<PathBuf>,
    pub go_files: Vec<PathBuf>,
    /// Non-Go files (C, assembly, headers, ...) that cannot be inspected for imports.
    pub other_files: Vec<PathBuf>,
    /// Arena indices of direct dependencies.
    pub imports: Vec<usize>,
    pub errors: Vec<String>,
}

impl Package {
    pub fn new(import_path: impl Into<String>) -> Self {
        Self {
            import_path: import_path.into(),
            ..Default::default()
        }
    }

    /// Directory that governs this package's license lookup: the directory of
    /// its first source file, else the package directory reported by `go list`.
    pub fn license_dir(&self) -> Option<&Path> {
        self.go_files
            .first()
            .or_else(|| self.other_files.first())
            .and_then(|f| f.parent())
            .or(self.dir.as_deref())
    }

    pub fn is_empty(&self) -> bool {
        self.go_files.is_empty() && self.other_files.is_empty()
    }
}

/// A set of packages covered by the same license file.
///
/// A library without a license path always holds exactly one package.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Library {
    pub license_path: Option<PathBuf>,
    pub packages: Vec<String>,
}

impl Library {
    pub fn new(license_path: Option<PathBuf>, mut packages: Vec<String>) -> Self {
        packages.sort();
        packages.dedup();
        Self {
            license_path,
            packages,
        }
    }

    /// Longest common slash-delimited prefix of the member import paths.
    pub fn name(&self) -> String {
        common_ancestor(&self.packages)
    }

    /// [`Library::name`] without any `.../vendor/` prefix.
    pub fn unvendored_name(&self) -> String {
        unvendor(&self.name()).to_string()
    }
}

impl fmt::Display for Library {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

fn common_ancestor(paths: &[String]) -> String {
    let mut members = paths.iter();
    let Some(first) = members.next() else {
        return String::new();
    };
    let mut common: Vec<&str> = first.split('/').collect();
    for path in members {
        let shared = common
            .iter()
            .zip(path.split('/'))
            .take_while(|(a, b)| **a == *b)
            .count();
        common.truncate(shared);
    }
    common.join("/")
}

/// Strip everything up to and including the last `vendor/` segment.
pub fn unvendor(import_path: &str) -> &str {
    if let Some(idx) = import_path.rfind("/vendor/") {
        return &import_path[idx + "/vendor/".len()..];
    }
    import_path.strip_prefix("vendor/").unwrap_or(import_path)
}

/// A package left out of the grouping, with the reason why.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct SkippedLibrary {
    pub package_path: String,
    pub reason: SkipReason,
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(tag = "kind", content = "detail", rename_all = "kebab-case")]
pub enum SkipReason {
    StandardLibrary,
    NonAnalyzableFiles(Vec<String>),
    LicenseDiscoveryFailed(String),
}

impl SkipReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            SkipReason::StandardLibrary => "standard-library",
            SkipReason::NonAnalyzableFiles(_) => "non-analyzable-files",
            SkipReason::LicenseDiscoveryFailed(_) => "license-discovery-failed",
        }
    }
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::StandardLibrary => {
                write!(f, "Go standard library that doesn't have any license requirement")
            }
            SkipReason::NonAnalyzableFiles(files) => write!(
                f,
                "Contains non-Go code that can't be inspected for further dependencies: {}",
                files.join(", ")
            ),
            SkipReason::LicenseDiscoveryFailed(err) => write!(f, "Failed to find license: {err}"),
        }
    }
}

/// Where a license file can be browsed. An empty host means no public URL applies.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ProvenanceResult {
    pub host: String,
    pub path: String,
    pub query: Option<String>,
}

impl ProvenanceResult {
    pub fn new(host: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            path: path.into(),
            query: None,
        }
    }

    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.query = Some(query.into());
        self
    }

    pub fn url(&self) -> Option<String> {
        if self.host.is_empty() {
            return None;
        }
        let mut url = format!(
            "https://{}/{}",
            self.host,
            encode_path(self.path.trim_start_matches('/'))
        );
        if let Some(query) = &self.query {
            let pairs: Vec<String> = query
                .split('&')
                .map(|pair| match pair.split_once('=') {
                    Some((key, value)) => format!("{key}={}", encode_path(value)),
                    None => pair.to_string(),
                })
                .collect();
            url.push('?');
            url.push_str(&pairs.join("&"));
        }
        Some(url)
    }
}

/// Percent-encode each `/`-separated segment that holds characters not allowed
/// in a URL path. Segments that are already valid are kept as-is, so `+` and
/// `@` in hosting conventions survive.
fn encode_path(path: &str) -> String {
    path.split('/')
        .map(|segment| {
            if segment.chars().all(is_path_char) {
                segment.to_string()
            } else {
                urlencoding::encode(segment).into_owned()
            }
        })
        .collect::<Vec<_>>()
        .join("/")
}

fn is_path_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || "-._~!$&'()*+,;=:@".contains(c)
}

/// One output row per library.
#[derive(Debug, Clone, Serialize)]
pub struct LibraryReport {
    pub name: String,
    pub license_url: String,
    pub license_name: String,
    pub risk: LicenseRisk,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum LicenseRisk {
    Permissive,
    WeakCopyleft,
    StrongCopyleft,
    Proprietary,
    Unknown,
}

impl fmt::Display for LicenseRisk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LicenseRisk::Permissive => write!(f, "Permissive"),
            LicenseRisk::WeakCopyleft => write!(f, "Weak Copyleft"),
            LicenseRisk::StrongCopyleft => write!(f, "Strong Copyleft"),
            LicenseRisk::Proprietary => write!(f, "Proprietary"),
            LicenseRisk::Unknown => write!(f, "Unknown"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lib(packages: &[&str]) -> Library {
        Library::new(None, packages.iter().map(|p| p.to_string()).collect())
    }

    #[test]
    fn test_name_of_singleton_is_member() {
        assert_eq!(lib(&["github.com/foo/bar/baz"]).name(), "github.com/foo/bar/baz");
    }

    #[test]
    fn test_name_is_common_prefix() {
        let l = lib(&["github.com/foo/bar/x", "github.com/foo/bar/y/z", "github.com/foo/bar"]);
        assert_eq!(l.name(), "github.com/foo/bar");
    }

    #[test]
    fn test_name_stops_at_segment_boundary() {
        let l = lib(&["github.com/foo/barx", "github.com/foo/bary"]);
        assert_eq!(l.name(), "github.com/foo");

        let l = lib(&["a/b", "a/bc"]);
        assert_eq!(l.name(), "a");
    }

    #[test]
    fn test_name_checks_every_member() {
        let l = lib(&["github.com/foo/bar", "github.com/foo/bar-x", "github.com/foo/bar/c"]);
        assert_eq!(l.name(), "github.com/foo");

        let l = lib(&["example.com/m/a/x", "example.com/m/ab", "example.com/m/a"]);
        assert_eq!(l.name(), "example.com/m");
    }

    #[test]
    fn test_name_without_common_prefix() {
        assert_eq!(lib(&["a/x", "b/y"]).name(), "");
    }

    #[test]
    fn test_unvendor() {
        assert_eq!(
            unvendor("example.com/app/vendor/github.com/foo/bar"),
            "github.com/foo/bar"
        );
        assert_eq!(unvendor("vendor/golang.org/x/net"), "golang.org/x/net");
        assert_eq!(unvendor("github.com/foo/bar"), "github.com/foo/bar");
    }

    #[test]
    fn test_provenance_url() {
        let p = ProvenanceResult::new("github.com", "foo/bar/blob/master/LICENSE");
        assert_eq!(
            p.url().as_deref(),
            Some("https://github.com/foo/bar/blob/master/LICENSE")
        );

        let p = ProvenanceResult::new("dev.azure.com", "proj/_git/repo").with_query("path=LICENSE");
        assert_eq!(
            p.url().as_deref(),
            Some("https://dev.azure.com/proj/_git/repo?path=LICENSE")
        );

        assert_eq!(ProvenanceResult::default().url(), None);
    }

    #[test]
    fn test_provenance_url_is_percent_encoded() {
        let p = ProvenanceResult::new("github.com", "foo/bar/blob/master/third party/#1/LICENSE");
        assert_eq!(
            p.url().as_deref(),
            Some("https://github.com/foo/bar/blob/master/third%20party/%231/LICENSE")
        );

        let p = ProvenanceResult::new("go.googlesource.com", "tools/+/refs/heads/master/LICENSE");
        assert_eq!(
            p.url().as_deref(),
            Some("https://go.googlesource.com/tools/+/refs/heads/master/LICENSE")
        );

        let p = ProvenanceResult::new("dev.azure.com", "org/proj/_git/repo").with_query("path=/my docs/LICENSE");
        assert_eq!(
            p.url().as_deref(),
            Some("https://dev.azure.com/org/proj/_git/repo?path=/my%20docs/LICENSE")
        );
    }

    #[test]
    fn test_license_dir() {
        let mut p = Package::new("example.com/a");
        p.dir = Some(PathBuf::from("/src/a"));
        assert!(p.is_empty());
        assert_eq!(p.license_dir(), Some(Path::new("/src/a")));

        p.other_files = vec![PathBuf::from("/src/a/asm/x.s")];
        assert!(!p.is_empty());
        assert_eq!(p.license_dir(), Some(Path::new("/src/a/asm")));

        p.go_files = vec![PathBuf::from("/src/a/a.go")];
        assert_eq!(p.license_dir(), Some(Path::new("/src/a")));
    }

    #[test]
    fn test_skip_reason_strings() {
        assert_eq!(SkipReason::StandardLibrary.as_str(), "standard-library");
        let r = SkipReason::NonAnalyzableFiles(vec!["a.c".into(), "b.s".into()]);
        assert_eq!(r.as_str(), "non-analyzable-files");
        assert!(r.to_string().ends_with("a.c, b.s"));
    }
}
