//! Hosting conventions keyed by the first segment of an import path.

use std::sync::OnceLock;

use regex::Regex;

use crate::error::ProvenanceError;
use crate::models::ProvenanceResult;

const GITHUB: &str = "github.com";
const PKG_GO_DEV: &str = "pkg.go.dev";

const GITHUB_BLOB: &str = "blob/master";
const GITLAB_RAW: &str = "-/raw/master";
const BITBUCKET_SRC: &str = "src/master";
const GITILES_REF: &str = "+/refs/heads/master";

/// An import path split at its host token, plus the license-relative file.
#[derive(Debug, Clone, Copy)]
pub struct Target<'a> {
    /// Full library name, host token included.
    pub name: &'a str,
    /// Everything after the host token.
    pub rest: &'a str,
    /// File path relative to the license file's directory, `/`-separated.
    pub file: &'a str,
}

type Template = fn(&Target<'_>) -> Option<(String, Option<String>)>;

/// How one host token maps onto a browsable location.
pub struct HostRule {
    pub token: &'static str,
    /// Canonical public host. Empty for packages shipped with Go.
    pub host: &'static str,
    template: Template,
}

impl HostRule {
    pub fn apply(&self, target: &Target<'_>) -> Result<ProvenanceResult, ProvenanceError> {
        let (path, query) = (self.template)(target).ok_or_else(|| ProvenanceError::MalformedName {
            library: target.name.to_string(),
        })?;
        Ok(ProvenanceResult {
            host: self.host.to_string(),
            path,
            query,
        })
    }
}

static HOSTS: &[HostRule] = &[
    HostRule { token: "github.com", host: GITHUB, template: github },
    HostRule { token: "gitlab.com", host: "gitlab.com", template: gitlab },
    HostRule { token: "bitbucket.org", host: "bitbucket.org", template: bitbucket },
    HostRule { token: "k8s.io", host: GITHUB, template: kubernetes },
    HostRule { token: "sigs.k8s.io", host: GITHUB, template: kubernetes_sigs },
    HostRule { token: "gomodules.xyz", host: GITHUB, template: gomodules },
    HostRule { token: "go.uber.org", host: GITHUB, template: uber },
    HostRule { token: "go.etcd.io", host: GITHUB, template: etcd },
    HostRule { token: "kubevirt.io", host: GITHUB, template: kubevirt },
    HostRule { token: "code.cloudfoundry.org", host: GITHUB, template: cloudfoundry },
    HostRule { token: "helm.sh", host: GITHUB, template: helm },
    HostRule { token: "software.sslmate.com", host: GITHUB, template: sslmate },
    HostRule { token: "msazure.visualstudio.com", host: "msazure.visualstudio.com", template: visualstudio },
    HostRule { token: "dev.azure.com", host: "dev.azure.com", template: azure_devops },
    HostRule { token: "go.starlark.net", host: GITHUB, template: starlark },
    HostRule { token: "cloud.google.com", host: GITHUB, template: google_cloud },
    HostRule { token: "gopkg.in", host: GITHUB, template: gopkg },
    HostRule { token: "go.opencensus.io", host: PKG_GO_DEV, template: licenses_tab },
    HostRule { token: "contrib.go.opencensus.io", host: PKG_GO_DEV, template: licenses_tab },
    HostRule { token: "golang.zx2c4.com", host: PKG_GO_DEV, template: licenses_tab },
    HostRule { token: "golang.org", host: "", template: distribution },
    HostRule { token: "google.golang.org", host: "", template: distribution },
];

pub fn lookup(token: &str) -> Option<&'static HostRule> {
    HOSTS.iter().find(|r| r.token == token)
}

/// Derive a license location from a library's import path.
///
/// `name` must already be unvendored; `file` is relative to the license
/// file's directory.
pub fn resolve_import_path(name: &str, file: &str) -> Result<ProvenanceResult, ProvenanceError> {
    let (token, rest) = name.split_once('/').unwrap_or((name, ""));
    let rule = lookup(token).ok_or_else(|| ProvenanceError::UnsupportedHost {
        host: token.to_string(),
        library: name.to_string(),
    })?;
    rule.apply(&Target { name, rest, file })
}

/// Location of `file` (relative to the repository root) in a repository
/// `repo` (e.g. `owner/project`) hosted on `host`.
pub fn repository_file(host: &str, repo: &str, file: &str) -> Result<ProvenanceResult, ProvenanceError> {
    let repo = repo.trim_matches('/').trim_end_matches(".git");
    let browse = match host {
        GITHUB => GITHUB_BLOB,
        "gitlab.com" => GITLAB_RAW,
        "bitbucket.org" => BITBUCKET_SRC,
        h if h.ends_with(".googlesource.com") => GITILES_REF,
        "dev.azure.com" => {
            return Ok(ProvenanceResult::new(host, repo).with_query(format!("path=/{file}")));
        }
        h if h.ends_with(".visualstudio.com") => {
            return Ok(ProvenanceResult::new(host, repo).with_query(format!("path=/{file}")));
        }
        _ => return Err(ProvenanceError::UnsupportedGitHost(host.to_string())),
    };
    Ok(ProvenanceResult::new(host, join(&[repo, browse, file])))
}

/// Join path segments, dropping empty and `.` components.
fn join(parts: &[&str]) -> String {
    parts
        .iter()
        .flat_map(|p| p.split('/'))
        .filter(|s| !s.is_empty() && *s != ".")
        .collect::<Vec<_>>()
        .join("/")
}

/// Drop a trailing major-version element (`/v2`, or a bare `v3`).
pub fn strip_major_version(input: &str) -> &str {
    static SUFFIX: OnceLock<Regex> = OnceLock::new();
    static WHOLE: OnceLock<Regex> = OnceLock::new();
    let suffix = SUFFIX.get_or_init(|| Regex::new(r"/v\d+$").expect("valid pattern"));
    let whole = WHOLE.get_or_init(|| Regex::new(r"^v\d+$").expect("valid pattern"));

    let input = match suffix.find(input) {
        Some(m) => &input[..m.start()],
        None => input,
    };
    if whole.is_match(input) {
        ""
    } else {
        input
    }
}

fn non_empty(s: Option<&str>) -> Option<&str> {
    s.filter(|s| !s.is_empty())
}

/// `<owner>/<project>/<browse>/<subpath>/<file>` on the hosting site itself.
fn owner_project(t: &Target<'_>, browse: &str, keep_subpath: bool) -> Option<(String, Option<String>)> {
    let mut parts = t.rest.splitn(3, '/');
    let owner = non_empty(parts.next())?;
    let project = non_empty(parts.next())?;
    let subpath = parts.next().unwrap_or("");

    let prefix = if keep_subpath {
        strip_major_version(&join(&[browse, subpath])).to_string()
    } else {
        browse.to_string()
    };
    Some((join(&[owner, project, &prefix, t.file]), None))
}

/// Vanity domain whose projects live under one GitHub organisation.
fn vanity(t: &Target<'_>, org: &str, keep_subpath: bool) -> Option<(String, Option<String>)> {
    let (project, subpath) = t.rest.split_once('/').unwrap_or((t.rest, ""));
    let project = non_empty(Some(project))?;
    let subpath = if keep_subpath {
        strip_major_version(subpath)
    } else {
        ""
    };
    Some((join(&[org, project, GITHUB_BLOB, subpath, t.file]), None))
}

fn github(t: &Target<'_>) -> Option<(String, Option<String>)> {
    owner_project(t, GITHUB_BLOB, true)
}

fn gitlab(t: &Target<'_>) -> Option<(String, Option<String>)> {
    owner_project(t, GITLAB_RAW, false)
}

fn bitbucket(t: &Target<'_>) -> Option<(String, Option<String>)> {
    owner_project(t, BITBUCKET_SRC, true)
}

fn kubernetes(t: &Target<'_>) -> Option<(String, Option<String>)> {
    vanity(t, "kubernetes", true)
}

fn kubernetes_sigs(t: &Target<'_>) -> Option<(String, Option<String>)> {
    vanity(t, "kubernetes-sigs", true)
}

fn gomodules(t: &Target<'_>) -> Option<(String, Option<String>)> {
    vanity(t, "gomodules", true)
}

fn uber(t: &Target<'_>) -> Option<(String, Option<String>)> {
    vanity(t, "uber-go", true)
}

fn etcd(t: &Target<'_>) -> Option<(String, Option<String>)> {
    vanity(t, "etcd-io", true)
}

fn kubevirt(t: &Target<'_>) -> Option<(String, Option<String>)> {
    vanity(t, "kubevirt", false)
}

fn cloudfoundry(t: &Target<'_>) -> Option<(String, Option<String>)> {
    vanity(t, "cloudfoundry", false)
}

fn helm(t: &Target<'_>) -> Option<(String, Option<String>)> {
    vanity(t, "helm", false)
}

/// `software.sslmate.com/src/<project>/<subpath>`
fn sslmate(t: &Target<'_>) -> Option<(String, Option<String>)> {
    let mut parts = t.rest.splitn(3, '/');
    parts.next()?;
    let project = non_empty(parts.next())?;
    let subpath = strip_major_version(parts.next().unwrap_or(""));
    Some((join(&["SSLMate", project, GITHUB_BLOB, subpath, t.file]), None))
}

/// Azure repository `<repo>` (optionally `_git/<repo>` or `<repo>.git`);
/// defaults to the project's own repository.
fn azure_repo<'a>(project: &'a str, repo: Option<&'a str>) -> &'a str {
    let repo = repo.unwrap_or("");
    let repo = repo.strip_prefix("_git/").unwrap_or(repo);
    let repo = strip_major_version(repo).trim_end_matches(".git");
    if repo.is_empty() {
        project
    } else {
        repo
    }
}

/// `msazure.visualstudio.com/<collection>/<project>/<repo>`
fn visualstudio(t: &Target<'_>) -> Option<(String, Option<String>)> {
    let mut parts = t.rest.splitn(3, '/');
    non_empty(parts.next())?;
    let project = non_empty(parts.next())?;
    let repo = azure_repo(project, parts.next());
    Some((join(&[project, "_git", repo]), Some(format!("path=/{}", t.file))))
}

/// `dev.azure.com/<org>/<project>/<repo>`
fn azure_devops(t: &Target<'_>) -> Option<(String, Option<String>)> {
    let mut parts = t.rest.splitn(3, '/');
    let org = non_empty(parts.next())?;
    let project = non_empty(parts.next())?;
    let repo = azure_repo(project, parts.next());
    Some((join(&[org, project, "_git", repo]), Some(format!("path=/{}", t.file))))
}

fn starlark(_: &Target<'_>) -> Option<(String, Option<String>)> {
    Some(("google/starlark-go/blob/master/LICENSE".to_string(), None))
}

fn google_cloud(_: &Target<'_>) -> Option<(String, Option<String>)> {
    Some(("googleapis/google-cloud-go/blob/master/LICENSE".to_string(), None))
}

/// gopkg.in redirects to many repositories; its own license covers the service.
fn gopkg(_: &Target<'_>) -> Option<(String, Option<String>)> {
    Some(("niemeyer/gopkg/blob/master/LICENSE".to_string(), None))
}

fn licenses_tab(t: &Target<'_>) -> Option<(String, Option<String>)> {
    Some((t.name.to_string(), Some("tab=licenses".to_string())))
}

fn distribution(_: &Target<'_>) -> Option<(String, Option<String>)> {
    Some((String::new(), None))
}
