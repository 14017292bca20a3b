use std::io::{self, Write};

use crate::models::{LibraryReport, SkippedLibrary};

/// Quote a field when it contains a separator, quote or line break.
pub fn escape_field(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

fn write_record<W: Write>(out: &mut W, fields: &[&str]) -> io::Result<()> {
    let line = fields
        .iter()
        .map(|f| escape_field(f))
        .collect::<Vec<_>>()
        .join(",");
    writeln!(out, "{line}")
}

/// One `name,url,license` record per library, no header.
pub fn write_libraries<W: Write>(out: &mut W, reports: &[LibraryReport]) -> io::Result<()> {
    for r in reports {
        write_record(out, &[&r.name, &r.license_url, &r.license_name])?;
    }
    out.flush()
}

/// One `package,reason` record per skipped package.
pub fn write_skipped<W: Write>(out: &mut W, skipped: &[SkippedLibrary]) -> io::Result<()> {
    for s in skipped {
        write_record(out, &[&s.package_path, &s.reason.to_string()])?;
    }
    out.flush()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{LicenseRisk, SkipReason};
    use pretty_assertions::assert_eq;

    fn report(name: &str, url: &str, license: &str) -> LibraryReport {
        LibraryReport {
            name: name.to_string(),
            license_url: url.to_string(),
            license_name: license.to_string(),
            risk: LicenseRisk::Unknown,
        }
    }

    #[test]
    fn test_escape_field() {
        assert_eq!(escape_field("MIT"), "MIT");
        assert_eq!(escape_field("a,b"), "\"a,b\"");
        assert_eq!(escape_field("say \"hi\""), "\"say \"\"hi\"\"\"");
        assert_eq!(escape_field("two\nlines"), "\"two\nlines\"");
    }

    #[test]
    fn test_write_libraries() {
        let mut out = Vec::new();
        write_libraries(
            &mut out,
            &[
                report("github.com/foo/bar", "https://github.com/foo/bar/blob/master/LICENSE", "MIT"),
                report("b/z", "Unknown", "Unknown"),
            ],
        )
        .unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "github.com/foo/bar,https://github.com/foo/bar/blob/master/LICENSE,MIT\nb/z,Unknown,Unknown\n"
        );
    }

    #[test]
    fn test_write_skipped_quotes_reason() {
        let mut out = Vec::new();
        write_skipped(
            &mut out,
            &[
                SkippedLibrary {
                    package_path: "fmt".to_string(),
                    reason: SkipReason::StandardLibrary,
                },
                SkippedLibrary {
                    package_path: "example.com/cgo".to_string(),
                    reason: SkipReason::NonAnalyzableFiles(vec!["a.c".to_string(), "b.h".to_string()]),
                },
            ],
        )
        .unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "fmt,Go standard library that doesn't have any license requirement\n\
             example.com/cgo,\"Contains non-Go code that can't be inspected for further dependencies: a.c, b.h\"\n"
        );
    }
}
