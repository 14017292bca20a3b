use std::collections::HashMap;

use anyhow::Result;
use colored::*;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Attribute, Cell, Color, ContentArrangement, Table};

use crate::models::{LibraryReport, LicenseRisk, SkippedLibrary};

/// Render a colored terminal report.
pub fn render(reports: &[LibraryReport], skipped: &[SkippedLibrary], verbose: bool, quiet: bool) -> Result<()> {
    let count = |risk: LicenseRisk| reports.iter().filter(|r| r.risk == risk).count();
    let permissive = count(LicenseRisk::Permissive);
    let weak = count(LicenseRisk::WeakCopyleft);
    let strong = count(LicenseRisk::StrongCopyleft);
    let unknown = count(LicenseRisk::Unknown) + count(LicenseRisk::Proprietary);

    if quiet {
        println!(
            "Libraries: {}  Permissive: {}  Copyleft: {}  Unknown: {}  Skipped: {}",
            reports.len(),
            permissive.to_string().green(),
            (weak + strong).to_string().yellow(),
            unknown.to_string().red(),
            skipped.len(),
        );
        return Ok(());
    }

    println!("\n {} v{}\n", "go-license-checkr".bold(), env!("CARGO_PKG_VERSION"));

    println!(" ┌────────────────────────────────────────────────────┐");
    println!(" │  {:<48} │", "SUMMARY".bold());
    println!(" │  {:<48} │", format!("Libraries        : {}", reports.len()));
    println!(
        " │  {:<48} │",
        format!("{}  Permissive    : {:>4}  {}", "✓".green(), permissive, top_licenses(reports, LicenseRisk::Permissive))
    );
    println!(
        " │  {:<48} │",
        format!("{}  Weak copyleft : {:>4}  {}", "⚠".yellow(), weak, top_licenses(reports, LicenseRisk::WeakCopyleft))
    );
    println!(
        " │  {:<48} │",
        format!("{}  Strong copyleft:{:>4}  {}", "✗".red(), strong, top_licenses(reports, LicenseRisk::StrongCopyleft))
    );
    println!(" │  {:<48} │", format!("?  Unknown       : {:>4}", unknown));
    println!(" │  {:<48} │", format!("   Skipped pkgs  : {:>4}", skipped.len()));
    println!(" └────────────────────────────────────────────────────┘\n");

    println!(" {} Libraries:\n", "[LICENSES]".cyan().bold());
    println!("{}", libraries_table(reports));
    println!();

    if verbose && !skipped.is_empty() {
        println!(" {} Skipped packages:\n", "[SKIPPED]".dimmed().bold());
        println!("{}", skipped_table(skipped));
        println!();
    }

    Ok(())
}

fn header(titles: &[&str]) -> Vec<Cell> {
    titles
        .iter()
        .map(|t| Cell::new(t).add_attribute(Attribute::Bold))
        .collect()
}

pub fn libraries_table(reports: &[LibraryReport]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header(&["Library", "License URL", "License", "Risk"]));

    for r in reports {
        let risk_color = match r.risk {
            LicenseRisk::Permissive => Color::Green,
            LicenseRisk::WeakCopyleft => Color::Yellow,
            LicenseRisk::StrongCopyleft => Color::Red,
            LicenseRisk::Proprietary => Color::Magenta,
            LicenseRisk::Unknown => Color::DarkGrey,
        };
        table.add_row(vec![
            Cell::new(&r.name),
            Cell::new(&r.license_url),
            Cell::new(&r.license_name),
            Cell::new(r.risk.to_string()).fg(risk_color),
        ]);
    }
    table
}

pub fn skipped_table(skipped: &[SkippedLibrary]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header(&["Package", "Reason"]));

    for s in skipped {
        table.add_row(vec![Cell::new(&s.package_path), Cell::new(s.reason.as_str())]);
    }
    table
}

/// Up to three most frequent license names in a risk class, e.g. `[MIT (4), ISC (1)]`.
fn top_licenses(reports: &[LibraryReport], risk: LicenseRisk) -> String {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for r in reports.iter().filter(|r| r.risk == risk) {
        *counts.entry(r.license_name.as_str()).or_insert(0) += 1;
    }

    let mut pairs: Vec<(&str, usize)> = counts.into_iter().collect();
    pairs.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(b.0)));

    let summary: Vec<String> = pairs
        .iter()
        .take(3)
        .map(|(lic, cnt)| format!("{lic} ({cnt})"))
        .collect();

    if summary.is_empty() {
        String::new()
    } else {
        format!("[{}]", summary.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SkipReason;

    fn report(name: &str, license: &str, risk: LicenseRisk) -> LibraryReport {
        LibraryReport {
            name: name.to_string(),
            license_url: "Unknown".to_string(),
            license_name: license.to_string(),
            risk,
        }
    }

    #[test]
    fn test_top_licenses() {
        let reports = vec![
            report("a", "MIT", LicenseRisk::Permissive),
            report("b", "MIT", LicenseRisk::Permissive),
            report("c", "ISC", LicenseRisk::Permissive),
            report("d", "Apache-2.0", LicenseRisk::Permissive),
            report("e", "BSD-3-Clause", LicenseRisk::Permissive),
            report("f", "GPL-3.0", LicenseRisk::StrongCopyleft),
        ];
        assert_eq!(
            top_licenses(&reports, LicenseRisk::Permissive),
            "[MIT (2), Apache-2.0 (1), BSD-3-Clause (1)]"
        );
        assert_eq!(top_licenses(&reports, LicenseRisk::WeakCopyleft), "");
    }

    #[test]
    fn test_tables_have_one_row_per_entry() {
        let reports = vec![report("a", "MIT", LicenseRisk::Permissive)];
        assert_eq!(libraries_table(&reports).row_iter().count(), 1);

        let skipped = vec![SkippedLibrary {
            package_path: "fmt".to_string(),
            reason: SkipReason::StandardLibrary,
        }];
        let rendered = skipped_table(&skipped).to_string();
        assert!(rendered.contains("standard-library"));
    }
}
