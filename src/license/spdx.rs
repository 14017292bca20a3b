use crate::models::LicenseRisk;

/// Risk level of a single SPDX identifier. `-only` / `-or-later` variants
/// share the risk of their base identifier.
pub fn classify_spdx_id(id: &str) -> LicenseRisk {
    let id = id.trim();
    let base = id
        .strip_suffix("-only")
        .or_else(|| id.strip_suffix("-or-later"))
        .unwrap_or(id);

    match base {
        "MIT" | "MIT-0" | "ISC" | "0BSD" | "BSD-2-Clause" | "BSD-3-Clause" | "Apache-2.0"
        | "Zlib" | "Unlicense" | "CC0-1.0" | "BlueOak-1.0.0" => LicenseRisk::Permissive,

        "MPL-2.0" | "EPL-1.0" | "EPL-2.0" | "LGPL-2.0" | "LGPL-2.1" | "LGPL-3.0" | "CDDL-1.0" => {
            LicenseRisk::WeakCopyleft
        }

        "GPL-2.0" | "GPL-3.0" | "AGPL-3.0" => LicenseRisk::StrongCopyleft,

        _ => LicenseRisk::Unknown,
    }
}
