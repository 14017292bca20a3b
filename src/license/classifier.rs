use std::path::Path;

use tracing::debug;

use crate::error::ClassificationError;
use crate::license::spdx::classify_spdx_id;
use crate::models::LicenseRisk;

/// A license family recognised in a license file.
#[derive(Debug, Clone, PartialEq)]
pub struct Identification {
    /// SPDX identifier of the family.
    pub name: String,
    /// Fraction of the family's signature found in the file, `0.0..=1.0`.
    pub confidence: f64,
}

/// Identifies the license family of a license file.
pub trait LicenseClassifier: Sync {
    fn identify(&self, license_path: &Path) -> Result<Identification, ClassificationError>;
}

/// Phrases that together identify a license text.
struct Signature {
    spdx: &'static str,
    phrases: &'static [&'static str],
}

const SIGNATURES: &[Signature] = &[
    Signature {
        spdx: "MIT",
        phrases: &[
            "permission is hereby granted free of charge to any person obtaining a copy",
            "the above copyright notice and this permission notice shall be included in all copies or substantial portions of the software",
            "the software is provided as is without warranty of any kind",
        ],
    },
    Signature {
        spdx: "ISC",
        phrases: &[
            "permission to use copy modify and or distribute this software for any purpose with or without fee is hereby granted",
            "the software is provided as is and the author disclaims all warranties",
        ],
    },
    Signature {
        spdx: "BSD-2-Clause",
        phrases: &[
            "redistribution and use in source and binary forms with or without modification are permitted provided that the following conditions are met",
            "redistributions of source code must retain the above copyright notice",
            "redistributions in binary form must reproduce the above copyright notice",
        ],
    },
    Signature {
        spdx: "BSD-3-Clause",
        phrases: &[
            "redistribution and use in source and binary forms with or without modification are permitted provided that the following conditions are met",
            "redistributions of source code must retain the above copyright notice",
            "redistributions in binary form must reproduce the above copyright notice",
            "may be used to endorse or promote products derived from this software without specific prior written permission",
        ],
    },
    Signature {
        spdx: "Apache-2.0",
        phrases: &[
            "apache license",
            "version 2 0 january 2004",
            "terms and conditions for use reproduction and distribution",
            "grant of copyright license",
            "grant of patent license",
        ],
    },
    Signature {
        spdx: "MPL-2.0",
        phrases: &[
            "mozilla public license version 2 0",
            "covered software",
            "executable form",
            "larger work",
        ],
    },
    Signature {
        spdx: "GPL-2.0",
        phrases: &[
            "gnu general public license",
            "version 2 june 1991",
            "the licenses for most software are designed to take away your freedom to share and change it",
        ],
    },
    Signature {
        spdx: "GPL-3.0",
        phrases: &[
            "gnu general public license",
            "version 3 29 june 2007",
            "the gnu general public license is a free copyleft license for software and other kinds of works",
        ],
    },
    Signature {
        spdx: "LGPL-2.1",
        phrases: &[
            "gnu lesser general public license",
            "version 2 1 february 1999",
        ],
    },
    Signature {
        spdx: "LGPL-3.0",
        phrases: &[
            "gnu lesser general public license",
            "version 3 29 june 2007",
            "this version of the gnu lesser general public license incorporates the terms and conditions of version 3 of the gnu general public license",
        ],
    },
    Signature {
        spdx: "AGPL-3.0",
        phrases: &[
            "gnu affero general public license",
            "version 3 19 november 2007",
        ],
    },
    Signature {
        spdx: "EPL-2.0",
        phrases: &["eclipse public license v 2 0", "commercial contributor"],
    },
    Signature {
        spdx: "Zlib",
        phrases: &[
            "this software is provided as is without any express or implied warranty",
            "in no event will the authors be held liable for any damages arising from the use of this software",
            "altered source versions must be plainly marked as such",
        ],
    },
    Signature {
        spdx: "Unlicense",
        phrases: &[
            "this is free and unencumbered software released into the public domain",
            "anyone is free to copy modify publish use compile sell or distribute this software",
        ],
    },
    Signature {
        spdx: "CC0-1.0",
        phrases: &["creative commons", "cc0 1 0 universal", "statement of purpose"],
    },
];

/// Lowercase, turn punctuation into spaces and collapse whitespace.
fn normalize_text(text: &str) -> String {
    let mapped: String = text
        .chars()
        .map(|c| if c.is_alphanumeric() { c.to_ascii_lowercase() } else { ' ' })
        .collect();
    mapped.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Scores license texts against known phrase signatures.
#[derive(Debug, Clone)]
pub struct SignatureClassifier {
    threshold: f64,
}

impl SignatureClassifier {
    pub fn new(threshold: f64) -> Self {
        Self { threshold }
    }

    /// Best matching family for an already loaded text, regardless of threshold.
    pub fn best_match(&self, text: &str) -> Option<Identification> {
        let text = normalize_text(text);
        let mut best: Option<(usize, Identification)> = None;

        for sig in SIGNATURES {
            let matched = sig
                .phrases
                .iter()
                .filter(|p| text.contains(normalize_text(p).as_str()))
                .count();
            if matched == 0 {
                continue;
            }
            let confidence = matched as f64 / sig.phrases.len() as f64;
            let better = match &best {
                None => true,
                Some((best_matched, b)) => {
                    confidence > b.confidence || (confidence == b.confidence && matched > *best_matched)
                }
            };
            if better {
                best = Some((
                    matched,
                    Identification {
                        name: sig.spdx.to_string(),
                        confidence,
                    },
                ));
            }
        }

        best.map(|(_, id)| id)
    }
}

impl Default for SignatureClassifier {
    fn default() -> Self {
        Self::new(0.9)
    }
}

impl LicenseClassifier for SignatureClassifier {
    fn identify(&self, license_path: &Path) -> Result<Identification, ClassificationError> {
        let content = std::fs::read(license_path).map_err(|source| ClassificationError::Read {
            path: license_path.to_path_buf(),
            source,
        })?;
        let text = String::from_utf8_lossy(&content);

        let best = self.best_match(&text);
        debug!(path = %license_path.display(), ?best, "classified license");

        match best {
            Some(id) if id.confidence >= self.threshold => Ok(id),
            other => {
                let (best, confidence) = other
                    .map(|id| (id.name, id.confidence))
                    .unwrap_or_else(|| ("none".to_string(), 0.0));
                Err(ClassificationError::BelowThreshold {
                    path: license_path.to_path_buf(),
                    best,
                    confidence,
                })
            }
        }
    }
}

/// Risk level of an identified license family.
pub fn classify(license: &str) -> LicenseRisk {
    let trimmed = license.trim();
    if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("unknown") {
        return LicenseRisk::Unknown;
    }
    let lower = trimmed.to_lowercase();
    if lower.contains("proprietary") || lower.contains("commercial") {
        return LicenseRisk::Proprietary;
    }
    classify_spdx_id(trimmed)
}
