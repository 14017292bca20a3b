//! License discovery and identification.
//!
//! - [`finder`]: locates the license file governing a package directory.
//! - [`classifier`]: identifies the license family of a license file and
//!   maps it to a [`LicenseRisk`](crate::models::LicenseRisk).
//! - [`spdx`]: SPDX identifier to risk table.

pub mod classifier;
pub mod finder;
pub mod spdx;

pub use classifier::{LicenseClassifier, SignatureClassifier};
pub use finder::{FsLicenseFinder, LicenseFinder};
