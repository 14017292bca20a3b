//! Report renderers.
//!
//! - [`csv`]: `name,url,license` records plus a separate skipped-packages file.
//! - [`terminal`]: colored tables with a summary box; respects `--verbose` / `--quiet`.
//! - JSON: [`write_json`], one document holding libraries and skipped packages.

use std::io::Write;

use anyhow::Result;
use serde::Serialize;

use crate::models::{LibraryReport, SkippedLibrary};

pub mod csv;
pub mod terminal;

#[derive(Debug, Serialize)]
pub struct Report<'a> {
    pub libraries: &'a [LibraryReport],
    pub skipped: &'a [SkippedLibrary],
}

pub fn write_json<W: Write>(out: &mut W, report: &Report<'_>) -> Result<()> {
    serde_json::to_writer_pretty(&mut *out, report)?;
    writeln!(out)?;
    Ok(())
}
