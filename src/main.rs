//! `go-license-checkr`: group the packages of a Go build into libraries by the
//! license file that governs them, and report where each license can be read.
//!
//! # Flow
//! 1. Parse CLI arguments ([`cli`]) and initialise logging ([`logging`]).
//! 2. Load config ([`config::load_config`]) and apply CLI overrides.
//! 3. Load the import graph with `go list` ([`graph`]). Failures abort.
//! 4. Group packages by license file ([`grouper`]).
//! 5. Resolve license URLs ([`provenance`]) and identify licenses ([`license`])
//!    for every library in parallel.
//! 6. Render the requested report ([`report`]).

mod cli;
mod config;
mod error;
mod graph;
mod grouper;
mod license;
mod logging;
mod models;
mod provenance;
mod report;

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use tracing::{info, warn};

use cli::{Cli, ReportFormat};
use config::load_config;
use graph::{GoEnv, GoListWalker, GraphWalker};
use license::classifier::classify;
use license::{FsLicenseFinder, LicenseClassifier, SignatureClassifier};
use logging::Verbosity;
use models::{Library, LibraryReport, LicenseRisk, NOT_APPLICABLE, UNKNOWN};
use provenance::{GitCli, ProvenanceResolver, ResolveOptions};
use report::Report;

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(Verbosity::from_flags(cli.verbose, cli.quiet));

    let dir = cli.dir.canonicalize().unwrap_or_else(|_| cli.dir.clone());

    let config = load_config(&dir, cli.config.as_deref())?.with_overrides(
        cli.git_remotes.clone(),
        cli.confidence_threshold,
        cli.jobs,
    );
    config.validate()?;

    let goroot = match &config.goroot {
        Some(goroot) => goroot.clone(),
        None => GoEnv::goroot(&dir).context("locating GOROOT")?,
    };
    info!(goroot = %goroot.display(), "using Go runtime root");

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(config.jobs.unwrap_or(0))
        .build()
        .context("building worker pool")?;

    let graph = GoListWalker::new(&dir)
        .load(&cli.packages)
        .context("loading package graph")?;

    let gopath_src = GoEnv::gopath_src_dirs(&dir).unwrap_or_else(|err| {
        warn!("could not read GOPATH, license lookups may climb past it: {err}");
        Vec::new()
    });
    let finder = FsLicenseFinder::new(license_stop_dirs(&config.stop_dirs, &goroot, gopath_src));
    let grouping = pool.install(|| grouper::group(&graph, &finder, &goroot))?;

    let resolver = ProvenanceResolver::new(
        ResolveOptions {
            git_remotes: config.git_remotes.clone(),
        },
        Box::new(GitCli),
    );
    let classifier = SignatureClassifier::new(config.confidence_threshold);

    let pb = progress_bar(grouping.libraries.len() as u64, cli.quiet)?;
    let mut reports: Vec<LibraryReport> = pool.install(|| {
        grouping
            .libraries
            .par_iter()
            .map(|lib| {
                let report = library_report(lib, &resolver, &classifier);
                pb.inc(1);
                report
            })
            .collect()
    });
    pb.finish_and_clear();

    reports.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.license_url.cmp(&b.license_url)));

    match cli.report {
        ReportFormat::Csv => {
            let mut out = open_output(cli.output.as_deref())?;
            report::csv::write_libraries(&mut out, &reports).context("writing library report")?;
            let written = match &cli.skipped_libs_path {
                Some(path) => {
                    let mut out = open_output(Some(path))?;
                    report::csv::write_skipped(&mut out, &grouping.skipped)
                }
                None => report::csv::write_skipped(&mut io::stderr().lock(), &grouping.skipped),
            };
            written.context("writing skipped packages")?;
        }
        ReportFormat::Terminal => {
            if cli.output.is_some() {
                warn!("--output is ignored for the terminal report");
            }
            report::terminal::render(&reports, &grouping.skipped, cli.verbose > 0, cli.quiet)?;
        }
        ReportFormat::Json => {
            let mut out = open_output(cli.output.as_deref())?;
            report::write_json(
                &mut out,
                &Report {
                    libraries: &reports,
                    skipped: &grouping.skipped,
                },
            )
            .context("writing JSON report")?;
        }
    }

    eprintln!(
        "Processed {} libraries. Skipped {} packages.",
        reports.len(),
        grouping.skipped.len()
    );
    Ok(())
}

/// Resolve and classify one library. Failures are logged and reported as `Unknown`.
fn library_report(
    lib: &Library,
    resolver: &ProvenanceResolver,
    classifier: &dyn LicenseClassifier,
) -> LibraryReport {
    let name = lib.unvendored_name();
    let Some(license_path) = lib.license_path.as_deref() else {
        warn!(library = %name, "no license file found");
        return LibraryReport {
            name,
            license_url: UNKNOWN.to_string(),
            license_name: UNKNOWN.to_string(),
            risk: LicenseRisk::Unknown,
        };
    };

    let license_url = match resolver.resolve(lib) {
        Ok(Some(url)) => url,
        Ok(None) => NOT_APPLICABLE.to_string(),
        Err(err) => {
            warn!(library = %name, "could not derive license URL: {err}");
            UNKNOWN.to_string()
        }
    };

    let license_name = match classifier.identify(license_path) {
        Ok(id) => id.name,
        Err(err) => {
            warn!(library = %name, "could not identify license: {err}");
            UNKNOWN.to_string()
        }
    };

    LibraryReport {
        risk: classify(&license_name),
        name,
        license_url,
        license_name,
    }
}

/// Directories license discovery never climbs into: configured ones, GOROOT
/// and every GOPATH `src` directory.
fn license_stop_dirs(configured: &[PathBuf], goroot: &Path, gopath_src: Vec<PathBuf>) -> Vec<PathBuf> {
    let mut dirs = configured.to_vec();
    if !goroot.as_os_str().is_empty() {
        dirs.push(goroot.to_path_buf());
    }
    dirs.extend(gopath_src);
    dirs.sort();
    dirs.dedup();
    dirs
}

fn open_output(path: Option<&Path>) -> Result<Box<dyn Write>> {
    Ok(match path {
        Some(path) => Box::new(BufWriter::new(
            File::create(path).with_context(|| format!("creating {}", path.display()))?,
        )),
        None => Box::new(io::stdout().lock()),
    })
}

fn progress_bar(len: u64, quiet: bool) -> Result<ProgressBar> {
    if quiet {
        return Ok(ProgressBar::hidden());
    }
    let pb = ProgressBar::new(len);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")?
            .progress_chars("#>-"),
    );
    Ok(pb)
}
