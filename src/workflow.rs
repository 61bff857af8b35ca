use crate::agents::version_file::{VERSION_FILE_NAME, read_version_marker};
use crate::agents::{
    EditKind, ModuleUpdater, ProjectInfo, ProjectScannerAgent, ProviderUpdater, UpdateReport,
    VersionControlAgent,
};
use crate::config::Config;
use crate::error::{Result, TfbumpError};
use crate::hcl::Document;
use crate::registry::CatalogClient;
use crate::resolution::{ResolutionPolicy, identification_target};
use crate::utils::fs::atomic_write;
use crate::utils::path_validator::PathValidator;
use crate::version::Version;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::fs;
use std::path::Path;

/// Where a file ended up after processing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileState {
    /// No edit applied; the file is never written.
    Unchanged,
    /// Edits applied but not written (dry run).
    Dirty,
    Persisted,
}

/// Execute the update workflow
pub fn execute_update(
    config: &Config,
    catalog: &dyn CatalogClient,
    verbose: bool,
) -> Result<UpdateReport> {
    println!("{}", "Starting Terraform version update...".cyan().bold());
    if config.dry_run {
        println!("{}", "   (dry run: no file will be written)".dimmed());
    }

    // Step 1: Discover files
    println!("\n{}", "1. Discovering Terraform files...".yellow());
    let scanner = ProjectScannerAgent::new(config)?;
    let project = scanner.discover()?;
    println!(
        "{}",
        format!(
            "✓ Found {} file(s) matching {}",
            project.files.len(),
            config.file_pattern
        )
        .green()
    );

    let mut report = UpdateReport::new();

    // Step 2: Work out the release version for provider identification
    println!("\n{}", "2. Resolving release version...".yellow());
    let target = resolve_release_version(config, &project, &mut report);

    // Step 3: Update files
    println!("\n{}", "3. Updating files...".yellow());
    update_files(config, &project, catalog, target.as_ref(), verbose, &mut report);
    println!("{}", "✓ Update completed".green());

    print_update_report(&report, &project, config.dry_run);
    Ok(report)
}

/// Combines the `VERSION` marker and the newest git tag into the value
/// stamped into provider identification literals.
fn resolve_release_version(
    config: &Config,
    project: &ProjectInfo,
    report: &mut UpdateReport,
) -> Option<Version> {
    let (marker, marker_error) = match read_version_marker(&project.root) {
        Ok(marker) => (marker, None),
        Err(e) => {
            tracing::warn!(error = %e, "ignoring unusable VERSION file");
            (None, Some(e))
        }
    };

    let tag = match VersionControlAgent::new(&project.root).and_then(|git| git.latest_tag_version())
    {
        Ok(tag) => tag,
        Err(e) => {
            tracing::debug!(error = %e, "no version tag available");
            None
        }
    };

    let describe = |v: &Option<Version>| v.as_ref().map_or("-".to_string(), Version::to_string);
    let Some(target) = identification_target(marker.as_ref(), tag.as_ref()) else {
        if let Some(e) = marker_error {
            report.record_failure(&project.root.join(VERSION_FILE_NAME), None, e);
        }
        println!(
            "{}",
            format!(
                "⚠ No release version found; provider '{}' identification left unchanged",
                config.tracked_provider
            )
            .yellow()
        );
        return None;
    };

    println!(
        "{}",
        format!(
            "✓ Release version {} (VERSION: {}, latest tag: {})",
            target,
            describe(&marker),
            describe(&tag)
        )
        .green()
    );
    Some(target)
}

/// Runs every discovered file through the module and provider updaters.
/// File-scoped errors are recorded and the next file is processed.
pub fn update_files(
    config: &Config,
    project: &ProjectInfo,
    catalog: &dyn CatalogClient,
    release: Option<&Version>,
    verbose: bool,
    report: &mut UpdateReport,
) {
    let modules = ModuleUpdater::new(catalog, ResolutionPolicy::new(config.stable_only));
    let providers = release.map(|target| {
        ProviderUpdater::new(
            &config.tracked_provider,
            &config.identification_attribute,
            target,
        )
    });

    let pb = ProgressBar::new(project.files.len() as u64);
    if verbose {
        pb.set_draw_target(ProgressDrawTarget::hidden());
    }
    if let Ok(style) = ProgressStyle::default_bar().template("  [{bar:40}] {pos}/{len} {msg}") {
        pb.set_style(style.progress_chars("=>-"));
    }

    for file in &project.files {
        pb.set_message(project.relative(file).display().to_string());
        report.files_scanned += 1;

        match process_file(config, file, &modules, providers.as_ref(), report) {
            Ok(FileState::Unchanged) => {}
            Ok(FileState::Dirty | FileState::Persisted) => {
                report.files_rewritten.push(file.clone());
            }
            Err(e) => report.record_failure(file, None, e),
        }
        pb.inc(1);
    }

    pb.finish_and_clear();
}

fn process_file(
    config: &Config,
    file: &Path,
    modules: &ModuleUpdater<'_>,
    providers: Option<&ProviderUpdater<'_>>,
    report: &mut UpdateReport,
) -> Result<FileState> {
    let path = PathValidator::validate_file_path(file, &config.root)?;
    let content = fs::read_to_string(&path)?;
    let mut doc = Document::parse(&content).map_err(|e| TfbumpError::Parse {
        file: file.to_path_buf(),
        line: e.line,
        column: e.column,
        message: e.message,
    })?;
    tracing::debug!(file = %file.display(), "parsed");

    let mut applied = modules.update_document(file, &mut doc, report);
    if let Some(providers) = providers {
        applied += providers.update_document(file, &mut doc, report);
    }
    if applied == 0 || !doc.is_dirty() {
        return Ok(FileState::Unchanged);
    }

    if config.dry_run {
        return Ok(FileState::Dirty);
    }

    let output = if config.format_on_write {
        doc.formatted()?
    } else {
        doc.serialize()
    };
    atomic_write(&path, &output)?;
    tracing::debug!(file = %file.display(), edits = applied, "written");
    Ok(FileState::Persisted)
}

fn print_update_report(report: &UpdateReport, project: &ProjectInfo, dry_run: bool) {
    if report.is_empty() {
        println!("\n{}", "No updates were applied".yellow());
    } else {
        println!(
            "\n{}",
            format!("Applied {} update(s)", report.total_updates()).yellow()
        );
        for (kind, title) in [
            (EditKind::Module, "Module updates"),
            (EditKind::Provider, "Provider updates"),
        ] {
            let mut edits = report.edits.iter().filter(|e| e.kind == kind).peekable();
            if edits.peek().is_none() {
                continue;
            }
            println!("\n{}:", title.cyan().bold());
            for edit in edits {
                println!(
                    "  • {} {} → {} {}",
                    edit.subject.white().bold(),
                    edit.old.red(),
                    edit.new.green().bold(),
                    format!("({})", project.relative(&edit.file).display()).dimmed()
                );
            }
        }
    }

    if !report.skipped.is_empty() {
        println!("\n{}:", "Left unchanged".yellow().bold());
        for issue in &report.skipped {
            println!(
                "  • {} {}: {}",
                project.relative(&issue.file).display(),
                issue.block.as_deref().unwrap_or(""),
                issue.reason.dimmed()
            );
        }
    }

    if report.has_failures() {
        println!("\n{}:", "Failures".red().bold());
        for issue in &report.failures {
            let location = match &issue.block {
                Some(block) => format!("{} {}", project.relative(&issue.file).display(), block),
                None => project.relative(&issue.file).display().to_string(),
            };
            println!("  ✗ {}: {}", location.white().bold(), issue.reason.red());
        }
    }

    let rewritten = report.files_rewritten.len();
    if dry_run {
        println!(
            "\n{}",
            format!(
                "{} of {} file(s) would be rewritten",
                rewritten, report.files_scanned
            )
            .cyan()
        );
    } else if rewritten > 0 {
        println!(
            "\n{}",
            format!("✓ Rewrote {} of {} file(s)", rewritten, report.files_scanned).green()
        );
    }

    if report.has_failures() {
        println!(
            "\n{}",
            format!(
                "Update finished with {} failure(s)",
                report.failures.len()
            )
            .red()
            .bold()
        );
    } else {
        println!(
            "\n{}",
            "✨ Update process completed successfully!".green().bold()
        );
    }
}
