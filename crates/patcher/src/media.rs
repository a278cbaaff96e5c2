use std::path::PathBuf;

use services::services::media_fixer::{MediaFixError, MediaFixReport, MediaFixer};

/// Prints one line per issue plus a summary.
pub fn print_report(report: &MediaFixReport, dry_run: bool) {
    for file in &report.files {
        for issue in &file.issues {
            println!(
                "{}:{}: {}: {} -> {}",
                file.path.display(),
                issue.line,
                issue.kind,
                issue.original,
                issue.replacement
            );
        }
    }

    let verb = if dry_run { "would fix" } else { "fixed" };
    println!(
        "{} file(s) scanned, {} issue(s) found, {} {} file(s)",
        report.files_scanned,
        report.issue_count(),
        verb,
        if dry_run {
            report.files.len()
        } else {
            report.files_changed
        }
    );
}

pub fn fix(
    paths: &[PathBuf],
    fallback_image: &str,
    dry_run: bool,
) -> Result<MediaFixReport, MediaFixError> {
    let report = MediaFixer::new(fallback_image).fix_paths(paths, dry_run)?;
    print_report(&report, dry_run);
    Ok(report)
}
