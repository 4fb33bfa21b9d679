//! Terminal output helpers

use colored::*;
use piperun_core::domain::definition::RunDefinition;
use piperun_engine::report::{BatchReport, DefinitionReport};
use std::time::Duration;

/// Print a table of definitions
pub fn print_definitions(definitions: &[RunDefinition]) {
    let name_width = definitions
        .iter()
        .map(|d| d.name.len())
        .max()
        .unwrap_or(0)
        .max(4);
    let pipeline_width = definitions
        .iter()
        .map(|d| d.project.len() + d.pipeline_name.len() + 1)
        .max()
        .unwrap_or(0)
        .max(8);

    println!(
        "  {:<name_width$}  {:<pipeline_width$}  {:<6}  {:<12}  {}",
        "NAME".bold(),
        "PIPELINE".bold(),
        "ID".bold(),
        "BRANCH".bold(),
        "RUNS".bold(),
    );
    println!(
        "  {}",
        "─".repeat(name_width + pipeline_width + 30).dimmed()
    );

    for definition in definitions {
        let pipeline = format!("{}/{}", definition.project, definition.pipeline_name);
        println!(
            "  {:<name_width$}  {:<pipeline_width$}  {:<6}  {:<12}  {}",
            definition.name.cyan(),
            pipeline,
            definition.definition_id.dimmed(),
            definition.branch,
            definition.runs.len(),
        );
    }
    println!();
}

/// Print the outcome of a batch
pub fn print_batch_summary(report: &BatchReport) {
    println!();
    println!("{}", "Batch Summary:".bold());
    for definition in &report.definitions {
        print_definition_summary(definition);
    }

    let approvals = report.approvals();
    println!(
        "  {} {} triggered, {} succeeded, {} failed, {} not awaited",
        "Total:".bold(),
        report.triggered().to_string().cyan(),
        report.succeeded().to_string().green(),
        colorize_failures(report.failed()),
        report.not_awaited(),
    );
    if report.trigger_failures() > 0 {
        println!(
            "  {} {} run(s) could not be triggered",
            "!".red().bold(),
            report.trigger_failures()
        );
    }
    if approvals.manual > 0 || approvals.approval_failures > 0 {
        println!(
            "  {} {} run(s) waiting for manual approval",
            "!".yellow().bold(),
            approvals.manual + approvals.approval_failures
        );
    }
}

fn print_definition_summary(report: &DefinitionReport) {
    let marker = if report.all_succeeded() {
        "✓".green()
    } else if report.not_awaited > 0 && report.failed == 0 && report.trigger_failures == 0 {
        "▸".cyan()
    } else {
        "✗".red()
    };

    println!(
        "  {} {} ({}): {}/{} triggered, {} succeeded, {} failed, {} approved",
        marker,
        report.name.bold(),
        report.mode,
        report.triggered,
        report.requested,
        report.succeeded,
        colorize_failures(report.failed),
        report.approvals.approved,
    );
    if !report.run_ids.is_empty() {
        println!("    Runs: {}", report.run_ids.join(", ").dimmed());
    }
    if let Some(lost) = report.monitor.as_ref().map(|m| m.lost).filter(|lost| *lost > 0) {
        println!(
            "    {} {} run(s) could not be followed to completion, check them on the remote service",
            "!".yellow().bold(),
            lost
        );
    }
}

fn colorize_failures(count: usize) -> ColoredString {
    if count > 0 {
        count.to_string().red()
    } else {
        count.to_string().normal()
    }
}

/// Human readable elapsed time: seconds under a minute, minutes above
pub fn format_elapsed(elapsed: Duration) -> String {
    let seconds = elapsed.as_secs_f64();
    if seconds < 60.0 {
        format!("{:.1} seconds", seconds)
    } else {
        format!("{:.1} minutes", seconds / 60.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_elapsed() {
        assert_eq!(format_elapsed(Duration::from_millis(12_300)), "12.3 seconds");
        assert_eq!(format_elapsed(Duration::from_secs(90)), "1.5 minutes");
    }
}
