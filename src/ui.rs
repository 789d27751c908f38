use colored::*;
use jiff::civil::Date;

use crate::{
    models::award::AwardRecord,
    services::{
        convert::ConvertReport,
        filter::{Facets, Urgency, urgency},
        ingest::{IngestReport, RowFailure},
        validate::ValidationReport,
    },
};

/// Get the terminal width, defaulting to 80 if unavailable
fn get_terminal_width() -> usize {
    term_size::dimensions().map(|(w, _)| w).unwrap_or(80)
}

/// Badge text for an award: "Passed" once the deadline is gone, else days left
pub fn urgency_badge(award: &AwardRecord, today: Date) -> ColoredString {
    match urgency(award, today) {
        None => "No date".dimmed(),
        Some((Urgency::Passed, _)) => "Passed".dimmed(),
        Some((Urgency::Urgent, days)) => format!("{}d left", days).red().bold(),
        Some((Urgency::Upcoming, days)) => format!("{}d left", days).yellow(),
        Some((Urgency::PlentyOfTime, days)) => format!("{}d left", days).green(),
    }
}

/// Render the listing header, e.g. "Showing 3 of 12 awards"
pub fn render_view_header(shown: usize, total: usize) {
    let award_word = if total == 1 { "award" } else { "awards" };
    println!(
        "\n  {} {} of {} {}\n",
        "Showing".cyan().bold(),
        shown,
        total,
        award_word
    );
}

/// Render one award as a card: title with right-aligned badge, then metadata
pub fn render_award(award: &AwardRecord, today: Date) {
    let terminal_width = get_terminal_width();
    let badge = urgency_badge(award, today);
    let left_section = format!("  {}", award.title);

    let total_content = left_section.chars().count() + badge.chars().count();
    if total_content + 4 < terminal_width {
        let padding = terminal_width - total_content - 2;
        println!("{}{}{}", left_section.bold(), " ".repeat(padding), badge);
    } else {
        println!("{}  {}", left_section.bold(), badge);
    }

    let mut meta_parts = vec![award.deadline_label().blue().to_string()];
    for value in [&award.level, &award.award_for, &award.award_type] {
        if !value.is_empty() {
            meta_parts.push(value.clone());
        }
    }
    if !award.application_mode.is_empty() {
        meta_parts.push(award.application_mode.dimmed().to_string());
    }
    println!("    {}", meta_parts.join(&format!(" {} ", "•".dimmed())));
    println!("    {}", award.link.dimmed());

    println!("    {}", "─".repeat(30).dimmed());
}

/// Render the filter options available across the collection
pub fn render_facets(facets: &Facets) {
    render_facet_group("Level", &facets.levels);
    render_facet_group("Award for", &facets.award_for);
    render_facet_group("Type", &facets.award_type);
}

fn render_facet_group(title: &str, values: &[String]) {
    println!("\n  ─── {} ───\n", title.bold());
    if values.is_empty() {
        println!("    {}", "(none)".dimmed());
    }
    for value in values {
        println!("    {} {}", "•".green(), value);
    }
}

pub fn render_validation_report(report: &ValidationReport) {
    println!("\n  {} {}", "Total awards:".bold(), report.total_awards);
    println!("  {} {}", "Errors:".bold(), report.errors.len());
    println!("  {} {}", "Warnings:".bold(), report.warnings.len());

    if !report.errors.is_empty() {
        println!("\n  {}", "ERRORS".red().bold());
        for error in &report.errors {
            println!("    {} {}", "✗".red(), error);
        }
    }

    if !report.warnings.is_empty() {
        println!("\n  {}", "WARNINGS".yellow().bold());
        for warning in &report.warnings {
            println!("    {} {}", "!".yellow(), warning);
        }
    }

    println!();
    if report.valid {
        println!("  {}", "✓ Validation passed".green().bold());
    } else {
        println!("  {}", "✗ Validation failed".red().bold());
    }
}

pub fn render_ingest_report(report: &IngestReport) {
    if report.is_noop() {
        println!("No new rows to process");
        return;
    }

    for award in &report.added {
        println!(
            "{} {} {}",
            "+".green(),
            award.title.bold(),
            award.deadline_label().dimmed()
        );
    }
    render_failures(&report.failures);

    println!(
        "\n{} added, {} duplicates, {} failed (last processed row {})",
        report.added.len(),
        report.duplicates,
        report.failures.len(),
        report.last_processed_row
    );
}

pub fn render_convert_report(report: &ConvertReport) {
    render_failures(&report.skipped);
    println!(
        "{} {} awards ({} duplicates, {} skipped rows)",
        "Converted".green().bold(),
        report.collection.len(),
        report.duplicates,
        report.skipped.len()
    );
}

fn render_failures(failures: &[RowFailure]) {
    for failure in failures {
        println!(
            "{} {} {}",
            "✗".red(),
            format!("row {}", failure.row).dimmed(),
            failure.message
        );
    }
}

/// Format the collection timestamp for the listing footer (e.g. "Oct 19, 2026")
pub fn format_last_updated(timestamp: jiff::Timestamp) -> String {
    let zoned = jiff::Zoned::new(timestamp, jiff::tz::TimeZone::system());
    zoned.strftime("%b %d, %Y").to_string()
}
