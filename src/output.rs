//! CLI output formatting for builds and scaffolding.
//!
//! # Information-First Display
//!
//! Output is **information-centric, not file-centric**. Every page leads with
//! its positional index and title; the output filename follows the arrow and
//! the source path is shown as an indented `Source:` line.
//!
//! # Output Format
//!
//! ## Build
//!
//! ```text
//! Pages
//!     001 About → about.html
//!         Source: pages/about.md
//!     002 Field Notes → index.html
//!         Source: pages/index.md
//!
//! Writing
//!     001 New Year → new-year.html (Jan 2024)
//!         Plans for the year.
//!     002 Colophon → colophon.html (undated)
//!
//! Generated 2 pages, 2 writing entries, 1 feed item → dist
//! ```
//!
//! ## Watch mode
//!
//! Rebuilds print a single summary line instead of the full tree.
//!
//! # Architecture
//!
//! Each report has a `format_*` function (returns `Vec<String>` or `String`)
//! for testability and a `print_*` wrapper that writes to stdout. Format
//! functions are pure: no I/O, no side effects.

use crate::generate::CompileReport;
use crate::naming;
use std::path::Path;

// ============================================================================
// Shared helpers
// ============================================================================

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

/// Index, title and output filename: `001 About → about.html`.
fn entity_line(index: usize, title: &str, output: &str) -> String {
    format!("{} {} → {}", format_index(index), title, output)
}

/// Truncate text to `max` characters, appending `...` if truncated.
fn truncate_desc(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        text.to_string()
    } else {
        let cut: String = text.chars().take(max).collect();
        format!("{}...", cut)
    }
}

fn plural(n: usize, one: &str, many: &str) -> String {
    format!("{} {}", n, if n == 1 { one } else { many })
}

/// Show `path` relative to `root` when possible.
fn display_path(path: &Path, root: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .display()
        .to_string()
}

// ============================================================================
// Build output
// ============================================================================

/// Format the full build report.
pub fn format_compile_report(report: &CompileReport, root: &Path) -> Vec<String> {
    let mut lines = Vec::new();

    lines.push("Pages".to_string());
    for (i, page) in report.pages.iter().enumerate() {
        lines.push(format!(
            "{}{}",
            indent(1),
            entity_line(i + 1, &page.title, &page.output_filename)
        ));
        lines.push(format!(
            "{}Source: {}",
            indent(2),
            display_path(&page.source, root)
        ));
    }

    if !report.writing.is_empty() {
        lines.push(String::new());
        lines.push("Writing".to_string());
        for (i, entry) in report.writing.iter().enumerate() {
            let when = entry
                .date
                .map(naming::month_year)
                .unwrap_or_else(|| "undated".to_string());
            lines.push(format!(
                "{}{} ({})",
                indent(1),
                entity_line(i + 1, &entry.title, &entry.output_filename),
                when
            ));
            if let Some(description) = &entry.description {
                lines.push(format!("{}{}", indent(2), truncate_desc(description, 60)));
            }
        }
    }

    lines.push(String::new());
    lines.push(format_compile_summary(report, root));
    lines
}

/// One-line summary, used after every rebuild in watch mode.
pub fn format_compile_summary(report: &CompileReport, root: &Path) -> String {
    format!(
        "Generated {}, {}, {} → {}",
        plural(report.pages.len(), "page", "pages"),
        plural(report.writing.len(), "writing entry", "writing entries"),
        plural(report.feed_items, "feed item", "feed items"),
        display_path(&report.output_dir, root)
    )
}

pub fn print_compile_report(report: &CompileReport, root: &Path) {
    for line in format_compile_report(report, root) {
        println!("{}", line);
    }
}

pub fn print_compile_summary(report: &CompileReport, root: &Path) {
    println!("{}", format_compile_summary(report, root));
}

// ============================================================================
// Scaffolding output
// ============================================================================

pub fn format_new_entry(path: &Path, root: &Path) -> String {
    format!("Created {}", display_path(path, root))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generate::GeneratedPage;
    use crate::types::WritingEntry;
    use chrono::NaiveDate;
    use std::path::PathBuf;

    fn report() -> CompileReport {
        CompileReport {
            output_dir: PathBuf::from("/site/dist"),
            pages: vec![
                GeneratedPage {
                    title: "About".to_string(),
                    output_filename: "about.html".to_string(),
                    source: PathBuf::from("/site/pages/about.md"),
                },
                GeneratedPage {
                    title: "Field Notes".to_string(),
                    output_filename: "index.html".to_string(),
                    source: PathBuf::from("/site/pages/index.md"),
                },
            ],
            writing: vec![
                WritingEntry {
                    title: "New Year".to_string(),
                    date: NaiveDate::from_ymd_opt(2024, 1, 1),
                    description: Some("Plans for the year.".to_string()),
                    output_filename: "new-year.html".to_string(),
                    rendered_html: String::new(),
                },
                WritingEntry {
                    title: "Colophon".to_string(),
                    date: None,
                    description: None,
                    output_filename: "colophon.html".to_string(),
                    rendered_html: String::new(),
                },
            ],
            assets_copied: 1,
            stylesheet_copied: true,
            feed_items: 1,
        }
    }

    // =========================================================================
    // Helper tests
    // =========================================================================

    #[test]
    fn format_index_pads() {
        assert_eq!(format_index(1), "001");
        assert_eq!(format_index(42), "042");
        assert_eq!(format_index(1000), "1000");
    }

    #[test]
    fn truncate_desc_counts_chars() {
        assert_eq!(truncate_desc("short", 10), "short");
        assert_eq!(truncate_desc("ééééé", 3), "ééé...");
    }

    #[test]
    fn display_path_relative_to_root() {
        let root = Path::new("/site");
        assert_eq!(display_path(Path::new("/site/pages/a.md"), root), "pages/a.md");
        assert_eq!(display_path(Path::new("/elsewhere/a.md"), root), "/elsewhere/a.md");
    }

    // =========================================================================
    // Build output
    // =========================================================================

    #[test]
    fn compile_report_layout() {
        let lines = format_compile_report(&report(), Path::new("/site"));
        assert_eq!(
            lines,
            vec![
                "Pages",
                "    001 About → about.html",
                "        Source: pages/about.md",
                "    002 Field Notes → index.html",
                "        Source: pages/index.md",
                "",
                "Writing",
                "    001 New Year → new-year.html (Jan 2024)",
                "        Plans for the year.",
                "    002 Colophon → colophon.html (undated)",
                "",
                "Generated 2 pages, 2 writing entries, 1 feed item → dist",
            ]
        );
    }

    #[test]
    fn writing_section_omitted_when_empty() {
        let mut r = report();
        r.writing.clear();
        let lines = format_compile_report(&r, Path::new("/site"));
        assert!(!lines.iter().any(|l| l == "Writing"));
    }

    #[test]
    fn summary_pluralizes() {
        let mut r = report();
        r.pages.truncate(1);
        r.writing.truncate(1);
        r.feed_items = 0;
        assert_eq!(
            format_compile_summary(&r, Path::new("/site")),
            "Generated 1 page, 1 writing entry, 0 feed items → dist"
        );
    }

    #[test]
    fn new_entry_line() {
        assert_eq!(
            format_new_entry(
                Path::new("/site/pages/drafts/2025-01-01-x.md"),
                Path::new("/site")
            ),
            "Created pages/drafts/2025-01-01-x.md"
        );
    }
}
