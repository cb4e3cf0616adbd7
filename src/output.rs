//! Terminal output.
//!
//! Everything the user sees goes through [`OutputFormatter`]; the detailed
//! per-file record lives in the log file instead.

use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use std::collections::HashMap;

pub struct OutputFormatter;

impl OutputFormatter {
    /// Prints a success message in green with a checkmark.
    ///
    /// ```no_run
    /// use dirsort::output::OutputFormatter;
    /// OutputFormatter::success("Files have been organized successfully!");
    /// ```
    pub fn success(message: &str) {
        println!("{} {}", "✓".green(), message);
    }

    /// Prints an error message in red with an X mark, on stderr.
    pub fn error(message: &str) {
        eprintln!("{} {}", "✗".red(), message);
    }

    /// Prints a warning message in yellow with a warning symbol.
    pub fn warning(message: &str) {
        println!("{} {}", "⚠".yellow(), message);
    }

    pub fn info(message: &str) {
        println!("{}", message.cyan());
    }

    pub fn header(header: &str) {
        println!("\n{}", header.bold());
    }

    /// Creates a progress bar for `total` file moves.
    ///
    /// ```no_run
    /// use dirsort::output::OutputFormatter;
    /// let pb = OutputFormatter::create_progress_bar(100);
    /// pb.inc(1);
    /// pb.finish_and_clear();
    /// ```
    pub fn create_progress_bar(total: u64) -> ProgressBar {
        let pb = ProgressBar::new(total);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.cyan} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                .expect("Invalid progress bar template")
                .progress_chars("█▓░"),
        );
        pb
    }

    /// Prints moved-file counts per category.
    ///
    /// Categories are listed in the order given by `order`; categories with
    /// no moved file are left out.
    pub fn summary_table<'a>(
        order: impl IntoIterator<Item = &'a str>,
        category_counts: &HashMap<String, usize>,
        total_files: usize,
    ) {
        let rows: Vec<(&str, usize)> = order
            .into_iter()
            .filter_map(|name| category_counts.get(name).map(|count| (name, *count)))
            .collect();
        if rows.is_empty() {
            return;
        }

        Self::header("SUMMARY");

        let width = rows
            .iter()
            .map(|(name, _)| name.len())
            .max()
            .unwrap_or(0)
            .max("Category".len());

        println!("{:<width$} | {}", "Category".bold(), "Files".bold());
        println!("{}", "-".repeat(width + 10));
        for (category, count) in &rows {
            println!(
                "{:<width$} | {} {}",
                category,
                count.to_string().green(),
                plural(*count)
            );
        }
        println!("{}", "-".repeat(width + 10));
        println!(
            "{:<width$} | {} {}",
            "Total".bold(),
            total_files.to_string().green().bold(),
            plural(total_files)
        );
    }
}

fn plural(count: usize) -> &'static str {
    if count == 1 { "file" } else { "files" }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plural() {
        assert_eq!(plural(0), "files");
        assert_eq!(plural(1), "file");
        assert_eq!(plural(7), "files");
    }

    #[test]
    fn test_progress_bar_length() {
        let pb = OutputFormatter::create_progress_bar(5);
        assert_eq!(pb.length(), Some(5));
        pb.finish_and_clear();
    }
}
