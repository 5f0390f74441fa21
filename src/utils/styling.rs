//! Terminal styling for the pipeline run output

use console::{style, Emoji};
use std::path::Path;
use std::time::Duration;

// Emoji icons with fallbacks for terminals that don't support them
pub static INFO: Emoji<'_, '_> = Emoji("ℹ️  ", "[*] ");
pub static ROCKET: Emoji<'_, '_> = Emoji("🚀 ", ">> ");
pub static DATABASE: Emoji<'_, '_> = Emoji("🗄️  ", "");
pub static FOLDER: Emoji<'_, '_> = Emoji("📂 ", "");
pub static TARGET: Emoji<'_, '_> = Emoji("🎯 ", "");
pub static SCALE: Emoji<'_, '_> = Emoji("⚖️  ", "");

/// Print the application banner
pub fn print_banner(version: &str) {
    println!();
    println!(
        "    {} {}",
        style("visaprep").cyan().bold(),
        style("data preparation for visa approval models").dim()
    );
    println!("    {}", style(format!("v{}", version)).dim());
    println!("    {}", style("━".repeat(50)).dim());
    println!();
}

/// Print the run configuration card
pub fn print_config(
    store: &str,
    collection: &str,
    target: &str,
    artifact_dir: &Path,
    test_size: f64,
) {
    let box_width = 56;
    let line = "─".repeat(box_width - 2);

    println!("    ┌{}┐", line);
    println!(
        "    │ {}{}│",
        style("⚙️  Configuration").cyan().bold(),
        " ".repeat(box_width - 20)
    );
    println!("    ├{}┤", line);
    println!("    │  {} Store:      {:<35}│", DATABASE, truncate_string(store, 34));
    println!(
        "    │  {} Collection: {:<35}│",
        DATABASE,
        truncate_string(collection, 34)
    );
    println!("    │  {} Target:     {:<35}│", TARGET, truncate_string(target, 34));
    println!(
        "    │  {} Artifacts:  {:<35}│",
        FOLDER,
        truncate_path(artifact_dir, 34)
    );
    println!("    ├{}┤", line);
    println!(
        "    │  {} Test size:  {:<35}│",
        SCALE,
        style(format!("{:.0}%", test_size * 100.0)).yellow()
    );
    println!("    └{}┘", line);
    println!();
}

/// Print a step header with styling
pub fn print_step_header(step_num: u8, title: &str) {
    println!();
    println!(
        "    {} {} {}",
        style(format!("STEP {}", step_num)).cyan().bold(),
        style("│").dim(),
        style(title).white().bold()
    );
    println!("    {}", style("─".repeat(50)).dim());
}

/// Print how long a step took
pub fn print_step_time(elapsed: Duration) {
    println!(
        "      {}",
        style(format!("completed in {:.2}s", elapsed.as_secs_f64())).dim()
    );
}

pub fn print_success(message: &str) {
    println!("    {} {}", style("✓").green().bold(), style(message).green());
}

pub fn print_failure(message: &str) {
    println!("    {} {}", style("✗").red().bold(), style(message).red());
}

pub fn print_info(message: &str) {
    println!("    {} {}", INFO, message);
}

/// Print the final completion message
pub fn print_completion(artifact_dir: &Path) {
    println!();
    println!(
        "    {} {} {}",
        ROCKET,
        style("Pipeline complete, artifacts in").green().bold(),
        style(artifact_dir.display()).cyan()
    );
    println!();
}

fn truncate_path(path: &Path, max_len: usize) -> String {
    let path_str = path.display().to_string();
    truncate_string(&path_str, max_len)
}

fn truncate_string(s: &str, max_len: usize) -> String {
    let chars: Vec<char> = s.chars().collect();
    if chars.len() <= max_len {
        s.to_string()
    } else {
        let tail: String = chars[chars.len() - (max_len - 3)..].iter().collect();
        format!("...{}", tail)
    }
}
