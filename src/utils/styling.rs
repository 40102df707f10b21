//! Terminal styling for the training run

use console::{style, Emoji};
use std::path::Path;
use std::time::Duration;

// Emoji icons with fallbacks for terminals that don't support them
pub static INFO: Emoji<'_, '_> = Emoji("ℹ️  ", "[*] ");
pub static ROCKET: Emoji<'_, '_> = Emoji("🚀 ", ">> ");
pub static FOLDER: Emoji<'_, '_> = Emoji("📂 ", "");
pub static TARGET: Emoji<'_, '_> = Emoji("🎯 ", "");
pub static SAVE: Emoji<'_, '_> = Emoji("💾 ", "");
pub static TREE: Emoji<'_, '_> = Emoji("🌲 ", "");
pub static SEED: Emoji<'_, '_> = Emoji("🎲 ", "");

/// Print the application banner
pub fn print_banner(version: &str) {
    let banner = r#"
    ██████╗ ██╗███████╗██╗  ██╗ ██████╗  █████╗ ████████╗███████╗
    ██╔══██╗██║██╔════╝██║ ██╔╝██╔════╝ ██╔══██╗╚══██╔══╝██╔════╝
    ██████╔╝██║███████╗█████╔╝ ██║  ███╗███████║   ██║   █████╗
    ██╔══██╗██║╚════██║██╔═██╗ ██║   ██║██╔══██║   ██║   ██╔══╝
    ██║  ██║██║███████║██║  ██╗╚██████╔╝██║  ██║   ██║   ███████╗
    ╚═╝  ╚═╝╚═╝╚══════╝╚═╝  ╚═╝ ╚═════╝ ╚═╝  ╚═╝   ╚═╝   ╚══════╝
    "#;

    println!();
    println!("{}", style(banner).cyan().bold());
    println!("    {}", style("Credit-risk scoring pipeline").dim());
    println!("    {}", style(format!("v{}", version)).dim());
    println!("    {}", style("━".repeat(50)).dim());
    println!();
}

/// Settings shown on the configuration card
pub struct RunCard<'a> {
    pub input: &'a Path,
    pub target: Option<&'a str>,
    pub artifacts: &'a Path,
    pub n_estimators: usize,
    pub learning_rate: f64,
    pub max_depth: usize,
    pub seed: u64,
}

/// Print configuration card
pub fn print_config(card: &RunCard<'_>) {
    let box_width = 56;
    let line = "─".repeat(box_width - 2);
    let target = card.target.unwrap_or("(auto)");

    println!("    ┌{}┐", line);
    println!("    │ {:<53}│", style("⚙️  Configuration").cyan().bold());
    println!("    ├{}┤", line);
    println!("    │  {}Input:     {:<38}│", FOLDER, truncate_path(card.input, 37));
    println!("    │  {}Target:    {:<38}│", TARGET, truncate_string(target, 37));
    println!("    │  {}Artifacts: {:<38}│", SAVE, truncate_path(card.artifacts, 37));
    println!("    ├{}┤", line);
    println!(
        "    │  {}Trees: {:<8} Learning rate: {:<6} Depth: {:<3}│",
        TREE,
        style(card.n_estimators).yellow(),
        style(card.learning_rate).yellow(),
        style(card.max_depth).yellow()
    );
    println!("    │  {}Seed:  {:<43}│", SEED, style(card.seed).yellow());
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

/// Print a success message
pub fn print_success(message: &str) {
    println!("    {} {}", style("✓").green().bold(), style(message).green());
}

/// Print an info message
pub fn print_info(message: &str) {
    println!("    {} {}", INFO, message);
}

/// Print how long a step took
pub fn print_step_time(elapsed: Duration) {
    println!(
        "    {}",
        style(format!("⏱  {:.2}s", elapsed.as_secs_f64())).dim()
    );
}

/// Print the final completion message
pub fn print_completion(artifacts: &Path) {
    println!();
    println!(
        "    {} {} {}",
        ROCKET,
        style("Model ready in").green().bold(),
        style(artifacts.display()).green().bold()
    );
    println!();
}

/// Print a styled count message
pub fn print_count(description: &str, count: usize, detail: Option<&str>) {
    if let Some(info) = detail {
        println!(
            "      Found {} {} {}",
            style(count).yellow().bold(),
            description,
            style(info).dim()
        );
    } else {
        println!("      Found {} {}", style(count).yellow().bold(), description);
    }
}

// Helper functions

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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_keeps_tail() {
        assert_eq!(truncate_string("short", 10), "short");
        assert_eq!(truncate_string("abcdefghijkl", 8), "...hijkl");
    }
}
