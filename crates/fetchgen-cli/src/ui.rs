//! fetchgen CLI UI primitives.

use std::collections::BTreeMap;
use std::time::Duration;

use console::style;
use indicatif::{ProgressBar, ProgressStyle};

/// Color palette
pub mod colors {
    use console::Color;

    pub const CYAN: Color = Color::Color256(51);
    pub const MAGENTA: Color = Color::Color256(201);
    pub const AMBER: Color = Color::Color256(214);
    pub const NEON_GREEN: Color = Color::Color256(82);
    pub const DIM: Color = Color::Color256(240);
}

/// Symbols
pub mod symbols {
    pub const DIAMOND: &str = "\u{25C6}"; // ◆
    pub const DIAMOND_OUTLINE: &str = "\u{25C7}"; // ◇
    pub const TARGET_FILLED: &str = "\u{25C9}"; // ◉
    pub const TRIANGLE: &str = "\u{25B8}"; // ▸
    pub const DOT: &str = "\u{00B7}"; // ·
}

/// Print compact version header
pub fn print_compact_header(version: &str) {
    println!(
        "  {} {} {}",
        style(symbols::DIAMOND).fg(colors::CYAN),
        style("fetchgen").fg(colors::CYAN).bold(),
        style(version).dim()
    );
}

/// Print a success message
pub fn success(msg: &str) {
    println!(
        "  {} {}",
        style(symbols::TARGET_FILLED).fg(colors::NEON_GREEN),
        msg
    );
}

/// Print an error message
pub fn error(msg: &str) {
    eprintln!(
        "  {} {}",
        style(symbols::DIAMOND).fg(colors::MAGENTA),
        style(msg).fg(colors::MAGENTA)
    );
}

/// Print a warning about something left out of the output
pub fn skipped(item: &str, reason: &str) {
    println!(
        "  {} {} {}",
        style(symbols::DIAMOND_OUTLINE).fg(colors::AMBER),
        style(item).fg(colors::AMBER),
        style(reason).fg(colors::DIM)
    );
}

/// Print a dim/secondary message
pub fn dim(msg: &str) {
    println!("  {}", style(msg).fg(colors::DIM));
}

/// Create a spinner
pub fn spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    let style = ProgressStyle::default_spinner()
        .tick_chars("\u{25CE}\u{25C9}\u{25CE}\u{25C9}") // ◎◉◎◉
        .template("  {spinner:.cyan} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner());
    pb.set_style(style);
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(Duration::from_millis(150));
    pb
}

/// Print directory in tree
pub fn tree_dir(prefix: &str, name: &str) {
    println!(
        "  {}{} {}/",
        style(prefix).fg(colors::DIM),
        style(symbols::TRIANGLE).fg(colors::CYAN),
        style(name).fg(colors::CYAN).bold()
    );
}

/// Print file tree item
pub fn tree_item(prefix: &str, name: &str, is_last: bool) {
    let connector = if is_last {
        "\u{2570}\u{2500}\u{2500}" // ╰──
    } else {
        "\u{251C}\u{2500}\u{2500}" // ├──
    };
    println!(
        "  {}{}  {}",
        style(prefix).fg(colors::DIM),
        style(connector).fg(colors::DIM),
        style(name).fg(colors::CYAN)
    );
}

/// Groups relative file paths by their directory; root files go under `.`.
pub fn group_by_dir(files: &[String]) -> BTreeMap<&str, Vec<&str>> {
    let mut dirs: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
    for file in files {
        let (dir, name) = file.rsplit_once('/').unwrap_or((".", file.as_str()));
        dirs.entry(dir).or_default().push(name);
    }
    dirs
}

/// Print the generated files as a tree below `root`.
pub fn file_tree(root: &str, files: &[String]) {
    tree_dir("", root);
    for (dir, names) in group_by_dir(files) {
        tree_dir("   ", dir);
        for (i, name) in names.iter().enumerate() {
            tree_item("      ", name, i + 1 == names.len());
        }
    }
}

/// Print timing information
pub fn timing(label: &str, duration_ms: u128) {
    println!(
        "  {} {} in {}ms",
        style(symbols::DIAMOND_OUTLINE).fg(colors::CYAN),
        label,
        duration_ms
    );
}

/// Print "Hold up" error header
pub fn error_header() {
    eprintln!();
    eprintln!(
        "  {} {}",
        style(symbols::DIAMOND).fg(colors::MAGENTA).bold(),
        style("Hold up.").fg(colors::MAGENTA).bold()
    );
    eprintln!();
}
