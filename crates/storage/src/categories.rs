use std::fs;
use std::io;
use std::path::Path;

/// The allowed category names, one per line. A missing file means none.
pub fn load_categories(path: &Path) -> Vec<String> {
    match fs::read_to_string(path) {
        Ok(content) => parse_categories(&content),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            tracing::debug!("No category list at {}", path.display());
            Vec::new()
        }
        Err(e) => {
            tracing::warn!("Could not read category list {}: {e}", path.display());
            Vec::new()
        }
    }
}

/// Trims each line, drops blanks and repeats, keeps first-seen order.
pub fn parse_categories(content: &str) -> Vec<String> {
    let mut categories: Vec<String> = Vec::new();
    for line in content.lines().map(str::trim).filter(|l| !l.is_empty()) {
        if !categories.iter().any(|c| c == line) {
            categories.push(line.to_string());
        }
    }
    categories
}
