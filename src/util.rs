use std::time::Instant;

/// Expands a leading `~` in a path to the user's home directory.
pub fn expand_tilde(path: &str) -> String {
    if path.starts_with("~/") || path == "~" {
        if let Some(home) = dirs::home_dir() {
            let rest = path[1..].trim_start_matches('/');
            return home.join(rest).to_string_lossy().to_string();
        }
    }
    path.to_string()
}

/// Cuts `text` down to at most `max_chars` characters, marking the cut with `...`.
pub fn truncate_excerpt(text: &str, max_chars: usize) -> String {
    let text = text.trim();
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}

/// Milliseconds elapsed since `start`.
pub fn elapsed_ms(start: Instant) -> u64 {
    start.elapsed().as_millis() as u64
}
