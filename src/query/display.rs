//! Console rendering for search hits

use super::SearchHit;

/// Cut `text` to at most `max_chars` characters, appending `...` when cut.
pub fn snippet(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((end, _)) => format!("{}...", &text[..end]),
        None => text.to_string(),
    }
}

/// Render one hit as a `Title:` / `Content:` block.
pub fn format_hit(hit: &SearchHit, max_chars: usize) -> String {
    let title = hit.get_str("title").unwrap_or("(untitled)");
    let content = hit.get_str("content").unwrap_or("");
    let mut block = format!("Title: {}\nContent: {}", title, snippet(content, max_chars));
    if let Some(distance) = hit.distance {
        block.push_str(&format!("\nDistance: {:.4}", distance));
    }
    block
}

pub fn format_hits(hits: &[SearchHit], max_chars: usize, empty_message: &str) -> String {
    if hits.is_empty() {
        return empty_message.to_string();
    }
    hits.iter()
        .map(|hit| format_hit(hit, max_chars))
        .collect::<Vec<_>>()
        .join("\n\n")
}
