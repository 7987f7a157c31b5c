//! Word-count arithmetic and response clean-up shared by the tasks

/// Number of whitespace-separated words
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Round to a fixed number of decimal places (half away from zero)
pub fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

/// First `max_chars` characters, with `...` appended when the text was cut
pub fn preview(text: &str, max_chars: usize) -> String {
    if text.chars().count() > max_chars {
        let head: String = text.chars().take(max_chars).collect();
        format!("{}...", head)
    } else {
        text.to_string()
    }
}

/// Text after the last occurrence of `marker`, trimmed.
///
/// Models sometimes echo the prompt's trailing label ("Summary:", "Keywords:").
pub fn after_marker<'a>(response: &'a str, marker: &str) -> &'a str {
    match response.rfind(marker) {
        Some(idx) => response[idx + marker.len()..].trim(),
        None => response.trim(),
    }
}
