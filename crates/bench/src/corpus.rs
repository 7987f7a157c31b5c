//! Fixed benchmark texts
//!
//! Every benchmark runs the same three inputs so results are comparable across
//! architectures and runs.

pub const SHORT: &str = "The quick brown fox jumps over the lazy dog. This is a simple test.";

pub const MEDIUM: &str = "Artificial intelligence has revolutionized many aspects of modern life, \
from healthcare to transportation. Machine learning algorithms can now diagnose diseases, predict \
weather patterns, and even create art. However, with these advancements come new challenges and \
ethical considerations.";

pub const LONG: &str = "The field of artificial intelligence has undergone remarkable transformations \
over the past decade, fundamentally altering how we approach complex problems across numerous domains. \
From healthcare systems that can predict patient outcomes with unprecedented accuracy to autonomous \
vehicles navigating busy city streets, AI technologies have moved from the realm of science fiction \
into practical, everyday applications. Machine learning algorithms, particularly deep learning models, \
have demonstrated exceptional capabilities in pattern recognition, natural language processing, and \
decision-making tasks. These systems can now analyze vast amounts of data in seconds, identifying \
trends and insights that would take human analysts weeks or months to discover.";

/// `(size, text)` in reporting order
pub const TEXTS: [(&str, &str); 3] = [("short", SHORT), ("medium", MEDIUM), ("long", LONG)];

#[cfg(test)]
mod tests {
    use super::*;
    use texdit_engine::text::word_count;

    #[test]
    fn test_texts_grow_in_size() {
        let counts: Vec<usize> = TEXTS.iter().map(|(_, text)| word_count(text)).collect();
        assert!(counts[0] < counts[1] && counts[1] < counts[2]);
        // all of them are long enough to summarise
        assert!(counts.iter().all(|&n| n >= 10));
    }
}
