//! Tone and formality: word-list heuristic and LLM response parsing

use texdit_proto::{Formality, Tone};

const POSITIVE_WORDS: [&str; 5] = ["good", "great", "excellent", "amazing", "wonderful"];
const NEGATIVE_WORDS: [&str; 5] = ["bad", "terrible", "awful", "hate", "angry"];
const FORMAL_WORDS: [&str; 4] = ["therefore", "furthermore", "however", "consequently"];

/// Formal-marker hits needed before text counts as formal
const FORMAL_THRESHOLD: usize = 2;

/// Tone classification, with the model's raw answer when one was involved
#[derive(Debug, Clone, PartialEq)]
pub struct ToneReport {
    pub tone: Tone,
    pub formality: Formality,
    pub raw_response: Option<String>,
}

/// Number of list entries occurring anywhere in `text` (substring match)
fn hits(text: &str, words: &[&str]) -> usize {
    words.iter().filter(|word| text.contains(*word)).count()
}

pub fn analyze_tone_rules(text: &str) -> ToneReport {
    let lowered = text.to_lowercase();
    let positive = hits(&lowered, &POSITIVE_WORDS);
    let negative = hits(&lowered, &NEGATIVE_WORDS);
    let formal = hits(&lowered, &FORMAL_WORDS);

    let tone = if positive > negative {
        Tone::Positive
    } else if negative > positive {
        Tone::Negative
    } else {
        Tone::Neutral
    };

    let formality = if formal > FORMAL_THRESHOLD {
        Formality::Formal
    } else {
        Formality::Informal
    };

    ToneReport {
        tone,
        formality,
        raw_response: None,
    }
}

pub fn tone_prompt(text: &str) -> String {
    format!(
        "Analyze the tone and formality of the following text. Respond with:\n\
         Tone: [positive/negative/neutral]\n\
         Formality: [formal/informal]\n\nText: {}\n\nAnalysis:",
        text
    )
}

pub fn parse_tone_response(response: &str) -> ToneReport {
    let lowered = response.to_lowercase();

    let tone = if lowered.contains("positive") {
        Tone::Positive
    } else if lowered.contains("negative") {
        Tone::Negative
    } else {
        Tone::Neutral
    };

    let formality = if lowered.contains("formal") && !lowered.contains("informal") {
        Formality::Formal
    } else {
        Formality::Informal
    };

    ToneReport {
        tone,
        formality,
        raw_response: Some(response.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rules_positive_informal() {
        let report = analyze_tone_rules("What a GREAT day, the food was good and amazing!");
        assert_eq!(report.tone, Tone::Positive);
        assert_eq!(report.formality, Formality::Informal);
        assert!(report.raw_response.is_none());
    }

    #[test]
    fn test_rules_negative() {
        let report = analyze_tone_rules("I hate this awful weather, though lunch was good.");
        assert_eq!(report.tone, Tone::Negative);
    }

    #[test]
    fn test_rules_tie_is_neutral() {
        assert_eq!(analyze_tone_rules("good but bad").tone, Tone::Neutral);
        assert_eq!(analyze_tone_rules("nothing to see").tone, Tone::Neutral);
    }

    #[test]
    fn test_rules_formality_needs_three_markers() {
        let two = "However, it rained. Therefore we stayed.";
        assert_eq!(analyze_tone_rules(two).formality, Formality::Informal);

        let three = "However, it rained. Therefore we stayed. Furthermore, it was cold.";
        assert_eq!(analyze_tone_rules(three).formality, Formality::Formal);
    }

    #[test]
    fn test_parse_response() {
        let report = parse_tone_response("Tone: Positive\nFormality: formal");
        assert_eq!(report.tone, Tone::Positive);
        assert_eq!(report.formality, Formality::Formal);
        assert_eq!(
            report.raw_response.as_deref(),
            Some("Tone: Positive\nFormality: formal")
        );

        let report = parse_tone_response("negative, informal");
        assert_eq!(report.tone, Tone::Negative);
        assert_eq!(report.formality, Formality::Informal);

        let report = parse_tone_response("unclear");
        assert_eq!(report.tone, Tone::Neutral);
        assert_eq!(report.formality, Formality::Informal);
    }
}
