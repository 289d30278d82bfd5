//! Prompt templates for study material and parsing of flashcard output.

use lazy_static::lazy_static;
use regex::Regex;
use serde_json::Value;
use crate::error::FlashcardError;
use crate::models::Flashcard;

lazy_static! {
    // widest [...] span, across lines
    static ref JSON_ARRAY: Regex = Regex::new(r"(?s)\[.*\]").unwrap();
}

pub fn summarize_prompt(text: &str) -> String {
    format!(
        "Please provide a concise summary of the following text.\n\
         Format the summary as a bulleted list with key points. Each point should be on a new line starting with a bullet (•).\n\
         \n\
         Text to summarize:\n\
         {text}\n\
         \n\
         Summary:"
    )
}

pub fn flashcard_prompt(text: &str) -> String {
    format!(
        "Based on the following text, generate 5-6 educational flashcards in JSON format.\n\
         Each flashcard should have a \"question\" and \"answer\" field. The questions should test understanding of key concepts.\n\
         Return ONLY a valid JSON array, no other text.\n\
         \n\
         Text:\n\
         {text}\n\
         \n\
         Format:\n\
         [\n  \
         {{\"question\": \"Question 1\", \"answer\": \"Answer 1\"}},\n  \
         {{\"question\": \"Question 2\", \"answer\": \"Answer 2\"}}\n\
         ]\n\
         \n\
         JSON:"
    )
}

/// Parses the model's flashcard answer.
///
/// Models tend to wrap the array in prose or code fences, so the widest
/// `[...]` span is tried first and the whole response second. Items missing
/// `question` or `answer` are dropped; non-string values are stringified.
pub fn parse_flashcards(response: &str) -> Result<Vec<Flashcard>, FlashcardError> {
    let raw = JSON_ARRAY
        .find(response)
        .map(|m| m.as_str())
        .unwrap_or_else(|| response.trim());

    let Value::Array(items) = serde_json::from_str::<Value>(raw)? else {
        return Err(FlashcardError::NotAList);
    };

    let cards: Vec<Flashcard> = items
        .iter()
        .filter_map(|item| {
            let question = item.get("question")?;
            let answer = item.get("answer")?;
            Some(Flashcard {
                question: as_text(question),
                answer: as_text(answer),
            })
        })
        .collect();

    if cards.is_empty() {
        return Err(FlashcardError::Empty);
    }
    Ok(cards)
}

fn as_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summarize_prompt_embeds_text() {
        let prompt = summarize_prompt("Photosynthesis converts light.");
        assert!(prompt.contains("Text to summarize:\nPhotosynthesis converts light.\n"));
        assert!(prompt.contains("bullet (•)"));
        assert!(prompt.ends_with("Summary:"));
    }

    #[test]
    fn test_flashcard_prompt_embeds_text_and_format() {
        let prompt = flashcard_prompt("Mitochondria");
        assert!(prompt.contains("Text:\nMitochondria\n"));
        assert!(prompt.contains(r#"{"question": "Question 1", "answer": "Answer 1"},"#));
        assert!(prompt.ends_with("JSON:"));
    }

    #[test]
    fn test_parse_plain_array() {
        let cards = parse_flashcards(r#"[{"question":"Q1","answer":"A1"},{"question":"Q2","answer":"A2"}]"#).unwrap();
        assert_eq!(cards.len(), 2);
        assert_eq!(cards[1], Flashcard { question: "Q2".into(), answer: "A2".into() });
    }

    #[test]
    fn test_parse_array_wrapped_in_prose_and_fences() {
        let response = "Sure! Here you go:\n```json\n[\n  {\"question\": \"What is 2+2?\", \"answer\": \"4\"}\n]\n```\nGood luck.";
        let cards = parse_flashcards(response).unwrap();
        assert_eq!(cards, vec![Flashcard { question: "What is 2+2?".into(), answer: "4".into() }]);
    }

    #[test]
    fn test_parse_drops_incomplete_items_and_stringifies_values() {
        let response = r#"[{"question":"Q"},{"question":"Year?","answer":1969},"junk"]"#;
        let cards = parse_flashcards(response).unwrap();
        assert_eq!(cards, vec![Flashcard { question: "Year?".into(), answer: "1969".into() }]);
    }

    #[test]
    fn test_parse_non_list_is_rejected() {
        assert!(matches!(parse_flashcards(r#"{"question":"Q","answer":"A"}"#), Err(FlashcardError::NotAList)));
    }

    #[test]
    fn test_parse_no_valid_cards() {
        assert!(matches!(parse_flashcards(r#"[{"q":"x"}]"#), Err(FlashcardError::Empty)));
    }

    #[test]
    fn test_parse_garbage_is_json_error() {
        assert!(matches!(parse_flashcards("I cannot help with that."), Err(FlashcardError::Json(_))));
    }
}
