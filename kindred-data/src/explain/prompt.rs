//! Prompt rendering and response decoding for the explanation call.

use std::fmt::Write as _;

use kindred_core::{ExplanationError, ExplanationInput, Place};
use serde::{Deserialize, Serialize};

pub(crate) const SYSTEM_PROMPT: &str = "You explain why recommended places resemble a place \
the user already likes. Reply with JSON of the form {\"explanations\": [...]} holding exactly \
one short, friendly sentence per candidate, in the order given. Make each sentence distinct \
and do not invent facts beyond the attributes supplied.";

/// Render the user message describing `source` and each candidate.
///
/// # Examples
/// ```
/// use geo::Coord;
/// use kindred_core::{ExplanationInput, Place};
/// use kindred_data::explain::render_prompt;
///
/// let source = Place::new("s", "Morning Roast", Coord { x: 0.0, y: 0.0 });
/// let candidate = ExplanationInput {
///     id: "c".into(),
///     name: "Copper Cup".into(),
///     rating: Some(4.5),
///     price_level: None,
///     matched_reasons: vec!["Similar price".into()],
///     category_overlap: None,
///     editorial_summary: None,
/// };
/// let prompt = render_prompt(&source, &[candidate]);
/// assert!(prompt.contains("1. Copper Cup"));
/// ```
pub fn render_prompt(source: &Place, candidates: &[ExplanationInput]) -> String {
    let mut out = format!("The user likes {}", source.name);
    if let Some(category) = &source.primary_category {
        let _ = write!(out, " ({})", category.replace('_', " "));
    }
    out.push_str(".\nCandidates:\n");
    for (index, candidate) in candidates.iter().enumerate() {
        let _ = write!(out, "{}. {}", index + 1, candidate.name);
        if let Some(rating) = candidate.rating {
            let _ = write!(out, "; rated {rating:.1}");
        }
        if let Some(level) = candidate.price_level {
            let _ = write!(out, "; price level {level}");
        }
        if !candidate.matched_reasons.is_empty() {
            let _ = write!(out, "; {}", candidate.matched_reasons.join(", "));
        }
        if let Some(overlap) = &candidate.category_overlap {
            let _ = write!(out, "; {overlap}");
        }
        if let Some(summary) = &candidate.editorial_summary {
            let _ = write!(out, "; \"{summary}\"");
        }
        out.push('\n');
    }
    out
}

#[derive(Debug, Serialize)]
pub(crate) struct ChatRequest<'a> {
    pub model: &'a str,
    pub messages: [ChatMessage<'a>; 2],
    pub temperature: f32,
    pub response_format: ResponseFormat,
}

#[derive(Debug, Serialize)]
pub(crate) struct ChatMessage<'a> {
    pub role: &'static str,
    pub content: &'a str,
}

#[derive(Debug, Serialize)]
pub(crate) struct ResponseFormat {
    #[serde(rename = "type")]
    pub kind: &'static str,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Debug, Deserialize)]
struct ChatReply {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Sentences {
    Wrapped { explanations: Vec<String> },
    Bare(Vec<String>),
}

impl ChatResponse {
    /// Extract the sentence list from the first choice.
    ///
    /// Returns at most `expected` sentences; fewer are passed through for
    /// the caller to pad.
    pub(crate) fn into_sentences(self, expected: usize) -> Result<Vec<String>, ExplanationError> {
        let content = self
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| ExplanationError::Malformed {
                message: "response carried no message content".to_owned(),
            })?;
        let sentences = match serde_json::from_str::<Sentences>(content.trim()) {
            Ok(Sentences::Wrapped { explanations }) => explanations,
            Ok(Sentences::Bare(list)) => list,
            Err(error) => {
                return Err(ExplanationError::Malformed {
                    message: error.to_string(),
                });
            }
        };
        Ok(sentences
            .into_iter()
            .map(|s| s.trim().to_owned())
            .take(expected)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn reply(content: &str) -> ChatResponse {
        serde_json::from_value(serde_json::json!({
            "choices": [{"message": {"role": "assistant", "content": content}}]
        }))
        .expect("decode")
    }

    #[rstest]
    #[case(r#"{"explanations": ["One.", " Two. "]}"#)]
    #[case(r#"["One.", "Two."]"#)]
    fn accepts_wrapped_and_bare_lists(#[case] content: &str) {
        let sentences = reply(content).into_sentences(2).expect("sentences");
        assert_eq!(sentences, ["One.", "Two."]);
    }

    #[rstest]
    fn extra_sentences_are_dropped() {
        let sentences = reply(r#"["a", "b", "c"]"#)
            .into_sentences(2)
            .expect("sentences");
        assert_eq!(sentences.len(), 2);
    }

    #[rstest]
    #[case(r#"{"text": "nope"}"#)]
    #[case("Sure! Here you go.")]
    fn prose_is_malformed(#[case] content: &str) {
        let err = reply(content).into_sentences(1).expect_err("should fail");
        assert!(matches!(err, ExplanationError::Malformed { .. }));
    }

    #[rstest]
    fn missing_choices_are_malformed() {
        let response: ChatResponse =
            serde_json::from_value(serde_json::json!({"choices": []})).expect("decode");
        assert!(matches!(
            response.into_sentences(1),
            Err(ExplanationError::Malformed { .. })
        ));
    }
}
