use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::RagError;

/// Wording used for the generation prompt. Field order and labels are fixed; only the words change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PromptLanguage {
    #[default]
    English,
    Arabic,
}

impl FromStr for PromptLanguage {
    type Err = RagError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "en" | "english" => Ok(PromptLanguage::English),
            "ar" | "arabic" => Ok(PromptLanguage::Arabic),
            other => Err(RagError::Config(format!("unknown prompt language: {}", other))),
        }
    }
}

impl fmt::Display for PromptLanguage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PromptLanguage::English => write!(f, "en"),
            PromptLanguage::Arabic => write!(f, "ar"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptTemplate {
    pub instruction: String,
    pub question_label: String,
    pub text_label: String,
    pub answer_label: String,
}

impl PromptTemplate {
    pub fn for_language(language: PromptLanguage) -> Self {
        match language {
            PromptLanguage::English => Self {
                instruction: "Answer the following question based on the given text:".to_string(),
                question_label: "Question:".to_string(),
                text_label: "Text:".to_string(),
                answer_label: "Answer:".to_string(),
            },
            PromptLanguage::Arabic => Self {
                instruction: "أجب على السؤال التالي بناءً على النص المحدد:".to_string(),
                question_label: "السؤال:".to_string(),
                text_label: "النص:".to_string(),
                answer_label: "الإجابة:".to_string(),
            },
        }
    }

    /// Instruction, blank line, question, blank line, text, blank line, answer label.
    pub fn render(&self, question: &str, context: &str) -> String {
        format!(
            "{}\n\n{} {}\n\n{} {}\n\n{}",
            self.instruction,
            self.question_label,
            question,
            self.text_label,
            context,
            self.answer_label
        )
    }

    pub fn extract_answer(&self, raw: &str) -> AnswerText {
        extract_answer(raw, &self.answer_label)
    }
}

impl Default for PromptTemplate {
    fn default() -> Self {
        Self::for_language(PromptLanguage::default())
    }
}

/// Model output after label extraction.
///
/// `Unparsed` means the model did not follow the prompt format and the whole
/// decoded output is returned untouched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "text", rename_all = "lowercase")]
pub enum AnswerText {
    Extracted(String),
    Unparsed(String),
}

impl AnswerText {
    pub fn as_str(&self) -> &str {
        match self {
            AnswerText::Extracted(text) | AnswerText::Unparsed(text) => text,
        }
    }

    pub fn is_unparsed(&self) -> bool {
        matches!(self, AnswerText::Unparsed(_))
    }

    pub fn into_string(self) -> String {
        match self {
            AnswerText::Extracted(text) | AnswerText::Unparsed(text) => text,
        }
    }
}

impl fmt::Display for AnswerText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Keeps the text after the last occurrence of `label`.
pub fn extract_answer(raw: &str, label: &str) -> AnswerText {
    match raw.rfind(label) {
        Some(pos) => AnswerText::Extracted(raw[pos + label.len()..].trim().to_string()),
        None => AnswerText::Unparsed(raw.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_layout() {
        let template = PromptTemplate::for_language(PromptLanguage::English);
        let prompt = template.render("When was Andrew Summer born?", "Andrew Summer was born in 1990.");
        assert_eq!(
            prompt,
            "Answer the following question based on the given text:\n\n\
             Question: When was Andrew Summer born?\n\n\
             Text: Andrew Summer was born in 1990.\n\n\
             Answer:"
        );
    }

    #[test]
    fn test_render_arabic_labels() {
        let template = PromptTemplate::for_language(PromptLanguage::Arabic);
        let prompt = template.render("متى ولد أندرو سامر؟", "ولد أندرو سامر عام 1990");
        assert!(prompt.starts_with("أجب على السؤال التالي"));
        assert!(prompt.contains("\n\nالسؤال: متى ولد أندرو سامر؟\n\n"));
        assert!(prompt.ends_with("\n\nالإجابة:"));
    }

    #[test]
    fn test_extract_after_last_label() {
        let raw = "Question: x\n\nAnswer: not this\nAnswer:  In 1990. ";
        assert_eq!(
            extract_answer(raw, "Answer:"),
            AnswerText::Extracted("In 1990.".to_string())
        );
    }

    #[test]
    fn test_extract_arabic_label() {
        let template = PromptTemplate::for_language(PromptLanguage::Arabic);
        let raw = format!("{} عام 1990", template.render("سؤال", "نص"));
        assert_eq!(
            template.extract_answer(&raw),
            AnswerText::Extracted("عام 1990".to_string())
        );
    }

    #[test]
    fn test_missing_label_is_unparsed() {
        let raw = "The model rambled without the label.";
        let answer = extract_answer(raw, "Answer:");
        assert!(answer.is_unparsed());
        assert_eq!(answer.as_str(), raw);
    }

    #[test]
    fn test_language_parsing() {
        assert_eq!("EN".parse::<PromptLanguage>().unwrap(), PromptLanguage::English);
        assert_eq!("arabic".parse::<PromptLanguage>().unwrap(), PromptLanguage::Arabic);
        assert!("klingon".parse::<PromptLanguage>().is_err());
    }
}
