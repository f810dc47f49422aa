use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Option labels, in display order
pub const OPTION_LABELS: [char; 4] = ['A', 'B', 'C', 'D'];

/// A single multiple-choice question as exchanged with the model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    /// Question text
    pub question: String,

    /// Exactly four answer choices, labeled A-D in order
    pub options: [String; 4],

    /// Correct label as the model wrote it (normally "A".."D")
    pub answer: String,

    /// Per-question fields beyond the required three, such as an explanation
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Question {
    pub fn new(question: impl Into<String>, options: [String; 4], answer: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            options,
            answer: answer.into(),
            extra: Map::new(),
        }
    }

    /// Index of the correct option, if `answer` names one of the four labels.
    ///
    /// Only the label is checked; the option text is never compared.
    pub fn correct_index(&self) -> Option<usize> {
        let label = self.answer.trim();
        let mut chars = label.chars();
        let first = chars.next()?.to_ascii_uppercase();

        // Accept "B", "b", "B." and "B)" but not arbitrary words starting with a label
        match chars.next() {
            None | Some('.') | Some(')') | Some(':') => {}
            Some(_) => return None,
        }

        OPTION_LABELS.iter().position(|&l| l == first)
    }

    /// Options paired with their labels
    pub fn labeled_options(&self) -> impl Iterator<Item = (char, &str)> {
        OPTION_LABELS
            .iter()
            .copied()
            .zip(self.options.iter().map(String::as_str))
    }
}

/// The quiz structure `{quiz: [...]}` plus whatever else the model put next to it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuizDocument {
    pub quiz: Vec<Question>,

    /// Extra top-level fields, preserved for the complete export
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl QuizDocument {
    pub fn new(quiz: Vec<Question>) -> Self {
        Self {
            quiz,
            extra: Map::new(),
        }
    }

    /// The quiz-only subset `{quiz: [...]}`
    pub fn quiz_only(&self) -> QuizDocument {
        QuizDocument::new(self.quiz.clone())
    }

    pub fn len(&self) -> usize {
        self.quiz.len()
    }

    pub fn is_empty(&self) -> bool {
        self.quiz.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn question(answer: &str) -> Question {
        Question::new(
            "What is Rust?",
            [
                "A snake".to_string(),
                "A language".to_string(),
                "A metal coating".to_string(),
                "A game".to_string(),
            ],
            answer,
        )
    }

    #[test]
    fn test_correct_index_by_label() {
        assert_eq!(question("A").correct_index(), Some(0));
        assert_eq!(question("B").correct_index(), Some(1));
        assert_eq!(question(" d ").correct_index(), Some(3));
        assert_eq!(question("C)").correct_index(), Some(2));
    }

    #[test]
    fn test_correct_index_ignores_option_text() {
        assert_eq!(question("A language").correct_index(), None);
        assert_eq!(question("E").correct_index(), None);
        assert_eq!(question("").correct_index(), None);
    }

    #[test]
    fn test_document_requires_four_options() {
        let three = r#"{"quiz":[{"question":"q","options":["a","b","c"],"answer":"A"}]}"#;
        assert!(serde_json::from_str::<QuizDocument>(three).is_err());

        let four = r#"{"quiz":[{"question":"q","options":["a","b","c","d"],"answer":"A"}],"title":"t"}"#;
        let doc: QuizDocument = serde_json::from_str(four).unwrap();
        assert_eq!(doc.len(), 1);
        assert_eq!(doc.extra.get("title"), Some(&Value::String("t".into())));
        assert!(doc.quiz_only().extra.is_empty());
    }

    #[test]
    fn test_question_keeps_unknown_fields() {
        let raw = r#"{"question":"q","options":["a","b","c","d"],"answer":"B","explanation":"because","difficulty":2}"#;
        let question: Question = serde_json::from_str(raw).unwrap();

        assert_eq!(question.correct_index(), Some(1));
        assert_eq!(question.extra.get("explanation"), Some(&Value::String("because".into())));
        assert_eq!(
            serde_json::to_value(&question).unwrap(),
            serde_json::from_str::<Value>(raw).unwrap()
        );
    }
}
