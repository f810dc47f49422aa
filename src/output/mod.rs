use anyhow::{Context, Result};
use chrono::Utc;
use console::style;
use std::path::{Path, PathBuf};

use crate::quiz::QuizDocument;
use crate::QuizError;

pub mod pdf;

/// The three downloads offered for a generated quiz
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportKind {
    /// Complete structure as returned by the model
    FullJson,
    /// `{quiz: [...]}` only
    QuizJson,
    /// Paginated PDF report
    PdfReport,
}

impl ExportKind {
    pub const ALL: [ExportKind; 3] = [ExportKind::FullJson, ExportKind::QuizJson, ExportKind::PdfReport];

    pub fn file_name(&self) -> &'static str {
        match self {
            ExportKind::FullJson => "quiz_data.json",
            ExportKind::QuizJson => "quiz_questions.json",
            ExportKind::PdfReport => "quiz_report.pdf",
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            ExportKind::FullJson | ExportKind::QuizJson => "application/json",
            ExportKind::PdfReport => "application/pdf",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ExportKind::FullJson => "Complete JSON",
            ExportKind::QuizJson => "Quiz (JSON)",
            ExportKind::PdfReport => "Complete PDF",
        }
    }
}

/// A download-ready byte buffer
#[derive(Debug, Clone, PartialEq)]
pub struct ExportArtifact {
    pub kind: ExportKind,
    pub bytes: Vec<u8>,
}

impl ExportArtifact {
    pub fn file_name(&self) -> &'static str {
        self.kind.file_name()
    }
}

/// Produce one export
pub fn export(quiz: &QuizDocument, kind: ExportKind) -> Result<ExportArtifact, QuizError> {
    let bytes = match kind {
        ExportKind::FullJson => to_pretty_json(quiz, kind)?,
        ExportKind::QuizJson => to_pretty_json(&quiz.quiz_only(), kind)?,
        ExportKind::PdfReport => pdf::render_report(quiz, Utc::now()).map_err(|e| QuizError::Export {
            artifact: kind.label().to_string(),
            reason: e.to_string(),
        })?,
    };

    Ok(ExportArtifact { kind, bytes })
}

/// Produce every export independently; one failure does not stop the others
pub fn export_all(quiz: &QuizDocument) -> Vec<Result<ExportArtifact, QuizError>> {
    ExportKind::ALL.iter().map(|&kind| export(quiz, kind)).collect()
}

fn to_pretty_json(quiz: &QuizDocument, kind: ExportKind) -> Result<Vec<u8>, QuizError> {
    serde_json::to_vec_pretty(quiz).map_err(|e| QuizError::Export {
        artifact: kind.label().to_string(),
        reason: e.to_string(),
    })
}

/// Write an artifact into `dir`, returning its path
pub fn save_artifact(artifact: &ExportArtifact, dir: &Path) -> Result<PathBuf> {
    fs_err::create_dir_all(dir).context("Failed to create output directory")?;

    let path = dir.join(artifact.file_name());
    fs_err::write(&path, &artifact.bytes)
        .with_context(|| format!("Failed to write {}", artifact.kind.label()))?;

    Ok(path)
}

/// Render the quiz for the console, marking the correct option of each question
pub fn render_quiz(quiz: &QuizDocument) -> String {
    let mut out = String::new();

    out.push_str(&format!("{}\n", style("❓ Quiz Questions").bold().underlined()));

    for (i, question) in quiz.quiz.iter().enumerate() {
        out.push('\n');
        out.push_str(&format!(
            "{} {}\n",
            style(format!("Question {}:", i + 1)).bold(),
            question.question
        ));

        let correct = question.correct_index();
        for (j, (label, option)) in question.labeled_options().enumerate() {
            let line = format!("{}. {}", label, option);
            if correct == Some(j) {
                out.push_str(&format!("  ✅ {}\n", style(line).green().bold()));
            } else {
                out.push_str(&format!("  ❌ {}\n", line));
            }
        }
    }

    out
}

/// Print the quiz to the console
pub fn print_to_console(quiz: &QuizDocument) {
    print!("{}", render_quiz(quiz));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quiz::Question;
    use serde_json::{json, Value};

    fn sample() -> QuizDocument {
        serde_json::from_value(json!({
            "quiz": [
                {"question": "¿Qué es la fotosíntesis?", "options": ["Respiración", "Conversión de luz", "Digestión", "Evaporación"], "answer": "B"},
                {"question": "Capital of France?", "options": ["Paris", "Rome", "Berlin", "Madrid"], "answer": "A"}
            ],
            "topic": "mixed"
        }))
        .unwrap()
    }

    #[test]
    fn test_quiz_only_export_matches_quiz_field_of_full_export() {
        let quiz = sample();
        let full = export(&quiz, ExportKind::FullJson).unwrap();
        let only = export(&quiz, ExportKind::QuizJson).unwrap();

        let full: Value = serde_json::from_slice(&full.bytes).unwrap();
        let only: Value = serde_json::from_slice(&only.bytes).unwrap();

        assert_eq!(only.as_object().unwrap().len(), 1);
        assert_eq!(only["quiz"], full["quiz"]);
        assert_eq!(full["topic"], "mixed");
    }

    #[test]
    fn test_json_exports_keep_per_question_fields() {
        let raw = json!({
            "quiz": [{
                "question": "Q?",
                "options": ["a", "b", "c", "d"],
                "answer": "A",
                "explanation": "because",
                "difficulty": "easy"
            }],
            "title": "Warm-up"
        });
        let quiz: QuizDocument = serde_json::from_value(raw.clone()).unwrap();

        let full: Value = serde_json::from_slice(&export(&quiz, ExportKind::FullJson).unwrap().bytes).unwrap();
        let only: Value = serde_json::from_slice(&export(&quiz, ExportKind::QuizJson).unwrap().bytes).unwrap();

        assert_eq!(full, raw);
        assert_eq!(only, json!({"quiz": raw["quiz"]}));
        assert_eq!(only["quiz"][0]["explanation"], "because");
    }

    #[test]
    fn test_json_export_is_indented_and_keeps_unicode() {
        let artifact = export(&sample(), ExportKind::FullJson).unwrap();
        let text = String::from_utf8(artifact.bytes).unwrap();

        assert!(text.starts_with("{\n  \"quiz\": [\n"));
        assert!(text.contains("¿Qué es la fotosíntesis?"));
        assert_eq!(artifact.kind.file_name(), "quiz_data.json");
    }

    #[test]
    fn test_export_all_produces_three_artifacts() {
        let artifacts: Vec<ExportArtifact> = export_all(&sample()).into_iter().map(|r| r.unwrap()).collect();
        let names: Vec<&str> = artifacts.iter().map(|a| a.file_name()).collect();

        assert_eq!(names, vec!["quiz_data.json", "quiz_questions.json", "quiz_report.pdf"]);
        assert!(artifacts[2].bytes.starts_with(b"%PDF-"));
        assert_eq!(artifacts[2].kind.mime_type(), "application/pdf");
    }

    #[test]
    fn test_save_artifact_writes_into_directory() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("exports");
        let artifact = export(&sample(), ExportKind::QuizJson).unwrap();

        let path = save_artifact(&artifact, &target).unwrap();

        assert_eq!(path, target.join("quiz_questions.json"));
        assert_eq!(fs_err::read(&path).unwrap(), artifact.bytes);
    }

    #[test]
    fn test_render_marks_only_the_correct_option() {
        let rendered = console::strip_ansi_codes(&render_quiz(&sample())).into_owned();

        assert!(rendered.contains("Question 1: ¿Qué es la fotosíntesis?"));
        assert!(rendered.contains("  ✅ B. Conversión de luz\n"));
        assert!(rendered.contains("  ❌ A. Respiración\n"));
        assert!(rendered.contains("  ✅ A. Paris\n"));
        assert_eq!(rendered.matches('✅').count(), 2);
    }

    #[test]
    fn test_render_unlabeled_answer_marks_nothing() {
        let quiz = QuizDocument::new(vec![Question::new(
            "Pick one",
            ["w".to_string(), "x".to_string(), "y".to_string(), "z".to_string()],
            "x",
        )]);
        let rendered = console::strip_ansi_codes(&render_quiz(&quiz)).into_owned();

        assert_eq!(rendered.matches('✅').count(), 0);
        assert_eq!(rendered.matches('❌').count(), 4);
    }
}
