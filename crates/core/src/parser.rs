//! Line-oriented quiz text format.
//!
//! ```text
//! Capital of France?
//! + Paris
//! * London
//! ```
//!
//! Lines starting with `+` are correct choices, lines starting with `*` are
//! incorrect choices, and any other non-blank line starts a new question.

use thiserror::Error;

use crate::model::{Choice, Question, QuestionError};

pub const CORRECT_MARKER: char = '+';
pub const INCORRECT_MARKER: char = '*';

/// Everything besides `\r\n` that ends a line: LF, CR, VT, FF, the file/group/record
/// separators, NEL and the Unicode line and paragraph separators.
const LINE_BREAKS: [char; 10] = [
    '\n', '\r', '\u{0b}', '\u{0c}', '\u{1c}', '\u{1d}', '\u{1e}', '\u{85}', '\u{2028}',
    '\u{2029}',
];

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum FormatError {
    #[error("quiz file is empty")]
    EmptyInput,

    #[error("line {line}: choice found before any question")]
    DanglingChoice { line: usize },

    #[error("line {line}: empty choice for question '{question}'")]
    EmptyChoiceText { line: usize, question: String },

    #[error("question '{question}' has no correct choice marked with '+'")]
    NoCorrectChoice { question: String },

    #[error("no valid questions found in quiz file")]
    NoQuestionsFound,

    #[error(transparent)]
    Question(#[from] QuestionError),
}

fn split_lines(text: &str) -> impl Iterator<Item = &str> {
    text.split("\r\n").flat_map(|chunk| chunk.split(LINE_BREAKS))
}

enum Line<'a> {
    Blank,
    Choice { text: &'a str, is_correct: bool },
    Question(&'a str),
}

fn classify(raw: &str) -> Line<'_> {
    let line = raw.trim();
    if line.is_empty() {
        return Line::Blank;
    }
    if let Some(rest) = line.strip_prefix(CORRECT_MARKER) {
        return Line::Choice {
            text: rest.trim(),
            is_correct: true,
        };
    }
    if let Some(rest) = line.strip_prefix(INCORRECT_MARKER) {
        return Line::Choice {
            text: rest.trim(),
            is_correct: false,
        };
    }
    Line::Question(line)
}

/// A question line and the choices collected under it so far.
struct OpenQuestion {
    text: String,
    choices: Vec<Choice>,
}

impl OpenQuestion {
    /// Closes the block. A block without choices is dropped.
    fn close(self) -> Result<Option<Question>, FormatError> {
        if self.choices.is_empty() {
            return Ok(None);
        }
        if !self.choices.iter().any(Choice::is_correct) {
            return Err(FormatError::NoCorrectChoice {
                question: self.text,
            });
        }
        Ok(Some(Question::new(self.text, self.choices)?))
    }
}

/// Parses quiz text into questions, in source order.
///
/// # Errors
///
/// Returns `FormatError::EmptyInput` for blank input, `DanglingChoice` when a choice
/// precedes every question, `EmptyChoiceText` for a marker with no text,
/// `NoCorrectChoice` when a question has choices but none marked `+`, and
/// `NoQuestionsFound` when nothing survives.
pub fn parse(raw_text: &str) -> Result<Vec<Question>, FormatError> {
    let raw_text = raw_text.strip_prefix('\u{feff}').unwrap_or(raw_text);
    if raw_text.trim().is_empty() {
        return Err(FormatError::EmptyInput);
    }

    let mut questions = Vec::new();
    let mut open: Option<OpenQuestion> = None;

    for (offset, raw_line) in split_lines(raw_text).enumerate() {
        let line = offset + 1;
        match classify(raw_line) {
            Line::Blank => {}
            Line::Choice { text, is_correct } => {
                let Some(current) = open.as_mut() else {
                    return Err(FormatError::DanglingChoice { line });
                };
                if text.is_empty() {
                    return Err(FormatError::EmptyChoiceText {
                        line,
                        question: current.text.clone(),
                    });
                }
                current.choices.push(Choice::new(text, is_correct)?);
            }
            Line::Question(text) => {
                let next = OpenQuestion {
                    text: text.to_owned(),
                    choices: Vec::new(),
                };
                if let Some(done) = open.replace(next) {
                    questions.extend(done.close()?);
                }
            }
        }
    }

    if let Some(done) = open {
        questions.extend(done.close()?);
    }

    if questions.is_empty() {
        return Err(FormatError::NoQuestionsFound);
    }
    Ok(questions)
}

/// Writes questions back out in the quiz text format.
///
/// Output parses back to the same questions, provided no question text itself
/// starts with a choice marker.
#[must_use]
pub fn render<'a>(questions: impl IntoIterator<Item = &'a Question>) -> String {
    let mut out = String::new();
    for (i, question) in questions.into_iter().enumerate() {
        if i > 0 {
            out.push('\n');
        }
        out.push_str(question.text());
        out.push('\n');
        for choice in question.choices() {
            let marker = if choice.is_correct() {
                CORRECT_MARKER
            } else {
                INCORRECT_MARKER
            };
            out.push(marker);
            out.push(' ');
            out.push_str(choice.text());
            out.push('\n');
        }
    }
    out
}
