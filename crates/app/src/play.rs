use std::io::{self, BufRead, Write};

use quiz_core::session::QuizSummary;
use services::{QuestionView, QuizLoopError, QuizLoopService, SessionKey};

const QUIT: &str = ":q";

/// How an interactive attempt ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayOutcome {
    Finished(QuizSummary),
    Quit,
}

#[derive(Debug)]
pub enum PlayError {
    Io(io::Error),
    Loop(QuizLoopError),
}

impl std::fmt::Display for PlayError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PlayError::Io(err) => write!(f, "terminal error: {err}"),
            PlayError::Loop(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for PlayError {}

impl From<io::Error> for PlayError {
    fn from(err: io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<QuizLoopError> for PlayError {
    fn from(err: QuizLoopError) -> Self {
        Self::Loop(err)
    }
}

/// Map what the player typed to an answer. Exact choice text wins over a choice
/// number, so a choice that is itself a number can still be typed directly.
fn resolve_answer<'a>(view: &'a QuestionView, input: &'a str) -> &'a str {
    let typed = input.trim();
    if view
        .choices
        .iter()
        .any(|c| c.trim().eq_ignore_ascii_case(typed))
    {
        return typed;
    }
    typed
        .parse::<usize>()
        .ok()
        .and_then(|n| n.checked_sub(1))
        .and_then(|i| view.choices.get(i))
        .map_or(typed, String::as_str)
}

fn show_question(out: &mut impl Write, view: &QuestionView) -> io::Result<()> {
    writeln!(out)?;
    writeln!(out, "Question {}/{}: {}", view.number, view.total, view.text)?;
    for (i, choice) in view.choices.iter().enumerate() {
        writeln!(out, "  {}) {choice}", i + 1)?;
    }
    write!(out, "> ")?;
    out.flush()
}

fn show_summary(out: &mut impl Write, summary: &QuizSummary) -> io::Result<()> {
    writeln!(out)?;
    writeln!(out, "Quiz finished!")?;
    writeln!(out, "Score: {}/{}", summary.score, summary.total)?;
    writeln!(out, "Errors: {}", summary.errors)
}

/// Read one non-empty line. `None` on end of input or the quit command.
fn read_answer(input: &mut impl BufRead, out: &mut impl Write) -> io::Result<Option<String>> {
    let mut line = String::new();
    loop {
        line.clear();
        if input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        let trimmed = line.trim();
        if trimmed == QUIT {
            return Ok(None);
        }
        if !trimmed.is_empty() {
            return Ok(Some(trimmed.to_owned()));
        }
        write!(out, "> ")?;
        out.flush()?;
    }
}

/// Run one attempt over stdin-like input until the quiz ends or the player quits.
pub fn play_attempt(
    sessions: &QuizLoopService,
    key: &SessionKey,
    first: Option<QuestionView>,
    input: &mut impl BufRead,
    out: &mut impl Write,
) -> Result<PlayOutcome, PlayError> {
    let mut current = first;
    while let Some(view) = current {
        show_question(out, &view)?;
        let Some(typed) = read_answer(input, out)? else {
            return Ok(PlayOutcome::Quit);
        };

        let feedback = sessions.submit_answer(key, view.index, resolve_answer(&view, &typed))?;
        writeln!(out, "{}", feedback.message)?;

        if let Some(summary) = feedback.summary {
            show_summary(out, &summary)?;
            return Ok(PlayOutcome::Finished(summary));
        }
        current = feedback.next;
    }

    let summary = sessions.summary(key)?;
    show_summary(out, &summary)?;
    Ok(PlayOutcome::Finished(summary))
}

/// Ask whether to go again. Anything but yes ends the run.
pub fn ask_again(input: &mut impl BufRead, out: &mut impl Write) -> io::Result<bool> {
    write!(out, "\nStart the quiz again? [y/N] ")?;
    out.flush()?;
    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Ok(false);
    }
    Ok(matches!(line.trim().to_ascii_lowercase().as_str(), "y" | "yes"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use quiz_core::{RandomSource, SessionState};
    use services::SessionStore;
    use std::io::Cursor;

    const TEXT: &str = "2+2?\n* 3\n+ 4\n* 5\n";

    fn begin() -> (QuizLoopService, SessionKey, Option<QuestionView>) {
        let svc = QuizLoopService::new(SessionStore::new()).with_random(RandomSource::seeded(4));
        let key = SessionKey::new("terminal");
        let state = SessionState::from_text(TEXT, &mut RandomSource::seeded(4)).unwrap();
        let first = svc.begin(&key, state).unwrap();
        (svc, key, first)
    }

    #[test]
    fn answers_by_text_before_number() {
        let (_, _, first) = begin();
        let view = first.unwrap();
        assert_eq!(resolve_answer(&view, "2"), "4");
        assert_eq!(resolve_answer(&view, " 4 "), "4");
        assert_eq!(resolve_answer(&view, "9"), "9");
        assert_eq!(resolve_answer(&view, "five"), "five");
    }

    #[test]
    fn plays_to_the_end() {
        let (svc, key, first) = begin();
        let mut input = Cursor::new("\n2\n");
        let mut out = Vec::new();

        let outcome = play_attempt(&svc, &key, first, &mut input, &mut out).unwrap();
        assert_eq!(
            outcome,
            PlayOutcome::Finished(QuizSummary {
                score: 1,
                total: 1,
                errors: 0
            })
        );
        let printed = String::from_utf8(out).unwrap();
        assert!(printed.contains("Question 1/1: 2+2?"));
        assert!(printed.contains("  2) 4"));
        assert!(printed.contains("Correct!"));
        assert!(printed.contains("Score: 1/1"));
    }

    #[test]
    fn wrong_answer_shows_the_right_one() {
        let (svc, key, first) = begin();
        let mut out = Vec::new();
        play_attempt(&svc, &key, first, &mut Cursor::new("3\n"), &mut out).unwrap();
        let printed = String::from_utf8(out).unwrap();
        assert!(printed.contains("Incorrect. The correct answer is: 4"));
        assert!(printed.contains("Errors: 1"));
    }

    #[test]
    fn quit_and_end_of_input_stop_early() {
        let (svc, key, first) = begin();
        let outcome =
            play_attempt(&svc, &key, first, &mut Cursor::new(":q\n"), &mut Vec::new()).unwrap();
        assert_eq!(outcome, PlayOutcome::Quit);
        assert_eq!(svc.progress(&key).unwrap().answered, 0);

        let first = svc.next_question(&key).unwrap();
        let outcome =
            play_attempt(&svc, &key, first, &mut Cursor::new(""), &mut Vec::new()).unwrap();
        assert_eq!(outcome, PlayOutcome::Quit);
    }

    #[test]
    fn again_prompt_accepts_yes_only() {
        assert!(ask_again(&mut Cursor::new("Y\n"), &mut Vec::new()).unwrap());
        assert!(!ask_again(&mut Cursor::new("nope\n"), &mut Vec::new()).unwrap());
        assert!(!ask_again(&mut Cursor::new(""), &mut Vec::new()).unwrap());
    }
}
