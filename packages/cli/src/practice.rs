//! Interactive practice loop: generate, show, collect answers, grade.

use std::io::{BufRead, Write};
use std::time::Duration;

use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use readcoach_core::types::{GenerationResult, Question, QuestionType, TestLog};
use readcoach_core::PracticeSession;
use readcoach_store::format_log;

use crate::error::Result;

fn spinner(show_progress: bool) -> ProgressBar {
    if !show_progress {
        return ProgressBar::hidden();
    }
    let pb = ProgressBar::new_spinner();
    #[allow(clippy::expect_used)] // Static template string that is guaranteed to be valid
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .expect("valid template"),
    );
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

fn answer_hint(question: &Question) -> &'static str {
    match question.question_type() {
        QuestionType::MultipleChoice => "A/B/C/D",
        QuestionType::FillBlank => "word",
        QuestionType::TrueFalse => "true/false",
    }
}

fn type_label(question: &Question) -> &'static str {
    match question.question_type() {
        QuestionType::MultipleChoice => "Multiple choice",
        QuestionType::FillBlank => "Fill in the blank",
        QuestionType::TrueFalse => "True or false",
    }
}

/// Print the article and its questions.
pub fn render_test<W: Write>(content: &GenerationResult, out: &mut W) -> Result<()> {
    writeln!(out, "{}", style("Article").bold().underlined())?;
    writeln!(out)?;
    writeln!(out, "{}", content.article)?;
    writeln!(out)?;
    writeln!(out, "{}", style("Questions").bold().underlined())?;

    for (i, question) in content.questions.iter().enumerate() {
        writeln!(out)?;
        writeln!(
            out,
            "{} {} {}",
            style(format!("{}.", i + 1)).bold(),
            style(format!("[{}]", type_label(question))).dim(),
            question.text()
        )?;
        if let Some(options) = question.options() {
            for option in options {
                writeln!(out, "     {option}")?;
            }
        }
    }
    writeln!(out)?;
    Ok(())
}

/// Read one answer per question. End of input counts as an empty answer.
pub fn read_answers<R: BufRead, W: Write>(
    questions: &[Question],
    input: &mut R,
    out: &mut W,
) -> Result<Vec<String>> {
    let mut answers = Vec::with_capacity(questions.len());
    for (i, question) in questions.iter().enumerate() {
        write!(
            out,
            "{} ({}): ",
            style(format!("Answer {}", i + 1)).cyan(),
            answer_hint(question)
        )?;
        out.flush()?;

        let mut line = String::new();
        input.read_line(&mut line)?;
        answers.push(line.trim().to_string());
    }
    writeln!(out)?;
    Ok(answers)
}

/// Run one full practice round and return the saved log.
///
/// Returns `None` when generation or grading gave up; nothing is saved then.
pub fn run_practice<R: BufRead, W: Write>(
    session: &mut PracticeSession<'_>,
    input: &mut R,
    out: &mut W,
    show_progress: bool,
) -> Result<Option<TestLog>> {
    let pb = spinner(show_progress);
    pb.set_message("Generating article and questions...");
    let generated = session.generate();
    pb.finish_and_clear();

    let Some(content) = generated?.cloned() else {
        writeln!(
            out,
            "{} could not generate a valid test, please try again",
            style("Failed:").red().bold()
        )?;
        return Ok(None);
    };

    render_test(&content, out)?;
    let answers = read_answers(&content.questions, input, out)?;

    let pb = spinner(show_progress);
    pb.set_message("Grading your answers...");
    let submitted = session.submit(&answers);
    pb.finish_and_clear();

    let Some(log) = submitted? else {
        writeln!(
            out,
            "{} could not grade the answers, please try again",
            style("Failed:").red().bold()
        )?;
        return Ok(None);
    };

    writeln!(out, "{}", format_log(&log))?;
    writeln!(out)?;
    writeln!(out, "{}", style("Test saved.").green().bold())?;
    Ok(Some(log))
}

#[cfg(test)]
mod tests {
    use super::*;
    use readcoach_core::test_support::{
        valid_article_json, valid_evaluation_json, MemoryStore, MockBackend,
    };
    use readcoach_core::{PracticeStore, WordBank};
    use std::io::Cursor;

    fn store() -> MemoryStore {
        let store = MemoryStore::new();
        store
            .save_words(
                "alice",
                &WordBank::from_words(["cat", "river", "tree", "small", "fish"]),
            )
            .expect("save words");
        store
    }

    #[test]
    fn test_practice_round() {
        let store = store();
        let article = valid_article_json();
        let evaluation = valid_evaluation_json();
        let backend = MockBackend::with_replies(vec![article.as_str(), evaluation.as_str()]);
        let mut session = PracticeSession::new("alice", &backend, &store);

        let mut input = Cursor::new("A\nC\nsmall\nriver\nfalse\n");
        let mut out = Vec::new();
        let log = run_practice(&mut session, &mut input, &mut out, false)
            .expect("practice")
            .expect("log");

        assert_eq!(log.user_answers, ["A", "C", "small", "river", "false"]);
        assert_eq!(log.score, 85.0);
        assert_eq!(store.list_logs("alice").expect("logs").len(), 1);

        let text = String::from_utf8(out).expect("utf8");
        assert!(text.contains("Tom has a small cat."));
        assert!(text.contains("A. To the river"));
        assert!(text.contains("**Score: 85/100**"));
        assert!(text.contains("Test saved."));
    }

    #[test]
    fn test_short_input_gives_empty_answers() {
        let questions: Vec<Question> = vec![
            Question::FillBlank {
                question: "The ___ is blue.".into(),
                correct_answer: "sky".into(),
            },
            Question::TrueFalse {
                question: "Fish can fly.".into(),
                correct_answer: false,
            },
        ];
        let mut input = Cursor::new("  sky  \n");
        let mut out = Vec::new();

        let answers = read_answers(&questions, &mut input, &mut out).expect("answers");
        assert_eq!(answers, ["sky", ""]);
        let text = String::from_utf8(out).expect("utf8");
        assert!(text.contains("(true/false)"));
    }

    #[test]
    fn test_generation_failure_reported() {
        let store = store();
        let backend = MockBackend::with_replies(vec!["no", "no", "no"]);
        let mut session = PracticeSession::new("alice", &backend, &store);

        let mut input = Cursor::new("");
        let mut out = Vec::new();
        let result = run_practice(&mut session, &mut input, &mut out, false).expect("practice");

        assert!(result.is_none());
        let text = String::from_utf8(out).expect("utf8");
        assert!(text.contains("could not generate a valid test"));
        assert!(store.list_logs("alice").expect("logs").is_empty());
    }
}
