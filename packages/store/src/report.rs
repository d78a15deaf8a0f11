//! Markdown rendering of saved test logs.

use readcoach_core::config::MAX_SCORE;
use readcoach_core::types::{TestLog, LOG_TIMESTAMP_FORMAT};

/// Render a score without a trailing `.0` for whole numbers.
pub fn format_score(score: f64) -> String {
    if score.fract() == 0.0 {
        format!("{score:.0}")
    } else {
        format!("{score:.1}")
    }
}

/// One-line summary used in history listings.
pub fn format_summary(log: &TestLog) -> String {
    format!(
        "{}  {}/{}",
        log.timestamp.format(LOG_TIMESTAMP_FORMAT),
        format_score(log.score),
        format_score(MAX_SCORE)
    )
}

/// Full markdown report of a single test.
pub fn format_log(log: &TestLog) -> String {
    let mut out: Vec<String> = Vec::new();

    out.push(format!(
        "# Test Log - {}",
        log.timestamp.format(LOG_TIMESTAMP_FORMAT)
    ));
    out.push(format!(
        "\n**Score: {}/{}**\n",
        format_score(log.score),
        format_score(MAX_SCORE)
    ));

    out.push("## Article".into());
    out.push(log.article.clone());

    out.push("\n## Questions and Answers".into());
    for (i, (question, answer)) in log.questions.iter().zip(&log.user_answers).enumerate() {
        out.push(format!("\n### Question {}", i + 1));
        out.push(format!("**Type:** {}", question.question_type()));
        out.push(format!("**Question:** {}", question.text()));

        if let Some(options) = question.options() {
            out.push("**Options:**".into());
            for option in options {
                out.push(format!("  - {option}"));
            }
        }

        out.push(format!("**Your Answer:** {answer}"));
        out.push(format!("**Correct Answer:** {}", question.correct_answer_text()));

        if let Some(analysis) = log.item_analysis.get(i) {
            let status = if analysis.correct {
                "✓ Correct"
            } else {
                "✗ Incorrect"
            };
            out.push(format!("**Result:** {status}"));
            if !analysis.feedback.is_empty() {
                out.push(format!("**Feedback:** {}", analysis.feedback));
            }
        }
    }

    out.push("\n## Overall Feedback".into());
    out.push(log.overall_feedback.clone());

    out.push("\n## Suggestions".into());
    out.push(log.suggestions.clone());

    out.join("\n")
}
