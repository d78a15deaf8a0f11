use crate::config::{
    FILL_BLANK_COUNT, MAX_ARTICLE_WORDS, MIN_ARTICLE_WORDS, MULTIPLE_CHOICE_COUNT, NUM_QUESTIONS,
    PROMPT_WORD_LIMIT, TRUE_FALSE_COUNT, WORD_USAGE_THRESHOLD,
};
use crate::types::{GenerationRequest, Question};

const SYSTEM_ARTICLE: &str = include_str!("../prompts/system_article.txt");
const SYSTEM_EVALUATION: &str = include_str!("../prompts/system_evaluation.txt");

const JSON_ONLY: &str = "IMPORTANT: Return ONLY valid JSON, no other text.";

/// System and user prompt for a single backend call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    pub system: &'static str,
    pub user: String,
}

/// Build the prompt asking for an article and five questions.
pub fn build_article_prompt(request: &GenerationRequest) -> Prompt {
    let words = request.words();
    let mut word_list = words
        .iter()
        .take(PROMPT_WORD_LIMIT)
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(", ");
    if words.len() > PROMPT_WORD_LIMIT {
        word_list.push_str(&format!(
            " (and {} more words)",
            words.len() - PROMPT_WORD_LIMIT
        ));
    }

    let mut user = String::new();
    user.push_str(&format!(
        "Please generate an English reading article and {NUM_QUESTIONS} test questions based on the following information:\n\n"
    ));

    user.push_str("User Information:\n");
    user.push_str(&format!("- Age: {} years old\n", request.age()));
    user.push_str(&format!(
        "- Lexile Level: {} (grammar and sentence complexity indicator)\n\n",
        request.lexile_level()
    ));

    user.push_str(&format!("Word Bank: {word_list}\n\n"));

    let usage_percent = (WORD_USAGE_THRESHOLD * 100.0).round();
    user.push_str("Requirements:\n");
    user.push_str(&format!(
        "1. Article length: {MIN_ARTICLE_WORDS}-{MAX_ARTICLE_WORDS} words\n"
    ));
    user.push_str(&format!(
        "2. Must use at least {usage_percent}% of the {} words from the word bank\n",
        words.len()
    ));
    user.push_str("3. Grammar difficulty should match the Lexile level\n");
    user.push_str("4. Content should be age-appropriate, interesting, and educational\n\n");

    user.push_str(&format!("{NUM_QUESTIONS} Test Questions Requirements:\n"));
    user.push_str(&format!(
        "- {MULTIPLE_CHOICE_COUNT} multiple choice questions (4 options A/B/C/D)\n"
    ));
    user.push_str(&format!(
        "- {FILL_BLANK_COUNT} fill-in-the-blank questions (test vocabulary and grammar)\n"
    ));
    user.push_str(&format!("- {TRUE_FALSE_COUNT} true/false question\n\n"));

    user.push_str("Please return in JSON format:\n");
    user.push_str(
        r#"{
  "article": "article content here",
  "questions": [
    {
      "type": "multiple_choice",
      "question": "question text",
      "options": ["A. option1", "B. option2", "C. option3", "D. option4"],
      "correct_answer": "A"
    },
    {
      "type": "fill_blank",
      "question": "question text (use ___ for blank)",
      "correct_answer": "answer"
    },
    {
      "type": "true_false",
      "question": "question text",
      "correct_answer": true
    }
  ]
}
"#,
    );
    user.push('\n');
    user.push_str(JSON_ONLY);

    Prompt {
        system: SYSTEM_ARTICLE,
        user,
    }
}

/// Build the prompt asking for a grading of the learner's answers.
///
/// Pairs are formed positionally; surplus questions or answers are dropped.
pub fn build_evaluation_prompt(questions: &[Question], answers: &[String]) -> Prompt {
    let blocks: Vec<String> = questions
        .iter()
        .zip(answers)
        .enumerate()
        .map(|(i, (question, answer))| {
            format!(
                "Question {} ({}):\nQ: {}\nCorrect Answer: {}\nStudent Answer: {}\n",
                i + 1,
                question.question_type(),
                question.text(),
                question.correct_answer_text(),
                answer
            )
        })
        .collect();

    let mut user = String::new();
    user.push_str("Please evaluate the following answers:\n\n");
    user.push_str(&blocks.join("\n"));
    user.push('\n');

    user.push_str("Requirements:\n");
    user.push_str("1. Give a total score (out of 100)\n");
    user.push_str("2. Analyze each question (correct/incorrect)\n");
    user.push_str("3. Explain why answers are wrong\n");
    user.push_str("4. Provide learning suggestions\n\n");

    user.push_str("Return in JSON format:\n");
    user.push_str(
        r#"{
  "score": 80,
  "item_analysis": [
    {
      "question_num": 1,
      "correct": true,
      "feedback": "explanation"
    }
  ],
  "overall_feedback": "overall evaluation",
  "suggestions": "learning suggestions"
}
"#,
    );
    user.push('\n');
    user.push_str(JSON_ONLY);

    Prompt {
        system: SYSTEM_EVALUATION,
        user,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Choice;

    fn request(count: usize) -> GenerationRequest {
        let words: Vec<String> = (0..count).map(|i| format!("word{i}")).collect();
        GenerationRequest::new(&words, 10, 500).expect("request")
    }

    fn questions() -> Vec<Question> {
        vec![
            Question::MultipleChoice {
                question: "Where did Tom go?".into(),
                options: vec!["A. park".into(), "B. school".into(), "C. shop".into(), "D. home".into()],
                correct_answer: Choice::C,
            },
            Question::FillBlank {
                question: "The sky is ___.".into(),
                correct_answer: "blue".into(),
            },
            Question::TrueFalse {
                question: "Tom likes apples.".into(),
                correct_answer: true,
            },
        ]
    }

    #[test]
    fn test_article_prompt_lists_all_words_under_limit() {
        let prompt = build_article_prompt(&request(5));
        assert!(prompt.user.contains("Word Bank: word0, word1, word2, word3, word4\n"));
        assert!(!prompt.user.contains("more words"));
        assert!(prompt.user.contains("- Age: 10 years old"));
        assert!(prompt.user.contains("- Lexile Level: 500"));
        assert!(prompt.system.starts_with("You are a professional English teacher"));
    }

    #[test]
    fn test_article_prompt_truncates_long_word_bank() {
        let prompt = build_article_prompt(&request(60));
        assert!(prompt.user.contains("word49 (and 10 more words)"));
        assert!(!prompt.user.contains("word50,"));
        assert!(prompt.user.contains("at least 80% of the 60 words"));
    }

    #[test]
    fn test_article_prompt_is_deterministic() {
        assert_eq!(build_article_prompt(&request(12)), build_article_prompt(&request(12)));
    }

    #[test]
    fn test_article_prompt_requests_json_only() {
        let prompt = build_article_prompt(&request(5));
        assert!(prompt.user.ends_with("IMPORTANT: Return ONLY valid JSON, no other text."));
        assert!(prompt.user.contains("2 multiple choice questions"));
        assert!(prompt.user.contains("1 true/false question"));
    }

    #[test]
    fn test_evaluation_prompt_blocks_in_order() {
        let answers: Vec<String> = vec!["C".into(), "green".into(), "false".into()];
        let prompt = build_evaluation_prompt(&questions(), &answers);

        assert!(prompt.user.contains(
            "Question 1 (multiple_choice):\nQ: Where did Tom go?\nCorrect Answer: C\nStudent Answer: C\n"
        ));
        assert!(prompt.user.contains(
            "Question 2 (fill_blank):\nQ: The sky is ___.\nCorrect Answer: blue\nStudent Answer: green\n"
        ));
        assert!(prompt.user.contains("Question 3 (true_false):"));
        assert!(prompt.system.starts_with("You are a patient English teacher"));
    }

    #[test]
    fn test_evaluation_prompt_truncates_to_shorter() {
        let answers: Vec<String> = vec!["A".into()];
        let prompt = build_evaluation_prompt(&questions(), &answers);
        assert!(prompt.user.contains("Question 1 (multiple_choice)"));
        assert!(!prompt.user.contains("Question 2"));
    }
}
