//! In-memory question pool.

use anyhow::{Context, Result};
use contact_common::ContactError;
use rand::Rng;
use rand::seq::SliceRandom;
use serde::Deserialize;
use std::path::Path;

/// A question as stored in the question file
#[derive(Debug, Clone, Deserialize)]
pub struct Question {
    pub question: String,
    pub answers: Vec<String>,
    /// Index of the correct entry in `answers`
    pub correct: usize,
}

/// One issued challenge
#[derive(Debug, Clone)]
pub struct Challenge {
    pub question: String,
    /// Answers in a fresh random order
    pub answers: Vec<String>,
    pub correct: String,
}

/// Fixed set of questions loaded at startup
#[derive(Debug)]
pub struct QuestionBank {
    questions: Vec<Question>,
}

impl QuestionBank {
    /// Validate and wrap a question set
    pub fn new(questions: Vec<Question>) -> Result<Self, ContactError> {
        if questions.is_empty() {
            return Err(ContactError::Config("question set is empty".into()));
        }
        for (i, q) in questions.iter().enumerate() {
            if q.answers.is_empty() {
                return Err(ContactError::Config(format!("question {i} has no answers")));
            }
            if q.correct >= q.answers.len() {
                return Err(ContactError::Config(format!(
                    "question {i}: correct index {} out of range ({} answers)",
                    q.correct,
                    q.answers.len()
                )));
            }
        }
        Ok(Self { questions })
    }

    /// Load a JSON array of questions
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let data = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read question file {}", path.display()))?;
        let questions: Vec<Question> =
            serde_json::from_str(&data).context("Failed to parse question file")?;
        Ok(Self::new(questions)?)
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    /// Pick a question uniformly at random and shuffle its answers
    pub fn pick(&self) -> Challenge {
        let mut rng = rand::rng();
        let q = &self.questions[rng.random_range(0..self.questions.len())];

        let mut answers = q.answers.clone();
        let correct = answers[q.correct].clone();
        answers.shuffle(&mut rng);

        Challenge {
            question: q.question.clone(),
            answers,
            correct,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn question(text: &str, answers: &[&str], correct: usize) -> Question {
        Question {
            question: text.to_string(),
            answers: answers.iter().map(|a| a.to_string()).collect(),
            correct,
        }
    }

    #[test]
    fn test_pick_returns_consistent_challenge() {
        let bank = QuestionBank::new(vec![
            question("Capital of France?", &["Paris", "Rome", "Oslo"], 0),
            question("2 + 2?", &["3", "4", "5"], 1),
        ])
        .unwrap();

        for _ in 0..50 {
            let c = bank.pick();
            let expected = if c.question == "2 + 2?" { "4" } else { "Paris" };
            assert_eq!(c.correct, expected);
            assert_eq!(c.answers.len(), 3);
            assert!(c.answers.contains(&c.correct));
        }
    }

    #[test]
    fn test_answers_get_shuffled() {
        let bank =
            QuestionBank::new(vec![question("Pick", &["a", "b", "c", "d", "e"], 2)]).unwrap();
        let orders: HashSet<Vec<String>> = (0..100).map(|_| bank.pick().answers).collect();
        assert!(orders.len() > 1);
    }

    #[test]
    fn test_all_questions_reachable() {
        let bank = QuestionBank::new(vec![
            question("one", &["x"], 0),
            question("two", &["x"], 0),
            question("three", &["x"], 0),
        ])
        .unwrap();
        let seen: HashSet<String> = (0..200).map(|_| bank.pick().question).collect();
        assert_eq!(seen.len(), 3);
    }

    #[test]
    fn test_rejects_bad_sets() {
        assert!(matches!(QuestionBank::new(vec![]), Err(ContactError::Config(_))));
        assert!(QuestionBank::new(vec![question("q", &[], 0)]).is_err());
        assert!(QuestionBank::new(vec![question("q", &["a", "b"], 2)]).is_err());
    }

    #[test]
    fn test_load_from_file() {
        let path = std::env::temp_dir().join(format!("questions-{}.json", std::process::id()));
        std::fs::write(
            &path,
            r#"[{"question": "Sky colour?", "answers": ["Green", "Blue"], "correct": 1}]"#,
        )
        .unwrap();

        let bank = QuestionBank::load(&path).unwrap();
        assert_eq!(bank.len(), 1);
        assert_eq!(bank.pick().correct, "Blue");

        std::fs::write(&path, "[]").unwrap();
        assert!(QuestionBank::load(&path).is_err());
        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_bundled_questions_are_valid() {
        let path = concat!(env!("CARGO_MANIFEST_DIR"), "/../../config/questions.json");
        let bank = QuestionBank::load(path).unwrap();
        assert!(bank.len() > 0);
    }
}
