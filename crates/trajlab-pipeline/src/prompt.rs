//! Prompter trait and built-in implementations for operator interaction.
//!
//! Both interactive decision points (the skip gate and the launch menu) go
//! through this trait so tests can drive the state machine without a
//! console.

use async_trait::async_trait;

use trajlab_types::{Result, TrajlabError};

/// A prompt shown to the operator: free text, optionally with an
/// enumerated choice list rendered as `[n]` lines.
#[derive(Debug, Clone)]
pub struct Question {
    pub prompt: String,
    pub choices: Vec<String>,
}

#[async_trait]
pub trait Prompter: Send + Sync {
    /// Ask once and return the operator's raw (trimmed) reply. Callers are
    /// responsible for interpreting it; invalid input must never re-prompt.
    async fn ask(&self, question: &Question) -> Result<String>;
}

// ---------------------------------------------------------------------------
// ConsolePrompter
// ---------------------------------------------------------------------------

pub struct ConsolePrompter;

#[async_trait]
impl Prompter for ConsolePrompter {
    async fn ask(&self, question: &Question) -> Result<String> {
        println!("\n{}", question.prompt);
        for (i, choice) in question.choices.iter().enumerate() {
            println!("  [{}] {}", i + 1, choice);
        }
        let mut input = String::new();
        std::io::stdin()
            .read_line(&mut input)
            .map_err(TrajlabError::Io)?;
        Ok(input.trim().to_string())
    }
}

// ---------------------------------------------------------------------------
// ScriptedPrompter
// ---------------------------------------------------------------------------

/// Plays back preset answers and records every question, for tests.
/// When the script runs dry it answers with an empty string, which every
/// caller treats as a decline.
pub struct ScriptedPrompter {
    answers: std::sync::Mutex<Vec<String>>,
    questions: std::sync::Mutex<Vec<Question>>,
}

impl ScriptedPrompter {
    pub fn new(answers: &[&str]) -> Self {
        let mut reversed: Vec<String> = answers.iter().map(|a| a.to_string()).collect();
        reversed.reverse();
        Self {
            answers: std::sync::Mutex::new(reversed),
            questions: std::sync::Mutex::new(Vec::new()),
        }
    }

    pub fn questions(&self) -> Vec<Question> {
        self.questions.lock().unwrap().clone()
    }
}

#[async_trait]
impl Prompter for ScriptedPrompter {
    async fn ask(&self, question: &Question) -> Result<String> {
        self.questions.lock().unwrap().push(question.clone());
        Ok(self.answers.lock().unwrap().pop().unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn scripted_plays_back_answers_in_order() {
        let prompter = ScriptedPrompter::new(&["y", "4"]);

        let q = Question {
            prompt: "Skip data generation and training? (y/n)".into(),
            choices: vec![],
        };
        assert_eq!(prompter.ask(&q).await.unwrap(), "y");
        assert_eq!(prompter.ask(&q).await.unwrap(), "4");
        // Exhausted: empty answer, which callers treat as a decline.
        assert_eq!(prompter.ask(&q).await.unwrap(), "");
    }

    #[tokio::test]
    async fn scripted_records_questions() {
        let prompter = ScriptedPrompter::new(&["1"]);
        let q = Question {
            prompt: "Select application to launch (1-5)".into(),
            choices: vec!["Web Simulator".into()],
        };
        prompter.ask(&q).await.unwrap();

        let recorded = prompter.questions();
        assert_eq!(recorded.len(), 1);
        assert_eq!(recorded[0].prompt, "Select application to launch (1-5)");
        assert_eq!(recorded[0].choices, vec!["Web Simulator"]);
    }
}
