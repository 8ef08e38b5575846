//! User interaction behind command handlers
//!
//! Handlers ask for confirmation, request a short free-text value and report
//! outcomes through [`Interaction`]. The terminal implementation blocks on
//! stdin; [`Scripted`] replays queued answers and records what was shown.

use std::collections::VecDeque;
use std::io::{self, BufRead, Write};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Success(String),
    Error(String),
}

impl Notice {
    pub fn message(&self) -> &str {
        match self {
            Notice::Success(msg) | Notice::Error(msg) => msg,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Notice::Error(_))
    }
}

pub trait Interaction {
    /// Ask a yes/no question
    fn confirm(&mut self, question: &str) -> bool;

    /// Ask for a value; `None` when the user cancels
    fn ask(&mut self, prompt: &str) -> Option<String>;

    fn notify(&mut self, notice: Notice);
}

/// Interaction over stdin/stdout
#[derive(Debug, Default)]
pub struct Terminal {
    assume_yes: bool,
}

impl Terminal {
    /// With `assume_yes` every confirmation is accepted without asking
    pub fn new(assume_yes: bool) -> Self {
        Self { assume_yes }
    }

    fn read_line(prompt: &str) -> Option<String> {
        print!("{}", prompt);
        io::stdout().flush().ok()?;

        let mut line = String::new();
        match io::stdin().lock().read_line(&mut line) {
            Ok(0) | Err(_) => None,
            Ok(_) => Some(line.trim_end_matches(&['\r', '\n'][..]).to_string()),
        }
    }
}

impl Interaction for Terminal {
    fn confirm(&mut self, question: &str) -> bool {
        if self.assume_yes {
            return true;
        }
        Self::read_line(&format!("{} [y/N] ", question))
            .map(|answer| matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"))
            .unwrap_or(false)
    }

    fn ask(&mut self, prompt: &str) -> Option<String> {
        Self::read_line(&format!("{} ", prompt))
    }

    fn notify(&mut self, notice: Notice) {
        match notice {
            Notice::Success(msg) => println!("Success: {}", msg),
            Notice::Error(msg) => eprintln!("Error: {}", msg),
        }
    }
}

/// Replays queued answers and records prompts and notices
///
/// Confirmations without a queued answer are declined and questions without
/// one are cancelled, so a `Scripted` with nothing queued never performs a
/// destructive action.
#[derive(Debug, Default)]
pub struct Scripted {
    confirmations: VecDeque<bool>,
    answers: VecDeque<String>,
    prompts: Vec<String>,
    notices: Vec<Notice>,
}

impl Scripted {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn confirming(mut self, answer: bool) -> Self {
        self.confirmations.push_back(answer);
        self
    }

    pub fn answering(mut self, answer: impl Into<String>) -> Self {
        self.answers.push_back(answer.into());
        self
    }

    pub fn push_answer(&mut self, answer: impl Into<String>) {
        self.answers.push_back(answer.into());
    }

    /// Every question and prompt shown so far
    pub fn prompts(&self) -> &[String] {
        &self.prompts
    }

    pub fn notices(&self) -> &[Notice] {
        &self.notices
    }

    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    pub fn last_notice(&self) -> Option<&Notice> {
        self.notices.last()
    }
}

impl Interaction for Scripted {
    fn confirm(&mut self, question: &str) -> bool {
        self.prompts.push(question.to_string());
        self.confirmations.pop_front().unwrap_or(false)
    }

    fn ask(&mut self, prompt: &str) -> Option<String> {
        self.prompts.push(prompt.to_string());
        self.answers.pop_front()
    }

    fn notify(&mut self, notice: Notice) {
        self.notices.push(notice);
    }
}
