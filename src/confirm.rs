//! Confirmation gates in front of destructive steps.

use anyhow::{Context, Result};
use std::collections::VecDeque;
use std::io::{self, BufRead, Write};

/// The word a user must type to let a gate pass
pub const AFFIRMATIVE: &str = "yes";

/// Something that can approve or decline a destructive step
pub trait Confirm {
    fn confirm(&mut self, prompt: &str) -> Result<bool>;
}

/// Interactive prompt: writes the question and reads one line. Only an exact `yes`
/// passes; anything else, including end of input, declines.
pub struct Prompt<R, W> {
    input: R,
    output: W,
}

impl Prompt<io::StdinLock<'static>, io::Stdout> {
    pub fn stdio() -> Self {
        Prompt::new(io::stdin().lock(), io::stdout())
    }
}

impl<R: BufRead, W: Write> Prompt<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Prompt { input, output }
    }
}

impl<R: BufRead, W: Write> Confirm for Prompt<R, W> {
    fn confirm(&mut self, prompt: &str) -> Result<bool> {
        writeln!(self.output, "{}", prompt).context("Failed to write prompt")?;
        writeln!(self.output, "Type '{}' to continue:", AFFIRMATIVE)
            .context("Failed to write prompt")?;
        self.output.flush().context("Failed to flush prompt")?;

        let mut line = String::new();
        self.input
            .read_line(&mut line)
            .context("Failed to read confirmation")?;
        Ok(line.trim_end_matches(['\r', '\n']) == AFFIRMATIVE)
    }
}

/// Approves every gate (`--yes`)
#[derive(Debug, Default, Clone, Copy)]
pub struct AssumeYes;

impl Confirm for AssumeYes {
    fn confirm(&mut self, prompt: &str) -> Result<bool> {
        log::debug!("auto-confirmed: {}", prompt);
        Ok(true)
    }
}

/// Answers from a fixed list and records every prompt it was shown. Once the answers
/// run out it declines.
#[derive(Debug, Default)]
pub struct ScriptedConfirm {
    answers: VecDeque<bool>,
    pub prompts: Vec<String>,
}

impl ScriptedConfirm {
    pub fn new(answers: impl IntoIterator<Item = bool>) -> Self {
        ScriptedConfirm {
            answers: answers.into_iter().collect(),
            prompts: Vec::new(),
        }
    }
}

impl Confirm for ScriptedConfirm {
    fn confirm(&mut self, prompt: &str) -> Result<bool> {
        self.prompts.push(prompt.to_string());
        Ok(self.answers.pop_front().unwrap_or(false))
    }
}
