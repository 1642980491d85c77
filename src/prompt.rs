//! Operator confirmation.
//!
//! Commands never read the terminal directly; they ask a [`Prompter`]. The CLI
//! injects a [`StdinPrompter`] for interactive use, or an [`AutoPrompter`] when
//! `--yes` or `--no-input` fixes the answer up front.

use std::io::{self, BufRead, Write};

use crate::Result;

/// Answers yes/no questions put by a command.
pub trait Prompter {
    fn confirm(&mut self, question: &str) -> Result<bool>;
}

/// Always gives the same answer without asking.
#[derive(Debug, Clone, Copy)]
pub struct AutoPrompter(pub bool);

impl Prompter for AutoPrompter {
    fn confirm(&mut self, question: &str) -> Result<bool> {
        tracing::debug!(question, answer = self.0, "auto-answered prompt");
        Ok(self.0)
    }
}

/// Asks on a writer and reads the answer from a line-oriented reader.
///
/// Only `y`/`yes` (any case) confirm. End of input declines.
pub struct LinePrompter<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> LinePrompter<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }
}

impl<R: BufRead, W: Write> Prompter for LinePrompter<R, W> {
    fn confirm(&mut self, question: &str) -> Result<bool> {
        write!(self.output, "{} [y/N] ", question)?;
        self.output.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            writeln!(self.output)?;
            return Ok(false);
        }
        Ok(matches!(line.trim().to_lowercase().as_str(), "y" | "yes"))
    }
}

/// Prompts on stderr so that stdout stays machine-readable.
pub type StdinPrompter = LinePrompter<io::StdinLock<'static>, io::Stderr>;

impl StdinPrompter {
    pub fn stdin() -> Self {
        LinePrompter::new(io::stdin().lock(), io::stderr())
    }
}
