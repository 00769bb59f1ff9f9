//! Line-based operator I/O.

use std::collections::VecDeque;
use std::io::{BufRead, IsTerminal, Write};

use kleanup_core::KleanupError;

/// Where the session reads answers and writes listings.
pub trait Console {
    /// Show a prompt and read one line of response, without the newline.
    fn ask(&mut self, prompt: &str) -> Result<String, KleanupError>;

    /// Read a response that must not be echoed back or logged.
    fn ask_secret(&mut self, prompt: &str) -> Result<String, KleanupError> {
        self.ask(prompt)
    }

    /// Print one line.
    fn show(&mut self, line: &str) -> Result<(), KleanupError>;
}

/// Console on stdin/stdout.
#[derive(Debug, Default)]
pub struct TerminalConsole;

impl TerminalConsole {
    /// Create a terminal console.
    pub fn new() -> Self {
        Self
    }
}

fn stdio_error(e: std::io::Error) -> KleanupError {
    KleanupError::io("<stdio>", e)
}

impl Console for TerminalConsole {
    fn ask(&mut self, prompt: &str) -> Result<String, KleanupError> {
        let mut stdout = std::io::stdout().lock();
        write!(stdout, "{prompt}").map_err(stdio_error)?;
        stdout.flush().map_err(stdio_error)?;

        let mut line = String::new();
        std::io::stdin()
            .lock()
            .read_line(&mut line)
            .map_err(stdio_error)?;
        Ok(line.trim_end_matches(['\r', '\n']).to_string())
    }

    fn ask_secret(&mut self, prompt: &str) -> Result<String, KleanupError> {
        if std::io::stdin().is_terminal() {
            return rpassword::prompt_password(prompt).map_err(stdio_error);
        }
        read_secret(prompt, &mut std::io::stdin().lock(), &mut std::io::stdout().lock())
            .map_err(stdio_error)
    }

    fn show(&mut self, line: &str) -> Result<(), KleanupError> {
        writeln!(std::io::stdout().lock(), "{line}").map_err(stdio_error)
    }
}

/// Prompt on `output` and read a secret line from non-terminal `input`.
///
/// The answer is never written back to `output`.
fn read_secret(
    prompt: &str,
    input: &mut impl BufRead,
    output: &mut impl Write,
) -> std::io::Result<String> {
    write!(output, "{prompt}")?;
    output.flush()?;
    rpassword::read_password_from_bufread(input)
}

/// Console fed from canned answers, recording everything shown.
///
/// Once the answers run out every further question gets an empty line.
#[derive(Debug, Default)]
pub struct ScriptedConsole {
    answers: VecDeque<String>,
    transcript: Vec<String>,
}

impl ScriptedConsole {
    /// Create a console that will give `answers` in order.
    pub fn new<I, S>(answers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            answers: answers.into_iter().map(Into::into).collect(),
            transcript: Vec::new(),
        }
    }

    /// Everything shown or asked so far, one entry per line or prompt.
    pub fn transcript(&self) -> &[String] {
        &self.transcript
    }

    /// Answers not yet consumed.
    pub fn remaining(&self) -> usize {
        self.answers.len()
    }
}

impl Console for ScriptedConsole {
    fn ask(&mut self, prompt: &str) -> Result<String, KleanupError> {
        self.transcript.push(prompt.to_string());
        Ok(self.answers.pop_front().unwrap_or_default())
    }

    fn show(&mut self, line: &str) -> Result<(), KleanupError> {
        self.transcript.push(line.to_string());
        Ok(())
    }
}
