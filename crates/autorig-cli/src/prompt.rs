//! Interactive confirmation on the terminal.

use autorig_assembly::{Decision, Prompter, RigError};
use autorig_spec::StageError;
use colored::Colorize;
use std::io::{BufRead, Write};

/// Asks questions on `output` and reads answers from `input`.
///
/// Only an explicit `y` or `yes` proceeds; anything else, including end of
/// input, cancels.
pub struct TerminalPrompter<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> TerminalPrompter<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    fn ask(&mut self, question: &str) -> std::io::Result<Decision> {
        write!(self.output, "{} [y/N] ", question)?;
        self.output.flush()?;
        let mut line = String::new();
        self.input.read_line(&mut line)?;
        Ok(match line.trim().to_ascii_lowercase().as_str() {
            "y" | "yes" => Decision::Proceed,
            _ => Decision::Cancel,
        })
    }
}

impl TerminalPrompter<std::io::StdinLock<'static>, std::io::Stderr> {
    /// Prompts on stderr so JSON output on stdout stays clean.
    pub fn stdio() -> Self {
        Self::new(std::io::stdin().lock(), std::io::stderr())
    }
}

impl<R: BufRead, W: Write> Prompter for TerminalPrompter<R, W> {
    fn confirm_invalid_names(&mut self, names: &[String]) -> Decision {
        let _ = writeln!(
            self.output,
            "{} {} part(s) carry no body region token:",
            "!".yellow(),
            names.len()
        );
        for name in names {
            let _ = writeln!(self.output, "  - {}", name);
        }
        match self.ask("No joints will be created for them. Continue?") {
            Ok(decision) => decision,
            Err(e) => {
                log::warn!("Could not read answer: {}", e);
                Decision::Cancel
            }
        }
    }

    fn warn(&mut self, error: &RigError) {
        let _ = writeln!(
            self.output,
            "{} [{}] {}",
            "warning".yellow().bold(),
            error.code(),
            error
        );
    }
}
