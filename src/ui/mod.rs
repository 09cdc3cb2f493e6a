//! User interface module - confirmation gate and formatting.
//!
//! Separates concerns:
//! - `formatter` - Pure formatting functions
//! - This module - The acknowledgment gate in front of destructive pushes

use std::io::Write;

use console::{style, Key, Term};

use crate::error::Result;

pub mod formatter;

// Re-export formatter functions for convenience
pub use formatter::{
    display_branch_created, display_command, display_completion, display_conflict_help,
    display_error, display_manual_push_instruction, display_plan, display_status,
    display_success, display_version_decision, display_warning,
};

/// Acknowledgment required before a forced or bulk push.
pub trait ConfirmGate {
    /// Block until the operator answers; `true` means go ahead.
    fn confirm(&self, prompt: &str) -> Result<bool>;
}

/// Gate that waits for a single key press on the terminal.
///
/// `y` or Enter confirms; any other key declines. There is no timeout.
pub struct TerminalGate {
    term: Term,
}

impl TerminalGate {
    pub fn new() -> Self {
        TerminalGate {
            term: Term::stdout(),
        }
    }
}

impl Default for TerminalGate {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfirmGate for TerminalGate {
    fn confirm(&self, prompt: &str) -> Result<bool> {
        print!("\n{} {} ", style(prompt).bold(), style("[Y/n]").dim());
        std::io::stdout().flush()?;

        let key = self.term.read_key()?;
        let confirmed = matches!(key, Key::Enter | Key::Char('y') | Key::Char('Y'));
        println!("{}", if confirmed { "yes" } else { "no" });
        Ok(confirmed)
    }
}

/// Gate for non-interactive runs (`--yes`).
pub struct AutoConfirm;

impl ConfirmGate for AutoConfirm {
    fn confirm(&self, prompt: &str) -> Result<bool> {
        display_status(&format!("{} (auto-confirmed)", prompt));
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auto_confirm_always_agrees() {
        assert!(AutoConfirm.confirm("Push main, develop with tags?").unwrap());
    }
}
