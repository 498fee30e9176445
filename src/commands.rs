//! REPL command shortcuts
//!
//! Recognized before dispatch; matching is on the trimmed, lowercased line.

pub const HELP_TEXT: &str = "Available commands:\n\
/help or help - Show available commands\n\
/clear or clear - Clear session log\n\
/reset or reset - Reset conversation\n\
Type 'exit' to close the assistant.";

pub const GOODBYE: &str = "Goodbye! Happy coding!";
pub const LOG_CLEARED: &str = "Session log cleared.";
pub const HISTORY_RESET: &str = "Conversation history has been reset.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Exit,
    Help,
    ClearLog,
    ResetHistory,
}

impl Command {
    /// Returns `None` for input that should be dispatched.
    pub fn parse(input: &str) -> Option<Self> {
        match input.trim().to_lowercase().as_str() {
            "exit" | "quit" | "bye" => Some(Self::Exit),
            "/help" | "help" => Some(Self::Help),
            "/clear" | "clear" => Some(Self::ClearLog),
            "/reset" | "reset" => Some(Self::ResetHistory),
            _ => None,
        }
    }

    /// What the assistant says in response
    pub fn reply(self) -> &'static str {
        match self {
            Self::Exit => GOODBYE,
            Self::Help => HELP_TEXT,
            Self::ClearLog => LOG_CLEARED,
            Self::ResetHistory => HISTORY_RESET,
        }
    }
}
