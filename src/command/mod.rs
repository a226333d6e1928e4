mod commands;
mod history;

pub use commands::{Command, CommandOutcome, HistoryPolicy};
pub use history::{History, HistoryEntry};
