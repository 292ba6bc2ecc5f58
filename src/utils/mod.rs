/// Shared utilities
pub mod command;

pub use command::{check_tool_installed, CommandError, CommandOutput, CommandRunner, ProcessRunner};
