//! Device actions driven by shell commands

use std::process::Command;

use acsched_core::ActionSink;
use acsched_types::TimerAction;

use crate::config::AppConfig;

/// Runs the configured on/off command for each fired action.
///
/// Commands run on their own thread so the action processor is never held
/// up by a slow device.
#[derive(Debug, Clone, Default)]
pub struct ShellSink {
    on_command: Option<String>,
    off_command: Option<String>,
}

impl ShellSink {
    pub fn new(on_command: Option<String>, off_command: Option<String>) -> Self {
        Self {
            on_command,
            off_command,
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(config.on_command.clone(), config.off_command.clone())
    }

    fn command_for(&self, action: TimerAction) -> Option<&str> {
        match action {
            TimerAction::On => self.on_command.as_deref(),
            TimerAction::Off => self.off_command.as_deref(),
        }
    }
}

impl ActionSink for ShellSink {
    fn fire(&self, action: TimerAction) {
        println!("\n>> device {action}");

        let Some(command) = self.command_for(action) else {
            tracing::debug!(%action, "No command configured for action");
            return;
        };

        let command = command.to_string();
        std::thread::spawn(move || match shell(&command).status() {
            Ok(status) if status.success() => {
                tracing::debug!(%action, command, "Action command finished");
            }
            Ok(status) => {
                tracing::warn!(%action, command, code = ?status.code(), "Action command failed");
            }
            Err(e) => {
                tracing::error!(%action, command, error = %e, "Failed to run action command");
            }
        });
    }
}

#[cfg(windows)]
fn shell(command: &str) -> Command {
    let mut cmd = Command::new("cmd");
    cmd.args(["/C", command]);
    cmd
}

#[cfg(not(windows))]
fn shell(command: &str) -> Command {
    let mut cmd = Command::new("sh");
    cmd.args(["-c", command]);
    cmd
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn picks_command_by_action() {
        let sink = ShellSink::new(Some("ir-send power_on".into()), None);
        assert_eq!(sink.command_for(TimerAction::On), Some("ir-send power_on"));
        assert_eq!(sink.command_for(TimerAction::Off), None);
    }
}
