//! Detached external processes: workspace hooks and helper scripts.
//!
//! Commands run through `sh -c` so user templates may use pipes and
//! quoting.  A waiter thread reaps each child and logs a failing exit; it
//! touches no engine state.

use crate::traits::Launcher;
use log::{debug, error, warn};
use std::process::{Command, Stdio};

/// Substitute `{name}`, `{monitor}` and `{id}` in a hook template.  Name
/// and monitor are shell-quoted.
pub fn render_hook(template: &str, name: &str, monitor: &str, id: i32) -> String {
    template
        .replace("{name}", &shell_quote(name))
        .replace("{monitor}", &shell_quote(monitor))
        .replace("{id}", &id.to_string())
}

/// Quote `arg` for inclusion in a `sh -c` command line.
pub fn shell_quote(arg: &str) -> String {
    format!("'{}'", arg.replace('\'', r"'\''"))
}

/// `<script> <arg>` with the argument quoted.
pub fn script_command(script: &str, arg: &str) -> String {
    format!("{script} {}", shell_quote(arg))
}

/// [`Launcher`] that spawns `sh -c <command>`.
#[derive(Debug, Default, Clone, Copy)]
pub struct ShellLauncher;

impl Launcher for ShellLauncher {
    fn launch(&self, command: &str, label: &str) {
        if command.trim().is_empty() {
            return;
        }
        debug!("{label}: running {command:?}");
        let child = Command::new("sh")
            .arg("-c")
            .arg(command)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .spawn();
        let mut child = match child {
            Ok(child) => child,
            Err(e) => {
                error!("{label}: failed to spawn {command:?}: {e}");
                return;
            }
        };

        let label = label.to_string();
        let command = command.to_string();
        let waiter = std::thread::Builder::new()
            .name(format!("wait-{label}"))
            .spawn({
                let label = label.clone();
                move || match child.wait() {
                    Ok(status) if status.success() => {}
                    Ok(status) => warn!("{label}: {command:?} exited with {status}"),
                    Err(e) => warn!("{label}: waiting for {command:?} failed: {e}"),
                }
            });
        if let Err(e) = waiter {
            warn!("{label}: cannot spawn waiter thread: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hook_placeholders() {
        assert_eq!(
            render_hook("notify {name} on {monitor} ({id})", ".web2", "DP-1", 12),
            "notify '.web2' on 'DP-1' (12)"
        );
        assert_eq!(render_hook("plain", "x", "y", 1), "plain");
    }

    #[test]
    fn hook_names_cannot_inject_commands() {
        let line = render_hook("echo {name}", "a;touch pwned", "DP-1", 4);
        assert_eq!(line, "echo 'a;touch pwned'");
    }

    #[test]
    fn quoting_survives_single_quotes() {
        assert_eq!(shell_quote("web"), "'web'");
        assert_eq!(shell_quote("it's"), r"'it'\''s'");
        assert_eq!(script_command("remove", ".web2"), "remove '.web2'");
    }

    #[test]
    fn launching_runs_the_command() {
        let dir = tempfile::tempdir().unwrap();
        let marker = dir.path().join("ran");
        ShellLauncher.launch(&format!("touch {}", shell_quote(&marker.to_string_lossy())), "test");
        for _ in 0..100 {
            if marker.exists() {
                break;
            }
            std::thread::sleep(std::time::Duration::from_millis(20));
        }
        assert!(marker.exists());
    }

    #[test]
    fn blank_commands_are_skipped() {
        ShellLauncher.launch("   ", "blank");
    }
}
