use super::run_result;
use itemkit::{Error, Node, Result, RunResult};
use std::process::{Command, Stdio};

/// Result code ssh uses for its own failures
const SSH_ERROR: i32 = 255;

/// Runs commands on a remote host through the `ssh` client
///
/// BatchMode is always on: a host that would prompt for a password is a
/// transport failure, not a hang.
#[derive(Debug)]
pub struct SshNode {
    name: String,
    hostname: String,
    user: Option<String>,
    port: Option<u16>,
}

impl SshNode {
    pub fn new(name: &str, hostname: &str, user: Option<&str>, port: Option<u16>) -> Self {
        Self {
            name: name.to_string(),
            hostname: hostname.to_string(),
            user: user.map(str::to_string),
            port,
        }
    }

    fn destination(&self) -> String {
        match &self.user {
            Some(user) => format!("{}@{}", user, self.hostname),
            None => self.hostname.clone(),
        }
    }

    /// Arguments passed to `ssh` for one command
    fn ssh_args(&self, command: &str) -> Vec<String> {
        let mut args = vec!["-o".to_string(), "BatchMode=yes".to_string()];
        if let Some(port) = self.port {
            args.push("-p".to_string());
            args.push(port.to_string());
        }
        args.push(self.destination());
        args.push("--".to_string());
        args.push(command.to_string());
        args
    }
}

impl Node for SshNode {
    fn name(&self) -> &str {
        &self.name
    }

    fn run(&self, command: &str) -> Result<RunResult> {
        log::debug!("{}: running '{}'", self.name, command);
        let output = Command::new("ssh")
            .args(self.ssh_args(command))
            .stdin(Stdio::null())
            .output()
            .map_err(|e| Error::Transport {
                node: self.name.clone(),
                message: format!("failed to execute ssh: {e}"),
            })?;

        let result = run_result(&self.name, command, output)?;
        if result.return_code == SSH_ERROR {
            return Err(Error::Transport {
                node: self.name.clone(),
                message: format!(
                    "ssh to {} failed: {}",
                    self.destination(),
                    result.stderr_str().trim()
                ),
            });
        }
        Ok(result)
    }
}
