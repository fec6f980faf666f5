use super::run_result;
use itemkit::{Error, Node, Result, RunResult};
use std::process::{Command, Stdio};

/// Runs commands on this machine through `sh -c`
#[derive(Debug)]
pub struct LocalNode {
    name: String,
}

impl LocalNode {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
        }
    }
}

impl Node for LocalNode {
    fn name(&self) -> &str {
        &self.name
    }

    fn run(&self, command: &str) -> Result<RunResult> {
        log::debug!("{}: running '{}'", self.name, command);
        let output = Command::new("sh")
            .arg("-c")
            .arg(command)
            .stdin(Stdio::null())
            .output()
            .map_err(|e| Error::Transport {
                node: self.name.clone(),
                message: format!("failed to execute sh: {e}"),
            })?;
        run_result(&self.name, command, output)
    }
}
