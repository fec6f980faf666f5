//! Node transports: where item commands run
//!
//! Both transports hand a single shell command line to a shell on the
//! managed host and capture its result code and output, the same way the
//! rest of the binary shells out through `std::process::Command`.

mod local;
mod ssh;

pub use local::LocalNode;
pub use ssh::SshNode;

use crate::config::NodeConfig;
use itemkit::{Error, Node, RunResult};
use std::process::Output;
use std::sync::Arc;

/// Build the transport a node's configuration asks for
///
/// Only a hostname of "localhost" runs locally; every other node, including
/// one without a hostname, is reached over SSH.
pub fn connect(name: &str, config: &NodeConfig) -> Arc<dyn Node> {
    if config.is_local(name) {
        return Arc::new(LocalNode::new(name));
    }
    Arc::new(SshNode::new(
        name,
        config.hostname(name),
        config.user.as_deref(),
        config.port,
    ))
}

/// Turn captured process output into a [`RunResult`]
///
/// A process killed by a signal has no result code; that is a transport
/// failure rather than a command result.
fn run_result(node: &str, command: &str, output: Output) -> itemkit::Result<RunResult> {
    let return_code = output.status.code().ok_or_else(|| Error::Transport {
        node: node.to_string(),
        message: format!("'{command}' was terminated by a signal"),
    })?;

    log::trace!("{node}: '{command}' exited with {return_code}");

    Ok(RunResult {
        command: command.to_string(),
        return_code,
        stdout: output.stdout,
        stderr: output.stderr,
    })
}
