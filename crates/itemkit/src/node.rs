//! Node collaborator: a managed host that runs shell commands
//!
//! The engine never talks to a transport directly. Item kinds inspect and
//! mutate a host through this trait, which the caller implements for local
//! execution, ssh, or a test double.

use crate::error::{Error, Result};
use std::fmt;

/// Result of running a command on a node
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunResult {
    /// The command that was run
    pub command: String,
    /// Exit code; zero means success
    pub return_code: i32,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
}

impl RunResult {
    /// Whether the command exited with code zero
    pub fn success(&self) -> bool {
        self.return_code == 0
    }

    /// Get stdout as a string
    pub fn stdout_str(&self) -> String {
        String::from_utf8_lossy(&self.stdout).to_string()
    }

    /// Get stderr as a string
    pub fn stderr_str(&self) -> String {
        String::from_utf8_lossy(&self.stderr).to_string()
    }
}

/// Metadata about a path on a node
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathInfo {
    pub path: String,
    pub exists: bool,
    pub is_symlink: bool,
    /// Owner name; empty when the path does not exist
    pub owner: String,
    /// Group name; empty when the path does not exist
    pub group: String,
    /// Numeric owner id
    pub uid: Option<u32>,
    /// Numeric group id
    pub gid: Option<u32>,
    /// Short description of what the path currently is
    /// ("symbolic link", "directory", "regular file", "nothing")
    pub desc: String,
}

impl PathInfo {
    /// Metadata for a path that does not exist
    pub fn missing(path: &str) -> Self {
        Self {
            path: path.to_string(),
            exists: false,
            is_symlink: false,
            owner: String::new(),
            group: String::new(),
            uid: None,
            gid: None,
            desc: "nothing".to_string(),
        }
    }

    /// Parse one line of `stat -c '%U %G %u %g %F'` output
    ///
    /// The file type is last because it may contain spaces.
    pub fn from_stat_line(path: &str, line: &str) -> Option<Self> {
        let mut parts = line.trim_end_matches(['\n', '\r']).splitn(5, ' ');
        let owner = parts.next().filter(|s| !s.is_empty())?;
        let group = parts.next().filter(|s| !s.is_empty())?;
        let uid = parts.next()?.parse().ok()?;
        let gid = parts.next()?.parse().ok()?;
        let desc = parts.next().filter(|s| !s.is_empty())?;

        Some(Self {
            path: path.to_string(),
            exists: true,
            is_symlink: desc == "symbolic link",
            owner: owner.to_string(),
            group: group.to_string(),
            uid: Some(uid),
            gid: Some(gid),
            desc: desc.to_string(),
        })
    }

    /// Whether the owner matches a user name or numeric uid
    pub fn owner_is(&self, account: &str) -> bool {
        account_matches(account, &self.owner, self.uid)
    }

    /// Whether the group matches a group name or numeric gid
    pub fn group_is(&self, account: &str) -> bool {
        account_matches(account, &self.group, self.gid)
    }
}

/// Numeric accounts compare against the id, names against the name
fn account_matches(account: &str, name: &str, id: Option<u32>) -> bool {
    match account.parse::<u32>() {
        Ok(wanted) => id == Some(wanted),
        Err(_) => account == name,
    }
}

/// Command that exits 0 when `path` exists, including dangling symlinks
pub fn exists_command(path: &str) -> String {
    let path = quote(path);
    format!("test -e {path} || test -L {path}")
}

/// A managed host
///
/// `run` reports non-zero exit codes as a normal [`RunResult`]; only a
/// failure to run the command at all is an error. Mutating callers use
/// [`Node::run_checked`] so that a failed command cannot go unnoticed.
pub trait Node: Send + Sync + fmt::Debug {
    /// Name of the node, used in logs and errors
    fn name(&self) -> &str;

    /// Run a shell command on the node
    fn run(&self, command: &str) -> Result<RunResult>;

    /// Run a shell command and fail on a non-zero exit code
    fn run_checked(&self, command: &str) -> Result<RunResult> {
        let result = self.run(command)?;
        if !result.success() {
            return Err(Error::CommandFailed {
                node: self.name().to_string(),
                command: command.to_string(),
                return_code: result.return_code,
                stderr: result.stderr_str(),
            });
        }
        Ok(result)
    }

    /// Inspect a path without following a final symlink
    ///
    /// A failing `stat` only means "missing" when the path is confirmed
    /// absent; any other failure (no GNU stat, permissions) is an error, so
    /// callers never act on a path they could not inspect.
    fn path_info(&self, path: &str) -> Result<PathInfo> {
        let result = self.run(&format!("stat -c '%U %G %u %g %F' -- {}", quote(path)))?;
        if !result.success() {
            if !self.run(&exists_command(path))?.success() {
                return Ok(PathInfo::missing(path));
            }
            return Err(Error::UnexpectedOutput {
                node: self.name().to_string(),
                path: path.to_string(),
                output: result.stderr_str().trim().to_string(),
            });
        }

        let stdout = result.stdout_str();
        PathInfo::from_stat_line(path, &stdout).ok_or_else(|| Error::UnexpectedOutput {
            node: self.name().to_string(),
            path: path.to_string(),
            output: stdout.trim().to_string(),
        })
    }
}

/// Quote a single shell word
pub fn quote(word: &str) -> String {
    shell_words::quote(word).into_owned()
}
