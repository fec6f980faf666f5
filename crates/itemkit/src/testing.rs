//! Test double for [`Node`]: a fake host with an in-memory filesystem.
//!
//! Understands the commands the built-in item kinds issue (`stat`, the
//! existence check, `rm -rf`, `ln -s`, `chown -h`) and records every command
//! in order. Anything else exits with the code configured for it, or 0.
//!
//! Account ids: "root" is 0, numeric names are their own id, every other
//! name is 1000.

use crate::error::Result;
use crate::node::{Node, PathInfo, RunResult};
use std::collections::HashMap;
use std::sync::Mutex;

#[derive(Debug, Clone)]
struct Entry {
    kind: &'static str,
    owner: String,
    group: String,
    link_target: Option<String>,
}

#[derive(Debug)]
pub struct FakeHost {
    name: String,
    /// Owner given to newly created links (the login user)
    login: String,
    paths: Mutex<HashMap<String, Entry>>,
    exit_codes: Mutex<HashMap<String, i32>>,
    commands: Mutex<Vec<String>>,
}

impl FakeHost {
    pub fn new() -> Self {
        Self {
            name: "fakehost".to_string(),
            login: "deploy".to_string(),
            paths: Mutex::new(HashMap::new()),
            exit_codes: Mutex::new(HashMap::new()),
            commands: Mutex::new(Vec::new()),
        }
    }

    pub fn add_symlink(&self, path: &str, target: &str, owner: &str, group: &str) {
        self.insert(path, "symbolic link", owner, group, Some(target));
    }

    pub fn add_file(&self, path: &str, owner: &str, group: &str) {
        self.insert(path, "regular file", owner, group, None);
    }

    pub fn add_directory(&self, path: &str, owner: &str, group: &str) {
        self.insert(path, "directory", owner, group, None);
    }

    fn insert(&self, path: &str, kind: &'static str, owner: &str, group: &str, link: Option<&str>) {
        self.paths.lock().unwrap().insert(
            path.to_string(),
            Entry {
                kind,
                owner: owner.to_string(),
                group: group.to_string(),
                link_target: link.map(str::to_string),
            },
        );
    }

    /// Make a command exit with `code`
    pub fn set_exit_code(&self, command: &str, code: i32) {
        self.exit_codes
            .lock()
            .unwrap()
            .insert(command.to_string(), code);
    }

    /// Every command run so far, in order
    pub fn commands(&self) -> Vec<String> {
        self.commands.lock().unwrap().clone()
    }

    /// Commands other than path queries
    pub fn mutations(&self) -> Vec<String> {
        self.commands()
            .into_iter()
            .filter(|c| !c.starts_with("stat ") && !c.contains(" || test -L "))
            .collect()
    }

    pub fn link_target(&self, path: &str) -> Option<String> {
        self.paths
            .lock()
            .unwrap()
            .get(path)
            .and_then(|e| e.link_target.clone())
    }

    fn exec(&self, command: &str) -> (i32, String) {
        if let Some(code) = self.exit_codes.lock().unwrap().get(command) {
            return (*code, String::new());
        }

        let words = shell_words::split(command).unwrap_or_default();
        let words: Vec<&str> = words.iter().map(String::as_str).collect();
        let mut paths = self.paths.lock().unwrap();

        match words.as_slice() {
            ["stat", "-c", "%U %G %u %g %F", "--", path] => match paths.get(*path) {
                Some(e) => (
                    0,
                    format!(
                        "{} {} {} {} {}\n",
                        e.owner,
                        e.group,
                        account_id(&e.owner),
                        account_id(&e.group),
                        e.kind
                    ),
                ),
                None => (1, String::new()),
            },
            ["test", "-e", path, "||", "test", "-L", _] => {
                (i32::from(!paths.contains_key(*path)), String::new())
            }
            ["rm", "-rf", path] => {
                paths.remove(*path);
                (0, String::new())
            }
            ["ln", "-s", target, path] => {
                if paths.contains_key(*path) {
                    return (1, String::new());
                }
                paths.insert(
                    path.to_string(),
                    Entry {
                        kind: "symbolic link",
                        owner: self.login.clone(),
                        group: self.login.clone(),
                        link_target: Some(target.to_string()),
                    },
                );
                (0, String::new())
            }
            ["chown", "-h", owner_group, path] => {
                match (paths.get_mut(*path), owner_group.split_once(':')) {
                    (Some(entry), Some((owner, group))) => {
                        entry.owner = owner.to_string();
                        entry.group = group.to_string();
                        (0, String::new())
                    }
                    _ => (1, String::new()),
                }
            }
            ["false"] => (1, String::new()),
            _ => (0, String::new()),
        }
    }
}

fn account_id(name: &str) -> u32 {
    match name {
        "root" => 0,
        _ => name.parse().unwrap_or(1000),
    }
}

impl Node for FakeHost {
    fn name(&self) -> &str {
        &self.name
    }

    fn run(&self, command: &str) -> Result<RunResult> {
        self.commands.lock().unwrap().push(command.to_string());
        let (return_code, stdout) = self.exec(command);
        Ok(RunResult {
            command: command.to_string(),
            return_code,
            stdout: stdout.into_bytes(),
            stderr: Vec::new(),
        })
    }
}

#[test]
fn fake_host_round_trip() {
    let host = FakeHost::new();
    assert_eq!(host.path_info("/a").unwrap(), PathInfo::missing("/a"));

    host.run_checked("ln -s /etc/foo /a").unwrap();
    host.run_checked("chown -h root:wheel /a").unwrap();

    let info = host.path_info("/a").unwrap();
    assert!(info.is_symlink);
    assert_eq!((info.owner.as_str(), info.group.as_str()), ("root", "wheel"));
    assert_eq!(host.link_target("/a").as_deref(), Some("/etc/foo"));
    assert_eq!(info.uid, Some(0));
    assert_eq!(info.gid, Some(1000));
}
