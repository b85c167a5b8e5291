//! Command files.
//!
//! A setting such as `boot_command=ubuntu.command` names a file of shell
//! commands, one per line, instead of carrying the command inline. Bare
//! file names are looked up in the build's commands directory.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Suffix marking a setting value as a command file.
pub const COMMAND_SUFFIX: &str = ".command";

/// Reads the lines of a file.
pub trait LineSource {
    fn read_lines(&self, path: &Path) -> io::Result<Vec<String>>;
}

/// Reads from the local filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsLineSource;

impl LineSource for FsLineSource {
    fn read_lines(&self, path: &Path) -> io::Result<Vec<String>> {
        let text = fs::read_to_string(path)?;
        Ok(text
            .lines()
            .map(str::trim_end)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect())
    }
}

/// Whether `value` names a command file.
pub fn is_command_file(value: &str) -> bool {
    value.ends_with(COMMAND_SUFFIX)
}

/// Where a command file named by a setting lives.
///
/// Values containing a path separator are used as given; bare names are
/// joined onto `commands_dir`.
pub fn command_path(commands_dir: &str, value: &str) -> PathBuf {
    if value.contains('/') {
        PathBuf::from(value)
    } else {
        Path::new(commands_dir).join(value)
    }
}

/// Join a command split across lines with trailing `\\`.
///
/// A single line is returned as is. Otherwise lines are trimmed and
/// concatenated up to and including the first line without a trailing
/// backslash; anything after it is ignored.
pub fn command_from_lines(lines: &[String]) -> String {
    if let [only] = lines {
        return only.clone();
    }
    let mut cmd = String::new();
    for line in lines {
        let line = line.trim();
        match line.strip_suffix('\\') {
            Some(continued) => cmd.push_str(continued),
            None => {
                cmd.push_str(line);
                break;
            }
        }
    }
    cmd
}
