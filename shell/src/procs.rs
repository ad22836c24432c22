//! Enumeration of the processes visible to the current user.

use crate::error::Result;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessInfo {
    pub pid: u32,
    pub ppid: u32,
    pub executable: String,
}

/// Lists all visible processes, ordered by pid.
pub fn processes() -> Result<Vec<ProcessInfo>> {
    let mut list = platform::processes()?;
    list.sort_by_key(|p| p.pid);
    Ok(list)
}

/// Parses the contents of `/proc/<pid>/stat`: `pid (comm) state ppid ...`.
///
/// `comm` may itself contain spaces and parentheses, so it spans from the
/// first `(` to the last `)`.
#[cfg_attr(not(target_os = "linux"), allow(dead_code))]
pub(crate) fn parse_stat(stat: &str) -> Option<ProcessInfo> {
    let open = stat.find('(')?;
    let close = stat.rfind(')')?;
    if close < open {
        return None;
    }
    let pid = stat[..open].trim().parse().ok()?;
    let executable = stat[open + 1..close].to_string();
    let mut rest = stat[close + 1..].split_whitespace();
    let _state = rest.next()?;
    let ppid = rest.next()?.parse().ok()?;
    Some(ProcessInfo {
        pid,
        ppid,
        executable,
    })
}

/// Parses one line of `ps -axo pid=,ppid=,comm=`.
#[cfg_attr(target_os = "linux", allow(dead_code))]
pub(crate) fn parse_ps_line(line: &str) -> Option<ProcessInfo> {
    let line = line.trim_start();
    let (pid, rest) = line.split_once(char::is_whitespace)?;
    let rest = rest.trim_start();
    let (ppid, comm) = rest.split_once(char::is_whitespace)?;
    let comm = comm.trim();
    // comm is a path on some systems; keep only the executable name.
    let executable = comm.rsplit('/').next().unwrap_or(comm);
    Some(ProcessInfo {
        pid: pid.parse().ok()?,
        ppid: ppid.parse().ok()?,
        executable: executable.to_string(),
    })
}

#[cfg(target_os = "linux")]
mod platform {
    use super::{ProcessInfo, parse_stat};
    use crate::error::{Result, ShellError};
    use std::fs;

    pub(super) fn processes() -> Result<Vec<ProcessInfo>> {
        let proc_dir = fs::read_dir("/proc").map_err(ShellError::os("ps"))?;
        let mut list = Vec::new();
        for entry in proc_dir.flatten() {
            let Ok(name) = entry.file_name().into_string() else {
                continue;
            };
            if name.parse::<u32>().is_err() {
                continue;
            }
            // The process may have exited between read_dir and here.
            let Ok(stat) = fs::read_to_string(entry.path().join("stat")) else {
                continue;
            };
            if let Some(info) = parse_stat(&stat) {
                list.push(info);
            }
        }
        Ok(list)
    }
}

#[cfg(all(unix, not(target_os = "linux")))]
mod platform {
    use super::{ProcessInfo, parse_ps_line};
    use crate::error::{Result, ShellError};
    use std::io;
    use std::process::Command;

    pub(super) fn processes() -> Result<Vec<ProcessInfo>> {
        let output = Command::new("ps")
            .args(["-axo", "pid=,ppid=,comm="])
            .output()
            .map_err(ShellError::os("ps"))?;
        if !output.status.success() {
            return Err(ShellError::Os {
                op: "ps",
                source: io::Error::other(format!("ps exited with {}", output.status)),
            });
        }
        Ok(String::from_utf8_lossy(&output.stdout)
            .lines()
            .filter_map(parse_ps_line)
            .collect())
    }
}

#[cfg(not(unix))]
mod platform {
    use super::ProcessInfo;
    use crate::error::{Result, ShellError};

    pub(super) fn processes() -> Result<Vec<ProcessInfo>> {
        Err(ShellError::Unsupported("ps"))
    }
}
