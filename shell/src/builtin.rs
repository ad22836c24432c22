use crate::command::{Arity, BuiltinCommand};
use crate::error::{ArityError, Result, ShellError};
use crate::lexer::Invocation;
use crate::procs;
use std::env;
use std::io::{self, Write};
use std::process::{Command, Stdio};

/// Every builtin the shell knows about.
pub fn registry() -> Vec<Box<dyn BuiltinCommand>> {
    vec![
        Box::new(Cd),
        Box::new(Pwd),
        Box::new(Echo),
        Box::new(Kill),
        Box::new(Ps),
        Box::new(Exec),
    ]
}

/// Change the working directory of the shell process.
pub struct Cd;

impl BuiltinCommand for Cd {
    fn name(&self) -> &'static str {
        "cd"
    }

    fn arity(&self) -> Arity {
        Arity::Exactly(1)
    }

    fn arity_error(&self) -> ArityError {
        ArityError::Cd
    }

    fn execute(&self, invocation: &Invocation, _stdout: &mut dyn Write) -> Result<()> {
        env::set_current_dir(&invocation.args[0]).map_err(ShellError::os("cd"))
    }
}

/// Print the absolute working directory.
pub struct Pwd;

impl BuiltinCommand for Pwd {
    fn name(&self) -> &'static str {
        "pwd"
    }

    fn arity(&self) -> Arity {
        Arity::Exactly(0)
    }

    fn arity_error(&self) -> ArityError {
        ArityError::Pwd
    }

    fn execute(&self, _invocation: &Invocation, stdout: &mut dyn Write) -> Result<()> {
        let dir = env::current_dir().map_err(ShellError::os("pwd"))?;
        writeln!(stdout, "{}", dir.display()).map_err(ShellError::os("pwd"))
    }
}

/// Write the arguments to the output, separated by single spaces.
///
/// When the first argument opens a double quote and the last one closes it,
/// the text is taken from the raw line instead, so runs of whitespace inside
/// the quotes survive: `echo "a  b"` prints `a  b`.
pub struct Echo;

impl Echo {
    fn render(invocation: &Invocation) -> String {
        let quoted = match (invocation.args.first(), invocation.args.last()) {
            (Some(first), Some(last)) => first.starts_with('"') && last.ends_with('"'),
            _ => false,
        };
        if !quoted {
            return invocation.args.join(" ");
        }
        let text = invocation
            .raw
            .strip_prefix(invocation.name.as_str())
            .unwrap_or(&invocation.raw)
            .trim_start();
        let text = text.strip_prefix('"').unwrap_or(text);
        text.strip_suffix('"').unwrap_or(text).to_string()
    }
}

impl BuiltinCommand for Echo {
    fn name(&self) -> &'static str {
        "echo"
    }

    fn arity(&self) -> Arity {
        Arity::AtLeast(1)
    }

    fn arity_error(&self) -> ArityError {
        ArityError::Echo
    }

    fn execute(&self, invocation: &Invocation, stdout: &mut dyn Write) -> Result<()> {
        writeln!(stdout, "{}", Self::render(invocation)).map_err(ShellError::os("echo"))
    }
}

/// Send a kill signal to every listed process.
///
/// Bad targets do not stop the command: each failure is collected and handed
/// back as [`ShellError::TargetFailures`] once every argument has been tried.
pub struct Kill;

impl Kill {
    fn signal_target(arg: &str) -> Result<()> {
        let pid: i32 = arg
            .parse()
            .map_err(|_| ShellError::InvalidPid(arg.to_string()))?;
        // 0 and negative ids address process groups, not a single process.
        if pid <= 0 {
            return Err(ShellError::InvalidPid(arg.to_string()));
        }
        terminate(pid)
    }
}

#[cfg(unix)]
fn terminate(pid: i32) -> Result<()> {
    use nix::sys::signal::{Signal, kill};
    use nix::unistd::Pid;

    kill(Pid::from_raw(pid), Signal::SIGKILL).map_err(|e| ShellError::Signal {
        pid,
        reason: e.to_string(),
    })
}

#[cfg(not(unix))]
fn terminate(_pid: i32) -> Result<()> {
    Err(ShellError::Unsupported("kill"))
}

impl BuiltinCommand for Kill {
    fn name(&self) -> &'static str {
        "kill"
    }

    fn arity(&self) -> Arity {
        Arity::AtLeast(1)
    }

    fn arity_error(&self) -> ArityError {
        ArityError::Kill
    }

    fn execute(&self, invocation: &Invocation, _stdout: &mut dyn Write) -> Result<()> {
        let failures: Vec<ShellError> = invocation
            .args
            .iter()
            .filter_map(|arg| Self::signal_target(arg).err())
            .collect();
        if failures.is_empty() {
            return Ok(());
        }
        tracing::debug!(failed = failures.len(), "kill targets failed");
        Err(ShellError::TargetFailures(failures))
    }
}

/// List visible processes as `<pid>\t<ppid>\t<executable>`.
pub struct Ps;

impl BuiltinCommand for Ps {
    fn name(&self) -> &'static str {
        "ps"
    }

    fn arity(&self) -> Arity {
        Arity::Exactly(0)
    }

    fn arity_error(&self) -> ArityError {
        ArityError::Ps
    }

    fn execute(&self, _invocation: &Invocation, stdout: &mut dyn Write) -> Result<()> {
        for p in procs::processes()? {
            writeln!(stdout, "{}\t{}\t{}", p.pid, p.ppid, p.executable)
                .map_err(ShellError::os("ps"))?;
        }
        Ok(())
    }
}

/// Run an external program and wait for it.
///
/// The child's stdout is copied into the shell's output as it arrives, its
/// stderr goes straight to the shell's stderr.
pub struct Exec;

impl BuiltinCommand for Exec {
    fn name(&self) -> &'static str {
        "exec"
    }

    fn arity(&self) -> Arity {
        Arity::AtLeast(1)
    }

    fn arity_error(&self) -> ArityError {
        ArityError::Exec
    }

    fn execute(&self, invocation: &Invocation, stdout: &mut dyn Write) -> Result<()> {
        let program = &invocation.args[0];
        let mut child = Command::new(program)
            .args(&invocation.args[1..])
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(|source| ShellError::Spawn {
                program: program.clone(),
                source,
            })?;
        tracing::debug!(program = %program, pid = child.id(), "exec started");

        if let Some(mut child_out) = child.stdout.take() {
            if let Err(e) = io::copy(&mut child_out, stdout) {
                let _ = child.kill();
                let _ = child.wait();
                return Err(ShellError::os("exec")(e));
            }
        }

        let status = child.wait().map_err(ShellError::os("exec"))?;
        if status.success() {
            Ok(())
        } else {
            Err(ShellError::ExitStatus {
                program: program.clone(),
                status,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::lock_current_dir;
    use std::fs;

    fn run(cmd: &dyn BuiltinCommand, line: &str) -> (Result<()>, String) {
        let invocation = Invocation::parse(line).unwrap();
        let mut out = Vec::new();
        let res = cmd.execute(&invocation, &mut out);
        (res, String::from_utf8(out).unwrap())
    }

    #[test]
    fn registry_names_are_unique() {
        let mut names: Vec<_> = registry().iter().map(|b| b.name()).collect();
        names.sort();
        assert_eq!(names, vec!["cd", "echo", "exec", "kill", "ps", "pwd"]);
    }

    #[test]
    fn test_echo_joins_with_single_spaces() {
        let (res, out) = run(&Echo, "echo a   b    c");
        assert!(res.is_ok());
        assert_eq!(out, "a b c\n");
    }

    #[test]
    fn test_echo_quoted_keeps_inner_whitespace() {
        let (res, out) = run(&Echo, r#"echo "a  b""#);
        assert!(res.is_ok());
        assert_eq!(out, "a  b\n");
    }

    #[test]
    fn test_echo_strips_only_one_quote_each_side() {
        let (_, out) = run(&Echo, r#"echo ""x  y"""#);
        assert_eq!(out, "\"x  y\"\n");
    }

    #[test]
    fn test_echo_unbalanced_quote_is_joined() {
        let (_, out) = run(&Echo, r#"echo "a   b"#);
        assert_eq!(out, "\"a b\n");
    }

    #[test]
    fn test_pwd_prints_current_dir() {
        let _lock = lock_current_dir();
        let cur = env::current_dir().unwrap();
        let (res, out) = run(&Pwd, "pwd");
        assert!(res.is_ok());
        assert_eq!(out, format!("{}\n", cur.display()));
    }

    #[test]
    fn test_cd_then_pwd_reports_target() {
        let _lock = lock_current_dir();
        let orig = env::current_dir().unwrap();
        let temp = tempfile::tempdir().expect("temp dir");
        let canonical = fs::canonicalize(temp.path()).unwrap();

        let (res, _) = run(&Cd, &format!("cd {}", canonical.display()));
        assert!(res.is_ok());
        let (_, out) = run(&Pwd, "pwd");

        env::set_current_dir(&orig).expect("failed to restore cwd");
        assert_eq!(out, format!("{}\n", canonical.display()));
    }

    #[test]
    fn test_cd_nonexistent_path_errors() {
        let _lock = lock_current_dir();
        let orig = env::current_dir().unwrap();
        let name = format!("nonexistent_dir_for_cd_test_{}", std::process::id());

        let (res, _) = run(&Cd, &format!("cd {name}"));

        let err = res.unwrap_err();
        assert!(err.to_string().starts_with("cd: "), "got {err}");
        assert_eq!(env::current_dir().unwrap(), orig);
    }

    #[test]
    #[cfg(unix)]
    fn test_kill_reports_every_bad_target_and_signals_the_rest() {
        let mut victim = Command::new("sleep").arg("30").spawn().expect("spawn sleep");
        let line = format!("kill 99999999 abc {}", victim.id());

        let (res, out) = run(&Kill, &line);

        assert_eq!(out, "");
        let failures = match res {
            Err(ShellError::TargetFailures(failures)) => failures,
            other => panic!("expected collected failures, got {other:?}"),
        };
        assert_eq!(failures.len(), 2);
        assert!(failures[0].to_string().starts_with("kill: 99999999: "));
        assert_eq!(failures[1].to_string(), "kill: invalid process id 'abc'");

        use std::os::unix::process::ExitStatusExt;
        let status = victim.wait().unwrap();
        assert_eq!(status.signal(), Some(9));
    }

    #[test]
    fn test_kill_rejects_group_ids() {
        let (res, out) = run(&Kill, "kill 0 -1");
        assert_eq!(out, "");
        assert_eq!(
            res.unwrap_err().to_string(),
            "kill: invalid process id '0'\nkill: invalid process id '-1'"
        );
    }

    #[test]
    #[cfg(unix)]
    fn test_ps_lists_this_process() {
        let (res, out) = run(&Ps, "ps");
        assert!(res.is_ok());
        let me = std::process::id().to_string();
        assert!(
            out.lines()
                .any(|l| l.split('\t').next() == Some(me.as_str()) && l.split('\t').count() == 3)
        );
    }

    #[test]
    #[cfg(unix)]
    fn test_exec_captures_child_stdout() {
        let (res, out) = run(&Exec, "exec echo hello world");
        assert!(res.is_ok());
        assert_eq!(out, "hello world\n");
    }

    #[test]
    #[cfg(unix)]
    fn test_exec_nonzero_exit_is_error() {
        let (res, _) = run(&Exec, "exec false");
        assert!(matches!(res, Err(ShellError::ExitStatus { .. })));
    }

    #[test]
    fn test_exec_missing_program_is_spawn_error() {
        let (res, _) = run(&Exec, "exec definitely-not-a-real-program-4711");
        assert!(matches!(res, Err(ShellError::Spawn { .. })));
    }
}
