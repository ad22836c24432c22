use std::env;
use std::fs;
use std::io::Cursor;
use std::sync::{Mutex, MutexGuard, OnceLock, PoisonError};
use std::thread;
use std::time::{Duration, Instant};
use tinysh::{Capture, Exit, ReaderSource, Session, SharedOutput, ShellConfig};

/// Every test here shares the process working directory, and `cd` changes it.
fn serial() -> MutexGuard<'static, ()> {
    static LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    LOCK.get_or_init(|| Mutex::new(()))
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
}

fn run_script(script: &str) -> (Exit, Capture) {
    let (output, captured) = SharedOutput::capture();
    let mut sh = Session::new(ShellConfig::default(), output);
    let mut input = ReaderSource::new(Cursor::new(script.to_string()));
    let exit = sh.run(&mut input).expect("session failed");
    (exit, captured)
}

fn wait_for(captured: &Capture, needle: &str, limit: Duration) -> bool {
    let started = Instant::now();
    while started.elapsed() < limit {
        if captured.contents().contains(needle) {
            return true;
        }
        thread::sleep(Duration::from_millis(20));
    }
    false
}

#[test]
fn cd_then_pwd_reports_the_new_directory() {
    let _guard = serial();
    let orig = env::current_dir().unwrap();
    let temp = tempfile::tempdir().expect("temp dir");
    let target = fs::canonicalize(temp.path()).unwrap();

    let (exit, captured) = run_script(&format!("cd {}\npwd\n\\quit\n", target.display()));
    env::set_current_dir(&orig).expect("failed to restore cwd");

    assert_eq!(exit, Exit::Quit);
    assert_eq!(captured.contents(), format!("$ $ {}\n$ ", target.display()));
}

#[test]
fn echo_variants() {
    let _guard = serial();
    let (_, captured) = run_script("echo a b c\necho \"a  b\"\necho\n\\quit\n");
    assert_eq!(
        captured.contents(),
        "$ a b c\n$ a  b\n$ echo requires 1+ arguments\n$ "
    );
}

#[test]
fn pipeline_appends_previous_output() {
    let _guard = serial();
    let (_, captured) = run_script("echo one | echo two\n\\quit\n");
    assert_eq!(captured.contents(), "$ two one\n$ ");
}

#[test]
#[cfg(unix)]
fn exec_output_feeds_the_next_stage() {
    let _guard = serial();
    let (_, captured) = run_script("exec printf hello | echo got\n\\quit\n");
    assert_eq!(captured.contents(), "$ got hello\n$ ");
}

#[test]
#[cfg(unix)]
fn background_job_returns_to_prompt_before_it_finishes() {
    let _guard = serial();
    let started = Instant::now();
    let (exit, captured) = run_script("sleep 1 &\n\\quit\n");
    assert!(started.elapsed() < Duration::from_millis(900));
    assert_eq!(exit, Exit::Quit);

    let text = captured.contents();
    assert!(text.starts_with("$ ["), "unexpected output {text:?}");
    assert!(text.contains("]\tsleep 1 &\n$ "));
    assert!(!text.contains("Done"));

    assert!(wait_for(&captured, "]+\tDone\n", Duration::from_secs(10)));
}

#[test]
fn end_of_input_without_quit_token() {
    let _guard = serial();
    let (exit, captured) = run_script("echo last");
    assert_eq!(exit, Exit::EndOfInput);
    assert_eq!(captured.contents(), "$ last\n$ ");
}
