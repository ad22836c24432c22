/// Settings the REPL loop and the background launcher read at runtime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellConfig {
    /// Printed before every read.
    pub prompt: String,
    /// A line exactly equal to this ends the loop.
    pub quit_token: String,
    /// Command interpreter for background jobs: program followed by the flag
    /// that makes it take a command string.
    pub interpreter: Vec<String>,
}

pub const DEFAULT_PROMPT: &str = "$ ";
pub const DEFAULT_QUIT_TOKEN: &str = r"\quit";

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            prompt: DEFAULT_PROMPT.to_string(),
            quit_token: DEFAULT_QUIT_TOKEN.to_string(),
            interpreter: default_interpreter(),
        }
    }
}

#[cfg(unix)]
fn default_interpreter() -> Vec<String> {
    vec!["sh".to_string(), "-c".to_string()]
}

#[cfg(not(unix))]
fn default_interpreter() -> Vec<String> {
    vec!["cmd".to_string(), "/C".to_string()]
}
