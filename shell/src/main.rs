use anyhow::Context;
use argh::FromArgs;
use std::io::{self, IsTerminal};
use std::process::ExitCode;
use tinysh::config::{DEFAULT_PROMPT, DEFAULT_QUIT_TOKEN};
use tinysh::{EditorSource, Exit, LineSource, ReaderSource, Session, SharedOutput, ShellConfig};
use tracing_subscriber::EnvFilter;

#[derive(FromArgs)]
/// A small interactive shell with cd, pwd, echo, kill, ps and exec builtins.
struct Args {
    #[argh(option, default = "DEFAULT_PROMPT.to_string()")]
    /// text printed before every input line
    prompt: String,

    #[argh(option, default = "DEFAULT_QUIT_TOKEN.to_string()")]
    /// input line that ends the session
    quit: String,

    #[argh(option, default = "String::from(\"warn\")")]
    /// log filter used when RUST_LOG is not set, e.g. "debug" or "tinysh=info"
    log_level: String,

    #[argh(switch)]
    /// read plain lines even when stdin is a terminal
    plain: bool,
}

fn init_logging(fallback: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn run(args: Args) -> anyhow::Result<ExitCode> {
    let config = ShellConfig {
        prompt: args.prompt,
        quit_token: args.quit,
        ..ShellConfig::default()
    };
    let mut session = Session::new(config, SharedOutput::new(io::stdout()));

    let mut source: Box<dyn LineSource> = if !args.plain && io::stdin().is_terminal() {
        Box::new(EditorSource::new().context("failed to initialise the line editor")?)
    } else {
        Box::new(ReaderSource::new(io::stdin().lock()))
    };

    match session.run(source.as_mut()) {
        Ok(Exit::Quit) | Ok(Exit::EndOfInput) => Ok(ExitCode::SUCCESS),
        Err(err) => {
            tracing::error!(error = %err, "input stream failed");
            Ok(ExitCode::FAILURE)
        }
    }
}

fn main() -> ExitCode {
    let args: Args = argh::from_env();
    init_logging(&args.log_level);
    tracing::debug!(
        builtins = ?tinysh::Dispatcher::default().names().collect::<Vec<_>>(),
        "starting shell"
    );

    match run(args) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("tinysh: {err:#}");
            ExitCode::FAILURE
        }
    }
}
