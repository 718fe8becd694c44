use clap::Parser;
use std::process::ExitCode;

mod cli;
mod commands;
mod dispatch;
mod output;

use cli::Cli;
use commands::{CommandContext, CommandError};
use dispatch::{Dispatch, RunCommand};

fn main() -> ExitCode {
    let cli = Cli::parse();
    initialize_logging(&cli);

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            if cli.json {
                let error_json = serde_json::json!({
                    "error": {
                        "code": error_code(&e),
                        "message": e.to_string(),
                    }
                });
                match serde_json::to_string_pretty(&error_json) {
                    Ok(text) => eprintln!("{text}"),
                    Err(_) => eprintln!("Error: {e}"),
                }
            } else {
                eprintln!("Error: {e}");
            }
            error_exit_code(&e)
        }
    }
}

fn run(cli: &Cli) -> commands::Result<()> {
    let ctx = CommandContext::from_cli(cli);
    Dispatch::from_cli(cli).execute(&ctx)
}

/// Initializes `env_logger` on stderr.
///
/// `RUST_LOG` takes precedence; otherwise `--verbose` enables debug output
/// and `--quiet` limits logging to errors.
fn initialize_logging(cli: &Cli) {
    let level = log_level(cli);
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level.as_str()))
        .format_timestamp(None)
        .target(env_logger::Target::Stderr)
        .init();
}

/// Returns the default log level for the CLI flags.
fn log_level(cli: &Cli) -> log::LevelFilter {
    if cli.verbose {
        log::LevelFilter::Debug
    } else if cli.quiet {
        log::LevelFilter::Error
    } else {
        log::LevelFilter::Warn
    }
}

/// Returns the error code string for JSON output.
fn error_code(e: &CommandError) -> &'static str {
    match e {
        CommandError::Filter(_) => "FILTER_ERROR",
        CommandError::Input(_) => "INPUT_ERROR",
        CommandError::Config(_) => "CONFIG_ERROR",
        CommandError::Io(_) => "IO_ERROR",
        CommandError::Json(_) => "JSON_ERROR",
    }
}

/// Returns the exit code for an error.
fn error_exit_code(e: &CommandError) -> ExitCode {
    match e {
        CommandError::Config(_) => ExitCode::from(5),
        CommandError::Filter(_) => ExitCode::from(1),
        CommandError::Input(_) => ExitCode::from(2),
        CommandError::Io(_) => ExitCode::from(3),
        CommandError::Json(_) => ExitCode::from(1),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use icinga_filter::filter::FilterError;

    fn cli(args: &[&str]) -> Cli {
        Cli::parse_from(std::iter::once("ifilter").chain(args.iter().copied()))
    }

    #[test]
    fn test_log_level_from_flags() {
        assert_eq!(log_level(&cli(&[])), log::LevelFilter::Warn);
        assert_eq!(log_level(&cli(&["-v"])), log::LevelFilter::Debug);
        assert_eq!(log_level(&cli(&["-q"])), log::LevelFilter::Error);
    }

    #[test]
    fn test_error_codes() {
        let filter = CommandError::Filter(FilterError::missing_value("state", 6));
        assert_eq!(error_code(&filter), "FILTER_ERROR");
        assert_eq!(error_exit_code(&filter), ExitCode::from(1));

        let config = CommandError::Config("broken".to_string());
        assert_eq!(error_code(&config), "CONFIG_ERROR");
        assert_eq!(error_exit_code(&config), ExitCode::from(5));

        let input = CommandError::Input("bad --now".to_string());
        assert_eq!(error_code(&input), "INPUT_ERROR");
        assert_eq!(error_exit_code(&input), ExitCode::from(2));

        let io = CommandError::Io(std::io::Error::new(std::io::ErrorKind::NotFound, "gone"));
        assert_eq!(error_code(&io), "IO_ERROR");
        assert_eq!(error_exit_code(&io), ExitCode::from(3));
    }

    #[test]
    fn test_filter_error_message() {
        let e = CommandError::Filter(FilterError::missing_value("state", 6));
        assert_eq!(
            e.to_string(),
            "filter error: missing value for 'state' at position 6"
        );
    }
}
