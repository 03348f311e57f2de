//! be-quiet binary entry point.

use std::process::ExitCode;

use be_quiet::cli::{self, Args};
use be_quiet::config::Config;
use be_quiet::host::{self, LoadOptions, WriteRequest};
use be_quiet::{logging, message, run_quietly};
use tracing::{debug, info};

fn main() -> ExitCode {
    let args = match cli::parse_args() {
        Ok(args) => args,
        Err(e) => {
            eprintln!("error: {e}");
            eprintln!("Run 'be-quiet --help' for usage.");
            return ExitCode::from(2);
        }
    };

    if args.help {
        cli::print_help();
        return ExitCode::SUCCESS;
    }

    if args.version {
        cli::print_version();
        return ExitCode::SUCCESS;
    }

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> be_quiet::Result<()> {
    let config = Config::load(args)?;

    // Logging may fail if already initialized; harmless.
    let _ = logging::init_with_filter(config.log_filter());
    config.apply();
    info!("be-quiet v{}", env!("CARGO_PKG_VERSION"));

    message!("before")?;

    let captured = run_quietly(|scope| -> be_quiet::Result<String> {
        if let Some(ref path) = args.write {
            let text = args.text.clone().unwrap_or_default();
            host::write_region(&WriteRequest::new(path, text))?;
        }
        for path in &args.load {
            host::load(path, LoadOptions::default())?;
        }
        for text in &args.messages {
            message!("%s", text)?;
        }
        Ok(scope.output())
    })?;
    debug!(bytes = captured.len(), "quiet scope finished");

    message!("after")?;

    if args.show_captured {
        print!("{captured}");
    }
    Ok(())
}
