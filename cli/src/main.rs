//! `sddl`: converts security descriptors read line by line from stdin.
//!
//! ```bash
//! # base64 self-relative descriptors to SDDL
//! sddl < descriptors.txt
//!
//! # SDDL to base64
//! echo 'O:SYG:BAD:(A;;FA;;;SY)' | sddl -i string -o binary
//!
//! # descriptors of files (Windows only)
//! echo 'C:\Windows' | sddl --file --debug
//! ```

mod process;

use std::io::{self, Write as _};
use std::process::ExitCode;

use clap::{ArgAction, Parser};
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

use crate::process::{Config, Format, process};

#[derive(Parser, Debug)]
#[command(name = "sddl")]
#[command(about = "Convert Windows security descriptors between base64 binary and SDDL", long_about = None)]
struct Args {
    /// Input format: base64 encoded binary or SDDL string
    #[arg(short, long, value_enum, default_value_t = Format::Binary)]
    input: Format,

    /// Output format: base64 encoded binary or SDDL string
    #[arg(short, long, value_enum, default_value_t = Format::String)]
    output: Format,

    /// Treat each line as a file path and read its security descriptor from the OS
    #[arg(long)]
    file: bool,

    /// Print an indented dump instead of SDDL (string output only)
    #[arg(long)]
    debug: bool,

    /// Raise log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_tracing(args.verbose);

    if args.file && args.input != Format::Binary {
        warn!("input format is ignored in file mode");
    }
    let config = Config {
        input: args.input,
        output: args.output,
        file_mode: args.file,
        debug: args.debug,
    };

    let mut stdout = io::stdout().lock();
    let mut stderr = io::stderr().lock();
    match process(io::stdin().lock(), &mut stdout, &mut stderr, &config) {
        Ok(summary) => {
            debug!(converted = summary.converted, failed = summary.failed, "input exhausted");
            ExitCode::SUCCESS
        }
        Err(err) => {
            // Nothing left to report to if stderr itself is gone.
            let _ = writeln!(stderr, "error: {err:#}");
            ExitCode::FAILURE
        }
    }
}
