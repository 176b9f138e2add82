//! lt-core: convert LCM event logs into per-channel matrices.

use clap::Parser;
use lt_core::cli::{init_tracing, run, Args};
use lt_core::exit_codes::ExitCode;

fn main() {
    let args = Args::parse();
    init_tracing(args.verbose, args.log_json);

    let code = match run(&args) {
        Ok(()) => ExitCode::Clean,
        Err(err) => {
            eprintln!("lt-core: {}", err);
            ExitCode::for_error(&err)
        }
    };
    std::process::exit(code.as_i32());
}
