//! Command-line interface.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

use clap::Parser;
use lt_common::{Error, FlatFormat};
use lt_config::resolve::ENV_TYPE_CATALOGS;
use lt_config::{resolve_config, Overrides};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use crate::lcm::{EventLog, TypeRegistry};
use crate::output::{write_outputs, OutputPaths};
use crate::run::{run_log, Converter};

/// Convert an LCM event log into per-channel matrices.
#[derive(Parser, Debug)]
#[command(name = "lt-core")]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// LCM log file to convert
    #[arg(value_name = "LOG")]
    pub log: PathBuf,

    /// Print flattened rows instead of writing matrices
    #[arg(short = 'p', long = "print")]
    pub print: bool,

    /// Print the column layout of each channel to stderr
    #[arg(short = 'f', long = "format")]
    pub print_format: bool,

    /// Separator between printed values
    #[arg(short = 's', long = "separator", value_name = "SEP")]
    pub separator: Option<String>,

    /// Regex of channels to process (matched at the start of the name)
    #[arg(short = 'c', long = "channels", value_name = "REGEX")]
    pub channels: Option<String>,

    /// Regex of channels to skip (must match the whole name)
    #[arg(short = 'i', long = "ignore", value_name = "REGEX")]
    pub ignore: Option<String>,

    /// Output file stem, or the print target with --print
    #[arg(short = 'o', long = "outfile", value_name = "PATH")]
    pub outfile: Option<PathBuf>,

    /// Type catalog file (repeatable)
    #[arg(short = 't', long = "types", value_name = "CATALOG")]
    pub types: Vec<PathBuf>,

    /// Config file (JSON or TOML)
    #[arg(long = "config", value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// On-disk format of the flat matrices
    #[arg(long = "flat-format", value_enum, value_name = "FORMAT")]
    pub flat_format: Option<FlatFormat>,

    /// Do not append the log time to flat rows
    #[arg(long = "no-log-time")]
    pub no_log_time: bool,

    /// Increase diagnostic output (-v info, -vv debug)
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Emit diagnostics as JSON lines
    #[arg(long = "log-json")]
    pub log_json: bool,
}

impl Args {
    /// Options given on the command line, for config resolution.
    pub fn overrides(&self) -> Overrides {
        Overrides {
            channels: self.channels.clone(),
            ignore: self.ignore.clone(),
            separator: self.separator.clone(),
            print: self.print,
            print_format: self.print_format,
            no_log_time: self.no_log_time,
            flat_format: self.flat_format,
            type_catalogs: self.types.clone(),
            output: self.outfile.clone(),
        }
    }
}

/// Install the stderr subscriber; `RUST_LOG` wins over `-v`.
pub fn init_tracing(verbose: u8, json: bool) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

/// Resolve configuration, convert the log, and write outputs.
pub fn run(args: &Args) -> Result<(), Error> {
    let (config, paths) = resolve_config(args.config.as_deref(), &args.overrides())?;
    debug!(source = ?paths.source, "resolved configuration");

    if config.type_catalogs.is_empty() {
        return Err(Error::Config(format!(
            "no type catalogs given; use --types or {}",
            ENV_TYPE_CATALOGS
        )));
    }
    let registry = TypeRegistry::from_files(&config.type_catalogs)?;
    info!(types = registry.len(), "loaded type catalogs");

    let mut log = EventLog::open(&args.log)
        .map_err(|e| Error::LogFormat(format!("{}: {}", args.log.display(), e)))?;

    if config.print {
        let out: Box<dyn Write> = match &config.output {
            Some(path) => Box::new(BufWriter::new(File::create(path)?)),
            None => Box::new(io::stdout().lock()),
        };
        info!(input = %args.log.display(), "printing flattened rows");
        let mut converter = Converter::new(&config, &registry)?.print_to(out);
        run_log(&mut converter, &mut log, config.progress_interval)?;
        converter.finish()?;
        return Ok(());
    }

    let outputs = OutputPaths::for_input(&args.log, config.output.as_deref());
    info!(
        input = %args.log.display(),
        output = %outputs.structured.display(),
        "converting log"
    );
    let mut converter = Converter::new(&config, &registry)?;
    run_log(&mut converter, &mut log, config.progress_interval)?;
    let conversion = converter.finish()?;
    write_outputs(&conversion, &args.log, &outputs, config.flat_format)?;
    Ok(())
}
