//! Command-line front end for the `atp-decode` library.

use std::fs;
use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use atp_decode::{decode_all_with_options, format, DecodeEvent, DecodeOptions};
use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(name = "atp-decode", about = "Decode ATP recording unit (RU) and MMI binary trace files")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Decode a trace file and print its records.
    Decode(DecodeArgs),
}

#[derive(clap::Args)]
struct DecodeArgs {
    /// Path to the binary trace file to decode.
    input: PathBuf,

    /// Stop after decoding this many records.
    #[arg(short = 'n', long = "count")]
    count: Option<usize>,

    /// Output format.
    #[arg(short = 'f', long = "format", value_enum, default_value_t = Format::Text)]
    format: Format,

    /// Write output to this file instead of stdout.
    #[arg(short = 'o', long = "output")]
    output: Option<PathBuf>,

    /// Print a decode summary to stderr when finished.
    #[arg(short = 'v', long = "verbose")]
    verbose: bool,

    /// Maximum number of single-byte resync attempts before aborting.
    #[arg(long = "resync-budget", default_value_t = 100)]
    resync_budget: usize,
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Text,
    Json,
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();
    match run(cli) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("atp-decode: {err:#}");
            ExitCode::from(4)
        }
    }
}

fn run(cli: Cli) -> Result<ExitCode> {
    let Command::Decode(args) = cli.command;

    let bytes = match fs::read(&args.input) {
        Ok(bytes) => bytes,
        Err(err) => {
            eprintln!("atp-decode: cannot read {}: {err}", args.input.display());
            return Ok(ExitCode::from(2));
        }
    };

    let mut out: Box<dyn Write> = match &args.output {
        Some(path) => Box::new(
            fs::File::create(path)
                .with_context(|| format!("cannot create {}", path.display()))?,
        ),
        None => Box::new(std::io::stdout()),
    };

    let options = DecodeOptions {
        resync_budget: args.resync_budget,
    };
    let mut decoder = decode_all_with_options(&bytes, options);

    let mut records_written = 0usize;
    let mut aborted = false;

    for event in &mut decoder {
        if let Some(limit) = args.count {
            if records_written >= limit {
                break;
            }
        }
        match event {
            DecodeEvent::Record(record) => {
                write_record(&mut out, &record, args.format)?;
                records_written += 1;
            }
            DecodeEvent::Error(err) => {
                if matches!(err, atp_decode::DecodeError::ResyncBudgetExceeded { .. }) {
                    aborted = true;
                }
            }
        }
    }

    let stats = decoder.stats();
    if args.verbose {
        eprintln!(
            "frames_decoded={} resyncs_performed={} telegrams_reassembled={} \
             partial_telegrams_evicted={} duplicate_fragments={} unknown_packet_type={} \
             body_too_short={} fragment_index_mismatch={} invalid_calendar_field={} truncated={}",
            stats.frames_decoded,
            stats.resyncs_performed,
            stats.telegrams_reassembled,
            stats.partial_telegram_evicted,
            stats.duplicate_fragments,
            stats.unknown_packet_type,
            stats.body_too_short,
            stats.fragment_index_mismatch,
            stats.invalid_calendar_field,
            stats.truncated,
        );
    }

    if aborted {
        return Ok(ExitCode::from(3));
    }
    Ok(ExitCode::from(0))
}

fn write_record(out: &mut dyn Write, record: &atp_decode::Record, fmt: Format) -> Result<()> {
    match fmt {
        Format::Text => writeln!(out, "{}", format::format_text(record))?,
        Format::Json => writeln!(out, "{}", format::format_json(record)?)?,
    }
    Ok(())
}
