//! lsmkv CLI
//!
//! Command-line interface over a file-backed lsmkv engine with integer
//! keys and values.

use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use lsmkv::{Config, Engine, FileSegment, SegmentFormat};
use tracing_subscriber::{fmt, EnvFilter};

type CliEngine = Engine<i64, i64, FileSegment<i64, i64>>;

/// lsmkv CLI
#[derive(Parser, Debug)]
#[command(name = "lsmkv-cli")]
#[command(about = "CLI for the lsmkv key-value engine")]
#[command(version)]
struct Args {
    /// Segment file
    #[arg(short, long, default_value = "./lsmkv_data/segment.log")]
    segment: PathBuf,

    /// MemTable capacity in records
    #[arg(short, long, default_value = "1024")]
    capacity: usize,

    /// Keep the segment in append order instead of sorting on flush
    #[arg(long)]
    unsorted: bool,

    /// Segment file encoding
    #[arg(short, long, value_enum, default_value = "text")]
    format: Format,

    #[command(subcommand)]
    command: Commands,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Format {
    Text,
    Binary,
}

impl From<Format> for SegmentFormat {
    fn from(format: Format) -> Self {
        match format {
            Format::Text => SegmentFormat::Text,
            Format::Binary => SegmentFormat::Binary,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Get a value by key
    Get {
        /// The key to get
        key: i64,
    },

    /// Set a key-value pair
    Put {
        /// The key to set
        key: i64,

        /// The value to set
        value: i64,
    },

    /// Delete a key
    Del {
        /// The key to delete
        key: i64,
    },

    /// Print buffered and segment records
    Dump,

    /// Read commands from stdin (put K V | get K | del K | flush | dump | quit)
    Shell,
}

fn main() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn,lsmkv=info"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();

    let config = Config::builder()
        .segment_path(&args.segment)
        .buffer_capacity(args.capacity)
        .sort_on_flush(!args.unsorted)
        .segment_format(args.format.into())
        .build();

    let engine: CliEngine = match Engine::open(config) {
        Ok(e) => e,
        Err(e) => {
            tracing::error!("Failed to open engine: {}", e);
            std::process::exit(1);
        }
    };

    let outcome = match args.command {
        Commands::Get { key } => get(&engine, key),
        Commands::Put { key, value } => engine.put(key, value).map(|_| println!("OK")),
        Commands::Del { key } => delete(&engine, key),
        Commands::Dump => dump(&engine),
        Commands::Shell => shell(&engine),
    };

    if let Err(e) = outcome.and_then(|_| engine.close()) {
        tracing::error!("{}", e);
        std::process::exit(1);
    }
}

fn get(engine: &CliEngine, key: i64) -> lsmkv::Result<()> {
    match engine.get(&key)? {
        Some(value) => println!("{}", value),
        None => println!("(not found)"),
    }
    Ok(())
}

fn delete(engine: &CliEngine, key: i64) -> lsmkv::Result<()> {
    if engine.delete(&key)? {
        println!("DELETED");
    } else {
        println!("(not found)");
    }
    Ok(())
}

fn dump(engine: &CliEngine) -> lsmkv::Result<()> {
    println!("-- buffer --");
    for record in engine.buffered_records() {
        println!("{}", record);
    }
    println!("-- segment --");
    for record in engine.segment_records()? {
        println!("{}", record);
    }
    Ok(())
}

fn shell(engine: &CliEngine) -> lsmkv::Result<()> {
    let stdin = io::stdin();
    let mut stdout = io::stdout();

    for line in stdin.lock().lines() {
        let line = line?;
        let parts: Vec<&str> = line.split_whitespace().collect();

        let result = match parts.as_slice() {
            [] => continue,
            ["quit"] | ["exit"] => break,
            ["put", key, value] => match (key.parse(), value.parse()) {
                (Ok(key), Ok(value)) => engine.put(key, value).map(|_| println!("OK")),
                _ => {
                    println!("ERR usage: put <i64> <i64>");
                    Ok(())
                }
            },
            ["get", key] => match key.parse() {
                Ok(key) => get(engine, key),
                Err(_) => {
                    println!("ERR usage: get <i64>");
                    Ok(())
                }
            },
            ["del", key] => match key.parse() {
                Ok(key) => delete(engine, key),
                Err(_) => {
                    println!("ERR usage: del <i64>");
                    Ok(())
                }
            },
            ["flush"] => engine.flush().map(|_| println!("OK")),
            ["dump"] => dump(engine),
            _ => {
                println!("ERR unknown command: {}", line.trim());
                Ok(())
            }
        };

        // Storage errors are reported per command; the session continues
        if let Err(e) = result {
            println!("ERR {}", e);
        }
        stdout.flush()?;
    }

    Ok(())
}
