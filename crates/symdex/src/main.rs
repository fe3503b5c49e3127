use std::fs;
use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, Subcommand};
use symdex_utils::{info, init_logging_with, LogFormat, LogLevel};

mod error;
mod index;
mod table;

use error::{CliError, CliResult};
use index::{BuildOptions, IndexKind, MergeArg};

/// Build, query and validate serialized symbol address indexes.
#[derive(Parser, Debug)]
#[command(name = "symdex")]
#[command(version)]
#[command(about = "Build, query and validate serialized symbol address indexes", long_about = None)]
struct Cli
{
    #[command(subcommand)]
    command: Commands,

    /// Log level (overrides RUST_LOG)
    #[arg(long, global = true)]
    log_level: Option<LogLevel>,

    /// Log format: pretty or json (overrides SYMDEX_LOG_FORMAT)
    #[arg(long, global = true)]
    log_format: Option<LogFormat>,
}

#[derive(Subcommand, Debug)]
enum Commands
{
    /// Build an index from an address table and write its serialized form
    Build
    {
        /// Index structure to build
        #[arg(short, long, value_enum)]
        kind: IndexKind,
        /// Overlap handling for range indexes
        #[arg(long, value_enum, default_value_t = MergeArg::Exclusive)]
        merge: MergeArg,
        /// Nest identical ranges instead of skipping them (contained indexes)
        #[arg(long, default_value_t = false)]
        allow_equal: bool,
        /// Address table: `<hex base> <hex size> <name>` per line
        table: PathBuf,
        /// Where to write the serialized index
        output: PathBuf,
    },
    /// Look up an address in a serialized index
    Lookup
    {
        /// Index structure the file holds
        #[arg(short, long, value_enum)]
        kind: IndexKind,
        /// Fall back to the closest range below the address (range indexes)
        #[arg(long, default_value_t = false)]
        nearest: bool,
        /// Serialized index file
        file: PathBuf,
        /// Address to look up (hex format: 0x1000 or 1000)
        address: String,
    },
    /// Check the structure of a serialized index
    Validate
    {
        /// Index structure the file holds
        #[arg(short, long, value_enum)]
        kind: IndexKind,
        /// Serialized index file
        file: PathBuf,
    },
    /// List the entries of a serialized index in address order
    Dump
    {
        /// Index structure the file holds (address or range)
        #[arg(short, long, value_enum)]
        kind: IndexKind,
        /// Serialized index file
        file: PathBuf,
    },
}

fn main()
{
    let cli = Cli::parse();

    // Flags win over RUST_LOG and SYMDEX_LOG_FORMAT
    let guard = match init_logging_with(cli.log_level, cli.log_format) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Failed to initialize logging: {e}");
            process::exit(1);
        }
    };

    match run_command(cli.command) {
        Ok(output) => print!("{output}"),
        Err(e) => {
            eprintln!("Error: {e}");
            drop(guard);
            process::exit(1);
        }
    }
}

fn run_command(command: Commands) -> CliResult<String>
{
    match command {
        Commands::Build {
            kind,
            merge,
            allow_equal,
            table: table_path,
            output,
        } => {
            let text = fs::read_to_string(&table_path).map_err(|source| io_error(&table_path, source))?;
            let rows = table::parse_table(&text)?;
            info!(table = %table_path.display(), rows = rows.len(), "loaded address table");

            let report = index::build(kind, rows, BuildOptions { merge, allow_equal })?;
            fs::write(&output, &report.bytes).map_err(|source| io_error(&output, source))?;
            Ok(format!(
                "stored {} entries, skipped {}, wrote {} bytes to {}\n",
                report.stored,
                report.skipped,
                report.bytes.len(),
                output.display()
            ))
        }
        Commands::Lookup {
            kind,
            nearest,
            file,
            address,
        } => {
            let address = table::parse_hex(&address).ok_or(CliError::InvalidAddress(address))?;
            let bytes = read_index(&file)?;
            index::lookup(kind, &bytes, address, nearest)
        }
        Commands::Validate { kind, file } => {
            let bytes = read_index(&file)?;
            index::validate(kind, &bytes)
        }
        Commands::Dump { kind, file } => {
            let bytes = read_index(&file)?;
            index::dump(kind, &bytes)
        }
    }
}

fn read_index(path: &Path) -> CliResult<Vec<u8>>
{
    fs::read(path).map_err(|source| io_error(path, source))
}

fn io_error(path: &Path, source: std::io::Error) -> CliError
{
    CliError::Io {
        path: path.to_path_buf(),
        source,
    }
}
