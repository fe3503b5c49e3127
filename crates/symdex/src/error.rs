//! Errors reported by the `symdex` command line tool

use std::io;
use std::path::PathBuf;

use symdex_core::IndexError;
use thiserror::Error;

/// Everything a subcommand can fail with
#[derive(Error, Debug)]
pub enum CliError
{
    /// A file could not be read or written
    #[error("{}: {source}", path.display())]
    Io
    {
        /// The file involved
        path: PathBuf,
        /// The underlying failure
        source: io::Error,
    },

    /// A line of an address table could not be parsed
    #[error("line {line}: {message}")]
    Table
    {
        /// 1-based line number
        line: usize,
        /// What is wrong with the line
        message: String,
    },

    /// The index rejected an operation or a buffer
    #[error(transparent)]
    Index(#[from] IndexError),

    /// An address argument is not a hex number
    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    /// No stored entry covers the queried address
    #[error("No entry covers 0x{0:x}")]
    NotFound(u64),

    /// The option does not apply to this index kind
    #[error("Unsupported: {0}")]
    Unsupported(String),
}

/// Result type for CLI operations
pub type CliResult<T> = Result<T, CliError>;
