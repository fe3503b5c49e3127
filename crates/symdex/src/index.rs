//! # Index Operations
//!
//! The work behind each subcommand: building a serialized index from an
//! address table and answering queries against a serialized file.
//!
//! Every index uses `u64` addresses and string entries.

use clap::ValueEnum;
use symdex_core::prelude::*;
use symdex_utils::{debug, info, warn};

use crate::error::{CliError, CliResult};
use crate::table::TableRow;

/// Which structure a file holds
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum IndexKind
{
    /// Point addresses, looked up by nearest address at or below
    Address,
    /// Disjoint ranges
    Range,
    /// Nested ranges, looked up by innermost range
    Contained,
}

/// How overlapping ranges are handled when building a range index
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum MergeArg
{
    /// Skip any overlapping range
    #[default]
    Exclusive,
    /// Cut the range that starts lower
    TruncateLower,
    /// Cut the range that starts higher
    TruncateUpper,
}

impl From<MergeArg> for MergeStrategy
{
    fn from(merge: MergeArg) -> Self
    {
        match merge {
            MergeArg::Exclusive => MergeStrategy::Exclusive,
            MergeArg::TruncateLower => MergeStrategy::TruncateLower,
            MergeArg::TruncateUpper => MergeStrategy::TruncateUpper,
        }
    }
}

/// Options for [`build`]
#[derive(Debug, Clone, Copy, Default)]
pub struct BuildOptions
{
    pub merge: MergeArg,
    pub allow_equal: bool,
}

/// Outcome of [`build`]
#[derive(Debug)]
pub struct BuildReport
{
    pub bytes: Vec<u8>,
    pub stored: usize,
    pub skipped: usize,
}

/// Store every row into an index of `kind` and serialize it.
///
/// Rows the index rejects are logged and skipped, the way a symbol loader
/// treats bad records.
///
/// ## Errors
///
/// Returns [`CliError::Index`] if serialization fails.
pub fn build(kind: IndexKind, rows: Vec<TableRow>, options: BuildOptions) -> CliResult<BuildReport>
{
    let total = rows.len();
    let mut skipped = 0;
    let mut skip = |row: &TableRow, err: &IndexError| {
        warn!(line = row.line, base = row.base, size = row.size, error = %err, "skipping table row");
        skipped += 1;
    };

    let bytes = match kind {
        IndexKind::Address => {
            let mut map = AddressMap::<u64, String>::new();
            for row in rows {
                if let Err(err) = map.store(row.base, row.name.clone()) {
                    skip(&row, &err);
                }
            }
            map.serialize()?
        }
        IndexKind::Range => {
            let mut map = RangeMap::<u64, String>::with_merge_strategy(options.merge.into());
            for row in rows {
                if let Err(err) = map.store_range(row.base, row.size, row.name.clone()) {
                    skip(&row, &err);
                }
            }
            map.serialize()?
        }
        IndexKind::Contained => {
            let mut map = ContainedRangeMap::<u64, String>::with_equal_ranges(options.allow_equal);
            for row in rows {
                if let Err(err) = map.store_range(row.base, row.size, row.name.clone()) {
                    skip(&row, &err);
                }
            }
            map.serialize()?
        }
    };

    info!(?kind, rows = total, skipped, bytes = bytes.len(), "built index");
    Ok(BuildReport {
        bytes,
        stored: total - skipped,
        skipped,
    })
}

/// Answer a lookup against a serialized index, one result per line.
///
/// Contained indexes list every enclosing range, innermost first.
///
/// ## Errors
///
/// - [`CliError::NotFound`] if nothing covers `address`
/// - [`CliError::Unsupported`] for `nearest` on a contained index
/// - [`CliError::Index`] if the buffer header is unreadable
pub fn lookup(kind: IndexKind, bytes: &[u8], address: u64, nearest: bool) -> CliResult<String>
{
    debug!(?kind, address, nearest, "lookup");
    let mut out = String::new();
    match kind {
        IndexKind::Address => {
            let view = StaticAddressMap::<u64, &str>::new(bytes)?;
            let (name, stored) = view.retrieve(address).ok_or(CliError::NotFound(address))?;
            out.push_str(&format!("0x{stored:x} {name}\n"));
        }
        IndexKind::Range => {
            let view = StaticRangeMap::<u64, &str>::new(bytes)?;
            let found = if nearest {
                view.retrieve_nearest_range(address)
            } else {
                view.retrieve_range(address)
            };
            let found = found.ok_or(CliError::NotFound(address))?;
            out.push_str(&format!("0x{:x} 0x{:x} {}\n", found.base, found.size, found.entry));
        }
        IndexKind::Contained => {
            if nearest {
                return Err(CliError::Unsupported(
                    "--nearest applies to address and range indexes".to_string(),
                ));
            }
            let view = StaticContainedRangeMap::<u64, &str>::new(bytes)?;
            let names = view.retrieve_ranges(address);
            if names.is_empty() {
                return Err(CliError::NotFound(address));
            }
            for (depth, name) in names.iter().enumerate() {
                out.push_str(&format!("{:indent$}{name}\n", "", indent = depth * 2));
            }
        }
    }
    Ok(out)
}

/// Run the structural validator for `kind` and report the entry count.
///
/// ## Errors
///
/// Returns [`CliError::Index`] with [`IndexError::MalformedBuffer`] describing
/// the first problem found.
pub fn validate(kind: IndexKind, bytes: &[u8]) -> CliResult<String>
{
    let count = match kind {
        IndexKind::Address => {
            let view = StaticAddressMap::<u64, &str>::new(bytes)?;
            view.validate_in_memory_structure()?;
            view.len()
        }
        IndexKind::Range => {
            let view = StaticRangeMap::<u64, &str>::new(bytes)?;
            view.validate_in_memory_structure()?;
            view.len()
        }
        IndexKind::Contained => {
            let view = StaticContainedRangeMap::<u64, &str>::new(bytes)?;
            view.validate_in_memory_structure()?;
            view.child_count()
        }
    };
    Ok(format!("ok: {count} top-level entries, {} bytes\n", bytes.len()))
}

/// List every entry in address order.
///
/// ## Errors
///
/// - [`CliError::Unsupported`] for contained indexes
/// - [`CliError::Index`] if the buffer header is unreadable
pub fn dump(kind: IndexKind, bytes: &[u8]) -> CliResult<String>
{
    let mut out = String::new();
    match kind {
        IndexKind::Address => {
            let view = StaticAddressMap::<u64, &str>::new(bytes)?;
            for (address, name) in view.as_map().iter() {
                out.push_str(&format!("0x{address:x} {name}\n"));
            }
        }
        IndexKind::Range => {
            let view = StaticRangeMap::<u64, &str>::new(bytes)?;
            for found in view.iter() {
                out.push_str(&format!("0x{:x} 0x{:x} {}\n", found.base, found.size, found.entry));
            }
        }
        IndexKind::Contained => {
            return Err(CliError::Unsupported("dump applies to address and range indexes".to_string()));
        }
    }
    Ok(out)
}
