//! # Address Tables
//!
//! The text input of `symdex build`: one record per line,
//!
//! ```text
//! # base   size  name
//! 1000     80    main
//! 0x1080   20    helper function
//! ```
//!
//! Base and size are hexadecimal with an optional `0x` prefix. The name is the
//! rest of the line and may contain spaces. Blank lines and lines starting with
//! `#` are ignored.

use crate::error::{CliError, CliResult};

/// One record of an address table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableRow
{
    /// 1-based line number in the source text
    pub line: usize,
    pub base: u64,
    pub size: u64,
    pub name: String,
}

/// Parse every record of `text`.
///
/// ## Errors
///
/// Returns [`CliError::Table`] for the first line that is not a valid record.
pub fn parse_table(text: &str) -> CliResult<Vec<TableRow>>
{
    let mut rows = Vec::new();
    for (index, raw) in text.lines().enumerate() {
        let line = index + 1;
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        rows.push(parse_row(line, trimmed)?);
    }
    Ok(rows)
}

fn parse_row(line: usize, text: &str) -> CliResult<TableRow>
{
    let table_error = |message: String| CliError::Table { line, message };

    let (base, rest) = next_field(text);
    let (size, name) = next_field(rest);
    let name = name.trim();
    if name.is_empty() {
        return Err(table_error("expected `<base> <size> <name>`".to_string()));
    }

    let base = parse_hex(base).ok_or_else(|| table_error(format!("invalid base `{base}`")))?;
    let size = parse_hex(size).ok_or_else(|| table_error(format!("invalid size `{size}`")))?;
    Ok(TableRow {
        line,
        base,
        size,
        name: name.to_string(),
    })
}

/// Split off the first whitespace-delimited field.
fn next_field(text: &str) -> (&str, &str)
{
    let text = text.trim_start();
    let end = text.find(char::is_whitespace).unwrap_or(text.len());
    text.split_at(end)
}

/// Parse a hexadecimal number with an optional `0x`/`0X` prefix.
pub fn parse_hex(text: &str) -> Option<u64>
{
    let digits = text
        .strip_prefix("0x")
        .or_else(|| text.strip_prefix("0X"))
        .unwrap_or(text);
    if digits.is_empty() {
        return None;
    }
    u64::from_str_radix(digits, 16).ok()
}
