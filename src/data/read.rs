//! Read-back helpers for artifacts and the ledger.
//!
//! The capture path only appends; these helpers serve inspection and tests.

use super::Sample;
use crate::error::{CaptureError, CaptureResult};
use std::io::{BufRead, BufReader, Read, Seek, SeekFrom};

/// Line buffer size used when no explicit limit is given.
pub const DEFAULT_MAX_LINE: usize = 50;

/// Read one line starting at byte `offset`, accepting at most `max_len` bytes
/// including the terminator.
///
/// Returns `Ok(None)` at end of file. A final line without terminator is returned as is.
/// A line that does not fit fails with [`CaptureError::LineTooLong`].
pub fn read_line_at<R: Read + Seek>(
    reader: &mut R,
    offset: u64,
    max_len: usize,
) -> CaptureResult<Option<String>> {
    reader.seek(SeekFrom::Start(offset))?;

    let mut buf = Vec::with_capacity(max_len);
    let mut limited = BufReader::new((&mut *reader).take(max_len as u64));
    let n = limited.read_until(b'\n', &mut buf)?;
    if n == 0 {
        return Ok(None);
    }
    if buf.last() != Some(&b'\n') && n == max_len {
        return Err(CaptureError::LineTooLong { offset, max_len });
    }

    while matches!(buf.last(), Some(b'\n' | b'\r')) {
        buf.pop();
    }
    let line = String::from_utf8(buf)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
    Ok(Some(line))
}

/// Read the `row`-th line (1-based) of a file whose lines are all `row_bytes` long,
/// terminator included.
///
/// Row 0 fails with [`CaptureError::InvalidRow`].
pub fn read_row<R: Read + Seek>(
    reader: &mut R,
    row: u64,
    row_bytes: u64,
    max_len: usize,
) -> CaptureResult<Option<String>> {
    if row == 0 {
        return Err(CaptureError::InvalidRow { row });
    }
    let offset = (row - 1) * row_bytes;
    read_line_at(reader, offset, max_len)
}

/// Parse a headerless capture artifact back into per-sample rows.
pub fn read_window<R: Read>(reader: R) -> CaptureResult<Vec<Vec<Sample>>> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .from_reader(reader);

    let mut rows = Vec::new();
    for record in csv_reader.records() {
        let record = record.map_err(|e| CaptureError::Io(e.into()))?;
        let row = record
            .iter()
            .map(|field| {
                field.trim().parse::<Sample>().map_err(|e| {
                    CaptureError::Io(std::io::Error::new(std::io::ErrorKind::InvalidData, e))
                })
            })
            .collect::<CaptureResult<Vec<_>>>()?;
        rows.push(row);
    }
    Ok(rows)
}
