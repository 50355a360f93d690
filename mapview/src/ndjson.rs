//! NDJSON front end for `emit_array`.
//!
//! Each non-empty input line is one `{data, key, extra_keys?}` object; each
//! emission becomes one `{"key": [...], "value": ...}` output line.

use std::io::{self, BufRead, Write};

use mapview_core::emit::{Emission, Emit, EmitArray};
#[cfg(feature = "telemetry")]
use mapview_core::telemetry::Traced;
use mapview_core::value::{Key, Value};

/// Stream NDJSON emission requests from `input` to `out`.
///
/// Returns the number of emissions written.
pub fn emit_ndjson<R: BufRead, W: Write>(input: R, mut out: W) -> io::Result<usize> {
    let mut written = 0usize;
    for (i, line) in input.lines().enumerate() {
        let line = line.map_err(|e| {
            io::Error::new(e.kind(), format!("unreadable ndjson at line {}: {}", i + 1, e))
        })?;
        if line.trim().is_empty() {
            continue;
        }
        let req: EmitArray = serde_json::from_str(&line).map_err(|e| {
            io::Error::new(
                io::ErrorKind::InvalidData,
                format!("invalid ndjson at line {}: {}", i + 1, e),
            )
        })?;

        #[cfg(feature = "telemetry")]
        let n = req.emit_into(&mut Traced::new("ndjson", RowWriter(&mut out)))?;
        #[cfg(not(feature = "telemetry"))]
        let n = req.emit_into(&mut RowWriter(&mut out))?;
        tracing::debug!(line = i + 1, emitted = n, "document emitted");
        written += n;
    }
    out.flush()?;
    Ok(written)
}

/// Writes each emission as one NDJSON line.
struct RowWriter<'a, W>(&'a mut W);

impl<W: Write> Emit for RowWriter<'_, W> {
    type Error = io::Error;

    fn emit(&mut self, key: Key, value: Value) -> io::Result<()> {
        serde_json::to_writer(&mut *self.0, &Emission { key, value })?;
        self.0.write_all(b"\n")
    }
}
