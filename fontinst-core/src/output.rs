//! Streaming output helpers (made by FontLab https://www.fontlab.com/)

use std::io::Write;

use anyhow::Result;

use crate::batch::{BatchSummary, FileReport};

/// Write the whole summary as prettified JSON.
pub fn write_json_pretty(summary: &BatchSummary, mut w: impl Write) -> Result<()> {
    let json = serde_json::to_string_pretty(summary)?;
    w.write_all(json.as_bytes())?;
    w.write_all(b"\n")?;
    Ok(())
}

/// Write per-file records as newline-delimited JSON (NDJSON).
pub fn write_ndjson(details: &[FileReport], mut w: impl Write) -> Result<()> {
    for item in details {
        let line = serde_json::to_string(item)?;
        w.write_all(line.as_bytes())?;
        w.write_all(b"\n")?;
    }
    Ok(())
}
