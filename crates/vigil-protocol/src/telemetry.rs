//! Fixed-grammar parser for temperature/humidity report lines.
//!
//! The sensor firmware prints lines like:
//!
//! ```text
//! Temp *C = 35.18    Hum. % = 32.59
//! ```
//!
//! Unlike the command vocabulary this is a strict full-pattern match:
//! either both numeric fields extract, or the line is not telemetry.

use std::sync::OnceLock;

use regex::Regex;

use vigil_core::TelemetryReading;

const TH_GRAMMAR: &str = r"Temp\s*\*C\s*=\s*([\d.]+)\s+Hum\.?\s*%\s*=\s*([\d.]+)";

fn th_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(TH_GRAMMAR).ok()).as_ref()
}

/// Extracts a telemetry reading from a line, if it matches the grammar.
///
/// Returns `None` for anything that is not a well-formed report line,
/// including numeric fields that fail to parse (e.g. "35.1.8").
pub fn parse_telemetry(line: &str) -> Option<TelemetryReading> {
    let caps = th_pattern()?.captures(line)?;

    let temperature_c = caps.get(1)?.as_str().parse::<f32>().ok()?;
    let humidity_pct = caps.get(2)?.as_str().parse::<f32>().ok()?;

    Some(TelemetryReading {
        temperature_c,
        humidity_pct,
    })
}
