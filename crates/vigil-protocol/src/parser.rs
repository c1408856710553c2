//! The command-vocabulary parser.
//!
//! Matching is case-insensitive and whitespace-trimmed. Two strictness
//! levels exist because the deployed sensors differ: the radar module
//! publishes prose-ish status strings ("Human fall detected!") where a
//! substring match is appropriate, while the serial firmware emits bare
//! `FALL` / `STAND` tokens where a token match avoids false positives
//! like "rainfall". Strictness is configured per transport, not baked in.

use serde::Deserialize;

use vigil_core::Command;

/// Fall vocabulary: English keyword plus the localized sensor keyword.
const FALL_KEYWORDS: &[&str] = &["fall", "跌倒"];

/// Stand vocabulary: English keyword plus the localized sensor keyword.
const STAND_KEYWORDS: &[&str] = &["stand", "站立"];

/// How strictly a payload must match the command vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchMode {
    /// Keyword may appear anywhere in the payload.
    Substring,

    /// Keyword must be a whole whitespace-separated token.
    ExactToken,
}

/// Parses one payload into a command.
///
/// Total: never fails, never panics. Fall is checked before stand, so a
/// payload containing both reads as a fall.
pub fn parse(raw: &str, mode: MatchMode) -> Command {
    let normalized = raw.trim().to_lowercase();

    if matches_any(&normalized, FALL_KEYWORDS, mode) {
        return Command::Fall;
    }
    if matches_any(&normalized, STAND_KEYWORDS, mode) {
        return Command::Stand;
    }

    Command::Unknown(raw.trim().to_string())
}

fn matches_any(normalized: &str, keywords: &[&str], mode: MatchMode) -> bool {
    match mode {
        MatchMode::Substring => keywords.iter().any(|kw| normalized.contains(kw)),
        MatchMode::ExactToken => normalized
            .split_whitespace()
            .any(|token| keywords.contains(&token)),
    }
}
