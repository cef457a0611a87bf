//! Log output configuration.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Output format for the daemon's structured logs.
#[derive(
    Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq, EnumString, Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum LogFormat {
    /// Human-readable single-line output, the default for a daemon whose
    /// stderr is collected by the desktop application shell.
    #[default]
    Compact,
    /// Structured JSON for ingestion by logging stacks.
    Json,
}

/// Errors encountered while parsing a [`LogFormat`] from text.
pub type LogFormatParseError = strum::ParseError;
