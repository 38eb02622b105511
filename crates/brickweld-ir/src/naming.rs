//! Connector and part naming conventions.
//!
//! Asset exporters disambiguate duplicate object names by appending a
//! three-digit counter (`peg_A` becomes `peg_A001`, `peg_A002`, ...). Names
//! that differ only in that counter refer to the same definition.

use serde::{Deserialize, Serialize};

/// Length of the exporter's duplicate counter.
const SUFFIX_LEN: usize = 3;

/// The two halves of a snap connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectorKind {
    /// Protruding stud.
    Peg,
    /// Receiving socket.
    Hole,
}

impl ConnectorKind {
    /// The kind this one mates with.
    pub fn complement(self) -> Self {
        match self {
            ConnectorKind::Peg => ConnectorKind::Hole,
            ConnectorKind::Hole => ConnectorKind::Peg,
        }
    }

    /// Name prefix used in asset files.
    pub fn prefix(self) -> &'static str {
        match self {
            ConnectorKind::Peg => "peg",
            ConnectorKind::Hole => "hole",
        }
    }
}

/// Strip the exporter's three-digit duplicate counter, if present.
///
/// The counter is only removed when something is left in front of it, so
/// `"A001"` becomes `"A"` but `"001"` is kept as-is.
pub fn strip_numeric_suffix(name: &str) -> &str {
    let bytes = name.as_bytes();
    if bytes.len() <= SUFFIX_LEN {
        return name;
    }
    let split = bytes.len() - SUFFIX_LEN;
    if bytes[split..].iter().all(u8::is_ascii_digit) {
        &name[..split]
    } else {
        name
    }
}

/// Parse a connector object name of the form `peg_<channel>NNN` or
/// `hole_<channel>NNN`.
///
/// Returns the kind and the channel with any duplicate counter removed, or
/// `None` when the name does not follow the convention.
pub fn parse_connector_name(name: &str) -> Option<(ConnectorKind, String)> {
    let (prefix, rest) = name.split_once('_')?;
    let kind = match prefix {
        "peg" => ConnectorKind::Peg,
        "hole" => ConnectorKind::Hole,
        _ => return None,
    };
    // Anything after a second underscore is decoration, not channel.
    let channel = rest.split('_').next().unwrap_or(rest);
    let channel = strip_numeric_suffix(channel);
    if channel.is_empty() {
        return None;
    }
    Some((kind, channel.to_string()))
}

/// Part definition name for an instance name (`brick2x2001` -> `brick2x2`).
pub fn part_name_for_instance(instance: &str) -> &str {
    strip_numeric_suffix(instance)
}
