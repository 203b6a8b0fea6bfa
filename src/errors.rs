use thiserror::Error;

/// Errors surfaced by the translation core to its callers.
///
/// Range and destination errors are raised before any MIDI is built, so a
/// rejected trigger never reaches the wire. Transport errors carry the
/// underlying socket failure.
#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("{what} {value} out of range {min}..={max}")]
    Range {
        what: &'static str,
        value: i64,
        min: i64,
        max: i64,
    },

    #[error("invalid destination '{0}'")]
    BadDestination(String),

    #[error("transport error: {0}")]
    Transport(#[from] std::io::Error),

    #[error("MIDI port error: {0}")]
    MidiPort(String),
}
