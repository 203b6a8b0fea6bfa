//! Raw MIDI byte-sequence builders for the SQ control scheme.
//!
//! All builders are pure: no I/O, no state, deterministic for given inputs.
//! The SQ maps Control Change to fader levels, Note On velocity to mute
//! state, and Bank Select + Program Change to scene recall.

const NOTE_ON: u8 = 0x90;
const CONTROL_CHANGE: u8 = 0xB0;
const PROGRAM_CHANGE: u8 = 0xC0;
const CHANNEL_MASK: u8 = 0x0F;

/// Bank Select controller number.
const BANK_SELECT_CC: u8 = 0x00;

/// Scenes are addressed as bank * 128 + program.
const SCENE_BANK_SIZE: u16 = 128;

/// Build a 3-byte Control Change message. `channel` is masked to the low
/// status nibble; out-of-range channels wrap rather than error. `controller`
/// and `value` are expected in 0..=127 but not enforced here.
pub fn control_change(channel: u8, controller: u8, value: u8) -> [u8; 3] {
    [CONTROL_CHANGE | (channel & CHANNEL_MASK), controller, value]
}

/// Build a 3-byte Note On message. Same masking policy as `control_change`.
pub fn note_on(channel: u8, note: u8, velocity: u8) -> [u8; 3] {
    [NOTE_ON | (channel & CHANNEL_MASK), note, velocity]
}

/// Build the 5-byte scene recall sequence: Bank Select CC followed by
/// Program Change, both on the same channel. `scene` is 1-based and must be
/// validated to 1..=300 by the caller.
pub fn scene_recall(channel: u8, scene: u16) -> [u8; 5] {
    debug_assert!(scene >= 1, "scene numbers are 1-based");
    let bank = ((scene - 1) / SCENE_BANK_SIZE) as u8;
    let program = ((scene - 1) % SCENE_BANK_SIZE) as u8;
    [
        CONTROL_CHANGE | (channel & CHANNEL_MASK),
        BANK_SELECT_CC,
        bank,
        PROGRAM_CHANGE | (channel & CHANNEL_MASK),
        program,
    ]
}

/// Scale a fader level in 0.0..=1.0 to a 7-bit MIDI value, truncating toward
/// zero. Out-of-range floats saturate (negative and NaN to 0, large to 255);
/// values above 1.0 are not clamped to 127.
pub fn fader_value(level: f32) -> u8 {
    (level * 127.0) as u8
}

/// Hex-format a byte sequence for log lines, e.g. "B0 00 3F".
pub fn hex_string(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| format!("{:02X}", b))
        .collect::<Vec<_>>()
        .join(" ")
}
