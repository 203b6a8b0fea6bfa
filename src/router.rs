use rosc::{OscMessage, OscType};

use crate::midi;

/// Input channels on the SQ surface addressable over OSC.
pub const MIN_INPUT: u8 = 1;
pub const MAX_INPUT: u8 = 48;

#[derive(Debug, Clone, Copy)]
enum ControlKind {
    Fader,
    Mute,
}

/// One row of the dispatch table: literal path segments with a single `{n}`
/// capturing the 1-based input channel. Extending the mapping is a data
/// change, not a new dispatch branch.
struct Mapping {
    template: &'static [&'static str],
    kind: ControlKind,
}

const MAPPINGS: &[Mapping] = &[
    Mapping {
        template: &["fader", "{n}"],
        kind: ControlKind::Fader,
    },
    Mapping {
        template: &["mute", "{n}"],
        kind: ControlKind::Mute,
    },
    Mapping {
        template: &["sq", "input", "{n}", "fader"],
        kind: ControlKind::Fader,
    },
    Mapping {
        template: &["sq", "input", "{n}", "mute"],
        kind: ControlKind::Mute,
    },
];

/// Pure outcome of routing one OSC message. The listener performs the send,
/// so translation stays testable without sockets.
#[derive(Debug, Clone, PartialEq)]
pub enum Translation {
    /// MIDI bytes to transmit plus a human description for the log.
    Send { bytes: Vec<u8>, action: String },
    /// Address matches no translation rule.
    Unmapped,
    /// Recognized address with a missing or wrong-typed first argument.
    WrongArgument { expected: &'static str },
    /// Recognized address whose `{n}` segment is not a channel in 1..=48.
    InvalidChannel { index: String },
}

pub struct Router {
    /// Zero-based MIDI channel nibble the SQ listens on.
    midi_channel: u8,
}

impl Router {
    pub fn new(midi_channel: u8) -> Self {
        Router { midi_channel }
    }

    /// Translate one decoded OSC message. Total over all addresses; never
    /// performs I/O.
    pub fn route(&self, msg: &OscMessage) -> Translation {
        let segments: Vec<&str> = msg.addr.trim_matches('/').split('/').collect();

        for mapping in MAPPINGS {
            if let Some(index) = capture_channel(&segments, mapping.template) {
                let input = match index.parse::<u8>() {
                    Ok(n) if (MIN_INPUT..=MAX_INPUT).contains(&n) => n,
                    _ => {
                        return Translation::InvalidChannel {
                            index: index.to_string(),
                        }
                    }
                };
                return self.translate(mapping.kind, input, msg.args.first());
            }
        }
        Translation::Unmapped
    }

    fn translate(&self, kind: ControlKind, input: u8, arg: Option<&OscType>) -> Translation {
        match kind {
            ControlKind::Fader => match arg {
                Some(OscType::Float(level)) => {
                    let value = midi::fader_value(*level);
                    Translation::Send {
                        bytes: midi::control_change(self.midi_channel, input - 1, value).to_vec(),
                        action: format!("Set Input {} fader to {}", input, value),
                    }
                }
                _ => Translation::WrongArgument { expected: "float32" },
            },
            ControlKind::Mute => match arg {
                Some(OscType::Int(state)) => {
                    let (velocity, action) = if *state == 1 {
                        (127, format!("Muted Input {}", input))
                    } else {
                        (0, format!("Unmuted Input {}", input))
                    };
                    Translation::Send {
                        bytes: midi::note_on(self.midi_channel, input - 1, velocity).to_vec(),
                        action,
                    }
                }
                _ => Translation::WrongArgument { expected: "int32" },
            },
        }
    }
}

/// Match `segments` against `template`, returning the text captured by the
/// `{n}` segment. `None` when the shapes differ.
fn capture_channel<'a>(segments: &[&'a str], template: &[&str]) -> Option<&'a str> {
    if segments.len() != template.len() {
        return None;
    }
    let mut captured = None;
    for (segment, pattern) in segments.iter().zip(template) {
        if *pattern == "{n}" {
            captured = Some(*segment);
        } else if segment != pattern {
            return None;
        }
    }
    captured
}
