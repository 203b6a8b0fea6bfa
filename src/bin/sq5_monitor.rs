//! SQ5 console simulator for bench testing without the real desk: binds the
//! MIDI-over-UDP port and prints each datagram together with the console
//! action it encodes. Optional first argument overrides the port.

use std::error::Error;
use std::net::UdpSocket;

const DEFAULT_PORT: u16 = 51325;

fn main() -> Result<(), Box<dyn Error>> {
    let port = match std::env::args().nth(1) {
        Some(arg) => arg.parse::<u16>()?,
        None => DEFAULT_PORT,
    };

    let socket = UdpSocket::bind(("0.0.0.0", port))?;
    println!("SQ5 simulator listening on 0.0.0.0:{}...", port);

    let mut buf = [0u8; 1024];
    loop {
        let (size, peer) = socket.recv_from(&mut buf)?;
        let data = &buf[..size];
        let hex: Vec<String> = data.iter().map(|b| format!("{:02X}", b)).collect();
        println!("From {}: {}", peer, hex.join(" "));
        for action in describe_datagram(data) {
            println!("  -> {}", action);
        }
    }
}

/// Walk the chained MIDI messages in one datagram and describe each. A Bank
/// Select CC directly before a Program Change is half of a scene recall, not
/// a fader move.
fn describe_datagram(data: &[u8]) -> Vec<String> {
    if data.len() < 2 {
        return vec!["Incomplete MIDI message".to_string()];
    }

    let mut actions = Vec::new();
    let mut pending_bank: Option<u8> = None;
    let mut pos = 0;
    while pos < data.len() {
        let command = data[pos] & 0xF0;
        let len = if command == 0xC0 { 2 } else { 3 };
        if pos + len > data.len() {
            actions.push("Incomplete MIDI message".to_string());
            break;
        }
        let message = &data[pos..pos + len];

        let next_is_program_change = data
            .get(pos + len)
            .map(|next| next & 0xF0 == 0xC0)
            .unwrap_or(false);
        if command == 0xB0 && message[1] == 0x00 && next_is_program_change {
            pending_bank = Some(message[2]);
            actions.push(format!("Select Bank {}", message[2]));
        } else if command == 0xC0 {
            let bank = pending_bank.take().unwrap_or(0) as u16;
            let scene = bank * 128 + message[1] as u16 + 1;
            actions.push(format!("Recall Scene {}", scene));
        } else {
            actions.push(describe_message(message));
        }
        pos += len;
    }
    actions
}

fn describe_message(message: &[u8]) -> String {
    let status = message[0];
    let command = status & 0xF0;

    match command {
        // Control Change = fader moves
        0xB0 => {
            let cc = message[1];
            let value = message[2];
            let percent = (value as u32 * 100) / 127;
            match cc {
                0x00..=0x1F => format!("Set Input {} fader to {}%", cc + 1, percent),
                0x20..=0x3F => {
                    format!("Set Mix Send to Mix 1 from Input {} to {}%", cc - 0x20 + 1, percent)
                }
                0x40..=0x5F => {
                    format!("Set Mix Send to Mix 2 from Input {} to {}%", cc - 0x40 + 1, percent)
                }
                0x60..=0x63 => format!("Set FX Return {} fader to {}%", cc - 0x60 + 1, percent),
                0x7F => format!("Set Main LR fader to {}%", percent),
                _ => format!("Unknown CC {:02X} with value {}", cc, value),
            }
        }
        // Note On = mute state
        0x90 => {
            let note = message[1];
            let state = if message[2] > 0 { "Mute" } else { "Unmute" };
            match note {
                0x00..=0x1F => format!("{} Input {}", state, note + 1),
                0x20..=0x2F => format!("{} Mix {}", state, note - 0x20 + 1),
                0x30..=0x33 => format!("{} FX Return {}", state, note - 0x30 + 1),
                0x3F => format!("{} Main LR", state),
                _ => format!("{} Unknown Note {:02X}", state, note),
            }
        }
        _ => format!("Unknown or unsupported MIDI command: {:02X}", status),
    }
}
