use std::sync::mpsc::Receiver;
use std::thread::{self, JoinHandle};

use midir::{MidiOutput, MidiOutputConnection};

use crate::errors::BridgeError;

/// Client names shown to the OS MIDI system.
const CLIENT_NAME: &str = "osc-sq-bridge";
const CONNECTION_NAME: &str = "osc-sq-bridge-output";

/// Open the hardware MIDI output port whose name contains `port_name_substr`.
/// Falls back to the only port when exactly one exists; anything else is an
/// error, there is no interactive selection in a long-running bridge.
pub fn open_output_port(port_name_substr: &str) -> Result<MidiOutputConnection, BridgeError> {
    let midi_out =
        MidiOutput::new(CLIENT_NAME).map_err(|err| BridgeError::MidiPort(err.to_string()))?;
    let ports = midi_out.ports();
    if ports.is_empty() {
        return Err(BridgeError::MidiPort("no MIDI output port found".to_string()));
    }

    // Try substring match first
    let mut chosen = None;
    for (i, port) in ports.iter().enumerate() {
        if let Ok(name) = midi_out.port_name(port) {
            if !port_name_substr.is_empty() && name.contains(port_name_substr) {
                println!("Choosing output port matching '{}': {}", port_name_substr, name);
                chosen = Some(i);
                break;
            }
        }
    }

    let idx = match chosen {
        Some(i) => i,
        None if ports.len() == 1 => {
            let name = midi_out
                .port_name(&ports[0])
                .map_err(|err| BridgeError::MidiPort(err.to_string()))?;
            println!("Choosing the only available output port: {}", name);
            0
        }
        None => {
            return Err(BridgeError::MidiPort(format!(
                "no output port matching '{}'",
                port_name_substr
            )));
        }
    };

    midi_out
        .connect(&ports[idx], CONNECTION_NAME)
        .map_err(|err| BridgeError::MidiPort(err.to_string()))
}

/// Spawn the thread that owns `conn_out` and forwards byte sequences from
/// `rx`. Exits when every sender has been dropped.
pub fn spawn_port_forwarder(
    mut conn_out: MidiOutputConnection,
    rx: Receiver<Vec<u8>>,
) -> JoinHandle<()> {
    thread::spawn(move || {
        for msg in rx {
            if msg.is_empty() {
                continue;
            }
            if let Err(err) = conn_out.send(&msg) {
                eprintln!("Error sending MIDI message to output port: {}", err);
            }
        }
        // Receiver closed -> thread exits
    })
}
