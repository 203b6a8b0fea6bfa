use std::sync::mpsc::Sender;
use std::sync::Arc;

use crate::errors::BridgeError;
use crate::midi;
use crate::midi_sender::{self, Destination};

/// Where translated MIDI goes: a transient UDP datagram per message, or a
/// channel into the thread that owns the hardware MIDI port connection.
///
/// Shared between the listener thread and the console handler; two
/// concurrent sends race at the transport layer with no mutual exclusion.
pub enum MidiOut {
    Udp { destination: Arc<Destination> },
    Port { tx: Sender<Vec<u8>> },
}

impl MidiOut {
    pub fn send(&self, bytes: &[u8]) -> Result<(), BridgeError> {
        match self {
            MidiOut::Udp { destination } => {
                let dest = destination.get();
                midi_sender::send_midi(bytes, dest)?;
                if crate::is_debug_enabled() {
                    println!("Sent MIDI: {} to {}", midi::hex_string(bytes), dest);
                }
                Ok(())
            }
            MidiOut::Port { tx } => tx
                .send(bytes.to_vec())
                .map_err(|_| BridgeError::MidiPort("output thread stopped".to_string())),
        }
    }
}
