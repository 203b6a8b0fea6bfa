use std::net::SocketAddr;
use std::sync::Arc;

use crate::errors::BridgeError;
use crate::events::{BridgeEvent, EventSink};
use crate::midi;
use crate::midi_sender::{self, Destination};
use crate::output::MidiOut;
use crate::router::{MAX_INPUT, MIN_INPUT};

pub const MIN_SCENE: u16 = 1;
pub const MAX_SCENE: u16 = 300;
pub const MAX_FADER_VALUE: u8 = 127;

/// Manual-trigger surface consumed by the console handler (and any future
/// front end), bypassing the OSC router. Every operation validates its
/// inputs before encoding; a rejected trigger sends nothing.
pub struct Controls {
    output: Arc<MidiOut>,
    destination: Arc<Destination>,
    /// Zero-based MIDI channel nibble the SQ listens on.
    midi_channel: u8,
    sink: Arc<dyn EventSink>,
}

impl Controls {
    pub fn new(
        output: Arc<MidiOut>,
        destination: Arc<Destination>,
        midi_channel: u8,
        sink: Arc<dyn EventSink>,
    ) -> Self {
        Controls {
            output,
            destination,
            midi_channel,
            sink,
        }
    }

    /// Replace the MIDI destination. Accepts `host[:port]`; a bare host gets
    /// the default SQ port appended.
    pub fn set_destination(&self, text: &str) -> Result<SocketAddr, BridgeError> {
        let addr = midi_sender::parse_destination(text)?;
        self.destination.set(addr);
        self.sink.emit(BridgeEvent::DestinationChanged { addr });
        Ok(addr)
    }

    pub fn send_fader_level(&self, input: u8, value: u8) -> Result<(), BridgeError> {
        check_input(input)?;
        if value > MAX_FADER_VALUE {
            return Err(BridgeError::Range {
                what: "fader value",
                value: value as i64,
                min: 0,
                max: MAX_FADER_VALUE as i64,
            });
        }
        self.output
            .send(&midi::control_change(self.midi_channel, input - 1, value))?;
        self.sink.emit(BridgeEvent::Action {
            description: format!("Sent fader for Input {} to {}", input, value),
        });
        Ok(())
    }

    pub fn send_mute_state(&self, input: u8, muted: bool) -> Result<(), BridgeError> {
        check_input(input)?;
        let velocity = if muted { 127 } else { 0 };
        self.output
            .send(&midi::note_on(self.midi_channel, input - 1, velocity))?;
        self.sink.emit(BridgeEvent::Action {
            description: format!("Mute status sent for Input {}", input),
        });
        Ok(())
    }

    pub fn recall_scene(&self, scene: u16) -> Result<(), BridgeError> {
        if !(MIN_SCENE..=MAX_SCENE).contains(&scene) {
            return Err(BridgeError::Range {
                what: "scene number",
                value: scene as i64,
                min: MIN_SCENE as i64,
                max: MAX_SCENE as i64,
            });
        }
        self.output
            .send(&midi::scene_recall(self.midi_channel, scene))?;
        self.sink.emit(BridgeEvent::Action {
            description: format!("Recalled Scene {}", scene),
        });
        Ok(())
    }
}

fn check_input(input: u8) -> Result<(), BridgeError> {
    if (MIN_INPUT..=MAX_INPUT).contains(&input) {
        Ok(())
    } else {
        Err(BridgeError::Range {
            what: "input channel",
            value: input as i64,
            min: MIN_INPUT as i64,
            max: MAX_INPUT as i64,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::UdpSocket;
    use std::time::Duration;

    struct NullSink;

    impl EventSink for NullSink {
        fn emit(&self, _: BridgeEvent) {}
    }

    fn controls_with_receiver() -> (Controls, UdpSocket) {
        let receiver = UdpSocket::bind("127.0.0.1:0").unwrap();
        receiver.set_read_timeout(Some(Duration::from_secs(2))).unwrap();
        let destination = Arc::new(Destination::new(receiver.local_addr().unwrap()));
        let output = Arc::new(MidiOut::Udp {
            destination: destination.clone(),
        });
        let controls = Controls::new(output, destination, 0, Arc::new(NullSink));
        (controls, receiver)
    }

    fn recv(receiver: &UdpSocket) -> Vec<u8> {
        let mut buf = [0u8; 16];
        let (size, _) = receiver.recv_from(&mut buf).unwrap();
        buf[..size].to_vec()
    }

    #[test]
    fn fader_within_range_sends_control_change() {
        let (controls, receiver) = controls_with_receiver();
        controls.send_fader_level(1, 64).unwrap();
        assert_eq!(recv(&receiver), vec![0xB0, 0, 64]);
        controls.send_fader_level(48, 0).unwrap();
        assert_eq!(recv(&receiver), vec![0xB0, 47, 0]);
    }

    #[test]
    fn input_channel_bounds_are_enforced() {
        let (controls, _receiver) = controls_with_receiver();
        assert!(matches!(
            controls.send_fader_level(0, 64),
            Err(BridgeError::Range { .. })
        ));
        assert!(matches!(
            controls.send_fader_level(49, 64),
            Err(BridgeError::Range { .. })
        ));
        assert!(matches!(
            controls.send_mute_state(0, true),
            Err(BridgeError::Range { .. })
        ));
        assert!(matches!(
            controls.send_mute_state(49, false),
            Err(BridgeError::Range { .. })
        ));
    }

    #[test]
    fn fader_value_above_seven_bits_is_rejected() {
        let (controls, _receiver) = controls_with_receiver();
        assert!(matches!(
            controls.send_fader_level(1, 128),
            Err(BridgeError::Range { .. })
        ));
    }

    #[test]
    fn mute_velocities() {
        let (controls, receiver) = controls_with_receiver();
        controls.send_mute_state(1, true).unwrap();
        assert_eq!(recv(&receiver), vec![0x90, 0, 127]);
        controls.send_mute_state(2, false).unwrap();
        assert_eq!(recv(&receiver), vec![0x90, 1, 0]);
    }

    #[test]
    fn scene_bounds_and_bytes() {
        let (controls, receiver) = controls_with_receiver();
        assert!(matches!(
            controls.recall_scene(0),
            Err(BridgeError::Range { .. })
        ));
        assert!(matches!(
            controls.recall_scene(301),
            Err(BridgeError::Range { .. })
        ));

        controls.recall_scene(129).unwrap();
        assert_eq!(recv(&receiver), vec![0xB0, 0x00, 1, 0xC0, 0]);
        controls.recall_scene(1).unwrap();
        assert_eq!(recv(&receiver), vec![0xB0, 0x00, 0, 0xC0, 0]);
        controls.recall_scene(300).unwrap();
        assert_eq!(recv(&receiver), vec![0xB0, 0x00, 2, 0xC0, 43]);
    }

    #[test]
    fn set_destination_redirects_the_next_send() {
        let (controls, first) = controls_with_receiver();
        let second = UdpSocket::bind("127.0.0.1:0").unwrap();
        second.set_read_timeout(Some(Duration::from_secs(2))).unwrap();

        controls.send_fader_level(1, 1).unwrap();
        assert_eq!(recv(&first), vec![0xB0, 0, 1]);

        controls
            .set_destination(&second.local_addr().unwrap().to_string())
            .unwrap();
        controls.send_fader_level(1, 2).unwrap();
        assert_eq!(recv(&second), vec![0xB0, 0, 2]);
    }

    #[test]
    fn invalid_destination_is_rejected_and_keeps_the_old_one() {
        let (controls, receiver) = controls_with_receiver();
        assert!(matches!(
            controls.set_destination(""),
            Err(BridgeError::BadDestination(_))
        ));
        assert!(matches!(
            controls.set_destination("host:notaport"),
            Err(BridgeError::BadDestination(_))
        ));

        controls.send_fader_level(1, 3).unwrap();
        assert_eq!(recv(&receiver), vec![0xB0, 0, 3]);
    }
}
