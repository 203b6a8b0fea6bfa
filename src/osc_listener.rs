use std::net::UdpSocket;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use rosc::{decoder, OscPacket};

use crate::events::{BridgeEvent, EventSink};
use crate::output::MidiOut;
use crate::router::{Router, Translation};

/// Mirrors whether the listener thread holds a bound socket, for the startup
/// status banner.
static LISTENER_RUNNING: AtomicBool = AtomicBool::new(false);

pub fn is_listener_running() -> bool {
    LISTENER_RUNNING.load(Ordering::SeqCst)
}

/// Interval at which the accept loop re-checks the shutdown flag.
const POLL_TIMEOUT: Duration = Duration::from_millis(200);

/// Spawns a background thread that listens for OSC on `bind_addr` and
/// translates every decoded message. The thread checks `shutdown`
/// periodically to stop gracefully.
pub fn spawn_osc_listener(
    bind_addr: String,
    router: Router,
    output: Arc<MidiOut>,
    sink: Arc<dyn EventSink>,
    shutdown: Arc<AtomicBool>,
) -> JoinHandle<()> {
    thread::spawn(move || {
        let socket = match UdpSocket::bind(&bind_addr) {
            Ok(s) => s,
            Err(err) => {
                sink.emit(BridgeEvent::ListenerFailed {
                    addr: bind_addr,
                    detail: err.to_string(),
                });
                return;
            }
        };

        LISTENER_RUNNING.store(true, Ordering::SeqCst);
        sink.emit(BridgeEvent::ListenerStarted { addr: bind_addr });

        run_listener(&socket, &router, &output, &*sink, &shutdown);

        LISTENER_RUNNING.store(false, Ordering::SeqCst);
        sink.emit(BridgeEvent::ListenerStopped);
    })
}

/// Accept-decode-dispatch loop over an already bound socket. Runs until
/// `shutdown` is set; split out so tests can drive it on an ephemeral port.
pub fn run_listener(
    socket: &UdpSocket,
    router: &Router,
    output: &MidiOut,
    sink: &dyn EventSink,
    shutdown: &AtomicBool,
) {
    // Timeout so the loop can check the shutdown flag between datagrams
    socket.set_read_timeout(Some(POLL_TIMEOUT)).ok();

    let mut buf = [0u8; decoder::MTU];

    loop {
        if shutdown.load(Ordering::SeqCst) {
            break;
        }

        match socket.recv_from(&mut buf) {
            Ok((size, peer)) => match decoder::decode_udp(&buf[..size]) {
                Ok((_, packet)) => handle_packet(packet, router, output, sink),
                Err(err) => sink.emit(BridgeEvent::DecodeError {
                    peer,
                    detail: err.to_string(),
                }),
            },
            Err(ref e)
                if e.kind() == std::io::ErrorKind::WouldBlock
                    || e.kind() == std::io::ErrorKind::TimedOut =>
            {
                // Timeout, continue loop to check the shutdown flag
                continue;
            }
            Err(err) => sink.emit(BridgeEvent::ReceiveError {
                detail: err.to_string(),
            }),
        }
    }
}

/// Bundles are flattened recursively; time tags are not interpreted.
fn handle_packet(packet: OscPacket, router: &Router, output: &MidiOut, sink: &dyn EventSink) {
    match packet {
        OscPacket::Message(msg) => handle_message(msg, router, output, sink),
        OscPacket::Bundle(bundle) => {
            for pkt in bundle.content {
                handle_packet(pkt, router, output, sink);
            }
        }
    }
}

fn handle_message(msg: rosc::OscMessage, router: &Router, output: &MidiOut, sink: &dyn EventSink) {
    sink.emit(BridgeEvent::OscReceived {
        addr: msg.addr.clone(),
        args: format!("{:?}", msg.args),
    });

    match router.route(&msg) {
        Translation::Send { bytes, action } => match output.send(&bytes) {
            Ok(()) => sink.emit(BridgeEvent::Action { description: action }),
            Err(err) => sink.emit(BridgeEvent::SendFailed {
                detail: err.to_string(),
            }),
        },
        Translation::Unmapped => sink.emit(BridgeEvent::Unmapped { addr: msg.addr }),
        Translation::WrongArgument { expected } => sink.emit(BridgeEvent::WrongArgument {
            addr: msg.addr,
            expected,
        }),
        Translation::InvalidChannel { index } => sink.emit(BridgeEvent::InvalidChannel {
            addr: msg.addr,
            index,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::midi_sender::Destination;
    use rosc::{encoder, OscBundle, OscMessage, OscType};
    use std::sync::Mutex;

    struct RecordingSink(Mutex<Vec<BridgeEvent>>);

    impl RecordingSink {
        fn new() -> Self {
            RecordingSink(Mutex::new(Vec::new()))
        }
    }

    impl EventSink for RecordingSink {
        fn emit(&self, event: BridgeEvent) {
            self.0.lock().unwrap().push(event);
        }
    }

    fn encode_message(addr: &str, args: Vec<OscType>) -> Vec<u8> {
        encoder::encode(&OscPacket::Message(OscMessage {
            addr: addr.to_string(),
            args,
        }))
        .unwrap()
    }

    struct Harness {
        listen_addr: std::net::SocketAddr,
        midi_receiver: UdpSocket,
        client: UdpSocket,
        sink: Arc<RecordingSink>,
        shutdown: Arc<AtomicBool>,
        handle: JoinHandle<()>,
    }

    impl Harness {
        fn start() -> Self {
            let listen = UdpSocket::bind("127.0.0.1:0").unwrap();
            let listen_addr = listen.local_addr().unwrap();

            let midi_receiver = UdpSocket::bind("127.0.0.1:0").unwrap();
            midi_receiver
                .set_read_timeout(Some(Duration::from_secs(2)))
                .unwrap();
            let destination = Arc::new(Destination::new(midi_receiver.local_addr().unwrap()));

            let sink = Arc::new(RecordingSink::new());
            let shutdown = Arc::new(AtomicBool::new(false));

            let handle = {
                let sink = sink.clone();
                let shutdown = shutdown.clone();
                thread::spawn(move || {
                    let output = MidiOut::Udp { destination };
                    run_listener(&listen, &Router::new(0), &output, &*sink, &shutdown)
                })
            };

            Harness {
                listen_addr,
                midi_receiver,
                client: UdpSocket::bind("127.0.0.1:0").unwrap(),
                sink,
                shutdown,
                handle,
            }
        }

        fn send(&self, packet: &[u8]) {
            self.client.send_to(packet, self.listen_addr).unwrap();
        }

        fn recv_midi(&self) -> Vec<u8> {
            let mut buf = [0u8; 16];
            let (size, _) = self.midi_receiver.recv_from(&mut buf).unwrap();
            buf[..size].to_vec()
        }

        fn stop(self) -> Vec<BridgeEvent> {
            self.shutdown.store(true, Ordering::SeqCst);
            self.handle.join().unwrap();
            self.sink.0.lock().unwrap().clone()
        }
    }

    #[test]
    fn translates_datagrams_end_to_end_and_stops_on_shutdown() {
        let harness = Harness::start();

        harness.send(&encode_message("/fader/1", vec![OscType::Float(0.5)]));
        assert_eq!(harness.recv_midi(), vec![0xB0, 0x00, 63]);

        harness.send(&encode_message("/mute/1", vec![OscType::Int(1)]));
        assert_eq!(harness.recv_midi(), vec![0x90, 0x00, 127]);

        let events = harness.stop();
        assert!(events
            .iter()
            .any(|e| matches!(e, BridgeEvent::Action { description } if description == "Set Input 1 fader to 63")));
    }

    #[test]
    fn decode_failure_does_not_stop_the_loop() {
        let harness = Harness::start();

        // Not an OSC packet; the loop must report it and keep serving
        harness.send(&[0x01, 0x02, 0x03]);
        harness.send(&encode_message("/mute/2", vec![OscType::Int(0)]));
        assert_eq!(harness.recv_midi(), vec![0x90, 0x01, 0]);

        let events = harness.stop();
        assert!(events.iter().any(|e| matches!(e, BridgeEvent::DecodeError { .. })));
    }

    #[test]
    fn unmapped_and_wrong_argument_send_nothing() {
        let harness = Harness::start();

        harness.send(&encode_message("/unknown/path", vec![OscType::Float(0.5)]));
        harness.send(&encode_message("/fader/1", vec![OscType::Int(64)]));
        // This one must be the first datagram to reach the MIDI receiver
        harness.send(&encode_message("/fader/1", vec![OscType::Float(1.0)]));
        assert_eq!(harness.recv_midi(), vec![0xB0, 0x00, 127]);

        let events = harness.stop();
        assert!(events
            .iter()
            .any(|e| matches!(e, BridgeEvent::Unmapped { addr } if addr == "/unknown/path")));
        assert!(events
            .iter()
            .any(|e| matches!(e, BridgeEvent::WrongArgument { expected, .. } if *expected == "float32")));
    }

    #[test]
    fn bundles_are_flattened_in_order() {
        let harness = Harness::start();

        let bundle = OscPacket::Bundle(OscBundle {
            timetag: (0, 1).into(),
            content: vec![
                OscPacket::Message(OscMessage {
                    addr: "/fader/1".to_string(),
                    args: vec![OscType::Float(0.0)],
                }),
                OscPacket::Message(OscMessage {
                    addr: "/mute/1".to_string(),
                    args: vec![OscType::Int(1)],
                }),
            ],
        });
        harness.send(&encoder::encode(&bundle).unwrap());

        assert_eq!(harness.recv_midi(), vec![0xB0, 0x00, 0]);
        assert_eq!(harness.recv_midi(), vec![0x90, 0x00, 127]);
        harness.stop();
    }
}
