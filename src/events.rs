use std::io::Write;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

/// Structured reports emitted by the translation core. Rendering is the
/// sink's concern; the core never formats for display.
#[derive(Debug, Clone)]
pub enum BridgeEvent {
    ListenerStarted { addr: String },
    ListenerFailed { addr: String, detail: String },
    ListenerStopped,
    /// An inbound OSC message was decoded, before routing.
    OscReceived { addr: String, args: String },
    /// A translation rule fired and its MIDI was sent.
    Action { description: String },
    /// Address matched no translation rule; nothing was sent.
    Unmapped { addr: String },
    /// Recognized address with a missing or wrong-typed first argument.
    WrongArgument { addr: String, expected: &'static str },
    /// Recognized address whose channel segment is not a valid input number.
    InvalidChannel { addr: String, index: String },
    DecodeError { peer: SocketAddr, detail: String },
    ReceiveError { detail: String },
    SendFailed { detail: String },
    DestinationChanged { addr: SocketAddr },
}

pub trait EventSink: Send + Sync {
    fn emit(&self, event: BridgeEvent);
}

/// Renders bridge events on the console, errors in red.
pub struct ConsoleSink;

impl ConsoleSink {
    pub fn new() -> Self {
        ConsoleSink
    }
}

impl EventSink for ConsoleSink {
    fn emit(&self, event: BridgeEvent) {
        match event {
            BridgeEvent::ListenerStarted { addr } => println!("Listening for OSC on {}", addr),
            BridgeEvent::ListenerFailed { addr, detail } => {
                print_colored(Color::Red, &format!("OSC bind failed on {}: {}", addr, detail))
            }
            BridgeEvent::ListenerStopped => println!("OSC listener exiting"),
            BridgeEvent::OscReceived { addr, args } => println!("Received OSC: {} {}", addr, args),
            BridgeEvent::Action { description } => println!("-> {}", description),
            BridgeEvent::Unmapped { addr } => println!("-> Unmapped OSC path {}", addr),
            BridgeEvent::WrongArgument { addr, expected } => {
                println!("-> {} expects a {} argument, message ignored", addr, expected)
            }
            BridgeEvent::InvalidChannel { addr, index } => {
                println!("-> Invalid input channel '{}' in {}", index, addr)
            }
            BridgeEvent::DecodeError { peer, detail } => {
                print_colored(Color::Red, &format!("OSC decode error from {}: {}", peer, detail))
            }
            BridgeEvent::ReceiveError { detail } => {
                print_colored(Color::Red, &format!("OSC recv error: {}", detail))
            }
            BridgeEvent::SendFailed { detail } => {
                print_colored(Color::Red, &format!("MIDI send failed: {}", detail))
            }
            BridgeEvent::DestinationChanged { addr } => println!("SQ destination set to {}", addr),
        }
    }
}

fn print_colored(color: Color, line: &str) {
    let mut stdout = StandardStream::stdout(ColorChoice::Always);
    let _ = stdout.set_color(ColorSpec::new().set_fg(Some(color)).set_intense(true));
    let _ = writeln!(&mut stdout, "{}", line);
    let _ = stdout.reset();
}

static BANNER_PRINTED: AtomicBool = AtomicBool::new(false);

// Print the quick help line in blue (works on Windows CMD via termcolor)
pub fn print_quick_help() {
    print_colored(Color::Blue, "Type 'help' for commands, 'exit' to quit");
}

pub fn print_bridge_active() {
    // Ensure we only print one banner overall
    if BANNER_PRINTED
        .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
        .is_err()
    {
        return;
    }
    print_colored(Color::Green, "Bridge active | OSC to SQ MIDI translation running");
    print_quick_help();
}

pub fn print_bridge_broken() {
    if BANNER_PRINTED
        .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
        .is_err()
    {
        return;
    }
    print_colored(Color::Red, "Bridge not running | OSC listener failed to start");
    print_quick_help();
}

/// Call once after startup to print a single status line after the worker
/// threads have logged their own startup lines.
pub fn print_final_status_after_startup() {
    // Small delay so the listener thread can bind and print first
    std::thread::sleep(Duration::from_millis(300));

    if crate::osc_listener::is_listener_running() {
        print_bridge_active();
    } else {
        print_bridge_broken();
    }
}
