mod config;
mod controls;
mod errors;
mod events;
mod midi;
mod midi_port;
mod midi_sender;
mod osc_listener;
mod output;
mod router;
mod stdin_handler;

use std::error::Error;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::channel;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crate::config::OutputMode;
use crate::controls::Controls;
use crate::events::{ConsoleSink, EventSink};
use crate::midi_sender::Destination;
use crate::output::MidiOut;
use crate::router::Router;

/// Gates verbose per-message console output ("debug on" / "debug off").
pub static DEBUG_ENABLED: AtomicBool = AtomicBool::new(false);

pub fn is_debug_enabled() -> bool {
    DEBUG_ENABLED.load(Ordering::SeqCst)
}

fn main() {
    match run() {
        Ok(_) => (),
        Err(err) => println!("Error: {}", err),
    }
}

fn run() -> Result<(), Box<dyn Error>> {
    let config = config::get_config();
    DEBUG_ENABLED.store(config.debug, Ordering::SeqCst);

    let sink: Arc<dyn EventSink> = Arc::new(ConsoleSink::new());
    let destination = Arc::new(Destination::new(config.destination_addr()?));
    let shutdown = Arc::new(AtomicBool::new(false));

    // Pick the outbound transport; hardware mode hands the port connection
    // to a forwarding thread fed over a channel
    let mut forwarder_handle = None;
    let output = match config.output.mode {
        OutputMode::Udp => Arc::new(MidiOut::Udp {
            destination: destination.clone(),
        }),
        OutputMode::MidiPort => {
            let conn_out = midi_port::open_output_port(&config.output.port_name)?;
            let (tx, rx) = channel::<Vec<u8>>();
            forwarder_handle = Some(midi_port::spawn_port_forwarder(conn_out, rx));
            Arc::new(MidiOut::Port { tx })
        }
    };

    let listener_handle = osc_listener::spawn_osc_listener(
        config.listen_addr(),
        Router::new(config.midi_channel_nibble()),
        output.clone(),
        sink.clone(),
        shutdown.clone(),
    );

    let controls = Controls::new(
        output.clone(),
        destination,
        config.midi_channel_nibble(),
        sink.clone(),
    );
    let stdin_handle = stdin_handler::spawn_stdin_handler(controls, shutdown.clone());

    events::print_final_status_after_startup();

    // Wait for exit signal from the stdin thread
    while !shutdown.load(Ordering::SeqCst) {
        thread::sleep(Duration::from_millis(100));
    }

    let _ = listener_handle.join();
    let _ = stdin_handle.join();

    // Dropping the last sender ends the port forwarder, if one is running
    drop(output);
    if let Some(handle) = forwarder_handle {
        let _ = handle.join();
    }

    Ok(())
}
