use std::io::stdin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crate::controls::Controls;
use crate::errors::BridgeError;

/// Spawn a thread that reads console commands and drives the manual-trigger
/// API. Empty line or 'exit' sets the shared shutdown flag.
pub fn spawn_stdin_handler(controls: Controls, shutdown: Arc<AtomicBool>) -> JoinHandle<()> {
    thread::spawn(move || {
        let stdin = stdin();
        let mut line = String::new();
        loop {
            line.clear();
            if stdin.read_line(&mut line).is_err() {
                break;
            }
            let cmd = line.trim();
            if cmd.is_empty() {
                shutdown.store(true, Ordering::SeqCst);
                break;
            }
            if cmd.eq_ignore_ascii_case("exit")
                || cmd.eq_ignore_ascii_case("quit")
                || cmd.eq_ignore_ascii_case("q")
            {
                shutdown.store(true, Ordering::SeqCst);
                break;
            }

            // Debug toggle commands
            if cmd.eq_ignore_ascii_case("debug on") || cmd.eq_ignore_ascii_case("debug enable") {
                crate::DEBUG_ENABLED.store(true, Ordering::SeqCst);
                println!("Debug enabled");
                continue;
            }
            if cmd.eq_ignore_ascii_case("debug off") || cmd.eq_ignore_ascii_case("debug disable") {
                crate::DEBUG_ENABLED.store(false, Ordering::SeqCst);
                println!("Debug disabled");
                continue;
            }

            if cmd.eq_ignore_ascii_case("help") || cmd.eq_ignore_ascii_case("h") {
                print_help();
                continue;
            }

            run_command(&controls, cmd);
        }
    })
}

fn print_help() {
    println!("Commands:");
    println!("  fader <ch> <value>  - Send fader level for input 1-48 (value 0-127)");
    println!("  mute <ch> on/off    - Send mute state for input 1-48");
    println!("  scene <n>           - Recall scene 1-300");
    println!("  dest <host[:port]>  - Set the SQ destination address");
    println!("  debug on/off        - Enable/Disable verbose debug prints");
    println!("  help/h              - Show this help");
    println!("  exit/quit/q         - Exit program");
}

fn run_command(controls: &Controls, cmd: &str) {
    let parts: Vec<&str> = cmd.split_whitespace().collect();
    match parts.as_slice() {
        ["fader", channel, value] => {
            let channel = match channel.parse::<u8>() {
                Ok(v) => v,
                Err(_) => {
                    println!("Invalid input channel");
                    return;
                }
            };
            let value = match value.parse::<u8>() {
                Ok(v) => v,
                Err(_) => {
                    println!("Invalid fader value");
                    return;
                }
            };
            report(controls.send_fader_level(channel, value));
        }
        ["mute", channel, state] => {
            let channel = match channel.parse::<u8>() {
                Ok(v) => v,
                Err(_) => {
                    println!("Invalid input channel");
                    return;
                }
            };
            let muted = match *state {
                "on" | "1" => true,
                "off" | "0" => false,
                _ => {
                    println!("Invalid mute state (use on/off)");
                    return;
                }
            };
            report(controls.send_mute_state(channel, muted));
        }
        ["scene", number] => {
            let scene = match number.parse::<u16>() {
                Ok(v) => v,
                Err(_) => {
                    println!("Invalid scene number");
                    return;
                }
            };
            report(controls.recall_scene(scene));
        }
        ["dest", addr] => {
            // Success is reported through the event sink
            if let Err(err) = controls.set_destination(addr) {
                println!("{}", err);
            }
        }
        _ => println!(
            "Unrecognized command: '{}'. Type 'help' for available commands.",
            cmd
        ),
    }
}

fn report(result: Result<(), BridgeError>) {
    if let Err(err) = result {
        println!("{}", err);
    }
}
