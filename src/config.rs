use std::env;
use std::fs;
use std::net::SocketAddr;
use std::sync::OnceLock;

use serde::{Deserialize, Serialize};

use crate::errors::BridgeError;
use crate::midi_sender::{self, DEFAULT_MIDI_PORT};

/// Read once at startup from the working directory; a missing file yields
/// the defaults below.
const CONFIG_FILE: &str = "config.json";

/// Env overrides for the two addresses most often changed per deployment.
const ENV_DESTINATION: &str = "SQ_BRIDGE_DESTINATION";
const ENV_LISTEN_PORT: &str = "SQ_BRIDGE_LISTEN_PORT";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub listen: ListenConfig,
    pub destination: DestinationConfig,
    /// SQ MIDI channel (1-16), Utility > General > MIDI on the console.
    pub midi_channel: u8,
    pub output: OutputConfig,
    pub debug: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ListenConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DestinationConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub mode: OutputMode,
    /// Substring used to pick the hardware port in "midi-port" mode.
    pub port_name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OutputMode {
    Udp,
    MidiPort,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            listen: ListenConfig::default(),
            destination: DestinationConfig::default(),
            midi_channel: 1,
            output: OutputConfig::default(),
            debug: false,
        }
    }
}

impl Default for ListenConfig {
    fn default() -> Self {
        ListenConfig {
            host: "0.0.0.0".to_string(),
            port: 8000,
        }
    }
}

impl Default for DestinationConfig {
    fn default() -> Self {
        DestinationConfig {
            host: "127.0.0.1".to_string(),
            port: DEFAULT_MIDI_PORT,
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        OutputConfig {
            mode: OutputMode::Udp,
            port_name: String::new(),
        }
    }
}

impl Config {
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.listen.host, self.listen.port)
    }

    pub fn destination_addr(&self) -> Result<SocketAddr, BridgeError> {
        midi_sender::parse_destination(&format!("{}:{}", self.destination.host, self.destination.port))
    }

    /// Zero-based channel nibble for the configured SQ MIDI channel.
    pub fn midi_channel_nibble(&self) -> u8 {
        self.midi_channel.clamp(1, 16) - 1
    }
}

pub fn get_config() -> &'static Config {
    static CONFIG: OnceLock<Config> = OnceLock::new();
    CONFIG.get_or_init(load_config)
}

fn load_config() -> Config {
    let mut config = match fs::read_to_string(CONFIG_FILE) {
        Ok(text) => match serde_json::from_str(&text) {
            Ok(config) => config,
            Err(err) => {
                eprintln!("{} is invalid ({}), using defaults", CONFIG_FILE, err);
                Config::default()
            }
        },
        // Missing file is the normal case
        Err(_) => Config::default(),
    };

    if let Ok(dest) = env::var(ENV_DESTINATION) {
        apply_destination_override(&mut config, &dest);
    }
    if let Ok(port) = env::var(ENV_LISTEN_PORT) {
        apply_listen_port_override(&mut config, &port);
    }
    config
}

fn apply_destination_override(config: &mut Config, text: &str) {
    let text = text.trim();
    match text.rsplit_once(':') {
        Some((host, port)) => match port.parse::<u16>() {
            Ok(port) if !host.is_empty() => {
                config.destination.host = host.to_string();
                config.destination.port = port;
            }
            _ => eprintln!("ignoring {}='{}': expected host[:port]", ENV_DESTINATION, text),
        },
        None if !text.is_empty() => config.destination.host = text.to_string(),
        None => eprintln!("ignoring empty {}", ENV_DESTINATION),
    }
}

fn apply_listen_port_override(config: &mut Config, text: &str) {
    match text.trim().parse::<u16>() {
        Ok(port) => config.listen.port = port,
        Err(_) => eprintln!("ignoring {}='{}': expected a port number", ENV_LISTEN_PORT, text),
    }
}
