//! Entry point for the **layout-remote** client.
//!
//! Spawns the command listener and the authority connection on background
//! threads and feeds every event they produce into a single
//! [`SyncChannel`](layout_remote::sync::SyncChannel) on the main thread.
//!
//! The process exits with status 1 once the connection ends, so a
//! supervisor can restart it.

use layout_remote::command::Event;
use layout_remote::config::Config;
use layout_remote::ipc::listener::UnixSocketListener;
use layout_remote::sync::{Shutdown, SyncChannel};
use layout_remote::traits::EventSource;
use layout_remote::ws::connection::WsConnection;
use log::{error, info};
use std::sync::mpsc;

/// Default socket path for the command listener.
fn default_socket_path() -> String {
    let runtime = std::env::var("XDG_RUNTIME_DIR").unwrap_or_else(|_| "/tmp".into());
    format!("{}/layout-remote.sock", runtime)
}

/// Resolve the config directory (`$XDG_CONFIG_HOME/layout-remote`).
fn config_dir() -> std::path::PathBuf {
    let base = std::env::var("XDG_CONFIG_HOME").unwrap_or_else(|_| {
        let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".into());
        format!("{}/.config", home)
    });
    std::path::PathBuf::from(base).join("layout-remote")
}

/// Try to load the config from `$XDG_CONFIG_HOME/layout-remote/config.json`,
/// falling back to compiled-in defaults.
fn load_config() -> Config {
    let path = config_dir().join("config.json");
    match Config::load(&path) {
        Ok(cfg) => {
            info!("loaded config from {}", path.display());
            cfg
        }
        Err(e) => {
            info!("no config file ({}), using defaults", e);
            Config::default()
        }
    }
}

//  Main

fn main() {
    env_logger::init();

    let config = load_config();

    let (event_tx, event_rx) = mpsc::channel::<Event>();

    let socket_path = config
        .commands
        .socket_path
        .clone()
        .unwrap_or_else(default_socket_path);
    spawn_source("command listener", UnixSocketListener::new(&socket_path), event_tx.clone());

    let (connection, sender) = WsConnection::new(&config.connection);
    info!("connecting to {}", connection.endpoint());
    spawn_source("connection", connection, event_tx);

    let mut channel = SyncChannel::new(sender);
    info!("layout-remote running");
    match channel.run(&event_rx) {
        Shutdown::ConnectionEnded => {
            error!("connection to authority ended, exiting");
            std::process::exit(1);
        }
        Shutdown::SourcesClosed => info!("all event sources closed, exiting"),
    }
}

//  Helpers

fn spawn_source<S>(name: &'static str, mut source: S, tx: mpsc::Sender<Event>)
where
    S: EventSource + 'static,
    S::Error: std::fmt::Display,
{
    std::thread::spawn(move || {
        if let Err(e) = source.run(tx) {
            error!("{} error: {}", name, e);
        }
    });
}
