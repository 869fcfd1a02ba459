//! Entry point for the **outputctl** shell.
//!
//! Sets up the event log, connects to the compositor, reads commands from
//! stdin on a background thread and executes them on the main thread, which
//! owns the Wayland connection.

use log::{error, info, warn};
use outputctl::config::{self, Config};
use outputctl::controller::{OutputController, Reply};
use outputctl::error::{error_name, CommandError};
use outputctl::input::lines::LineSource;
use outputctl::logging::{self, RESULT};
use outputctl::traits::CommandSource;
use outputctl::transaction::Outcome;
use outputctl::wayland::WaylandClient;
use std::io::Write;
use std::path::PathBuf;
use std::sync::mpsc;

/// Load `config.json`, falling back to compiled-in defaults.
///
/// Runs before the logger exists, so the result is reported afterwards.
fn load_config() -> (Config, String) {
    let path = config::default_path();
    match Config::load(&path) {
        Ok(cfg) => (cfg, format!("loaded config from {}", path.display())),
        Err(e) => (Config::default(), format!("no config file ({}), using defaults", e)),
    }
}

//  Main

fn main() {
    let (config, config_note) = load_config();

    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    let log_path = match logging::init(&config.log, &cwd) {
        Ok(path) => path,
        Err(e) => {
            eprintln!("outputctl: {}", e);
            std::process::exit(1);
        }
    };
    info!("log file set up at {}", log_path.display());
    info!("{}", config_note);

    let mut client = match WaylandClient::connect(OutputController::new(log_path)) {
        Ok(client) => client,
        Err(e) => {
            error!("{}", e);
            eprintln!("outputctl: {}", e);
            std::process::exit(1);
        }
    };

    let (line_tx, line_rx) = mpsc::channel::<String>();
    spawn_command_source(line_tx);

    run_shell(&mut client, &line_rx, &config.shell.prompt);

    if let Err(e) = client.shutdown() {
        error!("shutdown failed: {}", e);
    }
}

//  Read loop

fn run_shell(client: &mut WaylandClient, lines: &mpsc::Receiver<String>, prompt: &str) {
    let mut stdout = std::io::stdout();
    loop {
        if !refresh(client) {
            return;
        }

        print!("{}", prompt);
        if let Err(e) = stdout.flush() {
            warn!("cannot flush stdout: {}", e);
        }

        let Ok(line) = lines.recv() else {
            info!("input closed");
            println!();
            return;
        };

        // The prompt may have waited a long time; check against fresh state.
        if !refresh(client) {
            return;
        }

        let cmd = match client.controller().parse(&line) {
            Ok(cmd) => cmd,
            Err(e) => {
                report_error(e);
                continue;
            }
        };

        match client.execute(cmd, &mut stdout) {
            Ok(Reply::Exit) => {
                info!(target: RESULT, "{}", error_name(0));
                return;
            }
            Ok(Reply::Submitted(id)) => match client.wait_for_outcome(id) {
                Ok(Some(outcome)) => report_outcome(outcome),
                Ok(None) => {}
                Err(e) => {
                    error!("{}", e);
                    eprintln!("outputctl: {}", e);
                    return;
                }
            },
            Ok(Reply::Listed(_)) | Ok(Reply::Monitored(_)) => {
                info!(target: RESULT, "{}", error_name(0));
            }
            Err(e) => match e.command_error() {
                Some(code) => report_error(code),
                None => {
                    warn!(target: RESULT, "{}", e);
                    eprintln!("error: {}", e);
                }
            },
        }
    }
}

fn report_error(e: CommandError) {
    info!(target: RESULT, "Error: {}", e.name());
    eprintln!("Invalid command: {} ({}): {}", e.name(), e.code(), e);
}

fn report_outcome(outcome: Outcome) {
    match outcome {
        Outcome::Succeeded => println!("Configuration applied."),
        Outcome::Failed => println!("Configuration failed; nothing was changed."),
        Outcome::Cancelled => {
            println!("Configuration cancelled: outputs changed meanwhile. Check list_outputs and retry.")
        }
    }
}

//  Helpers

/// Roundtrip with the compositor; false once the connection is unusable.
fn refresh(client: &mut WaylandClient) -> bool {
    match client.sync() {
        Ok(()) => true,
        Err(e) => {
            error!("{}", e);
            eprintln!("outputctl: {}", e);
            false
        }
    }
}

fn spawn_command_source(tx: mpsc::Sender<String>) {
    std::thread::spawn(move || {
        let mut source = LineSource::stdin();
        if let Err(e) = source.run(tx) {
            error!("command source error: {}", e);
        }
    });
}
