// Operator console for a teleoperated rover.
// Run with: cargo run -p console

use rover_link::dashboard::fetch_dashboard;
use rover_link::packets::{InboundMessage, Recording, SpeedMode, TelemetryBand};
use rover_link::recorder::Recorder;
use rover_link::session::{RoverSession, SessionConfig, SessionEvent};
use rover_link::{Command, LinkError};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast;
use tracing::{info, warn};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let addr = std::env::var("ROVER_ADDR").unwrap_or_else(|_| "127.0.0.1".to_string());
    let port = std::env::var("ROVER_PORT")
        .ok()
        .and_then(|p| p.parse::<u32>().ok())
        .unwrap_or(8000);

    let config = SessionConfig::new(addr, port, 3000);
    if let Err(e) = config.validate() {
        eprintln!("configuration error: {}", e);
        return;
    }
    info!("controller endpoint: {}", config.ws_url());

    let session = RoverSession::new(config.clone());
    session.connect();

    let mut events = session.subscribe();
    tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(event) => print_event(event),
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    warn!("event stream lagged {} messages", n)
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    });

    let mut recorder = Recorder::new();
    // Frozen take waiting for a name, kept until the save goes through.
    let mut pending: Option<Recording> = None;

    print_help();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        let mut words = line.split_whitespace();
        let verb = match words.next() {
            Some(verb) => verb.to_lowercase(),
            None => continue,
        };
        let rest = words.collect::<Vec<_>>().join(" ");

        match verb.as_str() {
            "w" | "adelante" => drive(&session, &mut recorder, Command::new("ADELANTE")).await,
            "s" | "atras" => drive(&session, &mut recorder, Command::new("ATRAS")).await,
            "a" | "izquierda" => drive(&session, &mut recorder, Command::new("IZQUIERDA")).await,
            "d" | "derecha" => drive(&session, &mut recorder, Command::new("DERECHA")).await,
            "x" | "stop" => drive(&session, &mut recorder, Command::stop()).await,
            "auto" => drive(&session, &mut recorder, Command::auto()).await,
            "manual" => drive(&session, &mut recorder, Command::manual()).await,
            "mid" => report(session.set_speed(SpeedMode::Mid).await),
            "high" => report(session.set_speed(SpeedMode::High).await),
            "rec" => match recorder.start() {
                Ok(()) => println!("recording started, drive the rover"),
                Err(e) => println!("{}", e),
            },
            "end" => match recorder.stop() {
                Ok(recording) => {
                    println!("recording frozen: {} steps, save <name> to keep it", recording.len());
                    pending = Some(recording);
                }
                Err(e) => println!("{}", e),
            },
            "save" => match pending.as_ref() {
                Some(recording) => match session.save_demo(&rest, recording.clone()).await {
                    Ok(()) => {
                        println!("demo '{}' sent to the controller", rest);
                        pending = None;
                    }
                    Err(e) => println!("{}", e),
                },
                None => println!("nothing to save, record with rec/end first"),
            },
            "run" => report(session.run_demo(&rest).await),
            "demos" => match fetch_dashboard(&config).await {
                Ok(dashboard) => {
                    for demo in &dashboard.demos {
                        println!("  > {}", demo.name);
                    }
                }
                Err(e) => println!("{}", e),
            },
            "history" => match fetch_dashboard(&config).await {
                Ok(dashboard) => {
                    for entry in &dashboard.history {
                        println!("  [{}] {} ({})", entry.time, entry.command, entry.source);
                    }
                }
                Err(e) => println!("{}", e),
            },
            "status" => {
                let state = if session.is_connected().await {
                    "connected"
                } else {
                    "disconnected, retrying"
                };
                let rec = if recorder.is_active() {
                    format!("RECORDING [{} steps]", recorder.step_count())
                } else {
                    "idle".to_string()
                };
                println!("link: {} | recorder: {}", state, rec);
            }
            "help" => print_help(),
            "quit" | "exit" => break,
            other => println!("unknown command '{}', try help", other),
        }
    }
}

/// Sends a motion command; only commands that actually went out are fed to
/// the recorder, so a dropped send never becomes a phantom step.
async fn drive(session: &RoverSession, recorder: &mut Recorder, command: Command) {
    match session.send_move(command.clone()).await {
        Ok(()) => {
            if recorder.is_active() {
                recorder.observe(command);
                println!("RECORDING [{} steps]", recorder.step_count());
            }
        }
        Err(e) => println!("{}", e),
    }
}

fn report(result: Result<(), LinkError>) {
    if let Err(e) = result {
        println!("{}", e);
    }
}

fn print_event(event: SessionEvent) {
    match event {
        SessionEvent::Connected => println!("== link up =="),
        SessionEvent::Disconnected => println!("== link down, retrying =="),
        SessionEvent::Message(InboundMessage::CommandEcho {
            last_command,
            command,
        }) => {
            if let Some(cmd) = command.or(last_command) {
                println!("controller executing: {}", cmd);
            }
        }
        SessionEvent::Message(InboundMessage::Telemetry { value, band }) => {
            let label = match band {
                TelemetryBand::Critical => "CRITICAL",
                TelemetryBand::Warning => "warning",
                TelemetryBand::Nominal => "nominal",
            };
            println!("distance: {:.1} cm [{}]", value, label);
        }
        SessionEvent::Message(InboundMessage::DemoSaved { message }) => {
            println!("demo saved: {}", message)
        }
        SessionEvent::Message(InboundMessage::DemoFinished) => println!("demo finished"),
    }
}

fn print_help() {
    println!("w/s/a/d move, x stop, auto/manual mode, mid/high speed");
    println!("rec, end, save <name>, run <name>, demos, history, status, quit");
}
