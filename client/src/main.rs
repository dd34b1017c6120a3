//! reelsync - terminal host for a synced room.
//!
//! Plays simulated media and keeps it in step with the other members of a
//! room. Connection settings come from the environment (or a `.env` file):
//! `REELSYNC_SERVER`, `REELSYNC_ROOM`, `REELSYNC_USER`.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use reelsync_client::host::{ChatLog, SimulatedPlayer};
use reelsync_client::{HostConfig, RoomEvent, SyncClient};
use reelsync_engine::{Player, Reconciler, RemoteApplied};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::time::Instant;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// How often the simulated player advances.
const TICK: Duration = Duration::from_millis(250);

const HELP: &str = "\
commands:
  play | pause | toggle | stop
  seek <0..1>        jump to a fraction of the media
  fwd <secs>         skip forward
  back <secs>        skip back
  chat <text>        send a chat message
  open <path>        load a media file
  log                show the chat log
  export <dir>       write the chat log to a file in <dir>
  status             show connection and playback state
  quit";

type Host = Reconciler<SimulatedPlayer, Arc<SyncClient>>;

#[derive(Debug, Clone, PartialEq)]
enum Command {
    Play,
    Pause,
    Toggle,
    Stop,
    Seek(f64),
    Forward(f64),
    Back(f64),
    Chat(String),
    Open(PathBuf),
    Log,
    Export(PathBuf),
    Status,
    Help,
    Quit,
}

fn parse_command(input: &str) -> Result<Command, String> {
    let input = input.trim();
    let (word, rest) = match input.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (input, ""),
    };

    let number = |what: &str| -> Result<f64, String> {
        rest.parse::<f64>()
            .ok()
            .filter(|value| value.is_finite())
            .ok_or_else(|| format!("{word} needs {what}"))
    };

    match word {
        "play" => Ok(Command::Play),
        "pause" => Ok(Command::Pause),
        "toggle" | "" => Ok(Command::Toggle),
        "stop" => Ok(Command::Stop),
        "seek" => number("a fraction between 0 and 1").map(Command::Seek),
        "fwd" => number("a number of seconds").map(Command::Forward),
        "back" => number("a number of seconds").map(Command::Back),
        // Blank chat input is not sent.
        "chat" if rest.is_empty() => Err("chat needs a message".to_string()),
        "chat" => Ok(Command::Chat(rest.to_string())),
        "open" if rest.is_empty() => Err("open needs a path".to_string()),
        "open" => Ok(Command::Open(PathBuf::from(rest))),
        "log" => Ok(Command::Log),
        "export" => Ok(Command::Export(PathBuf::from(if rest.is_empty() { "." } else { rest }))),
        "status" => Ok(Command::Status),
        "help" | "?" => Ok(Command::Help),
        "quit" | "exit" => Ok(Command::Quit),
        other => Err(format!("unknown command {other:?}, try help")),
    }
}

/// Run one local command. Returns false to quit.
fn run_command(
    command: Command,
    host: &mut Host,
    chat: &mut ChatLog,
    client: &SyncClient,
    autoplay: bool,
) -> bool {
    match command {
        Command::Play => host.play(),
        Command::Pause => host.pause(),
        Command::Toggle => host.toggle(),
        Command::Stop => host.stop(),
        Command::Seek(fraction) => host.seek_to(fraction),
        Command::Forward(seconds) => host.seek_by(seconds),
        Command::Back(seconds) => host.seek_by(-seconds),
        Command::Chat(message) => {
            let line = host.chat(message);
            println!("{line}");
            chat.push(line);
        }
        Command::Open(path) => match host.load_media(&path, autoplay) {
            Ok(()) => println!("* opened {}", path.display()),
            Err(e) => println!("! {e}"),
        },
        Command::Log => {
            for line in chat.lines() {
                println!("{line}");
            }
        }
        Command::Export(dir) => match chat.export(&dir) {
            Ok(path) => println!("* chat log written to {}", path.display()),
            Err(e) => println!("! {e}"),
        },
        Command::Status => {
            let update = host.position_changed();
            let state = if host.player().is_playing() { "playing" } else { "paused" };
            println!(
                "* {} | {} {} / {}",
                client.status(),
                state,
                update.elapsed,
                update.total
            );
        }
        Command::Help => println!("{HELP}"),
        Command::Quit => return false,
    }
    true
}

/// Apply one room notification. Remote events go through the reconciler
/// and never produce a send.
fn apply_room_event(event: RoomEvent, host: &mut Host, chat: &mut ChatLog) {
    match event {
        RoomEvent::ConnectionChanged(status) => println!("* {status}"),
        RoomEvent::Remote(event) => match host.apply_remote(&event) {
            Ok(RemoteApplied::Playback { notice, .. }) => println!("* {notice}"),
            Ok(RemoteApplied::Chat { line, paused }) => {
                println!("{line}");
                if paused {
                    println!("* paused for chat");
                }
                chat.push(line);
            }
            Err(e) => tracing::warn!(error = %e, user = %event.user(), "Ignoring remote event"),
        },
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "reelsync_client=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    // Load configuration
    dotenvy::dotenv().ok();
    let config = HostConfig::from_env()?;

    let client = Arc::new(SyncClient::new(config.identity.clone()));
    let mut events = client.channel();

    let mut host: Host = Reconciler::new(
        SimulatedPlayer::new(config.media_length),
        config.reconcile_options(),
    );
    let mut chat = ChatLog::new();

    if client.connect() {
        host.join(Arc::clone(&client));
        println!(
            "* joining {} as {}",
            config.identity.room(),
            config.identity.user()
        );
    } else {
        println!(
            "* playing alone: set REELSYNC_SERVER, REELSYNC_ROOM and REELSYNC_USER to join a room"
        );
    }
    println!("{HELP}");

    let mut input = BufReader::new(tokio::io::stdin()).lines();
    let mut ticker = tokio::time::interval(TICK);
    let mut last_tick = Instant::now();

    loop {
        tokio::select! {
            line = input.next_line() => {
                let Some(line) = line? else { break };
                match parse_command(&line) {
                    Ok(command) => {
                        if !run_command(command, &mut host, &mut chat, &client, config.autoplay) {
                            break;
                        }
                    }
                    Err(message) => println!("! {message}"),
                }
            }

            Some(event) = events.recv() => apply_room_event(event, &mut host, &mut chat),

            now = ticker.tick() => {
                // Position ticks refresh local state only.
                host.player_mut().advance(now - last_tick);
                last_tick = now;
            }
        }
    }

    host.leave();
    client.close_and_wait().await;
    Ok(())
}
