//! skillsnap: terminal learning assistant
//!
//! Relays questions to a hosted OpenAI-compatible inference API in one of
//! three modalities:
//! - Text: a typed question answered by a tutor prompt
//! - Image: a still frame analyzed in identify, extract or search mode
//! - Voice: a recorded clip transcribed, then answered
//!
//! Without a subcommand an interactive shell starts. Requests run on
//! spawned tasks; their completions, user commands, the mascot timer and
//! shutdown are all serialized through one select loop.

mod capture;
mod cli;
mod config;
mod error;
mod events;
mod inference;
mod lifecycle;
mod mascot;
mod prompts;
mod session;

use std::io::Write;

use anyhow::{anyhow, Result};
use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::capture::{ImageFileCamera, WavFileInput};
use crate::cli::{Cli, Command, ShellCommand, SHELL_HELP};
use crate::config::Config;
use crate::error::AssistError;
use crate::events::SessionEvent;
use crate::inference::{InferenceClient, Reply, RequestBuilder};
use crate::lifecycle::ShutdownSignal;
use crate::mascot::{random_message, splash, MessageRotation, ROTATION_INTERVAL};
use crate::prompts::Modality;
use crate::session::{Phase, Session, Ticket};

/// Completed request handed back to the loop
type Completion = (Ticket, Result<Reply, AssistError>);

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging; stdout is reserved for answers
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(cli.log_filter()))
        )
        .with_writer(std::io::stderr)
        .init();

    info!(version = env!("CARGO_PKG_VERSION"), "skillsnap starting");

    // Load configuration
    let config = Config::load()?;
    info!(
        configured = config.credential.is_configured(),
        chat_url = %config.chat_url,
        timeout = ?config.timeout,
        "configuration loaded"
    );
    if !config.credential.is_configured() {
        warn!("{} is not set; requests will be refused", crate::config::API_KEY_VAR);
    }

    let client = InferenceClient::new(config.clone());
    let builder = RequestBuilder::new(config.credential.clone());

    // Session -> loop (for logging state events)
    let (event_tx, _event_rx) = broadcast::channel::<SessionEvent>(64);
    let mut session = Session::new(event_tx.clone());

    match cli.command {
        Some(command) => run_once(command, &mut session, &builder, &client).await,
        None => {
            if !cli.no_splash {
                let shutdown = ShutdownSignal::new();
                tokio::select! {
                    _ = play_splash() => {}
                    _ = shutdown.wait() => {
                        info!("shutdown signal received during splash");
                        return Ok(());
                    }
                }
            }
            run_shell(&mut session, &builder, &client, event_tx.subscribe()).await
        }
    }
}

/// Execute a single subcommand and print its outcome
async fn run_once(
    command: Command,
    session: &mut Session,
    builder: &RequestBuilder,
    client: &InferenceClient,
) -> Result<()> {
    let prepared = match command {
        Command::Ask { question } => {
            session.set_input(question.join(" "));
            Ok(())
        }
        Command::Image { path, mode } => {
            session.select_modality(Modality::Image);
            session.set_analysis_mode(mode);
            session.capture_frame(&mut ImageFileCamera::new(&path))
        }
        Command::Voice { path } => {
            session.select_modality(Modality::Voice);
            session
                .start_recording(&WavFileInput::new(&path))
                .and_then(|()| session.stop_recording())
        }
    };

    prepared?;
    session.submit(builder, client).await?;

    match (session.phase(), &session.state().last_result, &session.state().last_error) {
        (Phase::Success, Some(result), _) => {
            println!("{result}");
            Ok(())
        }
        (_, _, Some(message)) => Err(anyhow!(message.clone())),
        _ => Err(anyhow!("request finished without a result")),
    }
}

async fn play_splash() {
    let mut out = std::io::stdout();
    let sky = splash::render_sky(
        &splash::star_field(&mut rand::thread_rng(), splash::STAR_COUNT),
        60,
        6,
    );

    let _ = writeln!(out, "\n  {}\n  {}\n", splash::TITLE, splash::TAGLINE);
    tokio::time::sleep(splash::phase_start(splash::SplashPhase::Launching)).await;
    for row in &sky {
        let _ = writeln!(out, "  {row}");
    }

    let launched = splash::phase_start(splash::SplashPhase::Launched)
        - splash::phase_start(splash::SplashPhase::Launching);
    tokio::time::sleep(launched).await;
    let _ = writeln!(out, "\n  {}\n", splash::LAUNCH_MESSAGE);

    let hidden = splash::phase_start(splash::SplashPhase::Hidden)
        - splash::phase_start(splash::SplashPhase::Launched);
    tokio::time::sleep(hidden).await;
}

/// Interactive shell main loop
async fn run_shell(
    session: &mut Session,
    builder: &RequestBuilder,
    client: &InferenceClient,
    mut event_rx: broadcast::Receiver<SessionEvent>,
) -> Result<()> {
    let (done_tx, mut done_rx) = mpsc::channel::<Completion>(8);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut rotation = MessageRotation::starting_at(&mut rand::thread_rng());
    let mut mascot_tick = tokio::time::interval(ROTATION_INTERVAL);
    mascot_tick.tick().await;

    let shutdown = ShutdownSignal::new();
    let shutdown_wait = shutdown.wait();
    tokio::pin!(shutdown_wait);

    println!("{SHELL_HELP}\n");
    println!("{}", random_message(&mut rand::thread_rng()));
    prompt(session, &rotation);

    loop {
        tokio::select! {
            line = lines.next_line() => {
                match line {
                    Ok(Some(line)) => {
                        if line.trim().is_empty() {
                            prompt(session, &rotation);
                            continue;
                        }
                        match line.parse::<ShellCommand>() {
                            Ok(ShellCommand::Quit) => break,
                            Ok(command) => {
                                if let Err(e) = handle_command(command, session, builder, client, &done_tx) {
                                    eprintln!("Error: {e}");
                                }
                            }
                            Err(message) => println!("{message}. Type 'help' for commands."),
                        }
                        prompt(session, &rotation);
                    }
                    Ok(None) => {
                        debug!("stdin closed");
                        break;
                    }
                    Err(e) => {
                        error!(?e, "failed to read input");
                        break;
                    }
                }
            }

            // Completed requests
            Some((ticket, outcome)) = done_rx.recv() => {
                if session.finish(ticket, outcome) {
                    render(session);
                    prompt(session, &rotation);
                }
            }

            // Mascot rotation
            _ = mascot_tick.tick() => {
                rotation.advance();
            }

            // Session events
            Ok(event) = event_rx.recv() => {
                debug!(%event, "session event");
            }

            _ = &mut shutdown_wait => {
                info!("shutdown signal received");
                break;
            }
        }
    }

    if session.is_busy() {
        warn!("leaving with a request still in flight");
    }
    info!("skillsnap stopped");
    Ok(())
}

fn handle_command(
    command: ShellCommand,
    session: &mut Session,
    builder: &RequestBuilder,
    client: &InferenceClient,
    done_tx: &mpsc::Sender<Completion>,
) -> Result<(), AssistError> {
    match command {
        ShellCommand::Mode(modality) => {
            session.select_modality(modality);
            println!("Mode: {modality}");
            Ok(())
        }
        ShellCommand::Analysis(mode) => {
            session.set_analysis_mode(mode);
            println!("Analysis mode: {mode}");
            Ok(())
        }
        // Switching modality here would make the in-flight request stale
        ShellCommand::Ask(_) | ShellCommand::Capture(_) | ShellCommand::Record(_)
            if session.is_busy() =>
        {
            Err(AssistError::Busy)
        }
        ShellCommand::Ask(question) => {
            session.select_modality(Modality::Text);
            session.set_input(question);
            dispatch(session, builder, client, done_tx)
        }
        ShellCommand::Capture(path) => {
            session.select_modality(Modality::Image);
            session
                .capture_frame(&mut ImageFileCamera::new(&path))
                .map(|()| println!("Frame captured. Type 'analyze' to send it."))
        }
        ShellCommand::Analyze => dispatch(session, builder, client, done_tx),
        ShellCommand::Reset => {
            session.reset_capture();
            println!("Capture cleared.");
            Ok(())
        }
        ShellCommand::Record(path) => {
            session.select_modality(Modality::Voice);
            session
                .start_recording(&WavFileInput::new(&path))
                .map(|()| println!("Recording... type 'stop' to finish."))
        }
        ShellCommand::Stop => session
            .stop_recording()
            .map(|()| println!("Recording stopped. Type 'send' to submit it.")),
        ShellCommand::Send => dispatch(session, builder, client, done_tx),
        ShellCommand::Status => {
            print_status(session);
            Ok(())
        }
        ShellCommand::Help => {
            println!("{SHELL_HELP}");
            Ok(())
        }
        ShellCommand::Quit => Ok(()),
    }
}

/// Start a request on its own task; the completion comes back through `done_tx`
fn dispatch(
    session: &mut Session,
    builder: &RequestBuilder,
    client: &InferenceClient,
    done_tx: &mpsc::Sender<Completion>,
) -> Result<(), AssistError> {
    let (ticket, job) = session.begin_submit(builder)?;

    match &session.state().last_result {
        Some(interim) => println!("{interim}"),
        None => println!("Processing..."),
    }

    let client = client.clone();
    let done_tx = done_tx.clone();
    tokio::spawn(async move {
        let outcome = client.run(job).await;
        if done_tx.send((ticket, outcome)).await.is_err() {
            warn!("session closed before request completed");
        }
    });
    Ok(())
}

fn render(session: &Session) {
    let state = session.state();
    if let Some(message) = &state.last_error {
        eprintln!("Error: {message}");
    } else if let Some(result) = &state.last_result {
        println!("\n{result}\n");
    }
}

fn print_status(session: &Session) {
    let state = session.state();
    println!("mode:      {}", state.active_modality);
    println!("analysis:  {}", state.analysis_mode);
    println!("phase:     {}", session.phase());
    println!(
        "frame:     {}",
        state
            .captured_frame
            .as_ref()
            .map(|f| format!("{} bytes ({})", f.len(), f.mime()))
            .unwrap_or_else(|| "none".to_string())
    );
    println!(
        "recording: {}",
        if session.is_recording() {
            "in progress".to_string()
        } else {
            state
                .recorded_audio
                .as_ref()
                .map(|r| format!("{} bytes", r.len()))
                .unwrap_or_else(|| "none".to_string())
        }
    );
}

fn prompt(session: &Session, rotation: &MessageRotation) {
    let mut out = std::io::stdout();
    let _ = write!(
        out,
        "({}) [{}] > ",
        rotation.current(),
        session.state().active_modality
    );
    let _ = out.flush();
}
