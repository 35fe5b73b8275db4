//! speakup-rs: speak the speakup soft synth device through espeak-ng.

use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::signal::unix::{signal, SignalKind};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use speakup_rs::config::Config;
use speakup_rs::coordinator::StopCoordinator;
use speakup_rs::queue::CommandQueue;
use speakup_rs::reader::{self, DeviceReader};
use speakup_rs::runner::Runner;
use speakup_rs::shutdown::{shutdown_channel, ShutdownTrigger};
use speakup_rs::synth::{self, voice::VoiceSettings, Synth};
use speakup_rs::BridgeError;

#[derive(Parser, Debug)]
#[command(name = "speakup-rs", about = "Speakup soft synth to speech bridge")]
struct Args {
    /// Path to config.yaml
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Soft synth device (overrides device.path)
    #[arg(short, long)]
    device: Option<PathBuf>,

    /// espeak-ng voice name (overrides synth.voice)
    #[arg(short = 'V', long)]
    voice: Option<String>,

    /// Speech backend: espeak-ng or log (overrides synth.backend)
    #[arg(short, long)]
    backend: Option<String>,

    /// Enable verbose (debug) logging
    #[arg(short, long)]
    verbose: bool,
}

async fn wait_for_signal() -> std::io::Result<&'static str> {
    let mut interrupt = signal(SignalKind::interrupt())?;
    let mut terminate = signal(SignalKind::terminate())?;
    let name = tokio::select! {
        _ = interrupt.recv() => "SIGINT",
        _ = terminate.recv() => "SIGTERM",
    };
    Ok(name)
}

/// Stop both threads: the worker through the queue, the reader through the
/// shutdown pipe, and silence any speech in progress.
fn stop_pipeline(
    queue: &CommandQueue,
    synth: &dyn Synth,
    trigger: &ShutdownTrigger,
) -> Result<(), BridgeError> {
    queue.shutdown();
    synth.cancel();
    trigger.trigger()
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let filter = if args.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("speakup-rs starting");

    let mut config = Config::load(args.config.as_deref());
    if let Some(device) = args.device {
        config.device.path = device;
    }
    if let Some(voice) = args.voice {
        config.synth.voice = voice;
    }
    if let Some(backend) = args.backend {
        config.synth.backend = backend;
    }
    info!("Config: {:?}", config);

    let synth = synth::from_config(&config.synth)?;
    let queue = Arc::new(CommandQueue::new());
    let coordinator = StopCoordinator::new(Arc::clone(&queue), Arc::clone(&synth));
    let (trigger, listener) = shutdown_channel()?;
    let device = reader::open_device(&config.device.path)?;

    let reader = DeviceReader::new(device, listener, Arc::clone(&queue), coordinator.clone());
    let mut reader_task = tokio::task::spawn_blocking(move || reader.run());

    let runner = Runner::new(
        Arc::clone(&queue),
        coordinator,
        Arc::clone(&synth),
        VoiceSettings::from(&config.voice),
    );
    let runner_task = tokio::task::spawn_blocking(move || runner.run());

    let (signal_result, reader_finished) = tokio::select! {
        received = wait_for_signal() => (Some(received), None),
        result = &mut reader_task => (None, Some(result)),
    };

    if let Some(received) = &signal_result {
        match received {
            Ok(name) => info!("Received {name}, shutting down"),
            Err(e) => error!("Unable to listen for signals: {e}, shutting down"),
        }
        if let Err(e) = stop_pipeline(&queue, synth.as_ref(), &trigger) {
            // The reader cannot be woken from poll; joining it would hang.
            error!("{e}");
            std::process::exit(1);
        }
    }

    let reader_result = match reader_finished {
        Some(result) => result,
        None => reader_task.await,
    };

    // The reader shuts the queue down on exit unless it panicked; silence any
    // speech in progress either way.
    queue.shutdown();
    synth.cancel();
    let voice = runner_task.await?;
    info!("Final voice settings: {:?}", voice);

    if let Some(Err(e)) = signal_result {
        return Err(e.into());
    }
    if let Err(e) = reader_result? {
        error!("{e}");
        return Err(e.into());
    }

    info!("speakup-rs stopped");
    Ok(())
}
