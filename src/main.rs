use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use doctor_gateway::api::ApiServerBuilder;
use doctor_gateway::voice::TextToSpeech;
use doctor_gateway::{AudioOutputs, Config, Consultant, Submission, Upload};

/// Doctor - voice and vision consultations backed by hosted AI models
#[derive(Parser)]
#[command(name = "doctor", version, about)]
struct Cli {
    /// Port to listen on (overrides `DOCTOR_PORT` and the config file)
    #[arg(long)]
    port: Option<u16>,

    /// Serve a custom web UI from this directory instead of the built-in form
    #[arg(long)]
    static_dir: Option<PathBuf>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Serve the consultation form (default)
    Serve,
    /// Run a single consultation from local files and print the result
    Analyze {
        /// Recorded question from the patient
        #[arg(short, long)]
        audio: Option<PathBuf>,
        /// Image to examine
        #[arg(short, long)]
        image: Option<PathBuf>,
    },
    /// Test TTS output by writing an audio file
    TestTts {
        /// Text to speak
        #[arg(default_value = "Hello! This is a test of the text to speech system.")]
        text: String,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    // A missing .env file is fine
    let dotenv = dotenvy::dotenv();

    let cli = Cli::parse();

    // Set up logging based on verbosity
    let filter = match cli.verbose {
        0 => "info,doctor_gateway=info",
        1 => "info,doctor_gateway=debug",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    if let Ok(path) = dotenv {
        tracing::debug!(path = %path.display(), "loaded .env file");
    }

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("fatal: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let mut config = Config::load();
    if let Some(port) = cli.port {
        config.server.port = port;
    }
    if cli.static_dir.is_some() {
        config.server.static_dir = cli.static_dir;
    }
    tracing::debug!(?config, "loaded configuration");

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(&config).await,
        Command::Analyze { audio, image } => {
            analyze(&config, audio, image).await;
            Ok(())
        }
        Command::TestTts { text } => test_tts(&config, &text).await,
    }
}

/// Run the HTTP server until interrupted
async fn serve(config: &Config) -> anyhow::Result<()> {
    tracing::info!(
        port = config.server.port,
        base_url = %config.api.base_url,
        vision_model = %config.models.vision,
        output_dir = %config.server.output_dir.display(),
        "starting doctor gateway"
    );

    let consultant = Arc::new(Consultant::from_config(config));

    let server = ApiServerBuilder::new(consultant, config.server.port)
        .api_key_configured(config.has_api_key())
        .models(config.models.clone())
        .static_dir(config.server.static_dir.clone())
        .rate_limit(config.server.rate_limit_per_minute)
        .audio_ttl(Duration::from_secs(config.server.audio_ttl_secs))
        .build();

    tracing::info!("doctor gateway ready - open http://localhost:{}", config.server.port);
    server.run().await?;

    Ok(())
}

/// Run one consultation from files on disk
///
/// Unreadable files degrade like any other failed step.
async fn analyze(config: &Config, audio: Option<PathBuf>, image: Option<PathBuf>) {
    let submission = Submission {
        audio: audio.map(Upload::File),
        image: image.map(Upload::File),
    };

    let consultant = Consultant::from_config(config);
    let outcome = consultant.consult(submission).await;

    println!("Speech to text:\n{}\n", outcome.transcript);
    println!("Analysis:\n{}\n", outcome.analysis);
    println!("Treatment:\n{}\n", outcome.treatment);
    match &outcome.audio_path {
        Some(path) => println!("Audio: {}", path.display()),
        None => println!("Audio: (none)"),
    }
}

/// Synthesize a test phrase and report where it was written
async fn test_tts(config: &Config, text: &str) -> anyhow::Result<()> {
    println!("Testing TTS with text: \"{text}\"\n");

    let tts = TextToSpeech::new(config);
    let audio = tts.synthesize(text).await?;
    println!("Got {} bytes of audio data", audio.len());

    let outputs = AudioOutputs::new(&config.server.output_dir);
    let path = outputs.next_path(&config.voice.tts_format);
    outputs.write(&path, &audio).await?;

    println!("Wrote {}", path.display());
    Ok(())
}
