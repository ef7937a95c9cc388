//! Script generator CLI.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::{error, info};

use vscript_llm::{CannedGenerator, GeminiClient, TextGenerator};
use vscript_media::{check_ytdlp, MediaConfig, YtDlpAudioPipeline, YtDlpSearcher};
use vscript_models::ItemAnalysis;
use vscript_worker::persist::render_script_markdown;
use vscript_worker::{
    init_tracing, ArtifactStore, PatternSynthesizer, PipelineConfig, PipelineRequest,
    PipelineServices, ScriptPipeline,
};

#[derive(Parser)]
#[command(name = "vscript")]
#[command(about = "Generate YouTube scripts from the patterns of successful videos", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full pipeline for a video idea
    Generate {
        /// The video idea, in any language
        idea: String,

        /// Target script length in minutes
        #[arg(short, long)]
        minutes: Option<f64>,

        /// Style hint for the script (e.g. "energetic", "calm")
        #[arg(short, long)]
        style: Option<String>,

        /// Number of reference videos to analyze
        #[arg(long)]
        max_videos: Option<usize>,

        /// Also produce a Spanish translation
        #[arg(long)]
        translate: bool,

        /// Root directory for run artifacts
        #[arg(short, long)]
        output_dir: Option<PathBuf>,

        /// Do not write artifacts to disk
        #[arg(long)]
        no_persist: bool,
    },

    /// Transcribe one video and write an executive summary of it
    Summarize {
        /// YouTube video URL
        url: String,

        /// Root directory for run artifacts
        #[arg(short, long)]
        output_dir: Option<PathBuf>,

        /// Do not write artifacts to disk
        #[arg(long)]
        no_persist: bool,
    },

    /// Transcribe one video
    Transcribe {
        /// YouTube video URL
        url: String,

        /// Title for the transcript file, instead of the video's own
        #[arg(short, long)]
        title: Option<String>,

        /// Directory for the transcript file
        #[arg(short, long)]
        output_dir: Option<PathBuf>,

        /// Print the transcript only, without writing it
        #[arg(long)]
        no_persist: bool,
    },

    /// Synthesize patterns from a JSON file of per-item analyses
    Synthesize {
        /// JSON array of item analyses
        #[arg(short, long)]
        input: PathBuf,

        /// Topic the analyses belong to
        #[arg(short, long)]
        topic: String,

        /// Target script length in minutes
        #[arg(short, long, default_value = "10")]
        minutes: f64,

        /// Render the template report without calling the generative service
        #[arg(long)]
        template_only: bool,

        /// Directory for synthesis.json and synthesis_report.md
        #[arg(short, long)]
        output_dir: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() {
    // Install rustls crypto provider (required for TLS/HTTPS)
    if rustls::crypto::ring::default_provider()
        .install_default()
        .is_err()
    {
        eprintln!("rustls crypto provider already installed");
    }

    // Load environment variables
    dotenvy::dotenv().ok();

    init_tracing();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Generate {
            idea,
            minutes,
            style,
            max_videos,
            translate,
            output_dir,
            no_persist,
        } => {
            let config = cli_config(output_dir, no_persist);
            let request = PipelineRequest {
                idea,
                target_minutes: minutes,
                style,
                max_videos,
                translate_to_spanish: translate.then_some(true),
                run_id: None,
            };
            generate(config, request).await
        }
        Commands::Summarize {
            url,
            output_dir,
            no_persist,
        } => summarize(cli_config(output_dir, no_persist), &url).await,
        Commands::Transcribe {
            url,
            title,
            output_dir,
            no_persist,
        } => transcribe(cli_config(output_dir, no_persist), &url, title.as_deref()).await,
        Commands::Synthesize {
            input,
            topic,
            minutes,
            template_only,
            output_dir,
        } => synthesize(input, topic, minutes, template_only, output_dir).await,
    };

    if let Err(e) = result {
        error!("{:#}", e);
        std::process::exit(1);
    }
}

async fn generate(config: PipelineConfig, request: PipelineRequest) -> anyhow::Result<()> {
    let media = MediaConfig::from_env();
    check_ytdlp(&media).context("yt-dlp is required for video search")?;
    let generator = GeminiClient::from_env().context("failed to create Gemini client")?;

    info!("Pipeline config: {:?}", config);
    let services = PipelineServices {
        generator: Arc::new(generator),
        index: Arc::new(YtDlpSearcher::new(media.clone())),
        audio: Arc::new(YtDlpAudioPipeline::new(media)),
    };
    let pipeline = ScriptPipeline::new(config, services);
    let outcome = pipeline.run(request).await?;

    println!("{}", render_script_markdown(&outcome.script));
    if let Some(translated) = &outcome.translated_script {
        println!("\n{}", render_script_markdown(translated));
    }
    match &outcome.output_dir {
        Some(dir) => info!(run_id = %outcome.run_id, dir = %dir.display(), "Artifacts saved"),
        None => info!(run_id = %outcome.run_id, "Run finished without persistence"),
    }
    Ok(())
}

fn cli_config(output_dir: Option<PathBuf>, no_persist: bool) -> PipelineConfig {
    let mut config = PipelineConfig::from_env();
    if let Some(dir) = output_dir {
        config.output_dir = dir;
    }
    if no_persist {
        config.persist = false;
    }
    config
}

/// Pipeline over yt-dlp. Without a Gemini key, generative calls fail fast.
fn single_video_pipeline(config: PipelineConfig) -> anyhow::Result<ScriptPipeline> {
    let media = MediaConfig::from_env();
    check_ytdlp(&media).context("yt-dlp is required for transcription")?;
    let generator: Arc<dyn TextGenerator> = match GeminiClient::from_env() {
        Ok(client) => Arc::new(client),
        Err(e) => {
            info!("Gemini client unavailable: {}", e);
            Arc::new(CannedGenerator::unavailable())
        }
    };
    let services = PipelineServices {
        generator,
        index: Arc::new(YtDlpSearcher::new(media.clone())),
        audio: Arc::new(YtDlpAudioPipeline::new(media)),
    };
    Ok(ScriptPipeline::new(config, services))
}

async fn summarize(config: PipelineConfig, url: &str) -> anyhow::Result<()> {
    let pipeline = single_video_pipeline(config)?;
    let outcome = pipeline.summarize_video(url).await?;

    println!("{}", outcome.summary.to_markdown());
    if let Some(dir) = &outcome.output_dir {
        info!(run_id = %outcome.run_id, dir = %dir.display(), "Summary saved");
    }
    Ok(())
}

async fn transcribe(config: PipelineConfig, url: &str, title: Option<&str>) -> anyhow::Result<()> {
    let pipeline = single_video_pipeline(config)?;
    let outcome = pipeline.transcribe_video(url, title).await?;

    println!("{}", outcome.transcript.to_file_text());
    info!(
        title = %outcome.video.title,
        words = outcome.transcript.word_count(),
        "Transcription finished"
    );
    if let Some(path) = &outcome.output_path {
        info!(path = %path.display(), "Transcript saved");
    }
    Ok(())
}

async fn synthesize(
    input: PathBuf,
    topic: String,
    minutes: f64,
    template_only: bool,
    output_dir: Option<PathBuf>,
) -> anyhow::Result<()> {
    let raw = tokio::fs::read_to_string(&input)
        .await
        .with_context(|| format!("failed to read {}", input.display()))?;
    let analyses: Vec<ItemAnalysis> =
        serde_json::from_str(&raw).context("input must be a JSON array of item analyses")?;

    let synthesizer = if template_only {
        PatternSynthesizer::template_only()
    } else {
        PatternSynthesizer::new(Arc::new(
            GeminiClient::from_env().context("failed to create Gemini client")?,
        ))
    };
    let synthesis = synthesizer.synthesize(&topic, &analyses, minutes).await?;

    match output_dir {
        Some(dir) => {
            let store = ArtifactStore::in_dir(dir);
            if !store.save_synthesis(&synthesis).await {
                anyhow::bail!("failed to write synthesis artifacts");
            }
            info!(dir = %store.run_dir().display(), "Synthesis saved");
        }
        None => println!("{}", synthesis.report.markdown),
    }
    Ok(())
}
