//! CLI for Lumina - prompt-to-image generation sessions.

use clap::{Args, Parser, Subcommand, ValueEnum};
use lumina::export::export_image;
use lumina::{
    AspectRatio, Config, GeminiProvider, GeneratedImage, GenerationController, ImageProvider,
    Rejection, SubmitOutcome,
};
use std::path::PathBuf;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "lumina")]
#[command(about = "Turn prompts into images with Gemini and collect them in a gallery")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to a TOML config file (defaults to ./lumina.toml if present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate one image from a text prompt and export it
    Generate(GenerateArgs),

    /// Interactive session: each line is a prompt, results collect in a gallery
    Session(SessionArgs),

    /// List supported aspect ratios
    Ratios,

    /// Check that the API is reachable and the key is accepted
    Check,
}

#[derive(Args)]
struct GenerateArgs {
    /// The text prompt describing the image
    prompt: String,

    /// Aspect ratio (defaults to the configured ratio)
    #[arg(short, long, value_enum)]
    aspect_ratio: Option<AspectRatioArg>,

    /// Directory the image is written to
    #[arg(short, long)]
    out_dir: Option<PathBuf>,
}

#[derive(Args)]
struct SessionArgs {
    /// Initial aspect ratio
    #[arg(short, long, value_enum)]
    aspect_ratio: Option<AspectRatioArg>,

    /// Directory `/save` writes to
    #[arg(short, long)]
    out_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum AspectRatioArg {
    #[value(name = "1:1")]
    Square,
    #[value(name = "3:4")]
    StandardPortrait,
    #[value(name = "4:3")]
    Standard,
    #[value(name = "16:9")]
    Landscape,
    #[value(name = "9:16")]
    Portrait,
}

impl From<AspectRatioArg> for AspectRatio {
    fn from(arg: AspectRatioArg) -> Self {
        match arg {
            AspectRatioArg::Square => AspectRatio::Square,
            AspectRatioArg::StandardPortrait => AspectRatio::StandardPortrait,
            AspectRatioArg::Standard => AspectRatio::Standard,
            AspectRatioArg::Landscape => AspectRatio::Landscape,
            AspectRatioArg::Portrait => AspectRatio::Portrait,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = Config::load(cli.config.as_deref())?;
    init_tracing(&config.log_level);

    match cli.command {
        Commands::Generate(args) => generate(args, &config, cli.json).await?,
        Commands::Session(args) => run_session(args, &config).await?,
        Commands::Ratios => list_ratios(cli.json)?,
        Commands::Check => check(&config).await?,
    }

    Ok(())
}

fn init_tracing(default_level: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn controller_for(
    config: &Config,
    ratio: Option<AspectRatioArg>,
) -> GenerationController<GeminiProvider> {
    let ratio = ratio.map_or(config.default_aspect_ratio, Into::into);
    GenerationController::with_options(config.provider(), ratio, config.gallery_limit())
}

async fn generate(args: GenerateArgs, config: &Config, json_output: bool) -> anyhow::Result<()> {
    let controller = controller_for(config, args.aspect_ratio);
    let ratio = controller.state().aspect_ratio;
    let out_dir = args.out_dir.unwrap_or_else(|| config.export_dir.clone());

    match controller.submit(&args.prompt, ratio).await {
        SubmitOutcome::Completed(image) => {
            let path = export_image(&image, &out_dir)?;
            if json_output {
                let result = serde_json::json!({
                    "success": true,
                    "id": image.id(),
                    "output": path.display().to_string(),
                    "prompt": image.prompt(),
                    "aspect_ratio": image.aspect_ratio(),
                    "timestamp": image.timestamp().to_rfc3339(),
                    "model": controller.provider().model(),
                });
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                println!(
                    "Generated image: {} ({}) via {}",
                    path.display(),
                    image.aspect_ratio(),
                    controller.provider().model()
                );
            }
            Ok(())
        }
        SubmitOutcome::Failed(failure) => {
            if json_output {
                let result = serde_json::json!({
                    "success": false,
                    "kind": failure.kind.to_string(),
                    "error": &failure.message,
                });
                println!("{}", serde_json::to_string_pretty(&result)?);
            }
            anyhow::bail!("{}", failure.message)
        }
        SubmitOutcome::Rejected(Rejection::EmptyPrompt) => anyhow::bail!("prompt is empty"),
        SubmitOutcome::Rejected(Rejection::AlreadyGenerating) => {
            anyhow::bail!("a generation is already in flight")
        }
    }
}

const SESSION_HELP: &str = "\
Type a prompt and press Enter to generate.
  /ratio <r>   select aspect ratio (1:1, 3:4, 4:3, 16:9, 9:16)
  /list        show the gallery, newest first
  /save <n>    export gallery entry n (1 = newest)
  /help        show this help
  /quit        leave the session";

async fn run_session(args: SessionArgs, config: &Config) -> anyhow::Result<()> {
    let controller = controller_for(config, args.aspect_ratio);
    let out_dir = args.out_dir.unwrap_or_else(|| config.export_dir.clone());
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    println!("{SESSION_HELP}");
    print_prompt_line(&controller);

    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        let (command, arg) = line.split_once(' ').unwrap_or((line, ""));
        match command {
            "" => {}
            "/quit" | "/exit" => break,
            "/help" => println!("{SESSION_HELP}"),
            "/list" => print_gallery(&controller.gallery()),
            "/ratio" => match arg.parse::<AspectRatio>() {
                Ok(ratio) => controller.set_aspect_ratio(ratio),
                Err(e) => println!("{e}"),
            },
            "/save" => save_entry(&controller.gallery(), arg, &out_dir),
            _ => {
                controller.set_prompt(line);
                println!("Generating...");
                match controller.submit_current().await {
                    SubmitOutcome::Completed(image) => {
                        println!("Added to gallery ({} images)", controller.gallery().len());
                        print_entry(1, &image);
                    }
                    SubmitOutcome::Failed(failure) => println!("Error: {}", failure.message),
                    SubmitOutcome::Rejected(_) => {}
                }
            }
        }
        print_prompt_line(&controller);
    }

    Ok(())
}

fn print_prompt_line<P: ImageProvider>(controller: &GenerationController<P>) {
    let state = controller.state();
    println!("[{}] >", state.aspect_ratio);
}

fn print_gallery(images: &[GeneratedImage]) {
    if images.is_empty() {
        println!("Nothing here yet. Describe something to start your gallery.");
        return;
    }
    for (i, image) in images.iter().enumerate() {
        print_entry(i + 1, image);
    }
}

fn print_entry(index: usize, image: &GeneratedImage) {
    println!(
        "  {:>3}. [{}] {} \"{}\" ({})",
        index,
        image.aspect_ratio(),
        image.timestamp().format("%H:%M:%S"),
        image.prompt(),
        image.id()
    );
}

fn save_entry(images: &[GeneratedImage], arg: &str, out_dir: &std::path::Path) {
    let Some(image) = arg
        .trim()
        .parse::<usize>()
        .ok()
        .and_then(|n| n.checked_sub(1))
        .and_then(|i| images.get(i))
    else {
        println!("No gallery entry '{}'", arg.trim());
        return;
    };
    match export_image(image, out_dir) {
        Ok(path) => println!("Saved {}", path.display()),
        Err(e) => println!("Export failed: {e}"),
    }
}

fn list_ratios(json_output: bool) -> anyhow::Result<()> {
    if json_output {
        println!("{}", serde_json::to_string_pretty(&AspectRatio::ALL)?);
    } else {
        println!("Aspect ratios:");
        for ratio in AspectRatio::ALL {
            println!("  {ratio}");
        }
    }
    Ok(())
}

async fn check(config: &Config) -> anyhow::Result<()> {
    let provider = config.provider();
    provider.health_check().await?;
    println!("{} reachable at {}", provider.model(), config.endpoint);
    Ok(())
}
