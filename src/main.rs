use archrender::logger::{self, LogLevel, LoggerConfig};
use archrender::{
    AspectRatio, CameraEffect, CameraHeight, CameraLens, Config, Dimensions, Download,
    DownloadFormat, EnhanceFlow, GenAiClient, PerspectiveFlow, PerspectiveOptions, SketchFlow,
    SourceImage,
};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(
    name = "archrender",
    version,
    about = "Enhance, re-frame and render architectural images with a generative model"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
    #[command(flatten)]
    output: OutputArgs,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Crop a region and generate two enhanced versions of it.
    Enhance(EnhanceArgs),
    /// Generate four views of the building from different camera positions.
    Perspective(PerspectiveArgs),
    /// Fit a sketch to an aspect ratio and render it four times.
    Sketch(SketchArgs),
}

#[derive(Debug, Args)]
struct OutputArgs {
    /// Directory to write results to (defaults to OUTPUT_DIR or the current directory).
    #[arg(long, global = true)]
    out: Option<PathBuf>,
    /// png or jpg (defaults to DOWNLOAD_FORMAT or png).
    #[arg(long, global = true)]
    format: Option<DownloadFormat>,
    #[arg(long, short, global = true)]
    verbose: bool,
}

#[derive(Debug, Args)]
struct EnhanceArgs {
    image: PathBuf,
    prompt: Option<String>,
    /// Selection as x,y,width,height in displayed coordinates.
    #[arg(long, value_parser = parse_region)]
    region: Option<[f64; 4]>,
    /// Size the image is displayed at, as WIDTHxHEIGHT (defaults to native size).
    #[arg(long, value_parser = parse_dimensions)]
    display: Option<Dimensions>,
}

#[derive(Debug, Args)]
struct PerspectiveArgs {
    image: PathBuf,
    prompt: Option<String>,
    #[arg(long)]
    height: Option<CameraHeight>,
    #[arg(long)]
    lens: Option<CameraLens>,
    #[arg(long)]
    effect: Option<CameraEffect>,
}

#[derive(Debug, Args)]
struct SketchArgs {
    image: PathBuf,
    prompt: Option<String>,
    #[arg(long, default_value_t = AspectRatio::SQUARE)]
    aspect: AspectRatio,
    /// Ask the text model for a prompt when none is given.
    #[arg(long)]
    suggest: bool,
}

fn parse_region(value: &str) -> Result<[f64; 4], String> {
    let parts = value
        .split(',')
        .map(|part| part.trim().parse::<f64>().map_err(|e| e.to_string()))
        .collect::<Result<Vec<_>, _>>()?;
    match parts.as_slice() {
        [x, y, width, height] => Ok([*x, *y, *width, *height]),
        _ => Err(format!("expected x,y,width,height but got '{}'", value)),
    }
}

fn parse_dimensions(value: &str) -> Result<Dimensions, String> {
    let (width, height) = value
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("expected WIDTHxHEIGHT but got '{}'", value))?;
    let width = width.trim().parse::<u32>().map_err(|e| e.to_string())?;
    let height = height.trim().parse::<u32>().map_err(|e| e.to_string())?;
    Ok(Dimensions::new(width, height))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let dotenv_loaded = dotenv::dotenv().is_ok();
    let cli = Cli::parse();

    let logger_config = if cli.output.verbose {
        LoggerConfig::development()
    } else {
        LoggerConfig::default().with_level(LogLevel::Info)
    };
    logger::init_with_config(logger_config)?;
    if !dotenv_loaded {
        log::debug!("No .env file found, using process environment");
    }

    let config = Config::from_env();
    let client = GenAiClient::new(&config.genai.clone().unwrap_or_default())?;

    let downloads = match cli.command {
        Command::Enhance(args) => run_enhance(args, &client, &cli.output, &config).await?,
        Command::Perspective(args) => {
            run_perspective(args, &client, &cli.output, &config).await?
        }
        Command::Sketch(args) => run_sketch(args, &client, &cli.output, &config).await?,
    };

    let out_dir = cli
        .output
        .out
        .clone()
        .unwrap_or_else(|| PathBuf::from(config.output_dir()));
    for download in &downloads {
        if let Some(warning) = &download.warning {
            log::warn!("{}: {}", download.file_name, warning);
        }
        let path = download.save(&out_dir)?;
        println!("{}", path.display());
    }

    Ok(())
}

fn download_format(output: &OutputArgs, config: &Config) -> DownloadFormat {
    output.format.unwrap_or(config.download_format)
}

async fn run_enhance(
    args: EnhanceArgs,
    client: &GenAiClient,
    output: &OutputArgs,
    config: &Config,
) -> archrender::Result<Vec<Download>> {
    let source = SourceImage::from_path(&args.image)?;
    let displayed = match args.display {
        Some(displayed) => displayed,
        None => source.dimensions()?,
    };

    let mut flow = EnhanceFlow::new();
    flow.load(source, displayed)?;
    if let Some([x, y, width, height]) = args.region {
        flow.select(x, y, width, height)?;
    }
    if let Some(prompt) = args.prompt {
        flow.set_prompt(prompt);
    }

    flow.submit(client).await?;
    flow.downloads(download_format(output, config))
}

async fn run_perspective(
    args: PerspectiveArgs,
    client: &GenAiClient,
    output: &OutputArgs,
    config: &Config,
) -> archrender::Result<Vec<Download>> {
    let mut flow = PerspectiveFlow::new();
    flow.load(SourceImage::from_path(&args.image)?)?;
    if let Some(prompt) = args.prompt {
        flow.set_prompt(prompt);
    }

    let defaults = PerspectiveOptions::default();
    flow.set_options(PerspectiveOptions {
        height: args.height.or(defaults.height),
        lens: args.lens.or(defaults.lens),
        effect: args.effect.or(defaults.effect),
    });

    flow.submit(client).await?;
    flow.downloads(download_format(output, config))
}

async fn run_sketch(
    args: SketchArgs,
    client: &GenAiClient,
    output: &OutputArgs,
    config: &Config,
) -> archrender::Result<Vec<Download>> {
    let mut flow = SketchFlow::new();
    flow.set_aspect_ratio(args.aspect)?;
    flow.load(SourceImage::from_path(&args.image)?)?;

    match args.prompt {
        Some(prompt) => flow.set_prompt(prompt),
        None if args.suggest => {
            let suggested = flow.suggest_prompt(client).await?;
            log::info!("Suggested prompt: {}", suggested);
        }
        None => {}
    }

    flow.submit(client).await?;
    flow.downloads(download_format(output, config))
}
