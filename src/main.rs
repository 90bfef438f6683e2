use clap::{Parser, Subcommand, ValueEnum};
use maquette::imaging::{
    self, AspectRatio, CompositeOptions, FillMode, Rect,
};
use maquette::payload::ImagePayload;
use maquette::service::{ApiClient, GenerationRequest, ImageService, ResolutionTier};
use maquette::{config, output, store};
use std::path::{Path, PathBuf};

fn version_string() -> &'static str {
    let on_tag = env!("ON_RELEASE_TAG");
    if on_tag == "true" {
        env!("CARGO_PKG_VERSION")
    } else {
        let hash = env!("GIT_HASH");
        if hash.is_empty() {
            "dev@unknown"
        } else {
            // Leaked once at startup, called exactly once
            Box::leak(format!("dev@{hash}").into_boxed_str())
        }
    }
}

#[derive(Parser)]
#[command(name = "maquette")]
#[command(about = "Prepare, generate, and composite interior visualization imagery")]
#[command(long_about = "\
Prepare, generate, and composite interior visualization imagery

A typical session:

  # Fit the room photo to what the service expects
  maquette pad --ratio 16:9 room.jpg

  # Ask for four redesign candidates
  maquette generate --prompt 'japandi living room, walnut shelving' \\
      --source out/room-pad-1a2b3c4d.png --count 4

  # Merge the best candidate back through a sofa mask, feathered
  maquette composite --background room.jpg --patch out/generated-9f8e7d6c.png \\
      --mask sofa-mask.png --rect 410,620,900x540 --edge-blend 12

Results land in the output directory under content-hashed names, so nothing
is ever overwritten. Service endpoint, model, and defaults come from
maquette.toml; run 'maquette gen-config' for a documented starting point.")]
#[command(version = version_string())]
struct Cli {
    /// Path to maquette.toml (default: ./maquette.toml if present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Directory for result images
    #[arg(long, default_value = "out", global = true)]
    out: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Crop an image to an aspect ratio (largest centered window)
    Crop {
        /// Target ratio, e.g. 16:9
        #[arg(long)]
        ratio: AspectRatio,
        image: PathBuf,
    },
    /// Pad an image to an aspect ratio (smallest centered canvas)
    Pad {
        /// Target ratio, e.g. 16:9
        #[arg(long)]
        ratio: AspectRatio,
        /// Border fill: white, transparent, or #rrggbb
        #[arg(long, default_value = "white")]
        fill: String,
        image: PathBuf,
    },
    /// Extract an exact pixel rectangle
    Cut {
        /// Rectangle as X,Y,WxH, e.g. 128,64,512x384
        #[arg(long)]
        rect: Rect,
        image: PathBuf,
    },
    /// Merge a generated patch into a background through a mask
    Composite {
        #[arg(long)]
        background: PathBuf,
        #[arg(long)]
        patch: PathBuf,
        #[arg(long)]
        mask: PathBuf,
        /// Placement rectangle as X,Y,WxH in background pixels
        #[arg(long)]
        rect: Rect,
        /// Grow the mask by this many pixels (default from config)
        #[arg(long)]
        expansion: Option<u32>,
        /// Feather radius at the mask boundary (default from config)
        #[arg(long)]
        edge_blend: Option<u32>,
    },
    /// Request images from the generation service
    Generate {
        #[arg(long)]
        prompt: String,
        /// Photo of the space to redesign
        #[arg(long)]
        source: Option<PathBuf>,
        /// Style reference image
        #[arg(long)]
        reference: Option<PathBuf>,
        /// Images to request, 1-8 (default from config)
        #[arg(long, value_parser = clap::value_parser!(u32).range(1..=8))]
        count: Option<u32>,
        /// Aspect-ratio hint, e.g. 16:9 (default from config)
        #[arg(long)]
        ratio: Option<AspectRatio>,
        /// Resolution tier: 1k, 2k or 4k (default from config)
        #[arg(long)]
        resolution: Option<ResolutionTier>,
        /// Model identifier (default from config)
        #[arg(long)]
        model: Option<String>,
        /// Fit the source to the requested ratio before sending
        #[arg(long, value_enum)]
        fit: Option<FitMode>,
    },
    /// Print a stock maquette.toml with all options documented
    GenConfig,
}

/// How `generate --fit` conforms the source to the requested ratio.
#[derive(Debug, Clone, Copy, ValueEnum)]
enum FitMode {
    /// Crop away the overflow
    Crop,
    /// Pad with a white border
    Pad,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let cfg = config::load_or_default(cli.config.as_deref())?;

    match cli.command {
        Command::Crop { ratio, image } => {
            let source = ImagePayload::read_from(&image)?;
            let result = imaging::crop_to_aspect(&source, ratio)?;
            let saved = store::save_payload(&cli.out, &stem_for(&image, "crop"), &result)?;
            output::print_saved(&[saved]);
        }
        Command::Pad { ratio, fill, image } => {
            let fill = parse_fill(&fill)?;
            let source = ImagePayload::read_from(&image)?;
            let result = imaging::pad_to_aspect(&source, ratio, fill)?;
            let saved = store::save_payload(&cli.out, &stem_for(&image, "pad"), &result)?;
            output::print_saved(&[saved]);
        }
        Command::Cut { rect, image } => {
            let source = ImagePayload::read_from(&image)?;
            let result = imaging::crop_to_rect(&source, rect)?;
            let saved = store::save_payload(&cli.out, &stem_for(&image, "cut"), &result)?;
            output::print_saved(&[saved]);
        }
        Command::Composite {
            background,
            patch,
            mask,
            rect,
            expansion,
            edge_blend,
        } => {
            let options = CompositeOptions {
                expansion: expansion.unwrap_or(cfg.compositing.expansion),
                edge_blend: edge_blend.unwrap_or(cfg.compositing.edge_blend),
            };
            let bg = ImagePayload::read_from(&background)?;
            let fg = ImagePayload::read_from(&patch)?;
            let mask_img = ImagePayload::read_from(&mask)?;
            let result = imaging::composite(&bg, &fg, rect, &mask_img, &options)?;
            let saved =
                store::save_payload(&cli.out, &stem_for(&background, "composite"), &result)?;
            output::print_saved(&[saved]);
        }
        Command::Generate {
            prompt,
            source,
            reference,
            count,
            ratio,
            resolution,
            model,
            fit,
        } => {
            let ratio = ratio.unwrap_or_else(|| cfg.default_ratio());
            let source = match source {
                Some(path) => {
                    let payload = ImagePayload::read_from(&path)?;
                    Some(match fit {
                        Some(FitMode::Crop) => imaging::crop_to_aspect(&payload, ratio)?,
                        Some(FitMode::Pad) => {
                            imaging::pad_to_aspect(&payload, ratio, FillMode::default())?
                        }
                        None => payload,
                    })
                }
                None => None,
            };
            let reference = match reference {
                Some(path) => Some(ImagePayload::read_from(&path)?),
                None => None,
            };
            let request = GenerationRequest {
                prompt,
                source,
                reference,
                count: count.unwrap_or(cfg.defaults.count),
                aspect_ratio: ratio,
                resolution: resolution.unwrap_or(cfg.defaults.resolution),
                model: model.unwrap_or_else(|| cfg.service.model.clone()),
            };

            let client = ApiClient::from_config(&cfg.service)?;
            let images = client.generate(&request)?;

            let mut saved = Vec::with_capacity(images.len());
            for payload in &images {
                saved.push(store::save_payload(&cli.out, "generated", payload)?);
            }
            output::print_saved(&saved);
            println!("Generated {} image(s)", saved.len());
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// Output stem: source filename plus the operation, e.g. `room-pad`.
fn stem_for(input: &Path, op: &str) -> String {
    let base = input
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("image");
    format!("{base}-{op}")
}

/// Parse the `--fill` argument: `white`, `transparent`, or `#rrggbb`.
fn parse_fill(s: &str) -> Result<FillMode, String> {
    match s.trim().to_ascii_lowercase().as_str() {
        "white" => Ok(FillMode::Solid([255, 255, 255])),
        "transparent" => Ok(FillMode::Transparent),
        hex => {
            let hex = hex
                .strip_prefix('#')
                .ok_or_else(|| format!("unknown fill '{s}' (use white, transparent, or #rrggbb)"))?;
            if hex.len() != 6 || !hex.is_ascii() {
                return Err(format!("fill color '#{hex}' must be 6 hex digits"));
            }
            let parse = |range: std::ops::Range<usize>| {
                u8::from_str_radix(&hex[range], 16)
                    .map_err(|_| format!("fill color '#{hex}' must be 6 hex digits"))
            };
            Ok(FillMode::Solid([parse(0..2)?, parse(2..4)?, parse(4..6)?]))
        }
    }
}
