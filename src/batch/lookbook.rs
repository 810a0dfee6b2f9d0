use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use parking_lot::Mutex;
use tracing::{error, info, warn};

use crate::config::CONFIG;
use crate::llm::generate_outfit_image;
use crate::outfits::service::{recommend, sample_recommendations};
use crate::outfits::{Outfit, RecommendRequest};
use crate::overlay::bitmap::{decode_image_payload, load};
use crate::overlay::export::export_file;
use crate::overlay::{Bitmap, Editor, EditorEvent};
use crate::state::GenerationTracker;

use super::compose::load_image_file;

pub fn lookbook_usage() -> &'static str {
    "Usage: cargo run -- lookbook --face <image> [--out-dir <dir>] [--age <text>] [--style <text>] [--sizes <text>] [--budget <text>] [--colors <text>] [--occasion <text>] [--notes <text>] [--sample]"
}

#[derive(Debug, Clone, PartialEq)]
pub struct LookbookArgs {
    pub face: PathBuf,
    pub out_dir: PathBuf,
    pub request: RecommendRequest,
    pub sample: bool,
}

pub fn parse_lookbook_args(args: &[String]) -> Result<Option<LookbookArgs>> {
    if args.get(1).map(|value| value.as_str()) != Some("lookbook") {
        return Ok(None);
    }

    let mut face = None;
    let mut out_dir = PathBuf::from("lookbook");
    let mut request = RecommendRequest::default();
    let mut sample = false;

    let mut index = 2;
    while index < args.len() {
        let flag = args[index].as_str();
        let field = match flag {
            "--age" => Some(&mut request.age),
            "--style" => Some(&mut request.style),
            "--sizes" => Some(&mut request.sizes),
            "--budget" => Some(&mut request.budget),
            "--colors" => Some(&mut request.colors),
            "--occasion" => Some(&mut request.occasion),
            "--notes" => Some(&mut request.notes),
            _ => None,
        };
        if let Some(field) = field {
            index += 1;
            let value = args
                .get(index)
                .ok_or_else(|| anyhow!("Missing value for {flag}"))?;
            *field = value.clone();
            index += 1;
            continue;
        }

        match flag {
            "--face" => {
                index += 1;
                let value = args
                    .get(index)
                    .ok_or_else(|| anyhow!("Missing value for --face"))?;
                face = Some(PathBuf::from(value));
            }
            "--out-dir" => {
                index += 1;
                let value = args
                    .get(index)
                    .ok_or_else(|| anyhow!("Missing value for --out-dir"))?;
                out_dir = PathBuf::from(value);
            }
            "--sample" => sample = true,
            "--help" | "-h" => return Err(anyhow!(lookbook_usage())),
            other => {
                return Err(anyhow!(
                    "Unknown lookbook argument: {other}\n{}",
                    lookbook_usage()
                ));
            }
        }
        index += 1;
    }

    let face = face.ok_or_else(|| anyhow!("--face is required"))?;
    Ok(Some(LookbookArgs {
        face,
        out_dir,
        request,
        sample,
    }))
}

#[derive(Debug, Default)]
pub struct LookbookSummary {
    pub outfits: usize,
    pub images_written: usize,
    pub generation_failures: usize,
    pub warning: Option<String>,
}

pub fn captions_text(outfits: &[Outfit]) -> String {
    outfits
        .iter()
        .enumerate()
        .map(|(index, outfit)| {
            format!(
                "look-{}: {}\n{}\n",
                index + 1,
                outfit.name,
                outfit.caption
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Why image generation cannot run, if it cannot. Sample looks carry real
/// prompts, so sample mode still renders when the image model is reachable.
pub fn image_generation_blocker(
    openai_configured: bool,
    outfits: &[Outfit],
) -> Option<&'static str> {
    if !openai_configured {
        return Some("OPENAI_API_KEY missing");
    }
    if outfits.iter().all(|outfit| outfit.prompt.trim().is_empty()) {
        return Some("no outfit has an image prompt");
    }
    None
}

/// Requests one image per outfit concurrently. Results land by index; a
/// response is kept only if the tracker still considers it current.
async fn generate_all(outfits: &[Outfit], tracker: &GenerationTracker) -> Vec<Option<String>> {
    let results: Arc<Mutex<Vec<Option<String>>>> =
        Arc::new(Mutex::new(vec![None; outfits.len()]));
    let mut handles = Vec::new();

    for (index, outfit) in outfits.iter().enumerate() {
        if outfit.prompt.trim().is_empty() {
            warn!("Outfit {} has no image prompt; skipping", index + 1);
            continue;
        }
        if tracker.is_loading(index) {
            info!("Superseding in-flight image for look {}", index + 1);
        }
        let ticket = tracker.begin(index);
        let tracker = tracker.clone();
        let results = results.clone();
        let prompt = outfit.prompt.clone();
        handles.push(tokio::spawn(async move {
            let generated = generate_outfit_image(&prompt).await;
            if !tracker.finish(ticket) {
                info!("Dropping stale image for look {}", index + 1);
                return;
            }
            match generated {
                Ok(b64) => results.lock()[index] = Some(b64),
                Err(err) => error!("Look {} image failed: {}", index + 1, err),
            }
        }));
    }

    for handle in handles {
        if let Err(err) = handle.await {
            error!("Image generation task failed: {err}");
        }
    }

    let collected = results.lock().clone();
    collected
}

async fn compose_look(face: &Bitmap, b64: &str) -> Result<Vec<u8>> {
    let (_, bytes) = decode_image_payload(b64)?;
    let base = load(bytes).await?;
    let mut editor = Editor::new(CONFIG.overlay_limits());
    editor.dispatch(EditorEvent::SetBase(base));
    editor.dispatch(EditorEvent::SetOverlay(Some(face.clone())));
    Ok(export_file(editor.surface())?.bytes)
}

async fn write_file(path: &Path, bytes: &[u8]) -> Result<()> {
    tokio::fs::write(path, bytes)
        .await
        .with_context(|| format!("Failed to write {}", path.display()))
}

pub async fn run_lookbook(args: LookbookArgs) -> Result<LookbookSummary> {
    let face = load_image_file(&args.face).await?;
    tokio::fs::create_dir_all(&args.out_dir)
        .await
        .with_context(|| format!("Failed to create {}", args.out_dir.display()))?;

    let response = if args.sample {
        sample_recommendations(&args.request)
    } else {
        recommend(&args.request).await.map_err(|err| match err.detail() {
            Some(detail) => anyhow!("{err}: {detail}"),
            None => anyhow!("{err}"),
        })?
    };
    if let Some(warning) = &response.warning {
        warn!("{}", warning);
    }
    info!("Suggested Instagram caption: {}", response.caption_for_first());

    let mut summary = LookbookSummary {
        outfits: response.outfits.len(),
        warning: response.warning.clone(),
        ..LookbookSummary::default()
    };

    write_file(
        &args.out_dir.join("captions.txt"),
        captions_text(&response.outfits).as_bytes(),
    )
    .await?;

    let blocker = image_generation_blocker(CONFIG.openai_configured(), &response.outfits);
    if let Some(reason) = blocker {
        info!("No images generated ({reason})");
        return Ok(summary);
    }

    let tracker = GenerationTracker::new();
    let images = generate_all(&response.outfits, &tracker).await;
    for (index, image) in images.iter().enumerate() {
        let Some(b64) = image else {
            summary.generation_failures += 1;
            continue;
        };
        match compose_look(&face, b64).await {
            Ok(png) => {
                let path = args.out_dir.join(format!("look-{}.png", index + 1));
                write_file(&path, &png).await?;
                info!("Wrote {}", path.display());
                summary.images_written += 1;
            }
            Err(err) => {
                error!("Failed to compose look {}: {err}", index + 1);
                summary.generation_failures += 1;
            }
        }
    }

    Ok(summary)
}
