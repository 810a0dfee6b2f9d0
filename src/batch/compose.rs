use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use tracing::info;

use crate::config::CONFIG;
use crate::overlay::bitmap::{is_remote, load, load_source};
use crate::overlay::export::{
    export_file, share, to_data_url, DirectoryShareTarget, NoShareTarget, ShareOutcome,
    ShareTarget,
};
use crate::overlay::{ensure_image_mime, Bitmap, Editor, EditorEvent, OverlayState, Point};

pub fn compose_usage() -> &'static str {
    "Usage: cargo run -- compose --base <image|url> --face <image|url> [--x <px>] [--y <px>] [--diameter <px>] [--out <file.png>] [--share] [--data-url]"
}

#[derive(Debug, Clone, PartialEq)]
pub struct ComposeArgs {
    pub base: PathBuf,
    pub face: PathBuf,
    pub x: Option<f32>,
    pub y: Option<f32>,
    pub diameter: Option<f32>,
    pub out: PathBuf,
    pub share: bool,
    pub print_data_url: bool,
}

fn parse_f32(flag: &str, value: Option<&String>) -> Result<f32> {
    let value = value.ok_or_else(|| anyhow!("Missing value for {flag}"))?;
    value
        .parse::<f32>()
        .ok()
        .filter(|parsed| parsed.is_finite())
        .ok_or_else(|| anyhow!("Invalid {flag} value: {value}"))
}

pub fn parse_compose_args(args: &[String]) -> Result<Option<ComposeArgs>> {
    if args.get(1).map(|value| value.as_str()) != Some("compose") {
        return Ok(None);
    }

    let mut base = None;
    let mut face = None;
    let mut x = None;
    let mut y = None;
    let mut diameter = None;
    let mut out = PathBuf::from(crate::overlay::export::EXPORT_FILE_NAME);
    let mut share = false;
    let mut print_data_url = false;

    let mut index = 2;
    while index < args.len() {
        match args[index].as_str() {
            "--base" => {
                index += 1;
                let value = args
                    .get(index)
                    .ok_or_else(|| anyhow!("Missing value for --base"))?;
                base = Some(PathBuf::from(value));
            }
            "--face" => {
                index += 1;
                let value = args
                    .get(index)
                    .ok_or_else(|| anyhow!("Missing value for --face"))?;
                face = Some(PathBuf::from(value));
            }
            "--x" => {
                index += 1;
                x = Some(parse_f32("--x", args.get(index))?);
            }
            "--y" => {
                index += 1;
                y = Some(parse_f32("--y", args.get(index))?);
            }
            "--diameter" => {
                index += 1;
                diameter = Some(parse_f32("--diameter", args.get(index))?);
            }
            "--out" => {
                index += 1;
                let value = args
                    .get(index)
                    .ok_or_else(|| anyhow!("Missing value for --out"))?;
                out = PathBuf::from(value);
            }
            "--share" => share = true,
            "--data-url" => print_data_url = true,
            "--help" | "-h" => return Err(anyhow!(compose_usage())),
            other => {
                return Err(anyhow!(
                    "Unknown compose argument: {other}\n{}",
                    compose_usage()
                ));
            }
        }
        index += 1;
    }

    let base = base.ok_or_else(|| anyhow!("--base is required"))?;
    let face = face.ok_or_else(|| anyhow!("--face is required"))?;

    Ok(Some(ComposeArgs {
        base,
        face,
        x,
        y,
        diameter,
        out,
        share,
        print_data_url,
    }))
}

/// Reads a local image, or fetches it when the argument is an `http(s)` URL.
/// Remote fetches are only reachable from the command line.
pub async fn load_image_file(path: &Path) -> Result<Bitmap> {
    let source = path.to_string_lossy();
    if is_remote(&source) {
        return load_source(&source, CONFIG.max_upload_bytes)
            .await
            .with_context(|| format!("Failed to load {source}"));
    }
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;
    ensure_image_mime(None, &bytes).with_context(|| path.display().to_string())?;
    load(bytes)
        .await
        .with_context(|| format!("Failed to load {}", path.display()))
}

pub fn share_target() -> Box<dyn ShareTarget> {
    if CONFIG.share_dir.trim().is_empty() {
        Box::new(NoShareTarget)
    } else {
        Box::new(DirectoryShareTarget::new(CONFIG.share_dir.trim()))
    }
}

#[derive(Debug)]
pub struct ComposeSummary {
    pub out: PathBuf,
    pub overlay: OverlayState,
    pub share: Option<ShareOutcome>,
}

pub async fn run_compose(args: ComposeArgs) -> Result<ComposeSummary> {
    let base = load_image_file(&args.base).await?;
    let face = load_image_file(&args.face).await?;

    let mut editor = Editor::new(CONFIG.overlay_limits());
    editor.dispatch(EditorEvent::SetBase(base));
    editor.dispatch(EditorEvent::SetOverlay(Some(face)));
    if args.x.is_some() || args.y.is_some() || args.diameter.is_some() {
        let current = editor.overlay_state();
        editor.place(
            Point::new(
                args.x.unwrap_or(current.position.x),
                args.y.unwrap_or(current.position.y),
            ),
            args.diameter.unwrap_or(current.diameter),
        );
    }

    let file = export_file(editor.surface())?;
    tokio::fs::write(&args.out, &file.bytes)
        .await
        .with_context(|| format!("Failed to write {}", args.out.display()))?;
    info!("Wrote {} ({} bytes)", args.out.display(), file.bytes.len());

    if args.print_data_url {
        println!("{}", to_data_url(editor.surface())?);
    }

    let shared = if args.share {
        let outcome = share(editor.surface(), &*share_target())?;
        match &outcome {
            ShareOutcome::Shared { location } => info!("Shared to {}", location),
            ShareOutcome::Unsupported { instructions } => info!("{}", instructions),
        }
        Some(outcome)
    } else {
        None
    };

    Ok(ComposeSummary {
        out: args.out,
        overlay: editor.overlay_state(),
        share: shared,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn argv(values: &[&str]) -> Vec<String> {
        values.iter().map(|value| value.to_string()).collect()
    }

    #[test]
    fn ignores_other_subcommands() {
        assert!(parse_compose_args(&argv(&["bin", "lookbook"]))
            .expect("parse")
            .is_none());
        assert!(parse_compose_args(&argv(&["bin"])).expect("parse").is_none());
    }

    #[test]
    fn parses_placement_flags() {
        let parsed = parse_compose_args(&argv(&[
            "bin", "compose", "--base", "look.png", "--face", "me.jpg", "--x", "120", "--diameter",
            "200", "--out", "gift.png", "--share",
        ]))
        .expect("parse")
        .expect("compose");
        assert_eq!(parsed.base, PathBuf::from("look.png"));
        assert_eq!(parsed.x, Some(120.0));
        assert_eq!(parsed.y, None);
        assert_eq!(parsed.diameter, Some(200.0));
        assert_eq!(parsed.out, PathBuf::from("gift.png"));
        assert!(parsed.share);
        assert!(!parsed.print_data_url);
    }

    #[test]
    fn face_is_required() {
        let err = parse_compose_args(&argv(&["bin", "compose", "--base", "look.png"]))
            .expect_err("missing face");
        assert!(err.to_string().contains("--face"));
    }

    #[test]
    fn rejects_non_numeric_diameter() {
        let err = parse_compose_args(&argv(&[
            "bin", "compose", "--base", "a", "--face", "b", "--diameter", "big",
        ]))
        .expect_err("invalid");
        assert!(err.to_string().contains("Invalid --diameter"));
    }
}
