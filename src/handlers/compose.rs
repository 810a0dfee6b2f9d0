use axum::extract::{Query, State};
use axum::http::{header, HeaderMap};
use axum::response::{IntoResponse, Response};
use axum::Json;
use base64::{engine::general_purpose, Engine as _};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::overlay::bitmap::{decode_image_payload, is_remote, load};
use crate::overlay::export::{export_file, png_data_url, ExportFile};
use crate::overlay::interaction::SurfaceMapping;
use crate::overlay::{ensure_image_mime, Bitmap, Editor, EditorEvent, OverlayLimits};
use crate::overlay::{OverlayState, PointerInput};
use crate::state::AppState;
use crate::utils::timing::start_request_timer;

use super::errors::ApiError;
use super::finish_timer;

/// Longest pointer session accepted for replay.
pub const MAX_REPLAY_EVENTS: usize = 1000;

#[derive(Debug, Deserialize)]
pub struct ComposeRequest {
    #[serde(default)]
    pub base: String,
    #[serde(default)]
    pub face: String,
    #[serde(default)]
    pub overlay: Option<OverlayState>,
    #[serde(default)]
    pub events: Vec<PointerInput>,
    #[serde(default)]
    pub surface_mapping: Option<SurfaceMapping>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ComposeParams {
    #[serde(default)]
    pub format: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ComposeResponse {
    pub png_b64: String,
    pub data_url: String,
    pub filename: &'static str,
    pub overlay: OverlayState,
}

async fn load_upload(field: &str, payload: &str) -> Result<Bitmap, ApiError> {
    let trimmed = payload.trim();
    if trimmed.is_empty() {
        return Err(ApiError::Validation(format!("{field} required")));
    }
    if is_remote(trimmed) {
        return Err(ApiError::Validation(format!(
            "{field} must be a data URL or base64 image, not a link"
        )));
    }
    let (declared, bytes) = decode_image_payload(trimmed)?;
    ensure_image_mime(declared.as_deref(), &bytes)?;
    Ok(load(bytes).await?)
}

/// Replays the editing session against fresh bitmaps and encodes the result.
pub fn compose_session(
    limits: OverlayLimits,
    base: Bitmap,
    face: Bitmap,
    placement: Option<OverlayState>,
    events: Vec<PointerInput>,
    mapping: SurfaceMapping,
) -> Result<(ExportFile, OverlayState), ApiError> {
    let mut editor = Editor::new(limits);
    editor.dispatch(EditorEvent::SetBase(base));
    editor.dispatch(EditorEvent::SetOverlay(Some(face)));
    if let Some(placement) = placement {
        editor.place(placement.position, placement.diameter);
    }
    let surface = editor.surface_size();
    editor.replay(
        events
            .into_iter()
            .map(|input| EditorEvent::from_input(input, &mapping, surface)),
    );
    debug!(
        "Replayed session: renders={} dragging={} base={}",
        editor.render_count(),
        editor.is_dragging(),
        editor.has_base()
    );
    let file = export_file(editor.surface())?;
    Ok((file, editor.overlay_state()))
}

fn wants_raw_png(params: &ComposeParams, headers: &HeaderMap) -> bool {
    if params
        .format
        .as_deref()
        .is_some_and(|format| format.eq_ignore_ascii_case("png"))
    {
        return true;
    }
    headers
        .get(header::ACCEPT)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|accept| accept.trim().starts_with("image/png"))
}

pub async fn compose_handler(
    State(state): State<AppState>,
    Query(params): Query<ComposeParams>,
    headers: HeaderMap,
    Json(request): Json<ComposeRequest>,
) -> Result<Response, ApiError> {
    let summary = format!("events={}", request.events.len());
    let mut timer = start_request_timer("compose", Some(&summary));
    let raw = wants_raw_png(&params, &headers);
    let result = compose(state.limits, request).await;
    finish_timer(&mut timer, &result);

    let (file, overlay) = result?;
    if raw {
        let disposition = format!("attachment; filename=\"{}\"", file.name);
        return Ok((
            [
                (header::CONTENT_TYPE, file.mime_type.to_string()),
                (header::CONTENT_DISPOSITION, disposition),
            ],
            file.bytes,
        )
            .into_response());
    }

    Ok(Json(ComposeResponse {
        png_b64: general_purpose::STANDARD.encode(&file.bytes),
        data_url: png_data_url(&file.bytes),
        filename: file.name,
        overlay,
    })
    .into_response())
}

async fn compose(
    limits: OverlayLimits,
    request: ComposeRequest,
) -> Result<(ExportFile, OverlayState), ApiError> {
    if request.events.len() > MAX_REPLAY_EVENTS {
        return Err(ApiError::Validation(format!(
            "too many events ({}); at most {MAX_REPLAY_EVENTS} are replayed",
            request.events.len()
        )));
    }
    let base = load_upload("base", &request.base).await?;
    let face = load_upload("face", &request.face).await?;
    let mapping = request
        .surface_mapping
        .unwrap_or_else(SurfaceMapping::identity);
    let placement = request.overlay;
    let events = request.events;

    let (file, overlay) = tokio::task::spawn_blocking(move || {
        compose_session(limits, base, face, placement, events, mapping)
    })
    .await
    .map_err(|err| ApiError::Upstream {
        message: "Failed to compose image".to_string(),
        detail: Some(err.to_string()),
    })??;

    info!(
        "Composed {} bytes with overlay at ({:.0}, {:.0}) d={:.0}",
        file.bytes.len(),
        overlay.position.x,
        overlay.position.y,
        overlay.diameter
    );
    Ok((file, overlay))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::overlay::geometry::Point;
    use image::{Rgba, RgbaImage};

    fn solid(width: u32, height: u32, color: [u8; 4]) -> Bitmap {
        Bitmap::from_rgba(RgbaImage::from_pixel(width, height, Rgba(color))).expect("bitmap")
    }

    #[test]
    fn replayed_drag_lands_clamped_in_the_corner() {
        let events = vec![
            PointerInput::Press {
                x: 300.0,
                y: 160.0,
                pointer: Default::default(),
            },
            PointerInput::Move {
                x: 900.0,
                y: 900.0,
                pointer: Default::default(),
            },
            PointerInput::Release {
                pointer: Default::default(),
            },
        ];
        let (file, overlay) = compose_session(
            OverlayLimits::default(),
            solid(768, 1024, [0, 0, 255, 255]),
            solid(64, 64, [255, 0, 0, 255]),
            Some(OverlayState {
                position: Point::new(220.0, 80.0),
                diameter: 160.0,
            }),
            events,
            SurfaceMapping::identity(),
        )
        .expect("compose");

        assert_eq!(overlay.position, Point::new(608.0, 864.0));
        assert_eq!(file.name, "ai-fashion-gift.png");
        let decoded = image::load_from_memory(&file.bytes).expect("png").to_rgba8();
        assert_eq!(decoded.dimensions(), (768, 1024));
        assert_eq!(decoded.get_pixel(688, 944).0, [255, 0, 0, 255]);
        assert_eq!(decoded.get_pixel(10, 10).0, [0, 0, 255, 255]);
    }

    #[test]
    fn format_query_or_accept_header_selects_raw_png() {
        let png = ComposeParams {
            format: Some("PNG".to_string()),
        };
        assert!(wants_raw_png(&png, &HeaderMap::new()));

        let mut headers = HeaderMap::new();
        headers.insert(header::ACCEPT, "image/png".parse().expect("header"));
        assert!(wants_raw_png(&ComposeParams::default(), &headers));
        assert!(!wants_raw_png(&ComposeParams::default(), &HeaderMap::new()));
    }

    #[tokio::test]
    async fn text_face_is_rejected_before_decoding() {
        let text = general_purpose::STANDARD.encode("hello, not an image");
        let err = load_upload("face", &format!("data:text/plain;base64,{text}"))
            .await
            .expect_err("must reject");
        assert!(matches!(err, ApiError::Validation(_)));
    }

    #[tokio::test]
    async fn remote_links_are_refused_without_fetching() {
        for link in ["http://127.0.0.1:9/face.png", "  https://169.254.169.254/latest"] {
            let err = load_upload("face", link).await.expect_err("must reject");
            let ApiError::Validation(message) = err else {
                panic!("expected a validation error for {link}");
            };
            assert!(message.starts_with("face must be a data URL"));
        }
    }

    #[tokio::test]
    async fn oversized_sessions_fail_before_images_load() {
        let request = ComposeRequest {
            base: String::new(),
            face: String::new(),
            overlay: None,
            events: vec![PointerInput::Reset; MAX_REPLAY_EVENTS + 1],
            surface_mapping: None,
        };
        let err = compose(OverlayLimits::default(), request)
            .await
            .expect_err("too many events");
        let ApiError::Validation(message) = err else {
            panic!("expected a validation error");
        };
        assert!(message.starts_with("too many events"));
    }
}
