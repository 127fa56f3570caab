//! POST /upload: decode an audio file into a new session and render it
//!
//! The upload is decoded from memory and never written to disk.

use crate::error::AppError;
use crate::state::AppState;
use antenna_field::audio::extension_of;
use antenna_field::{decode_bytes, is_allowed_extension, render_session, Session};
use axum::{
    extract::{Multipart, State},
    Json,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::Serialize;
use std::sync::Arc;
use tracing::info;

/// Multipart field names accepted for the audio file
const FILE_FIELDS: [&str; 2] = ["audio", "file"];

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub message: String,
    pub filename: String,
    pub session_id: String,
    pub duration: f64,
    pub sample_rate: u32,
    pub sample_count: usize,
    /// Waveform envelope for the client canvas
    pub audio_data: Vec<f64>,
    /// Base64 SVG waveform plot
    pub audio_plot: String,
    /// Base64 SVG magnitude spectrum
    pub spectrum_plot: String,
    /// Base64 SVG field frames spread over the track
    pub visualization_frames: Vec<String>,
}

/// Strip a client filename down to a safe basename
pub fn secure_filename(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or_default();
    let cleaned: String = base
        .chars()
        .map(|c| if c.is_whitespace() { '_' } else { c })
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
        .collect();
    cleaned.trim_start_matches('.').to_string()
}

pub async fn upload(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, AppError> {
    let mut upload = None;
    while let Some(field) = multipart.next_field().await? {
        if !FILE_FIELDS.contains(&field.name().unwrap_or_default()) {
            continue;
        }
        let filename = field.file_name().unwrap_or_default().to_string();
        let data = field.bytes().await?;
        upload = Some((filename, data));
        break;
    }

    let (filename, data) = upload.ok_or_else(|| AppError::bad_request("No file part"))?;
    if filename.is_empty() {
        return Err(AppError::bad_request("No selected file"));
    }
    let extension = match extension_of(&filename) {
        Some(ext) if is_allowed_extension(&filename) => ext,
        _ => return Err(AppError::bad_request("File type not allowed")),
    };

    // Sanitized for display only; the extension comes from the name as sent
    let filename = secure_filename(&filename);
    info!("Upload received: {} ({} bytes)", filename, data.len());

    let render_config = state.render;
    let (session, rendered) = tokio::task::spawn_blocking(move || -> Result<_, AppError> {
        let track = decode_bytes(&data, &extension)?;
        let mut session = Session::new();
        session.load_track(track);
        let rendered = render_session(&session, &render_config)?;
        Ok((session, rendered))
    })
    .await??;

    let summary = session
        .track()
        .map(|t| t.summary())
        .ok_or_else(|| AppError::Internal("decoded session has no track".into()))?;
    let session_id = state.sessions.insert(session).await;

    Ok(Json(UploadResponse {
        message: "File uploaded successfully".to_string(),
        filename,
        session_id,
        duration: summary.duration,
        sample_rate: summary.sample_rate,
        sample_count: summary.sample_count,
        audio_data: rendered.envelope,
        audio_plot: STANDARD.encode(rendered.waveform_svg),
        spectrum_plot: STANDARD.encode(rendered.spectrum_svg),
        visualization_frames: rendered
            .frame_svgs
            .iter()
            .map(|svg| STANDARD.encode(svg))
            .collect(),
    }))
}
