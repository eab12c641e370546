use crate::error::{TranscriptError, TranscriptResult};
use crate::parser::looks_like_url;
use crate::types::{CaptionsMetadata, CaptionsRenderer};
use serde_json::Value;
use tracing::{debug, warn};

const CAPTIONS_MARKER: &str = "\"captions\":";
const VIDEO_DETAILS_MARKER: &str = ",\"videoDetails";
const RECAPTCHA_MARKER: &str = "class=\"g-recaptcha\"";
const PLAYABILITY_MARKER: &str = "\"playabilityStatus\":";
const TRACKLIST_FIELD: &str = "playerCaptionsTracklistRenderer";

/// Locates caption metadata inside a watch page
pub trait CaptionsExtractor: Send + Sync {
    fn extract(&self, html: &str, video_id: &str) -> TranscriptResult<CaptionsMetadata>;
}

/// Splits the page on the `"captions":` and `,"videoDetails` markers and
/// decodes whatever lies between them
#[derive(Debug, Default, Clone, Copy)]
pub struct MarkerExtractor;

impl MarkerExtractor {
    pub fn new() -> Self {
        Self
    }

    /// Slice of the page holding the captions JSON, if the marker is present
    fn captions_fragment(html: &str) -> Option<&str> {
        let after_marker = html.split(CAPTIONS_MARKER).nth(1)?;
        after_marker.split(VIDEO_DETAILS_MARKER).next()
    }
}

impl CaptionsExtractor for MarkerExtractor {
    fn extract(&self, html: &str, video_id: &str) -> TranscriptResult<CaptionsMetadata> {
        let Some(fragment) = Self::captions_fragment(html) else {
            debug!("No captions marker in watch page for {}", video_id);
            return Err(diagnose_missing_captions(html, video_id));
        };

        let captions: Value = match serde_json::from_str(fragment) {
            Ok(value) => value,
            Err(e) => {
                debug!("Malformed captions JSON for {}: {}", video_id, e);
                return Err(diagnose_missing_captions(html, video_id));
            }
        };

        let no_transcript = || TranscriptError::NoTranscript {
            video_id: video_id.to_string(),
        };

        let renderer = captions
            .get(TRACKLIST_FIELD)
            .cloned()
            .ok_or_else(no_transcript)?;

        let renderer: CaptionsRenderer = serde_json::from_value(renderer).map_err(|e| {
            warn!("Unexpected caption tracklist shape for {}: {}", video_id, e);
            no_transcript()
        })?;

        let caption_tracks = renderer.caption_tracks.ok_or_else(no_transcript)?;
        debug!("Found {} caption tracks", caption_tracks.len());

        Ok(CaptionsMetadata {
            caption_tracks,
            translation_languages: renderer.translation_languages.unwrap_or_default(),
        })
    }
}

/// Best guess at why a page carries no usable captions JSON.
/// The checks run in a fixed order against the original page.
fn diagnose_missing_captions(html: &str, video_id: &str) -> TranscriptError {
    let video_id = video_id.to_string();

    if looks_like_url(&video_id) {
        return TranscriptError::InvalidVideoId { video_id };
    }

    if html.contains(RECAPTCHA_MARKER) {
        return TranscriptError::RateLimited { video_id };
    }

    if !html.contains(PLAYABILITY_MARKER) {
        return TranscriptError::VideoUnavailable { video_id };
    }

    TranscriptError::TranscriptsDisabled { video_id }
}

/// Convenience wrapper around [`MarkerExtractor`]
pub fn extract_captions_json(html: &str, video_id: &str) -> TranscriptResult<CaptionsMetadata> {
    MarkerExtractor.extract(html, video_id)
}
