use std::fmt;
use thiserror::Error;

/// Result type used throughout the crate
pub type TranscriptResult<T> = Result<T, TranscriptError>;

/// Errors raised while locating, selecting or downloading a transcript
#[derive(Error, Debug)]
pub enum TranscriptError {
    #[error("Failed to fetch video HTML for video ID {video_id}: HTTP {status}")]
    PageFetch { video_id: String, status: u16 },

    #[error("Failed to fetch transcript data: HTTP {status}")]
    TranscriptFetch { status: u16 },

    #[error("Network error: {source}")]
    Network {
        #[from]
        source: reqwest::Error,
    },

    #[error("Failed to create consent cookie for video ID: {video_id}")]
    Consent { video_id: String },

    #[error("Invalid video ID: {video_id}")]
    InvalidVideoId { video_id: String },

    #[error("Too many requests for video ID: {video_id}")]
    RateLimited { video_id: String },

    #[error("Video unavailable: {video_id}")]
    VideoUnavailable { video_id: String },

    #[error("Transcripts disabled for video ID: {video_id}")]
    TranscriptsDisabled { video_id: String },

    #[error("No transcript available for video ID: {video_id}")]
    NoTranscript { video_id: String },

    #[error("Transcript in {language_code} is not translatable")]
    NotTranslatable { language_code: String },

    #[error("Translation language not available: {language}")]
    LanguageUnavailable { language: String },

    #[error("No video ID has been set")]
    MissingVideoId,

    #[error("Failed to parse timed-text payload: {message}")]
    TimedTextParsing { message: String },

    #[error("Serialization error: {source}")]
    Json {
        #[from]
        source: serde_json::Error,
    },

    #[error("Configuration error: {message}")]
    Configuration { message: String },
}

/// Coarse classification of a [`TranscriptError`], stable for callers to branch on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Fetch,
    Consent,
    InvalidIdentifier,
    RateLimited,
    VideoUnavailable,
    TranscriptsDisabled,
    NoTranscript,
    NotTranslatable,
    LanguageUnavailable,
    MissingIdentifier,
    Parse,
    Configuration,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Fetch => "FetchError",
            ErrorKind::Consent => "ConsentError",
            ErrorKind::InvalidIdentifier => "InvalidIdentifierError",
            ErrorKind::RateLimited => "RateLimitedError",
            ErrorKind::VideoUnavailable => "VideoUnavailableError",
            ErrorKind::TranscriptsDisabled => "TranscriptsDisabledError",
            ErrorKind::NoTranscript => "NoTranscriptError",
            ErrorKind::NotTranslatable => "NotTranslatableError",
            ErrorKind::LanguageUnavailable => "LanguageUnavailableError",
            ErrorKind::MissingIdentifier => "MissingIdentifierError",
            ErrorKind::Parse => "ParseError",
            ErrorKind::Configuration => "ConfigurationError",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TranscriptError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            TranscriptError::PageFetch { .. }
            | TranscriptError::TranscriptFetch { .. }
            | TranscriptError::Network { .. } => ErrorKind::Fetch,
            TranscriptError::Consent { .. } => ErrorKind::Consent,
            TranscriptError::InvalidVideoId { .. } => ErrorKind::InvalidIdentifier,
            TranscriptError::RateLimited { .. } => ErrorKind::RateLimited,
            TranscriptError::VideoUnavailable { .. } => ErrorKind::VideoUnavailable,
            TranscriptError::TranscriptsDisabled { .. } => ErrorKind::TranscriptsDisabled,
            TranscriptError::NoTranscript { .. } => ErrorKind::NoTranscript,
            TranscriptError::NotTranslatable { .. } => ErrorKind::NotTranslatable,
            TranscriptError::LanguageUnavailable { .. } => ErrorKind::LanguageUnavailable,
            TranscriptError::MissingVideoId => ErrorKind::MissingIdentifier,
            TranscriptError::TimedTextParsing { .. } | TranscriptError::Json { .. } => {
                ErrorKind::Parse
            }
            TranscriptError::Configuration { .. } => ErrorKind::Configuration,
        }
    }

    /// Whether a caller-side retry (with backoff) could plausibly succeed
    pub fn is_retryable(&self) -> bool {
        match self {
            TranscriptError::Network { .. } | TranscriptError::RateLimited { .. } => true,
            TranscriptError::PageFetch { status, .. }
            | TranscriptError::TranscriptFetch { status } => {
                *status == 429 || (500..600).contains(status)
            }
            _ => false,
        }
    }
}
