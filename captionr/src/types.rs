use serde::{Deserialize, Serialize};
use std::fmt;

pub const DEFAULT_WATCH_URL: &str = "https://www.youtube.com/watch";
pub const DEFAULT_CONSENT_URL: &str = "https://consent.youtube.com/s";

/// Configuration for the transcript fetcher
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptOptions {
    /// Watch page base URL, queried with `?v=<id>`
    pub watch_url: String,
    /// Consent service URL, only used to recognise the consent form
    pub consent_url: String,
    pub timeout_seconds: u64,
    pub user_agent: Option<String>,
    pub proxy: Option<String>,
    pub accept_language: String,
}

impl Default for TranscriptOptions {
    fn default() -> Self {
        Self {
            watch_url: DEFAULT_WATCH_URL.to_string(),
            consent_url: DEFAULT_CONSENT_URL.to_string(),
            timeout_seconds: 30,
            user_agent: None,
            proxy: None,
            accept_language: "en-US,en;q=0.9".to_string(),
        }
    }
}

impl TranscriptOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn watch_url(mut self, url: &str) -> Self {
        self.watch_url = url.to_string();
        self
    }

    pub fn consent_url(mut self, url: &str) -> Self {
        self.consent_url = url.to_string();
        self
    }

    pub fn timeout(mut self, seconds: u64) -> Self {
        self.timeout_seconds = seconds;
        self
    }

    pub fn user_agent(mut self, user_agent: &str) -> Self {
        self.user_agent = Some(user_agent.to_string());
        self
    }

    pub fn proxy(mut self, proxy: &str) -> Self {
        self.proxy = Some(proxy.to_string());
        self
    }

    pub fn accept_language(mut self, value: &str) -> Self {
        self.accept_language = value.to_string();
        self
    }
}

/// One timed line of a transcript, in seconds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptSegment {
    pub start: f64,
    pub duration: f64,
    pub text: String,
}

impl TranscriptSegment {
    pub fn new(start: f64, duration: f64, text: impl Into<String>) -> Self {
        Self {
            start,
            duration,
            text: text.into(),
        }
    }

    pub fn end(&self) -> f64 {
        self.start + self.duration
    }

    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }
}

/// A language a translatable track can be machine-translated into
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranslationLanguage {
    pub language: String,
    pub language_code: String,
}

impl TranslationLanguage {
    pub fn new(language: impl Into<String>, language_code: impl Into<String>) -> Self {
        Self {
            language: language.into(),
            language_code: language_code.into(),
        }
    }
}

/// A single caption track as advertised by the watch page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptDescriptor {
    pub url: String,
    pub language: String,
    pub language_code: String,
    pub is_generated: bool,
    /// Empty unless the track is translatable
    pub translation_languages: Vec<TranslationLanguage>,
}

impl TranscriptDescriptor {
    pub fn new(url: String, language: String, language_code: String, is_generated: bool) -> Self {
        Self {
            url,
            language,
            language_code,
            is_generated,
            translation_languages: Vec::new(),
        }
    }

    pub fn with_translation_languages(mut self, languages: Vec<TranslationLanguage>) -> Self {
        self.translation_languages = languages;
        self
    }

    pub fn is_translatable(&self) -> bool {
        !self.translation_languages.is_empty()
    }
}

impl fmt::Display for TranscriptDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = if self.is_generated {
            "auto-generated"
        } else {
            "manual"
        };
        write!(f, "{} ({}, {})", self.language, self.language_code, kind)
    }
}

/// Language-code keyed descriptors in the order the page listed them.
///
/// Re-inserting a code replaces the descriptor in place, so the first code
/// ever inserted stays first and keeps defining the original language.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TranscriptCatalog {
    entries: Vec<TranscriptDescriptor>,
}

impl TranscriptCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, descriptor: TranscriptDescriptor) {
        match self
            .entries
            .iter_mut()
            .find(|d| d.language_code == descriptor.language_code)
        {
            Some(existing) => *existing = descriptor,
            None => self.entries.push(descriptor),
        }
    }

    pub fn get(&self, language_code: &str) -> Option<&TranscriptDescriptor> {
        self.entries
            .iter()
            .find(|d| d.language_code == language_code)
    }

    /// The first track listed; its language is the video's original language
    pub fn original(&self) -> Option<&TranscriptDescriptor> {
        self.entries.first()
    }

    pub fn iter(&self) -> impl Iterator<Item = &TranscriptDescriptor> {
        self.entries.iter()
    }

    pub fn language_codes(&self) -> Vec<&str> {
        self.entries
            .iter()
            .map(|d| d.language_code.as_str())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Every track the page advertises, split by how it was produced
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TranscriptList {
    pub manually_created: TranscriptCatalog,
    pub generated: TranscriptCatalog,
    pub translation_languages: Vec<TranslationLanguage>,
}

impl TranscriptList {
    /// Manually created tracks shadow generated ones entirely
    pub fn into_active(self) -> TranscriptCatalog {
        if self.manually_created.is_empty() {
            self.generated
        } else {
            self.manually_created
        }
    }
}

// Raw shapes of the `"captions":` JSON fragment embedded in the watch page

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptionsRenderer {
    pub caption_tracks: Option<Vec<CaptionTrack>>,
    pub translation_languages: Option<Vec<RawTranslationLanguage>>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptionTrack {
    pub base_url: String,
    pub name: Option<LocalizedText>,
    pub language_code: String,
    pub kind: Option<String>,
    pub is_translatable: Option<bool>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawTranslationLanguage {
    pub language_code: String,
    pub language_name: Option<LocalizedText>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocalizedText {
    pub simple_text: Option<String>,
    pub runs: Option<Vec<TextRun>>,
}

impl LocalizedText {
    pub fn text(&self) -> Option<&str> {
        self.simple_text.as_deref().or_else(|| {
            self.runs
                .as_ref()
                .and_then(|runs| runs.first().map(|r| r.text.as_str()))
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct TextRun {
    pub text: String,
}

/// Caption metadata located in a watch page, guaranteed to carry a track list
#[derive(Debug, Clone)]
pub struct CaptionsMetadata {
    pub caption_tracks: Vec<CaptionTrack>,
    pub translation_languages: Vec<RawTranslationLanguage>,
}

/// Output formats for rendered transcripts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutputFormat {
    Json,
    Txt,
    Srt,
    Vtt,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Json => "json",
            OutputFormat::Txt => "txt",
            OutputFormat::Srt => "srt",
            OutputFormat::Vtt => "vtt",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}
