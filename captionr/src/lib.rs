pub mod catalog;
pub mod error;
pub mod extractor;
pub mod fetcher;
pub mod parser;
pub mod processor;
pub mod types;

pub use error::{ErrorKind, TranscriptError, TranscriptResult};
pub use types::{
    OutputFormat, TranscriptCatalog, TranscriptDescriptor, TranscriptList, TranscriptOptions,
    TranscriptSegment, TranslationLanguage,
};

use extractor::{CaptionsExtractor, MarkerExtractor};
use fetcher::PageFetcher;
use tracing::{debug, info};

/// The catalog together with the video it was built for
#[derive(Debug, Default)]
pub struct CatalogCache {
    video_id: Option<String>,
    catalog: Option<TranscriptCatalog>,
}

impl CatalogCache {
    /// Whether a catalog built for `video_id` is held
    pub fn holds(&self, video_id: &str) -> bool {
        self.catalog.is_some() && self.video_id.as_deref() == Some(video_id)
    }

    pub fn catalog(&self) -> Option<&TranscriptCatalog> {
        self.catalog.as_ref()
    }

    pub fn video_id(&self) -> Option<&str> {
        self.video_id.as_deref()
    }

    fn store(&mut self, video_id: String, catalog: TranscriptCatalog) -> &TranscriptCatalog {
        self.video_id = Some(video_id);
        self.catalog.insert(catalog)
    }

    fn invalidate(&mut self) {
        self.video_id = None;
        self.catalog = None;
    }
}

/// Fetches transcripts for one video at a time.
///
/// The catalog of available tracks is built on first use and reused until the
/// video ID changes. Methods take `&mut self`; share an instance across tasks
/// only behind a lock.
pub struct Captionr {
    video_id: Option<String>,
    fetcher: PageFetcher,
    extractor: Box<dyn CaptionsExtractor>,
    cache: CatalogCache,
}

impl Captionr {
    pub fn new(options: TranscriptOptions) -> TranscriptResult<Self> {
        info!("Initializing Captionr with watch URL: {}", options.watch_url);

        Ok(Self {
            video_id: None,
            fetcher: PageFetcher::new(&options)?,
            extractor: Box::new(MarkerExtractor::new()),
            cache: CatalogCache::default(),
        })
    }

    /// Create an instance already pointed at a video
    pub fn for_video(video_id: &str, options: TranscriptOptions) -> TranscriptResult<Self> {
        let mut captionr = Self::new(options)?;
        captionr.set_video_id(video_id);
        Ok(captionr)
    }

    /// Replace the strategy used to find caption metadata in the watch page
    pub fn with_extractor(mut self, extractor: impl CaptionsExtractor + 'static) -> Self {
        self.extractor = Box::new(extractor);
        self.cache.invalidate();
        self
    }

    /// Point at a different video; a cached catalog for another video is dropped
    pub fn set_video_id(&mut self, video_id: &str) {
        if self.cache.video_id() != Some(video_id) {
            debug!("Video ID changed to {}, invalidating catalog", video_id);
            self.cache.invalidate();
        }
        self.video_id = Some(video_id.to_string());
    }

    pub fn video_id(&self) -> Option<&str> {
        self.video_id.as_deref()
    }

    pub fn cache(&self) -> &CatalogCache {
        &self.cache
    }

    /// Language code of the first catalogued track, if the catalog is built
    pub fn original_language(&self) -> Option<&str> {
        self.cache
            .catalog()
            .and_then(|c| c.original())
            .map(|d| d.language_code.as_str())
    }

    fn current_video_id(&self) -> TranscriptResult<String> {
        match self.video_id.as_deref() {
            Some(id) if !id.is_empty() => Ok(id.to_string()),
            _ => Err(TranscriptError::MissingVideoId),
        }
    }

    /// Build the catalog for the current video unless it is already cached
    pub async fn ensure_catalog(&mut self) -> TranscriptResult<&TranscriptCatalog> {
        let video_id = self.current_video_id()?;

        if !self.cache.holds(&video_id) {
            let catalog = self.transcript_list_for(&video_id).await?.into_active();
            info!(
                "Built transcript catalog for {} with {} tracks",
                video_id,
                catalog.len()
            );
            return Ok(self.cache.store(video_id, catalog));
        }

        debug!("Reusing cached transcript catalog for {}", video_id);
        self.cache
            .catalog()
            .ok_or(TranscriptError::NoTranscript { video_id })
    }

    /// Every track the watch page advertises, split into manual and generated.
    /// Always fetches the page; the cached catalog is left untouched.
    pub async fn transcript_list(&self) -> TranscriptResult<TranscriptList> {
        let video_id = self.current_video_id()?;
        self.transcript_list_for(&video_id).await
    }

    async fn transcript_list_for(&self, video_id: &str) -> TranscriptResult<TranscriptList> {
        let html = self.fetcher.fetch_page(video_id).await?;
        let metadata = self.extractor.extract(&html, video_id)?;
        Ok(catalog::build_transcript_list(&metadata))
    }

    /// Fetch the transcript in `language`, or in the original language when `None`.
    /// Other languages are machine translations of the original track.
    pub async fn fetch_transcript(
        &mut self,
        language: Option<&str>,
    ) -> TranscriptResult<Vec<TranscriptSegment>> {
        let video_id = self.current_video_id()?;
        let active = self.ensure_catalog().await?;
        let descriptor = catalog::select_transcript(active, language, &video_id)?;

        self.fetch_segments(&descriptor).await
    }

    /// Download and decode the timed-text payload of a single track
    pub async fn fetch_segments(
        &self,
        descriptor: &TranscriptDescriptor,
    ) -> TranscriptResult<Vec<TranscriptSegment>> {
        info!("Fetching transcript: {}", descriptor);

        let payload = self.fetcher.fetch_timed_text(&descriptor.url).await?;
        let segments = processor::parse_timed_text(&payload)?;

        debug!("Transcript has {} segments", segments.len());
        Ok(segments)
    }
}
