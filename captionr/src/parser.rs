use url::Url;

/// Whether an identifier is a URL rather than a bare video ID
pub fn looks_like_url(video_id: &str) -> bool {
    video_id.starts_with("http://") || video_id.starts_with("https://")
}

/// Normalizes user input into a video identifier.
///
/// Recognised YouTube URLs yield their video ID; anything else is passed
/// through untouched since identifiers are otherwise opaque.
pub struct VideoIdParser {
    youtube_domains: Vec<&'static str>,
}

impl Default for VideoIdParser {
    fn default() -> Self {
        Self::new()
    }
}

impl VideoIdParser {
    pub fn new() -> Self {
        let youtube_domains = vec![
            "youtube.com",
            "www.youtube.com",
            "youtu.be",
            "m.youtube.com",
            "youtube-nocookie.com",
            "www.youtube-nocookie.com",
        ];

        Self { youtube_domains }
    }

    pub fn parse(&self, input: &str) -> String {
        let input = input.trim();
        Url::parse(input)
            .ok()
            .and_then(|url| self.extract_video_id(&url))
            .unwrap_or_else(|| input.to_string())
    }

    fn extract_video_id(&self, url: &Url) -> Option<String> {
        let domain = url.domain()?;
        if !self.youtube_domains.contains(&domain) {
            return None;
        }

        let segments: Vec<&str> = url.path_segments()?.filter(|s| !s.is_empty()).collect();

        let video_id = match (domain, segments.as_slice()) {
            // youtu.be/VIDEO_ID
            ("youtu.be", [id, ..]) => id.to_string(),
            // /watch?v=VIDEO_ID
            (_, ["watch"]) => url
                .query_pairs()
                .find(|(key, _)| key == "v")
                .map(|(_, value)| value.to_string())?,
            // /embed/VIDEO_ID and /shorts/VIDEO_ID
            (_, ["embed" | "shorts", id, ..]) => id.to_string(),
            _ => return None,
        };

        (!video_id.is_empty()).then_some(video_id)
    }
}
