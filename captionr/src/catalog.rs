use crate::error::{TranscriptError, TranscriptResult};
use crate::types::{
    CaptionsMetadata, TranscriptCatalog, TranscriptDescriptor, TranscriptList, TranslationLanguage,
};
use tracing::debug;

/// `kind` value the site uses for speech-recognition tracks
const GENERATED_KIND: &str = "asr";

/// Query parameter requesting a machine translation of a track
const TRANSLATION_PARAM: &str = "tlang";

/// Classify caption tracks into manually created and generated transcripts
pub fn build_transcript_list(metadata: &CaptionsMetadata) -> TranscriptList {
    let translation_languages: Vec<TranslationLanguage> = metadata
        .translation_languages
        .iter()
        .map(|lang| {
            let name = lang
                .language_name
                .as_ref()
                .and_then(|n| n.text())
                .unwrap_or(&lang.language_code);
            TranslationLanguage::new(name, lang.language_code.clone())
        })
        .collect();

    let mut list = TranscriptList {
        translation_languages,
        ..TranscriptList::default()
    };

    for track in &metadata.caption_tracks {
        let language = track
            .name
            .as_ref()
            .and_then(|n| n.text())
            .unwrap_or(&track.language_code)
            .to_string();

        let is_generated = track.kind.as_deref() == Some(GENERATED_KIND);

        let translations = if track.is_translatable.unwrap_or(false) {
            list.translation_languages.clone()
        } else {
            Vec::new()
        };

        let descriptor = TranscriptDescriptor::new(
            track.base_url.clone(),
            language,
            track.language_code.clone(),
            is_generated,
        )
        .with_translation_languages(translations);

        debug!("Catalogued transcript track: {}", descriptor);

        if is_generated {
            list.generated.insert(descriptor);
        } else {
            list.manually_created.insert(descriptor);
        }
    }

    list
}

/// Active catalog for a video: manual tracks if any exist, otherwise generated ones
pub fn build_catalog(metadata: &CaptionsMetadata) -> TranscriptCatalog {
    build_transcript_list(metadata).into_active()
}

/// The first catalogued track, which defines the video's original language
pub fn select_default<'a>(
    catalog: &'a TranscriptCatalog,
    video_id: &str,
) -> TranscriptResult<&'a TranscriptDescriptor> {
    catalog.original().ok_or_else(|| TranscriptError::NoTranscript {
        video_id: video_id.to_string(),
    })
}

/// Track to download for a requested language.
///
/// No language, an empty code, or the original language yields the original
/// track as is;
/// any other language is a translation of the original track.
pub fn select_transcript(
    catalog: &TranscriptCatalog,
    language: Option<&str>,
    video_id: &str,
) -> TranscriptResult<TranscriptDescriptor> {
    let original = select_default(catalog, video_id)?;

    match language {
        None | Some("") => Ok(original.clone()),
        Some(code) if code == original.language_code => Ok(original.clone()),
        Some(code) => translate(original, code),
    }
}

/// Derive a descriptor for a machine translation of `descriptor` into `target`
pub fn translate(
    descriptor: &TranscriptDescriptor,
    target: &str,
) -> TranscriptResult<TranscriptDescriptor> {
    if !descriptor.is_translatable() {
        return Err(TranscriptError::NotTranslatable {
            language_code: descriptor.language_code.clone(),
        });
    }

    if !descriptor
        .translation_languages
        .iter()
        .any(|l| l.language_code == target)
    {
        return Err(TranscriptError::LanguageUnavailable {
            language: target.to_string(),
        });
    }

    let separator = if descriptor.url.contains('?') { '&' } else { '?' };

    let mut translated = descriptor.clone();
    translated.url = format!(
        "{}{}{}={}",
        descriptor.url, separator, TRANSLATION_PARAM, target
    );
    translated.language_code = target.to_string();

    debug!(
        "Translating {} transcript into {}",
        descriptor.language_code, target
    );

    Ok(translated)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{CaptionTrack, LocalizedText, RawTranslationLanguage};

    fn text(value: &str) -> Option<LocalizedText> {
        Some(LocalizedText {
            simple_text: Some(value.to_string()),
            runs: None,
        })
    }

    fn track(code: &str, kind: Option<&str>, translatable: bool) -> CaptionTrack {
        CaptionTrack {
            base_url: format!("https://tt/{code}?v=abc123"),
            name: text(&code.to_uppercase()),
            language_code: code.to_string(),
            kind: kind.map(str::to_string),
            is_translatable: Some(translatable),
        }
    }

    fn metadata(tracks: Vec<CaptionTrack>) -> CaptionsMetadata {
        CaptionsMetadata {
            caption_tracks: tracks,
            translation_languages: vec![
                RawTranslationLanguage {
                    language_code: "de".to_string(),
                    language_name: text("German"),
                },
                RawTranslationLanguage {
                    language_code: "fr".to_string(),
                    language_name: text("French"),
                },
            ],
        }
    }

    #[test]
    fn test_build_transcript_list() {
        let list = build_transcript_list(&metadata(vec![
            track("en", Some("asr"), true),
            track("es", None, false),
        ]));

        assert_eq!(list.translation_languages.len(), 2);
        assert_eq!(list.translation_languages[0].language, "German");

        let generated = list.generated.get("en").unwrap();
        assert!(generated.is_generated);
        assert_eq!(generated.translation_languages.len(), 2);

        let manual = list.manually_created.get("es").unwrap();
        assert!(!manual.is_generated);
        assert!(manual.translation_languages.is_empty());
    }

    #[test]
    fn test_manual_tracks_hide_generated_from_default() {
        let catalog = build_catalog(&metadata(vec![
            track("en", Some("asr"), true),
            track("en", None, true),
            track("es", None, false),
        ]));

        assert_eq!(catalog.len(), 2);
        let default = select_default(&catalog, "abc123").unwrap();
        assert_eq!(default.language_code, "en");
        assert!(!default.is_generated);
        assert!(catalog.iter().all(|d| !d.is_generated));
    }

    #[test]
    fn test_empty_catalog_has_no_default() {
        let catalog = build_catalog(&metadata(vec![]));
        let result = select_default(&catalog, "abc123");
        assert!(matches!(result, Err(TranscriptError::NoTranscript { .. })));
    }

    #[test]
    fn test_translate() {
        let catalog = build_catalog(&metadata(vec![track("en", Some("asr"), true)]));
        let original = select_default(&catalog, "abc123").unwrap();

        let translated = translate(original, "de").unwrap();
        assert_eq!(translated.url, "https://tt/en?v=abc123&tlang=de");
        assert_eq!(translated.language_code, "de");
        assert_eq!(translated.language, original.language);
        assert_eq!(translated.is_generated, original.is_generated);
    }

    #[test]
    fn test_translate_unknown_language() {
        let catalog = build_catalog(&metadata(vec![track("en", None, true)]));
        let result = translate(catalog.original().unwrap(), "ja");
        assert!(matches!(
            result,
            Err(TranscriptError::LanguageUnavailable { language }) if language == "ja"
        ));
    }

    #[test]
    fn test_translate_untranslatable() {
        let catalog = build_catalog(&metadata(vec![track("en", None, false)]));
        let result = translate(catalog.original().unwrap(), "de");
        assert!(matches!(
            result,
            Err(TranscriptError::NotTranslatable { .. })
        ));
    }

    #[test]
    fn test_select_transcript() {
        let catalog = build_catalog(&metadata(vec![
            track("en", None, true),
            track("fr", None, true),
        ]));

        let default = select_transcript(&catalog, None, "abc123").unwrap();
        assert_eq!(default.url, "https://tt/en?v=abc123");

        let same = select_transcript(&catalog, Some("en"), "abc123").unwrap();
        assert_eq!(same, default);

        // other languages always translate the original track
        let french = select_transcript(&catalog, Some("fr"), "abc123").unwrap();
        assert_eq!(french.url, "https://tt/en?v=abc123&tlang=fr");
    }

    #[test]
    fn test_empty_language_selects_original() {
        let catalog = build_catalog(&metadata(vec![track("en", None, false)]));

        let selected = select_transcript(&catalog, Some(""), "abc123").unwrap();
        assert_eq!(selected, *catalog.original().unwrap());
        assert!(!selected.url.contains("tlang"));
    }
}
