use crate::error::{TranscriptError, TranscriptResult};
use crate::types::{OutputFormat, TranscriptSegment};
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use tracing::debug;

const SEGMENT_ELEMENT: &[u8] = b"text";

/// Decode a timed-text XML document into segments.
///
/// Every `<text>` child of the root element becomes one segment, in document
/// order. Segments whose text is empty or whitespace-only are dropped.
pub fn parse_timed_text(xml: &str) -> TranscriptResult<Vec<TranscriptSegment>> {
    let mut reader = Reader::from_str(xml);
    let mut segments = Vec::new();
    let mut current: Option<TranscriptSegment> = None;
    let mut depth = 0usize;
    let mut saw_root = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                depth += 1;
                saw_root = true;
                if depth == 2 && e.name().as_ref() == SEGMENT_ELEMENT {
                    current = Some(segment_from_attributes(&e));
                }
            }
            Ok(Event::Empty(e)) => {
                saw_root = true;
                if depth == 1 && e.name().as_ref() == SEGMENT_ELEMENT {
                    segments.push(segment_from_attributes(&e));
                }
            }
            Ok(Event::End(_)) => {
                if depth == 2 {
                    if let Some(segment) = current.take() {
                        segments.push(segment);
                    }
                }
                depth = depth.saturating_sub(1);
            }
            Ok(Event::Text(e)) => {
                if let Some(segment) = current.as_mut() {
                    let text = e.unescape().map_err(|e| TranscriptError::TimedTextParsing {
                        message: e.to_string(),
                    })?;
                    segment.text.push_str(&text);
                }
            }
            Ok(Event::CData(e)) => {
                if let Some(segment) = current.as_mut() {
                    segment.text.push_str(&String::from_utf8_lossy(&e.into_inner()));
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(TranscriptError::TimedTextParsing {
                    message: format!("at position {}: {}", reader.buffer_position(), e),
                });
            }
            _ => {}
        }
    }

    if !saw_root {
        return Err(TranscriptError::TimedTextParsing {
            message: "document has no root element".to_string(),
        });
    }

    debug!("Parsed {} timed-text elements", segments.len());
    Ok(drop_blank_segments(segments))
}

fn segment_from_attributes(element: &BytesStart<'_>) -> TranscriptSegment {
    let mut segment = TranscriptSegment::new(0.0, 0.0, String::new());

    for attr in element.attributes().flatten() {
        match attr.key.as_ref() {
            b"start" => segment.start = parse_seconds(&attr.value),
            b"dur" => segment.duration = parse_seconds(&attr.value),
            _ => {}
        }
    }

    segment
}

/// Seconds as a non-negative float, 0.0 when the value is unusable
fn parse_seconds(raw: &[u8]) -> f64 {
    std::str::from_utf8(raw)
        .ok()
        .and_then(|value| value.trim().parse::<f64>().ok())
        .filter(|value| value.is_finite() && *value >= 0.0)
        .unwrap_or(0.0)
}

fn drop_blank_segments(segments: Vec<TranscriptSegment>) -> Vec<TranscriptSegment> {
    segments.into_iter().filter(|s| !s.is_blank()).collect()
}

/// Renders segments for display or storage
pub struct SegmentRenderer;

impl SegmentRenderer {
    pub fn render(segments: &[TranscriptSegment], format: OutputFormat) -> TranscriptResult<String> {
        match format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(segments)?),
            OutputFormat::Txt => Ok(Self::to_txt(segments)),
            OutputFormat::Srt => Ok(Self::to_srt(segments)),
            OutputFormat::Vtt => Ok(Self::to_vtt(segments)),
        }
    }

    fn to_txt(segments: &[TranscriptSegment]) -> String {
        segments
            .iter()
            .map(|s| s.text.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn to_srt(segments: &[TranscriptSegment]) -> String {
        let mut result = String::new();

        for (i, segment) in segments.iter().enumerate() {
            result.push_str(&format!("{}\n", i + 1));
            result.push_str(&format!(
                "{} --> {}\n",
                timestamp(segment.start, ','),
                timestamp(segment.end(), ',')
            ));
            result.push_str(&segment.text);
            result.push_str("\n\n");
        }

        result
    }

    fn to_vtt(segments: &[TranscriptSegment]) -> String {
        let mut result = String::from("WEBVTT\n\n");

        for segment in segments {
            result.push_str(&format!(
                "{} --> {}\n",
                timestamp(segment.start, '.'),
                timestamp(segment.end(), '.')
            ));
            result.push_str(&segment.text);
            result.push_str("\n\n");
        }

        result
    }
}

/// `HH:MM:SS<sep>mmm`
fn timestamp(seconds: f64, separator: char) -> String {
    let total_ms = (seconds.max(0.0) * 1000.0).round() as u64;
    let hours = total_ms / 3_600_000;
    let minutes = (total_ms % 3_600_000) / 60_000;
    let secs = (total_ms % 60_000) / 1000;
    let millis = total_ms % 1000;
    format!(
        "{:02}:{:02}:{:02}{}{:03}",
        hours, minutes, secs, separator, millis
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_parse_segment_attributes() {
        let xml = r#"<?xml version="1.0" encoding="utf-8" ?><transcript><text start="1.5" dur="2.0">Hello</text></transcript>"#;

        let segments = parse_timed_text(xml).unwrap();
        assert_eq!(segments, vec![TranscriptSegment::new(1.5, 2.0, "Hello")]);
    }

    #[test]
    fn test_empty_segments_dropped_in_order() {
        let xml = r#"<transcript>
<text start="0.0" dur="1.0">first</text>
<text start="1.0" dur="1.0"></text>
<text start="2.0" dur="1.0">   </text>
<text start="3.0" dur="1.0"/>
<text start="4.0" dur="1.0">second</text>
</transcript>"#;

        let segments = parse_timed_text(xml).unwrap();
        let texts: Vec<&str> = segments.iter().map(|s| s.text.as_str()).collect();
        assert_eq!(texts, vec!["first", "second"]);
        assert_eq!(segments[1].start, 4.0);
    }

    #[test]
    fn test_missing_or_bad_attributes_default_to_zero() {
        let xml = r#"<transcript><text>no timing</text><text start="abc" dur="-1">bad timing</text></transcript>"#;

        let segments = parse_timed_text(xml).unwrap();
        assert_eq!(segments.len(), 2);
        for segment in &segments {
            assert_eq!(segment.start, 0.0);
            assert_eq!(segment.duration, 0.0);
        }
    }

    #[test]
    fn test_entities_decoded_whitespace_kept() {
        let xml = r#"<transcript><text start="1" dur="1"> Tom &amp; Jerry&#39;s </text><text start="2"><![CDATA[raw <b>]]></text></transcript>"#;

        let segments = parse_timed_text(xml).unwrap();
        assert_eq!(segments[0].text, " Tom & Jerry's ");
        assert_eq!(segments[1].text, "raw <b>");
        assert_eq!(segments[1].duration, 0.0);
    }

    #[test]
    fn test_nested_markup_contributes_text() {
        let xml = r#"<transcript><text start="1" dur="1">hello <font color="red">world</font></text></transcript>"#;

        let segments = parse_timed_text(xml).unwrap();
        assert_eq!(segments[0].text, "hello world");
    }

    #[test]
    fn test_malformed_xml() {
        let result = parse_timed_text(r#"<transcript><text start="1">oops</transcript>"#);
        assert!(matches!(
            result,
            Err(TranscriptError::TimedTextParsing { .. })
        ));

        let result = parse_timed_text("");
        assert!(matches!(
            result,
            Err(TranscriptError::TimedTextParsing { .. })
        ));
    }

    #[test]
    fn test_render_srt_and_vtt() {
        let segments = vec![TranscriptSegment::new(61.5, 2.25, "Hello, world!")];

        let srt = SegmentRenderer::render(&segments, OutputFormat::Srt).unwrap();
        assert_eq!(srt, "1\n00:01:01,500 --> 00:01:03,750\nHello, world!\n\n");

        let vtt = SegmentRenderer::render(&segments, OutputFormat::Vtt).unwrap();
        assert!(vtt.starts_with("WEBVTT"));
        assert!(vtt.contains("00:01:01.500 --> 00:01:03.750"));
    }

    #[test]
    fn test_render_txt_and_json() {
        let segments = vec![
            TranscriptSegment::new(1.0, 2.0, "Hello"),
            TranscriptSegment::new(3.0, 1.0, "World"),
        ];

        let txt = SegmentRenderer::render(&segments, OutputFormat::Txt).unwrap();
        assert_eq!(txt, "Hello\nWorld");

        let json = SegmentRenderer::render(&segments, OutputFormat::Json).unwrap();
        let parsed: Vec<TranscriptSegment> = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, segments);
    }

    proptest! {
        #[test]
        fn prop_blank_filter_preserves_order(
            lines in proptest::collection::vec((0u32..100_000, 0u32..10_000, "[a-z \t]{0,8}"), 0..20)
        ) {
            let mut xml = String::from("<transcript>");
            for (start, dur, text) in &lines {
                xml.push_str(&format!(
                    r#"<text start="{}" dur="{}">{}</text>"#,
                    *start as f64 / 100.0,
                    *dur as f64 / 100.0,
                    text
                ));
            }
            xml.push_str("</transcript>");

            let segments = parse_timed_text(&xml).unwrap();
            let expected: Vec<&str> = lines
                .iter()
                .map(|(_, _, text)| text.as_str())
                .filter(|text| !text.trim().is_empty())
                .collect();
            let actual: Vec<&str> = segments.iter().map(|s| s.text.as_str()).collect();

            prop_assert_eq!(actual, expected);
            prop_assert!(segments.iter().all(|s| !s.is_blank()));
        }
    }
}
