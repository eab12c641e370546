use captionr::{Captionr, TranscriptOptions};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    // A video that is known to have English captions
    let video_id = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "sSpULGNHyoI".to_string());

    let mut captionr = Captionr::for_video(&video_id, TranscriptOptions::new().timeout(30))?;

    println!("Available transcripts for {}:", video_id);
    let catalog = captionr.ensure_catalog().await?;
    for descriptor in catalog.iter() {
        println!("  - {}", descriptor);
    }
    println!();

    let segments = captionr.fetch_transcript(None).await?;
    println!("Original transcript has {} segments", segments.len());
    for segment in segments.iter().take(5) {
        println!("[{:>8.2}s +{:.2}s] {}", segment.start, segment.duration, segment.text);
    }

    match captionr.fetch_transcript(Some("de")).await {
        Ok(translated) => println!("\nGerman translation has {} segments", translated.len()),
        Err(e) => println!("\nNo German translation ({}): {}", e.kind(), e),
    }

    Ok(())
}
