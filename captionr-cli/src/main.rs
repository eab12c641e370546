use anyhow::Context;
use clap::{Parser, ValueEnum};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use captionr::parser::VideoIdParser;
use captionr::processor::SegmentRenderer;
use captionr::{
    Captionr, ErrorKind, OutputFormat, TranscriptCatalog, TranscriptError, TranscriptList,
    TranscriptOptions,
};

#[derive(Parser)]
#[command(name = "captionr")]
#[command(version, about = "Fetch the transcript of a YouTube video")]
#[command(long_about = None)]
struct Cli {
    /// YouTube video URL or video ID
    #[arg(value_name = "VIDEO")]
    video: String,

    /// Language code to fetch; other than the original language means a translation
    #[arg(short, long)]
    language: Option<String>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "txt")]
    format: CliOutputFormat,

    /// Write to this file instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Overwrite an existing output file
    #[arg(long)]
    force: bool,

    /// List available transcript tracks instead of downloading
    #[arg(long)]
    list: bool,

    /// Request timeout in seconds
    #[arg(long, default_value = "30")]
    timeout: u64,

    /// Custom User-Agent string
    #[arg(long)]
    user_agent: Option<String>,

    /// Proxy URL (http://proxy:port)
    #[arg(long)]
    proxy: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum CliOutputFormat {
    Json,
    Txt,
    Srt,
    Vtt,
}

impl From<CliOutputFormat> for OutputFormat {
    fn from(cli_format: CliOutputFormat) -> Self {
        match cli_format {
            CliOutputFormat::Json => OutputFormat::Json,
            CliOutputFormat::Txt => OutputFormat::Txt,
            CliOutputFormat::Srt => OutputFormat::Srt,
            CliOutputFormat::Vtt => OutputFormat::Vtt,
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    if let Err(e) = run(&cli).await {
        match e.downcast_ref::<TranscriptError>() {
            Some(error) => handle_transcript_error(error),
            None => eprintln!("❌ Error: {:#}", e),
        }
        std::process::exit(1);
    }
}

async fn run(cli: &Cli) -> anyhow::Result<()> {
    let video_id = VideoIdParser::new().parse(&cli.video);
    info!("Starting captionr for video: {}", video_id);

    let mut captionr = Captionr::for_video(&video_id, build_options(cli))?;

    if cli.list {
        let list = captionr.transcript_list().await?;
        match cli.format {
            CliOutputFormat::Json => println!("{}", serde_json::to_string_pretty(&list)?),
            _ => print_transcript_list(&list),
        }
        return Ok(());
    }

    let segments = captionr.fetch_transcript(cli.language.as_deref()).await?;
    let format: OutputFormat = cli.format.into();
    let content = SegmentRenderer::render(&segments, format)?;

    match &cli.output {
        Some(path) => {
            write_output_file(path, &content, cli.force).await?;
            println!(
                "Saved {} segments as {} to: {}",
                segments.len(),
                format,
                path.display()
            );
        }
        None => println!("{}", content),
    }

    Ok(())
}

/// Initialize logging based on verbosity level
fn init_logging(verbose: bool) {
    let env_filter = if verbose {
        tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| "captionr_cli=debug,captionr=debug".into())
    } else {
        tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| "captionr_cli=info,captionr=info".into())
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_level(verbose),
        )
        .with(env_filter)
        .init();
}

fn build_options(cli: &Cli) -> TranscriptOptions {
    let mut options = TranscriptOptions::new().timeout(cli.timeout);

    if let Some(user_agent) = &cli.user_agent {
        options = options.user_agent(user_agent);
    }

    if let Some(proxy) = &cli.proxy {
        options = options.proxy(proxy);
    }

    options
}

fn print_transcript_list(list: &TranscriptList) {
    print_catalog("Manually created transcripts", &list.manually_created);
    print_catalog("Generated transcripts", &list.generated);

    if !list.translation_languages.is_empty() {
        let codes: Vec<&str> = list
            .translation_languages
            .iter()
            .map(|l| l.language_code.as_str())
            .collect();
        println!("\nTranslation languages: {}", codes.join(", "));
    }
}

fn print_catalog(title: &str, catalog: &TranscriptCatalog) {
    println!("\n{}:", title);
    if catalog.is_empty() {
        println!("  (none)");
        return;
    }

    println!("{:<8} {:<30} {:<12}", "Code", "Name", "Translatable");
    println!("{}", "─".repeat(52));
    for descriptor in catalog.iter() {
        println!(
            "{:<8} {:<30} {:<12}",
            descriptor.language_code,
            truncate(&descriptor.language, 30),
            if descriptor.is_translatable() {
                "Yes"
            } else {
                "No"
            }
        );
    }
}

async fn write_output_file(path: &Path, content: &str, force: bool) -> anyhow::Result<()> {
    if path.exists() && !force {
        anyhow::bail!(
            "File already exists: {}. Use --force to overwrite.",
            path.display()
        );
    }

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent)
                .await
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
    }

    fs::write(path, content)
        .await
        .with_context(|| format!("Failed to write {}", path.display()))?;

    debug!("Written {} bytes to {}", content.len(), path.display());
    Ok(())
}

/// Print the error kind with a hint on what to do next
fn handle_transcript_error(error: &TranscriptError) {
    eprintln!("❌ {}: {}", error.kind(), error);

    let hint = match error.kind() {
        ErrorKind::Fetch => "Check your internet connection and try again.",
        ErrorKind::Consent => "The consent page could not be passed; try again from another region.",
        ErrorKind::InvalidIdentifier => "Pass a video ID or a YouTube watch URL.",
        ErrorKind::RateLimited => "YouTube is asking for a CAPTCHA; wait a while before retrying.",
        ErrorKind::VideoUnavailable => "The video may be private, deleted or the ID is wrong.",
        ErrorKind::TranscriptsDisabled => "The uploader has disabled transcripts for this video.",
        ErrorKind::NoTranscript => "No transcript tracks are available for this video.",
        ErrorKind::NotTranslatable => "Omit --language to get the original transcript.",
        ErrorKind::LanguageUnavailable => "Use --list to see available translation languages.",
        _ => return,
    };
    eprintln!("   {}", hint);
}

/// Truncate string to specified length with ellipsis
fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_output_format_conversion() {
        assert_eq!(OutputFormat::from(CliOutputFormat::Json), OutputFormat::Json);
        assert_eq!(OutputFormat::from(CliOutputFormat::Txt), OutputFormat::Txt);
        assert_eq!(OutputFormat::from(CliOutputFormat::Srt), OutputFormat::Srt);
        assert_eq!(OutputFormat::from(CliOutputFormat::Vtt), OutputFormat::Vtt);
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("hello", 10), "hello");
        assert_eq!(truncate("hello world", 8), "hello...");
        assert_eq!(truncate("Deutsch (automatisch erzeugt)", 10), "Deutsch...");
    }

    #[test]
    fn test_build_options() {
        let cli = Cli::parse_from([
            "captionr",
            "abc123",
            "--timeout",
            "5",
            "--user-agent",
            "test-agent",
        ]);
        let options = build_options(&cli);
        assert_eq!(options.timeout_seconds, 5);
        assert_eq!(options.user_agent.as_deref(), Some("test-agent"));
        assert!(options.proxy.is_none());
    }

    #[tokio::test]
    async fn test_write_output_file_creates_dirs() {
        use tempfile::tempdir;

        let temp_dir = tempdir().unwrap();
        let file_path = temp_dir.path().join("subdir").join("test.txt");

        write_output_file(&file_path, "Hello", false).await.unwrap();
        assert_eq!(std::fs::read_to_string(&file_path).unwrap(), "Hello");

        let result = write_output_file(&file_path, "Again", false).await;
        assert!(result.is_err());

        write_output_file(&file_path, "Again", true).await.unwrap();
        assert_eq!(std::fs::read_to_string(&file_path).unwrap(), "Again");
    }
}
