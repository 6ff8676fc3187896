//! threadcast-post - Post a thread from the command line

use std::io::{IsTerminal, Read};
use std::path::Path;

use clap::{Parser, ValueEnum};
use libthreadcast::config::PlatformKind;
use libthreadcast::logging::LoggingConfig;
use libthreadcast::service::events::{Event, EventReceiver};
use libthreadcast::service::posting::{MediaDescriptor, PostThreadRequest};
use libthreadcast::service::validation::{ValidationRequest, ValidationResponse, ValidationService};
use libthreadcast::service::ThreadcastService;
use libthreadcast::{Config, Result, ThreadcastError};
use serde::Serialize;
use tracing::debug;

/// Separator line between posts read from stdin
const POST_SEPARATOR: &str = "---";

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Parser, Debug)]
#[command(name = "threadcast-post")]
#[command(version, about = "Post a thread as a reply chain")]
#[command(long_about = r#"Post a thread as a reply chain.

Each argument is one post. With no arguments the thread is read from stdin,
posts separated by lines containing only '---'.

EXAMPLES:
    threadcast-post "First" "Second" "Third"
    threadcast-post --media 0:cat.png "Look at this"
    printf 'One\n---\nTwo\n' | threadcast-post --format json

EXIT CODES:
    0 - Every post was published
    1 - Posting failed (ids already published are printed to stderr)
    2 - Configuration error (missing credentials, bad config file)
    3 - Invalid input (empty post, bad media, draft fails --check)
"#)]
struct Cli {
    /// Post texts in thread order (reads stdin if none are given)
    posts: Vec<String>,

    /// Attach a local file to a post
    #[arg(short, long, value_name = "INDEX:PATH[:MIME]")]
    media: Vec<String>,

    /// Attach media fetched from a URL
    #[arg(long = "media-url", value_name = "INDEX:URL")]
    media_url: Vec<String>,

    /// Posting backend: mock or x (overrides posting.platform)
    #[arg(short, long, value_name = "PLATFORM")]
    platform: Option<PlatformKind>,

    /// Validate the draft and exit without posting
    #[arg(long)]
    check: bool,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    /// Print progress and debug logging to stderr
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let level = if cli.verbose { "debug" } else { "error" };
    LoggingConfig::from_env(level, cli.verbose).init();

    if let Err(e) = run(cli).await {
        eprintln!("Error: {}", e);
        if let ThreadcastError::Thread(thread_error) = &e {
            if !thread_error.posted.is_empty() {
                let ids: Vec<&str> = thread_error.posted.iter().map(|id| id.as_str()).collect();
                eprintln!("Already posted: {}", ids.join(", "));
            }
        }
        std::process::exit(e.exit_code());
    }
}

async fn run(cli: Cli) -> Result<()> {
    let posts = if cli.posts.is_empty() {
        read_stdin_posts()?
    } else {
        cli.posts
    };

    let mut media = Vec::with_capacity(cli.media.len() + cli.media_url.len());
    for arg in &cli.media {
        media.push(file_media(arg)?);
    }
    for arg in &cli.media_url {
        media.push(url_media(arg)?);
    }

    if cli.check {
        let request = ValidationRequest { posts, media };
        let response = ValidationService::default().validate(&request);
        print_validation(&response, cli.format)?;
        if !response.valid {
            return Err(ThreadcastError::InvalidInput(
                "Draft did not pass validation".to_string(),
            ));
        }
        return Ok(());
    }

    let mut config = Config::load()?;
    if let Some(platform) = cli.platform {
        config.posting.platform = platform;
    }

    let service = ThreadcastService::from_config(config)?;
    debug!("Posting {} post(s) to {}", posts.len(), service.platform_name());

    let progress = cli
        .verbose
        .then(|| tokio::spawn(print_progress(service.subscribe())));

    let response = service
        .posting()
        .post(PostThreadRequest { posts, media })
        .await;

    if let Some(progress) = progress {
        drop(service);
        let _ = progress.await;
    }

    let response = response?;
    match cli.format {
        OutputFormat::Text => {
            for id in &response.post_ids {
                println!("{}", id);
            }
        }
        OutputFormat::Json => println!("{}", to_json(&response)?),
    }

    Ok(())
}

fn to_json<T: Serialize>(value: &T) -> Result<String> {
    serde_json::to_string_pretty(value)
        .map_err(|e| ThreadcastError::InvalidInput(format!("Failed to serialize output: {}", e)))
}

fn read_stdin_posts() -> Result<Vec<String>> {
    let mut stdin = std::io::stdin();
    if stdin.is_terminal() {
        return Err(ThreadcastError::InvalidInput(
            "No posts provided. Pass them as arguments or pipe them on stdin".to_string(),
        ));
    }

    let mut input = String::new();
    stdin
        .read_to_string(&mut input)
        .map_err(|e| ThreadcastError::InvalidInput(format!("Failed to read stdin: {}", e)))?;

    Ok(split_posts(&input))
}

/// Split stdin text into posts on separator lines, dropping blank segments
fn split_posts(input: &str) -> Vec<String> {
    let mut posts = Vec::new();
    let mut current = Vec::new();

    for line in input.lines() {
        if line.trim() == POST_SEPARATOR {
            posts.push(current.join("\n"));
            current.clear();
        } else {
            current.push(line);
        }
    }
    posts.push(current.join("\n"));

    posts
        .into_iter()
        .map(|post| post.trim().to_string())
        .filter(|post| !post.is_empty())
        .collect()
}

fn parse_index<'a>(arg: &'a str, expected: &str) -> Result<(usize, &'a str)> {
    let invalid = || {
        ThreadcastError::InvalidInput(format!(
            "Invalid media '{}'. Expected {}",
            arg, expected
        ))
    };

    let (index, rest) = arg.split_once(':').ok_or_else(invalid)?;
    let index = index.trim().parse::<usize>().map_err(|_| invalid())?;
    if rest.is_empty() {
        return Err(invalid());
    }
    Ok((index, rest))
}

/// Parse `INDEX:PATH[:MIME]` and read the file
fn file_media(arg: &str) -> Result<MediaDescriptor> {
    let (index, rest) = parse_index(arg, "INDEX:PATH[:MIME]")?;

    let (path, mime) = match rest.rsplit_once(':') {
        Some((path, mime)) if mime.contains('/') => (path, mime.to_string()),
        _ => (rest, guess_mime(rest)?),
    };

    let path = shellexpand::tilde(path).to_string();
    let bytes = std::fs::read(&path).map_err(|e| {
        ThreadcastError::InvalidInput(format!("Failed to read {}: {}", path, e))
    })?;

    Ok(MediaDescriptor::file(&bytes, mime, index))
}

/// Parse `INDEX:URL`
fn url_media(arg: &str) -> Result<MediaDescriptor> {
    let (index, url) = parse_index(arg, "INDEX:URL")?;
    let path = url.split(['?', '#']).next().unwrap_or(url);
    Ok(MediaDescriptor::url(url, guess_mime(path)?, index))
}

fn guess_mime(path: &str) -> Result<String> {
    let extension = Path::new(path)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();

    let mime = match extension.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "mp4" => "video/mp4",
        "mov" => "video/quicktime",
        _ => {
            return Err(ThreadcastError::InvalidInput(format!(
                "Cannot tell the media type of '{}'. Add it explicitly as INDEX:PATH:MIME",
                path
            )))
        }
    };
    Ok(mime.to_string())
}

fn print_validation(response: &ValidationResponse, format: OutputFormat) -> Result<()> {
    if format == OutputFormat::Json {
        println!("{}", to_json(response)?);
        return Ok(());
    }

    for post in &response.posts {
        println!(
            "post {}: {}/{} characters, {} media",
            post.index, post.characters, response.character_limit, post.media
        );
        for error in &post.errors {
            println!("  error: {}", error);
        }
        for warning in &post.warnings {
            println!("  warning: {}", warning);
        }
    }
    for error in &response.errors {
        println!("error: {}", error);
    }
    println!("{}", if response.valid { "ok" } else { "invalid" });
    Ok(())
}

async fn print_progress(mut events: EventReceiver) {
    while let Ok(event) = events.recv().await {
        match event {
            Event::ThreadStarted { posts, media, .. } => {
                eprintln!("Posting {} post(s) with {} attachment(s)", posts, media)
            }
            Event::MediaUploaded { index, handle, .. } => {
                eprintln!("  uploaded {} for post {}", handle, index)
            }
            Event::PostSubmitted { index, post_id, .. } => {
                eprintln!("  posted {} as {}", index, post_id)
            }
            Event::ThreadCompleted { post_ids, .. } => {
                eprintln!("Done: {} post(s)", post_ids.len());
                break;
            }
            Event::ThreadFailed { step, index, .. } => {
                eprintln!("Stopped at {} of post {}", step, index);
                break;
            }
        }
    }
}
