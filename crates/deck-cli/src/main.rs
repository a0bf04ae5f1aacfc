//! `deck` entrypoint: reconciles a remote presentation against a Markdown
//! description, either once (`apply`) or continuously (`watch`).

use std::path::{Path, PathBuf};
use std::sync::Once;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{error, info};
use tracing_appender::non_blocking::WorkerGuard;

use deck_apply::{apply_plan, ChannelSink};
use deck_auth::{AmbientCredentials, CredentialProvider};
use deck_config::ConfigFile;
use deck_events::ProgressEvent;
use deck_markdown::FrontMatter;
use deck_remote::{RemoteAdapter, SlidesAdapter};

const DEFAULT_API_BASE_URL: &str = "https://slides.googleapis.com/v1";
const NEW_DECK_TEMPLATE: &str = "---\npresentationID: \ntitle: Untitled deck\nbreaks: true\n---\n\n# Untitled deck\n\nWrite your first slide here.\n";

#[derive(Parser, Debug)]
#[command(name = "deck", version, about = "Keep a remote slide deck in sync with a Markdown file")]
struct Args {
    /// Config profile suffix (selects config-<profile>.yml instead of config.yml).
    #[arg(long, global = true)]
    profile: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Reconcile the remote deck against the Markdown file once and exit.
    Apply { path: PathBuf },
    /// Watch the Markdown file and push incremental updates as it changes.
    Watch { path: PathBuf },
    /// Scaffold a new Markdown deck at `path`.
    New { path: PathBuf },
    /// Export the remote deck's rendered output (e.g. PDF) to `output`.
    Export { path: PathBuf, output: PathBuf },
}

fn main() -> Result<()> {
    let _log_guard = configure_logging()?;
    install_panic_hook();

    let args = Args::parse();
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("building async runtime")?;

    let result = runtime.block_on(run(args));
    if let Err(err) = &result {
        error!(target: "runtime", error = %err, "unrecovered error");
        write_error_dump(err);
    }
    result
}

async fn run(args: Args) -> Result<()> {
    match args.command {
        Command::Apply { path } => apply_once(&path, args.profile.as_deref()).await,
        Command::Watch { path } => watch(&path, args.profile.as_deref()).await,
        Command::New { path } => scaffold(&path),
        Command::Export { path, output } => export(&path, args.profile.as_deref(), &output).await,
    }
}

/// Resolves front matter + config into the one presentation id this
/// invocation targets, front-matter taking precedence per the configuration
/// discovery merge rule.
fn resolve_presentation_id(front_matter: &FrontMatter, config: &ConfigFile) -> Result<String> {
    front_matter
        .presentation_id
        .clone()
        .or_else(|| config.presentation_id.clone())
        .context("no presentationID set in front matter or config file")
}

async fn build_adapter(presentation_id: &str) -> Result<SlidesAdapter> {
    let base_url = std::env::var("DECK_API_BASE_URL").unwrap_or_else(|_| DEFAULT_API_BASE_URL.to_string());
    let mut adapter = SlidesAdapter::new(base_url, presentation_id);
    let credentials = AmbientCredentials::default();
    let token = credentials.token().await.context("acquiring credentials")?;
    adapter.set_token(token);
    Ok(adapter)
}

/// Projects `path` and builds the adapter it targets, merging front matter
/// over the discovered config file for the presentation id.
async fn project_and_connect(path: &Path, profile: Option<&str>) -> Result<(deck_markdown::MD, SlidesAdapter)> {
    let source = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let md = deck_markdown::project(&source).context("projecting markdown")?;
    let config = deck_config::load_discovered(profile).context("loading config")?;
    let presentation_id = resolve_presentation_id(&md.front_matter, &config)?;
    let adapter = build_adapter(&presentation_id).await?;
    Ok((md, adapter))
}

fn dot_renderer(mut rx: tokio::sync::mpsc::Receiver<ProgressEvent>) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            match event {
                ProgressEvent::Started { total } => {
                    info!(target: "deck_cli", total, "apply started");
                }
                ProgressEvent::ActionApplied { summary, .. } => {
                    let glyph = glyph_for(&summary);
                    print!("{glyph}");
                    let _ = std::io::Write::flush(&mut std::io::stdout());
                }
                ProgressEvent::Finished { applied } => {
                    println!();
                    info!(target: "deck_cli", applied, "apply finished");
                }
                ProgressEvent::Failed { summary, error, .. } => {
                    println!();
                    error!(target: "deck_cli", %summary, %error, "action failed");
                }
            }
        }
    })
}

fn glyph_for(summary: &str) -> char {
    if summary.starts_with("skipped") {
        '~'
    } else if summary.starts_with("appended") || summary.starts_with("inserted") {
        '+'
    } else if summary.starts_with("moved") {
        '>'
    } else if summary.starts_with("deleted") {
        '-'
    } else {
        '.'
    }
}

async fn apply_once(path: &Path, profile: Option<&str>) -> Result<()> {
    let (md, mut adapter) = project_and_connect(path, profile).await?;

    let before = adapter.list_slides().await.context("listing remote slides")?;
    let plan = deck_reconcile::reconcile(&before.slides, &md.slides);
    info!(target: "deck_cli", actions = plan.len(), "computed reconciliation plan");

    let (tx, rx) = tokio::sync::mpsc::channel(deck_events::EVENT_CHANNEL_CAP);
    let sink = ChannelSink::new(tx);
    let renderer = dot_renderer(rx);
    apply_plan(&mut adapter, &plan, &sink).await.context("applying plan")?;
    drop(sink);
    let _ = renderer.await;
    Ok(())
}

async fn watch(path: &Path, profile: Option<&str>) -> Result<()> {
    apply_once(path, profile).await?;

    let (_md, mut adapter) = project_and_connect(path, profile).await?;

    let (tx, rx) = tokio::sync::mpsc::channel(deck_events::EVENT_CHANNEL_CAP);
    let sink = ChannelSink::new(tx);
    let renderer = dot_renderer(rx);

    let shutdown = deck_watch::WatchShutdown::new();
    let ctrlc_shutdown = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!(target: "deck_cli", "ctrl-c received, shutting down watch loop");
            ctrlc_shutdown.signal();
        }
    });

    deck_watch::run(path.to_path_buf(), &mut adapter, &sink, shutdown)
        .await
        .context("watch loop")?;
    drop(sink);
    let _ = renderer.await;
    Ok(())
}

fn scaffold(path: &Path) -> Result<()> {
    if path.exists() {
        anyhow::bail!("{} already exists", path.display());
    }
    std::fs::write(path, NEW_DECK_TEMPLATE).with_context(|| format!("writing {}", path.display()))?;
    println!("created {}", path.display());
    Ok(())
}

async fn export(path: &Path, profile: Option<&str>, output: &Path) -> Result<()> {
    let (_md, mut adapter) = project_and_connect(path, profile).await?;

    let mut file = std::fs::File::create(output).with_context(|| format!("creating {}", output.display()))?;
    adapter.export(&mut file).await.context("exporting presentation")?;
    println!("exported to {}", output.display());
    Ok(())
}

fn configure_logging() -> Result<WorkerGuard> {
    let log_dir = deck_config::state_dir();
    std::fs::create_dir_all(&log_dir).ok();
    let file_appender = tracing_appender::rolling::never(&log_dir, "deck.log");
    let (nb_writer, guard) = tracing_appender::non_blocking(file_appender);
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(nb_writer)
        .try_init()
        .ok();
    Ok(guard)
}

fn install_panic_hook() {
    static HOOK: Once = Once::new();
    HOOK.call_once(|| {
        let default_panic = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            tracing::error!(target: "runtime.panic", %info, "panic");
            default_panic(info);
        }));
    });
}

/// Writes a redacted crash report: the error chain with any `/v1/…`-shaped
/// API path segments stripped of their ids, so a bug report never leaks a
/// live presentation or page identifier.
fn write_error_dump(err: &anyhow::Error) {
    let dir = deck_config::state_dir();
    if std::fs::create_dir_all(&dir).is_err() {
        return;
    }
    let chain: Vec<String> = err.chain().map(|cause| redact_ids(&cause.to_string())).collect();
    let report = serde_json::json!({
        "error": chain,
    });
    let path = dir.join("error.json");
    if let Ok(text) = serde_json::to_string_pretty(&report) {
        let _ = std::fs::write(&path, text);
    }
}

/// Replaces path segments that look like opaque remote ids (long
/// alphanumeric tokens following a `/`) with `<redacted>`.
fn redact_ids(message: &str) -> String {
    message
        .split('/')
        .map(|segment| {
            if segment.len() >= 20 && segment.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_') {
                "<redacted>"
            } else {
                segment
            }
        })
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_prefers_front_matter_over_config() {
        let front_matter = FrontMatter {
            presentation_id: Some("from-front-matter".to_string()),
            ..Default::default()
        };
        let config = ConfigFile {
            presentation_id: Some("from-config".to_string()),
            ..Default::default()
        };
        assert_eq!(resolve_presentation_id(&front_matter, &config).unwrap(), "from-front-matter");
    }

    #[test]
    fn resolve_falls_back_to_config() {
        let front_matter = FrontMatter::default();
        let config = ConfigFile {
            presentation_id: Some("from-config".to_string()),
            ..Default::default()
        };
        assert_eq!(resolve_presentation_id(&front_matter, &config).unwrap(), "from-config");
    }

    #[test]
    fn resolve_errors_when_neither_sets_it() {
        let front_matter = FrontMatter::default();
        let config = ConfigFile::default();
        assert!(resolve_presentation_id(&front_matter, &config).is_err());
    }

    #[test]
    fn redact_ids_strips_long_opaque_segments() {
        let redacted = redact_ids("remote returned 404 at /v1/presentations/1A2b3C4d5E6f7G8h9I0jK1L2M3N4O5P6/pages");
        assert_eq!(redacted, "remote returned 404 at /v1/presentations/<redacted>/pages");
        assert!(redact_ids("plain message without ids").contains("plain message"));
    }

    #[test]
    fn glyph_mapping_matches_action_kind() {
        assert_eq!(glyph_for("updated page 1"), '.');
        assert_eq!(glyph_for("appended page"), '+');
        assert_eq!(glyph_for("moved page 1 to 2"), '>');
        assert_eq!(glyph_for("deleted page 1"), '-');
        assert_eq!(glyph_for("skipped update because freeze:true"), '~');
    }
}
