//! Command-line front end for the claimstage reconciler.
//!
//! Useful for poking at a backend during development and for demonstrating
//! the staged-edit flow end to end without one: when no `--base-url` is
//! given, commands run against an in-memory gateway seeded with a demo
//! claim, exercising exactly the same session code the networked path uses.

use std::sync::Arc;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use claimstage_core::{
    resolve_media_url, Claim, ClaimField, ClaimFields, ClaimGateway, ClaimMedia, CommitError,
    EditEvents, EditSession, MemoryGateway, MemoryPreviewStore, SessionConfig,
};
use claimstage_http::{HttpConfig, HttpGateway};
use claimstage_types::{ClaimId, EditorId, MediaId};

/// Bucket used when no configuration is supplied (demo mode only).
const DEMO_BUCKET_URL: &str = "https://demo.invalid/claims-media";

#[derive(Parser)]
#[command(name = "claimstage")]
#[command(about = "Staged claim editing against a claims backend")]
struct Cli {
    /// Backend base URL; omit to run against the in-memory demo gateway.
    #[arg(long, global = true)]
    base_url: Option<String>,

    /// Public media bucket base URL, used to resolve photo links.
    #[arg(long, global = true, default_value = DEMO_BUCKET_URL)]
    media_bucket: String,

    /// Identifier recorded as the editing user on saves.
    #[arg(long, global = true, default_value = "1")]
    editor: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch a claim and print it with its photos
    Show {
        /// Claim identifier
        claim_id: String,
    },
    /// Edit a claim: set fields, mark photos for deletion, add files, save
    Edit {
        /// Claim identifier
        claim_id: String,
        /// Incident date (YYYY-MM-DD)
        #[arg(long)]
        date: Option<String>,
        /// Incident time (HH:MM or HH:MM:SS; anything else is omitted)
        #[arg(long)]
        time: Option<String>,
        /// Incident location
        #[arg(long)]
        location: Option<String>,
        /// Damage description
        #[arg(long)]
        description: Option<String>,
        /// Media id to mark for deletion (repeatable)
        #[arg(long = "delete")]
        delete_ids: Vec<String>,
        /// Path of a new photo to stage (repeatable)
        #[arg(long = "add")]
        add_paths: Vec<String>,
    },
    /// Run the full staged-edit walkthrough against the demo gateway
    Demo,
}

/// Observer that narrates session transitions on the log.
struct TraceEvents;

impl EditEvents for TraceEvents {
    fn pending_changed(&self) {
        tracing::debug!("pending edit changed");
    }
    fn commit_started(&self) {
        tracing::info!("commit started");
    }
    fn commit_succeeded(&self, claim: &Claim, media: &[ClaimMedia]) {
        tracing::info!(claim = %claim.id, photos = media.len(), "commit succeeded");
    }
    fn commit_failed(&self, error: &CommitError) {
        tracing::warn!(%error, "commit failed");
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let gateway = build_gateway(&cli)?;
    let editor = EditorId::new(&cli.editor).context("invalid --editor")?;

    match &cli.command {
        Commands::Show { claim_id } => {
            let id = ClaimId::new(claim_id).context("invalid claim id")?;
            let (claim, media) = gateway.fetch_claim(&id).await?;
            print_claim(&claim, &media, &cli.media_bucket);
        }
        Commands::Edit {
            claim_id,
            date,
            time,
            location,
            description,
            delete_ids,
            add_paths,
        } => {
            let id = ClaimId::new(claim_id).context("invalid claim id")?;
            let (claim, media) = gateway.fetch_claim(&id).await?;

            let session = EditSession::new(
                Arc::clone(&gateway),
                Arc::new(MemoryPreviewStore::new()),
                Arc::new(TraceEvents),
                SessionConfig::new(editor),
                claim,
                media,
            );
            session.begin_edit();

            if let Some(date) = date {
                session.set_field(ClaimField::DateOfIncident, date);
            }
            if let Some(time) = time {
                session.set_field(ClaimField::IncidentTime, time);
            }
            if let Some(location) = location {
                session.set_field(ClaimField::IncidentLocation, location);
            }
            if let Some(description) = description {
                session.set_field(ClaimField::Description, description);
            }

            for raw in delete_ids {
                let media_id = MediaId::new(raw).context("invalid --delete id")?;
                session.toggle_delete_mark(&media_id);
            }

            for path in add_paths {
                let bytes = std::fs::read(path)
                    .with_context(|| format!("failed to read {path}"))?;
                let content_type = content_type_for(path);
                let file_name = path.rsplit('/').next().unwrap_or(path);
                if session
                    .stage_new_file(bytes, content_type, file_name)
                    .is_none()
                {
                    bail!("could not stage {path}: no edit in progress");
                }
            }

            if !session.can_save() {
                bail!("required fields are empty; nothing was saved");
            }

            let (claim, media) = session.commit().await?;
            println!("Saved.");
            print_claim(&claim, &media, &cli.media_bucket);
        }
        Commands::Demo => run_demo(&cli).await?,
    }

    Ok(())
}

fn build_gateway(cli: &Cli) -> anyhow::Result<Arc<dyn ClaimGateway>> {
    match &cli.base_url {
        Some(base_url) => {
            let config = HttpConfig::new(base_url, &cli.media_bucket)?;
            Ok(Arc::new(HttpGateway::new(config)?))
        }
        None => {
            tracing::info!("no --base-url given; using the in-memory demo gateway");
            Ok(Arc::new(seeded_demo_gateway()))
        }
    }
}

fn seeded_demo_gateway() -> MemoryGateway {
    let gateway = MemoryGateway::new();
    let id = ClaimId::new("demo-1").expect("demo id is non-empty");
    gateway.insert_claim(
        Claim {
            id: id.clone(),
            policy_id: "POL-2024-0117".into(),
            customer_id: "42".into(),
            status: "Pending".into(),
            fields: ClaimFields {
                date_of_incident: "2024-03-01".into(),
                incident_time: "14:30:00".into(),
                incident_location: "M4 westbound, junction 18".into(),
                description: "Rear-ended at low speed".into(),
            },
            created_at: None,
        },
        vec![
            ClaimMedia {
                id: MediaId::new("demo-m1").expect("demo id is non-empty"),
                storage_path: "claims/demo-1/bumper.jpg".into(),
                description: "Bumper, driver side".into(),
                uploaded_at: None,
                is_deleted: false,
            },
            ClaimMedia {
                id: MediaId::new("demo-m2").expect("demo id is non-empty"),
                storage_path: "claims/demo-1/tail-light.jpg".into(),
                description: "Cracked tail light".into(),
                uploaded_at: None,
                is_deleted: false,
            },
        ],
    );
    gateway
}

async fn run_demo(cli: &Cli) -> anyhow::Result<()> {
    let gateway = Arc::new(seeded_demo_gateway());
    let id = ClaimId::new("demo-1").expect("demo id is non-empty");
    let (claim, media) = gateway.fetch_claim(&id).await?;

    println!("Before:");
    print_claim(&claim, &media, &cli.media_bucket);

    let session = EditSession::new(
        Arc::clone(&gateway) as Arc<dyn ClaimGateway>,
        Arc::new(MemoryPreviewStore::new()),
        Arc::new(TraceEvents),
        SessionConfig::new(EditorId::new(&cli.editor).context("invalid --editor")?),
        claim,
        media,
    );

    session.begin_edit();
    session.set_field(ClaimField::Description, "Rear-ended; garage estimate attached");
    session.toggle_delete_mark(&MediaId::new("demo-m2").expect("demo id is non-empty"));
    session.stage_new_file(
        vec![0xFF, 0xD8, 0xFF, 0xE0],
        "image/jpeg",
        "Garage estimate, page 1",
    );

    let (claim, media) = session.commit().await?;
    println!("\nAfter:");
    print_claim(&claim, &media, &cli.media_bucket);
    Ok(())
}

fn print_claim(claim: &Claim, media: &[ClaimMedia], bucket: &str) {
    println!("Claim {} [{}]", claim.id, claim.status);
    println!("  Policy:      {}", claim.policy_id);
    println!("  Customer:    {}", claim.customer_id);
    println!("  Date:        {}", claim.fields.date_of_incident);
    println!("  Time:        {}", claim.fields.incident_time);
    println!("  Location:    {}", claim.fields.incident_location);
    println!("  Description: {}", claim.fields.description);
    println!("  Photos ({}):", media.len());
    for row in media {
        println!(
            "    {}  {} ({})",
            row.id,
            row.description,
            resolve_media_url(bucket, &row.storage_path)
        );
    }
}

/// Best-effort content type from a file extension; the backend treats it as
/// advisory only.
fn content_type_for(path: &str) -> &'static str {
    match path.rsplit('.').next().map(str::to_ascii_lowercase).as_deref() {
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("pdf") => "application/pdf",
        _ => "application/octet-stream",
    }
}
