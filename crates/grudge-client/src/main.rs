//! `grudge` — offline-first CLI for the enemies list.
//!
//! Works entirely against the local mirror until you log in; `sync` then
//! pushes everything to the server and empties the mirror.

use std::path::PathBuf;

use anyhow::{Result, bail};
use clap::{Parser, Subcommand};
use tracing::warn;

use grudge_client::api::ApiClient;
use grudge_client::{session, sync_mirror};
use grudge_mirror::MirrorStore;
use grudge_mirror::storage::FileStorage;
use grudge_types::twitter::{clean_twitter_handle, extract_tweet_id};

#[derive(Parser, Debug)]
#[command(name = "grudge")]
#[command(about = "Keep track of people who have wronged you", long_about = None)]
struct Args {
    /// Server base URL
    #[arg(long, default_value = "http://localhost:3000")]
    server: String,

    /// Directory for the local mirror (defaults to $GRUDGE_DATA_DIR or .grudge)
    #[arg(long)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List enemies with their grievances, most recent first
    List,
    /// Add an enemy to the local mirror
    Add {
        name: String,
        #[arg(long)]
        nickname: Option<String>,
        /// Twitter/X handle, with or without the leading @
        #[arg(long)]
        twitter: Option<String>,
        #[arg(long)]
        tweet_url: Option<String>,
    },
    /// Record a grievance against an enemy
    Grieve {
        enemy_id: String,
        reason: String,
        #[arg(long)]
        tweet_url: Option<String>,
    },
    /// Move an enemy on the whiteboard canvas
    Move { enemy_id: String, x: f64, y: f64 },
    /// Delete an enemy and all its grievances
    Remove { enemy_id: String },
    /// Delete a single grievance
    RemoveGrievance { grievance_id: String },
    /// Wipe the entire local mirror
    Clear,
    /// Create an account on the server and store the session token
    Register { email: String, password: String },
    /// Log in to the server and store the session token
    Login { email: String, password: String },
    /// Forget the stored session token
    Logout,
    /// Push the local mirror to the server, then clear it
    Sync,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .init();

    let args = Args::parse();
    let data_dir = args
        .data_dir
        .or_else(|| std::env::var_os("GRUDGE_DATA_DIR").map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(".grudge"));

    let backend = FileStorage::create(&data_dir)?;
    let mut store = MirrorStore::open(Box::new(FileStorage::create(&data_dir)?));

    match args.command {
        Command::List => {
            let entries = store.list_enemies_with_grievances();
            if entries.is_empty() {
                println!("No enemies yet. How fortunate.");
                return Ok(());
            }
            for entry in entries {
                let nickname = entry
                    .enemy
                    .nickname
                    .as_deref()
                    .map(|n| format!(" \"{n}\""))
                    .unwrap_or_default();
                println!(
                    "{}{} [{}] — {} grievance(s)",
                    entry.enemy.name, nickname, entry.enemy.id, entry.grievance_count
                );
                for grievance in &entry.grievances {
                    println!("    - {} [{}]", grievance.reason, grievance.id);
                }
            }
        }
        Command::Add {
            name,
            nickname,
            twitter,
            tweet_url,
        } => {
            let name = name.trim();
            if name.is_empty() {
                bail!("name must not be empty");
            }
            check_tweet_url(tweet_url.as_deref());
            let handle = twitter.as_deref().map(clean_twitter_handle);
            let enemy = store.add_enemy(
                name,
                nickname.as_deref().map(str::trim).filter(|s| !s.is_empty()),
                handle.as_deref().filter(|s| !s.is_empty()),
                tweet_url.as_deref(),
            );
            println!("Added {} [{}]", enemy.name, enemy.id);
        }
        Command::Grieve {
            enemy_id,
            reason,
            tweet_url,
        } => {
            let reason = reason.trim();
            if reason.is_empty() {
                bail!("reason must not be empty");
            }
            check_tweet_url(tweet_url.as_deref());
            let grievance = store.add_grievance(&enemy_id, reason, tweet_url.as_deref());
            println!("Recorded grievance [{}]", grievance.id);
        }
        Command::Move { enemy_id, x, y } => {
            store.update_enemy_position(&enemy_id, x, y);
            // After a sync the record lives on the server, so move it there
            // too when a session exists. Best-effort, like every other
            // position update: a failure loses the coordinates, nothing else.
            if let Some(token) = session::load_token(&backend)? {
                let client = ApiClient::new(&args.server).with_token(token);
                if let Err(err) = client.update_position(&enemy_id, x, y).await {
                    warn!(enemy = %enemy_id, error = %err, "server position update failed");
                }
            }
            println!("Moved {enemy_id} to ({x}, {y})");
        }
        Command::Remove { enemy_id } => {
            store.delete_enemy(&enemy_id);
            println!("Removed {enemy_id} and its grievances");
        }
        Command::RemoveGrievance { grievance_id } => {
            store.delete_grievance(&grievance_id);
            println!("Removed grievance {grievance_id}");
        }
        Command::Clear => {
            store.clear_all();
            println!("Local mirror cleared");
        }
        Command::Register { email, password } => {
            let client = ApiClient::new(&args.server);
            let resp = client.register(&email, &password).await?;
            session::save_token(&backend, &resp.token)?;
            println!("Registered as {email} (user {})", resp.user_id);
            offer_sync(&store);
        }
        Command::Login { email, password } => {
            let client = ApiClient::new(&args.server);
            let resp = client.login(&email, &password).await?;
            session::save_token(&backend, &resp.token)?;
            println!("Logged in as {}", resp.email);
            offer_sync(&store);
        }
        Command::Logout => {
            session::clear_token(&backend)?;
            println!("Logged out");
        }
        Command::Sync => {
            let Some(token) = session::load_token(&backend)? else {
                bail!("not logged in; run `grudge login` first");
            };
            if !store.has_any_data() {
                println!("Nothing to sync.");
                return Ok(());
            }
            let client = ApiClient::new(&args.server).with_token(token);
            let resp = sync_mirror(&client, &mut store).await?;
            println!(
                "Synced {} enemies and {} grievances; local mirror cleared.",
                resp.synced_enemies, resp.synced_grievances
            );
        }
    }

    Ok(())
}

fn offer_sync(store: &MirrorStore) {
    if store.has_any_data() {
        println!("You have local data; run `grudge sync` to move it to the server.");
    }
}

/// Tweet URLs are free-form in the data model; just flag ones that won't
/// embed so a typo is caught at entry time.
fn check_tweet_url(url: Option<&str>) {
    if let Some(url) = url
        && extract_tweet_id(url).is_none()
    {
        warn!(url, "does not look like a tweet URL, storing as-is");
    }
}
