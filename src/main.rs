use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::task::JoinSet;
use tracing::{info, warn};

use korfinder_client::api::model::{Listing, RegisterRequest, UserRole};
use korfinder_client::chat::ChatStore;
use korfinder_client::config;
use korfinder_client::matches::MatchesStore;
use korfinder_client::session::Session;
use korfinder_client::{ApiClient, FeedReconciler, FeedService, FriendlyError, LoadOutcome};

#[derive(Debug, Parser)]
#[command(author, version, about = "Korfinder tutor/student matching client")]
struct Args {
    /// Path to YAML config file
    #[arg(long, default_value = "config.yaml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Sign in and print the session token
    Login {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    /// Create an account and print the session token
    Register {
        #[arg(long)]
        first_name: String,
        #[arg(long)]
        last_name: String,
        #[arg(long)]
        email: String,
        #[arg(long, value_enum, default_value = "student")]
        role: RoleArg,
        #[arg(long)]
        password: String,
    },
    /// Show the signed-in profile
    Me,
    /// List available subjects
    Subjects,
    /// Print the current feed
    Feed {
        /// Ask the server to start the feed over
        #[arg(long)]
        again: bool,
    },
    /// Swipe through the feed interactively
    Deck {
        #[arg(long)]
        again: bool,
    },
    /// List matches
    Matches,
    /// Show (and optionally add to) the conversation of a match
    Chat {
        #[arg(long)]
        match_id: i64,
        #[arg(long)]
        send: Option<String>,
    },
    /// List your own listings
    Listings,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum RoleArg {
    Student,
    Tutor,
}

impl From<RoleArg> for UserRole {
    fn from(role: RoleArg) -> Self {
        match role {
            RoleArg::Student => UserRole::Student,
            RoleArg::Tutor => UserRole::Tutor,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .compact()
        .init();

    let args = Args::parse();
    let mut cfg = config::load(Some(&args.config))?;
    if let Ok(base) = std::env::var("KORFINDER_API_BASE") {
        cfg.api.base_url = base;
        config::validate(&cfg)?;
    }
    if let Ok(token) = std::env::var("KORFINDER_TOKEN") {
        cfg.api.token = Some(token);
    }
    let client = ApiClient::from_config(&cfg)?;

    match args.command {
        Command::Login { email, password } => {
            let mut session = Session::signed_out(client);
            session.login(&email, &password).await?;
            print_session(&session);
        }
        Command::Register {
            first_name,
            last_name,
            email,
            role,
            password,
        } => {
            let mut session = Session::signed_out(client);
            session
                .register(RegisterRequest {
                    first_name,
                    last_name,
                    email,
                    role: role.into(),
                    password,
                })
                .await?;
            print_session(&session);
        }
        Command::Me => {
            let me = authorized(client)?.me().await?;
            println!(
                "{} {} <{}> role={} onboarding_done={}",
                me.first_name,
                me.last_name,
                me.email,
                me.role.as_str(),
                me.onboarding_done
            );
        }
        Command::Subjects => {
            for subject in authorized(client)?.subjects().await? {
                println!("{:>4}  {}", subject.id, subject.name);
            }
        }
        Command::Feed { again } => {
            let feed = FeedReconciler::new(authorized(client)?);
            report(feed.load_or_cancel(again, ctrl_c()).await);
            for listing in feed.deck() {
                print_listing(&listing);
            }
        }
        Command::Deck { again } => run_deck(authorized(client)?, again).await?,
        Command::Matches => {
            let mut store = MatchesStore::new(authorized(client)?);
            store.reload().await;
            if let Some(err) = store.error() {
                bail!("{err}");
            }
            for m in store.matches() {
                println!(
                    "{:>4}  with user {}  since {}",
                    m.id,
                    m.target_user_id,
                    m.created_at.format("%Y-%m-%d %H:%M")
                );
            }
        }
        Command::Chat { match_id, send } => {
            let client = authorized(client)?;
            let chat = client
                .matches()
                .await?
                .into_iter()
                .find(|m| m.id == match_id)
                .with_context(|| format!("no match with id {match_id}"))?;
            let mut store = ChatStore::new(client, chat);
            store.reload().await;
            if let Some(text) = send {
                store.draft = text;
                store.send().await;
            }
            if let Some(err) = store.error() {
                bail!("{err}");
            }
            for msg in store.messages() {
                println!(
                    "[{}] {}: {}",
                    msg.created_at.format("%Y-%m-%d %H:%M"),
                    msg.sender_id,
                    msg.body
                );
            }
        }
        Command::Listings => {
            for listing in authorized(client)?.my_listings().await? {
                print_listing(&listing);
            }
        }
    }

    Ok(())
}

fn authorized(client: ApiClient) -> Result<ApiClient> {
    if !client.is_authorized() {
        bail!("not signed in: run `korfinder login` and put the token in api.token or KORFINDER_TOKEN");
    }
    Ok(client)
}

async fn ctrl_c() {
    cancel_on(tokio::signal::ctrl_c()).await
}

/// Completes when `signal` fires. A signal that cannot be installed never
/// completes, so it is not mistaken for a cancel.
async fn cancel_on<F>(signal: F)
where
    F: Future<Output = std::io::Result<()>>,
{
    if let Err(err) = signal.await {
        warn!(?err, "ctrl-c handler unavailable, loads cannot be cancelled");
        std::future::pending::<()>().await;
    }
}

fn print_session(session: &Session<ApiClient>) {
    if let Some(token) = session.client().token() {
        println!("token: {token}");
    }
    println!(
        "role: {}  onboarding needed: {}",
        session.role().as_str(),
        session.needs_onboarding()
    );
}

fn report(result: Result<LoadOutcome, FriendlyError>) {
    match result {
        Ok(LoadOutcome::Loaded { count }) => info!(count, "feed ready"),
        Ok(LoadOutcome::Skipped) => {}
        Ok(LoadOutcome::Cancelled) => println!("Loading cancelled."),
        Err(err) => println!("{err}"),
    }
}

fn print_listing(listing: &Listing) {
    let mut line = format!("#{} {}", listing.id, listing.title);
    if let Some(label) = listing.role.and_then(|r| r.display()) {
        line.push_str(&format!(" [{label}]"));
    }
    if let Some(subject) = &listing.subject {
        line.push_str(&format!(" · {subject}"));
    }
    if let Some(city) = &listing.city {
        line.push_str(&format!(" · {city}"));
    }
    if let Some(price) = listing.price_per_hour {
        line.push_str(&format!(" · {price:.0} zł/h"));
    }
    println!("{line}");
    if let Some(description) = listing.description.as_deref().filter(|d| !d.is_empty()) {
        println!("    {description}");
    }
}

async fn run_deck(client: ApiClient, again: bool) -> Result<()> {
    let feed = Arc::new(FeedReconciler::new(client));
    report(feed.load_or_cancel(again, ctrl_c()).await);

    let mut swipes = JoinSet::new();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let card = feed.deck().into_iter().next();
        match &card {
            Some(listing) => {
                print_listing(listing);
                println!("[y] like  [n] pass  [r] reload  [q] quit");
            }
            None => println!("No more candidates. [r] reload  [q] quit"),
        }

        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(err) => {
                finish_swipes(&mut swipes).await;
                return Err(err.into());
            }
        };
        match (line.trim(), &card) {
            ("y" | "n", Some(listing)) => {
                spawn_swipe(&mut swipes, &feed, listing, line.trim() == "y");
            }
            ("r", _) => report(feed.reload().await),
            ("q", _) => break,
            _ => println!("?"),
        }
    }
    finish_swipes(&mut swipes).await;
    Ok(())
}

/// Take the card off the deck now and confirm the swipe in the background.
fn spawn_swipe<S>(
    swipes: &mut JoinSet<()>,
    feed: &Arc<FeedReconciler<S>>,
    listing: &Listing,
    like: bool,
) where
    S: FeedService + 'static,
{
    feed.consume(listing.id);
    let feed = Arc::clone(feed);
    let target = listing.swipe_target();
    let title = listing.title.clone();
    swipes.spawn(async move {
        if feed.submit_swipe(target, like).await {
            println!("It's a match: {title}!");
        }
    });
}

/// Wait for swipes still in flight so none is dropped on exit.
async fn finish_swipes(swipes: &mut JoinSet<()>) {
    if !swipes.is_empty() {
        info!(pending = swipes.len(), "sending remaining swipes");
    }
    while let Some(res) = swipes.join_next().await {
        if let Err(err) = res {
            warn!(?err, "swipe task failed");
        }
    }
}
