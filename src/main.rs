use anyhow::{bail, Context, Result};
use bidwatch::{
    active_bids::load_active_bids,
    api::{HttpMarketplaceApi, SharedMarketplaceApi},
    config::Config,
    event::Event,
    event_log,
    profile::ProfileUpdate,
    service::{self, Board, SharedBoard},
    session::{FileTokenStore, Session},
};
use chrono::Utc;
use clap::{Parser, Subcommand};
use std::{path::PathBuf, sync::Arc};
use tokio::runtime::Runtime;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "bidwatch", about = "Track your marketplace bids")]
struct Cli {
    /// TOML config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Marketplace backend base url
    #[arg(long, env = "BIDWATCH_API_URL", global = true)]
    api_url: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Sign in with a Google id token
    Login {
        #[arg(long)]
        google_token: String,
    },
    Logout,
    /// Show the signed-in user
    Whoami,
    /// Print active bids once
    Bids,
    /// List public products
    Products,
    /// Confirm an email address with the code the backend sent
    VerifyEmail { email: String, code: String },
    /// Change one profile field
    Profile {
        #[arg(long, conflicts_with_all = ["email", "phone"])]
        name: Option<String>,
        #[arg(long, conflicts_with = "phone")]
        email: Option<String>,
        #[arg(long)]
        phone: Option<String>,
    },
    /// Keep the board live and serve it until interrupted
    Serve,
}

fn load_config(cli: &Cli) -> Result<Config> {
    let mut config = match &cli.config {
        Some(path) => Config::load_from_file(path)?,
        None => Config::default(),
    };
    if let Some(api_url) = &cli.api_url {
        config.api_url = api_url.clone();
    }
    Ok(config)
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = load_config(&cli)?;
    info!(api_url = %config.api_url, "starting");

    let runtime = Runtime::new().context("Failed to start async runtime")?;
    let api = HttpMarketplaceApi::new_shared(&config.api_url, config.request_timeout())?;
    let token_store = FileTokenStore::new_shared(&config.token_path);

    let mut session = Session::new(api.clone(), token_store);
    runtime.block_on(session.initialize());

    match cli.command {
        Command::Login { google_token } => {
            let user = runtime.block_on(session.login_with_google(&google_token))?;
            println!("Signed in as {} <{}>", user.name, user.email);
        }
        Command::Logout => {
            session.logout()?;
            println!("Signed out");
        }
        Command::Whoami => match session.user() {
            Some(user) => println!("{} <{}> ({})", user.name, user.email, user.id),
            None => bail!(
                "not signed in{}",
                session
                    .last_error()
                    .map(|e| format!(": {}", e))
                    .unwrap_or_default()
            ),
        },
        Command::Bids => print_bids(&runtime, &session)?,
        Command::Products => print_products(&runtime, &api)?,
        Command::VerifyEmail { email, code } => {
            let msg = runtime.block_on(api.verify_email(&email, &code))?;
            println!("{}", msg);
        }
        Command::Profile { name, email, phone } => {
            let update = match (name, email, phone) {
                (Some(name), _, _) => ProfileUpdate::name(&name)?,
                (_, Some(email), _) => ProfileUpdate::email(&email)?,
                (_, _, Some(phone)) => ProfileUpdate::phone(&phone)?,
                _ => bail!("one of --name, --email or --phone is required"),
            };
            let msg = runtime.block_on(session.update_profile(&update))?;
            println!("{}", msg);
        }
        Command::Serve => serve(runtime, session, &config)?,
    }

    Ok(())
}

fn print_bids(runtime: &Runtime, session: &Session) -> Result<()> {
    let credentials = session.credentials()?;
    let now = Utc::now();
    let bids = runtime.block_on(load_active_bids(&**session.api(), &credentials, now))?;

    let mut board = Board::default();
    board.apply(Event::BidsLoaded { bids, at: now });

    if board.bids().is_empty() {
        println!("You don't have any active bids");
    }
    for row in board.rows() {
        println!(
            "{:<30} bid {:>12.0}  high {:>12.0}  {:<10}  {:<18} {:?}",
            row.product_name,
            row.bid_amount,
            row.displayed_high,
            row.rank.as_deref().unwrap_or("-"),
            row.status,
            row.standing,
        );
    }
    Ok(())
}

fn print_products(runtime: &Runtime, api: &SharedMarketplaceApi) -> Result<()> {
    for product in runtime.block_on(api.products())? {
        println!(
            "{:<24} {:<30} {:>12.0}",
            product.id, product.name, product.price
        );
    }
    Ok(())
}

fn serve(runtime: Runtime, session: Session, config: &Config) -> Result<()> {
    let session = session.into_shared();
    let (event_writer, event_reader) = event_log::new_in_memory_shared();
    let board: SharedBoard = Arc::default();
    let trigger = service::RefreshTrigger::new();

    let svc_ctr = service::ServiceControl::new();

    ctrlc::set_handler({
        let svc_ctr = svc_ctr.clone();
        move || {
            eprintln!("Stopping all services...");
            svc_ctr.stop_all();
        }
    })?;

    for handle in vec![
        svc_ctr.spawn_log_follower(service::BoardView::new(board.clone()), event_reader.clone()),
        svc_ctr.spawn_loop(service::BidRefresher::new(
            runtime.handle().clone(),
            session.clone(),
            event_writer.clone(),
            trigger.clone(),
            svc_ctr.stop_signal(),
            config.refresh_interval(),
        )),
        svc_ctr.spawn_loop(service::ClockTicker::new(
            event_writer.clone(),
            config.tick_interval(),
        )),
        svc_ctr.spawn_loop(service::Ui::new(
            runtime.handle(),
            config.ui_listen,
            board.clone(),
            session.clone(),
            event_writer.clone(),
            trigger,
            svc_ctr.stop_signal(),
        )),
    ] {
        handle.join()?
    }

    Ok(())
}
