use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use chrono::{Duration, Utc};
use clap::{Parser, Subcommand};
use sqlx::PgPool;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use uuid::Uuid;

mod api;
mod auth;
mod config;
mod db;
mod error;
mod handlers;
mod memory;
mod models;
mod planner;
mod progress;
mod report;
mod stats;
mod store;
mod suggestions;

use api::AppState;
use config::Config;
use planner::SortBy;

const REPORT_WIN_DAYS: i64 = 30;

#[derive(Parser)]
#[command(name = "studyhaven")]
#[command(about = "Check-ins, assignment planning and gentle nudges for students", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create or upgrade the database schema
    InitDb,
    /// Load a demo student with realistic data
    Seed,
    /// Run the HTTP API
    Serve {
        /// Overrides STUDYHAVEN_ADDR
        #[arg(long)]
        addr: Option<SocketAddr>,
        /// Keep everything in memory instead of Postgres
        #[arg(long)]
        in_memory: bool,
    },
    /// Print progress stats for one student
    Stats {
        #[arg(long)]
        user: Uuid,
    },
    /// Print the assignment board for one student
    Assignments {
        #[arg(long)]
        user: Uuid,
        #[arg(long, value_enum, default_value_t = SortBy::DueDate)]
        sort: SortBy,
    },
    /// Generate a markdown progress report
    Report {
        #[arg(long)]
        user: Uuid,
        #[arg(long, default_value = "report.md")]
        out: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "studyhaven=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let config = Config::from_env()?;

    match cli.command {
        Commands::InitDb => {
            let pool = db::connect(&config).await?;
            db::init_db(&pool).await?;
            println!("Schema ready.");
        }
        Commands::Seed => {
            let pool = db::connect(&config).await?;
            db::seed(&pool).await?;
            println!("Seed data inserted for demo user {}.", db::DEMO_USER_ID);
        }
        Commands::Serve { addr, in_memory } => {
            let addr = addr.unwrap_or(config.bind_addr);
            let state = if in_memory {
                tracing::info!("using in-memory store");
                AppState::new(Arc::new(memory::MemoryStore::new()))
            } else {
                pg_state(db::connect(&config).await?)
            };
            api::serve(addr, state).await?;
        }
        Commands::Stats { user } => {
            let state = pg_state(db::connect(&config).await?);
            let stats = handlers::load_stats(&state, user).await;

            println!("This month:");
            println!("- {} check-ins", stats.checkins);
            println!("- {} assignments completed", stats.completed);
            println!("- {} little wins", stats.wins);
            println!("Streak: {} day(s)", stats.streak);
            println!(
                "30-day averages: mood {:.1}, energy {:.1}, focus {:.1}",
                stats.averages.mood, stats.averages.energy, stats.averages.focus
            );
            println!("{}", stats.growth_message);
        }
        Commands::Assignments { user, sort } => {
            let state = pg_state(db::connect(&config).await?);
            let board = handlers::load_board(&state, user, sort).await?;

            if board.active.is_empty() && board.completed.is_empty() && board.dropped.is_empty() {
                println!("No assignments found for this student.");
                return Ok(());
            }

            for (heading, cards) in [
                ("Active", &board.active),
                ("Completed", &board.completed),
                ("Dropped", &board.dropped),
            ] {
                if cards.is_empty() {
                    continue;
                }
                println!("{heading}:");
                for card in cards {
                    println!(
                        "- {}: {} due {} impact {}/5, {}% done",
                        card.assignment.course,
                        card.assignment.title,
                        card.assignment.due_at.format("%Y-%m-%d %H:%M"),
                        card.assignment.impact,
                        card.progress.percentage
                    );
                }
            }
        }
        Commands::Report { user, out } => {
            let state = pg_state(db::connect(&config).await?);
            let now = Utc::now();

            let (stats, board, profile, wins) = tokio::join!(
                handlers::load_stats(&state, user),
                handlers::load_board(&state, user, SortBy::DueDate),
                state.store.get_profile(user),
                state
                    .store
                    .recent_wins(user, now - Duration::days(REPORT_WIN_DAYS)),
            );
            let board = board?;
            let wins = wins?;
            let student = profile?
                .and_then(|p| p.display_name.or(p.full_name))
                .unwrap_or_else(|| user.to_string());

            let report = report::build_report(&student, now, &stats, &board, &wins);
            std::fs::write(&out, report)
                .with_context(|| format!("failed to write {}", out.display()))?;
            println!("Report written to {}.", out.display());
        }
    }

    Ok(())
}

fn pg_state(pool: PgPool) -> AppState {
    AppState::new(Arc::new(db::PgStore::new(pool)))
}
