use clap::Parser;
use dotenvy::dotenv;
use movie_review_backend::infrastructure::{database, seed};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Create an admin account, or promote an existing one.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[arg(short, long)]
    username: String,

    #[arg(short, long)]
    email: String,

    /// Only used when the account does not exist yet
    #[arg(short, long)]
    password: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    let args = Args::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "create_admin=info,movie_review_backend=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    if args.password.len() < 6 {
        error!("❌ Password must be at least 6 characters.");
        std::process::exit(1);
    }

    info!("🔌 Connecting to database...");
    let db = database::setup_database().await?;
    seed::ensure_deleted_user(&db).await?;

    match seed::ensure_admin(&db, &args.username, &args.email, &args.password).await {
        Ok(admin) => {
            info!("✅ '{}' (id {}) is an administrator.", admin.username, admin.id);
        }
        Err(e) => {
            error!("❌ Failed to create admin: {}", e);
            std::process::exit(1);
        }
    }

    Ok(())
}
