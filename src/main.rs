use std::env;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

use assetdesk::{db, routes, AppState, Config};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse command line arguments
    let args: Vec<String> = env::args().collect();
    if args.iter().any(|arg| arg == "-help" || arg == "--help") {
        println!("Usage: assetdesk [OPTIONS]");
        println!("Options:");
        println!("  -config <path>  Path to configuration file (default: ./etc/assetdesk.toml)");
        println!("  -seed           Create the default departments and accounts");
        println!("  -help, --help   Print this help message");
        return Ok(());
    }

    let config_path = args
        .iter()
        .skip_while(|arg| arg.as_str() != "-config")
        .nth(1)
        .map(|s| s.to_string())
        .unwrap_or_else(|| "./etc/assetdesk.toml".to_string());
    let seed = args.iter().any(|arg| arg == "-seed");

    // Load configuration first (before logging init)
    let config = Config::load(&config_path).unwrap_or_else(|e| {
        eprintln!("Could not load config file: {}, using defaults", e);
        let mut config = Config::default();
        config.apply_env();
        config
    });

    // Priority: RUST_LOG env var > config file > default "info"
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log.level));

    fmt::fmt()
        .with_env_filter(env_filter)
        .with_target(true)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .init();

    info!("Starting AssetDesk server...");
    info!("Loading configuration from: {}", config_path);

    if config.auth.jwt_secret == Config::default().auth.jwt_secret {
        tracing::warn!("Using the built-in session secret; set auth.jwt_secret for production");
    }

    let db = db::init_database(&config.database).await.map_err(|e| {
        tracing::error!("Database initialization failed: {}", e);
        anyhow::anyhow!("Database initialization failed: {}", e)
    })?;

    if seed {
        db::seed_defaults(&db).await?;
        info!("Default accounts seeded");
    }

    let addr: SocketAddr = match config.addr.parse() {
        Ok(addr) => addr,
        Err(_) => {
            tracing::warn!("Invalid address '{}', using default 0.0.0.0:8080", config.addr);
            SocketAddr::from(([0, 0, 0, 0], 8080))
        }
    };

    let state = AppState::new(db, config);
    let app = routes::create_router(state);

    info!("Server listening on {}", addr);

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
