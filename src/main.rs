mod cli;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands};
use quaver_core::config::Config;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging. Respect RUST_LOG env var if set, otherwise use
    // defaults based on the verbose flag.
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            "quaver=debug,quaver_server=debug,quaver_db=debug,tower_http=debug".to_string()
        } else {
            "quaver=info,quaver_server=info,quaver_db=info,tower_http=info".to_string()
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(&env_filter)
        .init();

    match cli.command {
        Commands::Start { host, port } => {
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(start_server(host, port, cli.config.as_deref()))
        }
        Commands::Validate {
            config: config_path,
        } => {
            let path = config_path.or(cli.config);
            validate_config(path.as_deref())
        }
        Commands::CreateUser {
            username,
            password,
            role,
        } => create_user(&username, &password, &role, cli.config.as_deref()),
        Commands::GenerateApiKey => generate_api_key(),
        Commands::Version => {
            println!("quaver {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

async fn start_server(host: String, port: u16, config_path: Option<&std::path::Path>) -> Result<()> {
    let mut config = Config::load_or_default(config_path);

    // Override host/port from CLI if specified
    config.server.host = host;
    config.server.port = port;

    tracing::info!("Starting quaver server");
    tracing::info!(
        "Server will listen on {}:{}",
        config.server.host,
        config.server.port
    );

    quaver_server::start(config).await?;
    Ok(())
}

fn validate_config(config_path: Option<&std::path::Path>) -> Result<()> {
    let Some(path) = config_path else {
        println!("No config file specified; defaults are always valid.");
        return Ok(());
    };

    let contents = std::fs::read_to_string(path)?;
    let config = Config::from_json(&contents)?;

    let warnings = config.validate();
    if warnings.is_empty() {
        println!("Config OK: {}", path.display());
    } else {
        println!("Config parsed with {} warning(s):", warnings.len());
        for w in &warnings {
            println!("  - {w}");
        }
    }
    Ok(())
}

fn create_user(
    username: &str,
    password: &str,
    role: &str,
    config_path: Option<&std::path::Path>,
) -> Result<()> {
    let config = Config::load_or_default(config_path);

    if let Some(parent) = config.server.db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let pool = quaver_db::pool::init_pool(&config.server.db_path.to_string_lossy())?;
    let conn = quaver_db::pool::get_conn(&pool)?;

    let hash = bcrypt::hash(password, bcrypt::DEFAULT_COST)?;
    let user = quaver_db::queries::users::create_user(&conn, username, &hash, role)?;

    println!("Created user '{}' with id {}", user.username, user.id);
    Ok(())
}

fn generate_api_key() -> Result<()> {
    use rand::Rng;
    let mut rng = rand::thread_rng();
    let bytes: [u8; 32] = rng.gen();
    let key = hex::encode(bytes);

    println!("{key}");
    println!();
    println!("Add to your config file:");
    println!("  {{\"auth\": {{\"enabled\": true, \"api_key\": \"{key}\"}}}}");
    Ok(())
}
