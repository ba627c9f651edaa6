use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpServer};
use chrono::Utc;
use clap::{Parser, Subcommand};
use std::process::ExitCode;
use std::sync::Arc;

use projectforge::{
    auth::{AuthMiddleware, RegisterRequest},
    config::{AuthSettings, Config},
    routes::{self, health},
    seed,
    storage::{self, Repository},
};

#[derive(Parser)]
#[command(name = "projectforge")]
#[command(about = "Project and task management service", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP server (default)
    Serve,

    /// Create or migrate the database schema
    InitDb,

    /// Create an administrator account
    CreateAdmin {
        #[arg(long)]
        username: String,

        #[arg(long)]
        email: String,

        #[arg(long, env = "ADMIN_PASSWORD")]
        password: String,

        #[arg(long, default_value = "")]
        full_name: String,
    },

    /// Load the demo user with sample projects and tasks
    SeedData,
}

#[actix_web::main]
async fn main() -> ExitCode {
    dotenv::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            log::error!("invalid configuration: {}", e);
            return ExitCode::FAILURE;
        }
    };

    match run(cli.command.unwrap_or(Commands::Serve), config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(command: Commands, config: Config) -> Result<(), Box<dyn std::error::Error>> {
    let repo = storage::connect(&config.database_url).await?;
    repo.initialize().await?;

    match command {
        Commands::Serve => serve(repo, config).await?,
        Commands::InitDb => println!("Database initialized ({})", repo.storage_type()),
        Commands::CreateAdmin {
            username,
            email,
            password,
            full_name,
        } => {
            let request = RegisterRequest {
                username,
                email,
                password,
                full_name,
            };
            let admin = seed::create_admin(repo.as_ref(), &config.auth, request).await?;
            println!("Administrator {} created", admin.username);
        }
        Commands::SeedData => {
            let summary = seed::seed_demo_data(repo.as_ref(), &config.auth, Utc::now()).await?;
            println!(
                "Demo data created: {} projects, {} tasks",
                summary.projects, summary.tasks
            );
            println!("  User: {} / {}", seed::DEMO_USERNAME, seed::DEMO_PASSWORD);
        }
    }
    Ok(())
}

async fn serve(repo: Arc<dyn Repository>, config: Config) -> std::io::Result<()> {
    let repo_data: web::Data<dyn Repository> = web::Data::from(repo);
    let settings = Arc::new(config.auth.clone());
    let settings_data: web::Data<AuthSettings> = web::Data::from(Arc::clone(&settings));

    log::info!(
        "Starting ProjectForge server at {} ({} storage)",
        config.server_url(),
        repo_data.storage_type()
    );
    HttpServer::new(move || {
        App::new()
            .app_data(repo_data.clone())
            .app_data(settings_data.clone())
            .wrap(
                Cors::default()
                    .allow_any_origin()
                    .allow_any_method()
                    .allow_any_header()
                    .max_age(3600),
            )
            .wrap(Logger::default())
            .service(health::health)
            .service(
                web::scope("/api")
                    .wrap(AuthMiddleware::new(Arc::clone(&settings)))
                    .configure(routes::config),
            )
    })
    .bind((config.server_host.as_str(), config.server_port))?
    .run()
    .await
}
