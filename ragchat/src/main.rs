use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ragchat::api::{ApiServer, ApiServerConfig, JwtAuth};
use ragchat::{AppConfig, ChatServices};

#[derive(Parser)]
#[command(name = "ragchat")]
#[command(about = "Retrieval-augmented chat backend", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start API server
    Server {
        /// Host to bind to (overrides HOST)
        #[arg(long)]
        host: Option<String>,

        /// Port to bind to (overrides PORT)
        #[arg(short, long)]
        port: Option<u16>,

        /// JWT secret key (overrides JWT_SECRET)
        #[arg(long)]
        jwt_secret: Option<String>,
    },

    /// Chat from the terminal; interactive when no message is given
    Chat {
        /// Message to send
        message: Option<String>,

        /// Conversation owner
        #[arg(short, long, env = "RAGCHAT_USER", default_value = "cli")]
        user: String,
    },

    /// Issue a JWT for a user
    Token {
        username: String,

        /// Token lifetime in hours
        #[arg(long, default_value_t = 24)]
        hours: i64,
    },

    /// Show effective configuration with secrets masked
    CheckConfig,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "ragchat=info,ragchat_cache=info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let mut config = AppConfig::from_env().context("Invalid configuration")?;

    match cli.command {
        Commands::Server {
            host,
            port,
            jwt_secret,
        } => {
            if let Some(host) = host {
                config.server.host = host;
            }
            if let Some(port) = port {
                config.server.port = port;
            }
            if let Some(secret) = jwt_secret {
                config.server.jwt_secret = secret;
            }
            if config.server.jwt_secret == ragchat::config::DEFAULT_JWT_SECRET {
                println!("Warning: Using default JWT secret. Set JWT_SECRET env var or --jwt-secret for production.");
            }

            let services = ChatServices::from_config(&config)?;
            let server = ApiServer::new(
                ApiServerConfig::from(&config.server),
                services.orchestrator.clone(),
            );
            server.start().await?;
            services.shutdown().await;
        }

        Commands::Chat { message, user } => {
            let services = ChatServices::from_config(&config)?;

            match message {
                Some(message) => {
                    let reply = services.orchestrator.respond(&message, &user).await?;
                    println!("{}", reply);
                }
                None => interactive(&services, &user).await?,
            }

            services.shutdown().await;
        }

        Commands::Token { username, hours } => {
            let auth = JwtAuth::new(&config.server.jwt_secret);
            let token = auth.generate_token(&username, Some(hours))?;
            println!("{}", token);
        }

        Commands::CheckConfig => {
            println!("Configuration:");
            for (name, value) in config.summary() {
                println!("  {:<36} {}", name, value);
            }
        }
    }

    Ok(())
}

async fn interactive(services: &ChatServices, user: &str) -> Result<()> {
    println!("Chatting as '{}'. Commands: /status, /clear, /exit", user);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();

    loop {
        stdout.write_all(b"> ").await?;
        stdout.flush().await?;

        let Some(line) = lines.next_line().await? else {
            break;
        };

        match line.trim() {
            "" => continue,
            "/exit" | "/quit" => break,
            "/clear" => {
                services.orchestrator.clear_conversation(user);
                println!("Conversation cleared");
            }
            "/status" => {
                let caches = services.orchestrator.cache_stats();
                let conversations = services.orchestrator.conversation_stats();
                println!("{}", caches.embedding);
                println!("{}", caches.search_context);
                println!("{}", caches.response);
                println!(
                    "conversations: {} active, {} messages",
                    conversations.active_conversations, conversations.total_messages
                );
            }
            message => match services.orchestrator.respond(message, user).await {
                Ok(reply) => println!("{}\n", reply),
                Err(e) => println!("Error: {}\n", e),
            },
        }
    }

    Ok(())
}
