use clap::{Parser, Subcommand};
use futures_util::StreamExt;
use lumeris_core::{
    backend::{LearningBackend, NullBackend},
    backends::rest::RestBackend,
    config::Config,
    http_client::HttpClient,
    identity::UserIdentity,
    model::{ChatQuery, Role},
    reconcile::TurnBuffer,
    session::{ChatLog, QuizSession},
};

#[derive(Parser)]
#[command(author, version, about = "lumeris CLI smoke tool", long_about = None)]
struct Cli {
    /// Config file (JSON or TOML). Without it, LUMERIS_* env vars are used,
    /// falling back to the canned null backend.
    #[arg(long)]
    config: Option<std::path::PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Ask a question about a resource (prints the reply as it streams)
    Chat {
        #[arg(long)]
        resource: String,
        #[arg(short, long, help = "Question from the user")]
        message: String,
    },
    /// Print the stored chat transcript for a resource
    History {
        #[arg(long)]
        resource: String,
    },
    /// Delete the stored chat transcript for a resource
    ClearHistory {
        #[arg(long)]
        resource: String,
    },
    /// Generate a quiz and print it with resolved answers
    Quiz {
        #[arg(long)]
        resource: String,
    },
    /// Generate flashcards for a resource
    Flashcards {
        #[arg(long)]
        resource: String,
    },
    /// List processed resources
    Resources,
}

fn build_backend(config: Option<&std::path::Path>) -> anyhow::Result<Box<dyn LearningBackend>> {
    if let Some(path) = config {
        let cfg = Config::from_path(path)?;
        return Ok(Box::new(RestBackend::from_config(&cfg)?));
    }
    if let Ok(user_id) = std::env::var("LUMERIS_USER_ID") {
        let base = std::env::var("LUMERIS_BASE_URL")
            .unwrap_or_else(|_| "http://localhost:8000".to_string());
        let email = std::env::var("LUMERIS_USER_EMAIL").ok();
        let http = HttpClient::new_default()?;
        return Ok(Box::new(RestBackend::new(
            http,
            UserIdentity::new(user_id, email),
            base,
        )));
    }
    Ok(Box::new(NullBackend))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let backend = build_backend(cli.config.as_deref())?;

    match cli.command {
        Commands::Chat { resource, message } => {
            let mut stream = backend
                .chat_stream(ChatQuery {
                    query: message,
                    resource_id: resource,
                })
                .await?;

            use std::io::{self, Write};
            let mut turn = TurnBuffer::new();
            while let Some(fragment) = stream.next().await {
                let fragment = fragment?;
                let delta = turn.push(&fragment);
                if !delta.is_empty() {
                    print!("{delta}");
                    io::stdout().flush().ok();
                }
            }
            if !turn.is_empty() {
                println!();
            }
        }
        Commands::History { resource } => {
            let log = ChatLog::from_history(backend.chat_history(&resource).await?);
            for msg in log.messages() {
                let who = match msg.role {
                    Role::User => "you",
                    Role::Assistant => "tutor",
                    Role::System => "system",
                };
                println!("{}: {}", who, msg.content);
            }
        }
        Commands::ClearHistory { resource } => {
            backend.clear_chat_history(&resource).await?;
            println!("history cleared");
        }
        Commands::Quiz { resource } => {
            let mut session = QuizSession::new(backend.generate_quiz(&resource).await?);
            let total = session.len();
            loop {
                let Some(q) = session.current() else { break };
                println!("{}/{}: {}", session.current_index() + 1, total, q.question);
                for (i, opt) in q.options.iter().enumerate() {
                    println!("   {}) {}", char::from(b'A' + i as u8), opt);
                }
                if let Some(correct) = session.correct_option() {
                    println!("   answer: {correct}");
                }
                session.advance();
            }
        }
        Commands::Flashcards { resource } => {
            for card in backend.generate_flashcards(&resource).await? {
                println!("Q: {}", card.question);
                println!("A: {}", card.answer);
                println!();
            }
        }
        Commands::Resources => {
            for res in backend.list_resources().await? {
                println!("{} [{}] {}", res.id, res.kind, res.title);
            }
        }
    }

    Ok(())
}
