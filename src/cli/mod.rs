use anyhow::Result;
use clap::{Parser, Subcommand};

pub mod chat;
pub mod load;
pub mod query;
pub mod serve;

#[derive(Subcommand)]
enum Command {
    /// Run the API server and web UI
    Serve {
        /// Set the server host address
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Set the server port
        #[arg(long, default_value = "3000")]
        port: String,
    },
    /// Chat with a running server from the terminal
    Chat {
        /// Chat endpoint of the server
        #[arg(long, default_value = "http://127.0.0.1:3000/api/chat")]
        url: String,
    },
    /// Embed professor reviews and load them into the vector index
    Load {
        /// JSON file of the form {"reviews": [...]}
        #[arg(long)]
        path: String,
    },
    /// Show the reviews retrieved for a query
    Query {
        #[arg(long)]
        term: String,
    },
}

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

pub async fn run() -> Result<()> {
    let args = Cli::parse();

    // Handle each sub command
    match args.command {
        Some(Command::Serve { host, port }) => {
            serve::run(host, port).await?;
        }
        Some(Command::Chat { url }) => {
            chat::run(&url).await?;
        }
        Some(Command::Load { path }) => {
            load::run(&path).await?;
        }
        Some(Command::Query { term }) => {
            query::run(&term).await?;
        }
        None => {}
    }

    Ok(())
}
