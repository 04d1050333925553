use clap::{Parser, Subcommand};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde_json::{json, Value};

#[derive(Parser)]
#[command(name = "router-cli")]
#[command(about = "Management CLI for the backend router", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:8081")]
    url: String,

    #[arg(short, long, env = "ROUTER_ADMIN_KEY")]
    key: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check router status
    Status,
    /// List backend health and connection counts
    Backends,
    /// Show the backend a new connection would be routed to
    Best,
    /// Reload the config file
    Reload,
    /// Record a session established on a backend
    Connect { backend: String },
    /// Record a session closed on a backend
    Disconnect { backend: String },
    /// Record a session moving between backends
    Transfer { from: String, to: String },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut headers = HeaderMap::new();
    headers.insert(
        AUTHORIZATION,
        HeaderValue::from_str(&format!("Bearer {}", cli.key))?,
    );
    let client = reqwest::Client::builder().default_headers(headers).build()?;
    let url = |path: &str| format!("{}/admin/{}", cli.url, path);

    let res = match cli.command {
        Commands::Status => client.get(url("status")).send().await?,
        Commands::Backends => client.get(url("backends")).send().await?,
        Commands::Best => client.get(url("best")).send().await?,
        Commands::Reload => client.post(url("reload")).send().await?,
        Commands::Connect { backend } => {
            client
                .post(url("sessions/connect"))
                .json(&json!({ "backend": backend }))
                .send()
                .await?
        }
        Commands::Disconnect { backend } => {
            client
                .post(url("sessions/disconnect"))
                .json(&json!({ "backend": backend }))
                .send()
                .await?
        }
        Commands::Transfer { from, to } => {
            client
                .post(url("sessions/transfer"))
                .json(&json!({ "from": from, "to": to }))
                .send()
                .await?
        }
    };

    print_response(res).await
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    if !status.is_success() {
        eprintln!("Error: Admin API returned status {}", status);
        if let Ok(text) = res.text().await {
            eprintln!("Response: {}", text);
        }
        std::process::exit(1);
    }

    let json: Value = res.json().await?;
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}
