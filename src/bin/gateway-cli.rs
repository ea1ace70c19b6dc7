use clap::{Parser, Subcommand};
use serde_json::Value;

#[derive(Parser)]
#[command(name = "gateway-cli")]
#[command(about = "Inspect a running plugin gateway", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:8080")]
    url: String,

    /// Prefix the router's own endpoints are mounted at.
    #[arg(short, long, default_value = "/router")]
    router_prefix: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List mounted gateways
    Prefixes,
    /// List routes in match order
    Routes,
    /// Query a status gateway
    Status {
        /// Prefix the status gateway is mounted at
        #[arg(short, long, default_value = "/status")]
        prefix: String,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();
    let base = cli.url.trim_end_matches('/');
    let router_prefix = cli.router_prefix.trim_end_matches('/');

    let url = match &cli.command {
        Commands::Prefixes => format!("{}{}", base, router_prefix),
        Commands::Routes => format!("{}{}/routes", base, router_prefix),
        Commands::Status { prefix } => format!("{}{}", base, prefix.trim_end_matches('/')),
    };

    let res = client.get(url).send().await?;
    print_response(res).await
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    if !status.is_success() {
        eprintln!("Error: gateway returned status {}", status);
        if let Ok(text) = res.text().await {
            eprintln!("Response: {}", text);
        }
        return Ok(());
    }

    let json: Value = res.json().await?;
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}
