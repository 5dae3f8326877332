use clap::{Parser, Subcommand};
use serde_json::Value;

#[derive(Parser)]
#[command(name = "digest-cli")]
#[command(about = "Client for the delayed digest service", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:8080")]
    url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Submit a password and print its key
    Hash { password: String },
    /// Fetch the base64 digest stored under a key
    Get { key: u64 },
    /// Show request count and average latency of POST /hash
    Stats,
    /// Ask the server to shut down gracefully
    Shutdown,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();
    let base = cli.url.trim_end_matches('/');

    match cli.command {
        Commands::Hash { password } => {
            let res = client
                .post(format!("{}/hash", base))
                .form(&[("password", password)])
                .send()
                .await?;
            print_response(res, false).await?;
        }
        Commands::Get { key } => {
            let res = client.get(format!("{}/hash/{}", base, key)).send().await?;
            print_response(res, false).await?;
        }
        Commands::Stats => {
            let res = client.get(format!("{}/stats", base)).send().await?;
            print_response(res, true).await?;
        }
        Commands::Shutdown => {
            let res = client.get(format!("{}/shutdown", base)).send().await?;
            print_response(res, false).await?;
        }
    }

    Ok(())
}

async fn print_response(res: reqwest::Response, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    let text = res.text().await?;
    if !status.is_success() {
        eprintln!("Error: server returned status {}", status);
        if !text.is_empty() {
            eprintln!("Response: {}", text);
        }
        std::process::exit(1);
    }

    if json {
        let value: Value = serde_json::from_str(&text)?;
        println!("{}", serde_json::to_string_pretty(&value)?);
    } else if text.is_empty() {
        println!("{}", status);
    } else {
        println!("{}", text);
    }
    Ok(())
}
