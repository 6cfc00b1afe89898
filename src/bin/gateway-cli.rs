use std::time::{SystemTime, UNIX_EPOCH};

use clap::{Parser, Subcommand};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde_json::Value;

use request_gateway::security::signature::{sign, SIGNATURE_HEADER, TIMESTAMP_HEADER};

#[derive(Parser)]
#[command(name = "gateway-cli")]
#[command(about = "Management CLI for the request gateway", long_about = None)]
struct Cli {
    /// Admin API base URL
    #[arg(short, long, default_value = "http://localhost:8081")]
    url: String,

    #[arg(short, long, env = "GATEWAY_ADMIN_KEY", default_value = "")]
    key: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check gateway status and limiter size
    Status,
    /// Drop every rate limit window
    Flush,
    /// Print Slack signature headers for a body
    Sign {
        #[arg(long, env = "SLACK_SIGNING_SECRET")]
        secret: String,
        #[arg(long)]
        body: String,
        /// Epoch seconds; defaults to now
        #[arg(long)]
        timestamp: Option<u64>,
    },
    /// Send a signed slash command to a running gateway
    Send {
        #[arg(long, default_value = "http://localhost:8080")]
        gateway: String,
        #[arg(long, env = "SLACK_SIGNING_SECRET")]
        secret: String,
        /// Command text, e.g. "start SEV-2 API timeouts"
        text: String,
        #[arg(long, default_value = "cli")]
        user: String,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();

    let mut headers = HeaderMap::new();
    headers.insert(
        AUTHORIZATION,
        HeaderValue::from_str(&format!("Bearer {}", cli.key))?,
    );

    match cli.command {
        Commands::Status => {
            let res = client
                .get(format!("{}/admin/status", cli.url))
                .headers(headers)
                .send()
                .await?;
            print_response(res).await?;
        }
        Commands::Flush => {
            let res = client
                .post(format!("{}/admin/limiter/flush", cli.url))
                .headers(headers)
                .send()
                .await?;
            print_response(res).await?;
        }
        Commands::Sign {
            secret,
            body,
            timestamp,
        } => {
            let ts = timestamp.unwrap_or_else(now_secs).to_string();
            println!("{}: {}", TIMESTAMP_HEADER, ts);
            println!("{}: {}", SIGNATURE_HEADER, sign(&secret, &ts, body.as_bytes()));
        }
        Commands::Send {
            gateway,
            secret,
            text,
            user,
        } => {
            let body = serde_urlencoded::to_string([
                ("command", "/incident"),
                ("text", text.as_str()),
                ("user_id", user.as_str()),
                ("user_name", user.as_str()),
                ("channel_id", "CLI"),
            ])?;
            let ts = now_secs().to_string();
            let signature = sign(&secret, &ts, body.as_bytes());

            let res = client
                .post(format!("{}/api/slack/incident", gateway))
                .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
                .header(TIMESTAMP_HEADER, ts)
                .header(SIGNATURE_HEADER, signature)
                .body(body)
                .send()
                .await?;
            print_response(res).await?;
        }
    }

    Ok(())
}

fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
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
