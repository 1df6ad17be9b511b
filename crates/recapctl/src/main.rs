use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use reqwest::Client;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "recapctl")]
#[command(version, about = "Recap command line tool", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Recap server URL (falls back to RECAP_SERVER_URL)
    #[arg(long)]
    server_url: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Submit a recording for transcription and summarization
    /// Examples:
    ///     recapctl submit meetings/standup.wav
    ///     recapctl submit s3://bucket/all-hands.mp3 --json
    #[command(verbatim_doc_comment)]
    Submit {
        /// Reference to the audio recording, as understood by the media store
        input_ref: String,

        /// Emit only the JSON response
        #[arg(short, long)]
        json: bool,
    },
    /// Fetch job status
    /// Examples:
    ///     recapctl status 6f9d1c1e-8a1b-4e0f-9c3a-2f7b1d4e5a6b
    ///     recapctl --server-url=http://localhost:8084 status <job_id> --json
    #[command(verbatim_doc_comment)]
    Status {
        /// Job ID
        job_id: String,

        /// Emit only the JSON response
        #[arg(short, long)]
        json: bool,
    },
    /// Watch a job until it completes or fails
    Watch {
        /// Job ID
        job_id: String,

        /// Seconds between status checks
        #[arg(short, long, default_value_t = 5)]
        interval: u64,
    },
    /// List recent jobs
    List {
        /// Maximum number of jobs to show
        #[arg(short, long, default_value_t = 20)]
        limit: i64,

        /// Emit only the JSON response
        #[arg(short, long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let base_url = cli
        .server_url
        .or_else(|| std::env::var("RECAP_SERVER_URL").ok())
        .unwrap_or_else(|| "http://localhost:8084".to_string())
        .trim_end_matches('/')
        .to_string();

    let client = Client::new();

    match cli.command {
        Commands::Submit { input_ref, json } => submit(&client, &base_url, &input_ref, json).await,
        Commands::Status { job_id, json } => status(&client, &base_url, &job_id, json).await,
        Commands::Watch { job_id, interval } => watch(&client, &base_url, &job_id, interval).await,
        Commands::List { limit, json } => list(&client, &base_url, limit, json).await,
    }
}

async fn submit(client: &Client, base_url: &str, input_ref: &str, json_only: bool) -> Result<()> {
    let url = format!("{}/jobs", base_url);
    let response = client
        .post(&url)
        .json(&serde_json::json!({ "input_ref": input_ref }))
        .send()
        .await
        .context("Failed to send submit request")?;

    if response.status().is_success() {
        let result: serde_json::Value = response.json().await?;
        if json_only {
            println!("{}", serde_json::to_string(&result)?);
        } else {
            let id = result.get("id").and_then(|v| v.as_str()).unwrap_or("unknown");
            println!("Job accepted: {}", id);
            if let Some(status_url) = result.get("status_url").and_then(|v| v.as_str()) {
                println!("Status URL:  {}{}", base_url, status_url);
            }
            println!("\nTrack it with: recapctl watch {}", id);
        }
    } else {
        let status = response.status();
        let text = response.text().await?;
        eprintln!("Failed to submit job: {} - {}", status, text);
        std::process::exit(1);
    }
    Ok(())
}

async fn status(client: &Client, base_url: &str, job_id: &str, json_only: bool) -> Result<()> {
    let result = fetch_status(client, base_url, job_id).await?;

    if json_only {
        println!("{}", serde_json::to_string(&result)?);
    } else {
        print_status(job_id, &result);
    }
    Ok(())
}

async fn watch(client: &Client, base_url: &str, job_id: &str, interval: u64) -> Result<()> {
    let mut last_stage = String::new();

    loop {
        let result = fetch_status(client, base_url, job_id).await?;
        let stage = result
            .get("stage")
            .and_then(|v| v.as_str())
            .unwrap_or("unknown")
            .to_string();

        if stage != last_stage {
            println!(
                "{}  {}{}\x1b[0m",
                chrono::Local::now().format("%H:%M:%S"),
                stage_color(&stage),
                stage
            );
            last_stage = stage.clone();
        }

        if stage == "completed" || stage == "failed" {
            print_status(job_id, &result);
            if stage == "failed" {
                std::process::exit(1);
            }
            return Ok(());
        }

        tokio::time::sleep(Duration::from_secs(interval)).await;
    }
}

async fn list(client: &Client, base_url: &str, limit: i64, json_only: bool) -> Result<()> {
    let url = format!("{}/jobs?limit={}", base_url, limit);
    let response = client
        .get(&url)
        .send()
        .await
        .context("Failed to send list request")?;

    if response.status().is_success() {
        let result: serde_json::Value = response.json().await?;
        if json_only {
            println!("{}", serde_json::to_string(&result)?);
        } else {
            let jobs = result
                .get("jobs")
                .and_then(|v| v.as_array())
                .cloned()
                .unwrap_or_default();
            let total = result.get("total").and_then(|v| v.as_i64()).unwrap_or(0);

            println!("Jobs ({} of {}):", jobs.len(), total);
            for job in &jobs {
                let id = job.get("id").and_then(|v| v.as_str()).unwrap_or("unknown");
                let stage = job.get("stage").and_then(|v| v.as_str()).unwrap_or("unknown");
                println!("  {}  {}{}\x1b[0m", id, stage_color(stage), stage);
            }
        }
    } else {
        let status = response.status();
        let text = response.text().await?;
        eprintln!("Failed to list jobs: {} - {}", status, text);
        std::process::exit(1);
    }
    Ok(())
}

async fn fetch_status(client: &Client, base_url: &str, job_id: &str) -> Result<serde_json::Value> {
    let url = format!("{}/jobs/{}", base_url, job_id);
    let response = client
        .get(&url)
        .send()
        .await
        .context("Failed to send status request")?;

    if !response.status().is_success() {
        let status = response.status();
        let text = response.text().await?;
        anyhow::bail!("Failed to fetch job status: {} - {}", status, text);
    }

    Ok(response.json().await?)
}

fn print_status(job_id: &str, result: &serde_json::Value) {
    let stage = result
        .get("stage")
        .and_then(|v| v.as_str())
        .unwrap_or("unknown");
    let color = stage_color(stage);

    println!("\n{}{}\x1b[0m", color, "=".repeat(60));
    println!("Job:    {}", job_id);
    println!("Stage:  {}{}\x1b[0m", color, stage);

    if let Some(summary) = result.get("summary") {
        if let Some(text) = summary.get("summary").and_then(|v| v.as_str()) {
            println!("\nSummary:\n  {}", text);
        }
        if let Some(items) = summary.get("action_items").and_then(|v| v.as_array()) {
            if !items.is_empty() {
                println!("Action items:");
                for item in items {
                    if let Some(text) = item.as_str() {
                        println!("  - {}", text);
                    }
                }
            }
        }
    }

    if let Some(error) = result.get("error") {
        let code = error.get("code").and_then(|v| v.as_str()).unwrap_or("unknown");
        let message = error.get("message").and_then(|v| v.as_str()).unwrap_or("");
        println!("\x1b[31mError:\x1b[0m  {} - {}", code, message);
    }
}

fn stage_color(stage: &str) -> &'static str {
    match stage {
        "completed" => "\x1b[32m", // green
        "failed" => "\x1b[31m",    // red
        _ => "\x1b[33m",           // yellow
    }
}
