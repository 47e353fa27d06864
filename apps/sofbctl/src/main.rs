use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use shared::{
    domain::{WorkerKind, WorkerModes},
    error::ApiError,
    protocol::{
        PvReading, PvValue, ReleaseResponse, SurfaceSnapshot, WriteOutcome, WriteRequest,
        WriteResponse,
    },
};
use tracing::debug;

#[derive(Parser, Debug)]
#[command(about = "Read and write the orbit feedback control surface")]
struct Cli {
    #[arg(long, default_value = "http://127.0.0.1:5064")]
    server_url: String,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the current value of a PV.
    Read { name: String },
    /// Write a PV. Values are parsed as JSON, anything else is sent as text.
    Write { name: String, value: String },
    /// Print every PV and the worker modes.
    Snapshot,
    /// Print the worker modes.
    Workers,
    /// Mark a worker as finished.
    Release { worker: WorkerKind },
}

struct ControlClient {
    http: Client,
    base_url: String,
}

impl ControlClient {
    fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    async fn read(&self, name: &str) -> Result<PvReading> {
        let url = format!("{}/pvs/{name}", self.base_url);
        debug!(%url, "reading pv");
        decode(self.http.get(url).send().await?).await
    }

    async fn write(&self, name: &str, value: PvValue) -> Result<WriteResponse> {
        let url = format!("{}/pvs/{name}", self.base_url);
        debug!(%url, %value, "writing pv");
        decode(
            self.http
                .put(url)
                .json(&WriteRequest { value })
                .send()
                .await?,
        )
        .await
    }

    async fn snapshot(&self) -> Result<SurfaceSnapshot> {
        decode(self.http.get(format!("{}/pvs", self.base_url)).send().await?).await
    }

    async fn workers(&self) -> Result<WorkerModes> {
        decode(
            self.http
                .get(format!("{}/workers", self.base_url))
                .send()
                .await?,
        )
        .await
    }

    async fn release(&self, worker: WorkerKind) -> Result<ReleaseResponse> {
        let url = format!("{}/workers/{worker}/release", self.base_url);
        decode(self.http.post(url).send().await?).await
    }
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T> {
    let status = response.status();
    if status.is_success() {
        return response.json().await.context("invalid response body");
    }
    let body = response.text().await.unwrap_or_default();
    match serde_json::from_str::<ApiError>(&body) {
        Ok(err) => bail!("{status}: {:?}: {}", err.code, err.message),
        Err(_) => bail!("{status}: {body}"),
    }
}

fn parse_value(raw: &str) -> PvValue {
    serde_json::from_str(raw).unwrap_or_else(|_| PvValue::Text(raw.to_string()))
}

fn print_workers(workers: &WorkerModes) {
    for kind in WorkerKind::ALL {
        println!("{kind:<18} {}", workers.mode_of(kind));
    }
    println!("n_samples          {}/{}", workers.n_samples, workers.max_length);
    if workers.interrupt_pending {
        println!("interrupt pending");
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter("warn")
        .with_writer(std::io::stderr)
        .init();
    let cli = Cli::parse();
    let client = ControlClient::new(cli.server_url);

    match cli.command {
        Command::Read { name } => {
            let reading = client.read(&name).await?;
            println!("{} = {}", reading.name, reading.value);
        }
        Command::Write { name, value } => {
            let response = client.write(&name, parse_value(&value)).await?;
            match (response.outcome, response.error_code) {
                (WriteOutcome::Rejected, Some(code)) => {
                    bail!("{} rejected with code {}", response.name, code.code())
                }
                (outcome, _) => {
                    println!("{} {outcome:?}", response.name);
                    if response.interrupted {
                        println!("response matrix measurement interrupted");
                    }
                }
            }
        }
        Command::Snapshot => {
            let snapshot = client.snapshot().await?;
            for (name, value) in &snapshot.pvs {
                println!("{name:<32} {value}");
            }
            print_workers(&snapshot.workers);
        }
        Command::Workers => print_workers(&client.workers().await?),
        Command::Release { worker } => {
            let response = client.release(worker).await?;
            println!("released {}", response.worker);
            for promoted in &response.promoted {
                println!("started queued mode on {promoted}");
            }
            print_workers(&response.workers);
        }
    }

    Ok(())
}
