use std::sync::mpsc::Sender;
use std::thread;
use std::time::Duration;

use reqwest::blocking::{Client, Request};
use reqwest::StatusCode;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::model::{parse_records, AircraftRecord};

/// The only failure text the panel ever shows.
pub const FETCH_FAILED_MESSAGE: &str = "Failed to fetch aircraft data";

#[derive(Debug, Error)]
pub enum FetchFailure {
    #[error("request failed: {0}")]
    Network(#[from] reqwest::Error),
    #[error("HTTP {0}")]
    Status(StatusCode),
    #[error("malformed body: {0}")]
    Decode(#[from] serde_json::Error),
}

impl FetchFailure {
    pub fn user_message(&self) -> &'static str {
        FETCH_FAILED_MESSAGE
    }
}

pub type FetchOutcome = Result<Vec<AircraftRecord>, FetchFailure>;

/// A resolved fetch, tagged with the ticket it was started under.
#[derive(Debug)]
pub struct FetchResult {
    pub ticket: u64,
    pub outcome: FetchOutcome,
}

/// Starts a fetch in the background for the given ticket.
pub trait FetchDispatch {
    fn dispatch(&self, ticket: u64);
}

pub struct Fetcher {
    client: Client,
    url: String,
    tx: Sender<FetchResult>,
}

impl Fetcher {
    pub fn new(
        url: String,
        timeout: Option<Duration>,
        insecure: bool,
        tx: Sender<FetchResult>,
    ) -> reqwest::Result<Self> {
        let client = Client::builder()
            .danger_accept_invalid_certs(insecure)
            .timeout(timeout)
            .build()?;
        Ok(Self { client, url, tx })
    }
}

impl FetchDispatch for Fetcher {
    fn dispatch(&self, ticket: u64) {
        spawn_fetch(self.client.clone(), self.url.clone(), ticket, self.tx.clone());
    }
}

pub fn spawn_fetch(client: Client, url: String, ticket: u64, tx: Sender<FetchResult>) {
    thread::spawn(move || {
        debug!("fetch #{ticket} GET {url}");
        let outcome = fetch_once(&client, &url);
        match &outcome {
            Ok(records) => info!("fetch #{ticket} returned {} records", records.len()),
            Err(err) => warn!("fetch #{ticket} failed: {err}"),
        }
        if tx.send(FetchResult { ticket, outcome }).is_err() {
            debug!("receiver dropped, discarding fetch #{ticket}");
        }
    });
}

/// Plain GET: no query string, body or extra headers.
fn aircraft_request(client: &Client, url: &str) -> reqwest::Result<Request> {
    client.get(url).build()
}

fn fetch_once(client: &Client, url: &str) -> FetchOutcome {
    let resp = client.execute(aircraft_request(client, url)?)?;

    let status = resp.status();
    if !status.is_success() {
        return Err(FetchFailure::Status(status));
    }

    let body = resp.text()?;
    Ok(parse_records(&body)?)
}
