//! HTTP batch sink for the ingestion endpoint.

use pulsegen_core::{
    config::IngestConfig,
    error::{GenError, GenResult},
    sink::{BatchSink, SinkRecord},
};
use reqwest::blocking::Client;
use std::time::Duration;

pub struct HttpSink {
    client: Client,
    config: IngestConfig,
    sent: usize,
}

impl HttpSink {
    pub fn new(config: IngestConfig) -> GenResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(|e| GenError::Config(format!("cannot build HTTP client: {e}")))?;
        Ok(Self {
            client,
            config,
            sent: 0,
        })
    }
}

impl BatchSink for HttpSink {
    fn max_batch_size(&self) -> usize {
        self.config.batch_size
    }

    fn submit(&mut self, batch: &[SinkRecord]) -> GenResult<()> {
        let transport = |message: String| GenError::Transport {
            batch: self.sent,
            message,
        };
        let response = self
            .client
            .post(&self.config.url)
            .basic_auth(&self.config.api_secret, Some(""))
            .json(batch)
            .send()
            .map_err(|e| transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(transport(format!("{status}: {body}")));
        }
        log::debug!("batch {} accepted ({} records)", self.sent, batch.len());
        self.sent += 1;
        Ok(())
    }
}
