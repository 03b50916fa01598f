use crate::config::DataConfig;
use crate::types::Record;
use anyhow::{anyhow, bail, Context, Result};
use serde_json::Value;
use std::path::PathBuf;
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, PartialEq)]
pub enum DataSource {
    Http(String),
    File(PathBuf),
}

impl DataSource {
    pub fn parse(source: &str) -> Self {
        if source.starts_with("http://") || source.starts_with("https://") {
            DataSource::Http(source.to_string())
        } else {
            DataSource::File(PathBuf::from(source))
        }
    }
}

/// Why a raw dataset entry was dropped at ingestion.
#[derive(Debug, Error, PartialEq)]
pub enum RecordError {
    #[error("entry is not an object")]
    NotAnObject,
    #[error("missing or non-numeric field `{0}`")]
    MissingField(&'static str),
    #[error("field `{field}` out of range: {value}")]
    OutOfRange { field: &'static str, value: f64 },
    #[error("field `{0}` must be a non-negative integer")]
    NotACount(&'static str),
}

/// Fetches the record set, falling back to an empty set on any failure.
pub async fn load_records_or_empty(config: DataConfig) -> Vec<Record> {
    match load_records(&config).await {
        Ok(records) => records,
        Err(e) => {
            warn!(source = %config.source, error = %format!("{:#}", e), "failed to load data, continuing with no records");
            Vec::new()
        }
    }
}

pub async fn load_records(config: &DataConfig) -> Result<Vec<Record>> {
    info!(source = %config.source, "loading data");

    let body = match DataSource::parse(&config.source) {
        DataSource::Http(url) => fetch_http(&url, config).await?,
        DataSource::File(path) => tokio::fs::read_to_string(&path)
            .await
            .with_context(|| format!("Failed to read data file: {:?}", path))?,
    };

    let records = parse_records(&body)?;
    info!(count = records.len(), "loaded records");
    Ok(records)
}

async fn fetch_http(url: &str, config: &DataConfig) -> Result<String> {
    let client = reqwest::Client::builder()
        .timeout(config.timeout())
        .build()
        .context("Failed to create HTTP client")?;

    let mut attempt = 0;
    loop {
        match fetch_once(&client, url).await {
            Ok(body) => return Ok(body),
            Err(e) if attempt < config.retries => {
                attempt += 1;
                warn!(url, attempt, error = %format!("{:#}", e), "data fetch failed, retrying");
            }
            Err(e) => return Err(e),
        }
    }
}

async fn fetch_once(client: &reqwest::Client, url: &str) -> Result<String> {
    let response = client
        .get(url)
        .send()
        .await
        .with_context(|| format!("Failed to send data request to {}", url))?;

    if !response.status().is_success() {
        bail!("Data provider returned {}", response.status());
    }

    response
        .text()
        .await
        .context("Failed to read data response body")
}

/// Parses the provider body and keeps only well-formed records.
pub fn parse_records(body: &str) -> Result<Vec<Record>> {
    let value: Value = serde_json::from_str(body).context("Failed to parse data as JSON")?;
    let entries = match value {
        Value::Array(entries) => entries,
        _ => return Err(anyhow!("Data must be a JSON array of records")),
    };
    Ok(ingest(&entries))
}

pub fn ingest(entries: &[Value]) -> Vec<Record> {
    let mut records = Vec::with_capacity(entries.len());
    let mut dropped = 0usize;

    for (i, entry) in entries.iter().enumerate() {
        match record_from_value(entry) {
            Ok(record) => records.push(record),
            Err(e) => {
                debug!(entry = i, reason = %e, "dropping malformed record");
                dropped += 1;
            }
        }
    }

    if dropped > 0 {
        info!(dropped, kept = records.len(), "filtered malformed records");
    }

    records
}

pub fn record_from_value(value: &Value) -> Result<Record, RecordError> {
    let object = value.as_object().ok_or(RecordError::NotAnObject)?;

    let longitude = coordinate(object.get("longitude"), "longitude", 180.0)?;
    let latitude = coordinate(object.get("latitude"), "latitude", 90.0)?;
    let pagos = event_count(object.get("pagos"), "pagos")?;
    let evasiones = event_count(object.get("evasiones"), "evasiones")?;

    // `count` is optional; a bad one is ignored in favour of the derived total
    let count = object
        .get("count")
        .and_then(Value::as_f64)
        .filter(|c| c.is_finite() && *c >= 0.0);

    Ok(Record {
        longitude,
        latitude,
        pagos,
        evasiones,
        count,
    })
}

fn coordinate(value: Option<&Value>, field: &'static str, limit: f64) -> Result<f64, RecordError> {
    let value = value
        .and_then(Value::as_f64)
        .ok_or(RecordError::MissingField(field))?;
    if !value.is_finite() || value.abs() > limit {
        return Err(RecordError::OutOfRange { field, value });
    }
    Ok(value)
}

fn event_count(value: Option<&Value>, field: &'static str) -> Result<u64, RecordError> {
    let value = value.ok_or(RecordError::MissingField(field))?;
    if let Some(n) = value.as_u64() {
        return Ok(n);
    }
    // Accept integral floats such as `12.0`
    match value.as_f64() {
        Some(f) if f.is_finite() && f >= 0.0 && f.fract() == 0.0 && f <= u64::MAX as f64 => {
            Ok(f as u64)
        }
        Some(_) => Err(RecordError::NotACount(field)),
        None => Err(RecordError::MissingField(field)),
    }
}
