//! Posts synthetic hourly readings to a running sensor API.
//!
//! Usage:
//!   cargo run --bin generate_data -- --sensors 5 --years 1 \
//!       --api-url http://localhost:8000 --max-workers 200

use std::{env, fmt::Display, str::FromStr, sync::Arc, time::Duration};

use anyhow::{Context, Result};
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use indexmap::IndexMap;
use rand::Rng;
use reqwest::Client;
use sensor_api::{db::models::MetricType, sensors::models::SensorIngestPayload};
use tokio::{sync::Semaphore, task::JoinSet};
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Debug)]
struct Args {
    sensors: usize,
    years: i64,
    api_url: String,
    max_workers: usize,
}

impl Args {
    fn parse(args: &[String]) -> Result<Self> {
        Ok(Self {
            sensors: flag(args, "--sensors", 5)?,
            years: flag(args, "--years", 1)?,
            api_url: flag(args, "--api-url", "http://localhost:8000".to_owned())?,
            max_workers: flag(args, "--max-workers", 200)?,
        })
    }
}

fn flag<T>(args: &[String], name: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: Display,
{
    match args.windows(2).find(|w| w[0] == name) {
        Some(w) => w[1]
            .parse()
            .map_err(|e| anyhow::anyhow!("invalid value for {name}: {e}")),
        None => Ok(default),
    }
}

/// `(sensor_id, location, sensor_type)` for the 1-based sensor `index`.
fn sensor_profile(index: usize) -> (String, String, String) {
    let group = (index % 5) + 1;
    (
        format!("sensor_{index:03}"),
        format!("location_{group}"),
        format!("sensor_type_{group}"),
    )
}

/// Every known metric, uniform in `[0, 100)`, rounded to two decimals.
fn random_metrics() -> IndexMap<String, f64> {
    let mut rng = rand::thread_rng();
    MetricType::ALL
        .iter()
        .map(|m| {
            let v: f64 = rng.gen_range(0.0..100.0);
            (m.to_string(), (v * 100.0).round() / 100.0)
        })
        .collect()
}

async fn send_reading(
    client: &Client,
    api_url: &str,
    sensor_id: &str,
    payload: &SensorIngestPayload,
) -> Result<()> {
    let url = format!("{api_url}/api/v1/sensors/{sensor_id}/data");
    client
        .post(&url)
        .json(payload)
        .send()
        .await
        .with_context(|| format!("request to {url} failed"))?
        .error_for_status()
        .with_context(|| format!("{url} rejected reading"))?;
    Ok(())
}

#[derive(Debug, Default)]
struct Tally {
    sent: u64,
    failed: u64,
}

impl Tally {
    fn record(&mut self, outcome: Result<Result<()>, tokio::task::JoinError>) {
        match outcome {
            Ok(Ok(())) => self.sent += 1,
            Ok(Err(e)) => {
                self.failed += 1;
                warn!(error = %format!("{e:#}"), "Failed to send reading");
            }
            Err(e) => {
                self.failed += 1;
                warn!(error = %e, "Send task aborted");
            }
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info,generate_data=info".into()))
        .init();

    let argv: Vec<String> = env::args().collect();
    let args = Args::parse(&argv)?;
    info!(?args, "Generating synthetic sensor data");

    let client = Client::builder()
        .timeout(Duration::from_secs(30))
        .build()
        .context("failed to build HTTP client")?;
    let api_url: Arc<str> = Arc::from(args.api_url.trim_end_matches('/'));
    let semaphore = Arc::new(Semaphore::new(args.max_workers.max(1)));

    let profiles: Vec<_> = (1..=args.sensors).map(sensor_profile).collect();
    let end: DateTime<Utc> = Utc::now();
    let mut current = end - ChronoDuration::days(365 * args.years);

    let mut tasks = JoinSet::new();
    let mut tally = Tally::default();

    while current <= end {
        for (sensor_id, location, sensor_type) in &profiles {
            let payload = SensorIngestPayload {
                location: location.clone(),
                sensor_type: sensor_type.clone(),
                metrics: random_metrics(),
                timestamp: Some(current),
            };
            let permit = semaphore
                .clone()
                .acquire_owned()
                .await
                .context("semaphore closed")?;
            let client = client.clone();
            let api_url = Arc::clone(&api_url);
            let sensor_id = sensor_id.clone();

            tasks.spawn(async move {
                let _permit = permit;
                send_reading(&client, &api_url, &sensor_id, &payload).await
            });

            while let Some(outcome) = tasks.try_join_next() {
                tally.record(outcome);
            }
        }
        current += ChronoDuration::hours(1);
    }

    while let Some(outcome) = tasks.join_next().await {
        tally.record(outcome);
    }

    info!(sent = tally.sent, failed = tally.failed, "Synthetic data generation finished");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn argv(s: &str) -> Vec<String> {
        s.split_whitespace().map(str::to_owned).collect()
    }

    #[test]
    fn args_default_when_absent() {
        let a = Args::parse(&argv("generate_data")).unwrap();
        assert_eq!(a.sensors, 5);
        assert_eq!(a.years, 1);
        assert_eq!(a.api_url, "http://localhost:8000");
        assert_eq!(a.max_workers, 200);
    }

    #[test]
    fn args_parse_flags() {
        let a = Args::parse(&argv(
            "generate_data --sensors 12 --api-url http://api:9000 --max-workers 8",
        ))
        .unwrap();
        assert_eq!(a.sensors, 12);
        assert_eq!(a.api_url, "http://api:9000");
        assert_eq!(a.max_workers, 8);
    }

    #[test]
    fn args_reject_bad_numbers() {
        let err = Args::parse(&argv("generate_data --years many")).unwrap_err();
        assert!(err.to_string().contains("--years"));
    }

    #[test]
    fn profiles_cycle_through_five_groups() {
        assert_eq!(
            sensor_profile(1),
            ("sensor_001".into(), "location_2".into(), "sensor_type_2".into())
        );
        assert_eq!(sensor_profile(4).1, "location_5");
        assert_eq!(sensor_profile(5).1, "location_1");
        assert_eq!(sensor_profile(123).0, "sensor_123");
    }

    #[test]
    fn random_metrics_cover_every_metric_in_range() {
        let m = random_metrics();
        assert_eq!(m.len(), MetricType::ALL.len());
        for v in m.values() {
            assert!((0.0..=100.0).contains(v));
            assert_eq!((v * 100.0).round() / 100.0, *v);
        }
    }
}
