use crate::{
    chart,
    config::AppConfig,
    github::{FetchError, TrafficClient},
    store::TrafficStore,
    traffic::{self, MetricFamily, MetricTable},
};
use anyhow::{Result, bail};
use chrono::Utc;

/// High-level application orchestrator: one fetch-reconcile-persist-render
/// cycle per invocation.
pub struct App {
    config: AppConfig,
    client: TrafficClient,
}

impl App {
    pub fn new(config: AppConfig) -> Result<Self> {
        config.validate()?;
        let client = TrafficClient::new(&config)?;
        Ok(Self { config, client })
    }

    pub async fn run(&self, skip_chart: bool) -> Result<()> {
        let store = TrafficStore::new(&self.config.output.dir, &self.config.github.repo);
        let history = store.load()?;
        tracing::info!(
            rows = history.len(),
            path = %store.csv_path().display(),
            "loaded traffic history"
        );

        let mut failures = Vec::new();
        let views = self.fetch_family(MetricFamily::Views, &mut failures).await;
        let clones = self.fetch_family(MetricFamily::Clones, &mut failures).await;

        let today = Utc::now().date_naive();
        let merged = traffic::reconcile(&views, &clones, &history, today);
        store.save(&merged)?;
        tracing::info!(
            rows = merged.len(),
            path = %store.csv_path().display(),
            "saved traffic history"
        );

        if skip_chart {
            tracing::info!("chart rendering skipped");
        } else {
            let chart_path = chart::chart_path(&self.config.output.dir, &self.config.github.repo);
            // A failed chart must not invalidate the history that was just written.
            match chart::render(&merged, &chart_path) {
                Ok(()) => tracing::info!(path = %chart_path.display(), "saved traffic chart"),
                Err(err) => tracing::warn!(error = %err, "chart rendering failed"),
            }
        }

        if !failures.is_empty() {
            let summary = failures
                .iter()
                .map(|err| err.to_string())
                .collect::<Vec<_>>()
                .join("; ");
            bail!("traffic fetch failed: {summary}");
        }
        Ok(())
    }

    async fn fetch_family(
        &self,
        family: MetricFamily,
        failures: &mut Vec<FetchError>,
    ) -> MetricTable {
        match self.client.fetch(family).await {
            Ok(records) => {
                let table = traffic::normalize(family, &records);
                tracing::info!(
                    family = %table.family(),
                    records = records.len(),
                    days = table.len(),
                    "fetched traffic data"
                );
                table
            }
            Err(err) => {
                // One family failing should not stop the other from being reported.
                tracing::warn!(family = %family, error = %err, "fetch failed, treating family as empty");
                failures.push(err);
                MetricTable::empty(family)
            }
        }
    }
}
