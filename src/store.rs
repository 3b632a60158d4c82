use crate::traffic::DailyTrafficRow;
use anyhow::{Context, Result};
use std::{
    fs,
    path::{Path, PathBuf},
};

/// Flat CSV store for a repository's reconciled traffic history. One file per
/// repository, rewritten in full on every run; the reconciler has already
/// folded the prior contents in.
pub struct TrafficStore {
    csv_path: PathBuf,
}

impl TrafficStore {
    pub fn new(output_dir: &Path, repo: &str) -> Self {
        Self {
            csv_path: output_dir.join(format!("{repo}_git-trafficdata.csv")),
        }
    }

    pub fn csv_path(&self) -> &Path {
        &self.csv_path
    }

    /// Prior history, or empty on the very first run for this repository.
    /// A file that exists but cannot be parsed is an error, not empty history.
    pub fn load(&self) -> Result<Vec<DailyTrafficRow>> {
        if !self.csv_path.exists() {
            return Ok(Vec::new());
        }

        let mut reader = csv::Reader::from_path(&self.csv_path)
            .with_context(|| format!("failed to open history file {}", self.csv_path.display()))?;
        let mut rows = Vec::new();
        for result in reader.deserialize() {
            let row: DailyTrafficRow = result.with_context(|| {
                format!("invalid row in history file {}", self.csv_path.display())
            })?;
            rows.push(row);
        }
        Ok(rows)
    }

    /// Rewrite the history file. Goes through a sibling temp file and a rename
    /// so an interrupted run leaves the previous file intact.
    pub fn save(&self, rows: &[DailyTrafficRow]) -> Result<()> {
        if let Some(parent) = self.csv_path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create output directory {}", parent.display()))?;
        }

        let tmp_path = self.csv_path.with_extension("csv.tmp");
        let mut writer = csv::Writer::from_path(&tmp_path)
            .with_context(|| format!("failed to create {}", tmp_path.display()))?;
        for row in rows {
            writer
                .serialize(row)
                .with_context(|| format!("failed to write row for {}", row.date))?;
        }
        writer
            .flush()
            .with_context(|| format!("failed to flush {}", tmp_path.display()))?;
        drop(writer);

        fs::rename(&tmp_path, &self.csv_path).with_context(|| {
            format!(
                "failed to move {} into place at {}",
                tmp_path.display(),
                self.csv_path.display()
            )
        })?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use tempfile::tempdir;

    fn row(day: &str, base: u64) -> DailyTrafficRow {
        DailyTrafficRow {
            date: day.parse::<NaiveDate>().unwrap(),
            views_count: base,
            views_uniques: base + 1,
            clones_count: base + 2,
            clones_uniques: base + 3,
        }
    }

    #[test]
    fn missing_file_bootstraps_to_empty_history() {
        let dir = tempdir().unwrap();
        let store = TrafficStore::new(dir.path(), "hello-world");
        assert!(store.load().unwrap().is_empty());
    }

    #[test]
    fn round_trip_preserves_rows_and_order() {
        let dir = tempdir().unwrap();
        let store = TrafficStore::new(dir.path(), "hello-world");
        let rows = vec![row("2024-01-01", 5), row("2024-01-02", 0), row("2024-01-03", 2)];

        store.save(&rows).unwrap();
        assert_eq!(store.load().unwrap(), rows);
    }

    #[test]
    fn save_writes_the_expected_header_and_date_format() {
        let dir = tempdir().unwrap();
        let store = TrafficStore::new(dir.path(), "hello-world");
        store.save(&[row("2024-01-01", 5)]).unwrap();

        let contents = fs::read_to_string(store.csv_path()).unwrap();
        let mut lines = contents.lines();
        assert_eq!(
            lines.next(),
            Some("timestamp,views_count,views_uniques,clones_count,clones_uniques")
        );
        assert_eq!(lines.next(), Some("2024-01-01,5,6,7,8"));
    }

    #[test]
    fn save_overwrites_previous_contents_in_full() {
        let dir = tempdir().unwrap();
        let store = TrafficStore::new(dir.path(), "hello-world");

        store
            .save(&[row("2024-01-01", 5), row("2024-01-02", 6)])
            .unwrap();
        store.save(&[row("2024-01-01", 9)]).unwrap();

        assert_eq!(store.load().unwrap(), vec![row("2024-01-01", 9)]);
    }

    #[test]
    fn save_creates_the_output_directory() {
        let dir = tempdir().unwrap();
        let nested = dir.path().join("stats").join("traffic");
        let store = TrafficStore::new(&nested, "hello-world");

        store.save(&[row("2024-01-01", 1)]).unwrap();
        assert!(store.csv_path().exists());
    }

    #[test]
    fn rerunning_with_no_new_data_reproduces_the_file_byte_for_byte() {
        use crate::traffic::{self, MetricFamily, MetricTable};

        let dir = tempdir().unwrap();
        let store = TrafficStore::new(dir.path(), "hello-world");
        let today: NaiveDate = "2024-01-03".parse().unwrap();
        let no_views = MetricTable::empty(MetricFamily::Views);
        let no_clones = MetricTable::empty(MetricFamily::Clones);

        let first = traffic::reconcile(
            &no_views,
            &no_clones,
            &[row("2024-01-01", 5), row("2024-01-02", 0)],
            today,
        );
        store.save(&first).unwrap();
        let first_bytes = fs::read(store.csv_path()).unwrap();

        let history = store.load().unwrap();
        let second = traffic::reconcile(&no_views, &no_clones, &history, today);
        store.save(&second).unwrap();

        assert_eq!(fs::read(store.csv_path()).unwrap(), first_bytes);
    }

    #[test]
    fn corrupt_file_is_an_error_not_empty_history() {
        let dir = tempdir().unwrap();
        let store = TrafficStore::new(dir.path(), "hello-world");
        fs::write(
            store.csv_path(),
            "timestamp,views_count,views_uniques,clones_count,clones_uniques\nnot-a-date,a,b,c,d\n",
        )
        .unwrap();

        assert!(store.load().is_err());
    }
}
