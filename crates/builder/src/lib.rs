//! Offline artifact builder: turns the interpretation CSV and a directory of
//! per-feature detail records into the two artifacts the core pipeline
//! consumes (feature index + has-data id list).

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use csv::ReaderBuilder;
use serde::Deserialize;

use featurelens_index::{
    parse_detail_file_name, FeatureSummary, HAS_DATA_FILE, INDEX_FILE,
};

#[derive(Debug, Clone)]
pub struct BuildOptions {
    /// Interpretation table with one row per feature.
    pub csv_path: PathBuf,
    /// Directory holding `feature_{id}.json` detail records.
    pub detail_dir: PathBuf,
    /// Destination for the generated artifacts.
    pub out_dir: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildReport {
    pub features: usize,
    pub with_data: usize,
    pub index_path: PathBuf,
    pub has_data_path: PathBuf,
}

#[derive(Debug, Deserialize)]
struct IndexRow {
    feature_index: u32,
    rank_control: f64,
    rank_no_control: f64,
    interpretation: String,
    #[serde(default)]
    verify_status: Option<String>,
    #[serde(default)]
    paralinguistic: Option<String>,
}

/// Builds both artifacts. `hasData` is derived from the detail directory
/// scan, so the flag agrees with record presence at build time.
pub fn build_artifacts(opts: &BuildOptions) -> Result<BuildReport> {
    let detail_ids = scan_detail_dir(&opts.detail_dir)?;
    let rows = read_index_rows(&opts.csv_path)?;

    let mut seen = BTreeSet::new();
    let mut summaries = Vec::with_capacity(rows.len());
    for row in rows {
        if !seen.insert(row.feature_index) {
            tracing::warn!(
                feature_index = row.feature_index,
                "duplicate feature index in interpretation table; keeping first row"
            );
            continue;
        }
        summaries.push(FeatureSummary {
            feature_index: row.feature_index,
            rank_control: row.rank_control,
            rank_no_control: row.rank_no_control,
            interpretation: row.interpretation,
            verify_status: non_empty(row.verify_status),
            paralinguistic: non_empty(row.paralinguistic),
            has_data: detail_ids.contains(&row.feature_index),
        });
    }

    fs::create_dir_all(&opts.out_dir)
        .with_context(|| format!("failed to create {}", opts.out_dir.display()))?;
    let index_path = opts.out_dir.join(INDEX_FILE);
    featurelens_index::write_json(&index_path, &summaries)?;
    let has_data: Vec<u32> = detail_ids.iter().copied().collect();
    let has_data_path = opts.out_dir.join(HAS_DATA_FILE);
    featurelens_index::write_json(&has_data_path, &has_data)?;

    Ok(BuildReport {
        features: summaries.len(),
        with_data: has_data.len(),
        index_path,
        has_data_path,
    })
}

fn read_index_rows(path: &Path) -> Result<Vec<IndexRow>> {
    let file = fs::File::open(path)
        .with_context(|| format!("failed to open interpretation table {}", path.display()))?;
    let mut reader = ReaderBuilder::new().from_reader(file);
    let mut rows = Vec::new();
    for record in reader.deserialize() {
        let row: IndexRow =
            record.with_context(|| format!("invalid row in {}", path.display()))?;
        rows.push(row);
    }
    Ok(rows)
}

/// Collects feature ids that have a detail record on disk. A missing
/// directory counts as zero records.
fn scan_detail_dir(dir: &Path) -> Result<BTreeSet<u32>> {
    let mut ids = BTreeSet::new();
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            tracing::warn!(dir = %dir.display(), "detail directory missing; no features will carry data");
            return Ok(ids);
        }
        Err(err) => {
            return Err(err)
                .with_context(|| format!("failed to read detail directory {}", dir.display()))
        }
    };
    for entry in entries {
        let entry = entry
            .with_context(|| format!("failed to read detail directory {}", dir.display()))?;
        if let Some(name) = entry.file_name().to_str() {
            if let Some(id) = parse_detail_file_name(name) {
                ids.insert(id);
            }
        }
    }
    Ok(ids)
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_csv(dir: &Path) -> PathBuf {
        let path = dir.join("interpretations.csv");
        let mut file = fs::File::create(&path).unwrap();
        writeln!(
            file,
            "feature_index,rank_control,rank_no_control,interpretation,verify_status,paralinguistic"
        )
        .unwrap();
        writeln!(file, "1,10.0,3.5,opens quotations,verified,").unwrap();
        writeln!(file, "2,4.0,8.0,newline after heading,,laughter").unwrap();
        writeln!(file, "3,7.5,1.0,sentence-final period,,").unwrap();
        path
    }

    fn touch_detail(dir: &Path, id: u32) {
        fs::create_dir_all(dir).unwrap();
        let mut file =
            fs::File::create(dir.join(featurelens_index::detail_file_name(id))).unwrap();
        write!(file, "{{}}").unwrap();
    }

    #[test]
    fn builds_both_artifacts() {
        let tmp = tempfile::tempdir().unwrap();
        let csv_path = write_csv(tmp.path());
        let detail_dir = tmp.path().join("features");
        touch_detail(&detail_dir, 2);
        touch_detail(&detail_dir, 3);

        let report = build_artifacts(&BuildOptions {
            csv_path,
            detail_dir,
            out_dir: tmp.path().join("out"),
        })
        .unwrap();
        assert_eq!(report.features, 3);
        assert_eq!(report.with_data, 2);

        let summaries: Vec<FeatureSummary> =
            featurelens_index::read_json(&report.index_path).unwrap();
        assert_eq!(summaries.len(), 3);
        assert!(!summaries[0].has_data);
        assert!(summaries[1].has_data);
        assert_eq!(summaries[0].verify_status.as_deref(), Some("verified"));
        assert_eq!(summaries[0].paralinguistic, None);
        assert_eq!(summaries[1].paralinguistic.as_deref(), Some("laughter"));

        let ids: Vec<u32> = featurelens_index::read_json(&report.has_data_path).unwrap();
        assert_eq!(ids, vec![2, 3]);
    }

    #[test]
    fn missing_detail_dir_builds_index_without_data_flags() {
        let tmp = tempfile::tempdir().unwrap();
        let csv_path = write_csv(tmp.path());
        let report = build_artifacts(&BuildOptions {
            csv_path,
            detail_dir: tmp.path().join("absent"),
            out_dir: tmp.path().join("out"),
        })
        .unwrap();
        assert_eq!(report.with_data, 0);
        let summaries: Vec<FeatureSummary> =
            featurelens_index::read_json(&report.index_path).unwrap();
        assert!(summaries.iter().all(|s| !s.has_data));
    }

    #[test]
    fn duplicate_rows_keep_first() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("dup.csv");
        let mut file = fs::File::create(&path).unwrap();
        writeln!(
            file,
            "feature_index,rank_control,rank_no_control,interpretation,verify_status,paralinguistic"
        )
        .unwrap();
        writeln!(file, "1,1.0,1.0,first,,").unwrap();
        writeln!(file, "1,2.0,2.0,second,,").unwrap();
        let report = build_artifacts(&BuildOptions {
            csv_path: path,
            detail_dir: tmp.path().join("features"),
            out_dir: tmp.path().join("out"),
        })
        .unwrap();
        assert_eq!(report.features, 1);
        let summaries: Vec<FeatureSummary> =
            featurelens_index::read_json(&report.index_path).unwrap();
        assert_eq!(summaries[0].interpretation, "first");
    }
}
