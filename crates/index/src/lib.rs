use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// File name of the feature index artifact inside the data root.
pub const INDEX_FILE: &str = "feature_index.json";
/// File name of the has-data artifact (feature ids with detail records).
pub const HAS_DATA_FILE: &str = "features_with_data.json";
/// Directory of per-feature detail records inside the data root.
pub const DETAIL_DIR: &str = "features";

/// Detail record file name for a given feature id, e.g. `feature_42.json`.
pub fn detail_file_name(id: u32) -> String {
    format!("feature_{id}.json")
}

/// Parses a detail record file name back into a feature id.
pub fn parse_detail_file_name(name: &str) -> Option<u32> {
    name.strip_prefix("feature_")?
        .strip_suffix(".json")?
        .parse()
        .ok()
}

/// Path to the detail record for `id` under `root`.
pub fn detail_path(root: &Path, id: u32) -> PathBuf {
    root.join(DETAIL_DIR).join(detail_file_name(id))
}

/// One row of the feature index artifact: everything the browsing UI needs
/// to list a feature without loading its detail record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeatureSummary {
    pub feature_index: u32,
    pub rank_control: f64,
    pub rank_no_control: f64,
    pub interpretation: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verify_status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paralinguistic: Option<String>,
    pub has_data: bool,
}

/// Full detail record for one feature. Immutable snapshot; re-read from the
/// artifact on every load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeatureDetail {
    pub feature_index: u32,
    pub stats: ActivationStats,
    #[serde(default)]
    pub top_tokens: Vec<TokenStat>,
    #[serde(default)]
    pub top_activations: Vec<ActivationExample>,
    #[serde(default)]
    pub ngram_analysis: NgramAnalysis,
    #[serde(default)]
    pub coactivation: Vec<Coactivation>,
    #[serde(default)]
    pub position_distribution: Vec<PositionBin>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ActivationStats {
    pub activation_rate: f64,
    pub mean_when_active: f64,
    pub max_activation: f64,
    pub std_when_active: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenStat {
    pub token: String,
    pub count: u64,
    pub mean_activation: f64,
}

/// A top-activating example. `context` carries the highlighted token inline
/// between `**` markers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivationExample {
    pub context: String,
    pub active_token: String,
    pub activation: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NgramAnalysis {
    #[serde(default, rename = "2gram")]
    pub bigrams: Vec<NgramStat>,
    #[serde(default, rename = "3gram")]
    pub trigrams: Vec<NgramStat>,
    #[serde(default, rename = "4gram")]
    pub fourgrams: Vec<NgramStat>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NgramStat {
    pub ngram_string: String,
    pub count: u64,
    pub percent: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Coactivation {
    pub feature_index: u32,
    pub count: u64,
    pub percent: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionBin {
    pub range: String,
    pub label: String,
    pub count: u64,
    pub percent: f64,
}

pub fn write_json<T: Serialize, P: AsRef<Path>>(path: P, value: &T) -> Result<()> {
    let path = path.as_ref();
    let file = File::create(path)
        .with_context(|| format!("failed to create artifact {}", path.display()))?;
    let writer = BufWriter::new(file);
    serde_json::to_writer_pretty(writer, value)
        .with_context(|| format!("failed to write artifact {}", path.display()))?;
    Ok(())
}

pub fn read_json<T: DeserializeOwned, P: AsRef<Path>>(path: P) -> Result<T> {
    let path = path.as_ref();
    let file = File::open(path)
        .with_context(|| format!("failed to open artifact {}", path.display()))?;
    let reader = BufReader::new(file);
    let value = serde_json::from_reader(reader)
        .with_context(|| format!("failed to parse artifact {}", path.display()))?;
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_summary() -> FeatureSummary {
        FeatureSummary {
            feature_index: 7,
            rank_control: 12.5,
            rank_no_control: 3.0,
            interpretation: "fires on sentence-final punctuation".to_string(),
            verify_status: Some("verified".to_string()),
            paralinguistic: None,
            has_data: true,
        }
    }

    #[test]
    fn summary_serializes_with_camel_case_fields() {
        let json = serde_json::to_value(sample_summary()).unwrap();
        assert_eq!(json["featureIndex"], 7);
        assert_eq!(json["rankControl"], 12.5);
        assert_eq!(json["hasData"], true);
        assert!(json.get("paralinguistic").is_none());
    }

    #[test]
    fn summary_roundtrips_through_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(INDEX_FILE);
        let records = vec![sample_summary()];
        write_json(&path, &records).unwrap();
        let parsed: Vec<FeatureSummary> = read_json(&path).unwrap();
        assert_eq!(parsed, records);
    }

    #[test]
    fn detail_parses_ngram_keys() {
        let raw = r#"{
            "featureIndex": 3,
            "stats": {
                "activation_rate": 0.01,
                "mean_when_active": 1.2,
                "max_activation": 9.9,
                "std_when_active": 0.4
            },
            "topTokens": [{"token": " the", "count": 10, "meanActivation": 2.0}],
            "topActivations": [{"context": "a **b** c", "activeToken": "b", "activation": 5.0}],
            "ngramAnalysis": {
                "2gram": [{"ngramString": "of the", "count": 4, "percent": 40.0}],
                "3gram": [],
                "4gram": []
            },
            "coactivation": [{"featureIndex": 9, "count": 2, "percent": 20.0}],
            "positionDistribution": [{"range": "0-16", "label": "start", "count": 6, "percent": 60.0}]
        }"#;
        let detail: FeatureDetail = serde_json::from_str(raw).unwrap();
        assert_eq!(detail.feature_index, 3);
        assert_eq!(detail.ngram_analysis.bigrams.len(), 1);
        assert_eq!(detail.ngram_analysis.bigrams[0].ngram_string, "of the");
        assert_eq!(detail.coactivation[0].feature_index, 9);
    }

    #[test]
    fn detail_file_names_roundtrip() {
        assert_eq!(detail_file_name(42), "feature_42.json");
        assert_eq!(parse_detail_file_name("feature_42.json"), Some(42));
        assert_eq!(parse_detail_file_name("feature_.json"), None);
        assert_eq!(parse_detail_file_name("notes.txt"), None);
    }
}
