use std::collections::HashMap;

use featurelens_index::{FeatureDetail, FeatureSummary, HAS_DATA_FILE, INDEX_FILE};

use crate::error::Result;
use crate::source::ArtifactSource;

/// Owns the loaded feature summaries for the lifetime of the process.
/// Constructed once at startup and shared read-only; see [`Self::load`].
#[derive(Debug, Default)]
pub struct FeatureIndexStore {
    summaries: Vec<FeatureSummary>,
    by_id: HashMap<u32, usize>,
}

impl FeatureIndexStore {
    /// Loads the feature index artifact. A missing artifact yields an empty
    /// store with a warning; a malformed one is an error.
    pub fn load(source: &dyn ArtifactSource) -> Result<Self> {
        let summaries = match source.read_index()? {
            Some(records) => records,
            None => {
                tracing::warn!(
                    artifact = INDEX_FILE,
                    "feature index artifact missing; run `featurelens build` to generate it"
                );
                Vec::new()
            }
        };
        let mut by_id = HashMap::with_capacity(summaries.len());
        for (pos, summary) in summaries.iter().enumerate() {
            if by_id.insert(summary.feature_index, pos).is_some() {
                tracing::warn!(
                    feature_index = summary.feature_index,
                    "duplicate feature index in artifact"
                );
            }
        }
        Ok(Self { summaries, by_id })
    }

    pub fn summaries(&self) -> &[FeatureSummary] {
        &self.summaries
    }

    pub fn lookup(&self, id: u32) -> Option<&FeatureSummary> {
        self.by_id.get(&id).map(|&pos| &self.summaries[pos])
    }

    pub fn len(&self) -> usize {
        self.summaries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.summaries.is_empty()
    }
}

/// Reads the has-data artifact: feature ids known to carry a detail record.
/// Missing artifact yields an empty list with a warning.
pub fn load_has_data_ids(source: &dyn ArtifactSource) -> Result<Vec<u32>> {
    match source.read_has_data_ids()? {
        Some(ids) => Ok(ids),
        None => {
            tracing::warn!(
                artifact = HAS_DATA_FILE,
                "has-data artifact missing; run `featurelens build` to generate it"
            );
            Ok(Vec::new())
        }
    }
}

/// Loads one feature's detail record. `Ok(None)` when no record exists for
/// `id`; a malformed record fails this lookup only.
pub fn load_detail(source: &dyn ArtifactSource, id: u32) -> Result<Option<FeatureDetail>> {
    source.read_detail(id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::MemorySource;
    use featurelens_index::ActivationStats;

    fn summary(id: u32) -> FeatureSummary {
        FeatureSummary {
            feature_index: id,
            rank_control: id as f64,
            rank_no_control: id as f64,
            interpretation: format!("feature {id}"),
            verify_status: None,
            paralinguistic: None,
            has_data: false,
        }
    }

    #[test]
    fn missing_index_loads_empty() {
        let source = MemorySource::default();
        let store = FeatureIndexStore::load(&source).unwrap();
        assert!(store.is_empty());
    }

    #[test]
    fn lookup_finds_by_feature_index() {
        let source = MemorySource::with_index(vec![summary(5), summary(2), summary(9)]);
        let store = FeatureIndexStore::load(&source).unwrap();
        assert_eq!(store.len(), 3);
        assert_eq!(store.lookup(2).unwrap().interpretation, "feature 2");
        assert!(store.lookup(404).is_none());
    }

    #[test]
    fn missing_has_data_artifact_is_empty_not_error() {
        let source = MemorySource::default();
        assert!(load_has_data_ids(&source).unwrap().is_empty());
    }

    #[test]
    fn missing_detail_is_none() {
        let source = MemorySource::default();
        assert!(load_detail(&source, 42).unwrap().is_none());
    }

    #[test]
    fn present_detail_loads() {
        let mut source = MemorySource::default();
        source.details.insert(
            42,
            FeatureDetail {
                feature_index: 42,
                stats: ActivationStats::default(),
                top_tokens: Vec::new(),
                top_activations: Vec::new(),
                ngram_analysis: Default::default(),
                coactivation: Vec::new(),
                position_distribution: Vec::new(),
            },
        );
        let detail = load_detail(&source, 42).unwrap().unwrap();
        assert_eq!(detail.feature_index, 42);
    }
}
