//! Query operations over loaded feature summaries: search, sort, paginate.
//! All three are pure functions over caller-supplied slices; composed as
//! search -> sort -> paginate.

use std::cmp::{Ordering, Reverse};

use serde::Serialize;

use featurelens_index::FeatureSummary;

use crate::store::FeatureIndexStore;

pub const DEFAULT_PER_PAGE: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOption {
    RankControl,
    RankControlDesc,
    RankNoControl,
    RankNoControlDesc,
    Id,
    IdDesc,
    HasData,
}

impl SortOption {
    /// Parses the wire name of a sort option. Unrecognized names return
    /// `None`; callers treat that as "leave input order unchanged".
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "rank-ctrl" => Some(Self::RankControl),
            "rank-ctrl-desc" => Some(Self::RankControlDesc),
            "rank-noctrl" => Some(Self::RankNoControl),
            "rank-noctrl-desc" => Some(Self::RankNoControlDesc),
            "id" => Some(Self::Id),
            "id-desc" => Some(Self::IdDesc),
            "has-data" => Some(Self::HasData),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::RankControl => "rank-ctrl",
            Self::RankControlDesc => "rank-ctrl-desc",
            Self::RankNoControl => "rank-noctrl",
            Self::RankNoControlDesc => "rank-noctrl-desc",
            Self::Id => "id",
            Self::IdDesc => "id-desc",
            Self::HasData => "has-data",
        }
    }
}

/// One page of query results.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page {
    pub data: Vec<FeatureSummary>,
    pub total_pages: usize,
    pub current_page: usize,
    pub has_next: bool,
    pub has_prev: bool,
}

/// Case-insensitive substring filter over `interpretation`. An empty or
/// whitespace-only query returns the input unchanged; matches keep input
/// order, no relevance scoring.
pub fn search(features: &[FeatureSummary], query: &str) -> Vec<FeatureSummary> {
    if query.trim().is_empty() {
        return features.to_vec();
    }
    let needle = query.to_lowercase();
    features
        .iter()
        .filter(|feature| feature.interpretation.to_lowercase().contains(&needle))
        .cloned()
        .collect()
}

/// Stable sort on a copy of the input.
pub fn sort(features: &[FeatureSummary], option: SortOption) -> Vec<FeatureSummary> {
    let mut sorted = features.to_vec();
    match option {
        SortOption::RankControl => {
            sorted.sort_by(|a, b| cmp_f64(a.rank_control, b.rank_control));
        }
        SortOption::RankControlDesc => {
            sorted.sort_by(|a, b| cmp_f64(b.rank_control, a.rank_control));
        }
        SortOption::RankNoControl => {
            sorted.sort_by(|a, b| cmp_f64(a.rank_no_control, b.rank_no_control));
        }
        SortOption::RankNoControlDesc => {
            sorted.sort_by(|a, b| cmp_f64(b.rank_no_control, a.rank_no_control));
        }
        SortOption::Id => sorted.sort_by_key(|f| f.feature_index),
        SortOption::IdDesc => sorted.sort_by_key(|f| Reverse(f.feature_index)),
        SortOption::HasData => {
            // Features with detail records first, then by control rank.
            sorted.sort_by(|a, b| {
                b.has_data
                    .cmp(&a.has_data)
                    .then_with(|| cmp_f64(a.rank_control, b.rank_control))
            });
        }
    }
    sorted
}

fn cmp_f64(a: f64, b: f64) -> Ordering {
    a.partial_cmp(&b).unwrap_or(Ordering::Equal)
}

/// Slices out one 1-indexed page. A page beyond the last yields empty data
/// with `has_next` false; page 0 is clamped to 1.
pub fn paginate(features: &[FeatureSummary], page: usize, per_page: usize) -> Page {
    let page = page.max(1);
    let total_pages = if per_page == 0 {
        0
    } else {
        features.len().div_ceil(per_page)
    };
    let start = (page - 1).saturating_mul(per_page);
    let end = start.saturating_add(per_page).min(features.len());
    let data = if start >= features.len() {
        Vec::new()
    } else {
        features[start..end].to_vec()
    };
    Page {
        data,
        total_pages,
        current_page: page,
        has_next: page < total_pages,
        has_prev: page > 1,
    }
}

/// Answers "page N of features matching `query`, ordered by `option`".
/// `option: None` (an unrecognized sort) preserves the store's input order.
pub fn query_features(
    store: &FeatureIndexStore,
    query: &str,
    option: Option<SortOption>,
    page: usize,
    per_page: usize,
) -> Page {
    let filtered = search(store.summaries(), query);
    let ordered = match option {
        Some(option) => sort(&filtered, option),
        None => filtered,
    };
    paginate(&ordered, page, per_page)
}
