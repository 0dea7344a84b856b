mod context;
mod error;
mod query;
mod source;
mod store;
mod tokens;

pub use context::{parse_context, ParsedContext};
pub use error::{FeatureError, Result};
pub use query::{
    paginate, query_features, search, sort, Page, SortOption, DEFAULT_PER_PAGE,
};
pub use source::{ArtifactSource, FsArtifactSource, MemorySource, DATA_DIR_ENV};
pub use store::{load_detail, load_has_data_ids, FeatureIndexStore};
pub use tokens::{format_token, FormattedToken};

pub use featurelens_index::{
    ActivationExample, ActivationStats, Coactivation, FeatureDetail, FeatureSummary, NgramAnalysis,
    NgramStat, PositionBin, TokenStat,
};
