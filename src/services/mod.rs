pub mod recommend;
pub mod status;

pub use recommend::{CatalogRecommender, Recommendation, RecommendService, DEFAULT_RECOMMEND_LIMIT};
pub use status::{collect_catalog_stats, CatalogStats, CategoryCoverage};
