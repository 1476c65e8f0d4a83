// Pipeline processing: relational shaping, per-year aggregation, and graph construction

pub mod aggregate;
pub mod analysis;
pub mod community;
pub mod graph;
pub mod identity;
pub mod join;
pub mod multiset;
pub mod normalize;
pub mod serialize;
pub mod similarity;
