//! Evaluation engine - Grid execution, relevance analytics and strategy diffs

mod clustering;
mod comparator;
mod planner;
pub mod statistical;

pub use clustering::{RelevanceClusterer, DEFAULT_CLUSTER_COUNT, DEFAULT_MAX_ITERATIONS};
pub use comparator::StrategyComparator;
pub use planner::{ExperimentPlanner, GridPoint};
pub use statistical::describe;
