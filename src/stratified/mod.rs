// Stratified group selection for controlled experiments
//
// Partitions a labeled population into disjoint pilot and control groups of
// a fixed size, each reproducing the population's stratum composition (or an
// explicitly weighted one).
//
// Pipeline:
// - plan: stratum key -> weight, quota = round(weight * group_size), members
// - capacity: every stratum must hold 2 * quota units (disjoint double draw)
// - draw: 2 * quota rows without replacement; first half pilot, rest control
//
// Quotas are rounded per stratum and never reconciled against the requested
// group size.

mod plan;
mod splitter;

pub use plan::{stratum_quota, StrataPlan, StratumAllocation, StratumPlan};
pub use splitter::{split_stratified, GroupAssignment, StratifiedSplitter};
