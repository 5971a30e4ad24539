// Stratified pilot/control draw
//
// For each stratum (in key order) draw 2 * quota rows without replacement:
// the first quota go to pilot, the rest to control. Groups are therefore
// disjoint, equal-sized per stratum, and stratum-proportional.

use crate::error::Result;
use crate::population::{Population, PopulationUnit, StratumWeights};
use crate::random::RandomStream;
use crate::stratified::plan::{StrataPlan, StratumAllocation};
use std::collections::HashSet;

/// Result of a stratified split
#[derive(Debug, Clone, PartialEq)]
pub struct GroupAssignment {
    /// Pilot (treatment) group, original rows
    pub pilot: Vec<PopulationUnit>,

    /// Control group, original rows
    pub control: Vec<PopulationUnit>,

    /// Plan the groups were drawn from
    pub allocations: Vec<StratumAllocation>,

    /// Base seed of the draw (replayable even when none was supplied)
    pub seed: u64,
}

impl GroupAssignment {
    pub fn pilot_ids(&self) -> Vec<&str> {
        self.pilot.iter().map(|u| u.id.as_str()).collect()
    }

    pub fn control_ids(&self) -> Vec<&str> {
        self.control.iter().map(|u| u.id.as_str()).collect()
    }

    /// True when no unit id appears in both groups
    pub fn is_disjoint(&self) -> bool {
        let pilot: HashSet<&str> = self.pilot.iter().map(|u| u.id.as_str()).collect();
        self.control.iter().all(|u| !pilot.contains(u.id.as_str()))
    }
}

/// Stratified splitter configured with attribute columns and optional weights
///
/// # Example
/// ```
/// use abdesign::population::{Population, PopulationUnit};
/// use abdesign::stratified::StratifiedSplitter;
/// use serde_json::json;
///
/// let units = (0..20)
///     .map(|i| {
///         let os = if i % 2 == 0 { "ios" } else { "android" };
///         let fields = json!({"id": i, "os": os}).as_object().unwrap().clone();
///         PopulationUnit::new(i.to_string(), fields)
///     })
///     .collect::<Population>();
///
/// let groups = StratifiedSplitter::new(vec!["os".to_string()])
///     .with_seed(42)
///     .split(&units, 6)
///     .unwrap();
/// assert_eq!(groups.pilot.len(), 6);
/// assert!(groups.is_disjoint());
/// ```
#[derive(Debug, Clone, Default)]
pub struct StratifiedSplitter {
    strata_columns: Vec<String>,
    weights: Option<StratumWeights>,
    seed: Option<u64>,
}

impl StratifiedSplitter {
    pub fn new(strata_columns: Vec<String>) -> Self {
        Self {
            strata_columns,
            weights: None,
            seed: None,
        }
    }

    /// Override empirical proportions with explicit stratum weights
    pub fn with_weights(mut self, weights: StratumWeights) -> Self {
        self.weights = Some(weights);
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_optional_seed(mut self, seed: Option<u64>) -> Self {
        self.seed = seed;
        self
    }

    /// Plan only: weights, quotas and membership, without drawing
    pub fn plan(&self, population: &Population, group_size: usize) -> Result<StrataPlan> {
        StrataPlan::build(
            population,
            &self.strata_columns,
            group_size,
            self.weights.as_ref(),
        )
    }

    /// Draw pilot and control groups of `group_size` units each
    pub fn split(&self, population: &Population, group_size: usize) -> Result<GroupAssignment> {
        let plan = self.plan(population, group_size)?;
        plan.check_capacity()?;

        let total_quota = plan.total_quota();
        if total_quota != group_size {
            tracing::warn!(
                "Per-stratum rounding gives groups of {} units (requested {})",
                total_quota,
                group_size
            );
        }

        let mut rng = RandomStream::new(self.seed);
        let units = population.units();
        let mut pilot = Vec::with_capacity(total_quota);
        let mut control = Vec::with_capacity(total_quota);

        for (_, stratum) in plan.iter() {
            let drawn = rng.sample_indices(stratum.available(), stratum.required());
            let (first, second) = drawn.split_at(stratum.quota);
            pilot.extend(first.iter().map(|&i| units[stratum.members[i]].clone()));
            control.extend(second.iter().map(|&i| units[stratum.members[i]].clone()));
        }

        tracing::info!(
            "Split {} units into pilot={} / control={} across {} strata (seed={})",
            population.len(),
            pilot.len(),
            control.len(),
            plan.len(),
            rng.seed()
        );

        Ok(GroupAssignment {
            pilot,
            control,
            allocations: plan.allocations(),
            seed: rng.seed(),
        })
    }
}

/// Split `population` into stratum-proportional pilot and control groups
///
/// Convenience wrapper over [`StratifiedSplitter`].
pub fn split_stratified(
    population: &Population,
    strata_columns: &[String],
    group_size: usize,
    weights: Option<&StratumWeights>,
    seed: Option<u64>,
) -> Result<GroupAssignment> {
    let mut splitter =
        StratifiedSplitter::new(strata_columns.to_vec()).with_optional_seed(seed);
    if let Some(weights) = weights {
        splitter = splitter.with_weights(weights.clone());
    }
    splitter.split(population, group_size)
}
