// Stratum allocation plan: key -> (weight, quota, member rows)
//
// Separating the plan from the draw keeps the rounding policy and the
// capacity precondition checkable without touching the random stream.

use crate::error::{DesignError, Result};
use crate::population::{Population, StratumKey, StratumWeights};
use serde::Serialize;
use std::collections::BTreeMap;

/// Planned allocation for a single stratum
#[derive(Debug, Clone, PartialEq)]
pub struct StratumPlan {
    /// Share of each group this stratum should occupy
    pub weight: f64,

    /// Units drawn into EACH of pilot and control
    pub quota: usize,

    /// Row indices (into the population) belonging to this stratum
    pub members: Vec<usize>,
}

impl StratumPlan {
    /// Units needed for a disjoint double draw
    ///
    /// Saturates, so an oversized quota fails the capacity check.
    pub fn required(&self) -> usize {
        self.quota.saturating_mul(2)
    }

    pub fn available(&self) -> usize {
        self.members.len()
    }
}

/// Summary of a stratum's plan, reported with every group assignment
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StratumAllocation {
    pub key: StratumKey,
    pub weight: f64,
    pub quota: usize,
    pub available: usize,
}

/// Per-group quota for a stratum of the given weight
///
/// Rounds half to even, independently per stratum.
pub fn stratum_quota(weight: f64, group_size: usize) -> usize {
    (weight * group_size as f64).round_ties_even().max(0.0) as usize
}

/// Explicit association of stratum keys to their allocation plans
#[derive(Debug, Clone, PartialEq)]
pub struct StrataPlan {
    group_size: usize,
    strata: BTreeMap<StratumKey, StratumPlan>,
}

impl StrataPlan {
    /// Group population rows by stratum and assign weights and quotas
    ///
    /// Without explicit `weights`, each stratum's weight is its share of the
    /// population. With explicit weights, only the named strata are planned;
    /// strata named but absent from the population get no members.
    pub fn build(
        population: &Population,
        strata_columns: &[String],
        group_size: usize,
        weights: Option<&StratumWeights>,
    ) -> Result<Self> {
        if strata_columns.is_empty() {
            return Err(DesignError::invalid(
                "strata_columns",
                "at least one stratification column is required",
            ));
        }

        if group_size == 0 {
            return Err(DesignError::invalid("group_size", "must be >= 1, got 0"));
        }

        let mut members: BTreeMap<StratumKey, Vec<usize>> = BTreeMap::new();
        for (row, unit) in population.units().iter().enumerate() {
            members
                .entry(unit.stratum_key(strata_columns)?)
                .or_default()
                .push(row);
        }

        let strata = match weights {
            Some(explicit) => {
                for (key, &weight) in explicit {
                    if !(weight > 0.0 && weight <= 1.0) {
                        return Err(DesignError::invalid(
                            "weights",
                            format!("weight of stratum {} must lie in (0, 1], got {}", key, weight),
                        ));
                    }
                }
                explicit
                    .iter()
                    .map(|(key, &weight)| {
                        let plan = StratumPlan {
                            weight,
                            quota: stratum_quota(weight, group_size),
                            members: members.remove(key).unwrap_or_default(),
                        };
                        (key.clone(), plan)
                    })
                    .collect()
            }
            None => {
                if population.is_empty() {
                    return Err(DesignError::invalid(
                        "population",
                        "cannot derive stratum weights from an empty population",
                    ));
                }
                let total = population.len() as f64;
                members
                    .into_iter()
                    .map(|(key, rows)| {
                        let weight = rows.len() as f64 / total;
                        let plan = StratumPlan {
                            weight,
                            quota: stratum_quota(weight, group_size),
                            members: rows,
                        };
                        (key, plan)
                    })
                    .collect()
            }
        };

        let plan = Self { group_size, strata };
        for (key, stratum) in plan.iter() {
            tracing::debug!(
                "Stratum {}: weight={:.4}, quota={}, available={}",
                key,
                stratum.weight,
                stratum.quota,
                stratum.available()
            );
        }
        Ok(plan)
    }

    /// Every stratum must hold at least twice its quota
    pub fn check_capacity(&self) -> Result<()> {
        match self
            .strata
            .iter()
            .find(|(_, plan)| plan.available() < plan.required())
        {
            Some((key, plan)) => Err(DesignError::InsufficientData {
                stratum: key.to_string(),
                available: plan.available(),
                required: plan.required(),
            }),
            None => Ok(()),
        }
    }

    pub fn group_size(&self) -> usize {
        self.group_size
    }

    /// Sum of per-stratum quotas (may differ from the group size by rounding)
    pub fn total_quota(&self) -> usize {
        self.strata
            .values()
            .fold(0usize, |total, plan| total.saturating_add(plan.quota))
    }

    pub fn get(&self, key: &StratumKey) -> Option<&StratumPlan> {
        self.strata.get(key)
    }

    pub fn len(&self) -> usize {
        self.strata.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strata.is_empty()
    }

    /// Strata in key order
    pub fn iter(&self) -> impl Iterator<Item = (&StratumKey, &StratumPlan)> {
        self.strata.iter()
    }

    pub fn allocations(&self) -> Vec<StratumAllocation> {
        self.strata
            .iter()
            .map(|(key, plan)| StratumAllocation {
                key: key.clone(),
                weight: plan.weight,
                quota: plan.quota,
                available: plan.available(),
            })
            .collect()
    }
}
