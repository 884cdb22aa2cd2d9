use std::fmt;
use std::str::FromStr;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::api::AssignmentError;

/// Weights are percentages, so a vector that assigns every item exactly once
/// accounts for this total.
const TOTAL_WEIGHT: u64 = 100;

/// One allocated item. `assignee` indexes into the weight vector, `example`
/// indexes into the dataset; mapping both to real rows is the caller's job.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Deserialize, Serialize)]
pub struct Assignment {
    pub assignee: usize,
    pub example: usize,
}

/// Allocation policies a project admin can pick when distributing a dataset
/// across members.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub enum StrategyName {
    #[serde(rename = "weighted_sequential")]
    WeightedSequential,
    #[serde(rename = "weighted_random")]
    WeightedRandom,
    #[serde(rename = "sampling_without_replacement")]
    SamplingWithoutReplacement,
}

/// Allow casting `StrategyName` from the names the web layer sends.
impl FromStr for StrategyName {
    type Err = AssignmentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "weighted_sequential" => Ok(StrategyName::WeightedSequential),
            "weighted_random" => Ok(StrategyName::WeightedRandom),
            "sampling_without_replacement" => Ok(StrategyName::SamplingWithoutReplacement),
            unknown => Err(AssignmentError::UnknownStrategy(unknown.to_owned())),
        }
    }
}

impl fmt::Display for StrategyName {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            StrategyName::WeightedSequential => write!(f, "weighted_sequential"),
            StrategyName::WeightedRandom => write!(f, "weighted_random"),
            StrategyName::SamplingWithoutReplacement => write!(f, "sampling_without_replacement"),
        }
    }
}

/// Builds the requested strategy with a generator seeded from OS entropy.
/// Weight validation happens here, before any assignment work.
pub fn create_assignment_strategy(
    name: StrategyName,
    dataset_size: usize,
    weights: Vec<u32>,
) -> Result<AssignmentStrategy, AssignmentError> {
    create_assignment_strategy_with_rng(name, dataset_size, weights, StdRng::from_entropy())
}

/// Same as [`create_assignment_strategy`] but with a caller-provided
/// generator, so randomized strategies can be reproduced from a seed.
pub fn create_assignment_strategy_with_rng(
    name: StrategyName,
    dataset_size: usize,
    weights: Vec<u32>,
    rng: StdRng,
) -> Result<AssignmentStrategy, AssignmentError> {
    let strategy = match name {
        StrategyName::WeightedSequential => AssignmentStrategy::WeightedSequential(
            WeightedSequentialStrategy::new(dataset_size, weights)?,
        ),
        StrategyName::WeightedRandom => AssignmentStrategy::WeightedRandom(
            WeightedRandomStrategy::with_rng(dataset_size, weights, rng)?,
        ),
        StrategyName::SamplingWithoutReplacement => AssignmentStrategy::SamplingWithoutReplacement(
            SamplingWithoutReplacementStrategy::with_rng(dataset_size, weights, rng)?,
        ),
    };
    Ok(strategy)
}

#[derive(Debug)]
pub enum AssignmentStrategy {
    WeightedSequential(WeightedSequentialStrategy),
    WeightedRandom(WeightedRandomStrategy),
    SamplingWithoutReplacement(SamplingWithoutReplacementStrategy),
}

impl AssignmentStrategy {
    /// Produces the full allocation for this request. Strategies are built
    /// per request and meant to be discarded after one call; randomized
    /// strategies advance their generator.
    pub fn assign(&mut self) -> Vec<Assignment> {
        match self {
            AssignmentStrategy::WeightedSequential(strategy) => strategy.assign(),
            AssignmentStrategy::WeightedRandom(strategy) => strategy.assign(),
            AssignmentStrategy::SamplingWithoutReplacement(strategy) => strategy.assign(),
        }
    }
}

fn weight_sum(weights: &[u32]) -> u64 {
    weights.iter().map(|weight| u64::from(*weight)).sum()
}

/// Splits the dataset into contiguous blocks sized by the weight
/// percentages: with weights `[20, 30, 50]` over 100 items, member 0 gets
/// items 0..20, member 1 gets 20..50, member 2 the rest. Deterministic.
#[derive(Debug)]
pub struct WeightedSequentialStrategy {
    dataset_size: usize,
    weights: Vec<u32>,
}

impl WeightedSequentialStrategy {
    pub fn new(dataset_size: usize, weights: Vec<u32>) -> Result<Self, AssignmentError> {
        if weight_sum(&weights) != TOTAL_WEIGHT {
            return Err(AssignmentError::InvalidWeights(
                "sum of weights must be 100".to_owned(),
            ));
        }
        Ok(Self {
            dataset_size,
            weights,
        })
    }

    pub fn assign(&self) -> Vec<Assignment> {
        let mut boundaries = Vec::with_capacity(self.weights.len() + 1);
        let mut cumulative = 0u64;
        boundaries.push(0);
        for weight in &self.weights {
            cumulative += u64::from(*weight);
            // Cumulative percentage scaled to an item index, ties rounding to
            // even. Prefix sums are non-decreasing and the rounding is
            // monotone, so boundaries never run backwards.
            let boundary = (cumulative as f64 / TOTAL_WEIGHT as f64 * self.dataset_size as f64)
                .round_ties_even() as usize;
            boundaries.push(boundary);
        }

        let mut assignments = Vec::with_capacity(self.dataset_size);
        for (assignee, bounds) in boundaries.windows(2).enumerate() {
            for example in bounds[0]..bounds[1] {
                assignments.push(Assignment { assignee, example });
            }
        }
        assignments
    }
}

/// Rolls a weighted die per item: every item still goes to exactly one
/// member, but the realized split only converges to the weights as the
/// dataset grows. Removes the ordering bias of the sequential strategy.
#[derive(Debug)]
pub struct WeightedRandomStrategy {
    dataset_size: usize,
    weights: Vec<u32>,
    rng: StdRng,
}

impl WeightedRandomStrategy {
    pub fn new(dataset_size: usize, weights: Vec<u32>) -> Result<Self, AssignmentError> {
        Self::with_rng(dataset_size, weights, StdRng::from_entropy())
    }

    pub fn with_rng(
        dataset_size: usize,
        weights: Vec<u32>,
        rng: StdRng,
    ) -> Result<Self, AssignmentError> {
        if weight_sum(&weights) != TOTAL_WEIGHT {
            return Err(AssignmentError::InvalidWeights(
                "sum of weights must be 100".to_owned(),
            ));
        }
        Ok(Self {
            dataset_size,
            weights,
            rng,
        })
    }

    pub fn assign(&mut self) -> Vec<Assignment> {
        let mut assignments = Vec::with_capacity(self.dataset_size);
        for example in 0..self.dataset_size {
            // The weights sum to 100, so the roll always lands inside some
            // member's cumulative band.
            let roll = self.rng.gen_range(0..TOTAL_WEIGHT);
            let mut cumulative = 0u64;
            for (assignee, weight) in self.weights.iter().enumerate() {
                cumulative += u64::from(*weight);
                if roll < cumulative {
                    assignments.push(Assignment { assignee, example });
                    break;
                }
            }
        }
        assignments
    }
}

/// Draws each member an independent without-replacement sample of the
/// dataset, so the same item can land with several members. With weights
/// `[100, 100]` every member annotates everything, which is what
/// inter-annotator agreement measurement needs.
#[derive(Debug)]
pub struct SamplingWithoutReplacementStrategy {
    dataset_size: usize,
    weights: Vec<u32>,
    rng: StdRng,
}

impl SamplingWithoutReplacementStrategy {
    pub fn new(dataset_size: usize, weights: Vec<u32>) -> Result<Self, AssignmentError> {
        Self::with_rng(dataset_size, weights, StdRng::from_entropy())
    }

    pub fn with_rng(
        dataset_size: usize,
        weights: Vec<u32>,
        rng: StdRng,
    ) -> Result<Self, AssignmentError> {
        if weight_sum(&weights) > TOTAL_WEIGHT * weights.len() as u64 {
            return Err(AssignmentError::InvalidWeights(
                "sum of weights must be between 0 and 100 x number of members".to_owned(),
            ));
        }
        // A single weight above 100 would ask for more distinct items than
        // the dataset holds.
        if let Some(weight) = weights.iter().find(|weight| u64::from(**weight) > TOTAL_WEIGHT) {
            return Err(AssignmentError::InvalidWeights(format!(
                "weight {} is above 100",
                weight
            )));
        }
        Ok(Self {
            dataset_size,
            weights,
            rng,
        })
    }

    pub fn assign(&mut self) -> Vec<Assignment> {
        let mut assignments = Vec::new();
        for (assignee, weight) in self.weights.iter().enumerate() {
            // Truncating division: a member can receive up to one item fewer
            // than weight x size / 100.
            let count =
                (self.dataset_size as u64 * u64::from(*weight) / TOTAL_WEIGHT) as usize;
            for example in rand::seq::index::sample(&mut self.rng, self.dataset_size, count) {
                assignments.push(Assignment { assignee, example });
            }
        }
        assignments
    }
}
