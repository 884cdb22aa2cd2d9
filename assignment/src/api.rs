use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::instrument;

use crate::config::Config;
use crate::strategy::{
    create_assignment_strategy, create_assignment_strategy_with_rng, Assignment,
    AssignmentStrategy, StrategyName,
};

#[derive(Error, Debug)]
pub enum AssignmentError {
    #[error("unknown strategy name: {0}")]
    UnknownStrategy(String),
    #[error("invalid weights: {0}")]
    InvalidWeights(String),
}

/// An allocation request as the web layer hands it over: a strategy picked
/// by name, the number of examples to distribute, and one weight per member
/// in member order.
#[derive(Debug, Deserialize, Serialize)]
pub struct AssignmentRequest {
    pub strategy_name: String,
    pub dataset_size: usize,
    pub weights: Vec<u32>,
}

/// Runs one allocation request end to end and hands back the assignments
/// for the caller to persist. Rejects the request before any assignment
/// work when the strategy name or the weights are invalid.
#[instrument(skip_all)]
pub fn process_assignment_request(
    request: &AssignmentRequest,
    config: &Config,
) -> Result<Vec<Assignment>, AssignmentError> {
    tracing::debug!(
        strategy = %request.strategy_name,
        dataset_size = request.dataset_size,
        members = request.weights.len(),
        "processing assignment request"
    );

    let mut strategy = build_strategy(request, config).map_err(|e| {
        tracing::error!("rejected assignment request: {}", e);
        e
    })?;

    let assignments = strategy.assign();
    tracing::debug!(assignments = assignments.len(), "allocated dataset");
    Ok(assignments)
}

fn build_strategy(
    request: &AssignmentRequest,
    config: &Config,
) -> Result<AssignmentStrategy, AssignmentError> {
    let name: StrategyName = request.strategy_name.parse()?;
    match config.rng_seed {
        Some(seed) => create_assignment_strategy_with_rng(
            name,
            request.dataset_size,
            request.weights.clone(),
            StdRng::seed_from_u64(seed),
        ),
        None => create_assignment_strategy(name, request.dataset_size, request.weights.clone()),
    }
}
