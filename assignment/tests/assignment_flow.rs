use std::collections::{HashMap, HashSet};

use anyhow::Result;
use assert_json_diff::assert_json_eq;
use serde_json::json;

use assignment::api::{process_assignment_request, AssignmentError, AssignmentRequest};
use assignment::config::Config;

fn seeded_config(seed: u64) -> Config {
    Config {
        rng_seed: Some(seed),
    }
}

fn request(strategy_name: &str, dataset_size: usize, weights: Vec<u32>) -> AssignmentRequest {
    AssignmentRequest {
        strategy_name: strategy_name.to_string(),
        dataset_size,
        weights,
    }
}

#[test]
fn it_answers_a_json_request_with_assignee_example_pairs() -> Result<()> {
    let request: AssignmentRequest = serde_json::from_value(json!({
        "strategy_name": "weighted_sequential",
        "dataset_size": 5,
        "weights": [20, 30, 50],
    }))?;

    let assignments = process_assignment_request(&request, &Config { rng_seed: None })?;

    // 50% of 5 items is 2.5; the boundary rounds to the even index 2, so the
    // middle member ends up with a single item.
    assert_json_eq!(
        serde_json::to_value(&assignments)?,
        json!([
            {"assignee": 0, "example": 0},
            {"assignee": 1, "example": 1},
            {"assignee": 2, "example": 2},
            {"assignee": 2, "example": 3},
            {"assignee": 2, "example": 4},
        ])
    );

    Ok(())
}

#[test]
fn it_covers_the_whole_dataset_without_duplicates() -> Result<()> {
    for strategy_name in ["weighted_sequential", "weighted_random"] {
        let assignments = process_assignment_request(
            &request(strategy_name, 1000, vec![20, 30, 50]),
            &seeded_config(17),
        )?;

        let mut examples: Vec<usize> = assignments.iter().map(|a| a.example).collect();
        examples.sort_unstable();
        assert_eq!(
            examples,
            (0..1000).collect::<Vec<_>>(),
            "{} left gaps or duplicates",
            strategy_name
        );
    }

    Ok(())
}

#[test]
fn it_converges_to_the_weights_over_a_large_dataset() -> Result<()> {
    let assignments = process_assignment_request(
        &request("weighted_random", 100_000, vec![20, 80]),
        &seeded_config(23),
    )?;

    let first_member = assignments.iter().filter(|a| a.assignee == 0).count();
    let fraction = first_member as f64 / 100_000.0;
    assert!(
        (0.18..=0.22).contains(&fraction),
        "member with weight 20 received {} of the dataset",
        fraction
    );

    Ok(())
}

#[test]
fn it_gives_every_member_the_full_dataset_at_weight_100() -> Result<()> {
    let assignments = process_assignment_request(
        &request("sampling_without_replacement", 10, vec![100, 100]),
        &seeded_config(31),
    )?;

    assert_eq!(assignments.len(), 20);

    let mut per_member: HashMap<usize, HashSet<usize>> = HashMap::new();
    for assignment in &assignments {
        assert!(
            per_member
                .entry(assignment.assignee)
                .or_default()
                .insert(assignment.example),
            "member {} received item {} twice",
            assignment.assignee,
            assignment.example
        );
    }
    for assignee in 0..2 {
        assert_eq!(per_member[&assignee], (0..10).collect::<HashSet<_>>());
    }

    Ok(())
}

#[test]
fn it_reproduces_allocations_for_a_fixed_seed() -> Result<()> {
    for strategy_name in ["weighted_random", "sampling_without_replacement"] {
        let first = process_assignment_request(
            &request(strategy_name, 200, vec![50, 50]),
            &seeded_config(99),
        )?;
        let second = process_assignment_request(
            &request(strategy_name, 200, vec![50, 50]),
            &seeded_config(99),
        )?;

        assert_eq!(first, second, "{} did not reproduce", strategy_name);
    }

    Ok(())
}

#[test]
fn it_rejects_unknown_strategy_names() {
    match process_assignment_request(
        &request("bogus", 10, vec![50, 50]),
        &Config { rng_seed: None },
    ) {
        Err(AssignmentError::UnknownStrategy(name)) => assert_eq!(name, "bogus"),
        other => panic!("Expected UnknownStrategy, got {:?}", other),
    }
}

#[test]
fn it_rejects_invalid_weight_sums() {
    match process_assignment_request(
        &request("weighted_sequential", 10, vec![10, 10]),
        &Config { rng_seed: None },
    ) {
        Err(AssignmentError::InvalidWeights(_)) => (),
        other => panic!("Expected InvalidWeights, got {:?}", other),
    }

    match process_assignment_request(
        &request("sampling_without_replacement", 10, vec![150, 150]),
        &Config { rng_seed: None },
    ) {
        Err(AssignmentError::InvalidWeights(_)) => (),
        other => panic!("Expected InvalidWeights, got {:?}", other),
    }
}

#[test]
fn it_returns_nothing_for_an_empty_dataset() -> Result<()> {
    for (strategy_name, weights) in [
        ("weighted_sequential", vec![20, 80]),
        ("weighted_random", vec![20, 80]),
        ("sampling_without_replacement", vec![100, 100]),
    ] {
        let assignments = process_assignment_request(
            &request(strategy_name, 0, weights),
            &seeded_config(1),
        )?;
        assert!(assignments.is_empty(), "{} assigned phantom items", strategy_name);
    }

    Ok(())
}
