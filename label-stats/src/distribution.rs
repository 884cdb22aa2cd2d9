use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// One recorded use of a label by a member. The caller fetches these for
/// the examples under study; this module only counts them.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct LabelOccurrence {
    pub username: String,
    pub label: String,
}

/// Per-member, per-label frequency table. Ordered maps keep serialized
/// output stable.
pub type LabelDistribution = BTreeMap<String, BTreeMap<String, u64>>;

/// Builds the label-distribution table shown on a project's statistics
/// dashboard: how many times each member used each label.
///
/// Every member x label cell is present and zero-seeded, so members who
/// have not annotated yet still show up. Occurrences naming a member or a
/// label outside the given sets are ignored; they belong to rows the
/// caller filtered out of scope.
pub fn calc_label_distribution(
    occurrences: &[LabelOccurrence],
    members: &[String],
    labels: &[String],
) -> LabelDistribution {
    let mut distribution: LabelDistribution = members
        .iter()
        .map(|member| {
            (
                member.clone(),
                labels.iter().map(|label| (label.clone(), 0)).collect(),
            )
        })
        .collect();

    for occurrence in occurrences {
        if let Some(counts) = distribution.get_mut(&occurrence.username) {
            if let Some(count) = counts.get_mut(&occurrence.label) {
                *count += 1;
            }
        }
    }

    distribution
}
