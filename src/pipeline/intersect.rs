use std::cmp::Ordering;
use std::collections::BTreeMap;

use serde::Serialize;

use crate::filter::{FieldKind, FieldOutcome};
use crate::model::{FilterSet, RowId};

/// Rows surviving every applied filter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResultSet {
    pub rows: Vec<RowId>,
    /// Filters that constrained the result. Empty means the rows are the
    /// whole dataset because the query constrained nothing.
    pub applied: Vec<FieldKind>,
}

impl ResultSet {
    pub fn is_constrained(&self) -> bool {
        !self.applied.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Combine per-field outcomes into the final row set.
///
/// Only `Matched` slots whose key the filter set actually carries take part.
/// With none, every row in `0..dataset_len` is returned and `applied` is empty.
pub fn intersect(
    slots: &BTreeMap<FieldKind, FieldOutcome>,
    filters: &FilterSet,
    dataset_len: usize,
) -> ResultSet {
    let mut applied = Vec::new();
    let mut rows: Option<Vec<RowId>> = None;

    for (kind, outcome) in slots {
        let Some(matched) = outcome.rows() else {
            continue;
        };
        if !filters.contains(kind.key()) {
            tracing::debug!(slot = %kind, "ignoring outcome for a key the query did not set");
            continue;
        }
        applied.push(*kind);
        rows = Some(match rows {
            None => matched.to_vec(),
            Some(acc) => merge(&acc, matched),
        });
    }

    let rows = rows.unwrap_or_else(|| (0..dataset_len).collect());
    tracing::debug!(applied = applied.len(), rows = rows.len(), "intersected filter outcomes");
    ResultSet { rows, applied }
}

/// Sorted-merge intersection of two ascending row lists.
fn merge(left: &[RowId], right: &[RowId]) -> Vec<RowId> {
    let mut out = Vec::with_capacity(left.len().min(right.len()));
    let (mut i, mut j) = (0, 0);
    while i < left.len() && j < right.len() {
        match left[i].cmp(&right[j]) {
            Ordering::Less => i += 1,
            Ordering::Greater => j += 1,
            Ordering::Equal => {
                out.push(left[i]);
                i += 1;
                j += 1;
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ListingType, PriceFilter, ProjectStatus};

    fn slots(entries: Vec<(FieldKind, FieldOutcome)>) -> BTreeMap<FieldKind, FieldOutcome> {
        let mut map: BTreeMap<_, _> = FieldKind::ALL
            .into_iter()
            .map(|k| (k, FieldOutcome::Unconstrained))
            .collect();
        map.extend(entries);
        map
    }

    #[test]
    fn test_merge() {
        assert_eq!(merge(&[1, 3, 5, 7], &[2, 3, 7, 9]), vec![3, 7]);
        assert_eq!(merge(&[], &[1, 2]), Vec::<RowId>::new());
    }

    #[test]
    fn test_no_constraints_returns_everything_unconstrained() {
        let result = intersect(&slots(vec![]), &FilterSet::default(), 4);
        assert_eq!(result.rows, vec![0, 1, 2, 3]);
        assert!(!result.is_constrained());
    }

    #[test]
    fn test_single_constraint_passes_through() {
        let filters = FilterSet {
            status: Some(ProjectStatus::ReadyToMove),
            ..Default::default()
        };
        let result = intersect(
            &slots(vec![(FieldKind::Status, FieldOutcome::Matched(vec![0, 2]))]),
            &filters,
            4,
        );
        assert_eq!(result.rows, vec![0, 2]);
        assert_eq!(result.applied, vec![FieldKind::Status]);
    }

    #[test]
    fn test_result_is_in_every_applied_outcome() {
        let filters = FilterSet {
            status: Some(ProjectStatus::ReadyToMove),
            unit_type: Some("3BHK".into()),
            price: Some(PriceFilter::at_most(12_000_000.0)),
            ..Default::default()
        };
        let result = intersect(
            &slots(vec![
                (FieldKind::Status, FieldOutcome::Matched(vec![0, 1, 2, 4])),
                (FieldKind::UnitType, FieldOutcome::Matched(vec![1, 2, 3, 4])),
                (FieldKind::Price, FieldOutcome::Matched(vec![2, 4, 5])),
            ]),
            &filters,
            6,
        );
        assert_eq!(result.rows, vec![2, 4]);
        assert_eq!(result.applied.len(), 3);
    }

    #[test]
    fn test_empty_applied_outcome_empties_result() {
        let filters = FilterSet {
            status: Some(ProjectStatus::ReadyToMove),
            listing_type: Some(ListingType::Rent),
            ..Default::default()
        };
        let result = intersect(
            &slots(vec![
                (FieldKind::Status, FieldOutcome::Matched(vec![0, 1])),
                (FieldKind::ListingType, FieldOutcome::Matched(vec![])),
            ]),
            &filters,
            2,
        );
        assert!(result.is_empty());
        assert!(result.is_constrained());
    }

    #[test]
    fn test_outcome_for_absent_key_is_ignored() {
        let result = intersect(
            &slots(vec![(FieldKind::Balcony, FieldOutcome::Matched(vec![]))]),
            &FilterSet::default(),
            3,
        );
        assert_eq!(result.rows, vec![0, 1, 2]);
        assert!(result.applied.is_empty());
    }

    #[test]
    fn test_identical_listings_are_kept_once_each() {
        // Rows 1 and 2 are byte-identical listings; both survive, neither doubles.
        let filters = FilterSet {
            status: Some(ProjectStatus::ReadyToMove),
            unit_type: Some("2BHK".into()),
            ..Default::default()
        };
        let result = intersect(
            &slots(vec![
                (FieldKind::Status, FieldOutcome::Matched(vec![1, 2])),
                (FieldKind::UnitType, FieldOutcome::Matched(vec![1, 2])),
            ]),
            &filters,
            3,
        );
        assert_eq!(result.rows, vec![1, 2]);
    }
}
