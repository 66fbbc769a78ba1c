use std::collections::{HashMap, HashSet};

use uuid::Uuid;

use crate::error::{NotemateError, Result};

/// A rank write produced by a full-list resequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RankAssignment {
    pub id: Uuid,
    pub order: i64,
}

/// Check `requested` against the owner's current `(id, order)` set and return
/// the writes that give position `i` rank `i`.
///
/// Only ranks that actually change are returned, so resubmitting an
/// arrangement that is already stored produces no writes.
pub fn plan_batch(current: &[(Uuid, i64)], requested: &[Uuid]) -> Result<Vec<RankAssignment>> {
    let mut seen = HashSet::with_capacity(requested.len());
    for id in requested {
        if !seen.insert(*id) {
            return Err(NotemateError::InvalidInput(format!(
                "note {} appears more than once in the ordering",
                id
            )));
        }
    }

    let existing: HashMap<Uuid, i64> = current.iter().copied().collect();

    if let Some(unknown) = requested.iter().find(|id| !existing.contains_key(id)) {
        return Err(NotemateError::StaleState(format!(
            "note {} is not part of the current note set",
            unknown
        )));
    }

    if requested.len() != existing.len() {
        return Err(NotemateError::StaleState(format!(
            "expected {} notes in the ordering, got {}",
            existing.len(),
            requested.len()
        )));
    }

    Ok(requested
        .iter()
        .enumerate()
        .filter_map(|(position, id)| {
            let order = position as i64;
            (existing[id] != order).then_some(RankAssignment { id: *id, order })
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(n: usize) -> Vec<Uuid> {
        (0..n).map(|_| Uuid::new_v4()).collect()
    }

    #[test]
    fn test_reversal_rewrites_every_rank() {
        let ids = ids(3);
        let current: Vec<(Uuid, i64)> = ids.iter().enumerate().map(|(i, id)| (*id, i as i64)).collect();
        let requested = vec![ids[2], ids[1], ids[0]];

        let plan = plan_batch(&current, &requested).unwrap();

        assert_eq!(
            plan,
            vec![
                RankAssignment { id: ids[2], order: 0 },
                RankAssignment { id: ids[0], order: 2 },
            ]
        );
    }

    #[test]
    fn test_gapped_ranks_are_densified() {
        let ids = ids(2);
        let current = vec![(ids[0], 3), (ids[1], 7)];

        let plan = plan_batch(&current, &ids).unwrap();

        assert_eq!(plan.len(), 2);
        assert_eq!(plan[0].order, 0);
        assert_eq!(plan[1].order, 1);
    }

    #[test]
    fn test_unchanged_arrangement_yields_no_writes() {
        let ids = ids(4);
        let current: Vec<(Uuid, i64)> = ids.iter().enumerate().map(|(i, id)| (*id, i as i64)).collect();
        assert!(plan_batch(&current, &ids).unwrap().is_empty());
    }

    #[test]
    fn test_duplicate_ids_are_invalid_input() {
        let ids = ids(2);
        let current = vec![(ids[0], 0), (ids[1], 1)];
        let err = plan_batch(&current, &[ids[0], ids[0]]).unwrap_err();
        assert!(matches!(err, NotemateError::InvalidInput(_)));
    }

    #[test]
    fn test_missing_or_foreign_ids_are_stale() {
        let ids = ids(3);
        let current = vec![(ids[0], 0), (ids[1], 1)];

        let err = plan_batch(&current, &[ids[0]]).unwrap_err();
        assert!(matches!(err, NotemateError::StaleState(_)));

        let err = plan_batch(&current, &[ids[0], ids[2]]).unwrap_err();
        assert!(matches!(err, NotemateError::StaleState(_)));
    }

    #[test]
    fn test_empty_owner_accepts_empty_list() {
        assert!(plan_batch(&[], &[]).unwrap().is_empty());
    }
}
