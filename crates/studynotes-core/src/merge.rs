//! Deduplicating merge of note/subject records from multiple sources.
//!
//! This is the single place merge semantics live: sources are concatenated
//! in precedence order (live storage first, then seed) and deduplicated
//! keeping the first occurrence per identifier. A record present in both
//! sources therefore resolves to the live version.

use std::collections::HashSet;

use crate::models::{Note, Subject};

/// Deduplicate by identifier, keeping the first occurrence and preserving
/// input order.
pub fn dedup_by_id<T, F>(records: Vec<T>, id_of: F) -> Vec<T>
where
    F: Fn(&T) -> &str,
{
    let mut seen: HashSet<String> = HashSet::with_capacity(records.len());
    records
        .into_iter()
        .filter(|record| seen.insert(id_of(record).to_string()))
        .collect()
}

/// Merge live-storage notes with the seed collection, live first.
pub fn merge_notes(live: Vec<Note>, seed: Vec<Note>) -> Vec<Note> {
    let mut all = live;
    all.extend(seed);
    dedup_by_id(all, |n| &n.id)
}

/// Merge live-storage subjects with the seed directory, live first.
pub fn merge_subjects(live: Vec<Subject>, seed: Vec<Subject>) -> Vec<Subject> {
    let mut all = live;
    all.extend(seed);
    dedup_by_id(all, |s| &s.id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::seed::seed_notes;

    #[test]
    fn test_live_record_wins_on_collision() {
        let mut live = seed_notes();
        live.truncate(1);
        live[0].title = "Calculus Lecture 1 (revised)".into();

        let merged = merge_notes(live, seed_notes());

        let ones: Vec<_> = merged.iter().filter(|n| n.id == "1").collect();
        assert_eq!(ones.len(), 1);
        assert_eq!(ones[0].title, "Calculus Lecture 1 (revised)");
        assert_eq!(merged.len(), 3);
    }

    #[test]
    fn test_order_preserved() {
        let merged = merge_notes(Vec::new(), seed_notes());
        let ids: Vec<_> = merged.iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "2", "3"]);
    }

    #[test]
    fn test_dedup_within_a_single_source() {
        let mut live = seed_notes();
        live.extend(seed_notes());
        let merged = merge_notes(live, Vec::new());
        assert_eq!(merged.len(), 3);
    }
}
