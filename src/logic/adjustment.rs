//! Batch adjustment: decrement the present players, increment everyone else.

use crate::error::Result;
use crate::store::Roster;
use serde::Serialize;
use std::collections::HashSet;

/// Rows touched by one control round.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize)]
pub struct AdjustmentReport {
    pub incremented: usize,
    pub decremented: usize,
}

/// Keep the first occurrence of every name, dropping any listed in `exclude`.
fn distinct<'a>(names: &'a [String], exclude: &HashSet<&'a str>) -> Vec<String> {
    let mut seen = HashSet::new();
    names
        .iter()
        .map(|n| n.as_str())
        .filter(|n| !exclude.contains(n) && seen.insert(*n))
        .map(str::to_string)
        .collect()
}

/// Apply one control round atomically.
///
/// `selected` players lose one point, clamped at zero; `complement` players gain one and
/// are escalated past the threshold. Duplicates are collapsed, and a name present in both
/// sets counts as selected. Names no longer on the roster are silently skipped. On error
/// nothing is committed.
pub fn apply_adjustment<R: Roster + ?Sized>(
    roster: &R,
    selected: &[String],
    complement: &[String],
) -> Result<AdjustmentReport> {
    let selected = distinct(selected, &HashSet::new());
    let chosen: HashSet<&str> = selected.iter().map(String::as_str).collect();
    let complement = distinct(complement, &chosen);

    match roster.apply_partitioned_update(&selected, &complement) {
        Ok(report) => {
            log::info!(
                "Control applied: {} present (-1), {} absent (+1)",
                report.decremented,
                report.incremented
            );
            Ok(report)
        }
        Err(e) => {
            log::warn!(
                "Control round of {} present / {} absent not committed: {}",
                selected.len(),
                complement.len(),
                e
            );
            Err(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distinct_keeps_first_and_honours_exclusions() {
        let names: Vec<String> = ["b", "a", "b", "c", "a"].iter().map(|s| s.to_string()).collect();
        let exclude: HashSet<&str> = ["c"].into_iter().collect();
        assert_eq!(distinct(&names, &exclude), vec!["b", "a"]);
    }
}
