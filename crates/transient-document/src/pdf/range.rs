// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Page-range expressions.
//
// Syntax: comma-separated atoms, each a 1-based page (`4`) or an inclusive
// range (`2-7`).  Semicolons separate groups destined for separate output
// documents.  Parsing is total: malformed or out-of-bounds atoms contribute
// nothing and never poison the rest of the expression.

use std::collections::BTreeSet;

use serde::Serialize;

/// Zero-based page indices, de-duplicated and ascending.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PageIndexSet(Vec<usize>);

impl PageIndexSet {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn as_slice(&self) -> &[usize] {
        &self.0
    }

    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        self.0.iter().copied()
    }

    pub fn into_vec(self) -> Vec<usize> {
        self.0
    }
}

impl From<BTreeSet<usize>> for PageIndexSet {
    fn from(set: BTreeSet<usize>) -> Self {
        Self(set.into_iter().collect())
    }
}

/// One semicolon-separated group and the pages it selects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageGroup {
    /// The trimmed segment text as the caller wrote it.
    pub expression: String,
    pub pages: PageIndexSet,
}

/// Parse `expression` against a document of `total_pages` pages.
///
/// Output order is always ascending, whatever order the atoms were written in.
pub fn parse(expression: &str, total_pages: usize) -> PageIndexSet {
    let mut selected = BTreeSet::new();

    for atom in expression.split(',') {
        let atom = atom.trim();
        if atom.is_empty() {
            continue;
        }

        let (start, end) = match atom.split_once('-') {
            Some((start, end)) => match (start.trim().parse::<i64>(), end.trim().parse::<i64>()) {
                (Ok(start), Ok(end)) => (start, end),
                _ => continue,
            },
            None => match atom.parse::<i64>() {
                Ok(page) => (page, page),
                Err(_) => continue,
            },
        };

        // Reversed ranges are empty; the bound check is per page, so a range
        // starting below 1 still contributes its in-bounds tail.
        let first = start.max(1);
        let last = end.min(total_pages as i64);
        if first > last {
            continue;
        }
        selected.extend((first..=last).map(|page| (page - 1) as usize));
    }

    PageIndexSet::from(selected)
}

/// Split `expression` on `;` and parse each non-empty segment on its own.
///
/// Groups that select no pages are kept (with an empty set) so callers can
/// report which expressions were dropped.
pub fn parse_groups(expression: &str, total_pages: usize) -> Vec<PageGroup> {
    group_segments(expression)
        .map(|segment| PageGroup {
            pages: parse(segment, total_pages),
            expression: segment.to_string(),
        })
        .collect()
}

/// The trimmed, non-empty `;`-separated segments of `expression`.
pub fn group_segments(expression: &str) -> impl Iterator<Item = &str> {
    expression
        .split(';')
        .map(str::trim)
        .filter(|segment| !segment.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pages(expression: &str, total: usize) -> Vec<usize> {
        parse(expression, total).into_vec()
    }

    #[test]
    fn mixed_atoms_are_sorted_and_zero_based() {
        assert_eq!(pages("1-3,5,7-10", 10), vec![0, 1, 2, 4, 6, 7, 8, 9]);
    }

    #[test]
    fn output_is_ascending_regardless_of_input_order() {
        assert_eq!(pages("5,1-3", 10), vec![0, 1, 2, 4]);
        assert_eq!(pages("9,2,9,2-3", 10), vec![1, 2, 8]);
    }

    #[test]
    fn reversed_range_is_empty() {
        assert!(pages("3-1", 10).is_empty());
    }

    #[test]
    fn range_end_truncates_at_page_count() {
        assert_eq!(pages("4-99", 5), vec![3, 4]);
    }

    #[test]
    fn start_below_one_is_dropped_per_index() {
        assert_eq!(pages("0-2", 5), vec![0, 1]);
        assert!(pages("0", 5).is_empty());
    }

    #[test]
    fn malformed_atoms_are_skipped_individually() {
        assert_eq!(pages("a, 2 , 3-x, -1, 4 - 5, 1-2-3, ,", 6), vec![1, 3, 4]);
    }

    #[test]
    fn all_invalid_atoms_yield_empty_set() {
        assert!(pages("99", 5).is_empty());
        assert!(pages("", 5).is_empty());
        assert!(pages("pages", 5).is_empty());
    }

    #[test]
    fn zero_page_document_selects_nothing() {
        assert!(pages("1-10", 0).is_empty());
    }

    #[test]
    fn never_exceeds_bounds() {
        for total in 0..12 {
            for expression in ["1-100", "0-0", "5", "3-1,7,2-2", "-3-4", "11,12,1"] {
                assert!(parse(expression, total).iter().all(|index| index < total));
            }
        }
    }

    #[test]
    fn groups_are_trimmed_and_empty_segments_discarded() {
        let groups = parse_groups(" 1-2 ;; 3 ;  ; 99 ", 3);
        let expressions: Vec<&str> = groups.iter().map(|g| g.expression.as_str()).collect();
        assert_eq!(expressions, vec!["1-2", "3", "99"]);
        assert_eq!(groups[0].pages.as_slice(), &[0, 1]);
        assert_eq!(groups[1].pages.as_slice(), &[2]);
        assert!(groups[2].pages.is_empty());
    }
}
