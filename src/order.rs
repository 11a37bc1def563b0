//! Deterministic ordering of library fragments.
//!
//! Customer libraries are conventionally prefixed with a priority number
//! (`2-currency.js`, `10-routing.js`), but most are left unprefixed and must
//! still sort predictably. The sorter therefore works in two tiers: an
//! explicit order from the project configuration wins outright, and leftover
//! names fall back to numeric-prefix order followed by case-insensitive
//! lexicographic order.

use std::cmp::Ordering;

/// Returns the total load order for a set of library fragment names.
///
/// Names listed in `explicit` (and present in `names`) come first, in the
/// given sequence. Remaining names are ordered by the fallback rule:
/// names starting with a decimal digit sort among themselves by the numeric
/// value of their leading digit run (so `2-x` before `10-x`), and precede all
/// non-numeric names, which sort case-insensitively among themselves. The
/// sort is stable with respect to the original enumeration order.
///
/// This function is pure and deterministic: repeated calls with the same
/// input produce identical output.
#[must_use]
pub fn order_fragments(names: &[String], explicit: &[String]) -> Vec<String> {
    let mut ordered: Vec<String> = Vec::with_capacity(names.len());
    let mut remaining: Vec<&String> = names.iter().collect();

    for wanted in explicit {
        if let Some(pos) = remaining.iter().position(|name| *name == wanted) {
            ordered.push(remaining.remove(pos).clone());
        }
    }

    let mut leftovers: Vec<&String> = remaining;
    leftovers.sort_by(|a, b| fallback_cmp(a, b));
    ordered.extend(leftovers.into_iter().cloned());

    ordered
}

/// Fallback comparison: numeric-leading names first (ascending by the value
/// of the leading digit run), then everything else case-insensitively.
fn fallback_cmp(a: &str, b: &str) -> Ordering {
    match (leading_number(a), leading_number(b)) {
        (Some(na), Some(nb)) => na.cmp(&nb),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a
            .to_lowercase()
            .cmp(&b.to_lowercase())
            .then_with(|| a.cmp(b)),
    }
}

/// Parses the leading digit run of a name, if any.
///
/// Digit runs longer than a `u64` saturate rather than overflow; such names
/// sort after every realistic priority prefix.
fn leading_number(name: &str) -> Option<u64> {
    let digits: String = name.chars().take_while(char::is_ascii_digit).collect();
    if digits.is_empty() {
        return None;
    }
    Some(digits.parse::<u64>().unwrap_or(u64::MAX))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| (*s).to_string()).collect()
    }

    #[test]
    fn numeric_prefixes_sort_by_value_not_lexicographically() {
        let input = names(&[
            "10-tenth.js",
            "2-second.js",
            "1-first.js",
            "alpha.js",
            "beta.js",
        ]);
        let ordered = order_fragments(&input, &[]);
        assert_eq!(
            ordered,
            names(&[
                "1-first.js",
                "2-second.js",
                "10-tenth.js",
                "alpha.js",
                "beta.js",
            ])
        );
    }

    #[test]
    fn numeric_leading_names_precede_plain_names() {
        let input = names(&["zulu.js", "3-routing.js"]);
        assert_eq!(
            order_fragments(&input, &[]),
            names(&["3-routing.js", "zulu.js"])
        );
    }

    #[test]
    fn explicit_order_wins_and_preserves_its_sequence() {
        let input = names(&["a.js", "b.js", "c.js", "1-x.js"]);
        let explicit = names(&["c.js", "a.js"]);
        assert_eq!(
            order_fragments(&input, &explicit),
            names(&["c.js", "a.js", "1-x.js", "b.js"])
        );
    }

    #[test]
    fn explicit_names_missing_from_input_are_ignored() {
        let input = names(&["a.js", "b.js"]);
        let explicit = names(&["ghost.js", "b.js"]);
        assert_eq!(
            order_fragments(&input, &explicit),
            names(&["b.js", "a.js"])
        );
    }

    #[test]
    fn every_explicit_name_precedes_every_unlisted_name() {
        let input = names(&["9-last.js", "m.js", "picked.js", "also.js"]);
        let explicit = names(&["also.js", "picked.js"]);
        let ordered = order_fragments(&input, &explicit);
        let pos = |n: &str| ordered.iter().position(|x| x == n).unwrap();
        assert!(pos("also.js") < pos("9-last.js"));
        assert!(pos("picked.js") < pos("9-last.js"));
        assert!(pos("also.js") < pos("picked.js"));
    }

    #[test]
    fn ordering_is_deterministic_across_calls() {
        let input = names(&["b.js", "10-a.js", "A.js", "2-z.js", "a.js"]);
        let first = order_fragments(&input, &[]);
        for _ in 0..10 {
            assert_eq!(order_fragments(&input, &[]), first);
        }
    }

    #[test]
    fn case_differences_fall_back_to_byte_order() {
        let input = names(&["A.js", "a.js"]);
        assert_eq!(order_fragments(&input, &[]), names(&["A.js", "a.js"]));
    }

    #[test]
    fn equal_numeric_prefixes_keep_enumeration_order() {
        let input = names(&["2-b.js", "2-a.js"]);
        // Stable sort: identical leading values resolve by original order.
        assert_eq!(order_fragments(&input, &[]), names(&["2-b.js", "2-a.js"]));
    }

    #[test]
    fn oversized_digit_runs_do_not_panic() {
        let input = names(&["99999999999999999999999-x.js", "1-y.js"]);
        assert_eq!(
            order_fragments(&input, &[]),
            names(&["1-y.js", "99999999999999999999999-x.js"])
        );
    }

    #[test]
    fn empty_input_yields_empty_order() {
        assert!(order_fragments(&[], &names(&["a.js"])).is_empty());
    }
}
