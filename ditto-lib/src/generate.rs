//! Doppelganger candidate generation.
//!
//! Produces one candidate per (position, substitute) pair of the target label:
//! for every character that has dictionary entries, each substitute replaces
//! that single character while the rest of the label and the suffix stay put.
//!
//! Iteration is left to right over the label and in dictionary order over the
//! substitutes, so the output (and any truncation by `limit`) is reproducible.
//!
//! # Examples
//!
//! ```
//! use ditto_lib::generate::generate_candidates;
//! use ditto_lib::{Dictionary, Target};
//!
//! let target = Target {
//!     subdomain: String::new(),
//!     label: "example".to_string(),
//!     suffix: "com".to_string(),
//! };
//! let dictionary = Dictionary::from([('e', vec!['3']), ('o', vec!['0'])]);
//!
//! let domains: Vec<String> = generate_candidates(&target, &dictionary, 0)
//!     .into_iter()
//!     .map(|c| c.domain)
//!     .collect();
//! assert_eq!(domains, vec!["3xample.com", "exampl3.com"]);
//! ```

use crate::dictionary::Dictionary;
use crate::types::{Candidate, Target};

/// Number of candidates `generate_candidates` yields without a limit.
pub fn estimate_candidate_count(label: &str, dictionary: &Dictionary) -> usize {
    label
        .chars()
        .map(|ch| dictionary.substitutes(ch).len())
        .sum()
}

/// Generate look-alike domains for `label` under `suffix`.
///
/// A `limit` of 0 means no limit; otherwise generation stops as soon as
/// `limit` names have been produced.
pub fn permute_label(label: &str, suffix: &str, dictionary: &Dictionary, limit: usize) -> Vec<String> {
    let capacity = estimate_candidate_count(label, dictionary);
    let capacity = if limit > 0 { capacity.min(limit) } else { capacity };
    let mut names = Vec::with_capacity(capacity);

    for (idx, ch) in label.char_indices() {
        let head = &label[..idx];
        let tail = &label[idx + ch.len_utf8()..];

        for substitute in dictionary.substitutes(ch) {
            names.push(format!("{}{}{}.{}", head, substitute, tail, suffix));
            if limit > 0 && names.len() == limit {
                return names;
            }
        }
    }

    names
}

/// Generate unresolved candidates for a parsed target.
pub fn generate_candidates(target: &Target, dictionary: &Dictionary, limit: usize) -> Vec<Candidate> {
    permute_label(&target.label, &target.suffix, dictionary, limit)
        .into_iter()
        .map(Candidate::new)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn target(label: &str, suffix: &str) -> Target {
        Target {
            subdomain: String::new(),
            label: label.to_string(),
            suffix: suffix.to_string(),
        }
    }

    /// Number of char positions where two equal-length names differ.
    fn char_diff(a: &str, b: &str) -> usize {
        a.chars().zip(b.chars()).filter(|(x, y)| x != y).count()
    }

    #[test]
    fn test_example_com_scenario() {
        let dictionary = Dictionary::from([('e', vec!['3']), ('o', vec!['0'])]);
        let names = permute_label("example", "com", &dictionary, 0);
        assert_eq!(names, vec!["3xample.com", "exampl3.com"]);
    }

    #[test]
    fn test_left_to_right_then_dictionary_order() {
        let dictionary = Dictionary::from([('o', vec!['0', 'ο']), ('g', vec!['q'])]);
        let names = permute_label("google", "com", &dictionary, 0);
        assert_eq!(
            names,
            vec![
                "qoogle.com",
                "g0ogle.com",
                "gοogle.com",
                "go0gle.com",
                "goοgle.com",
                "gooqle.com",
            ]
        );
    }

    #[test]
    fn test_count_matches_sum_of_substitutes() {
        let dictionary = Dictionary::homoglyphs();
        for label in ["example", "paypal", "a", "xn", "bank-of-test", "123"] {
            let names = permute_label(label, "com", &dictionary, 0);
            assert_eq!(names.len(), estimate_candidate_count(label, &dictionary));
        }
    }

    #[test]
    fn test_single_substitution_invariant() {
        let dictionary = Dictionary::homoglyphs();
        let base = "paypal";
        for name in permute_label(base, "com", &dictionary, 0) {
            let label = name.strip_suffix(".com").unwrap();
            assert_eq!(label.chars().count(), base.chars().count());
            assert_eq!(char_diff(label, base), 1, "{} vs {}", label, base);
        }
    }

    #[test]
    fn test_limit_truncates_deterministically() {
        let dictionary = Dictionary::homoglyphs();
        let full = permute_label("example", "com", &dictionary, 0);
        assert!(full.len() > 10);

        let limited = permute_label("example", "com", &dictionary, 10);
        assert_eq!(limited.len(), 10);
        assert_eq!(limited, full[..10].to_vec());
        assert_eq!(limited, permute_label("example", "com", &dictionary, 10));
    }

    #[test]
    fn test_limit_above_total_yields_everything() {
        let dictionary = Dictionary::from([('e', vec!['3'])]);
        let names = permute_label("example", "com", &dictionary, 100);
        assert_eq!(names.len(), 2);
    }

    #[test]
    fn test_no_dictionary_hits() {
        let dictionary = Dictionary::from([('q', vec!['g'])]);
        assert!(permute_label("example", "com", &dictionary, 0).is_empty());
        assert_eq!(estimate_candidate_count("example", &dictionary), 0);
    }

    #[test]
    fn test_unicode_label_slicing() {
        let dictionary = Dictionary::from([('ü', vec!['u']), ('n', vec!['m'])]);
        let names = permute_label("münchen", "de", &dictionary, 0);
        assert_eq!(names, vec!["munchen.de", "mümchen.de", "münchem.de"]);
    }

    #[test]
    fn test_multi_label_suffix_kept() {
        let dictionary = Dictionary::from([('b', vec!['d'])]);
        let names = permute_label("bbc", "co.uk", &dictionary, 0);
        assert_eq!(names, vec!["dbc.co.uk", "bdc.co.uk"]);
    }

    #[test]
    fn test_generate_candidates_only_domain_set() {
        let dictionary = Dictionary::from([('e', vec!['3'])]);
        let candidates = generate_candidates(&target("example", "com"), &dictionary, 0);
        assert_eq!(candidates.len(), 2);
        for candidate in &candidates {
            assert_eq!(candidate, &Candidate::new(candidate.domain.clone()));
        }
        assert_eq!(candidates[0].domain, "3xample.com");
        assert_eq!(candidates[1].domain, "exampl3.com");
    }
}
