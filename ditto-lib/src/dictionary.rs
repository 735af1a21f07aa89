//! Look-alike substitution dictionary.
//!
//! Maps a character to the ordered list of characters that can stand in for
//! it in a doppelganger domain. The order matters: the permutation generator
//! walks substitutes in dictionary order, so a given dictionary and limit
//! always produce the same candidate list.

use crate::error::DittoError;
use std::collections::HashMap;

/// Built-in homoglyph and typo table.
///
/// Latin diacritics first, then Cyrillic/Greek confusables, then keyboard and
/// digit swaps.
const HOMOGLYPHS: &[(char, &[char])] = &[
    ('a', &['à', 'á', 'â', 'ã', 'ä', 'å', 'ą', 'ă', 'ạ', 'ɑ', 'а', 'α', '4']),
    ('b', &['ḃ', 'ḅ', 'ɓ', 'ь', 'd', '6']),
    ('c', &['ç', 'ć', 'ĉ', 'ċ', 'č', 'ƈ', 'с', 'ϲ']),
    ('d', &['ď', 'đ', 'ḋ', 'ḍ', 'ɗ', 'ԁ', 'b']),
    ('e', &['è', 'é', 'ê', 'ë', 'ē', 'ĕ', 'ė', 'ę', 'ě', 'ẹ', 'е', '3']),
    ('f', &['ḟ', 'ƒ']),
    ('g', &['ĝ', 'ğ', 'ġ', 'ģ', 'ǥ', 'ɡ', 'q', '9']),
    ('h', &['ĥ', 'ħ', 'ḣ', 'ḥ', 'һ']),
    ('i', &['ì', 'í', 'î', 'ï', 'ĩ', 'ī', 'ĭ', 'į', 'ı', 'ị', 'і', 'l', '1']),
    ('j', &['ĵ', 'ʝ', 'ј']),
    ('k', &['ķ', 'ĸ', 'ḳ', 'κ', 'к']),
    ('l', &['ĺ', 'ļ', 'ľ', 'ŀ', 'ł', 'ḷ', 'ӏ', 'i', '1']),
    ('m', &['ṁ', 'ṃ', 'м', 'n']),
    ('n', &['ñ', 'ń', 'ņ', 'ň', 'ṅ', 'ṇ', 'п', 'm']),
    ('o', &['ò', 'ó', 'ô', 'õ', 'ö', 'ø', 'ō', 'ŏ', 'ő', 'ọ', 'о', 'ο', '0']),
    ('p', &['ṗ', 'р', 'ρ']),
    ('q', &['ԛ', 'g']),
    ('r', &['ŕ', 'ŗ', 'ř', 'ṙ', 'ṛ', 'г']),
    ('s', &['ś', 'ŝ', 'ş', 'š', 'ṡ', 'ṣ', 'ѕ', '5']),
    ('t', &['ţ', 'ť', 'ŧ', 'ṫ', 'ṭ', 'т', '7']),
    ('u', &['ù', 'ú', 'û', 'ü', 'ũ', 'ū', 'ŭ', 'ů', 'ű', 'ų', 'ụ', 'υ', 'v']),
    ('v', &['ṿ', 'ν', 'ѵ', 'u']),
    ('w', &['ŵ', 'ẁ', 'ẃ', 'ẅ', 'ѡ']),
    ('x', &['ẋ', 'х']),
    ('y', &['ý', 'ÿ', 'ŷ', 'ỳ', 'у']),
    ('z', &['ź', 'ż', 'ž', 'ẓ', '2']),
    ('0', &['o']),
    ('1', &['l', 'i']),
    ('2', &['z']),
    ('3', &['e']),
    ('5', &['s']),
    ('6', &['b']),
    ('7', &['t']),
    ('9', &['g']),
];

/// Immutable-after-startup mapping from a character to its substitutes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Dictionary {
    entries: HashMap<char, Vec<char>>,
}

impl Dictionary {
    /// An empty dictionary.
    pub fn new() -> Self {
        Self::default()
    }

    /// The built-in homoglyph dictionary.
    pub fn homoglyphs() -> Self {
        let mut dictionary = Self::new();
        for (ch, substitutes) in HOMOGLYPHS {
            dictionary.insert(*ch, substitutes.iter().copied());
        }
        dictionary
    }

    /// Append substitutes for `ch`, skipping duplicates and `ch` itself.
    pub fn insert<I>(&mut self, ch: char, substitutes: I)
    where
        I: IntoIterator<Item = char>,
    {
        let entry = self.entries.entry(ch).or_default();
        for substitute in substitutes {
            if substitute != ch && !entry.contains(&substitute) {
                entry.push(substitute);
            }
        }
        if entry.is_empty() {
            self.entries.remove(&ch);
        }
    }

    /// Merge string-keyed entries, as found in a config file `[dictionary]` table.
    ///
    /// Keys and values must each be exactly one character.
    pub fn merge_strings(
        &mut self,
        extra: &HashMap<String, Vec<String>>,
    ) -> Result<(), DittoError> {
        let mut keys: Vec<&String> = extra.keys().collect();
        keys.sort();

        for key in keys {
            let ch = single_char(key).ok_or_else(|| {
                DittoError::config(format!(
                    "Dictionary key '{}' must be a single character",
                    key
                ))
            })?;

            let mut substitutes = Vec::new();
            for value in &extra[key] {
                let sub = single_char(value).ok_or_else(|| {
                    DittoError::config(format!(
                        "Substitute '{}' for '{}' must be a single character",
                        value, key
                    ))
                })?;
                substitutes.push(sub);
            }
            self.insert(ch, substitutes);
        }

        Ok(())
    }

    /// Substitutes for `ch` in dictionary order; empty when there are none.
    pub fn substitutes(&self, ch: char) -> &[char] {
        self.entries.get(&ch).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Number of characters with at least one substitute.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<const N: usize> From<[(char, Vec<char>); N]> for Dictionary {
    fn from(entries: [(char, Vec<char>); N]) -> Self {
        let mut dictionary = Self::new();
        for (ch, substitutes) in entries {
            dictionary.insert(ch, substitutes);
        }
        dictionary
    }
}

fn single_char(s: &str) -> Option<char> {
    let mut chars = s.chars();
    match (chars.next(), chars.next()) {
        (Some(ch), None) => Some(ch),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::to_ascii;
    use std::collections::HashSet;

    #[test]
    fn test_homoglyphs_cover_lowercase_letters() {
        let dictionary = Dictionary::homoglyphs();
        for ch in 'a'..='z' {
            assert!(
                !dictionary.substitutes(ch).is_empty(),
                "no substitutes for '{}'",
                ch
            );
        }
    }

    #[test]
    fn test_homoglyphs_never_map_to_self_or_repeat() {
        let dictionary = Dictionary::homoglyphs();
        for (ch, _) in HOMOGLYPHS {
            let subs = dictionary.substitutes(*ch);
            assert!(!subs.contains(ch));
            let mut seen = subs.to_vec();
            seen.sort();
            seen.dedup();
            assert_eq!(seen.len(), subs.len(), "duplicates for '{}'", ch);
        }
    }

    #[test]
    fn test_homoglyphs_have_distinct_ascii_forms() {
        for (ch, subs) in HOMOGLYPHS {
            let mut seen = HashSet::new();
            for sub in subs.iter() {
                assert!(!sub.is_uppercase(), "'{}' has uppercase substitute '{}'", ch, sub);
                let ascii = to_ascii(&format!("x{}x.com", sub));
                if ascii.is_empty() {
                    continue;
                }
                assert_ne!(ascii, format!("x{}x.com", ch), "'{}' folds back to itself", sub);
                assert!(seen.insert(ascii), "'{}' duplicates another substitute of '{}'", sub, ch);
            }
        }
    }

    #[test]
    fn test_insert_preserves_order_and_dedups() {
        let mut dictionary = Dictionary::new();
        dictionary.insert('e', ['3', 'é', '3', 'e']);
        dictionary.insert('e', ['ë', 'é']);
        assert_eq!(dictionary.substitutes('e'), &['3', 'é', 'ë']);
    }

    #[test]
    fn test_insert_only_self_leaves_no_entry() {
        let mut dictionary = Dictionary::new();
        dictionary.insert('x', ['x']);
        assert!(dictionary.is_empty());
        assert!(dictionary.substitutes('x').is_empty());
    }

    #[test]
    fn test_merge_strings() {
        let mut dictionary = Dictionary::from([('a', vec!['4'])]);
        let extra = HashMap::from([
            ("a".to_string(), vec!["@".to_string(), "4".to_string()]),
            ("w".to_string(), vec!["ω".to_string()]),
        ]);

        dictionary.merge_strings(&extra).unwrap();
        assert_eq!(dictionary.substitutes('a'), &['4', '@']);
        assert_eq!(dictionary.substitutes('w'), &['ω']);
        assert_eq!(dictionary.len(), 2);
    }

    #[test]
    fn test_merge_strings_rejects_multi_char() {
        let mut dictionary = Dictionary::new();
        let bad_key = HashMap::from([("rn".to_string(), vec!["m".to_string()])]);
        assert!(dictionary.merge_strings(&bad_key).is_err());

        let bad_value = HashMap::from([("m".to_string(), vec!["rn".to_string()])]);
        assert!(dictionary.merge_strings(&bad_value).is_err());
    }
}
