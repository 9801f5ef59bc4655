//! Kana dictionaries.
//!
//! A dictionary maps kana glyphs to their romaji transliteration. Two fixed
//! sets ship with the engine (hiragana and katakana); custom sets can be
//! built with [`Dictionary::new`], which enforces that keys are always glyphs
//! and values are always romaji.

use crate::game::GameError;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

const HIRAGANA: [(&str, &str); 46] = [
    ("あ", "a"), ("い", "i"), ("う", "u"), ("え", "e"), ("お", "o"),
    ("か", "ka"), ("き", "ki"), ("く", "ku"), ("け", "ke"), ("こ", "ko"),
    ("さ", "sa"), ("し", "shi"), ("す", "su"), ("せ", "se"), ("そ", "so"),
    ("た", "ta"), ("ち", "chi"), ("つ", "tsu"), ("て", "te"), ("と", "to"),
    ("な", "na"), ("に", "ni"), ("ぬ", "nu"), ("ね", "ne"), ("の", "no"),
    ("は", "ha"), ("ひ", "hi"), ("ふ", "fu"), ("へ", "he"), ("ほ", "ho"),
    ("ま", "ma"), ("み", "mi"), ("む", "mu"), ("め", "me"), ("も", "mo"),
    ("や", "ya"), ("ゆ", "yu"), ("よ", "yo"),
    ("ら", "ra"), ("り", "ri"), ("る", "ru"), ("れ", "re"), ("ろ", "ro"),
    ("わ", "wa"), ("を", "wo"),
    ("ん", "n"),
];

const KATAKANA: [(&str, &str); 46] = [
    ("ア", "a"), ("イ", "i"), ("ウ", "u"), ("エ", "e"), ("オ", "o"),
    ("カ", "ka"), ("キ", "ki"), ("ク", "ku"), ("ケ", "ke"), ("コ", "ko"),
    ("サ", "sa"), ("シ", "shi"), ("ス", "su"), ("セ", "se"), ("ソ", "so"),
    ("タ", "ta"), ("チ", "chi"), ("ツ", "tsu"), ("テ", "te"), ("ト", "to"),
    ("ナ", "na"), ("ニ", "ni"), ("ヌ", "nu"), ("ネ", "ne"), ("ノ", "no"),
    ("ハ", "ha"), ("ヒ", "hi"), ("フ", "hu"), ("ヘ", "he"), ("ホ", "ho"),
    ("マ", "ma"), ("ミ", "mi"), ("ム", "mu"), ("メ", "me"), ("モ", "mo"),
    ("ヤ", "ya"), ("ユ", "yu"), ("ヨ", "yo"),
    ("ラ", "ra"), ("リ", "ri"), ("ル", "ru"), ("レ", "re"), ("ロ", "ro"),
    ("ワ", "wa"), ("ヲ", "wo"),
    ("ン", "n"),
];

/// The built-in kana sets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DictionaryKind {
    Hiragana,
    Katakana,
}

impl DictionaryKind {
    /// All built-in sets
    pub const ALL: [DictionaryKind; 2] = [DictionaryKind::Hiragana, DictionaryKind::Katakana];

    pub fn name(&self) -> &'static str {
        match self {
            DictionaryKind::Hiragana => "hiragana",
            DictionaryKind::Katakana => "katakana",
        }
    }

    fn entries(&self) -> &'static [(&'static str, &'static str)] {
        match self {
            DictionaryKind::Hiragana => &HIRAGANA,
            DictionaryKind::Katakana => &KATAKANA,
        }
    }
}

impl fmt::Display for DictionaryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DictionaryKind {
    type Err = GameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "hiragana" => Ok(DictionaryKind::Hiragana),
            "katakana" => Ok(DictionaryKind::Katakana),
            other => Err(GameError::Configuration(format!(
                "unknown dictionary '{}'",
                other
            ))),
        }
    }
}

/// One glyph and its romaji
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct KanaPair {
    pub glyph: String,
    pub romaji: String,
}

impl KanaPair {
    pub fn new(glyph: impl Into<String>, romaji: impl Into<String>) -> Self {
        Self {
            glyph: glyph.into(),
            romaji: romaji.into(),
        }
    }
}

/// A validated glyph → romaji mapping
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dictionary {
    name: String,
    pairs: Vec<KanaPair>,
}

impl Dictionary {
    /// Build a dictionary from glyph/romaji entries.
    ///
    /// Every key must be a glyph (no ASCII letters) and every value must be
    /// romaji (ASCII letters only). Glyphs and romaji must both be unique,
    /// otherwise a romaji tile would have more than one valid partner.
    pub fn new<I, G, R>(name: impl Into<String>, entries: I) -> Result<Self, GameError>
    where
        I: IntoIterator<Item = (G, R)>,
        G: Into<String>,
        R: Into<String>,
    {
        let name = name.into();
        let mut glyphs = HashSet::new();
        let mut romaji = HashSet::new();
        let mut pairs = Vec::new();

        for (glyph, value) in entries {
            let pair = KanaPair::new(glyph, value);

            if pair.glyph.is_empty() || pair.glyph.chars().any(|c| c.is_ascii_alphabetic()) {
                return Err(GameError::Configuration(format!(
                    "dictionary '{}': key '{}' is not a glyph",
                    name, pair.glyph
                )));
            }
            if pair.romaji.is_empty() || !pair.romaji.chars().all(|c| c.is_ascii_alphabetic()) {
                return Err(GameError::Configuration(format!(
                    "dictionary '{}': value '{}' for '{}' is not romaji",
                    name, pair.romaji, pair.glyph
                )));
            }
            if !glyphs.insert(pair.glyph.clone()) {
                return Err(GameError::Configuration(format!(
                    "dictionary '{}': duplicate glyph '{}'",
                    name, pair.glyph
                )));
            }
            if !romaji.insert(pair.romaji.clone()) {
                return Err(GameError::Configuration(format!(
                    "dictionary '{}': duplicate romaji '{}'",
                    name, pair.romaji
                )));
            }

            pairs.push(pair);
        }

        Ok(Self { name, pairs })
    }

    /// One of the built-in kana sets
    pub fn builtin(kind: DictionaryKind) -> Self {
        Self {
            name: kind.name().to_string(),
            pairs: kind
                .entries()
                .iter()
                .map(|(glyph, romaji)| KanaPair::new(*glyph, *romaji))
                .collect(),
        }
    }

    /// Look up a built-in set by name ("hiragana" or "katakana")
    pub fn by_name(name: &str) -> Result<Self, GameError> {
        name.parse().map(Self::builtin)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn pairs(&self) -> &[KanaPair] {
        &self.pairs
    }

    /// Romaji for a glyph, if the glyph is in this dictionary
    pub fn romaji_for(&self, glyph: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|p| p.glyph == glyph)
            .map(|p| p.romaji.as_str())
    }

    /// Whether `glyph` maps to `romaji` in this dictionary
    pub fn contains_pair(&self, glyph: &str, romaji: &str) -> bool {
        self.romaji_for(glyph) == Some(romaji)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_sets_are_valid() {
        for kind in DictionaryKind::ALL {
            let builtin = Dictionary::builtin(kind);
            let entries = builtin
                .pairs()
                .iter()
                .map(|p| (p.glyph.clone(), p.romaji.clone()));
            let validated = Dictionary::new(kind.name(), entries).unwrap();

            assert_eq!(validated, builtin);
            assert_eq!(builtin.len(), 46);
        }
    }

    #[test]
    fn test_lookup() {
        let hiragana = Dictionary::builtin(DictionaryKind::Hiragana);
        assert_eq!(hiragana.romaji_for("し"), Some("shi"));
        assert!(hiragana.contains_pair("あ", "a"));
        assert!(!hiragana.contains_pair("あ", "i"));

        let katakana = Dictionary::builtin(DictionaryKind::Katakana);
        assert_eq!(katakana.romaji_for("フ"), Some("hu"));
        assert_eq!(katakana.romaji_for("あ"), None);
    }

    #[test]
    fn test_by_name() {
        assert_eq!(Dictionary::by_name("Katakana").unwrap().name(), "katakana");
        assert!(matches!(
            Dictionary::by_name("kanji"),
            Err(GameError::Configuration(_))
        ));
    }

    #[test]
    fn test_rejects_romaji_keys() {
        let result = Dictionary::new("reversed", [("a", "あ")]);
        assert!(matches!(result, Err(GameError::Configuration(_))));
    }

    #[test]
    fn test_rejects_duplicates() {
        let result = Dictionary::new("dupes", [("あ", "a"), ("ア", "a")]);
        assert!(matches!(result, Err(GameError::Configuration(_))));

        let result = Dictionary::new("dupes", [("あ", "a"), ("あ", "i")]);
        assert!(matches!(result, Err(GameError::Configuration(_))));
    }
}
