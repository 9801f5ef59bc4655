//! Dealing a deck of kana/romaji pairs onto grid slots.

use crate::dictionary::{Dictionary, KanaPair};
use crate::game::GameError;
use crate::grid::Side;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Number of pairs in a standard game
pub const PAIR_COUNT: usize = 12;

/// Number of cells in a standard game
pub const CELL_COUNT: usize = PAIR_COUNT * 2;

/// What one slot of the deck shows, and what it must be matched against
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Slot {
    pub symbol: String,
    pub pair_key: String,
    pub side: Side,
}

/// A randomized cell-to-symbol assignment for one session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PairDeck {
    pairs: Vec<KanaPair>,
    slots: Vec<Slot>,
}

impl PairDeck {
    /// Deal `pair_count` distinct pairs from `dictionary` onto `cell_count` slots.
    ///
    /// Glyphs are sampled without replacement. Slot positions are shuffled
    /// separately, so which cell gets the glyph and which gets the romaji is
    /// independent of which glyphs were drawn.
    pub fn deal<R: Rng + ?Sized>(
        dictionary: &Dictionary,
        pair_count: usize,
        cell_count: usize,
        rng: &mut R,
    ) -> Result<Self, GameError> {
        if pair_count == 0 {
            return Err(GameError::Configuration(
                "a deck needs at least one pair".to_string(),
            ));
        }
        if cell_count % (pair_count * 2) != 0 {
            return Err(GameError::Configuration(format!(
                "{} pairs cannot be spread evenly over {} cells",
                pair_count, cell_count
            )));
        }
        if cell_count != pair_count * 2 {
            return Err(GameError::Configuration(format!(
                "{} cells would repeat glyphs; {} pairs need exactly {} cells",
                cell_count,
                pair_count,
                pair_count * 2
            )));
        }
        if dictionary.len() < pair_count {
            return Err(GameError::Configuration(format!(
                "dictionary '{}' has {} entries, {} needed",
                dictionary.name(),
                dictionary.len(),
                pair_count
            )));
        }

        let pairs: Vec<KanaPair> = dictionary
            .pairs()
            .choose_multiple(rng, pair_count)
            .cloned()
            .collect();

        let mut positions: Vec<usize> = (0..cell_count).collect();
        positions.shuffle(rng);

        let mut placed: Vec<(usize, Slot)> = Vec::with_capacity(cell_count);
        for (pair, spots) in pairs.iter().zip(positions.chunks_exact(2)) {
            placed.push((
                spots[0],
                Slot {
                    symbol: pair.glyph.clone(),
                    pair_key: pair.romaji.clone(),
                    side: Side::Glyph,
                },
            ));
            placed.push((
                spots[1],
                Slot {
                    symbol: pair.romaji.clone(),
                    pair_key: pair.glyph.clone(),
                    side: Side::Romaji,
                },
            ));
        }
        placed.sort_by_key(|(position, _)| *position);

        Ok(Self {
            pairs,
            slots: placed.into_iter().map(|(_, slot)| slot).collect(),
        })
    }

    /// Deal a standard 12-pair deck with the thread-local RNG
    pub fn standard(dictionary: &Dictionary) -> Result<Self, GameError> {
        Self::deal(dictionary, PAIR_COUNT, CELL_COUNT, &mut rand::thread_rng())
    }

    /// The pairs that were drawn, in draw order
    pub fn pairs(&self) -> &[KanaPair] {
        &self.pairs
    }

    /// Slots in cell order
    pub fn slots(&self) -> &[Slot] {
        &self.slots
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dictionary::DictionaryKind;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::{HashMap, HashSet};

    fn check_invariants(deck: &PairDeck, dictionary: &Dictionary) {
        assert_eq!(deck.slots().len(), CELL_COUNT);

        let glyphs: HashSet<&str> = deck.pairs().iter().map(|p| p.glyph.as_str()).collect();
        assert_eq!(glyphs.len(), PAIR_COUNT, "glyphs must not repeat");

        let mut seen: HashMap<&str, usize> = HashMap::new();
        for slot in deck.slots() {
            *seen.entry(slot.symbol.as_str()).or_default() += 1;
            match slot.side {
                Side::Glyph => assert!(dictionary.contains_pair(&slot.symbol, &slot.pair_key)),
                Side::Romaji => assert!(dictionary.contains_pair(&slot.pair_key, &slot.symbol)),
            }
        }
        for pair in deck.pairs() {
            assert_eq!(seen.get(pair.glyph.as_str()), Some(&1));
            assert_eq!(seen.get(pair.romaji.as_str()), Some(&1));
        }
    }

    #[test]
    fn test_deal_invariants_hold_across_seeds() {
        for kind in DictionaryKind::ALL {
            let dictionary = Dictionary::builtin(kind);
            for seed in 0..500 {
                let mut rng = StdRng::seed_from_u64(seed);
                let deck = PairDeck::deal(&dictionary, PAIR_COUNT, CELL_COUNT, &mut rng).unwrap();
                check_invariants(&deck, &dictionary);
            }
        }
    }

    #[test]
    fn test_exact_size_dictionary_uses_every_entry() {
        let entries: Vec<(String, String)> = Dictionary::builtin(DictionaryKind::Hiragana)
            .pairs()
            .iter()
            .take(PAIR_COUNT)
            .map(|p| (p.glyph.clone(), p.romaji.clone()))
            .collect();
        let dictionary = Dictionary::new("twelve", entries).unwrap();

        let deck = PairDeck::standard(&dictionary).unwrap();
        check_invariants(&deck, &dictionary);
    }

    #[test]
    fn test_placement_is_randomized() {
        let dictionary = Dictionary::builtin(DictionaryKind::Hiragana);
        let mut rng = StdRng::seed_from_u64(7);
        let first = PairDeck::deal(&dictionary, PAIR_COUNT, CELL_COUNT, &mut rng).unwrap();

        let differs = (0..20).any(|_| {
            let next = PairDeck::deal(&dictionary, PAIR_COUNT, CELL_COUNT, &mut rng).unwrap();
            next.slots() != first.slots()
        });
        assert!(differs, "Decks should vary between deals");
    }

    #[test]
    fn test_small_dictionary_is_rejected() {
        let dictionary = Dictionary::new("tiny", [("あ", "a"), ("い", "i")]).unwrap();
        let result = PairDeck::standard(&dictionary);
        assert!(matches!(result, Err(GameError::Configuration(_))));
    }

    #[test]
    fn test_uneven_cell_count_is_rejected() {
        let dictionary = Dictionary::builtin(DictionaryKind::Katakana);
        let mut rng = StdRng::seed_from_u64(1);

        assert!(matches!(
            PairDeck::deal(&dictionary, PAIR_COUNT, 25, &mut rng),
            Err(GameError::Configuration(_))
        ));
        assert!(matches!(
            PairDeck::deal(&dictionary, PAIR_COUNT, 48, &mut rng),
            Err(GameError::Configuration(_))
        ));
        assert!(matches!(
            PairDeck::deal(&dictionary, 0, 0, &mut rng),
            Err(GameError::Configuration(_))
        ));
    }
}
