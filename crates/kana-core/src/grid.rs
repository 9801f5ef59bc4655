//! The tile grid and per-cell visibility.
//!
//! Cells are created once from a dealt deck and never move. Their visibility
//! only changes through [`TileGrid::reveal`], [`TileGrid::conceal`] and
//! [`TileGrid::mark_matched`]; `Matched` is terminal.

use crate::deck::PairDeck;
use crate::game::GameError;
use serde::{Deserialize, Serialize};

/// Index of a cell in the grid (row-major, fixed for the session)
pub type CellIndex = usize;

/// Visibility of a single cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    Hidden,
    Selected,
    Matched,
}

/// Which half of a pair a cell shows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Glyph,
    Romaji,
}

/// One grid position
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cell {
    /// What the tile shows when face up
    pub symbol: String,
    /// The symbol the partner tile shows
    pub pair_key: String,
    pub side: Side,
    pub visibility: Visibility,
}

impl Cell {
    pub fn new(symbol: impl Into<String>, pair_key: impl Into<String>, side: Side) -> Self {
        Self {
            symbol: symbol.into(),
            pair_key: pair_key.into(),
            side,
            visibility: Visibility::Hidden,
        }
    }

    /// Whether `other` is this cell's partner. Symmetric by construction.
    pub fn pairs_with(&self, other: &Cell) -> bool {
        self.side != other.side && self.symbol == other.pair_key && other.symbol == self.pair_key
    }

    /// The glyph of the pair this cell belongs to
    pub fn glyph(&self) -> &str {
        match self.side {
            Side::Glyph => &self.symbol,
            Side::Romaji => &self.pair_key,
        }
    }

    /// The romaji of the pair this cell belongs to
    pub fn romaji(&self) -> &str {
        match self.side {
            Side::Glyph => &self.pair_key,
            Side::Romaji => &self.symbol,
        }
    }

    pub fn is_hidden(&self) -> bool {
        self.visibility == Visibility::Hidden
    }
}

/// The fixed set of cells for one session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileGrid {
    cells: Vec<Cell>,
}

impl TileGrid {
    /// Lay out a dealt deck, every cell face down
    pub fn from_deck(deck: &PairDeck) -> Self {
        Self {
            cells: deck
                .slots()
                .iter()
                .map(|slot| Cell::new(slot.symbol.clone(), slot.pair_key.clone(), slot.side))
                .collect(),
        }
    }

    /// Build a grid from explicit cells (fixed layouts, replays)
    pub fn from_cells(cells: Vec<Cell>) -> Self {
        Self { cells }
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    pub fn cell(&self, index: CellIndex) -> Result<&Cell, GameError> {
        self.cells.get(index).ok_or(GameError::NoSuchCell(index))
    }

    fn cell_mut(&mut self, index: CellIndex) -> Result<&mut Cell, GameError> {
        self.cells.get_mut(index).ok_or(GameError::NoSuchCell(index))
    }

    /// Position of the first cell showing `symbol`
    pub fn find(&self, symbol: &str) -> Option<CellIndex> {
        self.cells.iter().position(|c| c.symbol == symbol)
    }

    /// Hidden → Selected
    pub fn reveal(&mut self, index: CellIndex) -> Result<(), GameError> {
        self.transition(index, Visibility::Hidden, Visibility::Selected)
    }

    /// Selected → Hidden
    pub fn conceal(&mut self, index: CellIndex) -> Result<(), GameError> {
        self.transition(index, Visibility::Selected, Visibility::Hidden)
    }

    /// Selected → Matched (terminal)
    pub fn mark_matched(&mut self, index: CellIndex) -> Result<(), GameError> {
        self.transition(index, Visibility::Selected, Visibility::Matched)
    }

    fn transition(
        &mut self,
        index: CellIndex,
        from: Visibility,
        to: Visibility,
    ) -> Result<(), GameError> {
        let cell = self.cell_mut(index)?;
        if cell.visibility != from {
            return Err(GameError::InvalidTransition {
                cell: index,
                from: cell.visibility,
                to,
            });
        }
        cell.visibility = to;
        Ok(())
    }

    pub fn count(&self, visibility: Visibility) -> usize {
        self.cells
            .iter()
            .filter(|c| c.visibility == visibility)
            .count()
    }

    /// Indices of every currently selected cell
    pub fn selected(&self) -> Vec<CellIndex> {
        self.cells
            .iter()
            .enumerate()
            .filter(|(_, c)| c.visibility == Visibility::Selected)
            .map(|(i, _)| i)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_grid() -> TileGrid {
        TileGrid::from_cells(vec![
            Cell::new("あ", "a", Side::Glyph),
            Cell::new("i", "い", Side::Romaji),
            Cell::new("a", "あ", Side::Romaji),
            Cell::new("い", "i", Side::Glyph),
        ])
    }

    #[test]
    fn test_reveal_conceal() {
        let mut grid = small_grid();
        grid.reveal(0).unwrap();
        assert_eq!(grid.cell(0).unwrap().visibility, Visibility::Selected);

        // Already selected
        assert!(grid.reveal(0).is_err());

        grid.conceal(0).unwrap();
        assert!(grid.cell(0).unwrap().is_hidden());

        // Hidden cells can't be concealed
        assert!(grid.conceal(0).is_err());
    }

    #[test]
    fn test_matched_is_terminal() {
        let mut grid = small_grid();
        grid.reveal(0).unwrap();
        grid.mark_matched(0).unwrap();

        assert!(grid.reveal(0).is_err());
        assert!(grid.conceal(0).is_err());
        assert!(grid.mark_matched(0).is_err());
        assert_eq!(grid.count(Visibility::Matched), 1);
    }

    #[test]
    fn test_mark_matched_requires_selection() {
        let mut grid = small_grid();
        assert!(matches!(
            grid.mark_matched(1),
            Err(GameError::InvalidTransition {
                cell: 1,
                from: Visibility::Hidden,
                to: Visibility::Matched
            })
        ));
    }

    #[test]
    fn test_out_of_range() {
        let mut grid = small_grid();
        assert!(matches!(grid.reveal(4), Err(GameError::NoSuchCell(4))));
    }

    #[test]
    fn test_pairing_uses_stored_relation() {
        let grid = small_grid();
        let glyph_a = grid.cell(0).unwrap();
        let romaji_a = grid.cell(2).unwrap();
        let romaji_i = grid.cell(1).unwrap();

        assert!(glyph_a.pairs_with(romaji_a));
        assert!(romaji_a.pairs_with(glyph_a));
        assert!(!glyph_a.pairs_with(romaji_i));
        assert!(!glyph_a.pairs_with(glyph_a));

        assert_eq!(romaji_a.glyph(), "あ");
        assert_eq!(romaji_a.romaji(), "a");
    }
}
