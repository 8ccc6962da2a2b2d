//! WASM bindings for roses-core
//!
//! Provides a JavaScript-friendly API for the game logic and analyzer.

use wasm_bindgen::prelude::*;

use crate::{analyze, Color, Move, Position};

/// WASM-friendly wrapper around Position
#[wasm_bindgen]
pub struct WasmPosition {
    inner: Position,
}

#[wasm_bindgen]
impl WasmPosition {
    /// Create the standard opening position
    #[wasm_bindgen(constructor)]
    pub fn new() -> WasmPosition {
        WasmPosition {
            inner: Position::standard(),
        }
    }

    /// Create from bush counts. Rejects negative and fractional counts.
    #[wasm_bindgen(js_name = fromCounts)]
    pub fn from_counts(counts: Vec<f64>) -> Result<WasmPosition, JsError> {
        let inner = Position::from_f64s(&counts)?;
        Ok(WasmPosition { inner })
    }

    /// Bush counts in color order
    pub fn counts(&self) -> Vec<u32> {
        self.inner.counts().to_vec()
    }

    /// Color names in bush order (bushes past the sixth are unnamed)
    #[wasm_bindgen(js_name = colorNames)]
    pub fn color_names(&self) -> Vec<String> {
        (0..self.inner.len())
            .map(|i| match Color::from_index(i) {
                Some(color) => color.name().to_string(),
                None => format!("bush {}", i),
            })
            .collect()
    }

    /// True when no rose is left
    #[wasm_bindgen(js_name = isGameOver)]
    pub fn is_game_over(&self) -> bool {
        self.inner.is_terminal()
    }

    /// Get legal moves as JSON array
    /// Each move is { piles: [i] } or { piles: [i, j] }
    #[wasm_bindgen(js_name = legalMoves)]
    pub fn legal_moves(&self) -> Result<JsValue, JsError> {
        let moves: Vec<WasmMove> = self
            .inner
            .legal_moves()
            .into_iter()
            .map(WasmMove::from)
            .collect();
        Ok(serde_wasm_bindgen::to_value(&moves)?)
    }

    /// Take one rose from `first`, and one from `second` if given.
    /// Returns true if the move was legal and applied.
    #[wasm_bindgen(js_name = applyMove)]
    pub fn apply_move(&mut self, first: usize, second: Option<usize>) -> bool {
        let mov = match second {
            Some(second) => Move::pair(first, second),
            None => Move::Single(first),
        };
        match self.inner.try_apply(mov) {
            Ok(next) => {
                self.inner = next;
                true
            }
            Err(_) => false,
        }
    }

    /// Analyze for the player to move.
    /// Returns { isWinning, witnessMove } where witnessMove is the bush
    /// counts after the suggested move, or null.
    pub fn analyze(&self) -> Result<JsValue, JsError> {
        let verdict = analyze(&self.inner);
        Ok(serde_wasm_bindgen::to_value(&verdict)?)
    }

    /// Suggested move as { piles: [...] }, or null when losing
    #[wasm_bindgen(js_name = suggestedMove)]
    pub fn suggested_move(&self) -> Result<JsValue, JsError> {
        let suggestion = analyze(&self.inner)
            .suggested_move(&self.inner)
            .map(WasmMove::from);
        Ok(serde_wasm_bindgen::to_value(&suggestion)?)
    }

    /// Clone the position
    #[wasm_bindgen(js_name = clone)]
    pub fn clone_position(&self) -> WasmPosition {
        WasmPosition {
            inner: self.inner.clone(),
        }
    }
}

impl Default for WasmPosition {
    fn default() -> Self {
        Self::new()
    }
}

/// Serializable move for JavaScript
#[derive(serde::Serialize)]
struct WasmMove {
    piles: Vec<usize>,
}

impl From<Move> for WasmMove {
    fn from(mov: Move) -> Self {
        WasmMove {
            piles: mov.piles().collect(),
        }
    }
}
