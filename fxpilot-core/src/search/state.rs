use serde::{Deserialize, Serialize};

use crate::domain::TradeAction;

/// One node of the search tree.
///
/// `parent` indexes into the [`StateArena`] that owns this state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchState {
    pub action: TradeAction,
    pub entry_price: f64,
    pub position_size: f64,
    pub stop_loss: f64,
    pub take_profit: f64,
    pub leverage: f64,
    pub score: f64,
    pub depth: usize,
    pub parent: Option<usize>,
    pub note: String,
}

impl SearchState {
    /// A flat, zero-size state for HOLD or CLOSE.
    pub fn flat(action: TradeAction, price: f64, note: impl Into<String>) -> Self {
        Self {
            action,
            entry_price: price,
            position_size: 0.0,
            stop_loss: price,
            take_profit: price,
            leverage: 1.0,
            score: 0.0,
            depth: 0,
            parent: None,
            note: note.into(),
        }
    }

    /// Same trade resized, one level deeper.
    pub fn resized(&self, parent: usize, position_size: f64) -> Self {
        Self {
            position_size,
            score: 0.0,
            depth: self.depth + 1,
            parent: Some(parent),
            note: format!("Adjust size to {position_size:.0} units"),
            ..self.clone()
        }
    }
}

/// Per-call owner of every explored state.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StateArena {
    states: Vec<SearchState>,
}

impl StateArena {
    pub fn push(&mut self, state: SearchState) -> usize {
        self.states.push(state);
        self.states.len() - 1
    }

    pub fn get(&self, index: usize) -> Option<&SearchState> {
        self.states.get(index)
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &SearchState> {
        self.states.iter()
    }

    pub fn as_slice(&self) -> &[SearchState] {
        &self.states
    }

    pub fn into_vec(self) -> Vec<SearchState> {
        self.states
    }

    /// Root-first chain of states ending at `index`.
    pub fn path(&self, index: usize) -> Vec<&SearchState> {
        let mut path = Vec::new();
        let mut cursor = Some(index);
        while let Some(i) = cursor {
            let Some(state) = self.states.get(i) else {
                break;
            };
            path.push(state);
            cursor = state.parent;
        }
        path.reverse();
        path
    }
}
