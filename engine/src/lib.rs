pub mod cadence;

use std::collections::VecDeque;

pub use cadence::FixedStep;

pub trait GameLogic {
    type State;
    type Input;

    fn initial_state(&self) -> Self::State;
    fn step(&self, state: &Self::State, input: Self::Input) -> Self::State;
}

/// Drives a [`GameLogic`] without any window or renderer attached.
///
/// Past states are kept up to `history_limit` entries (oldest dropped first),
/// so tests can inspect how a session evolved.
#[derive(Debug)]
pub struct HeadlessRunner<G: GameLogic> {
    game: G,
    state: G::State,
    frame: usize,
    history: VecDeque<G::State>,
    history_limit: usize,
}

impl<G: GameLogic> HeadlessRunner<G>
where
    G::State: Clone,
{
    pub fn new(game: G) -> Self {
        Self::with_history_limit(game, 0)
    }

    pub fn with_history_limit(game: G, history_limit: usize) -> Self {
        let state = game.initial_state();
        Self {
            game,
            state,
            frame: 0,
            history: VecDeque::new(),
            history_limit,
        }
    }

    pub fn game(&self) -> &G {
        &self.game
    }

    pub fn frame(&self) -> usize {
        self.frame
    }

    pub fn state(&self) -> &G::State {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut G::State {
        &mut self.state
    }

    /// Previously visited states, oldest first. Does not include the current state.
    pub fn history(&self) -> impl Iterator<Item = &G::State> {
        self.history.iter()
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    pub fn step(&mut self, input: G::Input) -> usize {
        let next = self.game.step(&self.state, input);
        let previous = std::mem::replace(&mut self.state, next);
        if self.history_limit > 0 {
            if self.history.len() == self.history_limit {
                self.history.pop_front();
            }
            self.history.push_back(previous);
        }
        self.frame += 1;
        self.frame
    }

    pub fn run<I>(&mut self, inputs: I) -> usize
    where
        I: IntoIterator<Item = G::Input>,
    {
        for input in inputs {
            self.step(input);
        }
        self.frame
    }
}
