//! The single authoritative world shared by every connection
//!
//! `GameState` is created once at startup and mutated in place for the rest
//! of the process. Only three entry points touch it: [`GameState::apply_flap`]
//! and [`GameState::reset`] from client input, and [`GameState::advance`]
//! from the tick loop.

use crate::physics;
use log::info;
use rand::rngs::StdRng;
use rand::SeedableRng;
use shared::{Bird, GameSnapshot, Pipe, FLAP_IMPULSE, PIPE_COUNT, PIPE_SPAWN_X};

/// The bird, the recycled pipe pair and the score of the current round
///
/// Pipes live in a fixed array: they are never created or destroyed during a
/// round, only scrolled and moved back to the right edge with a new gap.
#[derive(Debug, Clone)]
pub struct GameState {
    pub bird: Bird,
    pub pipes: [Pipe; PIPE_COUNT],
    pub score: u32,
    rng: StdRng,
}

impl GameState {
    /// Creates a fresh round
    ///
    /// The bird starts at its spawn pose and the pipes at their default
    /// offsets with random gaps. A seed makes pipe gaps reproducible.
    pub fn new(seed: Option<u64>) -> Self {
        let mut rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let pipes = Self::spawn_pipes(&mut rng);

        Self {
            bird: Bird::new(),
            pipes,
            score: 0,
            rng,
        }
    }

    fn spawn_pipes(rng: &mut StdRng) -> [Pipe; PIPE_COUNT] {
        PIPE_SPAWN_X.map(|x| Pipe::new(x, physics::random_gap(rng)))
    }

    /// Sets the bird's velocity to the flap impulse. Repeated calls between
    /// ticks do not stack. Ignored once the bird is dead.
    pub fn apply_flap(&mut self) {
        if self.bird.alive {
            self.bird.velocity = FLAP_IMPULSE;
        }
    }

    /// Starts a new round: spawn pose, default pipes with new gaps, zero score.
    pub fn reset(&mut self) {
        self.bird = Bird::new();
        self.pipes = Self::spawn_pipes(&mut self.rng);
        self.score = 0;
        info!("World reset");
    }

    /// Runs one physics step
    ///
    /// Applies the step computed by [`physics::tick`], adds any recycled
    /// pipes to the score and marks the bird dead on a collision. The world
    /// stays frozen while the bird is dead, until [`GameState::reset`].
    pub fn advance(&mut self) {
        if !self.bird.alive {
            return;
        }

        let outcome = physics::tick(&self.bird, &self.pipes, &mut self.rng);
        self.bird = outcome.bird;
        self.pipes = outcome.pipes;
        self.score += outcome.score_delta;

        if outcome.collided {
            self.bird.alive = false;
            info!("Bird crashed at y={:.1} with score {}", self.bird.y, self.score);
        }
    }

    /// Copies the world into the form broadcast to clients
    ///
    /// Cheap enough to call every tick; nothing in the snapshot borrows from
    /// the live state.
    pub fn snapshot(&self) -> GameSnapshot {
        GameSnapshot {
            bird: self.bird,
            pipes: self.pipes.to_vec(),
            score: self.score,
        }
    }
}
