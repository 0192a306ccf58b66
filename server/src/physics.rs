//! Pure per-tick physics for the shared world
//!
//! Nothing in here owns state. [`tick`] takes the current bird and pipe set
//! and returns the next ones together with the score earned and whether the
//! bird hit something. The only side input is the RNG used to pick a new
//! gap when a pipe is recycled.

use rand::Rng;
use shared::{
    Bird, Pipe, BIRD_HEIGHT, GAP_MIN, GAP_RANGE, GRAVITY, PIPE_COUNT, PIPE_SPEED, PIPE_WIDTH,
    WORLD_HEIGHT, WORLD_WIDTH,
};

/// Result of one physics step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickOutcome {
    pub bird: Bird,
    pub pipes: [Pipe; PIPE_COUNT],
    /// Number of pipes recycled this step.
    pub score_delta: u32,
    pub collided: bool,
}

/// Draws a gap center uniformly from `[GAP_MIN, GAP_MIN + GAP_RANGE]`.
pub fn random_gap<R: Rng + ?Sized>(rng: &mut R) -> f32 {
    GAP_MIN + rng.gen_range(0.0..=GAP_RANGE)
}

/// Applies gravity, then moves the bird by its new velocity.
pub fn integrate(bird: &mut Bird) {
    bird.velocity += GRAVITY;
    bird.y += bird.velocity;
}

/// Scrolls a pipe left and recycles it to the right edge once it is fully
/// off screen. Returns true if the pipe was recycled.
pub fn advance_pipe<R: Rng + ?Sized>(pipe: &mut Pipe, rng: &mut R) -> bool {
    pipe.x -= PIPE_SPEED;
    if pipe.x < -PIPE_WIDTH {
        pipe.x = WORLD_WIDTH;
        pipe.gap_y = random_gap(rng);
        true
    } else {
        false
    }
}

/// Floor and ceiling test. Touching the floor exactly counts as a hit.
pub fn hits_boundary(bird: &Bird) -> bool {
    bird.y + BIRD_HEIGHT >= WORLD_HEIGHT || bird.y < 0.0
}

/// True if the bird overlaps the pipe horizontally and is not fully inside
/// the gap.
pub fn hits_pipe(bird: &Bird, pipe: &Pipe) -> bool {
    let (left, top, right, bottom) = bird.get_bounds();
    let overlaps_x = right > pipe.x && left < pipe.x + PIPE_WIDTH;
    let outside_gap = top < pipe.gap_top() || bottom > pipe.gap_bottom();
    overlaps_x && outside_gap
}

/// Advances the world by one fixed step.
///
/// Order matters: the bird moves first, then the pipes scroll (and recycle),
/// and only then are collisions evaluated against the updated positions.
pub fn tick<R: Rng + ?Sized>(bird: &Bird, pipes: &[Pipe; PIPE_COUNT], rng: &mut R) -> TickOutcome {
    let mut bird = *bird;
    let mut pipes = *pipes;

    integrate(&mut bird);

    let mut score_delta = 0;
    for pipe in pipes.iter_mut() {
        if advance_pipe(pipe, rng) {
            score_delta += 1;
        }
    }

    let mut collided = false;
    for pipe in &pipes {
        collided |= hits_pipe(&bird, pipe);
    }
    collided |= hits_boundary(&bird);

    TickOutcome {
        bird,
        pipes,
        score_delta,
        collided,
    }
}
