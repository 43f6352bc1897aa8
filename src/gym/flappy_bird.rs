use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use strum::{FromRepr, VariantArray};

use crate::{
    env::{Environment, Report, Transition},
    Error, Result,
};

use super::canvas::{Canvas, Sprite};

/// Actions for the [`FlappyBird`] environment
#[derive(FromRepr, VariantArray, Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum Action {
    Idle = 0,
    Jump = 1,
}

impl From<u8> for Action {
    /// Any value other than `1` is treated as [`Action::Idle`]
    fn from(value: u8) -> Self {
        Self::from_repr(value).unwrap_or(Action::Idle)
    }
}

impl From<Action> for u8 {
    fn from(action: Action) -> Self {
        action as u8
    }
}

/// Per-tick reward policy
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Rewards {
    /// Reward for surviving a tick
    pub alive: f32,
    /// Reward for a tick in which the score increased
    pub pipe_passed: f32,
    /// Reward for the terminal tick
    pub crash: f32,
}

impl Default for Rewards {
    fn default() -> Self {
        Self {
            alive: 1.0,
            pipe_passed: 5.0,
            crash: -100.0,
        }
    }
}

/// Geometry and physics constants of a [`FlappyBird`] instance
///
/// All distances are in pixels with the origin at the top left, `y` growing downwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlappyConfig {
    pub width: f32,
    pub height: f32,
    /// Height of the ground band at the bottom of the field
    pub ground_height: f32,
    /// Velocity added every tick
    pub gravity: f32,
    /// Velocity assigned by a jump
    pub jump_velocity: f32,
    /// Fixed horizontal position of the bird
    pub bird_x: f32,
    /// Side length of the bird's square bounding box
    pub bird_size: f32,
    pub pipe_width: f32,
    /// Vertical size of the opening in each pipe
    pub pipe_gap: f32,
    pub pipe_speed: f32,
    /// A new pipe spawns once the last one is this far left of the right edge
    pub spawn_distance: f32,
    /// Minimum clearance between the gap and the top of the field or the ground
    pub gap_margin: f32,
    pub rewards: Rewards,
}

impl Default for FlappyConfig {
    fn default() -> Self {
        Self {
            width: 288.0,
            height: 512.0,
            ground_height: 100.0,
            gravity: 0.25,
            jump_velocity: -6.0,
            bird_x: 50.0,
            bird_size: 20.0,
            pipe_width: 52.0,
            pipe_gap: 100.0,
            pipe_speed: 2.0,
            spawn_distance: 150.0,
            gap_margin: 50.0,
            rewards: Rewards::default(),
        }
    }
}

impl FlappyConfig {
    /// Inclusive range of whole-pixel gap tops that keep the gap inside the playable area
    fn gap_top_range(&self) -> (i32, i32) {
        let lo = self.gap_margin.ceil() as i32;
        let playable = self.height - self.ground_height;
        let hi = (playable - self.pipe_gap - self.gap_margin).floor() as i32;
        (lo, hi)
    }

    pub fn validate(&self) -> Result<()> {
        let positive = [
            ("width", self.width),
            ("height", self.height),
            ("bird_size", self.bird_size),
            ("pipe_width", self.pipe_width),
            ("pipe_gap", self.pipe_gap),
            ("pipe_speed", self.pipe_speed),
        ];
        if let Some((name, value)) = positive.iter().find(|(_, v)| !(*v > 0.0)) {
            return Err(Error::config(format!("`{name}` is {value}, must be positive")));
        }
        let (lo, hi) = self.gap_top_range();
        if lo > hi {
            return Err(Error::config(format!(
                "a {} px gap with {} px margins does not fit above the ground",
                self.pipe_gap, self.gap_margin
            )));
        }
        Ok(())
    }

    fn ground(&self) -> Rect {
        Rect::new(
            0.0,
            self.height - self.ground_height,
            self.width,
            self.ground_height,
        )
    }
}

/// An axis-aligned rectangle
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub left: f32,
    pub top: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn new(left: f32, top: f32, width: f32, height: f32) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    pub fn right(&self) -> f32 {
        self.left + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.top + self.height
    }

    /// Whether the rectangles overlap with a positive area; touching edges do not count
    pub fn intersects(&self, other: &Rect) -> bool {
        self.width > 0.0
            && self.height > 0.0
            && other.width > 0.0
            && other.height > 0.0
            && self.left < other.right()
            && self.right() > other.left
            && self.top < other.bottom()
            && self.bottom() > other.top
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bird {
    pub x: f32,
    pub y: f32,
    pub velocity: f32,
}

impl Bird {
    fn new(config: &FlappyConfig) -> Self {
        Self {
            x: config.bird_x,
            y: (config.height / 2.0).trunc(),
            velocity: 0.0,
        }
    }

    /// Replace the current velocity with the jump velocity
    pub fn jump(&mut self, jump_velocity: f32) {
        self.velocity = jump_velocity;
    }

    /// Integrate one tick of gravity
    pub fn advance(&mut self, gravity: f32) {
        self.velocity += gravity;
        self.y += self.velocity;
    }

    /// Bounding box centred on the bird, snapped to whole pixels
    pub fn bounds(&self, size: f32) -> Rect {
        let half = size / 2.0;
        Rect::new(self.x.trunc() - half, self.y.trunc() - half, size, size)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pipe {
    pub x: f32,
    /// Height of the top segment, i.e. the top of the gap
    pub gap_top: f32,
    /// Set once the bird has flown past this pipe
    pub passed: bool,
}

impl Pipe {
    pub fn new(x: f32, gap_top: f32) -> Self {
        Self {
            x,
            gap_top,
            passed: false,
        }
    }

    pub fn top_rect(&self, config: &FlappyConfig) -> Rect {
        Rect::new(self.x, 0.0, config.pipe_width, self.gap_top)
    }

    pub fn bottom_rect(&self, config: &FlappyConfig) -> Rect {
        let top = self.gap_top + config.pipe_gap;
        Rect::new(self.x, top, config.pipe_width, config.height - top)
    }

    pub fn gap_center(&self, config: &FlappyConfig) -> f32 {
        self.gap_top + config.pipe_gap / 2.0
    }
}

/// Raw observation of the bird relative to the next pipe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Observation {
    /// Bird height minus the centre of the next gap; positive when the bird is below it
    pub vertical_offset: i32,
    /// Horizontal distance from the bird to the next pipe
    pub horizontal_distance: i32,
    pub velocity: i32,
}

impl From<Observation> for (i32, i32, i32) {
    fn from(obs: Observation) -> Self {
        (obs.vertical_offset, obs.horizontal_distance, obs.velocity)
    }
}

/// A side-scrolling flappy bird game
///
/// The bird falls under gravity and can jump; pipes scroll in from the right and every
/// pipe flown past scores a point. The episode ends when the bird leaves the field,
/// touches the ground, or hits a pipe.
///
/// All randomness (pipe gap heights) is drawn from the injected `rng`.
#[derive(Debug, Clone)]
pub struct FlappyBird<R = StdRng> {
    config: FlappyConfig,
    bird: Bird,
    pipes: Vec<Pipe>,
    score: u32,
    game_over: bool,
    rng: R,
    pub report: Report,
}

impl FlappyBird<StdRng> {
    /// A game whose pipe sequence is fully determined by `seed`
    pub fn seeded(config: FlappyConfig, seed: u64) -> Result<Self> {
        Self::new(config, StdRng::seed_from_u64(seed))
    }
}

impl<R: Rng> FlappyBird<R> {
    /// **Errors** if the configuration cannot fit a pipe gap inside the field
    pub fn new(config: FlappyConfig, rng: R) -> Result<Self> {
        config.validate()?;
        let mut game = Self {
            bird: Bird::new(&config),
            config,
            pipes: Vec::new(),
            score: 0,
            game_over: false,
            rng,
            report: Report::new(vec!["reward", "score", "steps"]),
        };
        game.spawn_pipe();
        Ok(game)
    }

    pub fn config(&self) -> &FlappyConfig {
        &self.config
    }

    pub fn bird(&self) -> &Bird {
        &self.bird
    }

    /// Live pipes in spawn order
    pub fn pipes(&self) -> &[Pipe] {
        &self.pipes
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    fn spawn_pipe(&mut self) {
        let (lo, hi) = self.config.gap_top_range();
        let gap_top = self.rng.gen_range(lo..=hi) as f32;
        self.pipes.push(Pipe::new(self.config.width, gap_top));
    }

    /// Move pipes, award points for pipes flown past, retire pipes that left the field
    ///
    /// **Returns** the number of points scored this tick
    fn advance_pipes(&mut self) -> u32 {
        let bird_x = self.bird.x;
        let mut scored = 0;
        for pipe in &mut self.pipes {
            pipe.x -= self.config.pipe_speed;
            if !pipe.passed && pipe.x < bird_x {
                pipe.passed = true;
                scored += 1;
            }
        }

        let pipe_width = self.config.pipe_width;
        self.pipes.retain(|p| p.x >= -pipe_width);

        let should_spawn = self
            .pipes
            .last()
            .map_or(true, |p| p.x < self.config.width - self.config.spawn_distance);
        if should_spawn {
            self.spawn_pipe();
        }

        scored
    }

    fn is_colliding(&self) -> bool {
        let config = &self.config;
        if self.bird.y < 0.0 || self.bird.y > config.height {
            return true;
        }

        let bounds = self.bird.bounds(config.bird_size);
        bounds.intersects(&config.ground())
            || self.pipes.iter().any(|p| {
                bounds.intersects(&p.top_rect(config)) || bounds.intersects(&p.bottom_rect(config))
            })
    }

    /// The first pipe, in spawn order, whose trailing edge is still ahead of the bird
    pub fn next_pipe(&self) -> Option<&Pipe> {
        self.pipes
            .iter()
            .find(|p| p.x + self.config.pipe_width > self.bird.x)
    }

    /// Observe the bird relative to the next pipe
    ///
    /// With no pipe ahead the vertical offset is `0` and the horizontal distance is the
    /// field width.
    pub fn get_state(&self) -> Observation {
        let (vertical_offset, horizontal_distance) = match self.next_pipe() {
            Some(pipe) => (
                self.bird.y - pipe.gap_center(&self.config),
                pipe.x - self.bird.x,
            ),
            None => (0.0, self.config.width),
        };

        Observation {
            vertical_offset: vertical_offset as i32,
            horizontal_distance: horizontal_distance as i32,
            velocity: self.bird.velocity as i32,
        }
    }

    /// Push the current frame to an external draw sink
    pub fn render<C: Canvas + ?Sized>(&self, canvas: &mut C) {
        canvas.clear();
        for pipe in &self.pipes {
            canvas.fill_rect(pipe.top_rect(&self.config), Sprite::Pipe);
            canvas.fill_rect(pipe.bottom_rect(&self.config), Sprite::Pipe);
        }
        canvas.fill_rect(self.config.ground(), Sprite::Ground);
        canvas.fill_rect(self.bird.bounds(self.config.bird_size), Sprite::Bird);
        canvas.draw_score(self.score);
        canvas.present();
    }

    fn transition(&self, reward: f32) -> Transition<Observation> {
        Transition {
            observation: self.get_state(),
            reward,
            terminal: self.game_over,
            score: self.score,
        }
    }
}

impl<R: Rng> Environment for FlappyBird<R> {
    type State = Observation;
    type Action = Action;

    fn is_active(&self) -> bool {
        !self.game_over
    }

    fn step(&mut self, action: Self::Action) -> Transition<Self::State> {
        let rewards = self.config.rewards;
        if self.game_over {
            return self.transition(rewards.crash);
        }

        if action == Action::Jump {
            self.bird.jump(self.config.jump_velocity);
        }
        self.bird.advance(self.config.gravity);

        let scored = self.advance_pipes();
        self.score += scored;
        self.game_over = self.is_colliding();

        let reward = if self.game_over {
            rewards.crash
        } else if scored > 0 {
            rewards.pipe_passed
        } else {
            rewards.alive
        };

        self.report.entry("steps").and_modify(|x| *x += 1.0);
        self.report.entry("score").and_modify(|x| *x += scored as f64);
        self.report.entry("reward").and_modify(|x| *x += reward as f64);

        self.transition(reward)
    }

    fn reset(&mut self) -> Self::State {
        self.bird = Bird::new(&self.config);
        self.pipes.clear();
        self.score = 0;
        self.game_over = false;
        self.spawn_pipe();
        self.get_state()
    }
}
