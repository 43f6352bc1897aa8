pub mod canvas;
pub mod flappy_bird;

pub use canvas::{Canvas, Sprite};
pub use flappy_bird::{Action, Bird, FlappyBird, FlappyConfig, Observation, Pipe, Rect, Rewards};
