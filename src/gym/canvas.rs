use super::flappy_bird::Rect;

/// What a filled rectangle depicts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Sprite {
    Bird,
    Pipe,
    Ground,
}

/// A draw sink for a rendering frontend
///
/// The simulation never depends on how (or whether) frames are shown; a frontend
/// implements this trait and passes itself to [`FlappyBird::render`](super::FlappyBird::render).
pub trait Canvas {
    /// Start a new frame
    fn clear(&mut self);

    fn fill_rect(&mut self, rect: Rect, sprite: Sprite);

    fn draw_score(&mut self, score: u32);

    /// Finish the frame
    fn present(&mut self);
}
