/// Braille spinner frames.
pub const FRAMES: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

/// Wall-clock driven spinner. Every spinner drawn in the same frame shows
/// the same glyph without sharing a counter.
#[derive(Debug, Clone, Copy)]
pub struct Spinner {
    frames: &'static [&'static str],
    interval_ms: u64,
}

impl Spinner {
    pub fn new(interval_ms: u64) -> Self {
        Self {
            frames: FRAMES,
            interval_ms: interval_ms.max(1),
        }
    }

    pub fn frame_at(&self, epoch_ms: i64) -> &'static str {
        let step = epoch_ms.max(0) as u64 / self.interval_ms;
        self.frames[(step % self.frames.len() as u64) as usize]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_from_wall_clock() {
        let spinner = Spinner::new(80);
        assert_eq!(spinner.frame_at(0), "⠋");
        assert_eq!(spinner.frame_at(79), "⠋");
        assert_eq!(spinner.frame_at(80), "⠙");
        assert_eq!(spinner.frame_at(80 * 10), "⠋");
        assert_eq!(spinner.frame_at(80 * 13 + 5), "⠸");
    }
}
