//! In-place redraw of a multi-line frame on an ANSI terminal.

use std::io::{self, Write};

const HIDE_CURSOR: &str = "\x1b[?25l";
const SHOW_CURSOR: &str = "\x1b[?25h";
const CLEAR_LINE: &str = "\x1b[K";

/// Redraws over the previous frame instead of scrolling. Lines left over
/// from a taller previous frame are blanked.
pub struct FrameWriter<W: Write> {
    out: W,
    prev_lines: usize,
}

impl<W: Write> FrameWriter<W> {
    pub fn new(out: W) -> Self {
        Self { out, prev_lines: 0 }
    }

    pub fn draw(&mut self, lines: &[String]) -> io::Result<()> {
        let mut buf = String::new();
        if self.prev_lines > 0 {
            buf.push_str(&format!("\x1b[{}A\r", self.prev_lines));
        }
        for (i, line) in lines.iter().enumerate() {
            if i > 0 {
                buf.push('\n');
            }
            buf.push_str(line);
            buf.push_str(CLEAR_LINE);
        }
        for _ in lines.len()..self.prev_lines {
            buf.push('\n');
            buf.push_str(CLEAR_LINE);
        }
        buf.push('\n');

        self.out.write_all(buf.as_bytes())?;
        self.out.flush()?;
        self.prev_lines = lines.len().max(self.prev_lines);
        Ok(())
    }

    pub fn get_mut(&mut self) -> &mut W {
        &mut self.out
    }
}

/// Hides the cursor for its lifetime.
pub struct CursorGuard<W: Write> {
    out: W,
}

impl<W: Write> CursorGuard<W> {
    pub fn hide(mut out: W) -> io::Result<Self> {
        out.write_all(HIDE_CURSOR.as_bytes())?;
        out.flush()?;
        Ok(Self { out })
    }
}

impl<W: Write> Drop for CursorGuard<W> {
    fn drop(&mut self) {
        let _ = self.out.write_all(SHOW_CURSOR.as_bytes());
        let _ = self.out.flush();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn output(writer: &mut FrameWriter<Vec<u8>>) -> String {
        let text = String::from_utf8(writer.get_mut().clone()).unwrap();
        writer.get_mut().clear();
        text
    }

    #[test]
    fn test_first_frame_has_no_cursor_up() {
        let mut writer = FrameWriter::new(Vec::new());
        writer.draw(&lines(&["a", "b"])).unwrap();
        assert_eq!(output(&mut writer), "a\x1b[K\nb\x1b[K\n");
    }

    #[test]
    fn test_redraw_moves_up_and_overwrites() {
        let mut writer = FrameWriter::new(Vec::new());
        writer.draw(&lines(&["a", "b"])).unwrap();
        output(&mut writer);

        writer.draw(&lines(&["c", "d"])).unwrap();
        assert_eq!(output(&mut writer), "\x1b[2A\rc\x1b[K\nd\x1b[K\n");
    }

    #[test]
    fn test_shorter_frame_blanks_leftover_lines() {
        let mut writer = FrameWriter::new(Vec::new());
        writer.draw(&lines(&["a", "b", "c"])).unwrap();
        output(&mut writer);

        writer.draw(&lines(&["x"])).unwrap();
        assert_eq!(output(&mut writer), "\x1b[3A\rx\x1b[K\n\x1b[K\n\x1b[K\n");

        // The blanked lines are still on screen, so the next redraw climbs over them.
        writer.draw(&lines(&["y"])).unwrap();
        assert!(output(&mut writer).starts_with("\x1b[3A\r"));
    }

    #[test]
    fn test_cursor_guard_restores() {
        let mut buf = Vec::new();
        {
            let _guard = CursorGuard::hide(&mut buf).unwrap();
        }
        assert_eq!(String::from_utf8(buf).unwrap(), "\x1b[?25l\x1b[?25h");
    }
}
