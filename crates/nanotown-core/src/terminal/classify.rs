//! Output classification for the output pump.
//!
//! Escape sequences never count as output. A CSI sequence (`ESC [`) runs to
//! its final byte in 0x40..=0x7E. An OSC sequence (`ESC ]`) runs to BEL or
//! to the string terminator `ESC \`. Any other escape runs to the next byte
//! in 0x40..=0x7E. Classification is per chunk; a sequence split across two
//! reads is classified independently in each.

const ESC: u8 = 0x1B;
const BEL: u8 = 0x07;
const DEL: u8 = 0x7F;

/// Longest trailing line kept in a session record, in characters.
pub const MAX_LINE_CHARS: usize = 120;

#[derive(Clone, Copy, PartialEq, Eq)]
enum Scan {
    Text,
    Escape,
    Csi,
    Osc,
    OscEscape,
}

fn is_final_byte(byte: u8) -> bool {
    (0x40..=0x7E).contains(&byte)
}

/// Bytes of `data` that lie outside escape sequences.
fn visible_bytes(data: &[u8]) -> impl Iterator<Item = u8> + '_ {
    let mut state = Scan::Text;
    data.iter().copied().filter(move |&byte| {
        let (next, visible) = match (state, byte) {
            (Scan::Text, ESC) => (Scan::Escape, false),
            (Scan::Text, _) => (Scan::Text, true),
            (Scan::Escape, b'[') => (Scan::Csi, false),
            (Scan::Escape, b']') => (Scan::Osc, false),
            (Scan::Escape, b) if is_final_byte(b) => (Scan::Text, false),
            (Scan::Escape, _) => (Scan::Escape, false),
            (Scan::Csi, b) if is_final_byte(b) => (Scan::Text, false),
            (Scan::Csi, _) => (Scan::Csi, false),
            (Scan::Osc, BEL) => (Scan::Text, false),
            (Scan::Osc, ESC) => (Scan::OscEscape, false),
            (Scan::Osc, _) => (Scan::Osc, false),
            (Scan::OscEscape, b'\\') => (Scan::Text, false),
            (Scan::OscEscape, _) => (Scan::Osc, false),
        };
        state = next;
        visible
    })
}

/// True when any byte outside escape sequences is printable.
pub fn has_printable_content(data: &[u8]) -> bool {
    visible_bytes(data).any(|byte| byte >= 0x20 && byte != DEL)
}

/// Remove escape sequences and carriage returns.
pub fn strip_ansi(data: &[u8]) -> String {
    let bytes: Vec<u8> = visible_bytes(data).filter(|&byte| byte != b'\r').collect();
    String::from_utf8_lossy(&bytes).into_owned()
}

/// Last non-blank line of a chunk, trimmed and capped at [`MAX_LINE_CHARS`].
pub fn extract_last_line(data: &[u8]) -> Option<String> {
    let cleaned = strip_ansi(data);
    cleaned
        .split('\n')
        .rev()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .map(|line| line.chars().take(MAX_LINE_CHARS).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_last_line_skips_colors_and_trailing_newline() {
        let chunk = b"\x1b[32mHello\x1b[0m\nWorld\n";
        assert_eq!(extract_last_line(chunk).as_deref(), Some("World"));
    }

    #[test]
    fn test_escape_only_chunk_has_no_printable_content() {
        assert!(!has_printable_content(b"\x1b[2J\x1b[H\x1b[?25l"));
        assert!(!has_printable_content(b"\x1b]0;title\x07"));
        assert!(!has_printable_content(b"\r\n\x7f"));
        assert!(has_printable_content(b"\x1b[1mx"));
    }

    #[test]
    fn test_osc_title_terminated_by_bel() {
        assert_eq!(strip_ansi(b"\x1b]0;[nt-1] fix\x07$ "), "$ ");
    }

    #[test]
    fn test_osc_terminated_by_string_terminator() {
        assert_eq!(strip_ansi(b"\x1b]2;build\x1b\\ok"), "ok");
        assert!(!has_printable_content(b"\x1b]0;title\x1b\\"));
    }

    #[test]
    fn test_csi_parameters_are_not_visible() {
        assert_eq!(strip_ansi(b"\x1b[38;5;208mwarn\x1b[0m"), "warn");
        assert_eq!(strip_ansi(b"\x1b(Bplain"), "plain");
    }

    #[test]
    fn test_strip_ansi_removes_carriage_returns() {
        assert_eq!(strip_ansi(b"progress 10%\rprogress 20%\r\n"), "progress 10%progress 20%\n");
    }

    #[test]
    fn test_strip_ansi_is_idempotent() {
        let once = strip_ansi(b"\x1b[31mred\x1b[0m plain\r\nnext");
        let twice = strip_ansi(once.as_bytes());
        assert_eq!(once, twice);
    }

    #[test]
    fn test_blank_chunk_extracts_nothing() {
        assert_eq!(extract_last_line(b"\x1b[0m\n   \n\r\n"), None);
    }

    #[test]
    fn test_long_line_truncated() {
        let long = "x".repeat(300);
        let line = extract_last_line(long.as_bytes()).unwrap();
        assert_eq!(line.chars().count(), MAX_LINE_CHARS);
    }

    #[test]
    fn test_truncation_respects_char_boundaries() {
        let long = "é".repeat(200);
        let line = extract_last_line(long.as_bytes()).unwrap();
        assert_eq!(line.chars().count(), MAX_LINE_CHARS);
    }
}
