use std::fmt::Write;

/// Formats `data` as rows of 16 hex bytes with an offset column and a
/// column of printable characters.
pub fn hex_dump(data: &[u8]) -> String {
    let mut out = String::new();
    for (row, line) in data.chunks(16).enumerate() {
        let _ = write!(out, "{:04x}: ", row * 16);
        for (j, b) in line.iter().enumerate() {
            let _ = write!(out, "{:02x} ", b);
            if j == 7 {
                out.push(' ');
            }
        }
        for j in line.len()..16 {
            out.push_str("   ");
            if j == 7 {
                out.push(' ');
            }
        }
        out.push_str("| ");
        for &b in line {
            if b.is_ascii_alphanumeric() || b == b'-' || b == b'_' {
                out.push(b as char);
            } else {
                out.push('.');
            }
        }
        out.push('\n');
    }
    out
}
