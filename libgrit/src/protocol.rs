use crate::error::{GritError, GritResult};

/// a line is `<4 hex length><payload>` where length includes the four
/// length bytes themselves; length `0000` is the flush packet (§4.E).
pub const FLUSH_PKT: &[u8] = b"0000";

/// `extract_lines`: iteratively reads the 4-hex length, slices the
/// payload, and advances; a flush packet contributes an empty payload.
/// Parses until the buffer is exhausted, with no arbitrary iteration cap.
pub fn extract_lines(bytes: &[u8]) -> GritResult<Vec<Vec<u8>>> {
    let mut lines = vec![];
    let mut i = 0;
    while i < bytes.len() {
        if i + 4 > bytes.len() {
            return Err(GritError::ProtocolViolation(
                "truncated pkt-line length header".to_owned(),
            ));
        }
        let len_hex = std::str::from_utf8(&bytes[i..i + 4]).map_err(|e| anyhow!(e))?;
        let len = usize::from_str_radix(len_hex, 16)
            .map_err(|_| GritError::ProtocolViolation(format!("invalid pkt-line length `{}`", len_hex)))?;
        if len == 0 {
            lines.push(vec![]);
            i += 4;
            continue;
        }
        if i + len > bytes.len() {
            return Err(GritError::ProtocolViolation("pkt-line length exceeds buffer".to_owned()));
        }
        lines.push(bytes[i + 4..i + len].to_vec());
        i += len;
    }
    Ok(lines)
}

/// `build_lines_data`: frames each line as `<4 hex (len+5)><line>\n`,
/// terminated by a flush packet.
pub fn build_lines_data(lines: &[impl AsRef<[u8]>]) -> Vec<u8> {
    let mut out = vec![];
    for line in lines {
        let line = line.as_ref();
        out.extend_from_slice(format!("{:04x}", line.len() + 5).as_bytes());
        out.extend_from_slice(line);
        out.push(b'\n');
    }
    out.extend_from_slice(FLUSH_PKT);
    out
}
