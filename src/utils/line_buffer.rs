use memchr::memchr;

/// Reassembles newline-delimited text from arbitrarily split byte chunks.
///
/// Blank lines are skipped and a trailing `\r` is removed. Lines that are not
/// valid UTF-8 are dropped.
#[derive(Default)]
pub struct SseLineBuffer {
    buffer: Vec<u8>,
}

impl SseLineBuffer {
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.buffer.extend_from_slice(chunk);
        self.drain_lines(false)
    }

    /// Flushes any unterminated final line once the stream has ended.
    pub fn finish(&mut self) -> Vec<String> {
        self.drain_lines(true)
    }

    fn drain_lines(&mut self, flush: bool) -> Vec<String> {
        let mut lines = Vec::new();
        let mut search_index = 0;

        while let Some(relative_pos) = memchr(b'\n', &self.buffer[search_index..]) {
            let newline_index = search_index + relative_pos;
            push_line(&mut lines, &self.buffer[search_index..newline_index]);
            search_index = newline_index + 1;
        }

        if flush {
            push_line(&mut lines, &self.buffer[search_index..]);
            self.buffer.clear();
        } else if search_index > 0 {
            self.buffer.drain(..search_index);
        }

        lines
    }
}

fn push_line(lines: &mut Vec<String>, raw: &[u8]) {
    let raw = raw.strip_suffix(b"\r").unwrap_or(raw);
    if raw.is_empty() {
        return;
    }
    if let Ok(text) = std::str::from_utf8(raw) {
        if !text.trim().is_empty() {
            lines.push(text.to_string());
        }
    }
}
