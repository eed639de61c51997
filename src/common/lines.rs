//! Incremental splitter for newline-delimited byte streams.

/// Buffers bytes until a full `\n`-terminated line is available.
///
/// Works on bytes so a multi-byte character split across two chunks is
/// decoded only once both halves have arrived.
#[derive(Debug, Default)]
pub struct LineBuffer {
    buf: Vec<u8>,
}

impl LineBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a chunk and take every line it completed, without the terminator.
    pub fn feed(
        &mut self,
        chunk: &[u8],
    ) -> Vec<String> {
        self.buf.extend_from_slice(chunk);

        let mut lines = Vec::new();
        while let Some(pos) = self.buf.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.buf.drain(..=pos).collect();
            lines.push(decode(&line[..line.len() - 1]));
        }
        lines
    }

    /// Take whatever is left once the stream has ended.
    pub fn finish(&mut self) -> Option<String> {
        let rest = std::mem::take(&mut self.buf);
        let line = decode(&rest);
        if line.trim().is_empty() { None } else { Some(line) }
    }
}

fn decode(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).trim_end_matches('\r').to_string()
}
