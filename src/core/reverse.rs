// LogRetrieval - core/reverse.rs
//
// Backward chunked line reader: yields the lines of a seekable byte source
// from last to first while holding at most one chunk of the source (plus the
// line currently being assembled) in memory.
//
// State machine:
//   - `pos`         file offset below which nothing has been read yet
//   - `buf`         the current window, `[pos, pos + len)` of the source
//   - `window_end`  how much of the window is still unscanned; lines are cut
//                   from its right-hand end, newest first
//   - `carry`       bytes of a line whose start lies further back in the file
//                   than the current window; completed when the preceding
//                   `\n` is found, or flushed as the first line at offset 0
//
// Lines are split on raw `\n` bytes *before* decoding, so a chunk boundary
// that falls inside a multi-byte UTF-8 sequence or a `\r\n` pair never
// corrupts a line. Each completed line is decoded lossily: invalid UTF-8 is
// replaced, never reported as an error.
//
// A single trailing `\n` at end of file terminates the last line rather than
// starting an empty one. A trailing `\r` before `\n` is stripped.

use std::io::{self, Read, Seek, SeekFrom};

/// Bytes of a partially assembled line, accumulated right to left.
///
/// Fragments are stored in the order they were discovered (newest window
/// first) and reversed on completion, so assembling a line that spans many
/// windows costs one copy per byte instead of one per window.
#[derive(Debug, Default)]
struct Carry {
    fragments: Vec<Vec<u8>>,
    len: usize,
}

impl Carry {
    /// Record `bytes` as the part of the line preceding everything held so far.
    fn prepend(&mut self, bytes: &[u8]) {
        if bytes.is_empty() {
            return;
        }
        self.len += bytes.len();
        self.fragments.push(bytes.to_vec());
    }

    /// Finish the line: `head` is its first segment. Leaves the carry empty.
    fn complete(&mut self, head: &[u8]) -> Vec<u8> {
        let mut line = Vec::with_capacity(head.len() + self.len);
        line.extend_from_slice(head);
        for fragment in self.fragments.drain(..).rev() {
            line.extend_from_slice(&fragment);
        }
        self.len = 0;
        line
    }
}

/// Iterator over the lines of `R`, most recent (last) line first.
///
/// Construction seeks to the end of the source to learn its size; nothing
/// else is read until the first call to `next`. Dropping the iterator early
/// stops the scan: callers that only need the last few lines of a large file
/// never touch its beginning.
#[derive(Debug)]
pub struct ReverseLines<R> {
    reader: R,
    chunk_size: usize,
    buf: Vec<u8>,
    window_end: Option<usize>,
    pos: u64,
    size: u64,
    carry: Carry,
    bytes_read: u64,
    finished: bool,
}

impl<R: Read + Seek> ReverseLines<R> {
    /// Wrap `reader`, scanning backwards `chunk_size` bytes at a time.
    ///
    /// A `chunk_size` of zero is treated as one.
    pub fn new(mut reader: R, chunk_size: usize) -> io::Result<Self> {
        let chunk_size = chunk_size.max(1);
        let size = reader.seek(SeekFrom::End(0))?;

        // Small sources never need a full-sized window.
        let buf_len = usize::try_from(size).map_or(chunk_size, |s| s.min(chunk_size));

        Ok(Self {
            reader,
            chunk_size,
            buf: vec![0u8; buf_len],
            window_end: None,
            pos: size,
            size,
            carry: Carry::default(),
            bytes_read: 0,
            finished: false,
        })
    }

    /// Total size of the source in bytes, as observed at construction.
    pub fn source_len(&self) -> u64 {
        self.size
    }

    /// Number of bytes read from the source so far.
    pub fn bytes_read(&self) -> u64 {
        self.bytes_read
    }

    /// Step the window one chunk further back and read it into `buf`.
    fn load_window(&mut self) -> io::Result<()> {
        let start = self.pos.saturating_sub(self.chunk_size as u64);
        // Bounded by chunk_size, so the cast cannot truncate.
        let len = (self.pos - start) as usize;

        self.reader.seek(SeekFrom::Start(start))?;
        self.reader.read_exact(&mut self.buf[..len])?;

        let mut end = len;
        if self.pos == self.size && self.buf[len - 1] == b'\n' {
            // Terminator of the last line, not the start of an empty one.
            end -= 1;
        }

        self.bytes_read += len as u64;
        self.pos = start;
        self.window_end = Some(end);
        Ok(())
    }
}

impl<R: Read + Seek> Iterator for ReverseLines<R> {
    type Item = io::Result<String>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        loop {
            if let Some(end) = self.window_end {
                let window = &self.buf[..end];
                if let Some(nl) = window.iter().rposition(|&b| b == b'\n') {
                    let line = self.carry.complete(&window[nl + 1..]);
                    self.window_end = Some(nl);
                    return Some(Ok(decode_line(&line)));
                }
                // Whatever is left starts further back than this window.
                self.carry.prepend(window);
                self.window_end = None;
            }

            if self.pos == 0 {
                self.finished = true;
                if self.size == 0 {
                    return None;
                }
                let first = self.carry.complete(&[]);
                return Some(Ok(decode_line(&first)));
            }

            if let Err(e) = self.load_window() {
                self.finished = true;
                return Some(Err(e));
            }
        }
    }
}

/// Strip a trailing `\r` and decode lossily.
fn decode_line(bytes: &[u8]) -> String {
    let bytes = bytes.strip_suffix(b"\r").unwrap_or(bytes);
    String::from_utf8_lossy(bytes).into_owned()
}
