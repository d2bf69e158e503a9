//! Skip-then-copy write cursor over a fixed destination buffer.
//!
//! A [`CopyCursor`] is handed a stream of logical bytes through any number of
//! [`write`](CopyCursor::write) calls. The first `to_skip` of them are dropped,
//! the next ones are copied into the destination until either the cursor's own
//! budget (`to_write`) or the destination itself runs out, and anything after
//! that is discarded. The destination length is the hard limit: no call pattern
//! can move the write position past it.
//!
//! This is what lets a producer that can only emit a payload from the start
//! (a serializer, for instance) fill an arbitrary window of that payload:
//!
//! ```rust
//! use core::fmt::Write;
//! use libiot_json::network::application::http::CopyCursor;
//!
//! let mut window = [0u8; 4];
//! let mut cursor = CopyCursor::new(&mut window, 6, 4);
//! write!(cursor, "{{\"temp\":21}}").unwrap();
//! assert_eq!(cursor.position(), 4);
//! assert_eq!(&window, b"\":21");
//! ```

use core::fmt;

/// A transient write cursor. Construct one per copy, drop it right after.
#[derive(Debug)]
pub struct CopyCursor<'a> {
    dest: &'a mut [u8],
    to_skip: usize,
    to_write: usize,
    position: usize,
    skipped: usize,
    discarded: usize,
}

impl<'a> CopyCursor<'a> {
    /// Cursor that drops the first `to_skip` bytes and then copies at most
    /// `to_write` bytes into `dest`. `dest.len()` bounds the copy regardless of
    /// `to_write`.
    pub fn new(dest: &'a mut [u8], to_skip: usize, to_write: usize) -> Self {
        Self {
            dest,
            to_skip,
            to_write,
            position: 0,
            skipped: 0,
            discarded: 0,
        }
    }

    /// Cursor that copies from the first byte until `dest` is full.
    pub fn filling(dest: &'a mut [u8]) -> Self {
        let len = dest.len();
        Self::new(dest, 0, len)
    }

    /// Present a single byte. Returns 1 if it was skipped or copied, 0 if it was discarded.
    pub fn write_byte(&mut self, byte: u8) -> usize {
        self.write(&[byte])
    }

    /// Present `bytes`. Returns how many were consumed, skipped plus copied.
    /// Bytes past the budget or the limit are discarded and not counted.
    pub fn write(&mut self, bytes: &[u8]) -> usize {
        let skip = self.to_skip.min(bytes.len());
        self.to_skip -= skip;
        self.skipped += skip;

        let rest = &bytes[skip..];
        let copy = self.remaining().min(rest.len());
        self.dest[self.position..self.position + copy].copy_from_slice(&rest[..copy]);
        self.position += copy;
        self.to_write -= copy;
        self.discarded += rest.len() - copy;

        skip + copy
    }

    /// Bytes copied into the destination so far.
    pub fn position(&self) -> usize {
        self.position
    }

    /// Hard ceiling on [`position`](Self::position): the destination length.
    pub fn limit(&self) -> usize {
        self.dest.len()
    }

    /// Bytes that can still be copied before the budget or the limit is hit.
    pub fn remaining(&self) -> usize {
        self.to_write.min(self.limit() - self.position)
    }

    /// Bytes still to be skipped before copying starts.
    pub fn pending_skip(&self) -> usize {
        self.to_skip
    }

    /// Bytes dropped by the skip phase so far.
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    /// Bytes presented after the cursor filled up.
    pub fn discarded(&self) -> usize {
        self.discarded
    }

    /// `true` once nothing more can be copied.
    pub fn is_full(&self) -> bool {
        self.remaining() == 0
    }
}

impl fmt::Write for CopyCursor<'_> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.write(s.as_bytes());
        Ok(())
    }
}
