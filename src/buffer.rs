// {{{ Copyright (c) Paul R. Tagliamonte <paultag@debian.org>, 2024
//
// Permission is hereby granted, free of charge, to any person obtaining a copy
// of this software and associated documentation files (the "Software"), to deal
// in the Software without restriction, including without limitation the rights
// to use, copy, modify, merge, publish, distribute, sublicense, and/or sell
// copies of the Software, and to permit persons to whom the Software is
// furnished to do so, subject to the following conditions:
//
// The above copyright notice and this permission notice shall be included in
// all copies or substantial portions of the Software.
//
// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
// IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
// FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
// AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
// LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM,
// OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN
// THE SOFTWARE. }}}

//! A small growable byte buffer with the amortized-linear growth policy used
//! throughout `dpkg`'s C sources: rather than doubling, new capacity is
//! `old_capacity + used + 80`, a small additive floor on top of whatever's
//! already live. It's used as the staging area for control-record
//! serialization and for growing a `readlink(2)` target buffer until the
//! link fits (see [crate::unpack]).

/// Amortized-linear-growth byte buffer.
///
/// This is not a general purpose `Vec<u8>` replacement -- it exists to give
/// the serializer and the unpack engine one placed where "append some bytes,
/// maybe grow" happens so the growth policy lives in one spot.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct GrowableBuffer {
    data: Vec<u8>,
}

impl GrowableBuffer {
    /// Construct an empty [GrowableBuffer].
    pub fn new() -> Self {
        Self { data: Vec::new() }
    }

    /// Construct a [GrowableBuffer] with at least `capacity` bytes reserved.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            data: Vec::with_capacity(capacity),
        }
    }

    /// Number of bytes currently held.
    pub fn size(&self) -> usize {
        self.data.len()
    }

    /// Whether the buffer holds no bytes.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Reserve room for at least one more byte, using the amortized-linear
    /// growth policy: `new_capacity = old_capacity + used + 80`.
    fn grow_for(&mut self, additional: usize) {
        let used = self.data.len();
        let have = self.data.capacity() - used;
        if have >= additional {
            return;
        }
        let old_capacity = self.data.capacity();
        let target = old_capacity + used + 80;
        let need = used + additional;
        self.data.reserve(target.max(need) - used);
    }

    /// Append a single byte.
    pub fn append_byte(&mut self, byte: u8) {
        self.grow_for(1);
        self.data.push(byte);
    }

    /// Append a slice of bytes.
    pub fn append(&mut self, bytes: &[u8]) {
        self.grow_for(bytes.len());
        self.data.extend_from_slice(bytes);
    }

    /// Append a `&str`.
    pub fn append_str(&mut self, s: &str) {
        self.append(s.as_bytes());
    }

    /// Clear the buffer without releasing its capacity.
    pub fn reset(&mut self) {
        self.data.clear();
    }

    /// Borrow the buffer's contents.
    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    /// Consume the buffer, returning the underlying `Vec<u8>`.
    pub fn into_vec(self) -> Vec<u8> {
        self.data
    }

    /// Interpret the buffer's contents as UTF-8. Lossy on invalid sequences,
    /// since this is primarily used for path round-tripping.
    pub fn to_string_lossy(&self) -> std::borrow::Cow<'_, str> {
        String::from_utf8_lossy(&self.data)
    }
}

impl std::fmt::Write for GrowableBuffer {
    fn write_str(&mut self, s: &str) -> std::fmt::Result {
        self.append_str(s);
        Ok(())
    }
}


// vim: foldmethod=marker
