// Copyright (c) 2025 Felix Kahle.
//
// Permission is hereby granted, free of charge, to any person obtaining
// a copy of this software and associated documentation files (the
// "Software"), to deal in the Software without restriction, including
// without limitation the rights to use, copy, modify, merge, publish,
// distribute, sublicense, and/or sell copies of the Software, and to
// permit persons to whom the Software is furnished to do so, subject to
// the following conditions:
//
// The above copyright notice and this permission notice shall be
// included in all copies or substantial portions of the Software.
//
// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND,
// EXPRESS OR IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF
// MERCHANTABILITY, FITNESS FOR A PARTICULAR PURPOSE AND
// NONINFRINGEMENT. IN NO EVENT SHALL THE AUTHORS OR COPYRIGHT HOLDERS BE
// LIABLE FOR ANY CLAIM, DAMAGES OR OTHER LIABILITY, WHETHER IN AN ACTION
// OF CONTRACT, TORT OR OTHERWISE, ARISING FROM, OUT OF OR IN CONNECTION
// WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE SOFTWARE.

use linkmatch_model::index::CenterIndex;

/// A pending branch: put the device of the current level on `center`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Candidate<T> {
    pub center: CenterIndex,
    pub cost: T,
}

/// Pending candidates for every open tree level in one flat buffer.
///
/// `frames[k]` is the position in `entries` where level `k` starts. Entries
/// are popped LIFO, so each level is pushed most expensive first.
#[derive(Debug, Clone)]
pub(crate) struct SearchStack<T> {
    entries: Vec<Candidate<T>>,
    frames: Vec<usize>,
}

impl<T> Default for SearchStack<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> SearchStack<T> {
    #[inline]
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            frames: Vec::new(),
        }
    }

    #[inline]
    pub fn ensure_capacity(&mut self, num_devices: usize, num_centers: usize) {
        let entry_capacity = num_devices.saturating_mul(num_centers);
        self.entries
            .reserve(entry_capacity.saturating_sub(self.entries.len()));
        self.frames
            .reserve((num_devices + 1).saturating_sub(self.frames.len()));
    }

    #[inline]
    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    #[inline]
    pub fn push_frame(&mut self) {
        self.frames.push(self.entries.len());
    }

    #[inline]
    pub fn pop_frame(&mut self) -> Option<()> {
        let start = self.frames.pop()?;
        self.entries.truncate(start);
        Some(())
    }

    #[inline]
    pub fn extend<I>(&mut self, iter: I)
    where
        I: IntoIterator<Item = Candidate<T>>,
    {
        self.entries.extend(iter);
    }

    #[inline]
    pub fn pop(&mut self) -> Option<Candidate<T>> {
        if self.is_current_level_empty() {
            return None;
        }
        self.entries.pop()
    }

    /// Drops every remaining candidate of the current level.
    #[inline]
    pub fn clear_current_level(&mut self) {
        if let Some(&start) = self.frames.last() {
            self.entries.truncate(start);
        }
    }

    #[inline]
    pub fn is_current_level_empty(&self) -> bool {
        match self.frames.last() {
            Some(&start) => self.entries.len() == start,
            None => true,
        }
    }

    #[inline]
    pub fn reset(&mut self) {
        self.entries.clear();
        self.frames.clear();
    }
}

impl<T> std::fmt::Display for SearchStack<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "SearchStack(entries: {}, frames: {})",
            self.entries.len(),
            self.frames.len()
        )
    }
}
