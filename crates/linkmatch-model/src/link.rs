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

//! # Link Universe
//!
//! `LinkIndex` is the bidirectional map between link names and their stable
//! positions. Positions follow the order of the input list, so center tokens
//! written against that list stay aligned with it.
//!
//! A repeated name keeps the position of its first occurrence when looked up
//! by name. The repeated entry still occupies its own position in the
//! universe; it is not an error.

use crate::index::LinkId;
use rustc_hash::FxHashMap;

/// The default separator between the two endpoints of a link name.
pub const DEFAULT_LINK_DELIMITER: char = '.';

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LinkIndex {
    names: Vec<String>,
    positions: FxHashMap<String, LinkId>,
    num_duplicates: usize,
}

impl LinkIndex {
    /// Builds the index from an ordered list of link names in `O(L)`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use linkmatch_model::link::LinkIndex;
    /// let links = LinkIndex::new(["A.B", "B.A", "A.B"]);
    /// assert_eq!(links.len(), 3);
    /// assert_eq!(links.position("A.B").map(|l| l.get()), Some(0));
    /// assert_eq!(links.num_duplicates(), 1);
    /// ```
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let names: Vec<String> = names.into_iter().map(Into::into).collect();
        let mut positions =
            FxHashMap::with_capacity_and_hasher(names.len(), Default::default());
        let mut num_duplicates = 0;

        for (i, name) in names.iter().enumerate() {
            if positions.contains_key(name) {
                num_duplicates += 1;
                tracing::debug!(link = %name, position = i, "duplicate link name, keeping first occurrence");
                continue;
            }
            positions.insert(name.clone(), LinkId::new(i));
        }

        Self {
            names,
            positions,
            num_duplicates,
        }
    }

    /// Returns the size `L` of the link universe.
    #[inline]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Returns the number of names that collapsed onto an earlier occurrence.
    #[inline]
    pub fn num_duplicates(&self) -> usize {
        self.num_duplicates
    }

    /// Returns the position of `name`, or `None` if it is not in the universe.
    #[inline]
    pub fn position(&self, name: &str) -> Option<LinkId> {
        self.positions.get(name).copied()
    }

    /// Returns the name stored at `link`.
    ///
    /// # Panics
    ///
    /// Panics if `link` is not in `0..len()`.
    #[inline]
    pub fn name(&self, link: LinkId) -> &str {
        let index = link.get();
        assert!(
            index < self.len(),
            "called `LinkIndex::name` with link out of bounds: the len is {} but the index is {}",
            self.len(),
            index
        );

        &self.names[index]
    }

    /// Iterates over `(position, name)` pairs in universe order.
    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = (LinkId, &str)> + '_ {
        self.names
            .iter()
            .enumerate()
            .map(|(i, n)| (LinkId::new(i), n.as_str()))
    }

    /// Returns the link names in universe order.
    #[inline]
    pub fn names(&self) -> &[String] {
        &self.names
    }
}

impl std::fmt::Display for LinkIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "LinkIndex(len: {}, duplicates: {})",
            self.len(),
            self.num_duplicates
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_positions_follow_input_order() {
        let links = LinkIndex::new(["A.B", "C.D", "B.C"]);
        assert_eq!(links.len(), 3);
        assert_eq!(links.position("A.B"), Some(LinkId::new(0)));
        assert_eq!(links.position("C.D"), Some(LinkId::new(1)));
        assert_eq!(links.position("B.C"), Some(LinkId::new(2)));
        assert_eq!(links.name(LinkId::new(2)), "B.C");
    }

    #[test]
    fn test_duplicate_name_keeps_first_position() {
        let links = LinkIndex::new(vec!["A.B".to_string(), "C.D".into(), "A.B".into()]);
        assert_eq!(links.len(), 3);
        assert_eq!(links.num_duplicates(), 1);
        assert_eq!(links.position("A.B"), Some(LinkId::new(0)));
        // The repeated entry keeps its own slot so tokens remain aligned.
        assert_eq!(links.name(LinkId::new(2)), "A.B");
    }

    #[test]
    fn test_unknown_name_has_no_position() {
        let links = LinkIndex::new(["A.B"]);
        assert_eq!(links.position("B.A"), None);
    }

    #[test]
    fn test_empty_universe() {
        let links = LinkIndex::new(Vec::<String>::new());
        assert!(links.is_empty());
        assert_eq!(links.iter().count(), 0);
        assert_eq!(format!("{}", links), "LinkIndex(len: 0, duplicates: 0)");
    }

    #[test]
    fn test_iter_yields_every_slot() {
        let links = LinkIndex::new(["X.Y", "Y.X"]);
        let collected: Vec<(usize, &str)> = links.iter().map(|(l, n)| (l.get(), n)).collect();
        assert_eq!(collected, vec![(0, "X.Y"), (1, "Y.X")]);
    }

    #[test]
    #[should_panic(expected = "called `LinkIndex::name` with link out of bounds")]
    fn test_name_out_of_bounds_panics() {
        let links = LinkIndex::new(["A.B"]);
        let _ = links.name(LinkId::new(1));
    }
}
