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

//! # Link Signatures
//!
//! Devices and cluster centers are both compared through the set of link
//! positions they touch. A device's set is derived from the link names
//! (`SignatureExtractor::device_links`), a center's set from its 0/1 token
//! (`SignatureExtractor::center_links`).
//!
//! ## Matching policy
//!
//! By default a device touches every link whose name *contains* the device
//! identifier (`MatchPolicy::Substring`). This over-counts when one identifier
//! is a substring of another (`E1` inside `E10.E2`). `MatchPolicy::Endpoint`
//! splits each link name on the delimiter and compares whole endpoints
//! instead.

use crate::{
    error::MatchError,
    index::{CenterIndex, LinkId},
    link::{DEFAULT_LINK_DELIMITER, LinkIndex},
};
use fixedbitset::FixedBitSet;

/// A set of link positions over a universe of fixed size.
#[derive(Clone, PartialEq, Eq, Hash, Default)]
pub struct LinkSet {
    bits: FixedBitSet,
}

impl LinkSet {
    /// Creates an empty set over a universe of `num_links` links.
    #[inline]
    pub fn empty(num_links: usize) -> Self {
        Self {
            bits: FixedBitSet::with_capacity(num_links),
        }
    }

    /// Creates a set over `num_links` links holding the given positions.
    ///
    /// # Panics
    ///
    /// Panics if a position is not in `0..num_links`.
    pub fn from_links<I>(num_links: usize, links: I) -> Self
    where
        I: IntoIterator<Item = LinkId>,
    {
        let mut set = Self::empty(num_links);
        for link in links {
            set.insert(link);
        }
        set
    }

    /// Adds `link` to the set.
    ///
    /// # Panics
    ///
    /// Panics if `link` is outside the universe.
    #[inline]
    pub fn insert(&mut self, link: LinkId) {
        let index = link.get();
        assert!(
            index < self.bits.len(),
            "called `LinkSet::insert` with link out of bounds: the len is {} but the index is {}",
            self.bits.len(),
            index
        );
        self.bits.insert(index);
    }

    #[inline]
    pub fn contains(&self, link: LinkId) -> bool {
        self.bits.contains(link.get())
    }

    /// Returns the number of links in the set.
    #[inline]
    pub fn len(&self) -> usize {
        self.bits.count_ones(..)
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bits.is_clear()
    }

    /// Returns the size of the universe this set lives in.
    #[inline]
    pub fn universe_len(&self) -> usize {
        self.bits.len()
    }

    /// Returns `|self Δ other|`.
    #[inline]
    pub fn symmetric_difference_len(&self, other: &LinkSet) -> usize {
        self.bits.symmetric_difference(&other.bits).count()
    }

    /// Iterates over the member positions in ascending order.
    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = LinkId> + '_ {
        self.bits.ones().map(LinkId::new)
    }
}

impl std::fmt::Debug for LinkSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_set().entries(self.bits.ones()).finish()
    }
}

impl std::fmt::Display for LinkSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let members = self
            .bits
            .ones()
            .map(|i| i.to_string())
            .collect::<Vec<_>>()
            .join(", ");
        write!(f, "{{{}}}", members)
    }
}

/// A cluster center signature: one entry per link, `1` meaning present.
/// Any other value counts as absent.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Default)]
pub struct CenterToken {
    entries: Vec<u8>,
}

impl CenterToken {
    #[inline]
    pub fn new(entries: Vec<u8>) -> Self {
        Self { entries }
    }

    /// Builds a token over `links` with a `1` at every named link.
    ///
    /// # Errors
    ///
    /// Returns `MatchError::UnknownLink` if a name is not in the universe.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use linkmatch_model::link::LinkIndex;
    /// # use linkmatch_model::signature::CenterToken;
    /// let links = LinkIndex::new(["A.B", "B.C", "C.D"]);
    /// let token = CenterToken::from_active_links(&links, ["C.D", "A.B"]).unwrap();
    /// assert_eq!(token.entries(), &[1, 0, 1]);
    /// ```
    pub fn from_active_links<I, S>(links: &LinkIndex, active: I) -> Result<Self, MatchError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut entries = vec![0u8; links.len()];
        for name in active {
            let name = name.as_ref();
            let link = links.position(name).ok_or_else(|| MatchError::UnknownLink {
                name: name.to_string(),
            })?;
            entries[link.get()] = 1;
        }
        Ok(Self { entries })
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[inline]
    pub fn entries(&self) -> &[u8] {
        &self.entries
    }
}

impl From<Vec<u8>> for CenterToken {
    fn from(entries: Vec<u8>) -> Self {
        Self::new(entries)
    }
}

impl<const N: usize> From<[u8; N]> for CenterToken {
    fn from(entries: [u8; N]) -> Self {
        Self::new(entries.to_vec())
    }
}

impl std::fmt::Display for CenterToken {
    // Rendered as a tuple: `(1, 0, 1)`, `(1,)`, `()`.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.entries.as_slice() {
            [] => write!(f, "()"),
            [single] => write!(f, "({},)", single),
            entries => {
                let body = entries
                    .iter()
                    .map(|e| e.to_string())
                    .collect::<Vec<_>>()
                    .join(", ");
                write!(f, "({})", body)
            }
        }
    }
}

/// How a device identifier is matched against link names.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum MatchPolicy {
    /// The link name contains the identifier anywhere.
    #[default]
    Substring,
    /// One of the delimiter-separated endpoints equals the identifier.
    Endpoint { delimiter: char },
}

impl MatchPolicy {
    /// Endpoint matching on the default `.` delimiter.
    #[inline]
    pub const fn endpoint() -> Self {
        MatchPolicy::Endpoint {
            delimiter: DEFAULT_LINK_DELIMITER,
        }
    }

    #[inline]
    pub fn matches(&self, link_name: &str, device: &str) -> bool {
        match *self {
            MatchPolicy::Substring => link_name.contains(device),
            MatchPolicy::Endpoint { delimiter } => {
                link_name.split(delimiter).any(|endpoint| endpoint == device)
            }
        }
    }
}

impl std::fmt::Display for MatchPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MatchPolicy::Substring => write!(f, "Substring"),
            MatchPolicy::Endpoint { delimiter } => write!(f, "Endpoint('{}')", delimiter),
        }
    }
}

/// Derives link sets for devices and center tokens over one link universe.
#[derive(Clone, Copy, Debug)]
pub struct SignatureExtractor<'a> {
    links: &'a LinkIndex,
    policy: MatchPolicy,
}

impl<'a> SignatureExtractor<'a> {
    #[inline]
    pub fn new(links: &'a LinkIndex) -> Self {
        Self {
            links,
            policy: MatchPolicy::default(),
        }
    }

    #[inline]
    pub fn with_policy(links: &'a LinkIndex, policy: MatchPolicy) -> Self {
        Self { links, policy }
    }

    #[inline]
    pub fn links(&self) -> &'a LinkIndex {
        self.links
    }

    #[inline]
    pub fn policy(&self) -> MatchPolicy {
        self.policy
    }

    /// Returns the positions of every link matching `device`, in `O(L)`.
    pub fn device_links(&self, device: &str) -> LinkSet {
        let mut set = LinkSet::empty(self.links.len());
        for (link, name) in self.links.iter() {
            if self.policy.matches(name, device) {
                set.insert(link);
            }
        }
        set
    }

    /// Returns the positions where `token` holds a `1`.
    ///
    /// # Errors
    ///
    /// Returns `MatchError::MalformedToken` if the token length differs from
    /// the size of the link universe. The token is never truncated or padded.
    pub fn center_links(
        &self,
        center: CenterIndex,
        token: &CenterToken,
    ) -> Result<LinkSet, MatchError> {
        if token.len() != self.links.len() {
            return Err(MatchError::MalformedToken {
                center,
                expected: self.links.len(),
                actual: token.len(),
            });
        }

        let mut set = LinkSet::empty(self.links.len());
        for (i, &entry) in token.entries().iter().enumerate() {
            if entry == 1 {
                set.insert(LinkId::new(i));
            }
        }
        Ok(set)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(set: &LinkSet) -> Vec<usize> {
        set.iter().map(|l| l.get()).collect()
    }

    #[test]
    fn test_device_links_substring_matches_both_directions() {
        let links = LinkIndex::new(["A.B", "B.A"]);
        let ex = SignatureExtractor::new(&links);
        assert_eq!(ids(&ex.device_links("A")), vec![0, 1]);
        assert_eq!(ids(&ex.device_links("B")), vec![0, 1]);
        assert!(ex.device_links("Z").is_empty());
    }

    #[test]
    fn test_substring_policy_over_counts_prefix_identifiers() {
        let links = LinkIndex::new(["E1.E2", "E10.E2"]);
        let ex = SignatureExtractor::new(&links);
        assert_eq!(ids(&ex.device_links("E1")), vec![0, 1]);
    }

    #[test]
    fn test_endpoint_policy_compares_whole_endpoints() {
        let links = LinkIndex::new(["E1.E2", "E10.E2"]);
        let ex = SignatureExtractor::with_policy(&links, MatchPolicy::endpoint());
        assert_eq!(ids(&ex.device_links("E1")), vec![0]);
        assert_eq!(ids(&ex.device_links("E10")), vec![1]);
        assert_eq!(ids(&ex.device_links("E2")), vec![0, 1]);
    }

    #[test]
    fn test_endpoint_policy_custom_delimiter() {
        let links = LinkIndex::new(["a-b", "b-c"]);
        let ex = SignatureExtractor::with_policy(&links, MatchPolicy::Endpoint { delimiter: '-' });
        assert_eq!(ids(&ex.device_links("b")), vec![0, 1]);
        assert_eq!(ids(&ex.device_links("a")), vec![0]);
    }

    #[test]
    fn test_center_links_reads_ones_only() {
        let links = LinkIndex::new(["A.B", "C.D", "E.F"]);
        let ex = SignatureExtractor::new(&links);
        let set = ex
            .center_links(CenterIndex::new(0), &CenterToken::from([1, 2, 1]))
            .unwrap();
        assert_eq!(ids(&set), vec![0, 2]);
    }

    #[test]
    fn test_center_links_rejects_wrong_length() {
        let links = LinkIndex::new(["A.B", "C.D"]);
        let ex = SignatureExtractor::new(&links);
        let err = ex
            .center_links(CenterIndex::new(4), &CenterToken::from([1, 0, 1]))
            .unwrap_err();
        assert_eq!(
            err,
            MatchError::MalformedToken {
                center: CenterIndex::new(4),
                expected: 2,
                actual: 3,
            }
        );
    }

    #[test]
    fn test_from_active_links_unknown_name() {
        let links = LinkIndex::new(["A.B"]);
        let err = CenterToken::from_active_links(&links, ["B.A"]).unwrap_err();
        assert!(matches!(err, MatchError::UnknownLink { name } if name == "B.A"));
    }

    #[test]
    fn test_from_active_links_uses_first_occurrence_of_duplicates() {
        let links = LinkIndex::new(["A.B", "C.D", "A.B"]);
        let token = CenterToken::from_active_links(&links, ["A.B"]).unwrap();
        assert_eq!(token.entries(), &[1, 0, 0]);
    }

    #[test]
    fn test_token_display_matches_tuple_notation() {
        assert_eq!(CenterToken::from([1, 0, 1]).to_string(), "(1, 0, 1)");
        assert_eq!(CenterToken::from([1]).to_string(), "(1,)");
        assert_eq!(CenterToken::default().to_string(), "()");
    }

    #[test]
    fn test_link_set_symmetric_difference_len() {
        let a = LinkSet::from_links(4, [LinkId::new(0), LinkId::new(1)]);
        let b = LinkSet::from_links(4, [LinkId::new(1), LinkId::new(3)]);
        assert_eq!(a.symmetric_difference_len(&b), 2);
        assert_eq!(a.len(), 2);
        assert_eq!(a.universe_len(), 4);
        assert_eq!(a.to_string(), "{0, 1}");
    }

    #[test]
    #[should_panic(expected = "called `LinkSet::insert` with link out of bounds")]
    fn test_link_set_insert_out_of_bounds_panics() {
        let mut s = LinkSet::empty(2);
        s.insert(LinkId::new(2));
    }
}
