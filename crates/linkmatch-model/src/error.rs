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

//! Errors raised while turning links, devices and center tokens into a
//! cost matrix. These are fatal for a matching call; solve-time failures
//! are not errors and are reported as a no-solution outcome instead.

use crate::index::{CenterIndex, DeviceIndex};

/// The error type for cost matrix construction.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MatchError {
    /// A center token does not have one entry per link.
    #[error(
        "malformed token for center {center}: expected {expected} entries (one per link) but found {actual}"
    )]
    MalformedToken {
        /// The offending center.
        center: CenterIndex,
        /// The size of the link universe.
        expected: usize,
        /// The length of the token.
        actual: usize,
    },
    /// A link name used to build a token is not part of the link universe.
    #[error("link '{name}' is not part of the link universe")]
    UnknownLink {
        /// The unknown link name.
        name: String,
    },
    /// A symmetric-difference count does not fit the cost type.
    #[error("cost of {device} against {center} ({count}) does not fit the cost type")]
    CostOverflow {
        device: DeviceIndex,
        center: CenterIndex,
        count: usize,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_malformed_token_message_names_center_and_lengths() {
        let e = MatchError::MalformedToken {
            center: CenterIndex::new(2),
            expected: 8,
            actual: 7,
        };
        let msg = e.to_string();
        assert!(msg.contains("CenterIndex(2)"), "unexpected message: {msg}");
        assert!(msg.contains("expected 8"), "unexpected message: {msg}");
        assert!(msg.contains("found 7"), "unexpected message: {msg}");
    }

    #[test]
    fn test_unknown_link_message_contains_name() {
        let e = MatchError::UnknownLink {
            name: "A.Z".to_string(),
        };
        assert_eq!(e.to_string(), "link 'A.Z' is not part of the link universe");
    }
}
