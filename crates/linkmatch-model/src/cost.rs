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

//! Distance between two link sets.

use crate::signature::LinkSet;

/// A pure distance function between a device signature and a center
/// signature. Implementations must be symmetric and non-negative and must
/// return zero for equal sets.
pub trait CostModel: Send + Sync {
    fn name(&self) -> &str;
    fn score(&self, device: &LinkSet, center: &LinkSet) -> usize;
}

/// `|A Δ B|`: the number of links present in exactly one of the two sets.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SymmetricDifference;

impl CostModel for SymmetricDifference {
    fn name(&self) -> &str {
        "SymmetricDifference"
    }

    #[inline]
    fn score(&self, device: &LinkSet, center: &LinkSet) -> usize {
        device.symmetric_difference_len(center)
    }
}

impl std::fmt::Display for SymmetricDifference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SymmetricDifference")
    }
}
