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

//! # Linkmatch Model
//!
//! **The data model for matching network devices onto cluster centers.**
//!
//! Devices are known only through the links they appear in; cluster centers
//! are 0/1 signatures over the same ordered link universe. This crate turns
//! both into link sets, measures their distance, and lays the distances out
//! as the cost matrix consumed by the assignment backends.
//!
//! ## Architecture
//!
//! * **`index`**: Strongly-typed indices (`LinkId`, `DeviceIndex`, `CenterIndex`).
//! * **`link`**: `LinkIndex`, the name ↔ position map of the link universe.
//! * **`signature`**: `LinkSet`, `CenterToken`, `MatchPolicy` and the `SignatureExtractor`.
//! * **`cost`**: The `CostModel` trait and the symmetric-difference distance.
//! * **`matrix`**: `CostMatrix` and its (optionally multi-threaded) builder.
//! * **`assignment`**: The solution type and its validation against a matrix.
//! * **`error`**: `MatchError`, raised while building the matrix.
//!
//! ## Design Philosophy
//!
//! 1.  **Type Safety**: Rows and columns use distinct index types.
//! 2.  **Memory Layout**: The matrix is one flat row-major vector.
//! 3.  **Fail-Fast**: Tokens are validated before any cost is computed; a
//!     token is never truncated or padded to fit.

pub mod assignment;
pub mod cost;
pub mod error;
pub mod index;
pub mod link;
pub mod matrix;
pub mod signature;
