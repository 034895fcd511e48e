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

//! # Linkmatch Solver
//!
//! Matches network devices, known only by the links they appear in, to a
//! fixed vocabulary of cluster-center signatures at minimum total
//! symmetric-difference cost.
//!
//! - [`assigner`] solves a cost matrix with an injected backend and checks
//!   the answer.
//! - [`matcher`] runs the whole pipeline from link names and center tokens.
//! - [`report`] renders the result as text.
//!
//! ```rust
//! use linkmatch_model::signature::CenterToken;
//! use linkmatch_solver::matcher::DeviceMatcher;
//!
//! let links = ["A.B", "C.D"];
//! let centers = vec![
//!     CenterToken::from([1, 0]),
//!     CenterToken::from([1, 0]),
//!     CenterToken::from([0, 1]),
//!     CenterToken::from([0, 1]),
//! ];
//! let report = DeviceMatcher::default()
//!     .run_configured::<i64, _, _>(&["A", "B", "C", "D"], &centers, &links)
//!     .unwrap();
//! assert!(report.render().starts_with("Total cost = 0.0"));
//! ```

pub mod assigner;
pub mod matcher;
pub mod report;
