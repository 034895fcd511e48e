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

/// Statistics collected while a backend solves an assignment problem.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SolverStatistics {
    /// Number of search steps (augmentations, tree nodes, ...) performed.
    pub steps: u64,
    /// Number of improving solutions found.
    pub solutions_found: u64,
    /// Total duration of the solve.
    pub solve_duration: std::time::Duration,
}

impl std::fmt::Display for SolverStatistics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Solver Statistics:")?;
        writeln!(f, "  Steps: {}", self.steps)?;
        writeln!(f, "  Solutions Found: {}", self.solutions_found)?;
        writeln!(
            f,
            "  Solve Duration (secs): {:.3}",
            self.solve_duration.as_secs_f64()
        )
    }
}

/// Builder for `SolverStatistics`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SolverStatisticsBuilder {
    steps: u64,
    solutions_found: u64,
    solve_duration: std::time::Duration,
}

impl SolverStatisticsBuilder {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn steps(mut self, steps: u64) -> Self {
        self.steps = steps;
        self
    }

    #[inline]
    pub fn solutions_found(mut self, solutions_found: u64) -> Self {
        self.solutions_found = solutions_found;
        self
    }

    #[inline]
    pub fn solve_duration(mut self, solve_duration: std::time::Duration) -> Self {
        self.solve_duration = solve_duration;
        self
    }

    #[inline]
    pub fn build(self) -> SolverStatistics {
        SolverStatistics {
            steps: self.steps,
            solutions_found: self.solutions_found,
            solve_duration: self.solve_duration,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_builder_constructs_expected_struct() {
        let stats = SolverStatisticsBuilder::new()
            .steps(17)
            .solutions_found(3)
            .solve_duration(Duration::from_millis(1234))
            .build();

        assert_eq!(stats.steps, 17);
        assert_eq!(stats.solutions_found, 3);
        assert_eq!(stats.solve_duration, Duration::from_millis(1234));
    }

    #[test]
    fn test_display_formats_all_fields() {
        let stats = SolverStatistics {
            steps: 5,
            solutions_found: 2,
            solve_duration: Duration::from_millis(1234),
        };
        let rendered = stats.to_string();

        assert!(rendered.contains("Solver Statistics:"), "missing header");
        assert!(rendered.contains("Steps: 5"));
        assert!(rendered.contains("Solutions Found: 2"));
        assert!(rendered.contains("Solve Duration (secs): 1.234"));
    }

    #[test]
    fn test_default_is_zeroed() {
        let stats = SolverStatistics::default();
        assert_eq!(stats.steps, 0);
        assert_eq!(stats.solutions_found, 0);
        assert!(stats.to_string().contains("Solve Duration (secs): 0.000"));
    }
}
