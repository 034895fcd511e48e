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

use crate::{
    monitor::search_monitor::{SearchCommand, SearchMonitor},
    problem::AssignmentProblem,
};
use linkmatch_model::assignment::Assignment;
use num_traits::{PrimInt, Signed};
use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

/// Stops the search once a shared flag is raised from another thread.
#[derive(Debug, Clone)]
pub struct InterruptMonitor<T> {
    stop_flag: Arc<AtomicBool>,
    _phantom: std::marker::PhantomData<T>,
}

impl<T> InterruptMonitor<T> {
    #[inline(always)]
    pub fn new(stop_flag: Arc<AtomicBool>) -> Self {
        Self {
            stop_flag,
            _phantom: std::marker::PhantomData,
        }
    }
}

impl<T> SearchMonitor<T> for InterruptMonitor<T>
where
    T: PrimInt + Signed,
{
    fn name(&self) -> &str {
        "InterruptMonitor"
    }

    fn on_enter_search(&mut self, _problem: &AssignmentProblem<'_, T>) {}
    fn on_exit_search(&mut self) {}
    fn on_solution_found(&mut self, _solution: &Assignment<T>) {}
    fn on_step(&mut self) {}

    fn search_command(&self) -> SearchCommand {
        if self.stop_flag.load(Ordering::Relaxed) {
            SearchCommand::Terminate("interrupt signal received".to_string())
        } else {
            SearchCommand::Continue
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    type IntegerType = i64;

    #[test]
    fn test_continues_while_flag_is_clear() {
        let flag = Arc::new(AtomicBool::new(false));
        let monitor = InterruptMonitor::<IntegerType>::new(flag);
        assert_eq!(monitor.search_command(), SearchCommand::Continue);
    }

    #[test]
    fn test_terminates_once_flag_is_set_from_another_thread() {
        let flag = Arc::new(AtomicBool::new(false));
        let monitor = InterruptMonitor::<IntegerType>::new(Arc::clone(&flag));

        let remote = Arc::clone(&flag);
        std::thread::spawn(move || remote.store(true, Ordering::Relaxed))
            .join()
            .expect("setter thread panicked");

        match monitor.search_command() {
            SearchCommand::Terminate(reason) => assert_eq!(reason, "interrupt signal received"),
            other => panic!("expected Terminate, got {:?}", other),
        }
    }
}
