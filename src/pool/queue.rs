//! FIFO process queue over arena indices: the ready queue, each per-device
//! blocked queue, and the pseudo-clock queue are all one of these.

use super::Index;
use heapless::Deque;

pub struct ProcQueue<const N: usize> {
    inner: Deque<Index, N>,
}

impl<const N: usize> ProcQueue<N> {
    pub const fn new() -> Self {
        Self { inner: Deque::new() }
    }

    /// Enqueue at the tail. Returns the pid back if the queue is already at
    /// `MAXPROC` capacity (cannot happen in practice: no more live PCBs
    /// exist than the pool that feeds this queue).
    pub fn push(&mut self, pid: Index) -> Result<(), Index> {
        self.inner.push_back(pid)
    }

    pub fn pop(&mut self) -> Option<Index> {
        self.inner.pop_front()
    }

    /// Remove the first pid matching `pred`, preserving relative order of
    /// the rest (`outProcQ`/`removeMsg`-style targeted removal).
    pub fn remove_where(&mut self, pred: impl Fn(Index) -> bool) -> Option<Index> {
        let mut rest: Deque<Index, N> = Deque::new();
        let mut found = None;
        while let Some(pid) = self.inner.pop_front() {
            if found.is_none() && pred(pid) {
                found = Some(pid);
            } else {
                let _ = rest.push_back(pid);
            }
        }
        self.inner = rest;
        found
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn contains(&self, pid: Index) -> bool {
        self.inner.iter().any(|&p| p == pid)
    }
}
