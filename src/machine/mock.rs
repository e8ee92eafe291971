//! Deterministic, fully host-runnable `Machine`: no real device behind it,
//! just enough state to make `start_io`/`drain_completions` behave the way
//! the real bus would.

use super::{Completion, IoRequest, Machine};
use crate::config::{devices::Line, PAGESIZE};
use alloc::boxed::Box;
use alloc::collections::{BTreeMap, VecDeque};
use alloc::vec::Vec;

pub struct MockMachine {
    completions: VecDeque<Completion>,
    flash_store: BTreeMap<(u8, u32), [u8; PAGESIZE]>,
    /// Bytes queued for the next `ReadChar` on a given terminal unit, FIFO.
    terminal_input: BTreeMap<u8, VecDeque<u8>>,
    now_us: u64,
    /// When `true`, `start_io` appends a completion immediately. When
    /// `false`, completions are held back until [`Self::complete_one`] or
    /// [`Self::complete_all`] is called, which is how tests pin down DoIO
    /// completion ordering instead of relying on call order alone.
    pub auto_complete: bool,
    pending: VecDeque<(Line, u8, IoRequest)>,
    /// `(line, unit)` whose next completion should report failure instead
    /// of success, consumed the first time that pair finishes.
    fail_next: Option<(Line, u8)>,
}

impl MockMachine {
    pub fn new() -> Self {
        Self {
            completions: VecDeque::new(),
            flash_store: BTreeMap::new(),
            terminal_input: BTreeMap::new(),
            now_us: 0,
            auto_complete: true,
            pending: VecDeque::new(),
            fail_next: None,
        }
    }

    /// Queue a byte the next `ReadChar` on `unit` will deliver.
    pub fn queue_terminal_input(&mut self, unit: u8, byte: u8) {
        self.terminal_input.entry(unit).or_default().push_back(byte);
    }

    /// Make the next completion on `(line, unit)` report failure
    /// (`status != 0`) instead of success, for exercising error paths.
    pub fn fail_next_completion(&mut self, line: Line, unit: u8) {
        self.fail_next = Some((line, unit));
    }

    fn finish(&mut self, line: Line, unit: u8, request: IoRequest) {
        let failed = self.fail_next == Some((line, unit));
        if failed {
            self.fail_next = None;
        }
        match request {
            IoRequest::PrintChar(_byte) => {
                self.completions.push_back(Completion {
                    line,
                    unit,
                    status: if failed { 1 } else { 0 },
                    page: None,
                });
            }
            IoRequest::ReadChar => {
                let byte = self.terminal_input.get_mut(&unit).and_then(VecDeque::pop_front).unwrap_or(0);
                let code = if failed { 1u32 } else { 0u32 };
                self.completions.push_back(Completion {
                    line,
                    unit,
                    status: ((byte as u32) << 8) | code,
                    page: None,
                });
            }
            IoRequest::FlashRead { block } => {
                let page = self
                    .flash_store
                    .get(&(unit, block))
                    .copied()
                    .unwrap_or([0u8; PAGESIZE]);
                self.completions.push_back(Completion {
                    line,
                    unit,
                    status: if failed { 1 } else { 0 },
                    page: Some(Box::new(page)),
                });
            }
            IoRequest::FlashWrite { block, page } => {
                self.flash_store.insert((unit, block), *page);
                self.completions.push_back(Completion {
                    line,
                    unit,
                    status: if failed { 1 } else { 0 },
                    page: None,
                });
            }
        }
    }

    /// Complete the oldest still-pending request.
    pub fn complete_one(&mut self) -> bool {
        if let Some((line, unit, req)) = self.pending.pop_front() {
            self.finish(line, unit, req);
            true
        } else {
            false
        }
    }

    pub fn complete_all(&mut self) {
        while self.complete_one() {}
    }

    pub fn advance(&mut self, delta_us: u64) {
        self.now_us += delta_us;
    }
}

impl Machine for MockMachine {
    fn start_io(&mut self, line: Line, unit: u8, request: IoRequest) {
        if self.auto_complete {
            self.finish(line, unit, request);
        } else {
            self.pending.push_back((line, unit, request));
        }
    }

    fn drain_completions(&mut self) -> Vec<Completion> {
        self.completions.drain(..).collect()
    }

    fn now_us(&self) -> u64 {
        self.now_us
    }
}
