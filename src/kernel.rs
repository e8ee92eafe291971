//! The nucleus's private state: process and message pools, the ready
//! queue, the per-device blocked queues, and the pseudo-clock queue. Every
//! other module (`ipc`, `sched`, `dispatch`, `ssi`, `vm`, `support`) is a
//! set of functions that take `&mut Kernel` rather than methods on it.

use crate::config::{devices, MAXMESSAGES, MAXPROC, UPROCMAX};
use crate::pool::msg::Message;
use crate::pool::pcb::{Pcb, Pid};
use crate::pool::queue::ProcQueue;
use crate::pool::{Arena, Index};
use crate::support::devices::DeviceProxies;
use crate::support::Support;
use crate::vm::pager::Pager;

pub struct Kernel {
    pub pcbs: Arena<Pcb, MAXPROC>,
    pub messages: Arena<Message, MAXMESSAGES>,
    pub ready: ProcQueue<MAXPROC>,
    pub device_queues: [[ProcQueue<MAXPROC>; devices::PER_LINE]; devices::LINES],
    pub pseudo_clock_queue: ProcQueue<MAXPROC>,
    pub current: Option<Pid>,
    pub soft_block_count: usize,
    /// Timeslice last requested via `SETPLT`, for inspection/logging; the
    /// [`crate::machine::Machine`] is what actually arms the timer.
    pub plt_ticks: u32,
    /// When the process currently running was dispatched, so its elapsed
    /// runtime can be charged to `cpu_time_us` at the next block/preempt.
    pub dispatch_time_us: Option<u64>,
    pub pager: Pager,
    pub devices: DeviceProxies,
    /// Per-process support structures (page table plus saved handler
    /// contexts), one per live user process.
    pub support: Arena<Support, UPROCMAX>,
    /// asid (1-indexed) -> index into `support`, so pager code can look up
    /// the support structure for an arbitrary occupant ASID, not just the
    /// currently faulting process.
    pub support_by_asid: [Option<Index>; UPROCMAX],
}

impl Kernel {
    pub fn new() -> Self {
        Self {
            pcbs: Arena::new(),
            messages: Arena::new(),
            ready: ProcQueue::new(),
            device_queues: core::array::from_fn(|_| core::array::from_fn(|_| ProcQueue::new())),
            pseudo_clock_queue: ProcQueue::new(),
            current: None,
            soft_block_count: 0,
            plt_ticks: crate::config::TIMESLICE_US as u32,
            dispatch_time_us: None,
            pager: Pager::new(),
            devices: DeviceProxies::new(),
            support: Arena::new(),
            support_by_asid: [None; UPROCMAX],
        }
    }

    pub fn process_count(&self) -> usize {
        self.pcbs.live()
    }

    pub fn device_queue(&mut self, line: devices::Line, unit: u8) -> &mut ProcQueue<MAXPROC> {
        &mut self.device_queues[line as usize][unit as usize]
    }
}
