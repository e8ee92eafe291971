//! Demand paging over a shared swap pool: the TLB-refill handler loads a
//! missing page on fault, evicting and writing back an occupant if the
//! pool is full. A single swap-pool mutex (modelled as an in-flight slot
//! plus a FIFO of deferred faults, rather than a literal message exchange
//! with a dedicated mediator process — see the design notes) serializes
//! access, since two faults updating the same swap-pool table concurrently
//! would corrupt it.
//!
//! Each process's page table lives in its own [`crate::support::Support`]
//! structure rather than here: the pager only owns the swap pool itself
//! (which frame backs which `(asid, page_no)`) and reaches into whichever
//! support structure owns a given ASID through [`Kernel::support_by_asid`].

use crate::config::devices::Line;
use crate::config::{MAXPAGES, PAGESIZE, POOLSIZE};
use crate::kernel::Kernel;
use crate::machine::{Completion, IoRequest, Machine};
use crate::pool::pcb::{BlockedOn, Pid, ProcessState};
use alloc::boxed::Box;
use alloc::collections::VecDeque;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PageTableEntry {
    pub valid: bool,
    pub frame: Option<usize>,
}

#[derive(Clone, Copy, Debug, Default)]
struct SwapSlot {
    /// `(asid, page_no)` of whoever currently owns this frame.
    occupant: Option<(u8, u32)>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Stage {
    AwaitingWriteback,
    AwaitingRead,
}

struct InFlight {
    pid: Pid,
    asid: u8,
    page_no: u32,
    frame: usize,
    stage: Stage,
}

pub struct Pager {
    swap_pool: [SwapSlot; POOLSIZE],
    /// What's actually resident in each frame right now, so a write-back
    /// flushes real content instead of a placeholder and a later read of
    /// the same page gets back exactly what was evicted.
    frame_memory: Box<[[u8; PAGESIZE]; POOLSIZE]>,
    /// Round-robin eviction candidate, used only once every frame has been
    /// claimed at least once: free frames are always preferred first.
    victim: usize,
    in_flight: Option<InFlight>,
    /// Faults that arrived while another was already being serviced,
    /// granted the mutex in the order they asked for it.
    waiting: VecDeque<(Pid, u32)>,
}

impl Pager {
    pub fn new() -> Self {
        Self {
            swap_pool: [SwapSlot::default(); POOLSIZE],
            frame_memory: Box::new([[0u8; PAGESIZE]; POOLSIZE]),
            victim: 0,
            in_flight: None,
            waiting: VecDeque::new(),
        }
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Drop `pid` from the mutex's FIFO, for a process terminated while
    /// queued behind another one's fault.
    pub fn remove_waiting(&mut self, pid: Pid) {
        self.waiting.retain(|&(waiter, _)| waiter != pid);
    }
}

fn support_index(kernel: &Kernel, asid: u8) -> Option<crate::pool::Index> {
    kernel.support_by_asid.get(asid as usize - 1).copied().flatten()
}

fn entry(kernel: &Kernel, asid: u8, page_no: u32) -> PageTableEntry {
    support_index(kernel, asid)
        .and_then(|idx| kernel.support.get(idx))
        .map(|s| s.page_table[page_no as usize])
        .unwrap_or_default()
}

fn set_entry(kernel: &mut Kernel, asid: u8, page_no: u32, value: PageTableEntry) {
    if let Some(idx) = support_index(kernel, asid) {
        if let Some(s) = kernel.support.get_mut(idx) {
            s.page_table[page_no as usize] = value;
        }
    }
}

/// A copy of `asid`'s page table, for inspection. `asid` with no registered
/// support structure reads back as entirely invalid.
pub fn page_table(kernel: &Kernel, asid: u8) -> [PageTableEntry; MAXPAGES] {
    support_index(kernel, asid)
        .and_then(|idx| kernel.support.get(idx))
        .map(|s| s.page_table)
        .unwrap_or_else(|| [PageTableEntry::default(); MAXPAGES])
}

pub fn is_valid(kernel: &Kernel, asid: u8, page_no: u32) -> bool {
    entry(kernel, asid, page_no).valid
}

/// Overwrite the first byte of whatever frame currently backs `asid`'s
/// `page_no`, simulating a store a running process would have made.
/// Returns `false` if the page isn't resident.
pub fn poke_resident(kernel: &mut Kernel, asid: u8, page_no: u32, byte: u8) -> bool {
    match entry(kernel, asid, page_no).frame {
        Some(frame) => {
            kernel.pager.frame_memory[frame][0] = byte;
            true
        }
        None => false,
    }
}

/// Read back the first byte of whatever frame currently backs `asid`'s
/// `page_no`. `None` if the page isn't resident.
pub fn resident_byte(kernel: &Kernel, asid: u8, page_no: u32) -> Option<u8> {
    entry(kernel, asid, page_no).frame.map(|frame| kernel.pager.frame_memory[frame][0])
}

/// Entry point from `dispatch::handle`'s `TlbMiss` arm: either starts
/// servicing `pid`'s fault immediately, or queues it behind whichever
/// fault already holds the swap-pool mutex.
pub fn fault(kernel: &mut Kernel, machine: &mut dyn Machine, pid: Pid, vpn: u32) {
    block_on_pager(kernel, machine, pid);
    if kernel.pager.is_busy() {
        kernel.pager.waiting.push_back((pid, vpn));
    } else {
        begin_fault(kernel, machine, pid, vpn);
    }
}

fn begin_fault(kernel: &mut Kernel, machine: &mut dyn Machine, pid: Pid, vpn: u32) {
    let asid = match kernel.pcbs.get(pid) {
        Some(p) => p.asid,
        None => return,
    };
    let page_no = vpn.min(MAXPAGES as u32 - 1);
    let frame = pick_frame(&mut kernel.pager);
    let occupant = kernel.pager.swap_pool[frame].occupant;

    if let Some((old_asid, old_page_no)) = occupant {
        set_entry(kernel, old_asid, old_page_no, PageTableEntry { valid: false, frame: None });
        kernel.pager.in_flight = Some(InFlight { pid, asid, page_no, frame, stage: Stage::AwaitingWriteback });
        let evicted = Box::new(kernel.pager.frame_memory[frame]);
        machine.start_io(Line::Flash, old_asid - 1, IoRequest::FlashWrite { block: old_page_no, page: evicted });
    } else {
        kernel.pager.in_flight = Some(InFlight { pid, asid, page_no, frame, stage: Stage::AwaitingRead });
        machine.start_io(Line::Flash, asid - 1, IoRequest::FlashRead { block: page_no });
    }
}

fn pick_frame(pager: &mut Pager) -> usize {
    if let Some(i) = pager.swap_pool.iter().position(|s| s.occupant.is_none()) {
        return i;
    }
    let victim = pager.victim;
    pager.victim = (pager.victim + 1) % POOLSIZE;
    victim
}

fn block_on_pager(kernel: &mut Kernel, machine: &dyn Machine, pid: Pid) {
    crate::sched::charge_running(kernel, machine, pid);
    if let Some(pcb) = kernel.pcbs.get_mut(pid) {
        pcb.state = ProcessState::Blocked(BlockedOn::Pager);
    }
    kernel.soft_block_count += 1;
}

/// Called by `dispatch::interrupts::service_device_completions` for every
/// completion on the flash line: advances the in-flight fault's stage, or
/// finishes it and wakes the faulting process, then starts the next
/// deferred fault if one was waiting on the mutex. A failed flash operation
/// is passed up to the faulting process's support structure (or kills it)
/// rather than completing the fault as if nothing happened.
pub fn on_flash_completion(kernel: &mut Kernel, machine: &mut dyn Machine, completion: &Completion) {
    let in_flight = match kernel.pager.in_flight.take() {
        Some(f) => f,
        None => return,
    };

    if completion.status != 0 {
        kernel.soft_block_count = kernel.soft_block_count.saturating_sub(1);
        if let Some(pcb) = kernel.pcbs.get_mut(in_flight.pid) {
            // No longer soft-blocked; pass_up_or_die decides what's next, and
            // calls its own requeue if the process resumes at a handler.
            pcb.state = ProcessState::Ready;
        }
        crate::dispatch::pass_up_or_die(kernel, in_flight.pid);
        if let Some((next_pid, next_vpn)) = kernel.pager.waiting.pop_front() {
            begin_fault(kernel, machine, next_pid, next_vpn);
        }
        return;
    }

    match in_flight.stage {
        Stage::AwaitingWriteback => {
            machine.start_io(Line::Flash, in_flight.asid - 1, IoRequest::FlashRead { block: in_flight.page_no });
            kernel.pager.in_flight = Some(InFlight { stage: Stage::AwaitingRead, ..in_flight });
        }
        Stage::AwaitingRead => {
            if let Some(page) = &completion.page {
                kernel.pager.frame_memory[in_flight.frame] = **page;
            }
            kernel.pager.swap_pool[in_flight.frame].occupant = Some((in_flight.asid, in_flight.page_no));
            set_entry(kernel, in_flight.asid, in_flight.page_no, PageTableEntry { valid: true, frame: Some(in_flight.frame) });

            kernel.soft_block_count -= 1;
            crate::sched::requeue(kernel, in_flight.pid);

            if let Some((next_pid, next_vpn)) = kernel.pager.waiting.pop_front() {
                begin_fault(kernel, machine, next_pid, next_vpn);
            }
        }
    }
}
