//! Process control block.

use super::Index;
use alloc::collections::VecDeque;

pub type Pid = Index;

/// Saved processor state: general registers plus the three control
/// registers the nucleus actually inspects (PC, stack pointer, status).
/// Everything else about "the CPU" lives behind [`crate::machine::Machine`];
/// this is just the part a context switch has to save and restore.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CpuState {
    pub pc: u32,
    pub sp: u32,
    pub status: u32,
    pub regs: [u32; 29],
}

/// What a process is waiting on while not in the ready queue.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BlockedOn {
    Device { line: u8, unit: u8 },
    PseudoClock,
    /// Waiting out a demand-paging fault (its own or one queued ahead of
    /// it behind the swap-pool mutex), not tied to a specific device queue.
    Pager,
    /// Blocked in `RECEIVEMESSAGE` with no matching message queued yet.
    /// Carries the sender the caller asked for, or `None` for ANYMESSAGE —
    /// a `SENDMESSAGE` from anyone else must leave this process blocked.
    Receive(Option<Pid>),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProcessState {
    Ready,
    Running,
    Blocked(BlockedOn),
}

/// Execution privilege level. Only kernel-mode processes — the root process
/// and the device proxies — may issue the Nucleus-level
/// `SENDMESSAGE`/`RECEIVEMESSAGE` syscalls directly; a user-mode process
/// issuing either traps as a privileged-instruction violation and is passed
/// up to its support structure like any other program trap.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Mode {
    #[default]
    Kernel,
    User,
}

pub struct Pcb {
    pub pid: Pid,
    pub parent: Option<Pid>,
    pub child: Option<Pid>,
    pub sibling: Option<Pid>,
    pub state: ProcessState,
    pub cpu_state: CpuState,
    pub mode: Mode,
    pub cpu_time_us: u64,
    /// Address space id; 0 is the kernel/SSI/root, 1..=UPROCMAX are user
    /// processes and double as their swap-pool/page-table slot.
    pub asid: u8,
    /// Messages sent to this process while it wasn't blocked in
    /// `RECEIVEMESSAGE`, FIFO order. Bounded in practice by the shared
    /// message pool, not by a per-PCB limit, so a growable queue is the
    /// right fit even though the descriptors themselves come from the
    /// fixed-capacity [`crate::pool::msg::MsgPool`].
    pub inbox: VecDeque<Index>,
    /// Index into the support-structure table (Phase3 processes only).
    pub support: Option<Index>,
}

impl Pcb {
    pub fn new(pid: Pid, asid: u8) -> Self {
        Self {
            pid,
            parent: None,
            child: None,
            sibling: None,
            state: ProcessState::Ready,
            cpu_state: CpuState::default(),
            mode: Mode::Kernel,
            cpu_time_us: 0,
            asid,
            inbox: VecDeque::new(),
            support: None,
        }
    }
}
