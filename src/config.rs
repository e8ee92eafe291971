//! System-wide sizing and timing constants.

/// Maximum number of simultaneously live processes: the root process plus
/// one user process and two device proxies per ASID, with headroom for
/// children spawned afterward.
pub const MAXPROC: usize = 32;
/// Maximum number of simultaneously live message descriptors.
pub const MAXMESSAGES: usize = 20;
/// Number of user-process ASIDs (and of device-proxy pairs, and of
/// per-process page tables, and of swap-pool frames as `2 * UPROCMAX`).
pub const UPROCMAX: usize = 8;
/// Frames in the shared swap pool.
pub const POOLSIZE: usize = 2 * UPROCMAX;
/// Alias for [`POOLSIZE`]: number of frames backing the swap pool.
pub const SWAPPOOL: usize = POOLSIZE;
/// Entries in a per-process page table.
pub const MAXPAGES: usize = 32;
/// Bytes per page/frame.
pub const PAGESIZE: usize = 4096;
/// Scheduler time slice, in microseconds.
pub const TIMESLICE_US: u64 = 5_000;
/// Pseudo-clock (interval timer) tick period, in microseconds.
pub const PSECOND_US: u64 = 100_000;
/// Entry point every user process starts execution at.
pub const UPROCSTARTADDR: u32 = 0x8000_00B0;
/// Top of the per-process user stack (grows down from here).
pub const USERSTACKTOP: u32 = 0xC000_0000;

pub mod devices {
    pub const LINES: usize = 6;
    pub const PER_LINE: usize = super::UPROCMAX;

    /// Terminals carry two independent queues — receive and transmit —
    /// unlike every other line here, which has exactly one direction.
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    #[repr(u8)]
    pub enum Line {
        Disk = 0,
        Flash = 1,
        Ethernet = 2,
        Printer = 3,
        TerminalRecv = 4,
        TerminalXmit = 5,
    }
}
