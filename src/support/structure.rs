//! The per-process support structure: everything a user process's support
//! level needs that the nucleus itself has no business holding — its own
//! page table, and the saved contexts a program trap or TLB exception gets
//! copied into so the support level's own handlers can run.

use crate::config::MAXPAGES;
use crate::pool::pcb::CpuState;
use crate::vm::pager::PageTableEntry;

/// One per live user process, allocated at `CREATEPROCESS` time and
/// referenced from its PCB by index. `general_handler`/`tlb_handler` are
/// the PC/SP/status a program trap or TLB exception resumes at; `general_ctx`
/// and `tlb_ctx` are where the interrupted process's own state lands so the
/// handler can inspect or restore it.
pub struct Support {
    pub asid: u8,
    pub page_table: [PageTableEntry; MAXPAGES],
    pub general_ctx: CpuState,
    pub tlb_ctx: CpuState,
    pub general_handler: CpuState,
    pub tlb_handler: CpuState,
}

impl Support {
    pub fn new(asid: u8) -> Self {
        Self {
            asid,
            page_table: [PageTableEntry::default(); MAXPAGES],
            general_ctx: CpuState::default(),
            tlb_ctx: CpuState::default(),
            general_handler: CpuState::default(),
            tlb_handler: CpuState::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_support_has_an_empty_page_table() {
        let s = Support::new(3);
        assert_eq!(s.asid, 3);
        assert!(s.page_table.iter().all(|e| !e.valid));
    }
}
