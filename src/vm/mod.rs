//! Support-level virtual memory: a flat per-process page table backed by a
//! shared swap pool, with TLB refill handled by [`pager`].

pub mod pager;

use crate::kernel::Kernel;
use crate::machine::Machine;
use crate::pool::pcb::Pid;

/// Whether a TLB miss was raised servicing a load or a store. A store
/// against a page that's already valid (TLB-Modified, not a genuine miss)
/// is a protection fault, not something the pager can fix by fetching a
/// page — this crate doesn't model a dirty/writable bit, so every resident
/// page is implicitly read-only from the faulting instruction's point of
/// view once it's already mapped.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AccessKind {
    Read,
    Write,
}

/// Routed here from `dispatch::handle`'s `TlbMiss` cause. A write against a
/// page that's already resident is TLB-Modified — passed up to the support
/// level like any other program trap, not handed to the pager — since the
/// pager's job is to fetch missing pages, not to arbitrate write
/// permission. A genuine miss, by contrast, never "completes" synchronously
/// from the caller's point of view: the faulting process stays blocked
/// until [`pager::on_flash_completion`] finishes the fetch.
pub fn handle_tlb_miss(kernel: &mut Kernel, machine: &mut dyn Machine, pid: Pid, vpn: u32, access: AccessKind) -> crate::dispatch::Outcome {
    let asid = match kernel.pcbs.get(pid) {
        Some(p) => p.asid,
        None => return crate::dispatch::Outcome::Terminated,
    };
    if access == AccessKind::Write && pager::is_valid(kernel, asid, vpn) {
        return crate::dispatch::pass_up_or_die(kernel, pid);
    }
    pager::fault(kernel, machine, pid, vpn);
    crate::dispatch::Outcome::Continue
}
