//! Support level: everything above the nucleus that a user process talks
//! to once it has a registered support structure — general-exception
//! ("program trap") handling and the SST/device-proxy servers.

pub mod devices;
pub mod sst;
pub mod structure;

pub use structure::Support;

use crate::kernel::Kernel;
use crate::pool::pcb::Pid;

/// A process whose general exception (anything besides a `SYSCALL` or a
/// TLB miss) was passed up here because it registered a support structure.
/// The interrupted state is copied into the support structure's saved
/// context and the process resumes at its support level's general
/// exception handler; a process with no support structure simply dies
/// (handled by the caller, `dispatch::pass_up_or_die`, before this is ever
/// reached — the fallback here is just a safety net).
pub fn handle_program_trap(kernel: &mut Kernel, pid: Pid) {
    let support_idx = match kernel.pcbs.get(pid).and_then(|p| p.support) {
        Some(idx) => idx,
        None => {
            crate::ssi::terminate_tree(kernel, pid);
            return;
        }
    };

    let saved = match kernel.pcbs.get(pid) {
        Some(p) => p.cpu_state,
        None => return,
    };
    let handler = match kernel.support.get_mut(support_idx) {
        Some(s) => {
            s.general_ctx = saved;
            s.general_handler
        }
        None => return,
    };

    if let Some(pcb) = kernel.pcbs.get_mut(pid) {
        pcb.cpu_state = handler;
    }
    crate::sched::requeue(kernel, pid);
}
