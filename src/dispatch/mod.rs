//! Exception dispatch: the "pass up or die" policy for program traps, with
//! `SYSCALL` and TLB-miss exceptions routed to their own handlers.

pub mod interrupts;
pub mod syscalls;

use crate::kernel::Kernel;
use crate::machine::Machine;
use crate::pool::pcb::{Mode, Pid};
use crate::support;
use crate::vm::AccessKind;

/// What caused the nucleus to stop running `pid` and look at it.
pub enum Cause {
    Syscall(syscalls::Request),
    TlbMiss { vpn: u32, access: AccessKind },
    ProgramTrap,
}

pub enum Outcome {
    /// `pid` keeps running (or was requeued) — scheduler should continue.
    Continue,
    /// `pid` was terminated as part of handling this exception.
    Terminated,
}

/// Routes to the syscall or TLB-refill handler, or applies pass-up-or-die
/// for anything else. A user-mode process issuing the Nucleus-level
/// `SENDMESSAGE`/`RECEIVEMESSAGE` syscall directly is a privileged-instruction
/// violation, not a service: it traps to the program-trap path instead of
/// running the syscall.
pub fn handle(kernel: &mut Kernel, machine: &mut dyn Machine, pid: Pid, cause: Cause) -> Outcome {
    match cause {
        Cause::Syscall(req) => {
            let mode = kernel.pcbs.get(pid).map(|p| p.mode).unwrap_or(Mode::Kernel);
            if mode == Mode::User {
                pass_up_or_die(kernel, pid)
            } else {
                syscalls::handle(kernel, machine, pid, req)
            }
        }
        Cause::TlbMiss { vpn, access } => crate::vm::handle_tlb_miss(kernel, machine, pid, vpn, access),
        Cause::ProgramTrap => pass_up_or_die(kernel, pid),
    }
}

/// A process with a registered support structure gets the trap forwarded
/// to its support-level general exception handler and resumes there; one
/// without is killed along with its progeny.
pub(crate) fn pass_up_or_die(kernel: &mut Kernel, pid: Pid) -> Outcome {
    let has_support = kernel.pcbs.get(pid).map(|p| p.support.is_some()).unwrap_or(false);
    if has_support {
        support::handle_program_trap(kernel, pid);
        Outcome::Continue
    } else {
        crate::ssi::terminate_tree(kernel, pid);
        Outcome::Terminated
    }
}
