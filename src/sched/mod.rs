//! Round-robin scheduler and the HALT/PANIC/WAIT decision made whenever the
//! ready queue runs dry.

use crate::kernel::Kernel;
use crate::machine::Machine;
use crate::pool::pcb::{Pid, ProcessState};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Dispatch this pid: load its state and start the timeslice.
    Dispatch(Pid),
    /// Nothing ready, but some process is soft-blocked (on a device, the
    /// pseudo-clock, or a message): enable interrupts and idle.
    Wait,
    /// No live processes left at all: normal shutdown.
    Halt,
    /// Processes exist, none are ready, and none are soft-blocked: no
    /// interrupt will ever make progress possible again.
    Deadlock,
}

/// Decide what to run next without side effects beyond popping the chosen
/// pid off the ready queue, marking it `Running`, and arming its timeslice.
pub fn schedule(kernel: &mut Kernel, machine: &mut dyn Machine) -> Decision {
    if let Some(pid) = kernel.ready.pop() {
        if let Some(pcb) = kernel.pcbs.get_mut(pid) {
            pcb.state = ProcessState::Running;
        }
        kernel.current = Some(pid);
        kernel.dispatch_time_us = Some(machine.now_us());
        let ticks = kernel.plt_ticks;
        crate::ssi::request(kernel, machine, pid, crate::ssi::Request::SetPlt { ticks });
        return Decision::Dispatch(pid);
    }

    kernel.current = None;
    if kernel.process_count() == 0 {
        Decision::Halt
    } else if kernel.soft_block_count == 0 {
        Decision::Deadlock
    } else {
        Decision::Wait
    }
}

/// Move `pid` back onto the ready queue (end of timeslice, or a wakeup).
pub fn requeue(kernel: &mut Kernel, pid: Pid) {
    if let Some(pcb) = kernel.pcbs.get_mut(pid) {
        pcb.state = ProcessState::Ready;
    }
    let _ = kernel.ready.push(pid);
}

/// Charge whatever time has elapsed since `pid` was dispatched into its
/// `cpu_time_us`, then clear the dispatch stamp so it's only ever charged
/// once per dispatch. A no-op unless `pid` is the process currently running.
pub fn charge_running(kernel: &mut Kernel, machine: &dyn Machine, pid: Pid) {
    if kernel.current != Some(pid) {
        return;
    }
    if let Some(dispatched_at) = kernel.dispatch_time_us.take() {
        let elapsed = machine.now_us().saturating_sub(dispatched_at);
        if let Some(pcb) = kernel.pcbs.get_mut(pid) {
            pcb.cpu_time_us += elapsed;
        }
    }
}
