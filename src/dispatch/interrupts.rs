//! Interrupt handling: the processor local timer (PLT, drives preemption),
//! the interval timer (drives the pseudo-clock, broadcast-wakes everyone
//! waiting on it), and device completions drained from the [`Machine`].

use crate::config::devices::Line;
use crate::kernel::Kernel;
use crate::machine::Machine;

/// PLT expired: the running process's timeslice is up. Charge it for the
/// time it actually ran, then put it back at the tail of the ready queue;
/// the scheduler will pick whoever's next.
pub fn service_plt_expired(kernel: &mut Kernel, machine: &dyn Machine) {
    if let Some(pid) = kernel.current {
        crate::sched::charge_running(kernel, machine, pid);
        kernel.current = None;
        crate::sched::requeue(kernel, pid);
    }
}

/// Interval timer fired (every [`crate::config::PSECOND_US`]): every
/// process blocked on the pseudo-clock wakes up, matching `WAITFORCLOCK`'s
/// broadcast semantics rather than a single-waiter wakeup.
pub fn service_interval_timer(kernel: &mut Kernel) {
    while let Some(pid) = kernel.pseudo_clock_queue.pop() {
        kernel.soft_block_count -= 1;
        crate::sched::requeue(kernel, pid);
    }
}

/// Drain completed device operations and wake whichever process was
/// blocked on each one, in completion order. Flash completions belong to
/// the pager's multi-step fault sequence rather than a single blocked
/// process, so they're routed to it instead of the generic wake path.
pub fn service_device_completions(kernel: &mut Kernel, machine: &mut dyn Machine) {
    for completion in machine.drain_completions() {
        if completion.line == Line::Flash {
            crate::vm::pager::on_flash_completion(kernel, machine, &completion);
            continue;
        }
        if matches!(completion.line, Line::Printer | Line::TerminalXmit)
            && crate::support::devices::on_char_completion(kernel, machine, completion.line, completion.unit, completion.status)
        {
            continue;
        }
        let queue = kernel.device_queue(completion.line, completion.unit);
        let Some(pid) = queue.pop() else { continue };
        kernel.soft_block_count -= 1;
        if let Some(pcb) = kernel.pcbs.get_mut(pid) {
            pcb.cpu_state.regs[0] = completion.status;
        }
        crate::sched::requeue(kernel, pid);
    }
}
