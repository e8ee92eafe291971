//! The privileged System Service Interface: every service besides
//! `SENDMESSAGE`/`RECEIVEMESSAGE` themselves is, underneath, a blocking
//! request sent to a single broker and a reply waited for in return. The
//! broker could be modelled as an ordinary process running an infinite
//! `RECEIVEMESSAGE`/dispatch/`SENDMESSAGE` loop, but that round trip is
//! collapsed here into a direct call, since the two are observationally
//! identical to the requester and the broker never does anything between
//! requests that a caller could observe.

use crate::kernel::Kernel;
use crate::kutil::error::{KernelError, Status};
use crate::machine::Machine;
use crate::pool::pcb::{BlockedOn, CpuState, Pcb, Pid, ProcessState};

pub enum Request {
    CreateProcess {
        initial_state: CpuState,
        support: Option<usize>,
    },
    /// `None` means "terminate the caller".
    TerminateProcess {
        target: Option<Pid>,
    },
    GetCpuTime,
    SetPlt {
        ticks: u32,
    },
    WaitForClock,
    GetSupportData,
    GetProcessId {
        parent: bool,
    },
    DoIo {
        line: crate::config::devices::Line,
        unit: u8,
    },
}

/// `NoReply` means "don't send anything back, the caller is already
/// blocked (or gone)".
pub enum Reply {
    Value(i32),
    NoReply,
}

/// Equivalent of `SSIRequest`: dispatch one service request from `sender`.
pub fn request(kernel: &mut Kernel, machine: &mut dyn Machine, sender: Pid, req: Request) -> Reply {
    match req {
        Request::CreateProcess { initial_state, support } => {
            match create_process(kernel, sender, initial_state, support) {
                Ok(pid) => Reply::Value(pid as i32),
                Err(e) => Reply::Value(Status::from(e) as i32),
            }
        }
        Request::TerminateProcess { target } => {
            let victim = target.unwrap_or(sender);
            terminate_tree(kernel, victim);
            if target.is_none() {
                Reply::NoReply
            } else {
                Reply::Value(Status::Ok as i32)
            }
        }
        Request::GetCpuTime => {
            let us = kernel.pcbs.get(sender).map(|p| p.cpu_time_us).unwrap_or(0);
            Reply::Value(us as i32)
        }
        Request::SetPlt { ticks } => {
            kernel.plt_ticks = ticks;
            Reply::Value(Status::Ok as i32)
        }
        Request::WaitForClock => {
            wait_for_clock(kernel, machine, sender);
            Reply::NoReply
        }
        Request::GetSupportData => {
            let support = kernel.pcbs.get(sender).and_then(|p| p.support);
            Reply::Value(support.map(|s| s as i32).unwrap_or(-1))
        }
        Request::GetProcessId { parent } => {
            let pcb = match kernel.pcbs.get(sender) {
                Some(p) => p,
                None => return Reply::Value(Status::NotPermitted as i32),
            };
            if !parent {
                Reply::Value(sender as i32)
            } else {
                Reply::Value(pcb.parent.map(|p| p as i32).unwrap_or(Status::NoProc as i32))
            }
        }
        Request::DoIo { line, unit } => {
            do_io(kernel, machine, sender, line, unit);
            Reply::NoReply
        }
    }
}

/// Allocate a child PCB. Per the resolved open question on child support
/// structures: every field of the fresh PCB is zeroed by [`Pcb::new`]
/// except the pid it's assigned, the parent link, and the two
/// caller-supplied fields (the initial saved state and the support
/// pointer) — nothing leaks from whatever the slot last held.
fn create_process(
    kernel: &mut Kernel,
    parent: Pid,
    initial_state: CpuState,
    support: Option<usize>,
) -> Result<Pid, KernelError> {
    if kernel.pcbs.get(parent).is_none() {
        return Err(KernelError::NoSuchProcess);
    }
    let asid = kernel.pcbs.get(parent).map(|p| p.asid).unwrap_or(0);
    let child_pid = kernel.pcbs.alloc(Pcb::new(0, asid))?;
    {
        let child = kernel.pcbs.get_mut(child_pid).expect("just allocated");
        child.pid = child_pid;
        child.cpu_state = initial_state;
        child.support = support;
        child.parent = Some(parent);
    }
    insert_child(kernel, parent, child_pid);
    crate::sched::requeue(kernel, child_pid);
    Ok(child_pid)
}

fn insert_child(kernel: &mut Kernel, parent: Pid, child: Pid) {
    let first_child = kernel.pcbs.get(parent).and_then(|p| p.child);
    if let Some(mut_child) = kernel.pcbs.get_mut(child) {
        mut_child.sibling = first_child;
    }
    if let Some(mut_parent) = kernel.pcbs.get_mut(parent) {
        mut_parent.child = Some(child);
    }
}

/// Detach `pid` from its parent's child list, splicing its siblings in.
fn detach_from_parent(kernel: &mut Kernel, pid: Pid) {
    let parent = match kernel.pcbs.get(pid).and_then(|p| p.parent) {
        Some(p) => p,
        None => return,
    };
    let sibling = kernel.pcbs.get(pid).and_then(|p| p.sibling);

    let parent_first = kernel.pcbs.get(parent).and_then(|p| p.child);
    if parent_first == Some(pid) {
        if let Some(p) = kernel.pcbs.get_mut(parent) {
            p.child = sibling;
        }
        return;
    }

    // walk the sibling chain looking for whoever points at `pid`
    let mut cursor = parent_first;
    while let Some(c) = cursor {
        let next = kernel.pcbs.get(c).and_then(|p| p.sibling);
        if next == Some(pid) {
            if let Some(p) = kernel.pcbs.get_mut(c) {
                p.sibling = sibling;
            }
            return;
        }
        cursor = next;
    }
}

/// Equivalent of `terminateProcess`: recursively kill every descendant
/// first, then the process itself, removing it from whatever queue it was
/// sitting in (ready, a device queue, or the pseudo-clock queue) and
/// decrementing `soft_block_count` if it was soft-blocked.
pub fn terminate_tree(kernel: &mut Kernel, pid: Pid) {
    loop {
        let child = kernel.pcbs.get(pid).and_then(|p| p.child);
        match child {
            Some(c) => terminate_tree(kernel, c),
            None => break,
        }
    }

    // Only device/pseudo-clock/pager blocking counts against
    // `soft_block_count` (see the comment in `ipc::send`): a process
    // blocked on RECEIVEMESSAGE was never counted, so it must not be
    // uncounted here either.
    let was_soft_blocked = kernel
        .pcbs
        .get(pid)
        .map(|p| {
            matches!(
                p.state,
                ProcessState::Blocked(BlockedOn::Device { .. })
                    | ProcessState::Blocked(BlockedOn::PseudoClock)
                    | ProcessState::Blocked(BlockedOn::Pager)
            )
        })
        .unwrap_or(false);
    if was_soft_blocked {
        kernel.soft_block_count = kernel.soft_block_count.saturating_sub(1);
        for line in 0..crate::config::devices::LINES {
            for unit in 0..crate::config::devices::PER_LINE {
                kernel.device_queues[line][unit].remove_where(|p| p == pid);
            }
        }
        kernel.pseudo_clock_queue.remove_where(|p| p == pid);
        kernel.pager.remove_waiting(pid);
    }
    kernel.ready.remove_where(|p| p == pid);

    detach_from_parent(kernel, pid);
    kernel.pcbs.free(pid);
    if kernel.current == Some(pid) {
        kernel.current = None;
    }
}

fn wait_for_clock(kernel: &mut Kernel, machine: &dyn Machine, pid: Pid) {
    crate::sched::charge_running(kernel, machine, pid);
    if let Some(pcb) = kernel.pcbs.get_mut(pid) {
        pcb.state = ProcessState::Blocked(BlockedOn::PseudoClock);
    }
    kernel.soft_block_count += 1;
    let _ = kernel.pseudo_clock_queue.push(pid);
}

fn do_io(kernel: &mut Kernel, machine: &dyn Machine, pid: Pid, line: crate::config::devices::Line, unit: u8) {
    crate::sched::charge_running(kernel, machine, pid);
    if let Some(pcb) = kernel.pcbs.get_mut(pid) {
        pcb.state = ProcessState::Blocked(BlockedOn::Device { line: line as u8, unit });
    }
    kernel.soft_block_count += 1;
    let _ = kernel.device_queue(line, unit).push(pid);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::devices::Line;
    use crate::machine::mock::MockMachine;

    fn spawn(kernel: &mut Kernel) -> Pid {
        let pid = kernel.pcbs.alloc(Pcb::new(0, 0)).unwrap();
        kernel.pcbs.get_mut(pid).unwrap().pid = pid;
        pid
    }

    #[test]
    fn create_process_links_child_and_enqueues_it_ready() {
        let mut k = Kernel::new();
        let mut m = MockMachine::new();
        let parent = spawn(&mut k);
        match request(&mut k, &mut m, parent, Request::CreateProcess { initial_state: CpuState::default(), support: Some(3) }) {
            Reply::Value(child) => {
                let child = child as Pid;
                assert_eq!(k.pcbs.get(child).unwrap().parent, Some(parent));
                assert_eq!(k.pcbs.get(parent).unwrap().child, Some(child));
                assert_eq!(k.pcbs.get(child).unwrap().support, Some(3));
                assert_eq!(k.ready.pop(), Some(child));
            }
            Reply::NoReply => panic!("expected a pid back"),
        }
    }

    #[test]
    fn terminate_process_kills_entire_subtree() {
        let mut k = Kernel::new();
        let mut m = MockMachine::new();
        let parent = spawn(&mut k);
        let child = match request(&mut k, &mut m, parent, Request::CreateProcess { initial_state: CpuState::default(), support: None }) {
            Reply::Value(c) => c as Pid,
            Reply::NoReply => unreachable!(),
        };
        let grandchild = match request(&mut k, &mut m, child, Request::CreateProcess { initial_state: CpuState::default(), support: None }) {
            Reply::Value(c) => c as Pid,
            Reply::NoReply => unreachable!(),
        };

        request(&mut k, &mut m, parent, Request::TerminateProcess { target: Some(child) });
        assert!(k.pcbs.get(child).is_none());
        assert!(k.pcbs.get(grandchild).is_none());
        assert_eq!(k.pcbs.get(parent).unwrap().child, None);
    }

    #[test]
    fn terminate_self_removes_from_parent_and_replies_with_nothing() {
        let mut k = Kernel::new();
        let mut m = MockMachine::new();
        let parent = spawn(&mut k);
        let child = match request(&mut k, &mut m, parent, Request::CreateProcess { initial_state: CpuState::default(), support: None }) {
            Reply::Value(c) => c as Pid,
            Reply::NoReply => unreachable!(),
        };
        match request(&mut k, &mut m, child, Request::TerminateProcess { target: None }) {
            Reply::NoReply => {}
            Reply::Value(_) => panic!("self-termination has no reply recipient"),
        }
        assert!(k.pcbs.get(child).is_none());
        assert_eq!(k.pcbs.get(parent).unwrap().child, None);
    }

    #[test]
    fn wait_for_clock_blocks_and_increments_soft_block_count() {
        let mut k = Kernel::new();
        let mut m = MockMachine::new();
        let a = spawn(&mut k);
        assert!(matches!(request(&mut k, &mut m, a, Request::WaitForClock), Reply::NoReply));
        assert_eq!(k.soft_block_count, 1);
        assert!(matches!(k.pcbs.get(a).unwrap().state, ProcessState::Blocked(BlockedOn::PseudoClock)));
    }

    #[test]
    fn terminating_a_soft_blocked_process_drops_the_count() {
        let mut k = Kernel::new();
        let mut m = MockMachine::new();
        let a = spawn(&mut k);
        request(&mut k, &mut m, a, Request::DoIo { line: Line::Printer, unit: 0 });
        assert_eq!(k.soft_block_count, 1);
        request(&mut k, &mut m, a, Request::TerminateProcess { target: Some(a) });
        assert_eq!(k.soft_block_count, 0);
    }

    #[test]
    fn get_process_id_returns_self_or_parent() {
        let mut k = Kernel::new();
        let mut m = MockMachine::new();
        let parent = spawn(&mut k);
        let child = match request(&mut k, &mut m, parent, Request::CreateProcess { initial_state: CpuState::default(), support: None }) {
            Reply::Value(c) => c as Pid,
            Reply::NoReply => unreachable!(),
        };
        match request(&mut k, &mut m, child, Request::GetProcessId { parent: false }) {
            Reply::Value(v) => assert_eq!(v as Pid, child),
            Reply::NoReply => unreachable!(),
        }
        match request(&mut k, &mut m, child, Request::GetProcessId { parent: true }) {
            Reply::Value(v) => assert_eq!(v as Pid, parent),
            Reply::NoReply => unreachable!(),
        }
    }
}
