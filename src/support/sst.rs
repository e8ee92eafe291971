//! Support Service Technician: the per-process support-level server a
//! user process's syscalls above the nucleus's `SENDMESSAGE`/`RECEIVEMESSAGE`
//! actually reach. Five services: `GETTOD`, `TERMINATE`, the two print
//! delegations (`WRITEPRINTER`/`WRITETERMINAL`), and the support-level
//! message pair (`SENDMSG`/`RECEIVEMSG`) a user process uses in place of
//! the nucleus-level syscalls it isn't privileged to issue directly.

use crate::kernel::Kernel;
use crate::kutil::error::{KernelError, Status};
use crate::machine::Machine;
use crate::pool::pcb::Pid;

/// Who a support-level `SENDMSG`/`RECEIVEMSG` names as the other party.
/// `ParentSentinel` is the reserved value a user process uses to mean "my
/// parent" without needing to know its pid.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Target {
    Pid(Pid),
    ParentSentinel,
}

pub enum Request<'a> {
    GetTod,
    Terminate,
    WritePrinter { text: &'a [u8] },
    WriteTerminal { text: &'a [u8] },
    SendMsg { dest: Target, payload: usize },
    ReceiveMsg { from: Option<Target> },
}

pub enum Reply {
    Value(i32),
    /// `WRITEPRINTER`/`WRITETERMINAL` reply once the device proxy finishes
    /// the job, not synchronously here.
    Deferred,
    /// `RECEIVEMSG` found nothing queued; the caller is already blocked.
    Blocked,
}

/// Resolve a [`Target`] to a concrete pid. `ParentSentinel` with no parent
/// (the caller is the root, or its parent already exited) has no
/// destination at all; an explicit [`Target::Pid`] is returned
/// unconditionally and left for `ipc::send`/`ipc::recv` to validate, same
/// as any other pid a process might name.
fn resolve(kernel: &Kernel, sender: Pid, target: Target) -> Option<Pid> {
    match target {
        Target::Pid(pid) => Some(pid),
        Target::ParentSentinel => kernel.pcbs.get(sender).and_then(|p| p.parent),
    }
}

/// Dispatches one support-level service request. Each service does exactly
/// what its name says and nothing falls through into the next one.
pub fn handle(kernel: &mut Kernel, machine: &mut dyn Machine, sender: Pid, proxy_for: impl Fn(&Kernel, Pid) -> Option<(crate::config::devices::Line, u8, Pid)>, req: Request) -> Reply {
    match req {
        Request::GetTod => Reply::Value(machine.now_us() as i32),
        Request::Terminate => {
            crate::ssi::terminate_tree(kernel, sender);
            Reply::Value(Status::Ok as i32)
        }
        Request::WritePrinter { text } => {
            match proxy_for(kernel, sender) {
                Some((line, unit, proxy)) => {
                    crate::support::devices::write(kernel, machine, proxy, sender, line, unit, text);
                    Reply::Deferred
                }
                None => Reply::Value(Status::NotPermitted as i32),
            }
        }
        Request::WriteTerminal { text } => {
            match proxy_for(kernel, sender) {
                Some((line, unit, proxy)) => {
                    crate::support::devices::write(kernel, machine, proxy, sender, line, unit, text);
                    Reply::Deferred
                }
                None => Reply::Value(Status::NotPermitted as i32),
            }
        }
        Request::SendMsg { dest, payload } => {
            let dest = match resolve(kernel, sender, dest) {
                Some(pid) => pid,
                None => return Reply::Value(Status::DestNotExist as i32),
            };
            match crate::ipc::send(kernel, sender, dest, payload) {
                Ok(()) => Reply::Value(Status::Ok as i32),
                Err(e) => Reply::Value(Status::from(e) as i32),
            }
        }
        Request::ReceiveMsg { from } => {
            let from = match from {
                Some(target) => match resolve(kernel, sender, target) {
                    Some(pid) => Some(pid),
                    None => return Reply::Value(Status::from(KernelError::DestNotExist) as i32),
                },
                None => None,
            };
            // Same convention as the Nucleus-level RECEIVEMESSAGE: the
            // return value is who sent it, not the payload itself.
            match crate::ipc::recv(kernel, machine, sender, from) {
                crate::ipc::RecvOutcome::Delivered { sender: from, .. } => Reply::Value(from as i32),
                crate::ipc::RecvOutcome::WouldBlock => Reply::Blocked,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::devices::Line;
    use crate::machine::mock::MockMachine;
    use crate::pool::pcb::Pcb;

    fn spawn(kernel: &mut Kernel) -> Pid {
        let pid = kernel.pcbs.alloc(Pcb::new(0, 1)).unwrap();
        kernel.pcbs.get_mut(pid).unwrap().pid = pid;
        pid
    }

    #[test]
    fn get_tod_reads_the_machine_clock() {
        let mut k = Kernel::new();
        let mut m = MockMachine::new();
        m.advance(42);
        let a = spawn(&mut k);
        match handle(&mut k, &mut m, a, |_, _| None, Request::GetTod) {
            Reply::Value(v) => assert_eq!(v, 42),
            Reply::Deferred | Reply::Blocked => panic!("GETTOD always replies immediately"),
        }
    }

    #[test]
    fn terminate_kills_the_caller() {
        let mut k = Kernel::new();
        let mut m = MockMachine::new();
        let a = spawn(&mut k);
        handle(&mut k, &mut m, a, |_, _| None, Request::Terminate);
        assert!(k.pcbs.get(a).is_none());
    }

    #[test]
    fn write_printer_delegates_to_the_proxy_and_defers_the_reply() {
        let mut k = Kernel::new();
        let mut m = MockMachine::new();
        let a = spawn(&mut k);
        let proxy = spawn(&mut k);
        let reply = handle(&mut k, &mut m, a, |_, _| Some((Line::Printer, 0, proxy)), Request::WritePrinter { text: b"x" });
        assert!(matches!(reply, Reply::Deferred));
        assert!(!m.drain_completions().is_empty());
    }

    #[test]
    fn send_msg_to_a_live_pid_delivers_into_its_inbox() {
        let mut k = Kernel::new();
        let mut m = MockMachine::new();
        let a = spawn(&mut k);
        let b = spawn(&mut k);
        let reply = handle(&mut k, &mut m, a, |_, _| None, Request::SendMsg { dest: Target::Pid(b), payload: 7 });
        assert!(matches!(reply, Reply::Value(v) if v == Status::Ok as i32));
        assert_eq!(k.pcbs.get(b).unwrap().inbox.len(), 1);
    }

    #[test]
    fn send_msg_to_a_dead_pid_reports_dest_not_exist() {
        let mut k = Kernel::new();
        let mut m = MockMachine::new();
        let a = spawn(&mut k);
        let reply = handle(&mut k, &mut m, a, |_, _| None, Request::SendMsg { dest: Target::Pid(99), payload: 0 });
        assert!(matches!(reply, Reply::Value(v) if v == Status::DestNotExist as i32));
    }

    #[test]
    fn send_msg_to_parent_sentinel_with_no_parent_reports_dest_not_exist() {
        let mut k = Kernel::new();
        let mut m = MockMachine::new();
        let a = spawn(&mut k);
        let reply = handle(&mut k, &mut m, a, |_, _| None, Request::SendMsg { dest: Target::ParentSentinel, payload: 0 });
        assert!(matches!(reply, Reply::Value(v) if v == Status::DestNotExist as i32));
    }

    #[test]
    fn receive_msg_delivers_a_queued_message_from_the_parent_sentinel() {
        let mut k = Kernel::new();
        let mut m = MockMachine::new();
        let parent = spawn(&mut k);
        let child = spawn(&mut k);
        k.pcbs.get_mut(child).unwrap().parent = Some(parent);

        crate::ipc::send(&mut k, parent, child, 5).unwrap();
        let reply = handle(&mut k, &mut m, child, |_, _| None, Request::ReceiveMsg { from: Some(Target::ParentSentinel) });
        assert!(matches!(reply, Reply::Value(v) if v == parent as i32));
    }

    #[test]
    fn receive_msg_with_nothing_queued_blocks() {
        let mut k = Kernel::new();
        let mut m = MockMachine::new();
        let a = spawn(&mut k);
        let reply = handle(&mut k, &mut m, a, |_, _| None, Request::ReceiveMsg { from: None });
        assert!(matches!(reply, Reply::Blocked));
    }
}
