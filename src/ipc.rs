//! `SENDMESSAGE`/`RECEIVEMESSAGE` semantics, shared verbatim by the kernel
//! syscall exception handler and by support-level code that also exchanges
//! messages with the SST.

use crate::kernel::Kernel;
use crate::kutil::error::KernelError;
use crate::machine::Machine;
use crate::pool::msg::Message;
use crate::pool::pcb::{BlockedOn, Pid, ProcessState};

/// Deliver `payload` from `sender` to `dest`. Always succeeds as long as
/// the message pool has room and `dest` names a live process: delivery
/// never blocks the sender.
pub fn send(kernel: &mut Kernel, sender: Pid, dest: Pid, payload: usize) -> Result<(), KernelError> {
    if kernel.pcbs.get(dest).is_none() {
        return Err(KernelError::DestNotExist);
    }
    let msg_idx = kernel.messages.alloc(Message::new(sender, payload))?;

    let dest_pcb = kernel.pcbs.get_mut(dest).unwrap();
    dest_pcb.inbox.push_back(msg_idx);
    // Stricter than "blocked in RECEIVEMESSAGE implies wake": a receiver
    // waiting on a specific sender must stay asleep for anyone else's send.
    let should_wake = match dest_pcb.state {
        ProcessState::Blocked(BlockedOn::Receive(expected)) => {
            expected.is_none() || expected == Some(sender)
        }
        _ => false,
    };

    if should_wake {
        dest_pcb.state = ProcessState::Ready;
        // Unlike a device or pseudo-clock wakeup, waking a message-blocked
        // receiver does not touch `soft_block_count`: that counter only
        // tracks processes an interrupt can wake, which is what lets the
        // scheduler tell "nothing can ever become ready again" (PANIC) apart
        // from "something is still waiting on hardware" (WAIT). A process
        // blocked on RECEIVEMESSAGE can only be woken by another process's
        // SEND, never by an interrupt, so it was never counted here.
        let _ = kernel.ready.push(dest);
    }
    Ok(())
}

pub enum RecvOutcome {
    /// A matching message was already queued; delivered immediately.
    Delivered { sender: Pid, payload: usize },
    /// No match yet: caller transitions to `Blocked(Receive)` and the
    /// scheduler must not re-enqueue it.
    WouldBlock,
}

/// Look for a message in `receiver`'s inbox from `from` (or any sender, if
/// `from` is `None`) and consume it if present.
pub fn recv(kernel: &mut Kernel, machine: &dyn Machine, receiver: Pid, from: Option<Pid>) -> RecvOutcome {
    let pcb = match kernel.pcbs.get_mut(receiver) {
        Some(p) => p,
        None => return RecvOutcome::WouldBlock,
    };

    let position = pcb.inbox.iter().position(|&msg_idx| {
        let msg = kernel.messages.get(msg_idx);
        match (from, msg) {
            (None, Some(_)) => true,
            (Some(want), Some(m)) => m.sender == want,
            (_, None) => false,
        }
    });

    match position {
        Some(i) => {
            let msg_idx = kernel.pcbs.get_mut(receiver).unwrap().inbox.remove(i).unwrap();
            let msg = kernel.messages.free(msg_idx).expect("inbox referenced a freed message");
            RecvOutcome::Delivered {
                sender: msg.sender,
                payload: msg.payload,
            }
        }
        None => {
            crate::sched::charge_running(kernel, machine, receiver);
            // Not counted in `soft_block_count`: see the comment in `send`.
            kernel.pcbs.get_mut(receiver).unwrap().state = ProcessState::Blocked(BlockedOn::Receive(from));
            RecvOutcome::WouldBlock
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::machine::mock::MockMachine;
    use crate::pool::pcb::Pcb;

    fn spawn(kernel: &mut Kernel, asid: u8) -> Pid {
        let pid = kernel.pcbs.alloc(Pcb::new(0, asid)).unwrap();
        kernel.pcbs.get_mut(pid).unwrap().pid = pid;
        pid
    }

    #[test]
    fn send_to_non_waiting_process_queues_without_waking() {
        let mut k = Kernel::new();
        let a = spawn(&mut k, 1);
        let b = spawn(&mut k, 2);
        send(&mut k, a, b, 42).unwrap();
        assert!(k.ready.is_empty());
        assert_eq!(k.pcbs.get(b).unwrap().inbox.len(), 1);
    }

    #[test]
    fn recv_then_send_delivers_and_wakes() {
        let mut k = Kernel::new();
        let m = MockMachine::new();
        let a = spawn(&mut k, 1);
        let b = spawn(&mut k, 2);
        assert!(matches!(recv(&mut k, &m, b, None), RecvOutcome::WouldBlock));
        assert_eq!(k.soft_block_count, 0);

        send(&mut k, a, b, 7).unwrap();
        assert_eq!(k.soft_block_count, 0);
        assert_eq!(k.ready.pop(), Some(b));
    }

    #[test]
    fn recv_filters_by_expected_sender() {
        let mut k = Kernel::new();
        let m = MockMachine::new();
        let a = spawn(&mut k, 1);
        let b = spawn(&mut k, 2);
        let c = spawn(&mut k, 3);
        send(&mut k, a, c, 1).unwrap();
        send(&mut k, b, c, 2).unwrap();
        match recv(&mut k, &m, c, Some(b)) {
            RecvOutcome::Delivered { sender, payload } => {
                assert_eq!(sender, b);
                assert_eq!(payload, 2);
            }
            RecvOutcome::WouldBlock => panic!("expected a delivery"),
        }
        // the message from `a` is still queued
        assert_eq!(k.pcbs.get(c).unwrap().inbox.len(), 1);
    }

    #[test]
    fn send_from_wrong_sender_does_not_wake_a_specific_wait() {
        let mut k = Kernel::new();
        let m = MockMachine::new();
        let a = spawn(&mut k, 1);
        let b = spawn(&mut k, 2);
        let c = spawn(&mut k, 3);
        assert!(matches!(recv(&mut k, &m, c, Some(b)), RecvOutcome::WouldBlock));
        send(&mut k, a, c, 99).unwrap();
        assert_eq!(k.soft_block_count, 0);
        assert!(k.ready.is_empty());

        send(&mut k, b, c, 7).unwrap();
        assert_eq!(k.soft_block_count, 0);
        assert_eq!(k.ready.pop(), Some(c));
    }

    #[test]
    fn send_to_unknown_pid_is_an_error() {
        let mut k = Kernel::new();
        let a = spawn(&mut k, 1);
        assert_eq!(send(&mut k, a, 99, 0), Err(KernelError::DestNotExist));
    }
}
