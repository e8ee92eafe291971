//! The two Nucleus-level syscalls every process (not just the SSI) may
//! issue directly: `SENDMESSAGE` and `RECEIVEMESSAGE`.

use super::Outcome;
use crate::ipc::{self, RecvOutcome};
use crate::kernel::Kernel;
use crate::machine::Machine;
use crate::pool::pcb::Pid;

pub enum Request {
    SendMessage { dest: Pid, payload: usize },
    ReceiveMessage { from: Option<Pid> },
}

/// `SENDMESSAGE` never blocks the caller. `RECEIVEMESSAGE` blocks it when
/// nothing is queued yet; the scheduler is responsible for noticing that
/// and not re-enqueuing it.
pub fn handle(kernel: &mut Kernel, machine: &mut dyn Machine, caller: Pid, req: Request) -> Outcome {
    match req {
        Request::SendMessage { dest, payload } => {
            let status = match ipc::send(kernel, caller, dest, payload) {
                Ok(()) => 0i32,
                Err(e) => crate::kutil::error::Status::from(e) as i32,
            };
            set_return_value(kernel, caller, status);
            Outcome::Continue
        }
        Request::ReceiveMessage { from } => match ipc::recv(kernel, machine, caller, from) {
            RecvOutcome::Delivered { sender, .. } => {
                set_return_value(kernel, caller, sender as i32);
                Outcome::Continue
            }
            RecvOutcome::WouldBlock => Outcome::Continue,
        },
    }
}

fn set_return_value(kernel: &mut Kernel, pid: Pid, value: i32) {
    if let Some(pcb) = kernel.pcbs.get_mut(pid) {
        pcb.cpu_state.regs[0] = value as u32;
    }
}
