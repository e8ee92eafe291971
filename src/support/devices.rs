//! Per-ASID printer/terminal device proxies: a process that wants to print
//! sends the string to its proxy, which feeds it to the device one
//! character at a time and replies once the last one lands. Collapsed
//! here into a job table plus a completion continuation rather than a
//! literal scheduled loop, the same simplification used for the pager.

use crate::config::devices::{Line, PER_LINE};
use crate::kernel::Kernel;
use crate::machine::{IoRequest, Machine};
use crate::pool::pcb::Pid;
use alloc::collections::VecDeque;
use alloc::vec::Vec;

struct PrintJob {
    proxy: Pid,
    requester: Pid,
    remaining: VecDeque<u8>,
}

pub struct DeviceProxies {
    printer_jobs: [Option<PrintJob>; PER_LINE],
    terminal_jobs: [Option<PrintJob>; PER_LINE],
}

impl DeviceProxies {
    pub fn new() -> Self {
        Self {
            printer_jobs: core::array::from_fn(|_| None),
            terminal_jobs: core::array::from_fn(|_| None),
        }
    }

    fn slot_mut(&mut self, line: Line, unit: u8) -> &mut Option<PrintJob> {
        match line {
            Line::Printer => &mut self.printer_jobs[unit as usize],
            Line::TerminalXmit => &mut self.terminal_jobs[unit as usize],
            _ => unreachable!("device proxies only exist for printer/terminal-transmit lines"),
        }
    }
}

/// Start a print job on `unit`'s proxy: `requester` gets a zero-payload
/// reply, sent by `proxy`, once every byte of `text` has gone out.
pub fn write(kernel: &mut Kernel, machine: &mut dyn Machine, proxy: Pid, requester: Pid, line: Line, unit: u8, text: &[u8]) {
    let mut remaining: VecDeque<u8> = text.iter().copied().collect();
    match remaining.pop_front() {
        Some(byte) => {
            machine.start_io(line, unit, IoRequest::PrintChar(byte));
            *kernel.devices.slot_mut(line, unit) = Some(PrintJob { proxy, requester, remaining });
        }
        None => {
            let _ = crate::ipc::send(kernel, proxy, requester, 0);
        }
    }
}

/// Called from `dispatch::interrupts::service_device_completions` for
/// printer/terminal-transmit completions. Returns `true` if a job owned
/// this completion (so the generic blocked-queue wake path should skip
/// it). A non-success status means the device itself failed mid-job; the
/// proxy has no way to recover a partially printed string, so this is a
/// fatal condition for the proxy rather than something to retry.
pub fn on_char_completion(kernel: &mut Kernel, machine: &mut dyn Machine, line: Line, unit: u8, status: u32) -> bool {
    let job = match kernel.devices.slot_mut(line, unit).as_mut() {
        Some(j) => j,
        None => return false,
    };
    assert_eq!(status, 0, "device proxy on {line:?} unit {unit} got a failed character-print completion");

    match job.remaining.pop_front() {
        Some(byte) => {
            machine.start_io(line, unit, IoRequest::PrintChar(byte));
            true
        }
        None => {
            let job = kernel.devices.slot_mut(line, unit).take().unwrap();
            let _ = crate::ipc::send(kernel, job.proxy, job.requester, 0);
            true
        }
    }
}

pub fn printer_ascii(text: &str) -> Vec<u8> {
    text.bytes().collect()
}
