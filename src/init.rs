//! Boot sequence: heap and kernel state come up first, then the static
//! process tree every support-level service assumes is already there — a
//! root process, and per-ASID pairs of (user process, printer proxy,
//! terminal proxy).

use crate::config::{self, UPROCMAX};
use crate::kernel::Kernel;
use crate::machine::Machine;
use crate::pool::pcb::{CpuState, Mode, Pcb, Pid};
use crate::ssi::{self, Reply, Request};
use crate::support::Support;

pub struct Boot {
    pub root: Pid,
    pub user_procs: [Pid; UPROCMAX],
    pub printer_proxies: [Pid; UPROCMAX],
    pub terminal_proxies: [Pid; UPROCMAX],
}

/// Allocate the root process directly (it has no parent to request it
/// from the SSI), then spin up one user process and its two device proxies
/// per ASID.
pub fn boot(kernel: &mut Kernel, machine: &mut dyn Machine) -> Boot {
    crate::heap::init();
    crate::kutil::bootlog::milestone("heap-ready");

    let root = spawn_root(kernel);
    crate::kutil::bootlog::milestone("root-process-ready");

    let mut user_procs = [0 as Pid; UPROCMAX];
    let mut printer_proxies = [0 as Pid; UPROCMAX];
    let mut terminal_proxies = [0 as Pid; UPROCMAX];

    for i in 0..UPROCMAX {
        let asid = (i + 1) as u8;
        printer_proxies[i] = spawn_device_proxy(kernel, machine, root, asid);
        terminal_proxies[i] = spawn_device_proxy(kernel, machine, root, asid);
        user_procs[i] = spawn_user_process(kernel, machine, root, asid);
    }
    crate::kutil::bootlog::milestone("user-processes-ready");

    Boot { root, user_procs, printer_proxies, terminal_proxies }
}

fn spawn_root(kernel: &mut Kernel) -> Pid {
    let pid = kernel.pcbs.alloc(Pcb::new(0, 0)).expect("pool sized for the root process");
    kernel.pcbs.get_mut(pid).unwrap().pid = pid;
    crate::sched::requeue(kernel, pid);
    pid
}

/// Per `initUProc`: PC and `t9` both start at the entry point, the stack
/// starts at the top of `kuseg`, interrupts and the PLT are enabled. Every
/// user process gets a real support structure, not just a tag, so a program
/// trap can actually pass control up to it.
fn spawn_user_process(kernel: &mut Kernel, machine: &mut dyn Machine, root: Pid, asid: u8) -> Pid {
    let initial_state = CpuState {
        pc: config::UPROCSTARTADDR,
        sp: config::USERSTACKTOP,
        status: 0,
        regs: [0; 29],
    };
    let support_idx = kernel.support.alloc(Support::new(asid)).expect("support pool sized for UPROCMAX");
    kernel.support_by_asid[asid as usize - 1] = Some(support_idx);

    let child = match ssi::request(kernel, machine, root, Request::CreateProcess { initial_state, support: Some(support_idx) }) {
        Reply::Value(pid) => pid as Pid,
        Reply::NoReply => unreachable!("CREATEPROCESS always replies"),
    };
    let pcb = kernel.pcbs.get_mut(child).unwrap();
    pcb.asid = asid;
    pcb.mode = Mode::User;
    child
}

fn spawn_device_proxy(kernel: &mut Kernel, machine: &mut dyn Machine, root: Pid, asid: u8) -> Pid {
    let child = match ssi::request(kernel, machine, root, Request::CreateProcess { initial_state: CpuState::default(), support: None }) {
        Reply::Value(pid) => pid as Pid,
        Reply::NoReply => unreachable!("CREATEPROCESS always replies"),
    };
    kernel.pcbs.get_mut(child).unwrap().asid = asid;
    child
}
