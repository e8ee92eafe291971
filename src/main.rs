//! Thin demo entry point, built only with `--features bin`.
//!
//! This crate models kernel logic against the [`nanokern::machine::Machine`]
//! trait and ships no concrete bare-metal backend for it (see
//! `machine::mock`), so there's no freestanding image to produce here —
//! just a hosted loop that boots the static process tree and runs the
//! scheduler against a mock machine until it halts or deadlocks.

use nanokern::init;
use nanokern::kernel::Kernel;
use nanokern::machine::mock::MockMachine;
use nanokern::sched::{self, Decision};

fn main() {
    let mut kernel = Kernel::new();
    let mut machine = MockMachine::new();

    let boot = init::boot(&mut kernel, &mut machine);
    println!(
        "booted: root={}, {} user process(es), {} process(es) live",
        boot.root,
        boot.user_procs.len(),
        kernel.process_count()
    );

    for round in 0..kernel.process_count() * 2 {
        match sched::schedule(&mut kernel, &mut machine) {
            Decision::Dispatch(pid) => {
                println!("round {round}: dispatch pid {pid}");
                sched::requeue(&mut kernel, pid);
            }
            Decision::Wait => {
                nanokern::dispatch::interrupts::service_device_completions(&mut kernel, &mut machine);
                nanokern::dispatch::interrupts::service_interval_timer(&mut kernel);
            }
            Decision::Halt => {
                println!("round {round}: halt, no processes remain");
                break;
            }
            Decision::Deadlock => {
                println!("round {round}: deadlock, nothing runnable or soft-blocked");
                break;
            }
        }
    }
}
