//! Host-testable simulation of a small preemptive microkernel.
//!
//! The crate is organized the way the system it models is layered:
//! fixed-capacity process/message pools and queues at the bottom
//! ([`pool`]), a round-robin scheduler and exception/interrupt dispatch on
//! top of those ([`sched`], [`dispatch`]), a privileged broker process that
//! is the only thing allowed to touch the pools directly ([`ssi`]), and a
//! support level built on top of the nucleus that adds demand paging
//! ([`vm`]) and delegated device access ([`support`]).
//!
//! Real hardware is never touched directly: every module above talks to a
//! [`machine::Machine`] trait object, so the whole kernel runs and is tested
//! on the host via [`machine::mock`].
// The `bin` feature runs the demo entry point hosted under `std` (see
// `main.rs`), since this crate has no concrete bare-metal `Machine` to
// freestand on; a `#[panic_handler]`/`#[global_allocator]` pair would
// collide with the ones `std` already provides, so no_std only applies to
// the library on its own (the shape it'd take embedded behind a real
// `Machine` impl elsewhere).
#![cfg_attr(not(any(test, feature = "bin")), no_std)]
#![cfg_attr(not(any(test, feature = "bin")), feature(alloc_error_handler))]
#![cfg_attr(feature = "strict", deny(warnings))]

extern crate alloc;

pub mod config;
pub mod kutil;
pub mod log;
pub mod build_info;
pub mod time;
pub mod trace;
pub mod heap;

pub mod machine;
pub mod pool;
pub mod kernel;
pub mod ipc;
pub mod sched;
pub mod dispatch;
pub mod ssi;
pub mod vm;
pub mod support;
pub mod init;

#[cfg(test)]
mod scenarios;

pub use kutil::error::{KernelError, Result};
