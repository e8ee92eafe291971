//! Crate-wide error type and the wire-level status codes the SSI and SST
//! return to their callers.

use core::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KernelError {
    /// The PCB free list is empty.
    NoFreePcb,
    /// The message free list is empty.
    NoFreeMessage,
    /// `searchProcQ`/`outProcQ` found nothing matching.
    NotFound,
    /// A service code the SSI/SST does not recognize.
    BadServiceCode,
    /// A process sent a payload or address outside its allowed range.
    BadArgument,
    /// The swap pool has no frame available and eviction found every frame
    /// pinned (should not happen with the mutex mediator serializing access).
    SwapPoolBusy,
    /// A device-proxy or mediator process queue is already at `MAXPROC`.
    QueueFull,
    /// Attempted an operation against a PCB/ASID that is not a live process.
    NoSuchProcess,
    /// `SENDMESSAGE` named a destination pid that is not a live process.
    DestNotExist,
}

impl fmt::Display for KernelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            KernelError::NoFreePcb => "no free PCB",
            KernelError::NoFreeMessage => "no free message descriptor",
            KernelError::NotFound => "not found",
            KernelError::BadServiceCode => "unrecognized service code",
            KernelError::BadArgument => "bad argument",
            KernelError::SwapPoolBusy => "swap pool busy",
            KernelError::QueueFull => "queue full",
            KernelError::NoSuchProcess => "no such process",
            KernelError::DestNotExist => "destination does not exist",
        };
        f.write_str(s)
    }
}

pub type Result<T> = core::result::Result<T, KernelError>;

/// Two-word (status, value) reply convention used by every SSI/SST service:
/// a caller always gets a signed status back, and most services
/// additionally return a payload value (a pid, a device status word, a
/// byte count, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum Status {
    Ok = 0,
    /// No free PCB to satisfy `CREATEPROCESS`.
    NoProc = -1,
    /// The request carried a service code or payload the broker rejected.
    MsgNoGood = -2,
    /// `TERMINATEPROCESS` targeted a pid that is not self or a descendant.
    NotPermitted = -3,
    /// `SENDMESSAGE` targeted a pid that is not a live process.
    DestNotExist = -4,
}

impl From<KernelError> for Status {
    fn from(e: KernelError) -> Self {
        match e {
            KernelError::NoFreePcb => Status::NoProc,
            KernelError::BadServiceCode | KernelError::BadArgument => Status::MsgNoGood,
            KernelError::NoSuchProcess => Status::NotPermitted,
            KernelError::DestNotExist => Status::DestNotExist,
            _ => Status::MsgNoGood,
        }
    }
}
