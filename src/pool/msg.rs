//! Message descriptors, allocated from the shared message pool and queued
//! on a receiving PCB's inbox by index.

use super::pcb::Pid;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Message {
    pub sender: Pid,
    pub payload: usize,
}

impl Message {
    pub fn new(sender: Pid, payload: usize) -> Self {
        Self { sender, payload }
    }
}

pub type MsgPool = crate::pool::Arena<Message, { crate::config::MAXMESSAGES }>;
