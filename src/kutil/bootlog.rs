//! Boot milestone log: a short, fixed-capacity record of the phases the
//! kernel passed through during [`crate::init::boot`], independent of the
//! general-purpose [`crate::log`] ring so it survives even if logging policy
//! is set to a level that would otherwise drop it.

use spin::Mutex;

const MAX_MILESTONES: usize = 32;

#[derive(Clone, Copy)]
pub struct Milestone {
    pub name: &'static str,
    pub timestamp_us: u64,
}

struct BootLog {
    entries: [Option<Milestone>; MAX_MILESTONES],
    next: usize,
}

static BOOTLOG: Mutex<BootLog> = Mutex::new(BootLog {
    entries: [None; MAX_MILESTONES],
    next: 0,
});

/// Record a boot milestone. Silently drops once the fixed capacity is
/// exhausted rather than growing: a boot sequence with more than
/// [`MAX_MILESTONES`] phases indicates a bug in `init`, not a need for more
/// room.
pub fn milestone(name: &'static str) {
    let mut log = BOOTLOG.lock();
    if log.next < MAX_MILESTONES {
        let ts = crate::time::now_us();
        let idx = log.next;
        log.entries[idx] = Some(Milestone {
            name,
            timestamp_us: ts,
        });
        log.next += 1;
    }
}

pub fn milestones() -> alloc::vec::Vec<Milestone> {
    let log = BOOTLOG.lock();
    log.entries[..log.next].iter().filter_map(|m| *m).collect()
}
