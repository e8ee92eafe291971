//! Panic handler for the real (`cfg(not(any(test, feature = "bin")))`)
//! build. Under `cargo test` or `--features bin`, std's own panic handler
//! is used instead — the former is what makes ordinary assertion failures
//! behave normally, the latter is what lets the hosted demo binary link.

use core::panic::PanicInfo;
use core::sync::atomic::{AtomicBool, Ordering};

#[cfg(not(any(test, feature = "bin")))]
static PANICKING: AtomicBool = AtomicBool::new(false);

#[cfg(not(any(test, feature = "bin")))]
#[panic_handler]
fn panic(info: &PanicInfo) -> ! {
    if PANICKING.swap(true, Ordering::SeqCst) {
        loop {}
    }
    crate::error!("panic: {}", info);
    loop {}
}
