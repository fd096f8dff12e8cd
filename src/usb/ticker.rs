//! Cortex-M task platform: an NVIC software interrupt pended by an
//! `embassy-time` ticker.
//!
//! Typical wiring, with the controller in a `static`:
//!
//! ```ignore
//! #[interrupt]
//! fn SW0_IRQ() {
//!     USB.on_interrupt();
//! }
//!
//! #[embassy_executor::task]
//! async fn usb_timer() -> ! {
//!     shared_usb::usb::ticker::run_task_timer(&USB).await
//! }
//! ```

use core::cell::Cell;

use cortex_m::interrupt::InterruptNumber;
use cortex_m::peripheral::NVIC;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex as BlockingMutex;
use embassy_sync::signal::Signal;
use embassy_time::{Duration, Ticker};

use super::controller::{Controller, ControllerStack, TaskPlatform};
use super::msc::MassStorage;

/// Platform backed by one spare NVIC line reserved for the USB task.
pub struct NvicPlatform<I> {
    irq: I,
    claimed: BlockingMutex<CriticalSectionRawMutex, Cell<bool>>,
    interval: Signal<CriticalSectionRawMutex, u32>,
}

impl<I: InterruptNumber> NvicPlatform<I> {
    pub const fn new(irq: I) -> Self {
        Self {
            irq,
            claimed: BlockingMutex::new(Cell::new(false)),
            interval: Signal::new(),
        }
    }
}

impl<I: InterruptNumber> TaskPlatform for NvicPlatform<I> {
    type Irq = I;

    fn claim_irq(&self) -> Option<I> {
        let taken = self.claimed.lock(|claimed| claimed.replace(true));
        (!taken).then_some(self.irq)
    }

    fn enable_irq(&self, irq: I) {
        // SAFETY: the line is reserved for the USB task and its handler
        // only enters the controller through the access token.
        unsafe { NVIC::unmask(irq) }
    }

    fn pend_irq(&self, irq: I) {
        NVIC::pend(irq);
    }

    fn arm_alarm(&self, interval_us: u32) {
        self.interval.signal(interval_us);
    }
}

/// Fire [`Controller::on_alarm`] periodically once the controller has
/// started. Never returns.
pub async fn run_task_timer<S, I, M>(controller: &Controller<S, NvicPlatform<I>, M>) -> !
where
    S: ControllerStack,
    I: InterruptNumber,
    M: MassStorage,
{
    let mut interval = controller.platform().interval.wait().await;
    let mut ticker = Ticker::every(Duration::from_micros(u64::from(interval)));
    loop {
        ticker.next().await;
        let next = controller.on_alarm();
        if next != interval {
            debug!("usb task interval {} -> {} us", interval, next);
            interval = next;
            ticker = Ticker::every(Duration::from_micros(u64::from(interval)));
        }
    }
}
