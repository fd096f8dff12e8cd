//! Controller task dispatch.
//!
//! The controller stack is driven from two kinds of context: application
//! code on either core, and a periodic software interrupt. All of them go
//! through one access token, an async mutex around the stack. The
//! interrupt never waits for it: if the token is held, that cycle is
//! skipped and the next timer tick tries again.
//!
//! ```text
//!  alarm (every 1 ms) ──pend──▶ software IRQ ──try_lock──▶ stack.task()
//!                                                │
//!                                  held ─────────┘ skip, retry next tick
//!
//!  app code ──lock().await──▶ stack.task() / direct stack calls
//! ```

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::mutex::Mutex;

use super::callbacks::DeviceCallbacks;
use super::composer::Composer;
use super::msc::{MassStorage, NoMedia};
use crate::config::USB_TASK_INTERVAL_US;
use crate::error::{Error, Result};

/// The underlying USB protocol engine.
pub trait ControllerStack {
    /// Whether `init` has run.
    fn is_initialized(&self) -> bool;

    fn init(&mut self);

    /// Process pending bus events, answering host requests through
    /// `callbacks`.
    fn task(&mut self, callbacks: &dyn DeviceCallbacks);
}

/// Interrupt and timer primitives of the host platform.
pub trait TaskPlatform {
    type Irq: Copy;

    /// Claim an unused interrupt line for the task.
    fn claim_irq(&self) -> Option<Self::Irq>;

    fn enable_irq(&self, irq: Self::Irq);

    /// Mark `irq` pending; the handler runs once the caller returns.
    fn pend_irq(&self, irq: Self::Irq);

    /// Arm a recurring alarm that calls [`Controller::on_alarm`] every
    /// `interval_us`.
    fn arm_alarm(&self, interval_us: u32);
}

/// Outcome of [`Controller::start`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Startup {
    Started,
    /// The stack was already initialised; nothing was done.
    AlreadyRunning,
}

/// Outcome of one interrupt cycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Dispatch {
    Ran,
    /// Another context held the access token.
    Skipped,
    /// Not started yet.
    Idle,
}

/// Owns the stack behind the access token, the platform hooks and the
/// descriptor composer.
pub struct Controller<S, P: TaskPlatform, M: MassStorage = NoMedia> {
    stack: Mutex<CriticalSectionRawMutex, S>,
    platform: P,
    composer: Composer<M>,
    irq: Option<P::Irq>,
}

impl<S, P, M> Controller<S, P, M>
where
    S: ControllerStack,
    P: TaskPlatform,
    M: MassStorage,
{
    pub fn new(stack: S, platform: P, composer: Composer<M>) -> Self {
        Self {
            stack: Mutex::new(stack),
            platform,
            composer,
            irq: None,
        }
    }

    /// Build descriptors, initialise the stack and start the periodic task.
    ///
    /// Runs once, before the controller is shared. A second call finds the
    /// stack initialised and returns [`Startup::AlreadyRunning`].
    pub fn start(&mut self) -> Result<Startup> {
        if self.stack.get_mut().is_initialized() {
            info!("usb already started");
            return Ok(Startup::AlreadyRunning);
        }

        self.composer.prepare()?;

        let irq = self.platform.claim_irq().ok_or_else(|| {
            warn!("no free interrupt line for the usb task");
            Error::IrqUnavailable
        })?;

        self.stack.get_mut().init();
        self.irq = Some(irq);
        self.platform.enable_irq(irq);
        self.platform.arm_alarm(USB_TASK_INTERVAL_US);

        info!("usb started, task every {} us", USB_TASK_INTERVAL_US);
        Ok(Startup::Started)
    }

    /// Timer callback: pend the task interrupt and return the delay until
    /// the next firing. Never touches the stack.
    pub fn on_alarm(&self) -> u32 {
        if let Some(irq) = self.irq {
            self.platform.pend_irq(irq);
        }
        USB_TASK_INTERVAL_US
    }

    /// Software interrupt handler body.
    pub fn on_interrupt(&self) -> Dispatch {
        if self.irq.is_none() {
            return Dispatch::Idle;
        }
        match self.stack.try_lock() {
            Ok(mut stack) => {
                stack.task(&self.composer);
                Dispatch::Ran
            }
            Err(_) => {
                trace!("usb task skipped, token held");
                Dispatch::Skipped
            }
        }
    }

    /// Drive the stack from application code, waiting for the token.
    pub async fn run_inline(&self) {
        let mut stack = self.stack.lock().await;
        stack.task(&self.composer);
    }

    /// Run `f` with exclusive access to the stack.
    pub async fn with_stack<R>(&self, f: impl FnOnce(&mut S) -> R) -> R {
        let mut stack = self.stack.lock().await;
        f(&mut stack)
    }

    /// Like [`Self::with_stack`], but fails instead of waiting.
    pub fn try_with_stack<R>(&self, f: impl FnOnce(&mut S) -> R) -> Result<R> {
        let mut stack = self.stack.try_lock().map_err(|_| Error::ControllerBusy)?;
        Ok(f(&mut stack))
    }

    pub fn is_started(&self) -> bool {
        self.irq.is_some()
    }

    pub fn composer(&self) -> &Composer<M> {
        &self.composer
    }

    /// Mutable access for identity setup before [`Self::start`].
    pub fn composer_mut(&mut self) -> &mut Composer<M> {
        &mut self.composer
    }

    pub fn platform(&self) -> &P {
        &self.platform
    }
}
