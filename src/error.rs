//! Unified error type for shared-usb.
//!
//! We avoid `alloc` - all error variants carry only fixed-size data.
//! Implements `defmt::Format` for on-target logging when enabled.

use core::fmt;

/// Crate result type.
pub type Result<T> = core::result::Result<T, Error>;

/// Top-level error type used across the crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    // Descriptors
    /// A descriptor did not fit in its fixed-capacity buffer.
    BufferOverflow,

    /// Device identity was already replaced, or descriptors were built.
    IdentityLocked,

    // Callbacks
    /// All set-report handler slots are taken.
    CallbackCapacity,

    /// No mass-storage medium backs the request.
    NotReady,

    // Controller
    /// The platform could not supply an interrupt line for the task.
    IrqUnavailable,

    /// Another context holds the controller access token.
    ControllerBusy,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::BufferOverflow => f.write_str("descriptor buffer overflow"),
            Error::IdentityLocked => f.write_str("device identity is locked"),
            Error::CallbackCapacity => f.write_str("set-report handler table full"),
            Error::NotReady => f.write_str("mass storage not ready"),
            Error::IrqUnavailable => f.write_str("no interrupt line available"),
            Error::ControllerBusy => f.write_str("controller access token held"),
        }
    }
}
