//! Shared USB for dual-core boards.
//!
//! Composes a composite device (CDC serial, keyboard, mouse, gamepad,
//! consumer control, mass storage, raw HID) from a set of enabled roles,
//! and serialises every context that drives the USB controller stack
//! through one access token.
//!
//! Usage: `cargo test` runs everything on the host. Enable `embedded` for
//! the Cortex-M interrupt/timer glue and `defmt` logging.

#![cfg_attr(not(test), no_std)]

// Must come first so the logging macros are visible to later modules.
mod fmt;

pub mod config;
pub mod error;
pub mod hid;
pub mod roles;
pub mod usb;

pub use error::{Error, Result};
pub use roles::{Role, RoleFlags};
pub use usb::{Composer, Controller, DeviceIdentity};
