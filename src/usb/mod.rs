//! USB device side: descriptor composition and controller dispatch.
//!
//! The [`Composer`] builds every descriptor from the enabled roles and
//! answers the controller stack's queries. The [`Controller`] owns the
//! stack behind the access token and drives it from the periodic
//! interrupt or from application code.

pub mod callbacks;
pub mod composer;
pub mod configuration;
pub mod controller;
pub mod descriptor;
pub mod identity;
pub mod msc;
#[cfg(feature = "embedded")]
pub mod ticker;

pub use callbacks::{DeviceCallbacks, SetReportFn, SetReportRouter};
pub use composer::Composer;
pub use configuration::{InterfaceGroup, InterfaceLayout};
pub use controller::{Controller, ControllerStack, Dispatch, Startup, TaskPlatform};
pub use identity::{DeviceIdentity, StringDescriptor};
pub use msc::{MassStorage, NoMedia};
