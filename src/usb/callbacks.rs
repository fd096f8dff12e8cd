//! Inbound requests from the controller stack.
//!
//! The stack queries descriptors and forwards class requests through
//! [`DeviceCallbacks`]. HID set-report notifications fan out to the
//! handlers registered on a [`SetReportRouter`].

use core::cell::RefCell;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex as BlockingMutex;
use heapless::Vec;

use super::identity::StringDescriptor;
use super::msc::{Capacity, Inquiry, Lun};
use crate::config::SET_REPORT_HANDLERS;
use crate::error::{Error, Result};
use crate::hid::ReportType;

/// Everything the controller stack may ask of the device while it runs.
///
/// Object safe, so the stack can take `&dyn DeviceCallbacks`.
pub trait DeviceCallbacks {
    fn device_descriptor(&self) -> &[u8];

    /// Configuration descriptor; the index is ignored (single configuration).
    fn configuration_descriptor(&self, index: u8) -> Option<&[u8]>;

    /// `None` for indices past the string table.
    fn string_descriptor(&self, index: u8, langid: u16) -> Option<StringDescriptor>;

    /// Report descriptor for a HID instance, `None` if it does not exist.
    fn hid_report_descriptor(&self, instance: u8) -> Option<&[u8]>;

    /// GET_REPORT is not supported; returning 0 makes the stack stall.
    fn hid_get_report(
        &self,
        _instance: u8,
        _report_id: u8,
        _report_type: ReportType,
        _buf: &mut [u8],
    ) -> usize {
        0
    }

    fn hid_set_report(&self, instance: u8, report_id: u8, report_type: ReportType, data: &[u8]);

    fn msc_test_unit_ready(&self, lun: Lun) -> bool;
    fn msc_capacity(&self, lun: Lun) -> Capacity;
    fn msc_inquiry(&self, lun: Lun) -> Inquiry;
    fn msc_read10(&self, lun: Lun, lba: u32, offset: u32, buf: &mut [u8]) -> Result<usize>;
    fn msc_write10(&self, lun: Lun, lba: u32, offset: u32, buf: &[u8]) -> Result<usize>;
    fn msc_scsi(&self, lun: Lun, command: &[u8; 16], buf: &mut [u8]) -> Result<usize>;
}

/// Set-report handler: instance, report ID, report type, payload.
pub type SetReportFn = fn(u8, u8, ReportType, &[u8]);

/// Bounded, ordered table of set-report handlers.
pub struct SetReportRouter {
    handlers: BlockingMutex<CriticalSectionRawMutex, RefCell<Vec<SetReportFn, SET_REPORT_HANDLERS>>>,
}

impl SetReportRouter {
    pub const fn new() -> Self {
        Self {
            handlers: BlockingMutex::new(RefCell::new(Vec::new())),
        }
    }

    /// Register `handler` after those already present.
    pub fn subscribe(&self, handler: SetReportFn) -> Result<()> {
        self.handlers.lock(|handlers| {
            handlers.borrow_mut().push(handler).map_err(|_| {
                warn!("set-report handler table full ({})", SET_REPORT_HANDLERS);
                Error::CallbackCapacity
            })
        })
    }

    pub fn len(&self) -> usize {
        self.handlers.lock(|handlers| handlers.borrow().len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Invoke every handler in registration order.
    ///
    /// The table is copied out first so handlers run outside the critical
    /// section and may themselves subscribe.
    pub fn dispatch(&self, instance: u8, report_id: u8, report_type: ReportType, data: &[u8]) {
        let handlers = self.handlers.lock(|handlers| handlers.borrow().clone());
        trace!(
            "set-report itf {} id {} len {} -> {} handlers",
            instance,
            report_id,
            data.len(),
            handlers.len()
        );
        for handler in &handlers {
            handler(instance, report_id, report_type, data);
        }
    }
}

impl Default for SetReportRouter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::sync::atomic::{AtomicU32, Ordering};

    static CALLS: AtomicU32 = AtomicU32::new(0);

    // Each handler shifts in its own digit so the order is observable.
    fn first(_: u8, _: u8, _: ReportType, _: &[u8]) {
        let _ = CALLS.fetch_update(Ordering::SeqCst, Ordering::SeqCst, |v| Some(v * 10 + 1));
    }

    fn second(instance: u8, report_id: u8, report_type: ReportType, data: &[u8]) {
        assert_eq!(instance, 1);
        assert_eq!(report_id, 2);
        assert_eq!(report_type, ReportType::Output);
        assert_eq!(data, &[0x02]);
        let _ = CALLS.fetch_update(Ordering::SeqCst, Ordering::SeqCst, |v| Some(v * 10 + 2));
    }

    fn noop(_: u8, _: u8, _: ReportType, _: &[u8]) {}

    #[test]
    fn handlers_run_in_registration_order() {
        let router = SetReportRouter::new();
        router.subscribe(first).unwrap();
        router.subscribe(second).unwrap();
        router.dispatch(1, 2, ReportType::Output, &[0x02]);
        assert_eq!(CALLS.load(Ordering::SeqCst), 12);
    }

    #[test]
    fn third_handler_is_rejected() {
        let router = SetReportRouter::new();
        assert!(router.is_empty());
        router.subscribe(noop).unwrap();
        router.subscribe(noop).unwrap();
        assert_eq!(router.subscribe(noop), Err(Error::CallbackCapacity));
        assert_eq!(router.len(), 2);
    }

    #[test]
    fn dispatch_without_handlers_is_noop() {
        SetReportRouter::new().dispatch(0, 0, ReportType::Invalid, &[]);
    }
}
