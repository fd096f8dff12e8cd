//! The device composer: owns every descriptor the stack will ask for.
//!
//! Descriptors are built once, in dependency order (report IDs, report
//! descriptors, configuration), and are read-only afterwards.

use super::callbacks::{DeviceCallbacks, SetReportFn, SetReportRouter};
use super::configuration::{self, ConfigBuffer, InterfaceLayout};
use super::descriptor::DEVICE_LEN;
use super::identity::{BoardIdFn, DeviceIdentity, SerialNumber, StringDescriptor, StringIndex};
use super::msc::{Capacity, Inquiry, Lun, MassStorage, NoMedia};
use crate::config;
use crate::error::{Error, Result};
use crate::hid::{self, HidInstances, RawReportBuffer, ReportBuffer, ReportIds, ReportType};
use crate::roles::RoleFlags;

struct ReportDescriptors {
    shared: Option<ReportBuffer>,
    raw: Option<RawReportBuffer>,
}

/// Composes the descriptor set for a fixed set of roles.
pub struct Composer<M: MassStorage = NoMedia> {
    roles: RoleFlags,
    identity: DeviceIdentity,
    identity_replaced: bool,
    report_ids: ReportIds,
    instances: HidInstances,
    device: [u8; DEVICE_LEN],
    reports: Option<ReportDescriptors>,
    configuration: Option<ConfigBuffer>,
    serial: SerialNumber,
    router: SetReportRouter,
    storage: M,
}

impl Composer<NoMedia> {
    /// Composer with default identity and no mass-storage medium.
    pub fn new(roles: RoleFlags, board_id: BoardIdFn) -> Self {
        Self::with_storage(roles, board_id, NoMedia)
    }
}

impl<M: MassStorage> Composer<M> {
    pub fn with_storage(roles: RoleFlags, board_id: BoardIdFn, storage: M) -> Self {
        let identity = DeviceIdentity::default();
        Self {
            roles,
            identity,
            identity_replaced: false,
            report_ids: ReportIds::allocate(roles),
            instances: HidInstances::resolve(roles),
            device: identity.device_descriptor(roles),
            reports: None,
            configuration: None,
            serial: SerialNumber::new(board_id),
            router: SetReportRouter::new(),
            storage,
        }
    }

    /// Replace the default identity. Allowed once, before descriptors
    /// are built.
    pub fn set_identity(&mut self, identity: DeviceIdentity) -> Result<()> {
        if self.identity_replaced || self.is_prepared() {
            warn!("device identity already fixed");
            return Err(Error::IdentityLocked);
        }
        self.identity = identity;
        self.identity_replaced = true;
        self.device = identity.device_descriptor(self.roles);
        Ok(())
    }

    /// Register a HID set-report handler.
    pub fn subscribe_set_report(&self, handler: SetReportFn) -> Result<()> {
        self.router.subscribe(handler)
    }

    /// Build the shared and raw HID report descriptors. No-op once built.
    pub fn build_report_descriptors(&mut self) -> Result<()> {
        if self.reports.is_some() {
            return Ok(());
        }
        let shared = hid::build_shared_report(self.roles)?;
        let raw = hid::build_raw_report(self.roles)?;
        self.reports = Some(ReportDescriptors { shared, raw });
        Ok(())
    }

    /// Build the configuration descriptor, report descriptors first.
    /// No-op once built.
    pub fn build_configuration(&mut self) -> Result<()> {
        if self.configuration.is_some() {
            return Ok(());
        }
        self.build_report_descriptors()?;
        let layout = InterfaceLayout::compute(self.roles);
        let buf = configuration::build(
            &layout,
            self.shared_report().map_or(0, <[u8]>::len),
            self.raw_report().map_or(0, <[u8]>::len),
        )?;
        self.configuration = Some(buf);
        Ok(())
    }

    /// Build every descriptor. Safe to call repeatedly.
    pub fn prepare(&mut self) -> Result<()> {
        self.build_configuration()?;
        info!(
            "usb composer ready: pid {=u16:#x}, {} report ids, config {} bytes",
            product_id_of(&self.device),
            self.report_ids.count(),
            self.configuration().map_or(0, <[u8]>::len)
        );
        Ok(())
    }

    pub fn is_prepared(&self) -> bool {
        self.configuration.is_some()
    }

    pub fn roles(&self) -> RoleFlags {
        self.roles
    }

    pub fn identity(&self) -> &DeviceIdentity {
        &self.identity
    }

    pub fn report_ids(&self) -> &ReportIds {
        &self.report_ids
    }

    pub fn instances(&self) -> HidInstances {
        self.instances
    }

    pub fn shared_report(&self) -> Option<&[u8]> {
        self.reports.as_ref()?.shared.as_deref()
    }

    pub fn raw_report(&self) -> Option<&[u8]> {
        self.reports.as_ref()?.raw.as_deref()
    }

    pub fn configuration(&self) -> Option<&[u8]> {
        self.configuration.as_deref()
    }

    pub fn storage(&self) -> &M {
        &self.storage
    }
}

fn product_id_of(device: &[u8; DEVICE_LEN]) -> u16 {
    u16::from_le_bytes([device[10], device[11]])
}

impl<M: MassStorage> DeviceCallbacks for Composer<M> {
    fn device_descriptor(&self) -> &[u8] {
        &self.device
    }

    fn configuration_descriptor(&self, _index: u8) -> Option<&[u8]> {
        self.configuration()
    }

    fn string_descriptor(&self, index: u8, _langid: u16) -> Option<StringDescriptor> {
        let desc = match StringIndex::from_index(index)? {
            StringIndex::Language => StringDescriptor::languages(),
            StringIndex::Manufacturer => StringDescriptor::new(self.identity.manufacturer),
            StringIndex::Product => StringDescriptor::new(self.identity.product),
            StringIndex::Serial if self.identity.serial.is_empty() => {
                self.serial.with(StringDescriptor::new)
            }
            StringIndex::Serial => StringDescriptor::new(self.identity.serial),
            StringIndex::CdcLabel => StringDescriptor::new(config::USB_CDC_LABEL),
        };
        Some(desc)
    }

    fn hid_report_descriptor(&self, instance: u8) -> Option<&[u8]> {
        if self.instances.shared == Some(instance) {
            self.shared_report()
        } else if self.instances.raw == Some(instance) {
            self.raw_report()
        } else {
            None
        }
    }

    fn hid_set_report(&self, instance: u8, report_id: u8, report_type: ReportType, data: &[u8]) {
        self.router.dispatch(instance, report_id, report_type, data);
    }

    fn msc_test_unit_ready(&self, lun: Lun) -> bool {
        self.storage.test_unit_ready(lun)
    }

    fn msc_capacity(&self, lun: Lun) -> Capacity {
        self.storage.capacity(lun)
    }

    fn msc_inquiry(&self, lun: Lun) -> Inquiry {
        self.storage.inquiry(lun)
    }

    fn msc_read10(&self, lun: Lun, lba: u32, offset: u32, buf: &mut [u8]) -> Result<usize> {
        self.storage.read10(lun, lba, offset, buf)
    }

    fn msc_write10(&self, lun: Lun, lba: u32, offset: u32, buf: &[u8]) -> Result<usize> {
        self.storage.write10(lun, lba, offset, buf)
    }

    fn msc_scsi(&self, lun: Lun, command: &[u8; 16], buf: &mut [u8]) -> Result<usize> {
        self.storage.scsi(lun, command, buf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::roles::Role;

    fn board_id() -> [u8; 8] {
        [0x01, 0x23, 0x45, 0x67, 0x89, 0xAB, 0xCD, 0xEF]
    }

    fn composer(roles: RoleFlags) -> Composer {
        Composer::new(roles, board_id)
    }

    #[test]
    fn configuration_build_is_idempotent() {
        let roles = RoleFlags::empty().with(Role::Serial).with(Role::Keyboard);
        let mut c = composer(roles);
        c.build_configuration().unwrap();
        let first: ConfigBuffer = ConfigBuffer::from_slice(c.configuration().unwrap()).unwrap();
        let ptr = c.configuration().unwrap().as_ptr();
        c.build_configuration().unwrap();
        assert_eq!(c.configuration().unwrap(), first.as_slice());
        assert_eq!(c.configuration().unwrap().as_ptr(), ptr);
    }

    #[test]
    fn descriptors_absent_before_prepare() {
        let c = composer(RoleFlags::all());
        assert!(!c.is_prepared());
        assert_eq!(c.configuration_descriptor(0), None);
        assert_eq!(c.hid_report_descriptor(0), None);
    }

    #[test]
    fn hid_interface_embeds_shared_report_length() {
        let roles = RoleFlags::empty().with(Role::Keyboard).with(Role::Mouse);
        let mut c = composer(roles);
        c.prepare().unwrap();
        let report_len = c.shared_report().unwrap().len();
        let cfg = c.configuration().unwrap();
        assert_eq!(u16::from_le_bytes([cfg[25], cfg[26]]) as usize, report_len);
    }

    #[test]
    fn report_descriptor_by_instance() {
        let roles = RoleFlags::empty().with(Role::Mouse).with(Role::RawHid);
        let mut c = composer(roles);
        c.prepare().unwrap();
        assert_eq!(c.hid_report_descriptor(0), c.shared_report());
        assert_eq!(c.hid_report_descriptor(1), Some(hid::raw::RAW_HID_REPORT_DESCRIPTOR));
        assert_eq!(c.hid_report_descriptor(2), None);
    }

    #[test]
    fn raw_only_report_is_instance_zero() {
        let mut c = composer(RoleFlags::empty().with(Role::RawHid));
        c.prepare().unwrap();
        assert_eq!(c.shared_report(), None);
        assert_eq!(c.hid_report_descriptor(0), Some(hid::raw::RAW_HID_REPORT_DESCRIPTOR));
    }

    #[test]
    fn identity_can_be_replaced_once() {
        let mut c = composer(RoleFlags::empty().with(Role::Keyboard));
        let custom = DeviceIdentity {
            product_id: 0x1234,
            product: "Macro Pad",
            ..DeviceIdentity::default()
        };
        c.set_identity(custom).unwrap();
        assert_eq!(c.set_identity(custom), Err(Error::IdentityLocked));
        assert_eq!(&c.device_descriptor()[10..12], &[0x34, 0x12]);
    }

    #[test]
    fn identity_locked_after_prepare() {
        let mut c = composer(RoleFlags::empty());
        c.prepare().unwrap();
        assert_eq!(
            c.set_identity(DeviceIdentity::default()),
            Err(Error::IdentityLocked)
        );
    }

    #[test]
    fn string_table_lookup() {
        let c = composer(RoleFlags::empty());
        let words = |i| c.string_descriptor(i, 0x0409).unwrap();
        assert_eq!(words(0).as_words(), &[0x0304, 0x0409]);
        assert_eq!(words(1), StringDescriptor::new("Raspberry Pi"));
        assert_eq!(words(2), StringDescriptor::new("PicoArduino"));
        assert_eq!(words(3), StringDescriptor::new("0123456789ABCDEF"));
        assert_eq!(words(4), StringDescriptor::new("Board CDC"));
        assert_eq!(c.string_descriptor(5, 0x0409), None);
    }

    #[test]
    fn explicit_serial_skips_board_id() {
        let mut c = composer(RoleFlags::empty());
        c.set_identity(DeviceIdentity {
            serial: "SN-42",
            ..DeviceIdentity::default()
        })
        .unwrap();
        assert_eq!(c.string_descriptor(3, 0), Some(StringDescriptor::new("SN-42")));
        assert!(!c.serial.is_generated());
    }

    #[test]
    fn langid_is_ignored() {
        let c = composer(RoleFlags::empty());
        assert_eq!(c.string_descriptor(2, 0x0407), c.string_descriptor(2, 0x0409));
    }

    #[test]
    fn get_report_is_unsupported() {
        let c = composer(RoleFlags::all());
        let mut buf = [0u8; 8];
        assert_eq!(c.hid_get_report(0, 1, ReportType::Input, &mut buf), 0);
    }

    #[test]
    fn mass_storage_defaults_to_no_media() {
        let c = composer(RoleFlags::empty().with(Role::MassStorage));
        let mut buf = [0u8; 16];
        assert!(!c.msc_test_unit_ready(0));
        assert_eq!(c.msc_capacity(0), Capacity::default());
        assert_eq!(c.msc_read10(0, 0, 0, &mut buf), Err(Error::NotReady));
    }
}
