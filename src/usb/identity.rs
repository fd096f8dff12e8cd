//! Device identity: vendor/product IDs and the string table.

use core::cell::RefCell;
use core::fmt::Write;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex as BlockingMutex;
use heapless::{String, Vec};

use super::descriptor::{self, DEVICE_LEN};
use crate::config;
use crate::roles::{Role, RoleFlags};

/// Vendor/product IDs and strings reported to the host.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DeviceIdentity {
    pub vendor_id: u16,
    /// Base product ID. Left at [`config::USB_PID`] it is perturbed by the
    /// enabled roles; any other value is reported unchanged.
    pub product_id: u16,
    pub manufacturer: &'static str,
    pub product: &'static str,
    /// Empty means "derive from the board unique ID".
    pub serial: &'static str,
}

impl Default for DeviceIdentity {
    fn default() -> Self {
        Self {
            vendor_id: config::USB_VID,
            product_id: config::USB_PID,
            manufacturer: config::USB_MANUFACTURER,
            product: config::USB_PRODUCT,
            serial: config::USB_SERIAL_NUMBER,
        }
    }
}

impl DeviceIdentity {
    /// Device descriptor for this identity with `roles` enabled.
    pub fn device_descriptor(&self, roles: RoleFlags) -> [u8; DEVICE_LEN] {
        descriptor::device(self.vendor_id, derive_product_id(self.product_id, roles))
    }
}

/// Product ID reported for `base` with `roles` enabled.
///
/// Only the default PID is perturbed: each simple-HID role ORs in a bit and
/// mass storage / raw HID toggle one, so hosts that cache drivers per PID
/// see a distinct device for every layout.
pub fn derive_product_id(base: u16, roles: RoleFlags) -> u16 {
    if base != config::USB_PID {
        return base;
    }
    let mut pid = base;
    if roles.contains(Role::Keyboard) {
        pid |= config::PID_BIT_KEYBOARD;
    }
    if roles.contains(Role::Mouse) {
        pid |= config::PID_BIT_MOUSE;
    }
    if roles.contains(Role::Joystick) {
        pid |= config::PID_BIT_JOYSTICK;
    }
    if roles.contains(Role::MassStorage) {
        pid ^= config::PID_BIT_MASS_STORAGE;
    }
    if roles.contains(Role::RawHid) {
        pid ^= config::PID_BIT_RAW_HID;
    }
    pid
}

// String descriptors

/// Fixed string table slots.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum StringIndex {
    Language = 0,
    Manufacturer = descriptor::STR_MANUFACTURER,
    Product = descriptor::STR_PRODUCT,
    Serial = descriptor::STR_SERIAL,
    CdcLabel = descriptor::STR_CDC,
}

impl StringIndex {
    /// `None` for indices past the end of the table.
    pub fn from_index(index: u8) -> Option<Self> {
        match index {
            0 => Some(Self::Language),
            descriptor::STR_MANUFACTURER => Some(Self::Manufacturer),
            descriptor::STR_PRODUCT => Some(Self::Product),
            descriptor::STR_SERIAL => Some(Self::Serial),
            descriptor::STR_CDC => Some(Self::CdcLabel),
            _ => None,
        }
    }
}

const DESC_STRING: u16 = 0x03;
const LANGID_EN_US: u16 = 0x0409;

/// A string descriptor in UTF-16 words, header word first.
///
/// The header packs the descriptor type in the high byte and the byte
/// length (header included) in the low byte.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StringDescriptor {
    words: Vec<u16, { config::STRING_DESC_MAX }>,
}

impl StringDescriptor {
    /// Descriptor 0: the supported language list (US English only).
    pub fn languages() -> Self {
        Self::from_units(core::iter::once(LANGID_EN_US))
    }

    /// Encode `s`, truncated to the maximum number of UTF-16 units.
    pub fn new(s: &str) -> Self {
        Self::from_units(s.encode_utf16())
    }

    fn from_units(units: impl Iterator<Item = u16>) -> Self {
        let mut words = Vec::new();
        // Header slot, patched below. Capacity is never reached: the
        // iterator is bounded to the remaining slots.
        let _ = words.push(0);
        for unit in units.take(config::STRING_DESC_MAX - 1) {
            let _ = words.push(unit);
        }
        let len = (words.len() - 1) as u16;
        words[0] = (DESC_STRING << 8) | (2 * len + 2);
        Self { words }
    }

    /// Number of UTF-16 units after the header.
    pub fn len(&self) -> usize {
        self.words.len() - 1
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Header and payload as handed to the stack.
    pub fn as_words(&self) -> &[u16] {
        &self.words
    }
}

// Serial number

/// Hex characters in a formatted board ID.
pub const SERIAL_LEN: usize = config::BOARD_ID_LEN * 2;

/// Platform hook returning the board's unique identifier.
pub type BoardIdFn = fn() -> [u8; config::BOARD_ID_LEN];

/// Serial string generated from the board ID on first use, then cached.
pub struct SerialNumber {
    board_id: BoardIdFn,
    cache: BlockingMutex<CriticalSectionRawMutex, RefCell<Option<String<SERIAL_LEN>>>>,
}

impl SerialNumber {
    pub const fn new(board_id: BoardIdFn) -> Self {
        Self {
            board_id,
            cache: BlockingMutex::new(RefCell::new(None)),
        }
    }

    /// Run `f` on the serial string, reading the board ID if needed.
    pub fn with<R>(&self, f: impl FnOnce(&str) -> R) -> R {
        self.cache.lock(|cache| {
            let mut cache = cache.borrow_mut();
            let serial = cache.get_or_insert_with(|| {
                let id = (self.board_id)();
                debug!("serial number generated from board id");
                format_board_id(&id)
            });
            f(serial.as_str())
        })
    }

    pub fn is_generated(&self) -> bool {
        self.cache.lock(|cache| cache.borrow().is_some())
    }
}

/// Uppercase hex, most significant byte first.
fn format_board_id(id: &[u8; config::BOARD_ID_LEN]) -> String<SERIAL_LEN> {
    let mut out = String::new();
    for byte in id {
        // Exactly two characters per byte fill the buffer without overflow.
        let _ = write!(out, "{:02X}", byte);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn default_identity_matches_config() {
        let id = DeviceIdentity::default();
        assert_eq!(id.vendor_id, 0x2E8A);
        assert_eq!(id.product_id, 0x000A);
        assert_eq!(id.manufacturer, "Raspberry Pi");
        assert_eq!(id.product, "PicoArduino");
        assert!(id.serial.is_empty());
    }

    #[test]
    fn keyboard_and_mouse_set_high_bits() {
        let roles = RoleFlags::empty().with(Role::Keyboard).with(Role::Mouse);
        assert_eq!(derive_product_id(0x000A, roles), 0x000A | 0x8000 | 0x4000);
    }

    #[test]
    fn storage_and_raw_hid_toggle_bits() {
        let roles = RoleFlags::empty()
            .with(Role::Joystick)
            .with(Role::MassStorage)
            .with(Role::RawHid);
        assert_eq!(derive_product_id(0x000A, roles), 0x000A ^ 0x0100 ^ 0x2000 ^ 0x1000);
    }

    #[test]
    fn serial_and_consumer_leave_pid_alone() {
        let roles = RoleFlags::empty()
            .with(Role::Serial)
            .with(Role::ConsumerControl);
        assert_eq!(derive_product_id(0x000A, roles), 0x000A);
    }

    #[test]
    fn explicit_pid_passes_through() {
        assert_eq!(derive_product_id(0x1234, RoleFlags::all()), 0x1234);
    }

    #[test]
    fn device_descriptor_uses_derived_pid() {
        let roles = RoleFlags::empty().with(Role::Keyboard);
        let d = DeviceIdentity::default().device_descriptor(roles);
        assert_eq!(u16::from_le_bytes([d[10], d[11]]), 0x800A);
    }

    #[test]
    fn language_descriptor() {
        let d = StringDescriptor::languages();
        assert_eq!(d.len(), 1);
        assert_eq!(d.as_words(), &[0x0304, 0x0409]);
    }

    #[test]
    fn string_descriptor_header_and_payload() {
        let d = StringDescriptor::new("Pico");
        assert_eq!(d.as_words()[0], 0x030A);
        assert_eq!(&d.as_words()[1..], &[b'P' as u16, b'i' as u16, b'c' as u16, b'o' as u16]);
    }

    #[test]
    fn long_strings_are_truncated() {
        let d = StringDescriptor::new("ABCDEFGHIJKLMNOPQRSTUVWXYZ");
        assert_eq!(d.len(), 19);
        assert_eq!(d.as_words()[0], 0x0300 | 40);
        assert_eq!(d.as_words()[19], b'S' as u16);
    }

    #[test]
    fn empty_string_has_header_only() {
        let d = StringDescriptor::new("");
        assert!(d.is_empty());
        assert_eq!(d.as_words(), &[0x0302]);
    }

    #[test]
    fn string_index_bounds() {
        assert_eq!(StringIndex::from_index(0), Some(StringIndex::Language));
        assert_eq!(StringIndex::from_index(4), Some(StringIndex::CdcLabel));
        assert_eq!(StringIndex::from_index(5), None);
        assert_eq!(StringIndex::from_index(0xEE), None);
    }

    static READS: AtomicUsize = AtomicUsize::new(0);

    fn counting_board_id() -> [u8; 8] {
        READS.fetch_add(1, Ordering::SeqCst);
        [0xE6, 0x60, 0x58, 0x38, 0x83, 0x0B, 0x2A, 0x2F]
    }

    #[test]
    fn serial_is_generated_once() {
        let serial = SerialNumber::new(counting_board_id);
        assert!(!serial.is_generated());
        serial.with(|s| assert_eq!(s, "E6605838830B2A2F"));
        serial.with(|s| assert_eq!(s, "E6605838830B2A2F"));
        assert!(serial.is_generated());
        assert_eq!(READS.load(Ordering::SeqCst), 1);
    }
}
