//! Consumer Control HID support - media keys, volume, etc.
//!
//! Consumer Control is a separate HID usage page (0x0C) that handles:
//! - Volume Up/Down/Mute
//! - Play/Pause/Stop/Next/Previous
//! - Browser controls (Back, Forward, Home)
//! - Power controls (Sleep)
//!
//! It shares the HID interface with the keyboard, mouse and gamepad and is
//! told apart by its report ID.

use super::ReportTemplate;

/// Consumer control report size (2 bytes for usage ID).
pub const CONSUMER_REPORT_SIZE: usize = 2;

/// Common consumer control usage codes (Usage Page 0x0C).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u16)]
pub enum ConsumerUsage {
    None = 0x0000,
    PlayPause = 0x00CD,
    NextTrack = 0x00B5,
    PrevTrack = 0x00B6,
    Stop = 0x00B7,
    VolumeUp = 0x00E9,
    VolumeDown = 0x00EA,
    Mute = 0x00E2,
    BrowserHome = 0x0223,
    BrowserBack = 0x0224,
    BrowserForward = 0x0225,
    BrowserRefresh = 0x0227,
    Sleep = 0x0032,
}

/// Consumer Control HID report.
///
/// Simple 2-byte report containing a single usage code.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ConsumerReport {
    /// Active consumer control usage (little-endian u16).
    pub usage: u16,
}

impl ConsumerReport {
    /// Create an empty (no keys pressed) report.
    pub const fn empty() -> Self {
        Self { usage: 0 }
    }

    /// Create a report with a single usage.
    pub const fn new(usage: ConsumerUsage) -> Self {
        Self {
            usage: usage as u16,
        }
    }

    /// Serialize to USB HID report bytes.
    pub fn serialize(&self, buf: &mut [u8]) -> usize {
        if buf.len() < CONSUMER_REPORT_SIZE {
            return 0;
        }
        buf[..CONSUMER_REPORT_SIZE].copy_from_slice(&self.usage.to_le_bytes());
        CONSUMER_REPORT_SIZE
    }

    pub fn is_empty(&self) -> bool {
        self.usage == 0
    }
}

/// Report template for Consumer Control: a single 16-bit usage.
pub const CONSUMER_TEMPLATE: ReportTemplate = ReportTemplate::new(&[
    0x05, 0x0C, // Usage Page (Consumer)
    0x09, 0x01, // Usage (Consumer Control)
    0xA1, 0x01, // Collection (Application)
    0x15, 0x01, //   Logical Minimum (1)
    0x26, 0xFF, 0x03, //   Logical Maximum (1023)
    0x19, 0x01, //   Usage Minimum (1)
    0x2A, 0xFF, 0x03, //   Usage Maximum (1023)
    0x95, 0x01, //   Report Count (1)
    0x75, 0x10, //   Report Size (16)
    0x81, 0x00, //   Input (Data, Array, Absolute)
    0xC0, // End Collection
]);
