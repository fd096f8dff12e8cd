//! Raw HID role: one vendor-defined bidirectional report on its own
//! interface. It carries no report ID.

use crate::config::RAW_HID_REPORT_SIZE;

/// Generic 64-byte in/out report (vendor usage page 0xFF00).
pub const RAW_HID_REPORT_DESCRIPTOR: &[u8] = &[
    0x06, 0x00, 0xFF, // Usage Page (Vendor Defined 0xFF00)
    0x09, 0x01, // Usage (Vendor 1)
    0xA1, 0x01, // Collection (Application)
    //
    //   - Input -
    0x09, 0x02, //   Usage (Vendor 2)
    0x15, 0x00, //   Logical Minimum (0)
    0x26, 0xFF, 0x00, //   Logical Maximum (255)
    0x75, 0x08, //   Report Size (8)
    0x95, RAW_HID_REPORT_SIZE, //   Report Count
    0x81, 0x02, //   Input (Data, Variable, Absolute)
    //
    //   - Output -
    0x09, 0x03, //   Usage (Vendor 3)
    0x15, 0x00, //   Logical Minimum (0)
    0x26, 0xFF, 0x00, //   Logical Maximum (255)
    0x75, 0x08, //   Report Size (8)
    0x95, RAW_HID_REPORT_SIZE, //   Report Count
    0x91, 0x02, //   Output (Data, Variable, Absolute)
    //
    0xC0, // End Collection
];
