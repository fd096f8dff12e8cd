//! Joystick role, exposed to the host as a gamepad.
//!
//! Layout (11 bytes, after the report ID):
//! ```text
//! Byte 0-5:  X, Y, Z, Rz, Rx, Ry (signed, -127..127)
//! Byte 6:    Hat switch (0 = centered, 1..8 clockwise from north)
//! Byte 7-10: 32 button bits (little-endian)
//! ```

use super::ReportTemplate;

/// Gamepad report size in bytes.
pub const GAMEPAD_REPORT_SIZE: usize = 11;

#[derive(Clone, Copy, Default, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct GamepadReport {
    pub x: i8,
    pub y: i8,
    pub z: i8,
    pub rz: i8,
    pub rx: i8,
    pub ry: i8,
    pub hat: Hat,
    pub buttons: u32,
}

/// Hat switch position.
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Hat {
    #[default]
    Centered = 0,
    Up = 1,
    UpRight = 2,
    Right = 3,
    DownRight = 4,
    Down = 5,
    DownLeft = 6,
    Left = 7,
    UpLeft = 8,
}

impl GamepadReport {
    /// Serialise into a byte slice for USB HID transmission.
    /// Returns the number of bytes written (0 if `buf` is too small).
    pub fn serialize(&self, buf: &mut [u8]) -> usize {
        if buf.len() < GAMEPAD_REPORT_SIZE {
            return 0;
        }
        buf[0] = self.x as u8;
        buf[1] = self.y as u8;
        buf[2] = self.z as u8;
        buf[3] = self.rz as u8;
        buf[4] = self.rx as u8;
        buf[5] = self.ry as u8;
        buf[6] = self.hat as u8;
        buf[7..11].copy_from_slice(&self.buttons.to_le_bytes());
        GAMEPAD_REPORT_SIZE
    }
}

/// Report template for the gamepad: six 8-bit axes, a hat switch and
/// 32 buttons.
pub const GAMEPAD_TEMPLATE: ReportTemplate = ReportTemplate::new(&[
    0x05, 0x01, // Usage Page (Generic Desktop)
    0x09, 0x05, // Usage (Game Pad)
    0xA1, 0x01, // Collection (Application)
    //
    //   - Axes -
    0x05, 0x01, //   Usage Page (Generic Desktop)
    0x09, 0x30, //   Usage (X)
    0x09, 0x31, //   Usage (Y)
    0x09, 0x32, //   Usage (Z)
    0x09, 0x35, //   Usage (Rz)
    0x09, 0x33, //   Usage (Rx)
    0x09, 0x34, //   Usage (Ry)
    0x15, 0x81, //   Logical Minimum (-127)
    0x25, 0x7F, //   Logical Maximum (127)
    0x95, 0x06, //   Report Count (6)
    0x75, 0x08, //   Report Size (8)
    0x81, 0x02, //   Input (Data, Variable, Absolute)
    //
    //   - Hat switch -
    0x05, 0x01, //   Usage Page (Generic Desktop)
    0x09, 0x39, //   Usage (Hat Switch)
    0x15, 0x01, //   Logical Minimum (1)
    0x25, 0x08, //   Logical Maximum (8)
    0x35, 0x00, //   Physical Minimum (0)
    0x46, 0x3B, 0x01, // Physical Maximum (315)
    0x95, 0x01, //   Report Count (1)
    0x75, 0x08, //   Report Size (8)
    0x81, 0x02, //   Input (Data, Variable, Absolute)
    //
    //   - Buttons -
    0x05, 0x09, //   Usage Page (Buttons)
    0x19, 0x01, //   Usage Minimum (Button 1)
    0x29, 0x20, //   Usage Maximum (Button 32)
    0x15, 0x00, //   Logical Minimum (0)
    0x25, 0x01, //   Logical Maximum (1)
    0x95, 0x20, //   Report Count (32)
    0x75, 0x01, //   Report Size (1)
    0x81, 0x02, //   Input (Data, Variable, Absolute)
    //
    0xC0, // End Collection
]);
