//! Compile-time configuration and protocol constants.
//!
//! Identity defaults, endpoint addresses, packet sizes and timing live
//! here so they can be tuned in one place.

// Device identity defaults

/// Raspberry Pi vendor ID.
pub const USB_VID: u16 = 0x2E8A;

/// Pico SDK CDC product ID. The product ID is only perturbed by the
/// enabled roles while it still equals this value.
pub const USB_PID: u16 = 0x000A;

pub const USB_MANUFACTURER: &str = "Raspberry Pi";
pub const USB_PRODUCT: &str = "PicoArduino";

/// Empty serial means "use the board unique ID".
pub const USB_SERIAL_NUMBER: &str = "";

/// Label of the CDC control interface.
pub const USB_CDC_LABEL: &str = "Board CDC";

/// bcdDevice reported in the device descriptor.
pub const USB_BCD_DEVICE: u16 = 0x0100;

/// Bus power drawn by the device (mA).
pub const USB_MAX_POWER_MA: u16 = 500;

/// Control endpoint packet size.
pub const USB_EP0_SIZE: u8 = 64;

// Product ID perturbation
//
// Windows caches drivers by VID/PID, so each multi-interface layout gets
// its own PID while the caller has not chosen one explicitly.

pub const PID_BIT_KEYBOARD: u16 = 0x8000;
pub const PID_BIT_MOUSE: u16 = 0x4000;
pub const PID_BIT_JOYSTICK: u16 = 0x0100;
pub const PID_BIT_MASS_STORAGE: u16 = 0x2000;
pub const PID_BIT_RAW_HID: u16 = 0x1000;

// Endpoints

pub const CDC_EP_NOTIFY: u8 = 0x81;
pub const CDC_EP_OUT: u8 = 0x02;
pub const CDC_EP_IN: u8 = 0x82;
pub const CDC_NOTIFY_SIZE: u16 = 8;
pub const CDC_DATA_SIZE: u16 = 64;

pub const HID_EP_IN: u8 = 0x83;

pub const MSC_EP_OUT: u8 = 0x03;
pub const MSC_EP_IN: u8 = 0x84;
pub const MSC_EP_SIZE: u16 = 64;

pub const RAW_HID_EP_OUT: u8 = 0x05;
pub const RAW_HID_EP_IN: u8 = 0x85;

/// HID interrupt endpoint buffer size (both shared and raw HID).
pub const HID_EP_SIZE: u16 = 64;

/// HID interrupt polling interval (ms).
pub const HID_POLL_MS: u8 = 10;

/// Size of the raw HID generic in/out report (bytes).
pub const RAW_HID_REPORT_SIZE: u8 = 64;

// Strings

/// String descriptor buffer length in UTF-16 units, header included.
pub const STRING_DESC_MAX: usize = 20;

/// Board unique ID length (bytes).
pub const BOARD_ID_LEN: usize = 8;

// Task dispatch

/// Period of the controller task timer (µs).
pub const USB_TASK_INTERVAL_US: u32 = 1000;

/// Number of HID set-report handlers that can be registered.
pub const SET_REPORT_HANDLERS: usize = 2;
