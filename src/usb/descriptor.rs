//! Standard USB descriptor encoders.
//!
//! Every encoder is a `const fn` returning a fixed-size array, so the
//! length of each block is known at compile time and the configuration
//! builder can size its buffer before copying anything.

use crate::config;

/// Device descriptor length.
pub const DEVICE_LEN: usize = 18;
/// Configuration descriptor header length.
pub const CONFIG_LEN: usize = 9;
/// CDC-ACM block: IAD, control interface, functional descriptors, data interface.
pub const CDC_LEN: usize = 66;
/// HID interface with one interrupt IN endpoint.
pub const HID_LEN: usize = 25;
/// Mass-storage interface (SCSI transparent, bulk-only).
pub const MSC_LEN: usize = 23;
/// HID interface with interrupt OUT and IN endpoints.
pub const HID_INOUT_LEN: usize = 32;

// Descriptor types
const DESC_DEVICE: u8 = 0x01;
const DESC_CONFIGURATION: u8 = 0x02;
const DESC_INTERFACE: u8 = 0x04;
const DESC_ENDPOINT: u8 = 0x05;
const DESC_IAD: u8 = 0x0B;
const DESC_HID: u8 = 0x21;
const DESC_HID_REPORT: u8 = 0x22;
const DESC_CS_INTERFACE: u8 = 0x24;

// Classes
const CLASS_CDC: u8 = 0x02;
const CLASS_HID: u8 = 0x03;
const CLASS_MSC: u8 = 0x08;
const CLASS_CDC_DATA: u8 = 0x0A;
const CLASS_MISC: u8 = 0xEF;

const MISC_SUBCLASS_COMMON: u8 = 0x02;
const MISC_PROTOCOL_IAD: u8 = 0x01;
const CDC_SUBCLASS_ACM: u8 = 0x02;
const MSC_SUBCLASS_SCSI: u8 = 0x06;
const MSC_PROTOCOL_BOT: u8 = 0x50;

// Endpoint transfer types
const XFER_BULK: u8 = 0x02;
const XFER_INTERRUPT: u8 = 0x03;

const CONFIG_ATT_RESERVED: u8 = 0x80;
const CONFIG_ATT_REMOTE_WAKEUP: u8 = 0x20;

const USB_BCD: u16 = 0x0200;
const CDC_BCD: u16 = 0x0120;
const HID_BCD: u16 = 0x0111;

/// String index of the manufacturer, product and serial strings.
pub const STR_MANUFACTURER: u8 = 1;
pub const STR_PRODUCT: u8 = 2;
pub const STR_SERIAL: u8 = 3;
/// String index of the CDC control interface label.
pub const STR_CDC: u8 = 4;

const fn lo(v: u16) -> u8 {
    v.to_le_bytes()[0]
}

const fn hi(v: u16) -> u8 {
    v.to_le_bytes()[1]
}

/// Device descriptor: USB 2.0, IAD-capable composite, one configuration.
pub const fn device(vendor_id: u16, product_id: u16) -> [u8; DEVICE_LEN] {
    [
        DEVICE_LEN as u8,
        DESC_DEVICE,
        lo(USB_BCD),
        hi(USB_BCD),
        CLASS_MISC,
        MISC_SUBCLASS_COMMON,
        MISC_PROTOCOL_IAD,
        config::USB_EP0_SIZE,
        lo(vendor_id),
        hi(vendor_id),
        lo(product_id),
        hi(product_id),
        lo(config::USB_BCD_DEVICE),
        hi(config::USB_BCD_DEVICE),
        STR_MANUFACTURER,
        STR_PRODUCT,
        STR_SERIAL,
        1,
    ]
}

/// Configuration header for configuration 1 with remote wakeup.
pub const fn config_header(total_len: u16, interfaces: u8) -> [u8; CONFIG_LEN] {
    [
        CONFIG_LEN as u8,
        DESC_CONFIGURATION,
        lo(total_len),
        hi(total_len),
        interfaces,
        1,
        0,
        CONFIG_ATT_RESERVED | CONFIG_ATT_REMOTE_WAKEUP,
        (config::USB_MAX_POWER_MA / 2) as u8,
    ]
}

/// CDC-ACM function on interfaces `itf` (control) and `itf + 1` (data).
#[rustfmt::skip]
pub const fn cdc(itf: u8) -> [u8; CDC_LEN] {
    let data = itf + 1;
    let notify = config::CDC_NOTIFY_SIZE;
    let size = config::CDC_DATA_SIZE;
    [
        // Interface association
        8, DESC_IAD, itf, 2, CLASS_CDC, CDC_SUBCLASS_ACM, 0, 0,
        // Control interface
        9, DESC_INTERFACE, itf, 0, 1, CLASS_CDC, CDC_SUBCLASS_ACM, 0, STR_CDC,
        // Header
        5, DESC_CS_INTERFACE, 0x00, lo(CDC_BCD), hi(CDC_BCD),
        // Call management
        5, DESC_CS_INTERFACE, 0x01, 0, data,
        // ACM: line coding and serial state
        4, DESC_CS_INTERFACE, 0x02, 2,
        // Union
        5, DESC_CS_INTERFACE, 0x06, itf, data,
        // Notification endpoint
        7, DESC_ENDPOINT, config::CDC_EP_NOTIFY, XFER_INTERRUPT, lo(notify), hi(notify), 16,
        // Data interface
        9, DESC_INTERFACE, data, 0, 2, CLASS_CDC_DATA, 0, 0, 0,
        7, DESC_ENDPOINT, config::CDC_EP_OUT, XFER_BULK, lo(size), hi(size), 0,
        7, DESC_ENDPOINT, config::CDC_EP_IN, XFER_BULK, lo(size), hi(size), 0,
    ]
}

/// Shared HID interface; `report_len` is the shared report descriptor length.
#[rustfmt::skip]
pub const fn hid(itf: u8, report_len: u16) -> [u8; HID_LEN] {
    let size = config::HID_EP_SIZE;
    [
        9, DESC_INTERFACE, itf, 0, 1, CLASS_HID, 0, 0, 0,
        9, DESC_HID, lo(HID_BCD), hi(HID_BCD), 0, 1, DESC_HID_REPORT, lo(report_len), hi(report_len),
        7, DESC_ENDPOINT, config::HID_EP_IN, XFER_INTERRUPT, lo(size), hi(size), config::HID_POLL_MS,
    ]
}

/// Bulk-only mass-storage interface.
#[rustfmt::skip]
pub const fn msc(itf: u8) -> [u8; MSC_LEN] {
    let size = config::MSC_EP_SIZE;
    [
        9, DESC_INTERFACE, itf, 0, 2, CLASS_MSC, MSC_SUBCLASS_SCSI, MSC_PROTOCOL_BOT, 0,
        7, DESC_ENDPOINT, config::MSC_EP_OUT, XFER_BULK, lo(size), hi(size), 0,
        7, DESC_ENDPOINT, config::MSC_EP_IN, XFER_BULK, lo(size), hi(size), 0,
    ]
}

/// Raw HID interface with interrupt OUT and IN endpoints.
#[rustfmt::skip]
pub const fn hid_inout(itf: u8, report_len: u16) -> [u8; HID_INOUT_LEN] {
    let size = config::HID_EP_SIZE;
    [
        9, DESC_INTERFACE, itf, 0, 2, CLASS_HID, 0, 0, 0,
        9, DESC_HID, lo(HID_BCD), hi(HID_BCD), 0, 1, DESC_HID_REPORT, lo(report_len), hi(report_len),
        7, DESC_ENDPOINT, config::RAW_HID_EP_OUT, XFER_INTERRUPT, lo(size), hi(size), config::HID_POLL_MS,
        7, DESC_ENDPOINT, config::RAW_HID_EP_IN, XFER_INTERRUPT, lo(size), hi(size), config::HID_POLL_MS,
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Walk a descriptor block and return the byte offsets of each descriptor.
    fn walk(block: &[u8]) -> heapless::Vec<usize, 16> {
        let mut offsets = heapless::Vec::new();
        let mut pos = 0;
        while pos < block.len() {
            offsets.push(pos).unwrap();
            assert!(block[pos] > 0, "zero-length descriptor at {}", pos);
            pos += block[pos] as usize;
        }
        assert_eq!(pos, block.len());
        offsets
    }

    #[test]
    fn device_descriptor_layout() {
        let d = device(0x2E8A, 0xC00A);
        assert_eq!(d[0], 18);
        assert_eq!(d[1], 0x01);
        assert_eq!(&d[2..4], &[0x00, 0x02]);
        assert_eq!(&d[4..7], &[0xEF, 0x02, 0x01]);
        assert_eq!(d[7], 64);
        assert_eq!(&d[8..12], &[0x8A, 0x2E, 0x0A, 0xC0]);
        assert_eq!(&d[12..14], &[0x00, 0x01]);
        assert_eq!(&d[14..], &[1, 2, 3, 1]);
    }

    #[test]
    fn config_header_encodes_length_and_power() {
        let h = config_header(0x0102, 5);
        assert_eq!(h, [9, 2, 0x02, 0x01, 5, 1, 0, 0xA0, 250]);
    }

    #[test]
    fn cdc_block_is_well_formed() {
        let block = cdc(0);
        assert_eq!(walk(&block).len(), 10);
        assert_eq!(&block[..8], &[8, 0x0B, 0, 2, 2, 2, 0, 0]);
        // Data interface follows the control interface.
        assert_eq!(block[44], 4);
        assert_eq!(block[45], 1);
        assert_eq!(&block[52..59], &[7, 5, 0x02, 2, 64, 0, 0]);
        assert_eq!(&block[59..], &[7, 5, 0x82, 2, 64, 0, 0]);
    }

    #[test]
    fn cdc_block_tracks_interface_number() {
        let block = cdc(3);
        assert_eq!(block[2], 3);
        assert_eq!(block[10], 3);
        // Union: control 3, subordinate 4.
        assert_eq!(&block[34..36], &[3, 4]);
    }

    #[test]
    fn hid_block_embeds_report_length() {
        let block = hid(2, 0x0123);
        assert_eq!(walk(&block).len(), 3);
        assert_eq!(block[2], 2);
        assert_eq!(&block[16..18], &[0x23, 0x01]);
        assert_eq!(&block[18..], &[7, 5, 0x83, 3, 64, 0, 10]);
    }

    #[test]
    fn msc_block_is_bulk_only_scsi() {
        let block = msc(1);
        assert_eq!(walk(&block).len(), 3);
        assert_eq!(&block[..9], &[9, 4, 1, 0, 2, 8, 6, 0x50, 0]);
        assert_eq!(block[11], 0x03);
        assert_eq!(block[18], 0x84);
    }

    #[test]
    fn hid_inout_block_has_two_interrupt_endpoints() {
        let block = hid_inout(4, 34);
        assert_eq!(walk(&block).len(), 4);
        assert_eq!(block[2], 4);
        assert_eq!(&block[16..18], &[34, 0]);
        assert_eq!(&block[18..25], &[7, 5, 0x05, 3, 64, 0, 10]);
        assert_eq!(&block[25..], &[7, 5, 0x85, 3, 64, 0, 10]);
    }
}
