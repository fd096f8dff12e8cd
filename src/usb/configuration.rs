//! Composite configuration descriptor.
//!
//! Interface groups are laid out in a fixed precedence order: CDC serial,
//! shared HID, mass storage, raw HID. Each enabled group takes the next
//! free interface number(s); endpoint addresses are fixed per group.

use heapless::Vec;

use super::descriptor::{self, CDC_LEN, CONFIG_LEN, HID_INOUT_LEN, HID_LEN, MSC_LEN};
use crate::error::{Error, Result};
use crate::roles::{Role, RoleFlags};

/// Capacity of the configuration descriptor buffer.
pub const CONFIG_CAPACITY: usize = 256;

pub type ConfigBuffer = Vec<u8, CONFIG_CAPACITY>;

/// A block of interfaces contributed by one or more roles.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum InterfaceGroup {
    CdcSerial,
    Hid,
    MassStorage,
    RawHid,
}

impl InterfaceGroup {
    /// Layout order.
    pub const PRECEDENCE: [InterfaceGroup; 4] = [
        InterfaceGroup::CdcSerial,
        InterfaceGroup::Hid,
        InterfaceGroup::MassStorage,
        InterfaceGroup::RawHid,
    ];

    pub const fn interface_count(self) -> u8 {
        match self {
            InterfaceGroup::CdcSerial => 2,
            _ => 1,
        }
    }

    /// Size of this group's block in the configuration descriptor.
    pub const fn descriptor_len(self) -> usize {
        match self {
            InterfaceGroup::CdcSerial => CDC_LEN,
            InterfaceGroup::Hid => HID_LEN,
            InterfaceGroup::MassStorage => MSC_LEN,
            InterfaceGroup::RawHid => HID_INOUT_LEN,
        }
    }

    pub fn is_enabled(self, roles: RoleFlags) -> bool {
        match self {
            InterfaceGroup::CdcSerial => roles.contains(Role::Serial),
            InterfaceGroup::Hid => roles.has_simple_hid(),
            InterfaceGroup::MassStorage => roles.contains(Role::MassStorage),
            InterfaceGroup::RawHid => roles.contains(Role::RawHid),
        }
    }
}

/// One enabled group and the first interface number it owns.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct InterfaceSlot {
    pub group: InterfaceGroup,
    pub first_interface: u8,
}

/// Interface numbering derived from the enabled roles.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InterfaceLayout {
    slots: Vec<InterfaceSlot, 4>,
    interface_count: u8,
}

impl InterfaceLayout {
    pub fn compute(roles: RoleFlags) -> Self {
        let mut slots = Vec::new();
        let mut next = 0u8;
        for group in InterfaceGroup::PRECEDENCE {
            if !group.is_enabled(roles) {
                continue;
            }
            // At most one slot per group.
            let _ = slots.push(InterfaceSlot {
                group,
                first_interface: next,
            });
            next += group.interface_count();
        }
        Self {
            slots,
            interface_count: next,
        }
    }

    pub fn slots(&self) -> &[InterfaceSlot] {
        &self.slots
    }

    /// First interface number of `group`, if enabled.
    pub fn interface_of(&self, group: InterfaceGroup) -> Option<u8> {
        self.slots
            .iter()
            .find(|slot| slot.group == group)
            .map(|slot| slot.first_interface)
    }

    /// Total interfaces (bNumInterfaces).
    pub fn interface_count(&self) -> u8 {
        self.interface_count
    }

    /// Exact configuration descriptor length, header included.
    pub fn total_len(&self) -> usize {
        CONFIG_LEN
            + self
                .slots
                .iter()
                .map(|slot| slot.group.descriptor_len())
                .sum::<usize>()
    }
}

/// Assemble the configuration descriptor.
///
/// `hid_report_len` and `raw_report_len` are embedded in the HID class
/// descriptors, so the report descriptors must be built first.
pub fn build(
    layout: &InterfaceLayout,
    hid_report_len: usize,
    raw_report_len: usize,
) -> Result<ConfigBuffer> {
    let total = layout.total_len();
    if total > CONFIG_CAPACITY {
        warn!("configuration descriptor needs {} bytes", total);
        return Err(Error::BufferOverflow);
    }

    let mut buf = ConfigBuffer::new();
    buf.resize(total, 0).map_err(|_| Error::BufferOverflow)?;

    let header = descriptor::config_header(total as u16, layout.interface_count());
    buf[..CONFIG_LEN].copy_from_slice(&header);

    let mut offset = CONFIG_LEN;
    for slot in layout.slots() {
        let itf = slot.first_interface;
        let len = slot.group.descriptor_len();
        let dst = &mut buf[offset..offset + len];
        match slot.group {
            InterfaceGroup::CdcSerial => dst.copy_from_slice(&descriptor::cdc(itf)),
            InterfaceGroup::Hid => {
                dst.copy_from_slice(&descriptor::hid(itf, hid_report_len as u16))
            }
            InterfaceGroup::MassStorage => dst.copy_from_slice(&descriptor::msc(itf)),
            InterfaceGroup::RawHid => {
                dst.copy_from_slice(&descriptor::hid_inout(itf, raw_report_len as u16))
            }
        }
        offset += len;
    }

    debug!(
        "configuration descriptor: {} interfaces, {} bytes",
        layout.interface_count(),
        total
    );
    Ok(buf)
}
