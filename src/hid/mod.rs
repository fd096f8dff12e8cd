//! HID report IDs, report descriptor aggregation and report framing.
//!
//! The keyboard, mouse, gamepad and consumer-control roles share one HID
//! interface. Each enabled role gets a sequential report ID starting at 1
//! in that fixed order, and the shared report descriptor is the
//! concatenation of their templates stamped with those IDs. The raw HID
//! role lives on a second interface with its own descriptor.

pub mod consumer;
pub mod gamepad;
pub mod keyboard;
pub mod mouse;
pub mod raw;


use heapless::Vec;

use crate::error::{Error, Result};
use crate::roles::{Role, RoleFlags};

pub use consumer::{ConsumerReport, ConsumerUsage};
pub use gamepad::{GamepadReport, Hat};
pub use keyboard::{KeyboardLeds, KeyboardReport};
pub use mouse::MouseReport;

/// Capacity of the shared report descriptor buffer.
pub const HID_REPORT_CAPACITY: usize = 256;

/// Capacity of the raw HID report descriptor buffer.
pub const RAW_REPORT_CAPACITY: usize = 64;

/// Shared (keyboard/mouse/gamepad/consumer) report descriptor.
pub type ReportBuffer = Vec<u8, HID_REPORT_CAPACITY>;

/// Raw HID report descriptor.
pub type RawReportBuffer = Vec<u8, RAW_REPORT_CAPACITY>;

// Report templates

/// Global item prefix for Report ID (one data byte).
const REPORT_ID_ITEM: u8 = 0x85;

/// A fixed report descriptor whose report ID item is inserted right after
/// the application collection opener (usage page, usage, collection).
#[derive(Clone, Copy, Debug)]
pub struct ReportTemplate {
    body: &'static [u8],
}

impl ReportTemplate {
    /// Bytes preceding the report ID item.
    const ID_OFFSET: usize = 6;

    pub const fn new(body: &'static [u8]) -> Self {
        Self { body }
    }

    /// Length once stamped with a report ID.
    pub const fn stamped_len(&self) -> usize {
        self.body.len() + 2
    }

    /// Append the template stamped with `report_id` to `out`.
    pub fn stamp_into<const N: usize>(&self, report_id: u8, out: &mut Vec<u8, N>) -> Result<()> {
        let (head, tail) = self.body.split_at(Self::ID_OFFSET);
        let id_item: &[u8] = &[REPORT_ID_ITEM, report_id];
        for part in [head, id_item, tail] {
            out.extend_from_slice(part)
                .map_err(|_| Error::BufferOverflow)?;
        }
        Ok(())
    }
}

/// Template for a simple-HID role; `None` for roles with no shared report.
pub fn template(role: Role) -> Option<&'static ReportTemplate> {
    match role {
        Role::Keyboard => Some(&keyboard::KEYBOARD_TEMPLATE),
        Role::Mouse => Some(&mouse::MOUSE_TEMPLATE),
        Role::Joystick => Some(&gamepad::GAMEPAD_TEMPLATE),
        Role::ConsumerControl => Some(&consumer::CONSUMER_TEMPLATE),
        _ => None,
    }
}

// Report ID allocation

/// Report IDs of the simple-HID roles; `None` for disabled roles.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ReportIds {
    pub keyboard: Option<u8>,
    pub mouse: Option<u8>,
    pub joystick: Option<u8>,
    pub consumer: Option<u8>,
}

impl ReportIds {
    /// Assign 1-based IDs to the enabled simple-HID roles in
    /// keyboard, mouse, joystick, consumer-control order.
    pub fn allocate(roles: RoleFlags) -> Self {
        let mut ids = Self::default();
        let mut next = 1u8;
        for role in Role::SIMPLE_HID {
            if roles.contains(role) {
                if let Some(slot) = ids.slot_mut(role) {
                    *slot = Some(next);
                }
                next += 1;
            }
        }
        ids
    }

    /// Report ID for `role`, or `None` if it is disabled or not a
    /// simple-HID role.
    pub fn get(&self, role: Role) -> Option<u8> {
        match role {
            Role::Keyboard => self.keyboard,
            Role::Mouse => self.mouse,
            Role::Joystick => self.joystick,
            Role::ConsumerControl => self.consumer,
            _ => None,
        }
    }

    /// Role owning `report_id` on the shared interface.
    pub fn role_for(&self, report_id: u8) -> Option<Role> {
        Role::SIMPLE_HID
            .into_iter()
            .find(|&role| self.get(role) == Some(report_id))
    }

    /// Number of allocated IDs.
    pub fn count(&self) -> usize {
        Role::SIMPLE_HID
            .iter()
            .filter(|&&role| self.get(role).is_some())
            .count()
    }

    fn slot_mut(&mut self, role: Role) -> Option<&mut Option<u8>> {
        match role {
            Role::Keyboard => Some(&mut self.keyboard),
            Role::Mouse => Some(&mut self.mouse),
            Role::Joystick => Some(&mut self.joystick),
            Role::ConsumerControl => Some(&mut self.consumer),
            _ => None,
        }
    }
}

/// HID instance numbers as seen by the controller stack.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct HidInstances {
    /// Instance carrying the shared simple-HID reports.
    pub shared: Option<u8>,
    /// Instance carrying the raw HID report.
    pub raw: Option<u8>,
}

impl HidInstances {
    pub fn resolve(roles: RoleFlags) -> Self {
        let has_shared = roles.has_simple_hid();
        let has_raw = roles.contains(Role::RawHid);
        Self {
            shared: has_shared.then_some(0),
            raw: match (has_shared, has_raw) {
                (true, true) => Some(1),
                (false, true) => Some(0),
                _ => None,
            },
        }
    }
}

// Report descriptor builders

/// Exact length of the shared report descriptor for `roles`.
pub fn shared_report_len(roles: RoleFlags) -> usize {
    Role::SIMPLE_HID
        .into_iter()
        .filter(|&role| roles.contains(role))
        .filter_map(template)
        .map(ReportTemplate::stamped_len)
        .sum()
}

/// Build the shared report descriptor.
///
/// Returns `Ok(None)` when no simple-HID role is enabled, so "absent" is
/// distinct from "empty".
pub fn build_shared_report(roles: RoleFlags) -> Result<Option<ReportBuffer>> {
    let ids = ReportIds::allocate(roles);
    if ids.count() == 0 {
        return Ok(None);
    }

    let len = shared_report_len(roles);
    if len > HID_REPORT_CAPACITY {
        warn!("HID report descriptor needs {} bytes", len);
        return Err(Error::BufferOverflow);
    }

    let mut buf = ReportBuffer::new();
    for role in Role::SIMPLE_HID {
        if let (Some(id), Some(template)) = (ids.get(role), template(role)) {
            template.stamp_into(id, &mut buf)?;
        }
    }
    debug!("HID report descriptor: {} reports, {} bytes", ids.count(), buf.len());
    Ok(Some(buf))
}

/// Build the raw HID report descriptor, `Ok(None)` when the role is off.
pub fn build_raw_report(roles: RoleFlags) -> Result<Option<RawReportBuffer>> {
    if !roles.contains(Role::RawHid) {
        return Ok(None);
    }
    Vec::from_slice(raw::RAW_HID_REPORT_DESCRIPTOR)
        .map(Some)
        .map_err(|_| Error::BufferOverflow)
}

// Report framing

/// HID report type of a get/set-report request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum ReportType {
    Invalid = 0,
    Input = 1,
    Output = 2,
    Feature = 3,
}

impl From<u8> for ReportType {
    fn from(code: u8) -> Self {
        match code {
            1 => ReportType::Input,
            2 => ReportType::Output,
            3 => ReportType::Feature,
            _ => ReportType::Invalid,
        }
    }
}

/// Typed input report for one of the shared-interface roles.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum HidReport {
    Keyboard(KeyboardReport),
    Mouse(MouseReport),
    Gamepad(GamepadReport),
    Consumer(ConsumerReport),
}

impl HidReport {
    /// Role this report belongs to.
    pub fn role(&self) -> Role {
        match self {
            HidReport::Keyboard(_) => Role::Keyboard,
            HidReport::Mouse(_) => Role::Mouse,
            HidReport::Gamepad(_) => Role::Joystick,
            HidReport::Consumer(_) => Role::ConsumerControl,
        }
    }

    /// Serialise the payload without report ID.
    pub fn serialize(&self, buf: &mut [u8]) -> usize {
        match self {
            HidReport::Keyboard(k) => k.serialize(buf),
            HidReport::Mouse(m) => m.serialize(buf),
            HidReport::Gamepad(g) => g.serialize(buf),
            HidReport::Consumer(c) => c.serialize(buf),
        }
    }

    /// Serialise with the report ID prefix allocated for this role.
    ///
    /// Returns `None` when the role is disabled or `buf` is too small.
    pub fn frame(&self, ids: &ReportIds, buf: &mut [u8]) -> Option<usize> {
        let id = ids.get(self.role())?;
        let (first, payload) = buf.split_first_mut()?;
        *first = id;
        match self.serialize(payload) {
            0 => None,
            n => Some(n + 1),
        }
    }
}
