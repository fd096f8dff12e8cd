//! Role registry - which logical USB functions the device exposes.
//!
//! Roles are fixed before the controller starts; [`RoleFlags`] is a
//! `Copy` value, so nothing can flip a role once it has been handed to
//! the composer.

/// A logical USB function that may be independently enabled.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Role {
    /// CDC-ACM serial port.
    Serial,
    /// Boot-style keyboard on the shared HID interface.
    Keyboard,
    /// Relative mouse on the shared HID interface.
    Mouse,
    /// Gamepad/joystick on the shared HID interface.
    Joystick,
    /// Consumer control (media keys) on the shared HID interface.
    ConsumerControl,
    /// Bulk-only mass storage.
    MassStorage,
    /// Second, vendor-defined raw HID interface.
    RawHid,
}

impl Role {
    /// All roles, in registry order.
    pub const ALL: [Role; 7] = [
        Role::Serial,
        Role::Keyboard,
        Role::Mouse,
        Role::Joystick,
        Role::ConsumerControl,
        Role::MassStorage,
        Role::RawHid,
    ];

    /// Roles multiplexed over the shared HID interface, in report ID order.
    pub const SIMPLE_HID: [Role; 4] = [
        Role::Keyboard,
        Role::Mouse,
        Role::Joystick,
        Role::ConsumerControl,
    ];

    const fn bit(self) -> u8 {
        1 << self as u8
    }
}

/// Set of enabled roles.
#[derive(Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RoleFlags {
    bits: u8,
}

impl RoleFlags {
    /// No roles enabled.
    pub const fn empty() -> Self {
        Self { bits: 0 }
    }

    /// Every role enabled.
    pub const fn all() -> Self {
        let mut flags = Self::empty();
        let mut i = 0;
        while i < Role::ALL.len() {
            flags = flags.with(Role::ALL[i]);
            i += 1;
        }
        flags
    }

    /// Return a copy with `role` enabled.
    pub const fn with(self, role: Role) -> Self {
        Self {
            bits: self.bits | role.bit(),
        }
    }

    pub const fn contains(self, role: Role) -> bool {
        self.bits & role.bit() != 0
    }

    pub const fn is_empty(self) -> bool {
        self.bits == 0
    }

    /// Any role carried by the shared HID interface.
    pub const fn has_simple_hid(self) -> bool {
        self.contains(Role::Keyboard)
            || self.contains(Role::Mouse)
            || self.contains(Role::Joystick)
            || self.contains(Role::ConsumerControl)
    }

    /// Number of enabled simple-HID roles.
    pub fn simple_hid_count(self) -> usize {
        Role::SIMPLE_HID
            .iter()
            .filter(|&&role| self.contains(role))
            .count()
    }

    /// Enabled roles in registry order.
    pub fn iter(self) -> impl Iterator<Item = Role> {
        Role::ALL.into_iter().filter(move |&role| self.contains(role))
    }
}

impl FromIterator<Role> for RoleFlags {
    fn from_iter<I: IntoIterator<Item = Role>>(iter: I) -> Self {
        iter.into_iter().fold(Self::empty(), RoleFlags::with)
    }
}

impl core::fmt::Debug for RoleFlags {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_has_no_roles() {
        let flags = RoleFlags::empty();
        assert!(flags.is_empty());
        assert!(!flags.has_simple_hid());
        assert_eq!(flags.iter().count(), 0);
    }

    #[test]
    fn with_is_additive_and_idempotent() {
        let flags = RoleFlags::empty()
            .with(Role::Mouse)
            .with(Role::Mouse)
            .with(Role::Serial);
        assert!(flags.contains(Role::Mouse));
        assert!(flags.contains(Role::Serial));
        assert!(!flags.contains(Role::Keyboard));
        assert_eq!(flags.iter().count(), 2);
    }

    #[test]
    fn consumer_control_counts_as_simple_hid() {
        let flags = RoleFlags::empty().with(Role::ConsumerControl);
        assert!(flags.has_simple_hid());
        assert_eq!(flags.simple_hid_count(), 1);
    }

    #[test]
    fn raw_hid_and_storage_are_not_simple_hid() {
        let flags: RoleFlags = [Role::RawHid, Role::MassStorage, Role::Serial]
            .into_iter()
            .collect();
        assert!(!flags.has_simple_hid());
        assert_eq!(flags.simple_hid_count(), 0);
    }

    #[test]
    fn all_contains_every_role_in_order() {
        let flags = RoleFlags::all();
        let roles: heapless::Vec<Role, 7> = flags.iter().collect();
        assert_eq!(roles.as_slice(), &Role::ALL);
    }
}
