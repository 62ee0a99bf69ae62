// SPDX-FileCopyrightText: 2026 Ticketbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! User privilege and its persisted bitmask.

/// Bit 0 of the persisted mask: the user holds admin rights.
pub const ADMIN_BIT: i64 = 0b01;
/// Bit 1 of the persisted mask: admin rights are currently in effect.
pub const EFFECTIVE_ADMIN_BIT: i64 = 0b10;

/// Privilege of a user.
///
/// `Admin { previewing: true }` is an admin looking at the bot as a regular
/// user would (set by `/usermode`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Role {
    #[default]
    Regular,
    Admin { previewing: bool },
}

impl Role {
    /// Full admin with effective rights.
    pub const ADMIN: Role = Role::Admin { previewing: false };

    /// Maps a stored bitmask to a role. The effective bit without the admin
    /// bit carries no privilege.
    pub fn from_bitmask(mask: i64) -> Self {
        if mask & ADMIN_BIT == 0 {
            return Self::Regular;
        }
        Self::Admin {
            previewing: mask & EFFECTIVE_ADMIN_BIT == 0,
        }
    }

    pub fn to_bitmask(self) -> i64 {
        match self {
            Self::Regular => 0,
            Self::Admin { previewing: true } => ADMIN_BIT,
            Self::Admin { previewing: false } => ADMIN_BIT | EFFECTIVE_ADMIN_BIT,
        }
    }

    pub fn is_admin(self) -> bool {
        matches!(self, Self::Admin { .. })
    }

    pub fn is_effective_admin(self) -> bool {
        matches!(self, Self::Admin { previewing: false })
    }

    pub fn is_previewing(self) -> bool {
        matches!(self, Self::Admin { previewing: true })
    }
}
