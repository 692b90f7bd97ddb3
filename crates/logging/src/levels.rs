//! crates/logging/src/levels.rs
//! Flag enums and level structures for info and debug verbosity.

/// Info flags for diagnostic categories.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum InfoFlag {
    /// Miscellaneous run-level messages.
    Misc,
    /// Per-node action lines (owner set, ACE added, ACE removed).
    Name,
    /// Nodes skipped because nothing matched.
    Skip,
    /// End-of-run statistics.
    Stats,
}

impl InfoFlag {
    /// Every info flag, in declaration order.
    pub const ALL: [Self; 4] = [Self::Misc, Self::Name, Self::Skip, Self::Stats];

    /// Token used by `--info`.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Misc => "misc",
            Self::Name => "name",
            Self::Skip => "skip",
            Self::Stats => "stats",
        }
    }
}

/// Debug flags for diagnostic categories.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DebugFlag {
    /// Security descriptor reads and writes.
    Acl,
    /// Privilege elevation and retry cycles.
    Escalate,
    /// Exit status and cleanup.
    Exit,
    /// Ownership changes.
    Own,
    /// Orphaned identity purging.
    Purge,
    /// Directory enumeration.
    Walk,
}

impl DebugFlag {
    /// Every debug flag, in declaration order.
    pub const ALL: [Self; 6] = [
        Self::Acl,
        Self::Escalate,
        Self::Exit,
        Self::Own,
        Self::Purge,
        Self::Walk,
    ];

    /// Token used by `--debug`.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Acl => "acl",
            Self::Escalate => "escalate",
            Self::Exit => "exit",
            Self::Own => "own",
            Self::Purge => "purge",
            Self::Walk => "walk",
        }
    }
}

/// Info verbosity levels for each flag.
#[derive(Clone, Default, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct InfoLevels {
    /// Miscellaneous messages level.
    pub misc: u8,
    /// Per-node action lines level.
    pub name: u8,
    /// Skipped nodes level.
    pub skip: u8,
    /// Statistics level.
    pub stats: u8,
}

impl InfoLevels {
    /// Get the level for a specific flag.
    pub fn get(&self, flag: InfoFlag) -> u8 {
        match flag {
            InfoFlag::Misc => self.misc,
            InfoFlag::Name => self.name,
            InfoFlag::Skip => self.skip,
            InfoFlag::Stats => self.stats,
        }
    }

    /// Set the level for a specific flag.
    pub fn set(&mut self, flag: InfoFlag, level: u8) {
        match flag {
            InfoFlag::Misc => self.misc = level,
            InfoFlag::Name => self.name = level,
            InfoFlag::Skip => self.skip = level,
            InfoFlag::Stats => self.stats = level,
        }
    }

    /// Set all flags to the specified level.
    pub fn set_all(&mut self, level: u8) {
        for flag in InfoFlag::ALL {
            self.set(flag, level);
        }
    }
}

/// Debug verbosity levels for each flag.
#[derive(Clone, Default, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DebugLevels {
    /// Security descriptor level.
    pub acl: u8,
    /// Escalation level.
    pub escalate: u8,
    /// Exit status level.
    pub exit: u8,
    /// Ownership changes level.
    pub own: u8,
    /// Orphan purge level.
    pub purge: u8,
    /// Enumeration level.
    pub walk: u8,
}

impl DebugLevels {
    /// Get the level for a specific flag.
    pub fn get(&self, flag: DebugFlag) -> u8 {
        match flag {
            DebugFlag::Acl => self.acl,
            DebugFlag::Escalate => self.escalate,
            DebugFlag::Exit => self.exit,
            DebugFlag::Own => self.own,
            DebugFlag::Purge => self.purge,
            DebugFlag::Walk => self.walk,
        }
    }

    /// Set the level for a specific flag.
    pub fn set(&mut self, flag: DebugFlag, level: u8) {
        match flag {
            DebugFlag::Acl => self.acl = level,
            DebugFlag::Escalate => self.escalate = level,
            DebugFlag::Exit => self.exit = level,
            DebugFlag::Own => self.own = level,
            DebugFlag::Purge => self.purge = level,
            DebugFlag::Walk => self.walk = level,
        }
    }

    /// Set all flags to the specified level.
    pub fn set_all(&mut self, level: u8) {
        for flag in DebugFlag::ALL {
            self.set(flag, level);
        }
    }
}
