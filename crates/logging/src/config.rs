//! crates/logging/src/config.rs
//! Verbosity configuration combining info and debug levels.

use super::levels::{DebugFlag, DebugLevels, InfoFlag, InfoLevels};

/// Combined verbosity configuration for info and debug flags.
#[derive(Clone, Default, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct VerbosityConfig {
    /// Info flag levels.
    pub info: InfoLevels,
    /// Debug flag levels.
    pub debug: DebugLevels,
}

impl VerbosityConfig {
    /// Create a new configuration from a `-v` count.
    ///
    /// Level 0 prints only statistics. Each further level widens the set of
    /// info flags first, then opens debug flags.
    pub fn from_verbose_level(level: u8) -> Self {
        let mut config = Self::default();
        config.info.stats = 1;

        if level >= 1 {
            config.info.misc = 1;
            config.info.name = 1;
        }
        if level >= 2 {
            config.info.misc = 2;
            config.info.name = 2;
            config.info.skip = 1;
            config.info.stats = 2;
            config.debug.escalate = 1;
            config.debug.purge = 1;
        }
        if level >= 3 {
            config.debug.acl = 1;
            config.debug.own = 1;
            config.debug.walk = 1;
            config.debug.exit = 1;
        }
        if level >= 4 {
            config.debug.acl = 2;
            config.debug.escalate = 2;
            config.debug.walk = 2;
            config.debug.exit = 2;
        }

        config
    }

    /// Apply a single info flag token (e.g., "name2", "skip", "all0").
    pub fn apply_info_flag(&mut self, token: &str) -> Result<(), String> {
        let (name, level) = parse_flag_token(token)?;

        if name == "all" {
            self.info.set_all(level);
            return Ok(());
        }

        let flag = InfoFlag::ALL
            .into_iter()
            .find(|flag| flag.name() == name)
            .ok_or_else(|| format!("unknown info flag: {name}"))?;

        self.info.set(flag, level);
        Ok(())
    }

    /// Apply a single debug flag token (e.g., "acl2", "walk", "none").
    pub fn apply_debug_flag(&mut self, token: &str) -> Result<(), String> {
        if token == "none" {
            self.debug.set_all(0);
            return Ok(());
        }

        let (name, level) = parse_flag_token(token)?;

        if name == "all" {
            self.debug.set_all(level);
            return Ok(());
        }

        let flag = DebugFlag::ALL
            .into_iter()
            .find(|flag| flag.name() == name)
            .ok_or_else(|| format!("unknown debug flag: {name}"))?;

        self.debug.set(flag, level);
        Ok(())
    }

    /// Apply a comma-separated list of info tokens.
    pub fn apply_info_list(&mut self, list: &str) -> Result<(), String> {
        split_tokens(list).try_for_each(|token| self.apply_info_flag(token))
    }

    /// Apply a comma-separated list of debug tokens.
    pub fn apply_debug_list(&mut self, list: &str) -> Result<(), String> {
        split_tokens(list).try_for_each(|token| self.apply_debug_flag(token))
    }
}

fn split_tokens(list: &str) -> impl Iterator<Item = &str> {
    list.split(',').map(str::trim).filter(|token| !token.is_empty())
}

/// Parse a flag token like "name2" into ("name", 2) or "skip" into ("skip", 1).
fn parse_flag_token(token: &str) -> Result<(&str, u8), String> {
    if token.is_empty() {
        return Err("empty flag token".to_string());
    }

    match token.find(|c: char| c.is_ascii_digit()) {
        Some(0) => Err(format!("missing flag name in: {token}")),
        Some(pos) => {
            let name = &token[..pos];
            let level = token[pos..]
                .parse::<u8>()
                .map_err(|_| format!("invalid level in flag: {token}"))?;
            Ok((name, level))
        }
        None => Ok((token, 1)),
    }
}
