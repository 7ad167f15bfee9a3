// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2025 Daniel Negri
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

//! Registry configuration: the section capacity table and lock policy.
//!
//! Supplied once at construction and never changed afterwards.
//!
//! # Example
//!
//! ```
//! use train_ticket_rs::{RegistryConfig, Section};
//!
//! let config = RegistryConfig::from_specs(["A=2", "B=3"]).unwrap();
//! assert_eq!(config.capacity(Section::A), 2);
//! assert_eq!(config.total_capacity(), 5);
//! ```

use crate::base::Section;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;
use thiserror::Error;

/// Seats per section when nothing else is configured.
pub const DEFAULT_SEATS_PER_SECTION: u16 = 5;

/// Configuration errors, reported before a registry is built.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid section spec {0:?} (expected <SECTION>=<SEATS>, e.g. A=5)")]
    InvalidSpec(String),

    #[error("section {0} must have at least one seat")]
    ZeroCapacity(Section),

    #[error("section {0} configured more than once")]
    DuplicateSection(Section),

    #[error("at least one section must be configured")]
    NoSections,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct RegistryConfig {
    /// Seat count per section. Sections missing from the table have no seats.
    pub capacities: BTreeMap<Section, u16>,
    /// Upper bound on waiting for the registry lock. `None` waits forever.
    #[serde(default)]
    pub lock_timeout_ms: Option<u64>,
}

impl RegistryConfig {
    /// A config with no sections; add them with [`Self::with_capacity`].
    pub fn empty() -> Self {
        Self {
            capacities: BTreeMap::new(),
            lock_timeout_ms: None,
        }
    }

    pub fn with_capacity(mut self, section: Section, seats: u16) -> Self {
        self.capacities.insert(section, seats);
        self
    }

    pub fn with_lock_timeout(mut self, timeout: Duration) -> Self {
        self.lock_timeout_ms = Some(timeout.as_millis().try_into().unwrap_or(u64::MAX));
        self
    }

    /// Builds a validated config from `"A=5"`-style specs.
    pub fn from_specs<I, S>(specs: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut config = Self::empty();
        for spec in specs {
            let (section, seats) = parse_section_capacity(spec.as_ref())?;
            if config.capacities.insert(section, seats).is_some() {
                return Err(ConfigError::DuplicateSection(section));
            }
        }
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.capacities.is_empty() {
            return Err(ConfigError::NoSections);
        }
        if let Some((section, _)) = self.capacities.iter().find(|(_, seats)| **seats == 0) {
            return Err(ConfigError::ZeroCapacity(*section));
        }
        Ok(())
    }

    pub fn capacity(&self, section: Section) -> u16 {
        self.capacities.get(&section).copied().unwrap_or(0)
    }

    pub fn total_capacity(&self) -> usize {
        self.capacities.values().map(|seats| usize::from(*seats)).sum()
    }

    pub fn lock_timeout(&self) -> Option<Duration> {
        self.lock_timeout_ms.map(Duration::from_millis)
    }
}

/// Sections A and B with five seats each.
impl Default for RegistryConfig {
    fn default() -> Self {
        Self::empty()
            .with_capacity(Section::A, DEFAULT_SEATS_PER_SECTION)
            .with_capacity(Section::B, DEFAULT_SEATS_PER_SECTION)
    }
}

/// Parses a `SECTION=SEATS` pair such as `"A=5"` or `"SECTION_B=3"`.
pub fn parse_section_capacity(spec: &str) -> Result<(Section, u16), ConfigError> {
    let invalid = || ConfigError::InvalidSpec(spec.to_string());

    let (section, seats) = spec.split_once('=').ok_or_else(invalid)?;
    let section: Section = section.parse().map_err(|_| invalid())?;
    let seats: u16 = seats.trim().parse().map_err(|_| invalid())?;
    if seats == 0 {
        return Err(ConfigError::ZeroCapacity(section));
    }
    Ok((section, seats))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_has_two_sections_of_five() {
        let config = RegistryConfig::default();
        assert_eq!(config.capacity(Section::A), 5);
        assert_eq!(config.capacity(Section::B), 5);
        assert_eq!(config.capacity(Section::C), 0);
        assert_eq!(config.total_capacity(), 10);
        assert_eq!(config.lock_timeout(), None);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn parses_section_specs() {
        assert_eq!(parse_section_capacity("A=5"), Ok((Section::A, 5)));
        assert_eq!(parse_section_capacity("section_c = 12"), Ok((Section::C, 12)));
    }

    #[test]
    fn rejects_bad_specs() {
        assert_eq!(
            parse_section_capacity("A5"),
            Err(ConfigError::InvalidSpec("A5".to_string()))
        );
        assert_eq!(
            parse_section_capacity("Z=5"),
            Err(ConfigError::InvalidSpec("Z=5".to_string()))
        );
        assert_eq!(
            parse_section_capacity("A=-1"),
            Err(ConfigError::InvalidSpec("A=-1".to_string()))
        );
        assert_eq!(
            parse_section_capacity("B=0"),
            Err(ConfigError::ZeroCapacity(Section::B))
        );
    }

    #[test]
    fn from_specs_rejects_duplicates_and_empty() {
        assert_eq!(
            RegistryConfig::from_specs(["A=1", "A=2"]),
            Err(ConfigError::DuplicateSection(Section::A))
        );
        assert_eq!(
            RegistryConfig::from_specs(Vec::<String>::new()),
            Err(ConfigError::NoSections)
        );
    }

    #[test]
    fn validate_catches_zero_capacity_built_by_hand() {
        let config = RegistryConfig::empty().with_capacity(Section::D, 0);
        assert_eq!(config.validate(), Err(ConfigError::ZeroCapacity(Section::D)));
    }

    #[test]
    fn lock_timeout_round_trips_through_millis() {
        let config = RegistryConfig::default().with_lock_timeout(Duration::from_millis(250));
        assert_eq!(config.lock_timeout_ms, Some(250));
        assert_eq!(config.lock_timeout(), Some(Duration::from_millis(250)));
    }

    #[test]
    fn deserializes_from_json() {
        let config: RegistryConfig =
            serde_json::from_str(r#"{"capacities": {"A": 2, "C": 4}}"#).unwrap();
        assert_eq!(config.capacity(Section::A), 2);
        assert_eq!(config.capacity(Section::C), 4);
        assert_eq!(config.lock_timeout_ms, None);
    }
}
