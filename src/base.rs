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

//! Core value types: ticket identifiers, sections, seats and passengers.

use crate::RegistryError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Globally unique identifier for a purchased ticket.
///
/// Minted from a random UUID (v4) at purchase time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(transparent)]
pub struct TicketId(pub Uuid);

impl TicketId {
    pub fn new() -> Self {
        TicketId(Uuid::new_v4())
    }
}

impl Default for TicketId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TicketId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for TicketId {
    type Err = RegistryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s.trim())
            .map(TicketId)
            .map_err(|_| RegistryError::InvalidTicketId(s.to_string()))
    }
}

/// A named partition of the train's seating.
///
/// Variants are declared in allocation priority order, so the derived
/// `Ord` is the order in which seats are handed out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize, Serialize)]
pub enum Section {
    A,
    B,
    C,
    D,
}

impl Section {
    /// All sections, in allocation order.
    pub const ALL: [Section; 4] = [Section::A, Section::B, Section::C, Section::D];

    pub fn letter(&self) -> char {
        match self {
            Section::A => 'A',
            Section::B => 'B',
            Section::C => 'C',
            Section::D => 'D',
        }
    }

    fn from_letter(c: char) -> Option<Self> {
        match c.to_ascii_uppercase() {
            'A' => Some(Section::A),
            'B' => Some(Section::B),
            'C' => Some(Section::C),
            'D' => Some(Section::D),
            _ => None,
        }
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.letter())
    }
}

/// Accepts `"A"`, `"a"` and the long form `"SECTION_A"`.
impl FromStr for Section {
    type Err = RegistryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let upper = trimmed.to_ascii_uppercase();
        let tag = upper.strip_prefix("SECTION_").unwrap_or(&upper);

        let mut chars = tag.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => {
                Section::from_letter(c).ok_or_else(|| RegistryError::InvalidSection(s.to_string()))
            }
            _ => Err(RegistryError::InvalidSection(s.to_string())),
        }
    }
}

/// A seat: a section plus a 1-based ordinal within it.
///
/// Rendered as `"<letter><ordinal>"`, e.g. `"A3"`. Ordering is section first,
/// then ordinal, which matches the allocation scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Seat {
    pub section: Section,
    pub number: u16,
}

impl Seat {
    pub fn new(section: Section, number: u16) -> Self {
        Self { section, number }
    }
}

impl fmt::Display for Seat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.section, self.number)
    }
}

impl FromStr for Seat {
    type Err = RegistryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let mut chars = trimmed.chars();
        let section = chars
            .next()
            .and_then(Section::from_letter)
            .ok_or_else(|| RegistryError::InvalidSeat(s.to_string()))?;

        let digits = chars.as_str();
        if !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(RegistryError::InvalidSeat(s.to_string()));
        }
        let number: u16 = digits
            .parse()
            .map_err(|_| RegistryError::InvalidSeat(s.to_string()))?;
        if number == 0 {
            return Err(RegistryError::InvalidSeat(s.to_string()));
        }

        Ok(Seat { section, number })
    }
}

impl Serialize for Seat {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Seat {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// A passenger. The email is the natural key for lookup and removal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub struct User {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
}

impl User {
    pub fn new(
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        email: impl Into<String>,
    ) -> Self {
        Self {
            first_name: first_name.into(),
            last_name: last_name.into(),
            email: email.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seat_renders_section_and_ordinal() {
        assert_eq!(Seat::new(Section::A, 3).to_string(), "A3");
        assert_eq!(Seat::new(Section::B, 12).to_string(), "B12");
    }

    #[test]
    fn seat_parses_rendered_form() {
        assert_eq!("A3".parse::<Seat>().unwrap(), Seat::new(Section::A, 3));
        assert_eq!(" b5 ".parse::<Seat>().unwrap(), Seat::new(Section::B, 5));
    }

    #[test]
    fn seat_rejects_malformed_input() {
        for raw in ["", "A", "A0", "Z1", "1A", "A-1", "AB1"] {
            assert_eq!(
                raw.parse::<Seat>(),
                Err(RegistryError::InvalidSeat(raw.to_string())),
                "{raw:?} should not parse"
            );
        }
    }

    #[test]
    fn seats_order_by_section_then_number() {
        let mut seats = vec![
            Seat::new(Section::B, 1),
            Seat::new(Section::A, 2),
            Seat::new(Section::A, 10),
            Seat::new(Section::A, 1),
        ];
        seats.sort();
        let rendered: Vec<String> = seats.iter().map(Seat::to_string).collect();
        assert_eq!(rendered, ["A1", "A2", "A10", "B1"]);
    }

    #[test]
    fn section_parses_short_and_long_forms() {
        assert_eq!("A".parse::<Section>().unwrap(), Section::A);
        assert_eq!("b".parse::<Section>().unwrap(), Section::B);
        assert_eq!("SECTION_C".parse::<Section>().unwrap(), Section::C);
    }

    #[test]
    fn section_unknown_is_rejected() {
        assert_eq!(
            "SECTION_UNKNOWN".parse::<Section>(),
            Err(RegistryError::InvalidSection("SECTION_UNKNOWN".to_string()))
        );
        assert!("".parse::<Section>().is_err());
    }

    #[test]
    fn ticket_id_round_trips_through_display() {
        let id = TicketId::new();
        assert_eq!(id.to_string().parse::<TicketId>().unwrap(), id);
    }

    #[test]
    fn ticket_id_rejects_garbage() {
        assert_eq!(
            "not-a-ticket".parse::<TicketId>(),
            Err(RegistryError::InvalidTicketId("not-a-ticket".to_string()))
        );
    }

    #[test]
    fn seat_serializes_as_string() {
        let json = serde_json::to_string(&Seat::new(Section::A, 4)).unwrap();
        assert_eq!(json, "\"A4\"");
        let seat: Seat = serde_json::from_str("\"B2\"").unwrap();
        assert_eq!(seat, Seat::new(Section::B, 2));
    }
}
