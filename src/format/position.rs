use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A team's slot within a tier, `A` being the top seed.
///
/// Serialized as its single letter so it can key JSON and YAML maps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Position {
    A,
    B,
    C,
    D,
    E,
    F,
}

impl Position {
    pub const ALL: [Position; 6] = [
        Position::A,
        Position::B,
        Position::C,
        Position::D,
        Position::E,
        Position::F,
    ];

    pub fn as_char(self) -> char {
        match self {
            Position::A => 'A',
            Position::B => 'B',
            Position::C => 'C',
            Position::D => 'D',
            Position::E => 'E',
            Position::F => 'F',
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

impl FromStr for Position {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut chars = s.trim().chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Position::ALL
                .iter()
                .copied()
                .find(|p| p.as_char() == c.to_ascii_uppercase())
                .ok_or_else(|| format!("invalid position '{}': expected A-F", s)),
            _ => Err(format!("invalid position '{}': expected a single letter", s)),
        }
    }
}

impl TryFrom<String> for Position {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Position> for String {
    fn from(value: Position) -> Self {
        value.to_string()
    }
}
