//! Relationship Definitions - Parsed `has<Type>` / `belongsTo<Type>` tokens

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{RecordError, RecordResult};

/// Direction of an association from the owning record's perspective
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Direction {
    /// One-to-many, ownership-style association
    Has,
    /// Reference to related records of another type
    BelongsTo,
}

impl Direction {
    /// Both directions, in the order graphs and snapshots list them
    pub const ALL: [Direction; 2] = [Direction::Has, Direction::BelongsTo];

    /// Token prefix used in relationship definitions
    pub fn prefix(self) -> &'static str {
        match self {
            Direction::Has => "has",
            Direction::BelongsTo => "belongsTo",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.prefix())
    }
}

/// A declared association `(direction, related type)`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RelationshipDefinition {
    pub direction: Direction,
    #[serde(rename = "type")]
    pub related_type: String,
}

impl RelationshipDefinition {
    pub fn new(direction: Direction, related_type: impl Into<String>) -> Self {
        Self {
            direction,
            related_type: related_type.into(),
        }
    }

    pub fn has(related_type: impl Into<String>) -> Self {
        Self::new(Direction::Has, related_type)
    }

    pub fn belongs_to(related_type: impl Into<String>) -> Self {
        Self::new(Direction::BelongsTo, related_type)
    }

    /// The token this definition was declared with, e.g. `hasCharacter`
    pub fn token(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for RelationshipDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.direction.prefix(), self.related_type)
    }
}

impl FromStr for RelationshipDefinition {
    type Err = RecordError;

    fn from_str(token: &str) -> Result<Self, Self::Err> {
        let invalid = || RecordError::InvalidRelationshipDefinition {
            token: token.to_string(),
        };

        let (direction, related_type) = if let Some(rest) = token.strip_prefix("belongsTo") {
            (Direction::BelongsTo, rest)
        } else if let Some(rest) = token.strip_prefix("has") {
            (Direction::Has, rest)
        } else {
            return Err(invalid());
        };

        if !is_type_name(related_type) {
            return Err(invalid());
        }

        Ok(Self::new(direction, related_type))
    }
}

/// Type names are non-empty and contain no separators
pub(crate) fn is_type_name(name: &str) -> bool {
    !name.is_empty() && name.chars().all(|c| c.is_alphanumeric() || c == '_')
}

/// Parse a space-separated list of definition tokens, keeping declaration order
pub fn parse_definitions(tokens: &str) -> RecordResult<Vec<RelationshipDefinition>> {
    tokens.split_whitespace().map(str::parse).collect()
}
