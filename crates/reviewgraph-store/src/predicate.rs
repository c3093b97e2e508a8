//! The fixed predicate vocabulary.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use reviewgraph_core::Error;

/// Relationship between two entities. Every forward predicate has an inverse
/// so lookups work from either end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Predicate {
    /// product → brand
    IsBrandOf,
    /// brand → product
    Manufactures,
    /// product → location
    SoldIn,
    /// location → product
    Sells,
    /// person → product
    Purchased,
    /// product → person
    PurchasedBy,
    /// product → sentiment label
    HasSentiment,
    /// sentiment label → product
    AssociatedWith,
    /// product → problem tag
    HasProblem,
    /// problem tag → product
    Affects,
    /// review → problem tag; used to decorate search hits, never stored
    MentionsProblem,
}

impl Predicate {
    pub const FIRST: Predicate = Predicate::IsBrandOf;
    pub const LAST: Predicate = Predicate::MentionsProblem;

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::IsBrandOf => "is_brand_of",
            Self::Manufactures => "manufactures",
            Self::SoldIn => "sold_in",
            Self::Sells => "sells",
            Self::Purchased => "purchased",
            Self::PurchasedBy => "purchased_by",
            Self::HasSentiment => "has_sentiment",
            Self::AssociatedWith => "associated_with",
            Self::HasProblem => "has_problem",
            Self::Affects => "affects",
            Self::MentionsProblem => "mentions_problem",
        }
    }

    pub fn all() -> &'static [Predicate] {
        &[
            Self::IsBrandOf,
            Self::Manufactures,
            Self::SoldIn,
            Self::Sells,
            Self::Purchased,
            Self::PurchasedBy,
            Self::HasSentiment,
            Self::AssociatedWith,
            Self::HasProblem,
            Self::Affects,
            Self::MentionsProblem,
        ]
    }

    /// Predicates that point away from a product (or person, for `Purchased`).
    pub fn forward() -> &'static [Predicate] {
        &[
            Self::IsBrandOf,
            Self::SoldIn,
            Self::Purchased,
            Self::HasSentiment,
            Self::HasProblem,
        ]
    }

    pub fn inverse(&self) -> Option<Predicate> {
        match self {
            Self::IsBrandOf => Some(Self::Manufactures),
            Self::Manufactures => Some(Self::IsBrandOf),
            Self::SoldIn => Some(Self::Sells),
            Self::Sells => Some(Self::SoldIn),
            Self::Purchased => Some(Self::PurchasedBy),
            Self::PurchasedBy => Some(Self::Purchased),
            Self::HasSentiment => Some(Self::AssociatedWith),
            Self::AssociatedWith => Some(Self::HasSentiment),
            Self::HasProblem => Some(Self::Affects),
            Self::Affects => Some(Self::HasProblem),
            Self::MentionsProblem => None,
        }
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Predicate {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Self::all()
            .iter()
            .find(|p| p.as_str() == s)
            .copied()
            .ok_or_else(|| Error::InvalidInput(format!("unknown predicate '{}'", s)))
    }
}
