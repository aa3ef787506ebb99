//! Math domains, pedagogical phases and the difficulty range table.

use serde::{Deserialize, Serialize};

use crate::error::{MathError, Result};

/// Lowest difficulty level.
pub const MIN_DIFFICULTY: u8 = 1;
/// Highest difficulty level.
pub const MAX_DIFFICULTY: u8 = 10;
/// Difficulty a new child starts at.
pub const DEFAULT_DIFFICULTY: u8 = 1;

/// One of the five math topic areas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Domain {
    /// Counting, comparing and ordering numbers.
    Numeration,
    /// Addition and subtraction.
    Calcul,
    /// Shapes.
    Geometrie,
    /// Length, time and money.
    Mesures,
    /// Word problems.
    Problemes,
}

impl Domain {
    /// Get all domain variants, in menu order.
    pub fn all() -> &'static [Domain] {
        &[
            Domain::Numeration,
            Domain::Calcul,
            Domain::Geometrie,
            Domain::Mesures,
            Domain::Problemes,
        ]
    }

    /// Stable identifier used in storage keys and on the command line.
    pub fn id(&self) -> &'static str {
        match self {
            Domain::Numeration => "numeration",
            Domain::Calcul => "calcul",
            Domain::Geometrie => "geometrie",
            Domain::Mesures => "mesures",
            Domain::Problemes => "problemes",
        }
    }

    /// French name shown to the child.
    pub fn display_name(&self) -> &'static str {
        match self {
            Domain::Numeration => "Numération",
            Domain::Calcul => "Calcul",
            Domain::Geometrie => "Géométrie",
            Domain::Mesures => "Mesures",
            Domain::Problemes => "Problèmes",
        }
    }

    pub fn icon(&self) -> &'static str {
        match self {
            Domain::Numeration => "🔢",
            Domain::Calcul => "➕",
            Domain::Geometrie => "🔷",
            Domain::Mesures => "📏",
            Domain::Problemes => "💡",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Domain::Numeration => "Compter, comparer, ranger les nombres",
            Domain::Calcul => "Addition, soustraction, multiplication",
            Domain::Geometrie => "Formes, symétrie, repérage",
            Domain::Mesures => "Longueurs, temps, monnaie",
            Domain::Problemes => "Résolution avec modèles en barres",
        }
    }

    /// Parse a domain id. Case and accents are ignored, so both
    /// `geometrie` and `Géométrie` are accepted.
    pub fn parse(name: &str) -> Result<Domain> {
        let folded = crate::french::normalize(name);
        Domain::all()
            .iter()
            .copied()
            .find(|d| d.id() == folded)
            .ok_or_else(|| MathError::unknown_domain(name))
    }

    /// Parse a domain id, falling back to [`Domain::Calcul`] when unknown.
    ///
    /// A wrong-domain exercise is better for a child than no exercise.
    pub fn parse_or_default(name: &str) -> Domain {
        match Domain::parse(name) {
            Ok(domain) => domain,
            Err(e) => {
                tracing::warn!("{}, falling back to calcul", e);
                Domain::Calcul
            }
        }
    }
}

impl std::fmt::Display for Domain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.id())
    }
}

/// Concrete-Pictorial-Abstract pedagogical mode.
///
/// Purely presentational downstream, but hint wording depends on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    /// Manipulate objects.
    #[default]
    Concrete,
    /// Look at diagrams.
    Pictorial,
    /// Bare numbers.
    Abstract,
}

impl Phase {
    pub fn all() -> &'static [Phase] {
        &[Phase::Concrete, Phase::Pictorial, Phase::Abstract]
    }

    pub fn id(&self) -> &'static str {
        match self {
            Phase::Concrete => "concrete",
            Phase::Pictorial => "pictorial",
            Phase::Abstract => "abstract",
        }
    }

    /// Parse a phase id (`concrete`, `pictorial`, `abstract`).
    pub fn parse(name: &str) -> Option<Phase> {
        let name = name.trim().to_lowercase();
        Phase::all().iter().copied().find(|p| p.id() == name)
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.id())
    }
}

/// Inclusive operand range for a difficulty level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NumberRange {
    pub min: u32,
    pub max: u32,
}

impl NumberRange {
    pub const fn new(min: u32, max: u32) -> Self {
        Self { min, max }
    }

    /// Operand range for `difficulty`.
    ///
    /// Out-of-range difficulties use the difficulty-1 entry.
    pub fn for_difficulty(difficulty: u8) -> NumberRange {
        match difficulty {
            1 => NumberRange::new(1, 10),
            2 => NumberRange::new(1, 20),
            3 => NumberRange::new(1, 30),
            4 => NumberRange::new(1, 50),
            5 => NumberRange::new(1, 100),
            6 => NumberRange::new(10, 100),
            7 => NumberRange::new(20, 100),
            8..=10 => NumberRange::new(1, 100),
            _ => NumberRange::new(1, 10),
        }
    }

    pub fn contains(&self, n: u32) -> bool {
        (self.min..=self.max).contains(&n)
    }
}

/// Clamp a requested difficulty into `MIN_DIFFICULTY..=MAX_DIFFICULTY`.
pub fn clamp_difficulty(difficulty: u8) -> u8 {
    difficulty.clamp(MIN_DIFFICULTY, MAX_DIFFICULTY)
}
