//! Compatibility levels and the behavior matrix.
//!
//! A handful of filters changed semantics across releases of the engine.
//! Rather than scattering version comparisons through the filter bodies,
//! every divergence is named by a [`Gate`] and resolved through one table
//! here. A filter asks `level.is_modern(Gate::Round)` and branches once.

use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

/// Ordered compatibility level, fixed for the duration of a render.
///
/// Levels are strictly ordered: a later level carries every behavior
/// change of the earlier ones.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Default,
    Display,
    EnumString,
    Serialize,
    Deserialize,
)]
pub enum SyntaxLevel {
    #[default]
    #[strum(serialize = "legacy")]
    Legacy,
    #[strum(serialize = "v1")]
    V1,
    #[strum(serialize = "v2")]
    V2,
    #[strum(serialize = "v2a")]
    V2a,
    #[strum(serialize = "v3")]
    V3,
}

/// A named behavior divergence. Each gate flips from its legacy to its
/// modern behavior at exactly one level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gate {
    /// `capitalize`: first-char upcase vs. sentence-style capitalization.
    Capitalize,
    /// `replace`/`remove` family: search term treated as literal text.
    ReplaceLiteral,
    /// `replace_first`/`remove_first` with an empty search term:
    /// no-op vs. prepend at position zero.
    EmptySearchTerm,
    /// `round` on unparseable input or out-of-range places.
    Round,
    /// `ceil`/`floor`/`abs` on unparseable input.
    CeilFloorAbs,
    /// `split` on absent input.
    SplitNil,
    /// Arithmetic with numeric-string operands.
    StringCoercion,
}

impl Gate {
    /// Level at which the modern behavior begins.
    pub fn modern_from(self) -> SyntaxLevel {
        match self {
            Gate::Capitalize => SyntaxLevel::V2,
            Gate::ReplaceLiteral => SyntaxLevel::V1,
            Gate::EmptySearchTerm => SyntaxLevel::V3,
            Gate::Round => SyntaxLevel::V3,
            Gate::CeilFloorAbs => SyntaxLevel::V3,
            Gate::SplitNil => SyntaxLevel::V3,
            Gate::StringCoercion => SyntaxLevel::V1,
        }
    }
}

impl SyntaxLevel {
    /// The single branch point filters may consult.
    pub fn is_modern(self, gate: Gate) -> bool {
        self >= gate.modern_from()
    }
}
