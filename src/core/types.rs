use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use strum::EnumIter;

/// The four panels a query can be built from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumIter)]
pub enum PanelRole {
    /// Single-set summary
    Summary,
    /// First operand of a comparison
    OperandA,
    /// Second operand of a comparison
    OperandB,
    /// Set to annotate against reference datasets
    AnnotationTarget,
}

impl PanelRole {
    /// Prefix letter used in `{letter}_{attribute}={value}` selection clauses.
    ///
    /// The backend only knows two operand slots, so every panel except
    /// OperandB speaks for slot A.
    pub fn letter(&self) -> &'static str {
        match self {
            Self::OperandB => "B",
            Self::Summary | Self::OperandA | Self::AnnotationTarget => "A",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Self::Summary => "Selection",
            Self::OperandA => "Set A",
            Self::OperandB => "Set B",
            Self::AnnotationTarget => "Set to annotate",
        }
    }

    /// Reduction operators offered in this panel's selector
    pub fn reduction_options(&self) -> &'static [ReductionOp] {
        &[ReductionOp::Intersection, ReductionOp::Union]
    }
}

impl fmt::Display for PanelRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Summary => write!(f, "summary"),
            Self::OperandA => write!(f, "operand_a"),
            Self::OperandB => write!(f, "operand_b"),
            Self::AnnotationTarget => write!(f, "annotation_target"),
        }
    }
}

/// Spatial relation of a filter row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, EnumIter)]
pub enum Relation {
    /// Elements within some distance of (or overlapping) the reference
    Within,
    /// Elements farther than some distance from (or not overlapping) the reference
    FartherThan,
    /// Unset sentinel: the row does not filter
    #[default]
    NoFilter,
}

impl Relation {
    /// Word understood by the backend's reduction expression parser
    pub fn as_wire(&self) -> Option<&'static str> {
        match self {
            Self::Within => Some("overlaps"),
            Self::FartherThan => Some("noverlaps"),
            Self::NoFilter => None,
        }
    }

    pub fn is_set(&self) -> bool {
        !matches!(self, Self::NoFilter)
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Within => "are within",
            Self::FartherThan => "are farther than",
            Self::NoFilter => "(No filter)",
        }
    }

    /// Cycle order used by the relation selector
    pub fn next(&self) -> Self {
        match self {
            Self::NoFilter => Self::Within,
            Self::Within => Self::FartherThan,
            Self::FartherThan => Self::NoFilter,
        }
    }

    pub fn prev(&self) -> Self {
        match self {
            Self::NoFilter => Self::FartherThan,
            Self::Within => Self::NoFilter,
            Self::FartherThan => Self::Within,
        }
    }
}

impl fmt::Display for Relation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Combination operator applied to a set of tracks
///
/// The same vocabulary serves three purposes: folding a panel's datasets into
/// one track, combining two panels in a comparison, and combining a panel
/// with annotations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumIter)]
pub enum ReductionOp {
    Intersection,
    Union,
    Difference,
    OverlapFrequency,
}

/// Operators offered when comparing two panels
pub const COMPARISON_OPTIONS: [ReductionOp; 3] = [
    ReductionOp::Intersection,
    ReductionOp::Union,
    ReductionOp::Difference,
];

/// Operators offered when annotating a panel
pub const ANNOTATION_OPTIONS: [ReductionOp; 4] = [
    ReductionOp::Intersection,
    ReductionOp::Union,
    ReductionOp::Difference,
    ReductionOp::OverlapFrequency,
];

impl ReductionOp {
    /// Opcode sent to the backend
    pub fn opcode(&self) -> &'static str {
        match self {
            Self::Intersection => "unit mult",
            Self::Union => "unit sum",
            Self::Difference => "unit diff",
            Self::OverlapFrequency => "overlaps",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Intersection => "Intersection",
            Self::Union => "Union",
            Self::Difference => "Difference",
            Self::OverlapFrequency => "Overlap frequency",
        }
    }

    /// Next option in `options`, wrapping; falls back to the first option
    /// when `self` is not offered at all.
    pub fn cycle(&self, options: &[ReductionOp], forward: bool) -> ReductionOp {
        let Some(first) = options.first().copied() else {
            return *self;
        };
        match options.iter().position(|op| op == self) {
            Some(idx) if forward => options[(idx + 1) % options.len()],
            Some(idx) => options[(idx + options.len() - 1) % options.len()],
            None => first,
        }
    }
}

impl fmt::Display for ReductionOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl FromStr for ReductionOp {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "unit mult" | "intersection" => Ok(Self::Intersection),
            "unit sum" | "union" => Ok(Self::Union),
            "unit diff" | "difference" => Ok(Self::Difference),
            "overlaps" | "overlap frequency" => Ok(Self::OverlapFrequency),
            other => Err(format!("Unknown reduction operator: {other}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn test_panel_letters() {
        assert_eq!(PanelRole::Summary.letter(), "A");
        assert_eq!(PanelRole::OperandA.letter(), "A");
        assert_eq!(PanelRole::OperandB.letter(), "B");
        assert_eq!(PanelRole::AnnotationTarget.letter(), "A");
    }

    #[test]
    fn test_relation_cycle_is_closed() {
        for relation in Relation::iter() {
            assert_eq!(relation.next().prev(), relation);
            assert_eq!(relation.next().next().next(), relation);
        }
    }

    #[test]
    fn test_relation_wire_words() {
        assert_eq!(Relation::Within.as_wire(), Some("overlaps"));
        assert_eq!(Relation::FartherThan.as_wire(), Some("noverlaps"));
        assert_eq!(Relation::NoFilter.as_wire(), None);
        assert!(!Relation::default().is_set());
    }

    #[test]
    fn test_opcode_parse() {
        for op in ReductionOp::iter() {
            assert_eq!(op.opcode().parse::<ReductionOp>().unwrap(), op);
        }
        assert!("unit max".parse::<ReductionOp>().is_err());
    }

    #[test]
    fn test_cycle_within_options() {
        let options = PanelRole::Summary.reduction_options();
        assert_eq!(ReductionOp::Intersection.cycle(options, true), ReductionOp::Union);
        assert_eq!(ReductionOp::Union.cycle(options, true), ReductionOp::Intersection);
        assert_eq!(ReductionOp::Intersection.cycle(options, false), ReductionOp::Union);
        // Not offered in a panel selector: snaps back to the first option
        assert_eq!(ReductionOp::Difference.cycle(options, true), ReductionOp::Intersection);
    }
}
