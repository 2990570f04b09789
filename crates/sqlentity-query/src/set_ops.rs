//! Set operations between linked selections.

/// How a linked selection combines with the one before it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetOpType {
    /// Distinct rows of both members
    Union,
    /// Every row of both members
    UnionAll,
    /// Rows present in both members
    Intersect,
    /// Rows of the left member missing from the right one
    Except,
}

impl SetOpType {
    /// Keyword placed on its own line between members.
    pub const fn as_sql(&self) -> &'static str {
        match self {
            Self::Union => "UNION",
            Self::UnionAll => "UNION ALL",
            Self::Intersect => "INTERSECT",
            Self::Except => "EXCEPT",
        }
    }
}
