/// Binary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOperatorKind {
    // Logical
    /// Logical AND (`and`)
    And,
    /// Logical OR (`or`)
    Or,

    // Comparison
    /// Equal (`eq`)
    Equal,
    /// Not equal (`ne`)
    NotEqual,
    /// Greater than (`gt`)
    GreaterThan,
    /// Greater than or equal (`ge`)
    GreaterThanOrEqual,
    /// Less than (`lt`)
    LessThan,
    /// Less than or equal (`le`)
    LessThanOrEqual,

    // Arithmetic
    /// Addition (`add`)
    Add,
    /// Subtraction (`sub`)
    Subtract,
    /// Multiplication (`mul`)
    Multiply,
    /// Division (`div`)
    Divide,
    /// Modulo (`mod`)
    Modulo,
}

impl BinaryOperatorKind {
    pub fn keyword(self) -> &'static str {
        use BinaryOperatorKind::*;
        match self {
            And => "and",
            Or => "or",
            Equal => "eq",
            NotEqual => "ne",
            GreaterThan => "gt",
            GreaterThanOrEqual => "ge",
            LessThan => "lt",
            LessThanOrEqual => "le",
            Add => "add",
            Subtract => "sub",
            Multiply => "mul",
            Divide => "div",
            Modulo => "mod",
        }
    }

    /// Maps a comparison keyword (`eq`, `ne`, `gt`, `ge`, `lt`, `le`).
    pub fn from_comparison_keyword(keyword: &str) -> Option<Self> {
        use BinaryOperatorKind::*;
        match keyword {
            "eq" => Some(Equal),
            "ne" => Some(NotEqual),
            "gt" => Some(GreaterThan),
            "ge" => Some(GreaterThanOrEqual),
            "lt" => Some(LessThan),
            "le" => Some(LessThanOrEqual),
            _ => None,
        }
    }

    pub fn is_logical(self) -> bool {
        matches!(self, BinaryOperatorKind::And | BinaryOperatorKind::Or)
    }

    pub fn is_comparison(self) -> bool {
        use BinaryOperatorKind::*;
        matches!(
            self,
            Equal | NotEqual | GreaterThan | GreaterThanOrEqual | LessThan | LessThanOrEqual
        )
    }

    pub fn is_arithmetic(self) -> bool {
        !self.is_logical() && !self.is_comparison()
    }
}

/// Unary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOperatorKind {
    /// Arithmetic negation (`-`)
    Negate,
    /// Logical negation (`not`)
    Not,
}

impl UnaryOperatorKind {
    pub fn keyword(self) -> &'static str {
        match self {
            UnaryOperatorKind::Negate => "-",
            UnaryOperatorKind::Not => "not",
        }
    }
}
