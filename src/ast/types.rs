use std::fmt::Display;

use strum::{Display as StrumDisplay, EnumString};

/// Two point security lattice, `Low < High`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, EnumString, StrumDisplay)]
#[strum(serialize_all = "lowercase")]
pub enum SecurityLabel {
    #[default]
    Low,
    High,
}

impl SecurityLabel {
    /// Least upper bound of two labels.
    pub fn join(self, other: SecurityLabel) -> SecurityLabel {
        if self == SecurityLabel::High || other == SecurityLabel::High {
            SecurityLabel::High
        } else {
            SecurityLabel::Low
        }
    }

    pub fn is_high(self) -> bool {
        self == SecurityLabel::High
    }
}

/// Primitive types understood by both passes. There is no implicit coercion
/// between `Int64` and `Double`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StaticType {
    Int64,
    Double,
    Bool,
    Void,
}

impl StaticType {
    /// Maps a type annotation name to a type. Unknown names map to `Void`,
    /// which reads as "no declared type".
    pub fn from_annotation(name: &str) -> StaticType {
        match name {
            "int" => StaticType::Int64,
            "double" => StaticType::Double,
            "bool" => StaticType::Bool,
            _ => StaticType::Void,
        }
    }

    pub fn is_numeric(self) -> bool {
        matches!(self, StaticType::Int64 | StaticType::Double)
    }
}

impl Display for StaticType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StaticType::Int64 => write!(f, "int"),
            StaticType::Double => write!(f, "double"),
            StaticType::Bool => write!(f, "bool"),
            StaticType::Void => write!(f, "void"),
        }
    }
}

/// A static type paired with its security label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SType {
    pub ty: StaticType,
    pub security: SecurityLabel,
}

impl SType {
    pub fn new(ty: StaticType, security: SecurityLabel) -> Self {
        SType { ty, security }
    }

    pub fn low(ty: StaticType) -> Self {
        SType::new(ty, SecurityLabel::Low)
    }

    pub fn void() -> Self {
        SType::low(StaticType::Void)
    }

    pub fn is_void(&self) -> bool {
        self.ty == StaticType::Void
    }
}

impl Display for SType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.security, self.ty)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOperator {
    Add,
    Sub,
    Mul,
    Div,
    Equal,
    NotEqual,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
}

impl BinaryOperator {
    pub fn is_arithmetic(self) -> bool {
        matches!(
            self,
            BinaryOperator::Add | BinaryOperator::Sub | BinaryOperator::Mul | BinaryOperator::Div
        )
    }

    pub fn is_comparison(self) -> bool {
        !self.is_arithmetic()
    }

    pub fn is_equality(self) -> bool {
        matches!(self, BinaryOperator::Equal | BinaryOperator::NotEqual)
    }

    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOperator::Add => "+",
            BinaryOperator::Sub => "-",
            BinaryOperator::Mul => "*",
            BinaryOperator::Div => "/",
            BinaryOperator::Equal => "==",
            BinaryOperator::NotEqual => "!=",
            BinaryOperator::Less => "<",
            BinaryOperator::LessEqual => "<=",
            BinaryOperator::Greater => ">",
            BinaryOperator::GreaterEqual => ">=",
        }
    }

    pub fn from_symbol(symbol: &str) -> Option<BinaryOperator> {
        Some(match symbol {
            "+" => BinaryOperator::Add,
            "-" => BinaryOperator::Sub,
            "*" => BinaryOperator::Mul,
            "/" => BinaryOperator::Div,
            "==" => BinaryOperator::Equal,
            "!=" => BinaryOperator::NotEqual,
            "<" => BinaryOperator::Less,
            "<=" => BinaryOperator::LessEqual,
            ">" => BinaryOperator::Greater,
            ">=" => BinaryOperator::GreaterEqual,
            _ => return None,
        })
    }
}

impl Display for BinaryOperator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.symbol())
    }
}
