//! FILENAME: formula/src/ast.rs
//! PURPOSE: Defines the Abstract Syntax Tree (AST) for formula expressions.
//! CONTEXT: After the Lexer tokenizes a formula string, the Parser converts
//! those tokens into this tree structure. `engine` traverses this tree to
//! compute a result and to discover which cells a formula depends on.
//!
//! SUPPORTED EXPRESSIONS:
//! - Numeric literals
//! - Single-cell references: A1, AA100 (no sheet prefixes, no ranges, no $)
//! - Binary operations: + - * / ^ and the comparisons = <> < > <= >=
//! - Unary negation: -x
//! - Scalar function calls: SUM, MIN, MAX, ABS, ROUND, SQRT, POWER, MOD,
//!   SIGN, INT, FLOOR, CEILING, IF, AND, OR, NOT

/// Represents a parsed formula expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    /// A numeric literal.
    Literal(f64),

    /// A single cell reference like A1 or AA100.
    /// `col` is the raw column letters (uppercased); `row` is 1-based.
    CellRef { col: String, row: u32 },

    /// A binary operation: left op right.
    BinaryOp {
        left: Box<Expression>,
        op: BinaryOperator,
        right: Box<Expression>,
    },

    /// A unary operation (currently only negation).
    UnaryOp {
        op: UnaryOperator,
        operand: Box<Expression>,
    },

    /// A call to one of the built-in scalar functions.
    FunctionCall {
        func: BuiltinFunction,
        args: Vec<Expression>,
    },
}

/// Built-in spreadsheet functions resolved at parse time.
/// Using an enum instead of a String avoids heap allocations and enables
/// fast integer-based dispatch in the evaluator.
#[derive(Debug, Clone, PartialEq)]
pub enum BuiltinFunction {
    Sum,
    Min,
    Max,

    If,
    And,
    Or,
    Not,

    Abs,
    Round,
    Floor,
    Ceiling,
    Sqrt,
    Power,
    Mod,
    Int,
    Sign,
}

impl BuiltinFunction {
    /// Resolves a function name string (case-insensitive) to a `BuiltinFunction`
    /// variant. Called once at parse time, not during evaluation.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_uppercase().as_str() {
            "SUM" => Some(BuiltinFunction::Sum),
            "MIN" => Some(BuiltinFunction::Min),
            "MAX" => Some(BuiltinFunction::Max),

            "IF" => Some(BuiltinFunction::If),
            "AND" => Some(BuiltinFunction::And),
            "OR" => Some(BuiltinFunction::Or),
            "NOT" => Some(BuiltinFunction::Not),

            "ABS" => Some(BuiltinFunction::Abs),
            "ROUND" => Some(BuiltinFunction::Round),
            "FLOOR" => Some(BuiltinFunction::Floor),
            "CEILING" | "CEIL" => Some(BuiltinFunction::Ceiling),
            "SQRT" => Some(BuiltinFunction::Sqrt),
            "POWER" | "POW" => Some(BuiltinFunction::Power),
            "MOD" => Some(BuiltinFunction::Mod),
            "INT" => Some(BuiltinFunction::Int),
            "SIGN" => Some(BuiltinFunction::Sign),

            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            BuiltinFunction::Sum => "SUM",
            BuiltinFunction::Min => "MIN",
            BuiltinFunction::Max => "MAX",
            BuiltinFunction::If => "IF",
            BuiltinFunction::And => "AND",
            BuiltinFunction::Or => "OR",
            BuiltinFunction::Not => "NOT",
            BuiltinFunction::Abs => "ABS",
            BuiltinFunction::Round => "ROUND",
            BuiltinFunction::Floor => "FLOOR",
            BuiltinFunction::Ceiling => "CEILING",
            BuiltinFunction::Sqrt => "SQRT",
            BuiltinFunction::Power => "POWER",
            BuiltinFunction::Mod => "MOD",
            BuiltinFunction::Int => "INT",
            BuiltinFunction::Sign => "SIGN",
        }
    }
}

/// Binary operators, grouped by precedence (comparison lowest, power highest).
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BinaryOperator {
    Equal,
    NotEqual,
    LessThan,
    GreaterThan,
    LessEqual,
    GreaterEqual,

    Add,
    Subtract,
    Multiply,
    Divide,
    Power,
}

impl BinaryOperator {
    /// Binding strength used by the canonical printer to decide when a
    /// child expression needs parenthesizing. Mirrors the precedence chain
    /// `parser.rs` actually implements: comparison < additive < multiplicative
    /// < power.
    fn precedence(self) -> u8 {
        match self {
            BinaryOperator::Equal
            | BinaryOperator::NotEqual
            | BinaryOperator::LessThan
            | BinaryOperator::GreaterThan
            | BinaryOperator::LessEqual
            | BinaryOperator::GreaterEqual => 1,
            BinaryOperator::Add | BinaryOperator::Subtract => 2,
            BinaryOperator::Multiply | BinaryOperator::Divide => 3,
            BinaryOperator::Power => 5,
        }
    }

    /// `true` for operators where `a op b op c` means `(a op b) op c`.
    /// `Power` is the sole right-associative operator in this grammar.
    fn is_left_associative(self) -> bool {
        !matches!(self, BinaryOperator::Power)
    }
}

/// Unary operators.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UnaryOperator {
    Negate,
}

/// Precedence `UnaryOperator::Negate` binds at, for the printer.
const UNARY_PRECEDENCE: u8 = 4;

impl std::fmt::Display for BinaryOperator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BinaryOperator::Add => write!(f, "+"),
            BinaryOperator::Subtract => write!(f, "-"),
            BinaryOperator::Multiply => write!(f, "*"),
            BinaryOperator::Divide => write!(f, "/"),
            BinaryOperator::Power => write!(f, "^"),
            BinaryOperator::Equal => write!(f, "="),
            BinaryOperator::NotEqual => write!(f, "<>"),
            BinaryOperator::LessThan => write!(f, "<"),
            BinaryOperator::GreaterThan => write!(f, ">"),
            BinaryOperator::LessEqual => write!(f, "<="),
            BinaryOperator::GreaterEqual => write!(f, ">="),
        }
    }
}

impl std::fmt::Display for UnaryOperator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UnaryOperator::Negate => write!(f, "-"),
        }
    }
}

impl Expression {
    /// Binding precedence of the expression's outermost operator, for
    /// deciding whether a parent needs to wrap it in parentheses. Atoms
    /// (literals, cell refs, function calls) never need parens around
    /// themselves, so they report the maximum precedence.
    fn precedence(&self) -> u8 {
        match self {
            Expression::BinaryOp { op, .. } => op.precedence(),
            Expression::UnaryOp { .. } => UNARY_PRECEDENCE,
            Expression::Literal(_) | Expression::CellRef { .. } | Expression::FunctionCall { .. } => {
                u8::MAX
            }
        }
    }

    /// Renders `self` as a child of a node with precedence `parent_prec`,
    /// wrapping in parens if printing it bare would change its meaning.
    fn fmt_child(
        &self,
        f: &mut std::fmt::Formatter<'_>,
        parent_prec: u8,
        tighter_or_equal_needs_parens: bool,
    ) -> std::fmt::Result {
        let needs_parens = if tighter_or_equal_needs_parens {
            self.precedence() <= parent_prec
        } else {
            self.precedence() < parent_prec
        };
        if needs_parens {
            write!(f, "(")?;
            std::fmt::Display::fmt(self, f)?;
            write!(f, ")")
        } else {
            std::fmt::Display::fmt(self, f)
        }
    }
}

/// Canonical reprint of an expression: whitespace-normalized, with
/// parentheses kept only where omitting them would change the parse.
impl std::fmt::Display for Expression {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Expression::Literal(n) => write!(f, "{}", n),
            Expression::CellRef { col, row } => write!(f, "{}{}", col, row),
            Expression::BinaryOp { left, op, right } => {
                let prec = op.precedence();
                // Power's left operand comes only from `parse_primary` in the
                // parser (never from `parse_unary`), so a unary-negate left
                // child always needs parens regardless of precedence.
                if matches!(op, BinaryOperator::Power)
                    && matches!(left.as_ref(), Expression::UnaryOp { .. })
                {
                    write!(f, "(")?;
                    std::fmt::Display::fmt(left.as_ref(), f)?;
                    write!(f, ")")?;
                } else {
                    left.fmt_child(f, prec, !op.is_left_associative())?;
                }
                write!(f, " {} ", op)?;
                right.fmt_child(f, prec, op.is_left_associative())
            }
            Expression::UnaryOp { op, operand } => {
                write!(f, "{}", op)?;
                operand.fmt_child(f, UNARY_PRECEDENCE, false)
            }
            Expression::FunctionCall { func, args } => {
                write!(f, "{}(", func.name())?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", arg)?;
                }
                write!(f, ")")
            }
        }
    }
}

/// Walks the AST collecting every cell reference in source order, duplicates
/// retained. `engine` is responsible for converting these raw `(col, row)`
/// pairs into validated, sorted, deduplicated `Position`s.
pub fn referenced_cells(expr: &Expression) -> Vec<(String, u32)> {
    let mut out = Vec::new();
    collect_refs(expr, &mut out);
    out
}

fn collect_refs(expr: &Expression, out: &mut Vec<(String, u32)>) {
    match expr {
        Expression::Literal(_) => {}
        Expression::CellRef { col, row } => out.push((col.clone(), *row)),
        Expression::BinaryOp { left, right, .. } => {
            collect_refs(left, out);
            collect_refs(right, out);
        }
        Expression::UnaryOp { operand, .. } => collect_refs(operand, out),
        Expression::FunctionCall { args, .. } => {
            for arg in args {
                collect_refs(arg, out);
            }
        }
    }
}
