// Copyright 2025 Cowboy AI, LLC.

//! Specifications: reusable, composable predicates over a domain type
//!
//! A [`Specification<T>`] wraps a [`Lambda<T>`] and never changes after
//! construction. Combinators build a third specification whose tree joins
//! both operand bodies under one fresh placeholder:
//!
//! | Combinator | Node | Right operand evaluated |
//! |------------|------|-------------------------|
//! | [`and_also`](Specification::and_also) | `&&` | only if the left is true |
//! | [`or_else`](Specification::or_else) | `\|\|` | only if the left is false |
//! | [`and`](Specification::and) | `&` | always |
//! | [`or`](Specification::or) | `\|` | always |
//! | [`xor`](Specification::xor) | `^` | always |
//! | [`not`] | `!` | n/a |
//!
//! A specification may exist without a tree. Such a specification can be
//! passed around freely; it only fails, with
//! [`SpecificationError::MissingExpression`], when something needs the tree.

use std::fmt;
use std::sync::Arc;
#[cfg(feature = "compile-cache")]
use std::sync::OnceLock;

use tracing::trace;

use crate::errors::{SpecificationError, SpecificationResult};
use crate::expression::{rebind, BinaryOp, CompiledPredicate, Expr, Lambda, UnaryOp};

/// Right-hand side of a combinator, after resolving the argument
pub enum Operand<T> {
    /// No argument was supplied
    Absent,
    /// A specification without an expression tree
    Incomplete,
    /// An expression tree
    Expression(Arc<Lambda<T>>),
}

/// Arguments accepted by the combinators
///
/// Implemented for raw lambdas, specifications, references to both, and
/// `Option` of any of them, where `None` stands for a missing argument.
pub trait IntoOperand<T> {
    /// Argument name reported when the operand is rejected
    const ARGUMENT: &'static str;

    /// Resolve the argument
    fn into_operand(self) -> Operand<T>;
}

impl<T> IntoOperand<T> for Lambda<T> {
    const ARGUMENT: &'static str = "expression";

    fn into_operand(self) -> Operand<T> {
        Operand::Expression(Arc::new(self))
    }
}

impl<T> IntoOperand<T> for &Lambda<T> {
    const ARGUMENT: &'static str = "expression";

    fn into_operand(self) -> Operand<T> {
        Operand::Expression(Arc::new(self.clone()))
    }
}

impl<T> IntoOperand<T> for Specification<T> {
    const ARGUMENT: &'static str = "target";

    fn into_operand(self) -> Operand<T> {
        match self.expression {
            Some(expression) => Operand::Expression(expression),
            None => Operand::Incomplete,
        }
    }
}

impl<T> IntoOperand<T> for &Specification<T> {
    const ARGUMENT: &'static str = "target";

    fn into_operand(self) -> Operand<T> {
        match &self.expression {
            Some(expression) => Operand::Expression(Arc::clone(expression)),
            None => Operand::Incomplete,
        }
    }
}

impl<T, O: IntoOperand<T>> IntoOperand<T> for Option<O> {
    const ARGUMENT: &'static str = O::ARGUMENT;

    fn into_operand(self) -> Operand<T> {
        match self {
            Some(operand) => operand.into_operand(),
            None => Operand::Absent,
        }
    }
}

/// A predicate over `T` backed by an expression tree
pub struct Specification<T> {
    expression: Option<Arc<Lambda<T>>>,
    #[cfg(feature = "compile-cache")]
    compiled: Arc<OnceLock<SpecificationResult<Arc<CompiledPredicate<T>>>>>,
}

impl<T> Specification<T> {
    fn from_expression(expression: Option<Arc<Lambda<T>>>) -> Self {
        Self {
            expression,
            #[cfg(feature = "compile-cache")]
            compiled: Arc::new(OnceLock::new()),
        }
    }

    /// Create a specification from a lambda
    pub fn new(expression: Lambda<T>) -> Self {
        Self::from_expression(Some(Arc::new(expression)))
    }

    /// Create a specification from a closure receiving the placeholder
    ///
    /// ```rust
    /// use cim_specification::{expression::Member, Specification};
    ///
    /// struct Parcel { weight: i64 }
    ///
    /// let weight = Member::integer("weight", |p: &Parcel| p.weight);
    /// let heavy = Specification::from_fn("p", |p| p.member(weight).gt(20));
    ///
    /// assert!(heavy.is_satisfied(&Parcel { weight: 35 }).unwrap());
    /// ```
    pub fn from_fn<F>(name: impl Into<Arc<str>>, build: F) -> Self
    where
        F: FnOnce(Expr<T>) -> Expr<T>,
    {
        Self::new(Lambda::from_fn(name, build))
    }

    /// A specification without an expression tree
    pub fn empty() -> Self {
        Self::from_expression(None)
    }

    /// The expression tree, if any
    pub fn expression(&self) -> Option<&Lambda<T>> {
        self.expression.as_deref()
    }

    /// Whether an expression tree is attached
    pub fn is_complete(&self) -> bool {
        self.expression.is_some()
    }

    fn require_expression(&self) -> SpecificationResult<&Arc<Lambda<T>>> {
        self.expression
            .as_ref()
            .ok_or(SpecificationError::MissingExpression)
    }
}

impl<T: 'static> Specification<T> {
    /// Short-circuit AND: `other` is not evaluated when `self` is false
    pub fn and_also<O: IntoOperand<T>>(&self, other: O) -> SpecificationResult<Self> {
        self.combine(BinaryOp::AndAlso, other)
    }

    /// Eager AND: both predicates are always evaluated
    pub fn and<O: IntoOperand<T>>(&self, other: O) -> SpecificationResult<Self> {
        self.combine(BinaryOp::And, other)
    }

    /// Short-circuit OR: `other` is not evaluated when `self` is true
    pub fn or_else<O: IntoOperand<T>>(&self, other: O) -> SpecificationResult<Self> {
        self.combine(BinaryOp::OrElse, other)
    }

    /// Eager OR: both predicates are always evaluated
    pub fn or<O: IntoOperand<T>>(&self, other: O) -> SpecificationResult<Self> {
        self.combine(BinaryOp::Or, other)
    }

    /// Exclusive OR: both predicates are always evaluated
    pub fn xor<O: IntoOperand<T>>(&self, other: O) -> SpecificationResult<Self> {
        self.combine(BinaryOp::ExclusiveOr, other)
    }

    /// Negation of this specification; see [`not`]
    pub fn negate(&self) -> SpecificationResult<Self> {
        not(self)
    }

    /// Evaluate the specification against a candidate
    ///
    /// The tree is compiled on every call unless the `compile-cache`
    /// feature is enabled. Use [`Specification::compile`] to compile once
    /// and evaluate many times.
    pub fn is_satisfied(&self, candidate: &T) -> SpecificationResult<bool> {
        self.predicate()?.evaluate(candidate)
    }

    #[cfg(feature = "compile-cache")]
    fn predicate(&self) -> SpecificationResult<Arc<CompiledPredicate<T>>> {
        let expression = self.require_expression()?;
        self.compiled
            .get_or_init(|| expression.compile().map(Arc::new))
            .clone()
    }

    #[cfg(not(feature = "compile-cache"))]
    fn predicate(&self) -> SpecificationResult<CompiledPredicate<T>> {
        self.require_expression()?.compile()
    }

    /// Compile the tree into a reusable predicate
    pub fn compile(&self) -> SpecificationResult<CompiledPredicate<T>> {
        self.require_expression()?.compile()
    }

    fn combine<O: IntoOperand<T>>(&self, op: BinaryOp, other: O) -> SpecificationResult<Self> {
        let right = match other.into_operand() {
            Operand::Expression(expression) => expression,
            Operand::Absent | Operand::Incomplete => {
                return Err(SpecificationError::invalid_argument(O::ARGUMENT))
            }
        };
        let left = self.require_expression()?;

        let parameter = left.parameter().fresh();
        let body = Expr::binary(op, rebind(left, &parameter), rebind(&right, &parameter));
        trace!(operator = op.symbol(), parameter = %parameter, "combined specifications");

        Ok(Self::new(Lambda::new(parameter, body)))
    }
}

/// Negate a specification
///
/// Fails with [`SpecificationError::InvalidArgument`] when no argument is
/// given and with [`SpecificationError::MissingExpression`] when the
/// specification has no tree.
pub fn not<T: 'static, O: IntoOperand<T>>(spec: O) -> SpecificationResult<Specification<T>> {
    let inner = match spec.into_operand() {
        Operand::Expression(expression) => expression,
        Operand::Incomplete => return Err(SpecificationError::MissingExpression),
        Operand::Absent => return Err(SpecificationError::invalid_argument(O::ARGUMENT)),
    };

    let parameter = inner.parameter().fresh();
    let body = Expr::unary(UnaryOp::Not, rebind(&inner, &parameter));
    trace!(operator = UnaryOp::Not.symbol(), parameter = %parameter, "negated specification");

    Ok(Specification::new(Lambda::new(parameter, body)))
}

impl<T> Clone for Specification<T> {
    fn clone(&self) -> Self {
        Self {
            expression: self.expression.clone(),
            #[cfg(feature = "compile-cache")]
            compiled: Arc::clone(&self.compiled),
        }
    }
}

impl<T> Default for Specification<T> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<T> From<Lambda<T>> for Specification<T> {
    fn from(expression: Lambda<T>) -> Self {
        Self::new(expression)
    }
}

impl<T> fmt::Display for Specification<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.expression {
            Some(expression) => write!(f, "{expression}"),
            None => f.write_str("<missing expression>"),
        }
    }
}

impl<T> fmt::Debug for Specification<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Specification({self})")
    }
}
