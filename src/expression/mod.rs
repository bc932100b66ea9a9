// Copyright 2025 Cowboy AI, LLC.

//! Expression trees over a single free variable
//!
//! An [`Expr<T>`] is a typed-at-compile-time syntax tree describing a
//! computation over one candidate of type `T`. A [`Lambda<T>`] closes such a
//! tree over its placeholder [`Parameter`] and is the unit that
//! specifications store, combine and compile.
//!
//! # Node kinds
//!
//! | Node | Meaning |
//! |------|---------|
//! | [`Expr::Parameter`] | reference to a placeholder |
//! | [`Expr::Constant`] | literal [`Value`] |
//! | [`Expr::Member`] | typed accessor applied to the candidate |
//! | [`Expr::Call`] | built-in [`Function`] (`today`, `year`, `length`) |
//! | [`Expr::Unary`] | `!` and unary `-` |
//! | [`Expr::Binary`] | arithmetic, comparison, eager and short-circuit logic |
//!
//! Trees are immutable values. Rewriting (see [`ExprRewriter`]) and
//! combination always build new trees.
//!
//! ```rust
//! use cim_specification::expression::{Lambda, Member};
//!
//! struct Order { total: i64 }
//!
//! let total = Member::integer("total", |o: &Order| o.total);
//! let large = Lambda::from_fn("o", |o| o.member(total).gt(1_000));
//!
//! assert_eq!(large.to_string(), "|o| (o.total > 1000)");
//! assert!(large.compile().unwrap().evaluate(&Order { total: 5_000 }).unwrap());
//! ```

mod compile;
mod visitor;

pub use compile::CompiledPredicate;
pub use visitor::{rebind, walk_rewrite, ExprRewriter, ParameterRebinder};

use std::fmt;
use std::ops;
use std::sync::Arc;

use chrono::NaiveDate;

use crate::identifiers::ParameterId;

/// A free-variable placeholder
///
/// Equality is by identity: two placeholders created with the same name are
/// still different variables.
#[derive(Clone)]
pub struct Parameter {
    id: ParameterId,
    name: Arc<str>,
}

impl Parameter {
    /// Create a new placeholder with a display name
    pub fn new(name: impl Into<Arc<str>>) -> Self {
        Self {
            id: ParameterId::new(),
            name: name.into(),
        }
    }

    /// A new placeholder carrying the same display name
    pub fn fresh(&self) -> Self {
        Self {
            id: ParameterId::new(),
            name: Arc::clone(&self.name),
        }
    }

    /// Identity of this placeholder
    pub fn id(&self) -> ParameterId {
        self.id
    }

    /// Display name
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl PartialEq for Parameter {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Parameter {}

impl fmt::Debug for Parameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Parameter")
            .field("name", &self.name)
            .field("id", &self.id)
            .finish()
    }
}

impl fmt::Display for Parameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Literal values
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Boolean
    Bool(bool),
    /// Signed integer
    Int(i64),
    /// Floating point number
    Float(f64),
    /// String
    Str(String),
    /// Calendar date
    Date(NaiveDate),
}

impl Value {
    /// Kind of this value
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Bool(_) => ValueKind::Bool,
            Value::Int(_) => ValueKind::Int,
            Value::Float(_) => ValueKind::Float,
            Value::Str(_) => ValueKind::Str,
            Value::Date(_) => ValueKind::Date,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(v) => write!(f, "{v}"),
            Value::Int(v) => write!(f, "{v}"),
            Value::Float(v) => write!(f, "{v:?}"),
            Value::Str(v) => write!(f, "{v:?}"),
            Value::Date(v) => write!(f, "{v}"),
        }
    }
}

/// The kinds a value-producing node can have
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    /// Boolean
    Bool,
    /// Signed integer
    Int,
    /// Floating point number
    Float,
    /// String
    Str,
    /// Calendar date
    Date,
}

impl ValueKind {
    /// Lower-case name used in diagnostics
    pub fn name(&self) -> &'static str {
        match self {
            ValueKind::Bool => "bool",
            ValueKind::Int => "int",
            ValueKind::Float => "float",
            ValueKind::Str => "string",
            ValueKind::Date => "date",
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

macro_rules! value_conversions {
    ($($source:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$source> for Value {
                fn from(value: $source) -> Self {
                    Value::$variant(value.into())
                }
            }

            impl<T> From<$source> for Expr<T> {
                fn from(value: $source) -> Self {
                    Expr::Constant(Value::from(value))
                }
            }
        )*
    };
}

value_conversions! {
    bool => Bool,
    i32 => Int,
    i64 => Int,
    f64 => Float,
    &str => Str,
    String => Str,
    NaiveDate => Date,
}

impl<T> From<Value> for Expr<T> {
    fn from(value: Value) -> Self {
        Expr::Constant(value)
    }
}

pub(crate) type Getter<T, X> = Arc<dyn Fn(&T) -> X + Send + Sync>;

pub(crate) enum Accessor<T> {
    Bool(Getter<T, bool>),
    Int(Getter<T, i64>),
    Float(Getter<T, f64>),
    Str(Getter<T, String>),
    Date(Getter<T, NaiveDate>),
}

impl<T> Clone for Accessor<T> {
    fn clone(&self) -> Self {
        match self {
            Accessor::Bool(get) => Accessor::Bool(Arc::clone(get)),
            Accessor::Int(get) => Accessor::Int(Arc::clone(get)),
            Accessor::Float(get) => Accessor::Float(Arc::clone(get)),
            Accessor::Str(get) => Accessor::Str(Arc::clone(get)),
            Accessor::Date(get) => Accessor::Date(Arc::clone(get)),
        }
    }
}

/// A named, typed member of the candidate type
///
/// Members are how domain fields enter a tree: the accessor is host code,
/// the name is what the tree renders.
pub struct Member<T> {
    name: Arc<str>,
    accessor: Accessor<T>,
}

impl<T> Member<T> {
    /// Boolean member
    pub fn boolean<F>(name: impl Into<Arc<str>>, accessor: F) -> Self
    where
        F: Fn(&T) -> bool + Send + Sync + 'static,
    {
        Self::with(name, Accessor::Bool(Arc::new(accessor)))
    }

    /// Integer member
    pub fn integer<F>(name: impl Into<Arc<str>>, accessor: F) -> Self
    where
        F: Fn(&T) -> i64 + Send + Sync + 'static,
    {
        Self::with(name, Accessor::Int(Arc::new(accessor)))
    }

    /// Floating point member
    pub fn float<F>(name: impl Into<Arc<str>>, accessor: F) -> Self
    where
        F: Fn(&T) -> f64 + Send + Sync + 'static,
    {
        Self::with(name, Accessor::Float(Arc::new(accessor)))
    }

    /// String member
    pub fn string<F>(name: impl Into<Arc<str>>, accessor: F) -> Self
    where
        F: Fn(&T) -> String + Send + Sync + 'static,
    {
        Self::with(name, Accessor::Str(Arc::new(accessor)))
    }

    /// Date member
    pub fn date<F>(name: impl Into<Arc<str>>, accessor: F) -> Self
    where
        F: Fn(&T) -> NaiveDate + Send + Sync + 'static,
    {
        Self::with(name, Accessor::Date(Arc::new(accessor)))
    }

    fn with(name: impl Into<Arc<str>>, accessor: Accessor<T>) -> Self {
        Self {
            name: name.into(),
            accessor,
        }
    }

    /// Member name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Kind of value the accessor yields
    pub fn kind(&self) -> ValueKind {
        match self.accessor {
            Accessor::Bool(_) => ValueKind::Bool,
            Accessor::Int(_) => ValueKind::Int,
            Accessor::Float(_) => ValueKind::Float,
            Accessor::Str(_) => ValueKind::Str,
            Accessor::Date(_) => ValueKind::Date,
        }
    }

    pub(crate) fn accessor(&self) -> &Accessor<T> {
        &self.accessor
    }
}

impl<T> Clone for Member<T> {
    fn clone(&self) -> Self {
        Self {
            name: Arc::clone(&self.name),
            accessor: self.accessor.clone(),
        }
    }
}

impl<T> fmt::Debug for Member<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Member")
            .field("name", &self.name)
            .field("kind", &self.kind())
            .finish()
    }
}

/// Built-in functions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Function {
    /// Current local date, read when the predicate runs
    Today,
    /// Calendar year of a date
    Year,
    /// Number of characters in a string
    Length,
}

impl Function {
    /// Function name
    pub fn name(&self) -> &'static str {
        match self {
            Function::Today => "today",
            Function::Year => "year",
            Function::Length => "length",
        }
    }

    /// Number of arguments the function takes
    pub fn arity(&self) -> usize {
        match self {
            Function::Today => 0,
            Function::Year | Function::Length => 1,
        }
    }
}

/// Unary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    /// Boolean negation
    Not,
    /// Arithmetic negation
    Negate,
}

impl UnaryOp {
    /// Operator symbol
    pub fn symbol(&self) -> &'static str {
        match self {
            UnaryOp::Not => "!",
            UnaryOp::Negate => "-",
        }
    }
}

/// Binary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    /// `+`
    Add,
    /// `-`
    Subtract,
    /// `*`
    Multiply,
    /// `/`
    Divide,
    /// `%`
    Modulo,
    /// `==`
    Equal,
    /// `!=`
    NotEqual,
    /// `<`
    LessThan,
    /// `<=`
    LessThanOrEqual,
    /// `>`
    GreaterThan,
    /// `>=`
    GreaterThanOrEqual,
    /// Short-circuit AND: the right side is skipped when the left is false
    AndAlso,
    /// Short-circuit OR: the right side is skipped when the left is true
    OrElse,
    /// Eager AND: both sides are always evaluated
    And,
    /// Eager OR: both sides are always evaluated
    Or,
    /// Exclusive OR: both sides are always evaluated
    ExclusiveOr,
}

impl BinaryOp {
    /// Operator symbol
    pub fn symbol(&self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Subtract => "-",
            BinaryOp::Multiply => "*",
            BinaryOp::Divide => "/",
            BinaryOp::Modulo => "%",
            BinaryOp::Equal => "==",
            BinaryOp::NotEqual => "!=",
            BinaryOp::LessThan => "<",
            BinaryOp::LessThanOrEqual => "<=",
            BinaryOp::GreaterThan => ">",
            BinaryOp::GreaterThanOrEqual => ">=",
            BinaryOp::AndAlso => "&&",
            BinaryOp::OrElse => "||",
            BinaryOp::And => "&",
            BinaryOp::Or => "|",
            BinaryOp::ExclusiveOr => "^",
        }
    }

    /// Whether the operator may skip its right operand
    pub fn is_short_circuit(&self) -> bool {
        matches!(self, BinaryOp::AndAlso | BinaryOp::OrElse)
    }

    /// Whether the operator combines two booleans
    pub fn is_logical(&self) -> bool {
        matches!(
            self,
            BinaryOp::AndAlso
                | BinaryOp::OrElse
                | BinaryOp::And
                | BinaryOp::Or
                | BinaryOp::ExclusiveOr
        )
    }

    /// Whether the operator combines two numbers
    pub fn is_arithmetic(&self) -> bool {
        matches!(
            self,
            BinaryOp::Add
                | BinaryOp::Subtract
                | BinaryOp::Multiply
                | BinaryOp::Divide
                | BinaryOp::Modulo
        )
    }

    /// Whether the operator compares two values of the same kind
    pub fn is_comparison(&self) -> bool {
        matches!(
            self,
            BinaryOp::Equal
                | BinaryOp::NotEqual
                | BinaryOp::LessThan
                | BinaryOp::LessThanOrEqual
                | BinaryOp::GreaterThan
                | BinaryOp::GreaterThanOrEqual
        )
    }
}

/// Expression tree over a candidate of type `T`
pub enum Expr<T> {
    /// Reference to a placeholder
    Parameter(Parameter),

    /// Literal value
    Constant(Value),

    /// Member access on the candidate
    Member {
        /// Expression yielding the candidate
        object: Box<Expr<T>>,
        /// Accessor applied to it
        member: Member<T>,
    },

    /// Built-in function call
    Call {
        /// Function to call
        function: Function,
        /// Arguments in order
        arguments: Vec<Expr<T>>,
    },

    /// Unary operation
    Unary {
        /// Operator
        op: UnaryOp,
        /// Operand
        operand: Box<Expr<T>>,
    },

    /// Binary operation
    Binary {
        /// Operator
        op: BinaryOp,
        /// Left operand
        left: Box<Expr<T>>,
        /// Right operand
        right: Box<Expr<T>>,
    },
}

impl<T> Expr<T> {
    /// Reference a placeholder
    pub fn parameter(parameter: &Parameter) -> Self {
        Expr::Parameter(parameter.clone())
    }

    /// Literal value
    pub fn constant(value: impl Into<Value>) -> Self {
        Expr::Constant(value.into())
    }

    /// The current local date
    pub fn today() -> Self {
        Self::call(Function::Today, Vec::new())
    }

    /// Call a built-in function
    pub fn call(function: Function, arguments: Vec<Expr<T>>) -> Self {
        Expr::Call {
            function,
            arguments,
        }
    }

    /// Unary node
    pub fn unary(op: UnaryOp, operand: Expr<T>) -> Self {
        Expr::Unary {
            op,
            operand: Box::new(operand),
        }
    }

    /// Binary node
    pub fn binary(op: BinaryOp, left: Expr<T>, right: Expr<T>) -> Self {
        Expr::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    /// Access a member of the candidate this expression yields
    pub fn member(self, member: Member<T>) -> Self {
        Expr::Member {
            object: Box::new(self),
            member,
        }
    }

    /// Calendar year of a date expression
    pub fn year(self) -> Self {
        Self::call(Function::Year, vec![self])
    }

    /// Character count of a string expression
    pub fn length(self) -> Self {
        Self::call(Function::Length, vec![self])
    }

    /// `self == rhs`
    pub fn equal(self, rhs: impl Into<Self>) -> Self {
        Self::binary(BinaryOp::Equal, self, rhs.into())
    }

    /// `self != rhs`
    pub fn not_equal(self, rhs: impl Into<Self>) -> Self {
        Self::binary(BinaryOp::NotEqual, self, rhs.into())
    }

    /// `self < rhs`
    pub fn lt(self, rhs: impl Into<Self>) -> Self {
        Self::binary(BinaryOp::LessThan, self, rhs.into())
    }

    /// `self <= rhs`
    pub fn le(self, rhs: impl Into<Self>) -> Self {
        Self::binary(BinaryOp::LessThanOrEqual, self, rhs.into())
    }

    /// `self > rhs`
    pub fn gt(self, rhs: impl Into<Self>) -> Self {
        Self::binary(BinaryOp::GreaterThan, self, rhs.into())
    }

    /// `self >= rhs`
    pub fn ge(self, rhs: impl Into<Self>) -> Self {
        Self::binary(BinaryOp::GreaterThanOrEqual, self, rhs.into())
    }

    /// Short-circuit `self && rhs`
    pub fn and_also(self, rhs: impl Into<Self>) -> Self {
        Self::binary(BinaryOp::AndAlso, self, rhs.into())
    }

    /// Short-circuit `self || rhs`
    pub fn or_else(self, rhs: impl Into<Self>) -> Self {
        Self::binary(BinaryOp::OrElse, self, rhs.into())
    }

    /// Visit every node in pre-order
    pub fn walk<'a, F>(&'a self, visit: &mut F)
    where
        F: FnMut(&'a Expr<T>),
    {
        visit(self);
        match self {
            Expr::Parameter(_) | Expr::Constant(_) => {}
            Expr::Member { object, .. } => object.walk(visit),
            Expr::Call { arguments, .. } => {
                for argument in arguments {
                    argument.walk(visit);
                }
            }
            Expr::Unary { operand, .. } => operand.walk(visit),
            Expr::Binary { left, right, .. } => {
                left.walk(visit);
                right.walk(visit);
            }
        }
    }

    /// Distinct placeholders referenced anywhere in the tree
    pub fn parameters(&self) -> Vec<Parameter> {
        let mut found: Vec<Parameter> = Vec::new();
        self.walk(&mut |node| {
            if let Expr::Parameter(parameter) = node {
                if !found.contains(parameter) {
                    found.push(parameter.clone());
                }
            }
        });
        found
    }
}

impl<T> Clone for Expr<T> {
    fn clone(&self) -> Self {
        match self {
            Expr::Parameter(parameter) => Expr::Parameter(parameter.clone()),
            Expr::Constant(value) => Expr::Constant(value.clone()),
            Expr::Member { object, member } => Expr::Member {
                object: object.clone(),
                member: member.clone(),
            },
            Expr::Call {
                function,
                arguments,
            } => Expr::Call {
                function: *function,
                arguments: arguments.clone(),
            },
            Expr::Unary { op, operand } => Expr::Unary {
                op: *op,
                operand: operand.clone(),
            },
            Expr::Binary { op, left, right } => Expr::Binary {
                op: *op,
                left: left.clone(),
                right: right.clone(),
            },
        }
    }
}

impl<T> fmt::Display for Expr<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Parameter(parameter) => write!(f, "{parameter}"),
            Expr::Constant(value) => write!(f, "{value}"),
            Expr::Member { object, member } => write!(f, "{object}.{}", member.name()),
            Expr::Call {
                function,
                arguments,
            } => match arguments.split_first() {
                Some((receiver, rest)) => {
                    write!(f, "{receiver}.{}(", function.name())?;
                    for (index, argument) in rest.iter().enumerate() {
                        if index > 0 {
                            f.write_str(", ")?;
                        }
                        write!(f, "{argument}")?;
                    }
                    f.write_str(")")
                }
                None => write!(f, "{}()", function.name()),
            },
            Expr::Unary { op, operand } => write!(f, "{}{operand}", op.symbol()),
            Expr::Binary { op, left, right } => {
                write!(f, "({left} {} {right})", op.symbol())
            }
        }
    }
}

impl<T> fmt::Debug for Expr<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Expr({self})")
    }
}

macro_rules! binary_operators {
    ($($trait:ident::$method:ident => $op:ident),* $(,)?) => {
        $(
            impl<T, R: Into<Expr<T>>> ops::$trait<R> for Expr<T> {
                type Output = Expr<T>;

                fn $method(self, rhs: R) -> Expr<T> {
                    Expr::binary(BinaryOp::$op, self, rhs.into())
                }
            }
        )*
    };
}

binary_operators! {
    Add::add => Add,
    Sub::sub => Subtract,
    Mul::mul => Multiply,
    Div::div => Divide,
    Rem::rem => Modulo,
    BitAnd::bitand => And,
    BitOr::bitor => Or,
    BitXor::bitxor => ExclusiveOr,
}

impl<T> ops::Not for Expr<T> {
    type Output = Expr<T>;

    fn not(self) -> Expr<T> {
        Expr::unary(UnaryOp::Not, self)
    }
}

impl<T> ops::Neg for Expr<T> {
    type Output = Expr<T>;

    fn neg(self) -> Expr<T> {
        Expr::unary(UnaryOp::Negate, self)
    }
}

/// A boolean expression closed over its single placeholder
pub struct Lambda<T> {
    parameter: Parameter,
    body: Expr<T>,
}

impl<T> Lambda<T> {
    /// Close `body` over `parameter`
    pub fn new(parameter: Parameter, body: Expr<T>) -> Self {
        Self { parameter, body }
    }

    /// Build a lambda from a closure receiving the placeholder expression
    pub fn from_fn<F>(name: impl Into<Arc<str>>, build: F) -> Self
    where
        F: FnOnce(Expr<T>) -> Expr<T>,
    {
        let parameter = Parameter::new(name);
        let body = build(Expr::parameter(&parameter));
        Self { parameter, body }
    }

    /// The placeholder
    pub fn parameter(&self) -> &Parameter {
        &self.parameter
    }

    /// The body
    pub fn body(&self) -> &Expr<T> {
        &self.body
    }
}

impl<T> Clone for Lambda<T> {
    fn clone(&self) -> Self {
        Self {
            parameter: self.parameter.clone(),
            body: self.body.clone(),
        }
    }
}

impl<T> fmt::Display for Lambda<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "|{}| {}", self.parameter, self.body)
    }
}

impl<T> fmt::Debug for Lambda<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Lambda({self})")
    }
}
