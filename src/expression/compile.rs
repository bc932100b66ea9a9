// Copyright 2025 Cowboy AI, LLC.

//! Compilation of lambdas into executable predicates
//!
//! Compiling type-checks the whole tree up front and turns every node into a
//! boxed closure, so evaluation never inspects node kinds. Only integer
//! arithmetic can fail at evaluation time (division by zero, overflow).

use std::cmp::Ordering;
use std::fmt;

use chrono::{Datelike, Local, NaiveDate};
use tracing::trace;

use super::{Accessor, BinaryOp, Expr, Function, Lambda, Member, Parameter, UnaryOp, Value};
use crate::errors::{CompileError, SpecificationError, SpecificationResult};

type Eval<T, X> = Box<dyn Fn(&T) -> SpecificationResult<X> + Send + Sync>;

/// A compiled node, tagged by the kind it produces
enum Compiled<T> {
    /// The candidate itself; only valid as the object of a member access
    Candidate,
    Bool(Eval<T, bool>),
    Int(Eval<T, i64>),
    Float(Eval<T, f64>),
    Str(Eval<T, String>),
    Date(Eval<T, NaiveDate>),
}

impl<T> Compiled<T> {
    fn describe(&self) -> &'static str {
        match self {
            Compiled::Candidate => "candidate",
            Compiled::Bool(_) => "bool",
            Compiled::Int(_) => "int",
            Compiled::Float(_) => "float",
            Compiled::Str(_) => "string",
            Compiled::Date(_) => "date",
        }
    }
}

#[derive(Clone, Copy)]
enum Logic {
    AndAlso,
    OrElse,
    And,
    Or,
    Xor,
}

#[derive(Clone, Copy)]
enum Operator {
    Arithmetic {
        checked: fn(i64, i64) -> Option<i64>,
        float: fn(f64, f64) -> f64,
    },
    Comparison {
        test: fn(Ordering) -> bool,
        // result when the operands are unordered (NaN)
        unordered: bool,
    },
    Logical(Logic),
}

fn classify(op: BinaryOp) -> Operator {
    match op {
        BinaryOp::Add => Operator::Arithmetic {
            checked: i64::checked_add,
            float: |a, b| a + b,
        },
        BinaryOp::Subtract => Operator::Arithmetic {
            checked: i64::checked_sub,
            float: |a, b| a - b,
        },
        BinaryOp::Multiply => Operator::Arithmetic {
            checked: i64::checked_mul,
            float: |a, b| a * b,
        },
        BinaryOp::Divide => Operator::Arithmetic {
            checked: i64::checked_div,
            float: |a, b| a / b,
        },
        BinaryOp::Modulo => Operator::Arithmetic {
            checked: i64::checked_rem,
            float: |a, b| a % b,
        },
        BinaryOp::Equal => Operator::Comparison {
            test: Ordering::is_eq,
            unordered: false,
        },
        BinaryOp::NotEqual => Operator::Comparison {
            test: Ordering::is_ne,
            unordered: true,
        },
        BinaryOp::LessThan => Operator::Comparison {
            test: Ordering::is_lt,
            unordered: false,
        },
        BinaryOp::LessThanOrEqual => Operator::Comparison {
            test: Ordering::is_le,
            unordered: false,
        },
        BinaryOp::GreaterThan => Operator::Comparison {
            test: Ordering::is_gt,
            unordered: false,
        },
        BinaryOp::GreaterThanOrEqual => Operator::Comparison {
            test: Ordering::is_ge,
            unordered: false,
        },
        BinaryOp::AndAlso => Operator::Logical(Logic::AndAlso),
        BinaryOp::OrElse => Operator::Logical(Logic::OrElse),
        BinaryOp::And => Operator::Logical(Logic::And),
        BinaryOp::Or => Operator::Logical(Logic::Or),
        BinaryOp::ExclusiveOr => Operator::Logical(Logic::Xor),
    }
}

/// An executable predicate produced by [`Lambda::compile`]
pub struct CompiledPredicate<T> {
    parameter: Parameter,
    eval: Eval<T, bool>,
}

impl<T> CompiledPredicate<T> {
    /// Run the predicate against a candidate
    pub fn evaluate(&self, candidate: &T) -> SpecificationResult<bool> {
        (self.eval)(candidate)
    }

    /// Placeholder the predicate was compiled for
    pub fn parameter(&self) -> &Parameter {
        &self.parameter
    }
}

impl<T> fmt::Debug for CompiledPredicate<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompiledPredicate")
            .field("parameter", &self.parameter)
            .finish_non_exhaustive()
    }
}

impl<T: 'static> Lambda<T> {
    /// Type-check the tree and realise it as a callable predicate
    pub fn compile(&self) -> SpecificationResult<CompiledPredicate<T>> {
        trace!(parameter = %self.parameter(), "compiling predicate");

        let compiler = Compiler {
            bound: self.parameter(),
        };
        match compiler.compile(self.body())? {
            Compiled::Bool(eval) => Ok(CompiledPredicate {
                parameter: self.parameter().clone(),
                eval,
            }),
            Compiled::Candidate => Err(compiler.parameter_as_value()),
            other => Err(CompileError::NonBooleanBody {
                found: other.describe().to_string(),
            }
            .into()),
        }
    }
}

struct Compiler<'a> {
    bound: &'a Parameter,
}

impl Compiler<'_> {
    fn compile<T: 'static>(&self, expr: &Expr<T>) -> SpecificationResult<Compiled<T>> {
        match expr {
            Expr::Parameter(parameter) => self.parameter(parameter),
            Expr::Constant(value) => Ok(constant(value.clone())),
            Expr::Member { object, member } => self.member(object, member),
            Expr::Call {
                function,
                arguments,
            } => self.call(*function, arguments),
            Expr::Unary { op, operand } => self.unary(*op, operand),
            Expr::Binary { op, left, right } => self.binary(*op, left, right),
        }
    }

    fn parameter<T>(&self, parameter: &Parameter) -> SpecificationResult<Compiled<T>> {
        if parameter == self.bound {
            Ok(Compiled::Candidate)
        } else {
            Err(CompileError::UnboundParameter {
                name: parameter.name().to_string(),
                expected: self.bound.name().to_string(),
            }
            .into())
        }
    }

    fn member<T: 'static>(
        &self,
        object: &Expr<T>,
        member: &Member<T>,
    ) -> SpecificationResult<Compiled<T>> {
        match self.compile(object)? {
            Compiled::Candidate => Ok(access(member.accessor().clone())),
            other => Err(self.reject(&format!(".{}", member.name()), &[&other])),
        }
    }

    fn call<T: 'static>(
        &self,
        function: Function,
        arguments: &[Expr<T>],
    ) -> SpecificationResult<Compiled<T>> {
        if arguments.len() != function.arity() {
            return Err(CompileError::ArityMismatch {
                function: function.name(),
                expected: function.arity(),
                found: arguments.len(),
            }
            .into());
        }

        let mut compiled = arguments
            .iter()
            .map(|argument| self.compile(argument))
            .collect::<SpecificationResult<Vec<_>>>()?;

        match (function, compiled.pop()) {
            (Function::Today, None) => Ok(Compiled::Date(boxed(|_: &T| {
                Ok(Local::now().date_naive())
            }))),
            (Function::Year, Some(Compiled::Date(date))) => {
                Ok(Compiled::Int(boxed(move |candidate: &T| {
                    Ok(i64::from(date(candidate)?.year()))
                })))
            }
            (Function::Length, Some(Compiled::Str(text))) => {
                Ok(Compiled::Int(boxed(move |candidate: &T| {
                    let count = text(candidate)?.chars().count();
                    Ok(i64::try_from(count).unwrap_or(i64::MAX))
                })))
            }
            (function, argument) => {
                let found: Vec<&Compiled<T>> = argument.iter().collect();
                Err(self.reject(function.name(), &found))
            }
        }
    }

    fn unary<T: 'static>(&self, op: UnaryOp, operand: &Expr<T>) -> SpecificationResult<Compiled<T>> {
        match (op, self.compile(operand)?) {
            (UnaryOp::Not, Compiled::Bool(inner)) => {
                Ok(Compiled::Bool(boxed(move |candidate: &T| {
                    Ok(!inner(candidate)?)
                })))
            }
            (UnaryOp::Negate, Compiled::Int(inner)) => {
                Ok(Compiled::Int(boxed(move |candidate: &T| {
                    inner(candidate)?
                        .checked_neg()
                        .ok_or(SpecificationError::ArithmeticOverflow { operator: "-" })
                })))
            }
            (UnaryOp::Negate, Compiled::Float(inner)) => {
                Ok(Compiled::Float(boxed(move |candidate: &T| {
                    Ok(-inner(candidate)?)
                })))
            }
            (op, other) => Err(self.reject(op.symbol(), &[&other])),
        }
    }

    fn binary<T: 'static>(
        &self,
        op: BinaryOp,
        left: &Expr<T>,
        right: &Expr<T>,
    ) -> SpecificationResult<Compiled<T>> {
        let left = self.compile(left)?;
        let right = self.compile(right)?;

        match (classify(op), left, right) {
            (Operator::Logical(logic), Compiled::Bool(l), Compiled::Bool(r)) => {
                Ok(Compiled::Bool(logical(logic, l, r)))
            }
            (Operator::Comparison { test, unordered }, left, right) => match (left, right) {
                (Compiled::Bool(l), Compiled::Bool(r)) => {
                    Ok(Compiled::Bool(comparison(test, unordered, l, r)))
                }
                (Compiled::Int(l), Compiled::Int(r)) => {
                    Ok(Compiled::Bool(comparison(test, unordered, l, r)))
                }
                (Compiled::Float(l), Compiled::Float(r)) => {
                    Ok(Compiled::Bool(comparison(test, unordered, l, r)))
                }
                (Compiled::Str(l), Compiled::Str(r)) => {
                    Ok(Compiled::Bool(comparison(test, unordered, l, r)))
                }
                (Compiled::Date(l), Compiled::Date(r)) => {
                    Ok(Compiled::Bool(comparison(test, unordered, l, r)))
                }
                (left, right) => Err(self.reject(op.symbol(), &[&left, &right])),
            },
            (Operator::Arithmetic { checked, .. }, Compiled::Int(l), Compiled::Int(r)) => {
                Ok(Compiled::Int(boxed(move |candidate: &T| {
                    let a = l(candidate)?;
                    let b = r(candidate)?;
                    if b == 0 && matches!(op, BinaryOp::Divide | BinaryOp::Modulo) {
                        return Err(SpecificationError::DivisionByZero);
                    }
                    checked(a, b).ok_or(SpecificationError::ArithmeticOverflow {
                        operator: op.symbol(),
                    })
                })))
            }
            (Operator::Arithmetic { float, .. }, Compiled::Float(l), Compiled::Float(r)) => {
                Ok(Compiled::Float(boxed(move |candidate: &T| {
                    Ok(float(l(candidate)?, r(candidate)?))
                })))
            }
            (_, left, right) => Err(self.reject(op.symbol(), &[&left, &right])),
        }
    }

    fn reject<T>(&self, operator: &str, operands: &[&Compiled<T>]) -> SpecificationError {
        if operands
            .iter()
            .any(|operand| matches!(operand, Compiled::Candidate))
        {
            return self.parameter_as_value();
        }

        let found = operands
            .iter()
            .map(|operand| operand.describe())
            .collect::<Vec<_>>()
            .join(", ");
        CompileError::TypeMismatch {
            operator: operator.to_string(),
            found: if found.is_empty() {
                "no operand".to_string()
            } else {
                found
            },
        }
        .into()
    }

    fn parameter_as_value(&self) -> SpecificationError {
        CompileError::ParameterAsValue {
            name: self.bound.name().to_string(),
        }
        .into()
    }
}

fn boxed<T, X, F>(eval: F) -> Eval<T, X>
where
    F: Fn(&T) -> SpecificationResult<X> + Send + Sync + 'static,
{
    Box::new(eval)
}

fn constant<T: 'static>(value: Value) -> Compiled<T> {
    match value {
        Value::Bool(v) => Compiled::Bool(boxed(move |_: &T| Ok(v))),
        Value::Int(v) => Compiled::Int(boxed(move |_: &T| Ok(v))),
        Value::Float(v) => Compiled::Float(boxed(move |_: &T| Ok(v))),
        Value::Str(v) => Compiled::Str(boxed(move |_: &T| Ok(v.clone()))),
        Value::Date(v) => Compiled::Date(boxed(move |_: &T| Ok(v))),
    }
}

fn access<T: 'static>(accessor: Accessor<T>) -> Compiled<T> {
    match accessor {
        Accessor::Bool(get) => Compiled::Bool(boxed(move |candidate: &T| Ok(get(candidate)))),
        Accessor::Int(get) => Compiled::Int(boxed(move |candidate: &T| Ok(get(candidate)))),
        Accessor::Float(get) => {
            Compiled::Float(boxed(move |candidate: &T| Ok(get(candidate))))
        }
        Accessor::Str(get) => Compiled::Str(boxed(move |candidate: &T| Ok(get(candidate)))),
        Accessor::Date(get) => Compiled::Date(boxed(move |candidate: &T| Ok(get(candidate)))),
    }
}

fn comparison<T, X>(
    test: fn(Ordering) -> bool,
    unordered: bool,
    left: Eval<T, X>,
    right: Eval<T, X>,
) -> Eval<T, bool>
where
    T: 'static,
    X: PartialOrd + 'static,
{
    boxed(move |candidate: &T| {
        let a = left(candidate)?;
        let b = right(candidate)?;
        Ok(a.partial_cmp(&b).map_or(unordered, test))
    })
}

fn logical<T: 'static>(logic: Logic, left: Eval<T, bool>, right: Eval<T, bool>) -> Eval<T, bool> {
    match logic {
        Logic::AndAlso => boxed(move |candidate: &T| Ok(left(candidate)? && right(candidate)?)),
        Logic::OrElse => boxed(move |candidate: &T| Ok(left(candidate)? || right(candidate)?)),
        Logic::And => boxed(move |candidate: &T| {
            let a = left(candidate)?;
            let b = right(candidate)?;
            Ok(a & b)
        }),
        Logic::Or => boxed(move |candidate: &T| {
            let a = left(candidate)?;
            let b = right(candidate)?;
            Ok(a | b)
        }),
        Logic::Xor => boxed(move |candidate: &T| {
            let a = left(candidate)?;
            let b = right(candidate)?;
            Ok(a ^ b)
        }),
    }
}
