//! # CIM Specification
//!
//! Composable business rules built on the Specification pattern.
//!
//! A rule is an expression tree over a domain type, so it can be inspected,
//! printed and combined before it is ever evaluated:
//! - **Expression**: Typed trees with a single free placeholder, built from
//!   member accessors, literals, operators and a few functions
//! - **Specification**: An immutable rule holding one tree, with short-circuit
//!   and eager combinators that merge trees under a shared placeholder
//! - **Registry**: Named rule types built once on first use and shared across
//!   threads
//!
//! ## Example
//!
//! ```rust
//! use cim_specification::{expression::Member, not, Specification};
//!
//! struct Customer { name: String, age: i64 }
//!
//! let name = Member::string("name", |c: &Customer| c.name.clone());
//! let age = Member::integer("age", |c: &Customer| c.age);
//!
//! let named = Specification::from_fn("c", |c| c.member(name).length().gt(0));
//! let adult = Specification::from_fn("c", |c| c.member(age).ge(21));
//! let eligible = named.and_also(&adult)?.or(&not(&adult)?)?;
//!
//! let customer = Customer { name: "Ada".into(), age: 36 };
//! assert!(eligible.is_satisfied(&customer)?);
//! # Ok::<(), cim_specification::SpecificationError>(())
//! ```
//!
//! ## Design Principles
//!
//! 1. **Immutability**: Combining never modifies an operand
//! 2. **Inspectability**: Every rule renders as the tree it evaluates
//! 3. **Fallibility**: Malformed trees and arithmetic faults surface as errors,
//!    never as panics

#![warn(missing_docs)]

mod errors;
mod identifiers;
mod registry;
mod specification;

pub mod expression;

pub use errors::{CompileError, SpecificationError, SpecificationResult};
pub use expression::{
    BinaryOp, CompiledPredicate, Expr, Function, Lambda, Member, Parameter, UnaryOp, Value,
    ValueKind,
};
pub use identifiers::ParameterId;
pub use registry::{spec, NamedSpecification, SpecificationRegistry};
pub use specification::{not, IntoOperand, Operand, Specification};
