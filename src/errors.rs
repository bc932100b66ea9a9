// Copyright 2025 Cowboy AI, LLC.

//! Error types for specification operations

use thiserror::Error;

/// Errors that can occur while combining, compiling, evaluating or
/// constructing specifications
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SpecificationError {
    /// The specification carries no expression tree
    #[error("Expression tree not provided")]
    MissingExpression,

    /// A combinator received an absent operand
    #[error("Invalid argument: `{argument}` must not be absent")]
    InvalidArgument {
        /// Name of the rejected argument
        argument: &'static str,
    },

    /// Building the singleton instance of a named specification failed
    #[error("Failed to construct specification {variant}: {source}")]
    ConstructionFailure {
        /// Name of the variant being constructed
        variant: &'static str,
        /// Error reported by the variant's constructor
        #[source]
        source: Box<SpecificationError>,
    },

    /// The expression tree is malformed and cannot be compiled
    #[error(transparent)]
    Compile(#[from] CompileError),

    /// Integer division or remainder by zero during evaluation
    #[error("Division by zero")]
    DivisionByZero,

    /// Integer arithmetic overflowed during evaluation
    #[error("Arithmetic overflow in `{operator}`")]
    ArithmeticOverflow {
        /// Symbol of the overflowing operator
        operator: &'static str,
    },

    /// Generic internal error
    #[error("Internal error: {0}")]
    InternalError(String),
}

/// Reasons an expression tree fails to compile
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompileError {
    /// A placeholder other than the lambda's own parameter was referenced
    #[error("Unbound parameter `{name}` (expected `{expected}`)")]
    UnboundParameter {
        /// Display name of the stray placeholder
        name: String,
        /// Display name of the lambda's parameter
        expected: String,
    },

    /// The candidate itself was used where a value is required
    #[error("Parameter `{name}` can only be used through member access")]
    ParameterAsValue {
        /// Display name of the placeholder
        name: String,
    },

    /// Operand kinds do not fit the operator
    #[error("Type mismatch in `{operator}`: {found}")]
    TypeMismatch {
        /// Operator or function being compiled
        operator: String,
        /// Kinds that were found
        found: String,
    },

    /// Wrong number of arguments passed to a built-in function
    #[error("Function `{function}` expects {expected} argument(s), found {found}")]
    ArityMismatch {
        /// Function name
        function: &'static str,
        /// Declared arity
        expected: usize,
        /// Supplied arguments
        found: usize,
    },

    /// The lambda body does not produce a boolean
    #[error("Predicate body must be boolean, found {found}")]
    NonBooleanBody {
        /// Kind produced by the body
        found: String,
    },
}

/// Result type for specification operations
pub type SpecificationResult<T> = Result<T, SpecificationError>;

impl SpecificationError {
    /// Create an invalid argument error
    pub fn invalid_argument(argument: &'static str) -> Self {
        SpecificationError::InvalidArgument { argument }
    }

    /// Check if this is a missing expression error
    pub fn is_missing_expression(&self) -> bool {
        matches!(self, SpecificationError::MissingExpression)
    }

    /// Check if this is an invalid argument error
    pub fn is_invalid_argument(&self) -> bool {
        matches!(self, SpecificationError::InvalidArgument { .. })
    }

    /// Check if this is a registry construction failure
    pub fn is_construction_failure(&self) -> bool {
        matches!(self, SpecificationError::ConstructionFailure { .. })
    }

    /// Check if this error was raised while evaluating a compiled predicate
    pub fn is_evaluation_error(&self) -> bool {
        matches!(
            self,
            SpecificationError::DivisionByZero | SpecificationError::ArithmeticOverflow { .. }
        )
    }
}
