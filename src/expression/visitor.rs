// Copyright 2025 Cowboy AI, LLC.

//! Structure-preserving rewrites of expression trees
//!
//! [`ExprRewriter`] folds a tree into a new one, node by node. Each hook
//! defaults to rebuilding the node from its rewritten children, so an
//! implementation only overrides the node kinds it cares about.
//!
//! [`ParameterRebinder`] is the rewrite that makes combination possible:
//! independently authored lambdas each own a distinct placeholder, and
//! before two bodies can be joined under one lambda every reference to
//! either placeholder must point at the same one.

use super::{BinaryOp, Expr, Function, Lambda, Member, Parameter, UnaryOp, Value};
use crate::identifiers::ParameterId;

/// A fold over every node kind that rebuilds the tree
pub trait ExprRewriter<T> {
    /// Rewrite a node, dispatching on its kind
    fn rewrite(&mut self, expr: &Expr<T>) -> Expr<T> {
        walk_rewrite(self, expr)
    }

    /// Rewrite a placeholder reference
    fn rewrite_parameter(&mut self, parameter: &Parameter) -> Expr<T> {
        Expr::Parameter(parameter.clone())
    }

    /// Rewrite a literal
    fn rewrite_constant(&mut self, value: &Value) -> Expr<T> {
        Expr::Constant(value.clone())
    }

    /// Rewrite a member access
    fn rewrite_member(&mut self, object: &Expr<T>, member: &Member<T>) -> Expr<T> {
        self.rewrite(object).member(member.clone())
    }

    /// Rewrite a function call
    fn rewrite_call(&mut self, function: Function, arguments: &[Expr<T>]) -> Expr<T> {
        let arguments = arguments
            .iter()
            .map(|argument| self.rewrite(argument))
            .collect();
        Expr::call(function, arguments)
    }

    /// Rewrite a unary node
    fn rewrite_unary(&mut self, op: UnaryOp, operand: &Expr<T>) -> Expr<T> {
        Expr::unary(op, self.rewrite(operand))
    }

    /// Rewrite a binary node
    fn rewrite_binary(&mut self, op: BinaryOp, left: &Expr<T>, right: &Expr<T>) -> Expr<T> {
        let left = self.rewrite(left);
        let right = self.rewrite(right);
        Expr::binary(op, left, right)
    }
}

/// Dispatch `expr` to the matching hook of `rewriter`
pub fn walk_rewrite<T, R>(rewriter: &mut R, expr: &Expr<T>) -> Expr<T>
where
    R: ExprRewriter<T> + ?Sized,
{
    match expr {
        Expr::Parameter(parameter) => rewriter.rewrite_parameter(parameter),
        Expr::Constant(value) => rewriter.rewrite_constant(value),
        Expr::Member { object, member } => rewriter.rewrite_member(object, member),
        Expr::Call {
            function,
            arguments,
        } => rewriter.rewrite_call(*function, arguments),
        Expr::Unary { op, operand } => rewriter.rewrite_unary(*op, operand),
        Expr::Binary { op, left, right } => rewriter.rewrite_binary(*op, left, right),
    }
}

/// Replaces references to a set of source placeholders with one target
///
/// References to placeholders outside the source set are left untouched.
#[derive(Debug, Clone)]
pub struct ParameterRebinder {
    sources: Vec<ParameterId>,
    target: Parameter,
}

impl ParameterRebinder {
    /// Create a rebinder with an empty source set
    pub fn new(target: Parameter) -> Self {
        Self {
            sources: Vec::new(),
            target,
        }
    }

    /// Add `source` to the placeholders being replaced
    pub fn rebinding(mut self, source: &Parameter) -> Self {
        if !self.sources.contains(&source.id()) {
            self.sources.push(source.id());
        }
        self
    }

    /// The placeholder every source is rewritten to
    pub fn target(&self) -> &Parameter {
        &self.target
    }
}

impl<T> ExprRewriter<T> for ParameterRebinder {
    fn rewrite_parameter(&mut self, parameter: &Parameter) -> Expr<T> {
        if self.sources.contains(&parameter.id()) {
            Expr::parameter(&self.target)
        } else {
            Expr::Parameter(parameter.clone())
        }
    }
}

/// Body of `lambda` with its placeholder replaced by `target`
pub fn rebind<T>(lambda: &Lambda<T>, target: &Parameter) -> Expr<T> {
    ParameterRebinder::new(target.clone())
        .rebinding(lambda.parameter())
        .rewrite(lambda.body())
}
