//! Traversal and rewriting of predicate trees.
//!
//! - [`walk`]: iterative pre-order traversal with an explicit stack; the visitor decides whether
//!   the children of each node are explored.
//! - [`rewrite`]: bottom-up reconstruction driven by a [`Rewriter`]. Nodes whose children come
//!   back unchanged are returned as-is (same allocation), so untouched subtrees stay shared with
//!   the input.
//! - [`substitute`]: the single substitution primitive used by every composite specification.
//!   It matches its target by node identity ([`Expr::same`]), never by structure, so two
//!   look-alike parameters coming from different trees are never unified by accident.
//!
//! Example
//! ```
//! use hyspec::expr::{Expr, Parameter};
//! use hyspec::walker::{free_parameters, substitute};
//!
//! let x = Parameter::of::<i32>("x");
//! let y = Parameter::of::<i32>("x");
//! let body = y.to_expr().gt(Expr::constant(0));
//! let rebound = substitute(&body, &y.to_expr(), &x.to_expr());
//! assert_eq!(free_parameters(&rebound), vec![x]);
//! ```
use log::trace;
use smallvec::SmallVec;

use crate::expr::{Expr, ExprNode, Parameter};

/// Visit `root` and its descendants in pre-order.
///
/// `visit` returns whether the children of the visited node should be explored.
pub fn walk(root: &Expr, mut visit: impl FnMut(&Expr) -> bool) {
    let mut stack: SmallVec<&Expr, 16> = SmallVec::new();
    stack.push(root);

    while let Some(node) = stack.pop() {
        if visit(node) {
            // Reverse so that the leftmost child is popped first.
            stack.extend(node.children().into_iter().rev());
        }
    }
}

/// Number of nodes in the tree.
pub fn node_count(root: &Expr) -> usize {
    let mut count = 0;
    walk(root, |_| {
        count += 1;
        true
    });
    count
}

/// Distinct parameters referenced by `root` that are not bound by a nested lambda, in order of
/// first appearance.
pub fn free_parameters(root: &Expr) -> Vec<Parameter> {
    fn collect(expr: &Expr, bound: &mut Vec<Parameter>, out: &mut Vec<Parameter>) {
        match expr.node() {
            ExprNode::Parameter(p) => {
                if !bound.contains(p) && !out.contains(p) {
                    out.push(p.clone());
                }
            }
            ExprNode::Lambda { parameter, body } => {
                bound.push(parameter.clone());
                collect(body, bound, out);
                bound.pop();
            }
            _ => {
                for child in expr.children() {
                    collect(child, bound, out);
                }
            }
        }
    }

    let mut out = Vec::new();
    collect(root, &mut Vec::new(), &mut out);
    out
}

/// Every distinct parameter appearing in `root`, bound or free, in order of first appearance.
pub fn parameters(root: &Expr) -> Vec<Parameter> {
    let mut out: Vec<Parameter> = Vec::new();
    walk(root, |node| {
        let found = match node.node() {
            ExprNode::Parameter(p) => Some(p),
            ExprNode::Lambda { parameter, .. } => Some(parameter),
            _ => None,
        };
        if let Some(p) = found {
            if !out.contains(p) {
                out.push(p.clone());
            }
        }
        true
    });
    out
}

/// Node-level rewrite rule applied by [`rewrite`].
pub trait Rewriter {
    /// Replacement for `expr`, or `None` to keep the node and descend into its children.
    fn rewrite_node(&mut self, expr: &Expr) -> Option<Expr>;

    /// Whether rewriting should descend into a nested lambda binding `parameter`.
    fn enter_lambda(&mut self, _parameter: &Parameter) -> bool {
        true
    }
}

/// Rebuild `expr` bottom-up, applying `rewriter` at every node.
pub fn rewrite<R: Rewriter + ?Sized>(expr: &Expr, rewriter: &mut R) -> Expr {
    if let Some(replacement) = rewriter.rewrite_node(expr) {
        return replacement;
    }

    match expr.node() {
        ExprNode::Constant(_) | ExprNode::Parameter(_) => expr.clone(),
        ExprNode::Unary { op, operand } => {
            let new_operand = rewrite(operand, rewriter);
            if new_operand.ptr_eq(operand) {
                expr.clone()
            } else {
                Expr::unary(*op, new_operand)
            }
        }
        ExprNode::Binary { op, lhs, rhs } => {
            let new_lhs = rewrite(lhs, rewriter);
            let new_rhs = rewrite(rhs, rewriter);
            if new_lhs.ptr_eq(lhs) && new_rhs.ptr_eq(rhs) {
                expr.clone()
            } else {
                Expr::binary(*op, new_lhs, new_rhs)
            }
        }
        ExprNode::Call {
            target,
            method,
            args,
        } => {
            let new_target = target.as_ref().map(|t| rewrite(t, rewriter));
            let new_args: SmallVec<Expr, 2> =
                args.iter().map(|a| rewrite(a, rewriter)).collect();

            let target_unchanged = match (target, &new_target) {
                (Some(old), Some(new)) => old.ptr_eq(new),
                _ => true,
            };
            let args_unchanged = args.iter().zip(new_args.iter()).all(|(a, b)| a.ptr_eq(b));

            if target_unchanged && args_unchanged {
                expr.clone()
            } else {
                Expr::call(new_target, method.clone(), new_args)
            }
        }
        ExprNode::TypeIs { operand, dtype } => {
            let new_operand = rewrite(operand, rewriter);
            if new_operand.ptr_eq(operand) {
                expr.clone()
            } else {
                new_operand.type_is(dtype.clone())
            }
        }
        ExprNode::Lambda { parameter, body } => {
            if !rewriter.enter_lambda(parameter) {
                return expr.clone();
            }

            let new_body = rewrite(body, rewriter);
            if new_body.ptr_eq(body) {
                expr.clone()
            } else {
                Expr::lambda(parameter.clone(), new_body)
            }
        }
    }
}

/// Identity-based replacement of one node.
struct Substitution<'a> {
    target: &'a Expr,
    replacement: &'a Expr,
}

impl Rewriter for Substitution<'_> {
    fn rewrite_node(&mut self, expr: &Expr) -> Option<Expr> {
        expr.same(self.target).then(|| self.replacement.clone())
    }

    fn enter_lambda(&mut self, parameter: &Parameter) -> bool {
        // A lambda rebinding the target parameter shadows it.
        self.target
            .as_parameter()
            .is_none_or(|target| target != parameter)
    }
}

/// Replace every occurrence of `target` in `tree` by `replacement`.
///
/// Occurrences are matched by identity (see [`Expr::same`]); the rest of the tree is kept
/// structurally identical and shared with the input.
pub fn substitute(tree: &Expr, target: &Expr, replacement: &Expr) -> Expr {
    trace!(
        "substituting {:?} node in a {}-node tree",
        target.kind(),
        node_count(tree)
    );
    rewrite(
        tree,
        &mut Substitution {
            target,
            replacement,
        },
    )
}
