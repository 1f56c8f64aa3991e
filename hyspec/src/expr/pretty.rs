//! RcDoc-based pretty-printer with termcolor annotations for predicate trees.
//!
//! Role
//! - Convert an [`Expr`] or a [`Lambda`] into an annotated document suitable for width-aware
//!   rendering.
//! - Provide colored output for terminals (TTY-aware) and plain strings for logs, error messages
//!   and tests. `Display` on trees and lambdas goes through the plain renderer at width 80.
//!
//! Output is a diagnostic rendition, not a parseable syntax: a lambda prints as `x => body`,
//! member calls as `target.name(args, modifier)`, static calls as `name(args)`.
//!
//! Performance
//! - Building the doc is O(n) in expression size; rendering respects line widths with
//!   linear-time layout in the size of the resulting document.
use std::{
    fmt,
    io::{self, Write},
};

use pretty::{FmtWrite, RcDoc, RenderAnnotated};
use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

use crate::{
    expr::{BinaryOp, Expr, ExprNode, Lambda, Parameter, UnaryOp},
    value::Value,
};

/// Styles used to annotate parts of the pretty-printed document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Style {
    Punct, // commas, periods, arrows
    /// Parentheses are colored by nesting depth so matching pairs share a color.
    Paren(u8),
    Keyword,  // true, false, is, comparison modifiers
    Operator, // &&, ||, ^, ==, <, +
    Ident,    // parameters
    Method,   // call names
    Literal,  // constants
    Type,     // type names in type tests
}

impl Style {
    fn to_color_spec(self) -> ColorSpec {
        let mut s = ColorSpec::new();
        match self {
            Style::Punct => {
                s.set_dimmed(true);
            }
            Style::Paren(depth) => {
                let fg = match depth % 6 {
                    0 => Color::Blue,
                    1 => Color::Green,
                    2 => Color::White,
                    3 => Color::Yellow,
                    4 => Color::Red,
                    _ => Color::Magenta,
                };
                s.set_fg(Some(fg)).set_dimmed(true);
            }
            Style::Keyword => {
                s.set_fg(Some(Color::Cyan)).set_bold(true);
            }
            Style::Operator => {
                s.set_fg(Some(Color::Yellow)).set_bold(true);
            }
            Style::Ident => {
                s.set_fg(Some(Color::Green)).set_bold(true);
            }
            Style::Method => {
                s.set_fg(Some(Color::Blue));
            }
            Style::Literal => {
                s.set_fg(Some(Color::Red));
            }
            Style::Type => {
                s.set_fg(Some(Color::Magenta));
            }
        }
        s
    }
}

/// Rendering options for [`PrettyExpr::pretty_print_with`].
#[derive(Debug, Clone, Copy)]
pub struct PrettyConfig {
    /// Target line width.
    pub width: usize,
    pub color: ColorChoice,
}

impl Default for PrettyConfig {
    /// Terminal width (80 when it cannot be determined) and TTY-aware coloring.
    fn default() -> Self {
        Self {
            width: terminal_width(),
            color: ColorChoice::Auto,
        }
    }
}

fn styled(style: Style, s: impl ToString) -> RcDoc<'static, Style> {
    RcDoc::as_string(s.to_string()).annotate(style)
}

fn punct(s: &'static str) -> RcDoc<'static, Style> {
    styled(Style::Punct, s)
}

#[inline]
fn lparen(depth: u8) -> RcDoc<'static, Style> {
    RcDoc::as_string("(").annotate(Style::Paren(depth))
}

#[inline]
fn rparen(depth: u8) -> RcDoc<'static, Style> {
    RcDoc::as_string(")").annotate(Style::Paren(depth))
}

fn kw(s: impl ToString) -> RcDoc<'static, Style> {
    styled(Style::Keyword, s)
}

fn op(s: &'static str) -> RcDoc<'static, Style> {
    styled(Style::Operator, s)
}

fn ident(p: &Parameter) -> RcDoc<'static, Style> {
    styled(Style::Ident, p.name())
}

fn literal(v: &Value) -> RcDoc<'static, Style> {
    match v {
        Value::Bool(b) => kw(b),
        other => styled(Style::Literal, other),
    }
}

/// Binding strength of a node; higher binds tighter.
fn calculate_precedence(e: &Expr) -> u8 {
    match e.node() {
        ExprNode::Lambda { .. } => 1,
        ExprNode::Binary { op, .. } => match op {
            BinaryOp::OrElse => 2,
            BinaryOp::Xor => 3,
            BinaryOp::AndAlso => 4,
            BinaryOp::Equal | BinaryOp::NotEqual => 5,
            BinaryOp::LessThan
            | BinaryOp::LessThanOrEqual
            | BinaryOp::GreaterThan
            | BinaryOp::GreaterThanOrEqual => 6,
            BinaryOp::Add | BinaryOp::Subtract => 8,
            BinaryOp::Multiply | BinaryOp::Divide | BinaryOp::Modulo => 9,
        },
        ExprNode::TypeIs { .. } => 7,
        ExprNode::Unary { .. } => 10,
        ExprNode::Call { .. } => 11,
        ExprNode::Constant(_) | ExprNode::Parameter(_) => 255,
    }
}

#[inline]
fn binary_op(e: &Expr) -> Option<BinaryOp> {
    match e.node() {
        ExprNode::Binary { op, .. } => Some(*op),
        _ => None,
    }
}

#[inline]
fn requires_parens(current: &Expr, parent: &Expr) -> bool {
    let current_prec = calculate_precedence(current);
    let parent_prec = calculate_precedence(parent);
    if parent_prec != current_prec {
        return parent_prec > current_prec;
    }

    // Chains of the same associative operator print flat.
    let allow_self_chain = matches!(
        binary_op(current),
        Some(BinaryOp::AndAlso | BinaryOp::OrElse | BinaryOp::Xor | BinaryOp::Add | BinaryOp::Multiply)
    );
    !(allow_self_chain && binary_op(current) == binary_op(parent))
}

#[inline]
fn to_doc_parenthesized_with_depth(e: &Expr, parent: &Expr, depth: u8) -> RcDoc<'static, Style> {
    if requires_parens(e, parent) {
        lparen(depth)
            .append(to_doc_with_depth(e, depth + 1))
            .append(rparen(depth))
            .group()
    } else {
        to_doc_with_depth(e, depth)
    }
}

fn lambda_doc(parameter: &Parameter, body: &Expr, depth: u8) -> RcDoc<'static, Style> {
    ident(parameter)
        .append(RcDoc::space())
        .append(punct("=>"))
        .append(RcDoc::space())
        .append(to_doc_with_depth(body, depth))
        .group()
}

/// Depth-aware variant that colors parentheses by nesting level.
fn to_doc_with_depth(e: &Expr, depth: u8) -> RcDoc<'static, Style> {
    match e.node() {
        ExprNode::Constant(v) => literal(v),
        ExprNode::Parameter(p) => ident(p),
        ExprNode::Unary { op: unary, operand } => {
            let symbol = match unary {
                UnaryOp::Not => "!",
                UnaryOp::Negate => "-",
            };
            op(symbol)
                .append(to_doc_parenthesized_with_depth(operand, e, depth))
                .group()
        }
        ExprNode::Binary { op: binary, lhs, rhs } => {
            // Connectives may break before the operator; comparisons and arithmetic stay inline.
            let separator = if binary.is_logical() {
                RcDoc::line()
            } else {
                RcDoc::space()
            };
            to_doc_parenthesized_with_depth(lhs, e, depth)
                .append(separator)
                .append(op(binary.symbol()))
                .append(RcDoc::space())
                .append(to_doc_parenthesized_with_depth(rhs, e, depth))
                .group()
        }
        ExprNode::Call {
            target,
            method,
            args,
        } => {
            let head = match target {
                Some(target) => to_doc_parenthesized_with_depth(target, e, depth)
                    .append(punct("."))
                    .append(styled(Style::Method, method.name())),
                None => styled(Style::Method, method.name()),
            };

            let mut items: Vec<RcDoc<'static, Style>> = args
                .iter()
                .map(|arg| to_doc_with_depth(arg, depth + 1))
                .collect();
            if let Some(modifier) = method.modifier() {
                items.push(kw(modifier));
            }

            head.append(lparen(depth))
                .append(
                    RcDoc::intersperse(items, punct(",").append(RcDoc::line()))
                        .nest(2)
                        .group(),
                )
                .append(rparen(depth))
                .group()
        }
        ExprNode::TypeIs { operand, dtype } => to_doc_parenthesized_with_depth(operand, e, depth)
            .append(RcDoc::space())
            .append(kw("is"))
            .append(RcDoc::space())
            .append(styled(Style::Type, dtype))
            .group(),
        ExprNode::Lambda { parameter, body } => lambda_doc(parameter, body, depth),
    }
}

// A writer that maps Style annotations to termcolor ColorSpec on a WriteColor sink.
struct ColorWriter<'w, W: WriteColor + Write> {
    out: &'w mut W,
}

impl<'a, W: WriteColor + Write> RenderAnnotated<'a, Style> for ColorWriter<'_, W> {
    fn push_annotation(&mut self, ann: &'a Style) -> io::Result<()> {
        self.out.set_color(&ann.to_color_spec())
    }
    fn pop_annotation(&mut self) -> io::Result<()> {
        self.out.reset()
    }
}

impl<W: WriteColor + Write> pretty::Render for ColorWriter<'_, W> {
    type Error = io::Error;
    fn write_str(&mut self, s: &str) -> io::Result<usize> {
        self.out.write_all(s.as_bytes())?;
        Ok(s.len())
    }
    fn write_str_all(&mut self, s: &str) -> io::Result<()> {
        self.out.write_all(s.as_bytes())
    }
    fn fail_doc(&self) -> Self::Error {
        io::Error::other("render failed")
    }
}

/// Render a document to a `termcolor::WriteColor` with width-aware layout.
fn render_to<W: WriteColor + Write>(
    doc: &RcDoc<'_, Style>,
    width: usize,
    out: &mut W,
) -> io::Result<()> {
    let mut cw = ColorWriter { out };
    doc.render_raw(width, &mut cw)
}

/// Retrieve the width of the terminal, or 80 if it cannot be determined.
fn terminal_width() -> usize {
    term_size::dimensions().map(|(w, _)| w).unwrap_or(80)
}

/// Pretty-printing conveniences for predicate trees.
pub trait PrettyExpr {
    /// Build an RcDoc representation with style annotations.
    fn pretty_doc(&self) -> RcDoc<'static, Style>;

    /// Render with colors to any termcolor writer at the given width.
    fn pretty_render_to<W: WriteColor + Write>(&self, width: usize, out: &mut W) -> io::Result<()> {
        render_to(&self.pretty_doc(), width, out)
    }

    /// Print to stdout with the given options, followed by a newline.
    fn pretty_print_with(&self, config: &PrettyConfig) -> io::Result<()> {
        let stdout = StandardStream::stdout(config.color);
        let mut stdout = stdout.lock();
        self.pretty_render_to(config.width, &mut stdout)?;
        stdout.reset()?;
        writeln!(stdout)
    }

    /// Print to stdout with colors (TTY-aware), at auto-detected width (or 80 if not a TTY).
    fn pretty_print(&self) -> io::Result<()> {
        self.pretty_print_with(&PrettyConfig::default())
    }

    /// Format into a plain string (no colors) at the given width.
    fn pretty_string_width(&self, width: usize) -> String {
        let mut buf = String::new();
        let _ = self.pretty_doc().render_fmt(width, &mut buf);
        buf
    }

    /// Format into a plain string (no colors).
    fn pretty_string(&self) -> String {
        self.pretty_string_width(80)
    }
}

impl PrettyExpr for Expr {
    #[inline]
    fn pretty_doc(&self) -> RcDoc<'static, Style> {
        to_doc_with_depth(self, 0)
    }
}

impl<A, R> PrettyExpr for Lambda<A, R> {
    #[inline]
    fn pretty_doc(&self) -> RcDoc<'static, Style> {
        lambda_doc(self.parameter(), self.body(), 0)
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut w = FmtWrite::new(f);
        self.pretty_doc().render_raw(80, &mut w)
    }
}

impl<A, R> fmt::Display for Lambda<A, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut w = FmtWrite::new(f);
        self.pretty_doc().render_raw(80, &mut w)
    }
}
