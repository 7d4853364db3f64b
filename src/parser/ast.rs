//! Compiled template representation

use crate::params::Value;

/// Byte range in source text
pub type Span = std::ops::Range<usize>;

/// A node with its source location
#[derive(Debug, Clone, PartialEq)]
pub struct Spanned<T> {
    pub node: T,
    pub span: Span,
}

impl<T> Spanned<T> {
    pub fn new(node: T, span: Span) -> Self {
        Self { node, span }
    }
}

/// Binary operators, lowest precedence last
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    In,
    And,
    Or,
}

/// Helper functions callable from expressions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Builtin {
    /// `defined('name')`: whether a name is bound
    Defined,
    /// `get('name', default)`: a bound value or the default
    Get,
}

impl Builtin {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "defined" => Some(Builtin::Defined),
            "get" => Some(Builtin::Get),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Literal(Value),
    Var(String),
    Not(Box<Spanned<Expr>>),
    Neg(Box<Spanned<Expr>>),
    Binary {
        op: BinaryOp,
        left: Box<Spanned<Expr>>,
        right: Box<Spanned<Expr>>,
    },
    Call {
        function: Builtin,
        args: Vec<Spanned<Expr>>,
    },
}

/// A named argument of a `rebase` or `include` directive
#[derive(Debug, Clone, PartialEq)]
pub struct Argument {
    pub name: Spanned<String>,
    pub value: Spanned<Expr>,
}

/// Target template plus arguments, shared by `rebase` and `include`
#[derive(Debug, Clone, PartialEq)]
pub struct Directive {
    pub target: Spanned<String>,
    pub args: Vec<Argument>,
}

/// One code statement, as written on a `%` line or inside `<% %>`
#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    Rebase(Directive),
    Include(Directive),
    SetDefault {
        name: Spanned<String>,
        value: Spanned<Expr>,
    },
    If(Spanned<Expr>),
    Elif(Spanned<Expr>),
    Else,
    For {
        var: Spanned<String>,
        iterable: Spanned<Expr>,
    },
    End,
}

/// A conditional branch of an `if` block
#[derive(Debug, Clone, PartialEq)]
pub struct Branch {
    pub condition: Spanned<Expr>,
    pub body: Vec<Node>,
}

/// Template nodes in rendering order
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Literal(String),
    Substitution {
        expr: Spanned<Expr>,
        /// `{{! expr }}` bypasses escaping
        raw: bool,
    },
    Rebase(Directive),
    Include(Directive),
    SetDefault {
        name: String,
        value: Spanned<Expr>,
    },
    If {
        branches: Vec<Branch>,
        otherwise: Option<Vec<Node>>,
    },
    For {
        var: String,
        iterable: Spanned<Expr>,
        body: Vec<Node>,
    },
}

/// The compiled form of one template source
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledTemplate {
    pub nodes: Vec<Node>,
}

impl CompiledTemplate {
    /// Parent layout declared by the template's rebase directive, if any
    pub fn parent(&self) -> Option<&str> {
        self.nodes.iter().find_map(|node| match node {
            Node::Rebase(directive) => Some(directive.target.node.as_str()),
            _ => None,
        })
    }
}
