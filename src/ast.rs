//! Syntax tree shared by the parser, the resolver and the interpreter.
//!
//! Every node type is generic over `S`, the payload stored in the *resolution
//! slot* of variable, assignment, `this` and `super` nodes:
//!
//! * the parser produces `Stmt<Unresolved>` (empty slots);
//! * the resolver maps that tree into `Stmt<Resolution>`;
//! * the interpreter only accepts `Stmt<Resolution>`.
//!
//! Running a tree whose references were never resolved is therefore a type
//! error rather than a runtime surprise.

use std::rc::Rc;

use crate::token::Token;

/// Slot payload of a tree that has not been through the resolver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Unresolved;

/// Where a resolved reference lives at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// Number of environment frames to walk outwards (0 = innermost).
    Local(usize),

    /// Look the name up in the global frame.
    Global,
}

/// Tree as produced by the parser.
pub type SyntaxTree = Vec<Stmt<Unresolved>>;

/// Tree as produced by the resolver.
pub type ResolvedTree = Vec<Stmt<Resolution>>;

/// A literal constant appearing directly in the source.
#[derive(Debug, Clone, PartialEq)]
pub enum LiteralValue {
    Int(i64),
    Double(f64),
    Str(Rc<str>),
    True,
    False,
    Nil,
}

/// A name reference together with its resolution slot.
#[derive(Debug, Clone, PartialEq)]
pub struct VarRef<S> {
    pub name: Token,
    pub slot: S,
}

/// One declared parameter. Only the last one may be variadic (`...rest`).
#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    pub name: Token,
    pub variadic: bool,
}

/// Function, method or lambda definition.
///
/// `params` is `None` when the parameter list was omitted, which is only legal
/// for getter methods (checked by the resolver).
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDecl<S> {
    /// Declared name, or the `fun` keyword for lambdas.
    pub name: Token,
    pub params: Option<Vec<Param>>,
    pub body: Vec<Stmt<S>>,
    pub is_lambda: bool,
}

impl<S> FunctionDecl<S> {
    /// A method declared without a parameter list.
    pub fn is_getter(&self) -> bool {
        self.params.is_none()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MethodDecl<S> {
    pub function: Rc<FunctionDecl<S>>,
    pub is_static: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClassDecl<S> {
    pub name: Token,
    pub superclass: Option<VarRef<S>>,
    pub methods: Vec<MethodDecl<S>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EnumDecl {
    pub name: Token,
    pub cases: Vec<Token>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SwitchCase<S> {
    /// The `case` keyword.
    pub keyword: Token,
    pub values: Vec<Expr<S>>,
    pub body: Vec<Stmt<S>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DefaultCase<S> {
    /// The `default` keyword.
    pub keyword: Token,
    pub body: Vec<Stmt<S>>,
}

/// Expression nodes.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr<S> {
    Literal(LiteralValue),

    /// Prefix operator: `!x`, `-x`
    Unary {
        operator: Token,
        right: Box<Expr<S>>,
    },

    /// Infix arithmetic / comparison / equality operator.
    Binary {
        left: Box<Expr<S>>,
        operator: Token,
        right: Box<Expr<S>>,
    },

    /// Short‑circuiting `and` / `or`.
    Logical {
        left: Box<Expr<S>>,
        operator: Token,
        right: Box<Expr<S>>,
    },

    Grouping(Box<Expr<S>>),

    Variable(VarRef<S>),

    Assign {
        target: VarRef<S>,
        value: Box<Expr<S>>,
    },

    Call {
        callee: Box<Expr<S>>,
        /// The closing `)` ‑ retained for error reporting.
        paren: Token,
        arguments: Vec<Expr<S>>,
    },

    /// `fun (params) { body }`
    Lambda(Rc<FunctionDecl<S>>),

    /// object.name
    Get {
        object: Box<Expr<S>>,
        name: Token,
    },

    /// object.name = value
    Set {
        object: Box<Expr<S>>,
        name: Token,
        value: Box<Expr<S>>,
    },

    This(VarRef<S>),

    /// `super.method`; the slot locates the frame binding `super`.
    Super {
        keyword: VarRef<S>,
        method: Token,
    },

    /// `[a, b, ...rest]`
    List {
        bracket: Token,
        elements: Vec<Expr<S>>,
    },

    /// `["k": v]`, `[:]`
    Dictionary {
        bracket: Token,
        entries: Vec<(Expr<S>, Expr<S>)>,
    },

    /// object[index]
    SubscriptGet {
        object: Box<Expr<S>>,
        bracket: Token,
        index: Box<Expr<S>>,
    },

    /// object[index] = value
    SubscriptSet {
        object: Box<Expr<S>>,
        bracket: Token,
        index: Box<Expr<S>>,
        value: Box<Expr<S>>,
    },

    /// `...list`, legal only as a call argument or list element.
    Splat {
        operator: Token,
        operand: Box<Expr<S>>,
    },
}

/// Statement nodes.
#[derive(Debug, Clone, PartialEq)]
pub enum Stmt<S> {
    Expression(Expr<S>),

    Print(Expr<S>),

    Var {
        name: Token,
        initializer: Option<Expr<S>>,
    },

    Block(Vec<Stmt<S>>),

    If {
        condition: Expr<S>,
        then_branch: Box<Stmt<S>>,
        else_branch: Option<Box<Stmt<S>>>,
    },

    While {
        keyword: Token,
        condition: Expr<S>,
        body: Box<Stmt<S>>,
    },

    /// Kept as its own node; executed as `{ init; while (cond) { body; increment; } }`.
    For {
        keyword: Token,
        initializer: Option<Box<Stmt<S>>>,
        condition: Option<Expr<S>>,
        increment: Option<Expr<S>>,
        body: Box<Stmt<S>>,
    },

    Function(Rc<FunctionDecl<S>>),

    Return {
        keyword: Token,
        value: Option<Expr<S>>,
    },

    Class(ClassDecl<S>),

    Enum(EnumDecl),

    Break(Token),

    Continue(Token),

    Switch {
        keyword: Token,
        subject: Expr<S>,
        cases: Vec<SwitchCase<S>>,
        default: Option<DefaultCase<S>>,
    },
}

impl<S> Expr<S> {
    /// Best-effort source line for diagnostics.
    pub fn line(&self) -> usize {
        match self {
            Expr::Literal(_) => 0,
            Expr::Unary { operator, .. } => operator.line,
            Expr::Binary { operator, .. } | Expr::Logical { operator, .. } => operator.line,
            Expr::Grouping(inner) => inner.line(),
            Expr::Variable(var) | Expr::This(var) => var.name.line,
            Expr::Assign { target, .. } => target.name.line,
            Expr::Call { paren, .. } => paren.line,
            Expr::Lambda(decl) => decl.name.line,
            Expr::Get { name, .. } | Expr::Set { name, .. } => name.line,
            Expr::Super { keyword, .. } => keyword.name.line,
            Expr::List { bracket, .. }
            | Expr::Dictionary { bracket, .. }
            | Expr::SubscriptGet { bracket, .. }
            | Expr::SubscriptSet { bracket, .. } => bracket.line,
            Expr::Splat { operator, .. } => operator.line,
        }
    }
}
