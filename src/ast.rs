use std::fmt;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    // Arithmetic
    Add,
    Sub,
    Mul,
    Div,
    Mod,

    // Comparison
    Gt,
    Lt,
    Ge,
    Le,
    Eq,
    Ne,
}

impl BinOp {
    pub fn symbol(self) -> &'static str {
        match self {
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
            BinOp::Mod => "%",
            BinOp::Gt => ">",
            BinOp::Lt => "<",
            BinOp::Ge => ">=",
            BinOp::Le => "<=",
            BinOp::Eq => "==",
            BinOp::Ne => "!=",
        }
    }
}

impl fmt::Display for BinOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// A node of the program tree. Every node owns its children outright;
/// dropping a node tears down the whole subtree below it.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    // Leaves
    Literal(i64),
    Identifier(String),

    // Expressions
    BinaryOp(BinOp, Box<Node>, Box<Node>),

    // Assignment, declaration
    Assignment(String, Box<Node>),
    Declaration(String, Option<Box<Node>>),

    // Statement chains are nested pairs: first, then the rest
    StatementSequence(Box<Node>, Box<Node>),

    // Control flow
    Conditional(Box<Node>, Box<Node>),                // cond, then
    ConditionalElse(Box<Node>, Box<Node>, Box<Node>), // cond, then, else
    WhileLoop(Box<Node>, Box<Node>),                  // cond, body
    ForHeader(Option<Box<Node>>, Option<Box<Node>>, Option<Box<Node>>), // init; cond; update
    ForLoop(Box<Node>, Box<Node>),                    // header, body
}

/// Tags of the internal nodes that carry no payload besides their
/// children, for use with [`Node::make`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Binary(BinOp),
    StatementSequence,
    Conditional,
    ConditionalElse,
    WhileLoop,
    ForHeader,
    ForLoop,
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeKind::Binary(op) => write!(f, "BinaryOp({})", op),
            NodeKind::StatementSequence => write!(f, "StatementSequence"),
            NodeKind::Conditional => write!(f, "Conditional"),
            NodeKind::ConditionalElse => write!(f, "ConditionalElse"),
            NodeKind::WhileLoop => write!(f, "WhileLoop"),
            NodeKind::ForHeader => write!(f, "ForHeader"),
            NodeKind::ForLoop => write!(f, "ForLoop"),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ShapeError {
    #[error("{kind} is missing its {slot} child")]
    MissingChild { kind: NodeKind, slot: &'static str },
    #[error("{kind} does not take a {slot} child")]
    UnexpectedChild { kind: NodeKind, slot: &'static str },
}

type Child = Option<Box<Node>>;

impl Node {
    /// Build an internal node from its tag and the generic `left`,
    /// `middle` and `right` child slots.
    ///
    /// Slot layout per kind:
    /// - `Binary`, `StatementSequence`, `WhileLoop`, `ForLoop`, `Conditional`:
    ///   left and right, no middle
    /// - `ConditionalElse`: cond in left, then in middle, else in right
    /// - `ForHeader`: init, cond, update; each may be absent
    ///
    /// Children handed to a call that fails are released.
    pub fn make(kind: NodeKind, left: Child, middle: Child, right: Child) -> Result<Node, ShapeError> {
        let required = |slot: &'static str, child: Child| {
            child.ok_or(ShapeError::MissingChild { kind, slot })
        };
        let no_middle = |middle: &Child| match middle {
            Some(_) => Err(ShapeError::UnexpectedChild { kind, slot: "middle" }),
            None => Ok(()),
        };

        match kind {
            NodeKind::Binary(op) => {
                no_middle(&middle)?;
                Ok(Node::BinaryOp(op, required("left", left)?, required("right", right)?))
            }
            NodeKind::StatementSequence => {
                no_middle(&middle)?;
                Ok(Node::StatementSequence(required("left", left)?, required("right", right)?))
            }
            NodeKind::Conditional => {
                no_middle(&middle)?;
                Ok(Node::Conditional(required("left", left)?, required("right", right)?))
            }
            NodeKind::ConditionalElse => Ok(Node::ConditionalElse(
                required("left", left)?,
                required("middle", middle)?,
                required("right", right)?,
            )),
            NodeKind::WhileLoop => {
                no_middle(&middle)?;
                Ok(Node::WhileLoop(required("left", left)?, required("right", right)?))
            }
            NodeKind::ForHeader => Ok(Node::ForHeader(left, middle, right)),
            NodeKind::ForLoop => {
                no_middle(&middle)?;
                Ok(Node::ForLoop(required("left", left)?, required("right", right)?))
            }
        }
    }

    pub fn literal(value: i64) -> Box<Node> {
        Box::new(Node::Literal(value))
    }

    pub fn identifier(name: &str) -> Box<Node> {
        Box::new(Node::Identifier(name.to_string()))
    }

    pub fn binary(op: BinOp, left: Box<Node>, right: Box<Node>) -> Box<Node> {
        Box::new(Node::BinaryOp(op, left, right))
    }

    pub fn assignment(name: &str, value: Box<Node>) -> Box<Node> {
        Box::new(Node::Assignment(name.to_string(), value))
    }

    pub fn declaration(name: &str, initializer: Option<Box<Node>>) -> Box<Node> {
        Box::new(Node::Declaration(name.to_string(), initializer))
    }

    pub fn sequence(first: Box<Node>, second: Box<Node>) -> Box<Node> {
        Box::new(Node::StatementSequence(first, second))
    }

    pub fn conditional(cond: Box<Node>, then_branch: Box<Node>) -> Box<Node> {
        Box::new(Node::Conditional(cond, then_branch))
    }

    pub fn conditional_else(cond: Box<Node>, then_branch: Box<Node>, else_branch: Box<Node>) -> Box<Node> {
        Box::new(Node::ConditionalElse(cond, then_branch, else_branch))
    }

    pub fn while_loop(cond: Box<Node>, body: Box<Node>) -> Box<Node> {
        Box::new(Node::WhileLoop(cond, body))
    }

    pub fn for_header(init: Child, cond: Child, update: Child) -> Box<Node> {
        Box::new(Node::ForHeader(init, cond, update))
    }

    pub fn for_loop(header: Box<Node>, body: Box<Node>) -> Box<Node> {
        Box::new(Node::ForLoop(header, body))
    }

    /// Children in rendering order. Absent optional children are `None`.
    pub fn children(&self) -> [Option<&Node>; 3] {
        match self {
            Node::Literal(_) | Node::Identifier(_) => [None, None, None],
            Node::BinaryOp(_, l, r) => [Some(&**l), Some(&**r), None],
            Node::Assignment(_, value) => [Some(&**value), None, None],
            Node::Declaration(_, init) => [init.as_deref(), None, None],
            Node::StatementSequence(first, second) => [Some(&**first), Some(&**second), None],
            Node::Conditional(cond, then) => [Some(&**cond), Some(&**then), None],
            Node::ConditionalElse(cond, then, otherwise) => [Some(&**cond), Some(&**then), Some(&**otherwise)],
            Node::WhileLoop(cond, body) => [Some(&**cond), Some(&**body), None],
            Node::ForHeader(init, cond, update) => [init.as_deref(), cond.as_deref(), update.as_deref()],
            Node::ForLoop(header, body) => [Some(&**header), Some(&**body), None],
        }
    }

    /// One-line label used by [`render`].
    pub fn label(&self) -> String {
        match self {
            Node::Literal(value) => format!("Literal({})", value),
            Node::Identifier(name) => format!("Identifier({})", name),
            Node::BinaryOp(op, _, _) => format!("BinaryOp({})", op),
            Node::Assignment(name, _) => format!("Assignment({})", name),
            Node::Declaration(name, _) => format!("Declaration({})", name),
            Node::StatementSequence(..) => "StatementSequence".to_string(),
            Node::Conditional(..) => "Conditional".to_string(),
            Node::ConditionalElse(..) => "ConditionalElse".to_string(),
            Node::WhileLoop(..) => "WhileLoop".to_string(),
            Node::ForHeader(..) => "ForHeader".to_string(),
            Node::ForLoop(..) => "ForLoop".to_string(),
        }
    }

    pub fn render(&self, depth: usize) -> Render<'_> {
        render(Some(self), depth)
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for line in self.render(0) {
            writeln!(f, "{}", line)?;
        }
        Ok(())
    }
}

/// Pre-order walk over a tree yielding one indented line per node.
/// Single pass: once exhausted it stays exhausted.
pub struct Render<'a> {
    stack: Vec<(&'a Node, usize)>,
}

impl<'a> Iterator for Render<'a> {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        let (node, depth) = self.stack.pop()?;
        // Reverse so the leftmost child is visited first
        for child in node.children().into_iter().rev().flatten() {
            self.stack.push((child, depth + 1));
        }
        Some(format!("{}{}", "  ".repeat(depth), node.label()))
    }
}

/// Render `node` starting at indentation `depth` (2 spaces per level).
/// An absent node renders nothing.
pub fn render(node: Option<&Node>, depth: usize) -> Render<'_> {
    Render {
        stack: node.map(|n| vec![(n, depth)]).unwrap_or_default(),
    }
}

impl Node {
    fn is_leaf(&self) -> bool {
        matches!(self, Node::Literal(_) | Node::Identifier(_))
    }

    fn children_mut(&mut self) -> [Option<&mut Node>; 3] {
        match self {
            Node::Literal(_) | Node::Identifier(_) => [None, None, None],
            Node::BinaryOp(_, l, r) => [Some(&mut **l), Some(&mut **r), None],
            Node::Assignment(_, value) => [Some(&mut **value), None, None],
            Node::Declaration(_, init) => [init.as_deref_mut(), None, None],
            Node::StatementSequence(first, second) => [Some(&mut **first), Some(&mut **second), None],
            Node::Conditional(cond, then) => [Some(&mut **cond), Some(&mut **then), None],
            Node::ConditionalElse(cond, then, otherwise) => {
                [Some(&mut **cond), Some(&mut **then), Some(&mut **otherwise)]
            }
            Node::WhileLoop(cond, body) => [Some(&mut **cond), Some(&mut **body), None],
            Node::ForHeader(init, cond, update) => {
                [init.as_deref_mut(), cond.as_deref_mut(), update.as_deref_mut()]
            }
            Node::ForLoop(header, body) => [Some(&mut **header), Some(&mut **body), None],
        }
    }

    /// Move every internal child out into `pending`, leaving a leaf in
    /// its place.
    fn detach_children(&mut self, pending: &mut Vec<Node>) {
        for child in self.children_mut().into_iter().flatten() {
            if !child.is_leaf() {
                pending.push(std::mem::replace(child, Node::Literal(0)));
            }
        }
    }
}

// Statement chains nest one level per statement, so teardown must not
// recurse with the depth of the tree.
impl Drop for Node {
    fn drop(&mut self) {
        let mut pending = Vec::new();
        self.detach_children(&mut pending);
        while let Some(mut node) = pending.pop() {
            node.detach_children(&mut pending);
        }
    }
}

/// Tear down a subtree and every name it owns. `None` is a no-op.
pub fn release(node: Option<Box<Node>>) {
    drop(node);
}
