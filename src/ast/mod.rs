use std::fmt;

/// A parsed script: the statements are evaluated eagerly, in source order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Program {
    pub statements: Vec<Statement>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    /// `let a, b = expr (, expr)*;` with several names requires a
    /// multi-valued RHS.
    Let { names: Vec<String>, value: Expression },
    Return { value: Expression },
    /// `import account` / `import (ens, etherscan)`: builtin plugins.
    Import { items: Vec<Expression> },
    /// `artifact ERC20` / `artifact "path/to/abi.json"`: contract ABIs.
    Artifact { items: Vec<Expression> },
    /// `fn name(params) { body }` binds a named function in the current scope.
    Function {
        name: String,
        parameters: Vec<String>,
        body: BlockStatement,
    },
    On(OnStatement),
    Expression { expression: Expression },
}

#[derive(Debug, Clone, PartialEq)]
pub struct BlockStatement {
    pub statements: Vec<Statement>,
}

/// `on Contract(address?).Method(params) { body }`, a reaction block. The
/// optional parenthesized expression after the contract name filters on the
/// emitting address.
#[derive(Debug, Clone, PartialEq)]
pub struct OnStatement {
    pub contract: String,
    pub address: Option<Expression>,
    pub method: String,
    pub parameters: Vec<OnIdentifier>,
    pub body: BlockStatement,
}

/// One event parameter binding, optionally with a filter value (`from = 0x..`).
#[derive(Debug, Clone, PartialEq)]
pub struct OnIdentifier {
    pub name: String,
    pub default: Option<Expression>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    Identifier(String),
    IntegerLiteral(i64),
    StringLiteral(String),
    /// Hex literal beginning with `0x`, kept as written.
    BytesLiteral(String),
    Boolean(bool),
    ArrayLiteral(Vec<Expression>),
    HashLiteral(Vec<(Expression, Expression)>),
    Prefix {
        operator: String,
        right: Box<Expression>,
    },
    Infix {
        operator: String,
        left: Box<Expression>,
        right: Box<Expression>,
    },
    If {
        condition: Box<Expression>,
        consequence: BlockStatement,
        alternative: Option<BlockStatement>,
    },
    Call {
        function: Box<Expression>,
        arguments: Vec<Expression>,
    },
    /// Both `a[i]` and `a.b`; the two forms are told apart by `dot`.
    Index {
        left: Box<Expression>,
        index: Box<Expression>,
        dot: bool,
    },
    /// Tuple-valued RHS of `let` and `return`.
    Multiple(Vec<Expression>),
}

fn join<T: fmt::Display>(items: &[T], separator: &str) -> String {
    items
        .iter()
        .map(|i| i.to_string())
        .collect::<Vec<_>>()
        .join(separator)
}

impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&join(&self.statements, "\n"))
    }
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Statement::Let { names, value } => {
                write!(f, "let {} = {};", names.join(", "), value)
            }
            Statement::Return { value } => write!(f, "return {};", value),
            Statement::Import { items } => write!(f, "import ({})", join(items, ", ")),
            Statement::Artifact { items } => write!(f, "artifact ({})", join(items, ", ")),
            Statement::Function {
                name,
                parameters,
                body,
            } => write!(f, "fn {}({}) {}", name, parameters.join(", "), body),
            Statement::On(stmt) => stmt.fmt(f),
            Statement::Expression { expression } => expression.fmt(f),
        }
    }
}

impl fmt::Display for BlockStatement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{ {} }}", join(&self.statements, "\n"))
    }
}

impl fmt::Display for OnStatement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "on {}", self.contract)?;
        if let Some(address) = &self.address {
            write!(f, "({})", address)?;
        }
        write!(
            f,
            ".{}({}) {}",
            self.method,
            join(&self.parameters, ", "),
            self.body
        )
    }
}

impl fmt::Display for OnIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.default {
            Some(value) => write!(f, "{} = {}", self.name, value),
            None => f.write_str(&self.name),
        }
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expression::Identifier(name) => f.write_str(name),
            Expression::IntegerLiteral(value) => write!(f, "{}", value),
            Expression::StringLiteral(value) => write!(f, "{:?}", value),
            Expression::BytesLiteral(value) => f.write_str(value),
            Expression::Boolean(value) => write!(f, "{}", value),
            Expression::ArrayLiteral(elements) => write!(f, "[{}]", join(elements, ", ")),
            Expression::HashLiteral(pairs) => {
                let rendered = pairs
                    .iter()
                    .map(|(k, v)| format!("{}: {}", k, v))
                    .collect::<Vec<_>>()
                    .join(", ");
                write!(f, "{{{}}}", rendered)
            }
            Expression::Prefix { operator, right } => write!(f, "({}{})", operator, right),
            Expression::Infix {
                operator,
                left,
                right,
            } => write!(f, "({} {} {})", left, operator, right),
            Expression::If {
                condition,
                consequence,
                alternative,
            } => {
                write!(f, "if ({}) {}", condition, consequence)?;
                if let Some(alternative) = alternative {
                    write!(f, " else {}", alternative)?;
                }
                Ok(())
            }
            Expression::Call {
                function,
                arguments,
            } => write!(f, "{}({})", function, join(arguments, ", ")),
            Expression::Index { left, index, dot } => {
                if *dot {
                    write!(f, "({}.{})", left, index)
                } else {
                    write!(f, "({}[{}])", left, index)
                }
            }
            Expression::Multiple(expressions) => f.write_str(&join(expressions, ", ")),
        }
    }
}
