use crate::ast::{
    BlockStatement, Expression, OnIdentifier, OnStatement, Program, Statement,
};
use crate::lexer::tokens::{Token, TokenKind};

/// Binding powers, lowest to highest. The comma sits at `Sum` so that
/// expression parsing stops in front of it everywhere except the contexts
/// that explicitly collect a tuple (`let` and `return` right-hand sides).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Precedence {
    Lowest,
    Equals,
    LessGreater,
    Sum,
    Product,
    Prefix,
    Call,
    Index,
}

fn precedence_of(kind: TokenKind) -> Precedence {
    match kind {
        TokenKind::Eq | TokenKind::NotEq => Precedence::Equals,
        TokenKind::Lt | TokenKind::Gt => Precedence::LessGreater,
        TokenKind::Plus | TokenKind::Minus | TokenKind::Comma => Precedence::Sum,
        TokenKind::Slash | TokenKind::Asterisk => Precedence::Product,
        TokenKind::LParen => Precedence::Call,
        TokenKind::LBracket | TokenKind::Dot => Precedence::Index,
        _ => Precedence::Lowest,
    }
}

/// Pratt parser over the token stream. Errors are accumulated as strings and
/// parsing continues; callers must check `errors()` before evaluating the
/// returned (possibly partial) program.
pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    errors: Vec<String>,
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        let tokens = if tokens.is_empty() {
            vec![Token::new(TokenKind::Eof, "", 1, 1)]
        } else {
            tokens
        };
        Self {
            tokens,
            pos: 0,
            errors: Vec::new(),
        }
    }

    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    pub fn parse_program(&mut self) -> Program {
        let mut program = Program::default();
        while !self.cur_is(TokenKind::Eof) {
            if let Some(stmt) = self.parse_statement() {
                program.statements.push(stmt);
            }
            self.next_token();
        }
        program
    }

    // ── Statements ──────────────────────────────────────────────────────

    fn parse_statement(&mut self) -> Option<Statement> {
        match self.cur().kind {
            TokenKind::Let => self.parse_let_statement(),
            TokenKind::Import => self.parse_import_statement(),
            TokenKind::Artifact => self.parse_artifact_statement(),
            TokenKind::Return => self.parse_return_statement(),
            TokenKind::Function => self.parse_function_statement(),
            TokenKind::On => self.parse_on_statement(),
            _ => self.parse_expression_statement(),
        }
    }

    fn parse_let_statement(&mut self) -> Option<Statement> {
        if !self.expect_peek(TokenKind::Ident) {
            return None;
        }

        let mut names = vec![self.cur().literal.clone()];
        while self.peek_is(TokenKind::Comma) {
            self.next_token();
            if !self.expect_peek(TokenKind::Ident) {
                return None;
            }
            names.push(self.cur().literal.clone());
        }

        if !self.expect_peek(TokenKind::Assign) {
            return None;
        }

        let value = self.parse_multiple_expression()?;

        if self.peek_is(TokenKind::Semicolon) {
            self.next_token();
        }

        Some(Statement::Let { names, value })
    }

    fn parse_return_statement(&mut self) -> Option<Statement> {
        let value = self.parse_multiple_expression()?;

        if self.peek_is(TokenKind::Semicolon) {
            self.next_token();
        }

        Some(Statement::Return { value })
    }

    // The RHS of `let` and `return` may be a comma-separated tuple; a single
    // value stays a plain expression.
    fn parse_multiple_expression(&mut self) -> Option<Expression> {
        self.next_token();
        let mut values = vec![self.parse_expression(Precedence::Lowest)?];

        while self.peek_is(TokenKind::Comma) {
            self.next_token();
            self.next_token();
            values.push(self.parse_expression(Precedence::Lowest)?);
        }

        if values.len() > 1 {
            Some(Expression::Multiple(values))
        } else {
            values.pop()
        }
    }

    fn parse_import_statement(&mut self) -> Option<Statement> {
        let items = self.parse_import_items()?;
        if self.peek_is(TokenKind::Semicolon) {
            self.next_token();
        }
        Some(Statement::Import { items })
    }

    fn parse_artifact_statement(&mut self) -> Option<Statement> {
        let items = self.parse_import_items()?;
        if self.peek_is(TokenKind::Semicolon) {
            self.next_token();
        }
        Some(Statement::Artifact { items })
    }

    // `artifact ERC20`, `artifact "abis/"` or `artifact (ERC20, "abis/")`.
    // Items are identifiers (builtin names) or strings (paths).
    fn parse_import_items(&mut self) -> Option<Vec<Expression>> {
        if self.peek_is(TokenKind::LParen) {
            self.next_token();

            let list = self.parse_expression_list(TokenKind::RParen)?;
            for item in &list {
                if !matches!(
                    item,
                    Expression::Identifier(_) | Expression::StringLiteral(_)
                ) {
                    self.errors
                        .push(format!("could not parse artifact with token {}", item));
                    return None;
                }
            }
            return Some(list);
        }

        if self.peek_is(TokenKind::Ident) {
            self.next_token();
            return Some(vec![Expression::Identifier(self.cur().literal.clone())]);
        }
        if self.peek_is(TokenKind::StringLit) {
            self.next_token();
            return Some(vec![Expression::StringLiteral(self.cur().literal.clone())]);
        }

        self.errors.push(format!(
            "expected artifact name, got {} instead",
            self.peek().kind
        ));
        None
    }

    fn parse_function_statement(&mut self) -> Option<Statement> {
        if !self.expect_peek(TokenKind::Ident) {
            return None;
        }
        let name = self.cur().literal.clone();

        if !self.expect_peek(TokenKind::LParen) {
            return None;
        }
        let parameters = self.parse_function_parameters()?;

        if !self.expect_peek(TokenKind::LBrace) {
            return None;
        }
        let body = self.parse_block_statement();

        Some(Statement::Function {
            name,
            parameters,
            body,
        })
    }

    fn parse_function_parameters(&mut self) -> Option<Vec<String>> {
        let mut parameters = Vec::new();

        if self.peek_is(TokenKind::RParen) {
            self.next_token();
            return Some(parameters);
        }

        if !self.expect_peek(TokenKind::Ident) {
            return None;
        }
        parameters.push(self.cur().literal.clone());

        while self.peek_is(TokenKind::Comma) {
            self.next_token();
            if !self.expect_peek(TokenKind::Ident) {
                return None;
            }
            parameters.push(self.cur().literal.clone());
        }

        if !self.expect_peek(TokenKind::RParen) {
            return None;
        }

        Some(parameters)
    }

    fn parse_on_statement(&mut self) -> Option<Statement> {
        if !self.expect_peek(TokenKind::Ident) {
            return None;
        }
        let contract = self.cur().literal.clone();

        // on ERC20(address).Transfer ... with an optional address filter
        let mut address = None;
        if self.peek_is(TokenKind::LParen) {
            self.next_token();
            self.next_token();
            address = Some(self.parse_expression(Precedence::Lowest)?);
            if !self.expect_peek(TokenKind::RParen) {
                return None;
            }
        }

        if !self.expect_peek(TokenKind::Dot) {
            return None;
        }
        if !self.expect_peek(TokenKind::Ident) {
            return None;
        }
        let method = self.cur().literal.clone();

        if !self.expect_peek(TokenKind::LParen) {
            return None;
        }
        let parameters = self.parse_event_parameters()?;

        if !self.expect_peek(TokenKind::LBrace) {
            return None;
        }
        let body = self.parse_block_statement();

        Some(Statement::On(OnStatement {
            contract,
            address,
            method,
            parameters,
            body,
        }))
    }

    fn parse_event_parameters(&mut self) -> Option<Vec<OnIdentifier>> {
        let mut parameters = Vec::new();

        if self.peek_is(TokenKind::RParen) {
            self.next_token();
            return Some(parameters);
        }

        if !self.expect_peek(TokenKind::Ident) {
            return None;
        }
        parameters.push(self.parse_on_identifier()?);

        while self.peek_is(TokenKind::Comma) {
            self.next_token();
            if !self.expect_peek(TokenKind::Ident) {
                return None;
            }
            parameters.push(self.parse_on_identifier()?);
        }

        if !self.expect_peek(TokenKind::RParen) {
            return None;
        }

        Some(parameters)
    }

    fn parse_on_identifier(&mut self) -> Option<OnIdentifier> {
        let name = self.cur().literal.clone();

        let mut default = None;
        if self.peek_is(TokenKind::Assign) {
            self.next_token();
            self.next_token();
            default = Some(self.parse_expression(Precedence::Lowest)?);
        }

        Some(OnIdentifier { name, default })
    }

    fn parse_expression_statement(&mut self) -> Option<Statement> {
        let expression = self.parse_expression(Precedence::Lowest)?;

        if self.peek_is(TokenKind::Semicolon) {
            self.next_token();
        }

        Some(Statement::Expression { expression })
    }

    fn parse_block_statement(&mut self) -> BlockStatement {
        let mut block = BlockStatement {
            statements: Vec::new(),
        };

        self.next_token();
        while !self.cur_is(TokenKind::RBrace) && !self.cur_is(TokenKind::Eof) {
            if let Some(stmt) = self.parse_statement() {
                block.statements.push(stmt);
            }
            self.next_token();
        }

        block
    }

    // ── Expressions ─────────────────────────────────────────────────────

    fn parse_expression(&mut self, precedence: Precedence) -> Option<Expression> {
        let mut left = self.parse_prefix()?;

        while !self.peek_is(TokenKind::Semicolon) && precedence < self.peek_precedence() {
            left = match self.peek().kind {
                TokenKind::Plus
                | TokenKind::Minus
                | TokenKind::Slash
                | TokenKind::Asterisk
                | TokenKind::Eq
                | TokenKind::NotEq
                | TokenKind::Lt
                | TokenKind::Gt => {
                    self.next_token();
                    self.parse_infix_expression(left)?
                }
                TokenKind::LParen => {
                    self.next_token();
                    self.parse_call_expression(left)?
                }
                TokenKind::LBracket => {
                    self.next_token();
                    self.parse_index_expression(left)?
                }
                TokenKind::Dot => {
                    self.next_token();
                    self.parse_dot_index_expression(left)?
                }
                _ => return Some(left),
            };
        }

        Some(left)
    }

    fn parse_prefix(&mut self) -> Option<Expression> {
        match self.cur().kind {
            TokenKind::Ident => Some(Expression::Identifier(self.cur().literal.clone())),
            TokenKind::Int => self.parse_integer_literal(),
            TokenKind::StringLit => Some(Expression::StringLiteral(self.cur().literal.clone())),
            TokenKind::Bytes => Some(Expression::BytesLiteral(self.cur().literal.clone())),
            TokenKind::True => Some(Expression::Boolean(true)),
            TokenKind::False => Some(Expression::Boolean(false)),
            TokenKind::Bang | TokenKind::Minus => self.parse_prefix_expression(),
            TokenKind::LParen => self.parse_grouped_expression(),
            TokenKind::If => self.parse_if_expression(),
            TokenKind::LBracket => self.parse_array_literal(),
            TokenKind::LBrace => self.parse_hash_literal(),
            kind => {
                self.errors
                    .push(format!("no prefix parse function for {} found", kind));
                None
            }
        }
    }

    fn parse_integer_literal(&mut self) -> Option<Expression> {
        match self.cur().literal.parse::<i64>() {
            Ok(value) => Some(Expression::IntegerLiteral(value)),
            Err(_) => {
                self.errors.push(format!(
                    "could not parse {:?} as integer",
                    self.cur().literal
                ));
                None
            }
        }
    }

    fn parse_prefix_expression(&mut self) -> Option<Expression> {
        let operator = self.cur().literal.clone();
        self.next_token();
        let right = self.parse_expression(Precedence::Prefix)?;
        Some(Expression::Prefix {
            operator,
            right: Box::new(right),
        })
    }

    fn parse_infix_expression(&mut self, left: Expression) -> Option<Expression> {
        let operator = self.cur().literal.clone();
        let precedence = self.cur_precedence();
        self.next_token();
        let right = self.parse_expression(precedence)?;
        Some(Expression::Infix {
            operator,
            left: Box::new(left),
            right: Box::new(right),
        })
    }

    fn parse_grouped_expression(&mut self) -> Option<Expression> {
        self.next_token();
        let expression = self.parse_expression(Precedence::Lowest)?;
        if !self.expect_peek(TokenKind::RParen) {
            return None;
        }
        Some(expression)
    }

    fn parse_if_expression(&mut self) -> Option<Expression> {
        if !self.expect_peek(TokenKind::LParen) {
            return None;
        }

        self.next_token();
        let condition = self.parse_expression(Precedence::Lowest)?;

        if !self.expect_peek(TokenKind::RParen) {
            return None;
        }
        if !self.expect_peek(TokenKind::LBrace) {
            return None;
        }
        let consequence = self.parse_block_statement();

        let mut alternative = None;
        if self.peek_is(TokenKind::Else) {
            self.next_token();
            if !self.expect_peek(TokenKind::LBrace) {
                return None;
            }
            alternative = Some(self.parse_block_statement());
        }

        Some(Expression::If {
            condition: Box::new(condition),
            consequence,
            alternative,
        })
    }

    fn parse_call_expression(&mut self, function: Expression) -> Option<Expression> {
        let arguments = self.parse_expression_list(TokenKind::RParen)?;
        Some(Expression::Call {
            function: Box::new(function),
            arguments,
        })
    }

    fn parse_index_expression(&mut self, left: Expression) -> Option<Expression> {
        self.next_token();
        let index = self.parse_expression(Precedence::Lowest)?;
        if !self.expect_peek(TokenKind::RBracket) {
            return None;
        }
        Some(Expression::Index {
            left: Box::new(left),
            index: Box::new(index),
            dot: false,
        })
    }

    fn parse_dot_index_expression(&mut self, left: Expression) -> Option<Expression> {
        self.next_token();
        let index = self.parse_expression(Precedence::Lowest)?;
        Some(Expression::Index {
            left: Box::new(left),
            index: Box::new(index),
            dot: true,
        })
    }

    fn parse_array_literal(&mut self) -> Option<Expression> {
        let elements = self.parse_expression_list(TokenKind::RBracket)?;
        Some(Expression::ArrayLiteral(elements))
    }

    fn parse_expression_list(&mut self, end: TokenKind) -> Option<Vec<Expression>> {
        let mut list = Vec::new();

        if self.peek_is(end) {
            self.next_token();
            return Some(list);
        }

        self.next_token();
        list.push(self.parse_expression(Precedence::Lowest)?);

        while self.peek_is(TokenKind::Comma) {
            self.next_token();
            self.next_token();
            list.push(self.parse_expression(Precedence::Lowest)?);
        }

        if !self.expect_peek(end) {
            return None;
        }

        Some(list)
    }

    fn parse_hash_literal(&mut self) -> Option<Expression> {
        let mut pairs = Vec::new();

        while !self.peek_is(TokenKind::RBrace) {
            self.next_token();
            let key = self.parse_expression(Precedence::Lowest)?;

            if !self.expect_peek(TokenKind::Colon) {
                return None;
            }

            self.next_token();
            let value = self.parse_expression(Precedence::Lowest)?;

            pairs.push((key, value));

            if !self.peek_is(TokenKind::RBrace) && !self.expect_peek(TokenKind::Comma) {
                return None;
            }
        }

        if !self.expect_peek(TokenKind::RBrace) {
            return None;
        }

        Some(Expression::HashLiteral(pairs))
    }

    // ── Token cursor ────────────────────────────────────────────────────

    fn cur(&self) -> &Token {
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn peek(&self) -> &Token {
        &self.tokens[(self.pos + 1).min(self.tokens.len() - 1)]
    }

    fn next_token(&mut self) {
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
    }

    fn cur_is(&self, kind: TokenKind) -> bool {
        self.cur().kind == kind
    }

    fn peek_is(&self, kind: TokenKind) -> bool {
        self.peek().kind == kind
    }

    fn cur_precedence(&self) -> Precedence {
        precedence_of(self.cur().kind)
    }

    fn peek_precedence(&self) -> Precedence {
        precedence_of(self.peek().kind)
    }

    fn expect_peek(&mut self, kind: TokenKind) -> bool {
        if self.peek_is(kind) {
            self.next_token();
            true
        } else {
            self.peek_error(kind);
            false
        }
    }

    fn peek_error(&mut self, kind: TokenKind) {
        self.errors.push(format!(
            "expected next token to be {}, got {} instead",
            kind,
            self.peek().kind
        ));
    }
}
