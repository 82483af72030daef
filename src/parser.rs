/*!
Recursive‑descent parser: tokens → [`SyntaxTree`].

Time & Space
------------
* **n** = number of tokens (including the sole EOF).

Each token is consumed once via `advance()`, so parsing is **Θ(n)**; the tree
holds one node per token at most. Call‑stack depth grows with syntactic
nesting.

### Logging Policy

| Location                     | Level  | Purpose                                   |
|------------------------------|--------|-------------------------------------------|
| `Parser::new`, `parse`       | `info` | Lifecycle milestones.                     |
| `declaration`, `statement`   | `debug`| High‑level descent into grammar branches. |

Grammar (EBNF)
--------------

```text
program     → declaration* EOF ;
declaration → classDecl | enumDecl | funDecl | varDecl | statement ;
classDecl   → "class" IDENT ( "<" IDENT )? "{" method* "}" ;
method      → "static"? IDENT ( "(" parameters? ")" )? block ;
enumDecl    → "enum" IDENT "{" ( IDENT ( "," IDENT )* ","? )? "}" ;
funDecl     → "fun" IDENT ( "(" parameters? ")" )? block ;
parameters  → param ( "," param )* ;
param       → "..."? IDENT ;
varDecl     → "var" IDENT ( "=" expression )? ";" ;
statement   → exprStmt | forStmt | ifStmt | printStmt | returnStmt
            | whileStmt | breakStmt | continueStmt | switchStmt | block ;
switchStmt  → "switch" "(" expression ")" "{" caseClause* defaultClause? "}" ;
caseClause  → "case" expression ( "," expression )* ":" declaration* ;
defaultClause → "default" ":" declaration* ;
expression  → assignment ;
assignment  → ( call "." )? IDENT "=" assignment
            | call "[" expression "]" "=" assignment
            | logic_or ;
logic_or    → logic_and ( "or" logic_and )* ;
logic_and   → equality  ( "and" equality )* ;
equality    → comparison ( ( "!=" | "==" ) comparison )* ;
comparison  → term ( ( ">" | ">=" | "<" | "<=" ) term )* ;
term        → factor ( ( "-" | "+" ) factor )* ;
factor      → unary ( ( "/" | "*" | "%" ) unary )* ;
unary       → ( "!" | "-" | "..." ) unary | call ;
call        → primary ( "(" arguments? ")" | "." IDENT | "[" expression "]" )* ;
primary     → INTEGER | DOUBLE | STRING | "true" | "false" | "nil"
            | IDENT | "this" | "super" "." IDENT | "(" expression ")"
            | "fun" ( "(" parameters? ")" )? block
            | "[" ( ":" | elements | entries )? "]" ;
```

Whether a missing parameter list or a spread is legal where it appears is a
static rule, checked by the resolver, not here.
*/

use std::rc::Rc;

use crate::ast::{
    ClassDecl, DefaultCase, EnumDecl, Expr, FunctionDecl, LiteralValue, MethodDecl, Param,
    Stmt, SwitchCase, SyntaxTree, Unresolved, VarRef,
};
use crate::error::{LoxError, Result};
use crate::token::{Token, TokenType};

use log::{debug, info};

type UExpr = Expr<Unresolved>;
type UStmt = Stmt<Unresolved>;

const MAX_ARGUMENTS: usize = 255;

/// Top‑level parser over a scanned token list.
pub struct Parser {
    tokens: Vec<Token>,
    current: usize,
    /// Accept a final expression without `;` (REPL input).
    trailing_expression: bool,
}

impl Parser {
    /// Construct a new parser. An `EOF` token is appended if missing.
    pub fn new(mut tokens: Vec<Token>) -> Self {
        info!("Parser created with {} tokens", tokens.len());

        if !matches!(tokens.last(), Some(t) if t.token_type == TokenType::EOF) {
            let line = tokens.last().map_or(1, |t| t.line);
            tokens.push(Token::new(TokenType::EOF, "", line));
        }

        Self {
            tokens,
            current: 0,
            trailing_expression: false,
        }
    }

    // ───────────────────────── public API ─────────────────────────

    /// Parse an entire program and return its statement list.
    pub fn parse(mut self) -> Result<SyntaxTree> {
        info!("Beginning parse phase");

        let mut statements: SyntaxTree = Vec::new();

        while !self.is_at_end() {
            statements.push(self.declaration()?);
        }

        info!("Parsed {} top-level statement(s)", statements.len());

        Ok(statements)
    }

    /// Like [`Parser::parse`], but a trailing expression may omit its `;`.
    pub fn parse_repl(mut self) -> Result<SyntaxTree> {
        self.trailing_expression = true;
        self.parse()
    }

    /// Parse the input as exactly one expression (`rox parse`).
    pub fn parse_expression(mut self) -> Result<UExpr> {
        let expr = self.expression()?;

        if !self.is_at_end() {
            return Err(LoxError::parse(self.peek(), "Expect end of expression."));
        }

        Ok(expr)
    }

    // ──────────────────────── declaration rules ───────────────────

    fn declaration(&mut self) -> Result<UStmt> {
        debug!("Entering declaration at line {}", self.peek().line);

        if self.matches(TokenType::CLASS) {
            self.class_declaration()
        } else if self.matches(TokenType::ENUM) {
            self.enum_declaration()
        } else if self.check(TokenType::FUN) && self.check_next(TokenType::IDENTIFIER) {
            self.advance();
            self.function(false).map(|f| Stmt::Function(Rc::new(f)))
        } else if self.matches(TokenType::VAR) {
            self.var_declaration()
        } else {
            self.statement()
        }
    }

    fn class_declaration(&mut self) -> Result<UStmt> {
        let name = self.consume(TokenType::IDENTIFIER, "Expect class name.")?;

        let superclass = if self.matches(TokenType::LESS) {
            let name = self.consume(TokenType::IDENTIFIER, "Expect superclass name.")?;
            Some(VarRef {
                name,
                slot: Unresolved,
            })
        } else {
            None
        };

        self.consume(TokenType::LEFT_BRACE, "Expect '{' before class body.")?;

        let mut methods = Vec::new();

        while !self.check(TokenType::RIGHT_BRACE) && !self.is_at_end() {
            let is_static = self.matches(TokenType::STATIC);
            let function = self.function(false)?;

            methods.push(MethodDecl {
                function: Rc::new(function),
                is_static,
            });
        }

        self.consume(TokenType::RIGHT_BRACE, "Expect '}' after class body.")?;

        Ok(Stmt::Class(ClassDecl {
            name,
            superclass,
            methods,
        }))
    }

    fn enum_declaration(&mut self) -> Result<UStmt> {
        let name = self.consume(TokenType::IDENTIFIER, "Expect enum name.")?;
        self.consume(TokenType::LEFT_BRACE, "Expect '{' before enum body.")?;

        let mut cases = Vec::new();

        while !self.check(TokenType::RIGHT_BRACE) && !self.is_at_end() {
            cases.push(self.consume(TokenType::IDENTIFIER, "Expect enum case name.")?);

            if !self.matches(TokenType::COMMA) {
                break;
            }
        }

        self.consume(TokenType::RIGHT_BRACE, "Expect '}' after enum cases.")?;

        Ok(Stmt::Enum(EnumDecl { name, cases }))
    }

    /// `IDENT ( "(" parameters? ")" )? block`, or the same after `fun` for
    /// lambdas, where the name slot holds the `fun` keyword.
    fn function(&mut self, is_lambda: bool) -> Result<FunctionDecl<Unresolved>> {
        let name = if is_lambda {
            self.previous().clone()
        } else {
            self.consume(TokenType::IDENTIFIER, "Expect function name.")?
        };

        let params = if self.matches(TokenType::LEFT_PAREN) {
            Some(self.parameters()?)
        } else {
            None
        };

        self.consume(TokenType::LEFT_BRACE, "Expect '{' before function body.")?;
        let body = self.block()?;

        Ok(FunctionDecl {
            name,
            params,
            body,
            is_lambda,
        })
    }

    /// Parameters after the opening `(`, through the closing `)`.
    fn parameters(&mut self) -> Result<Vec<Param>> {
        let mut params: Vec<Param> = Vec::new();

        if !self.check(TokenType::RIGHT_PAREN) {
            loop {
                if params.len() >= MAX_ARGUMENTS {
                    return Err(LoxError::parse(
                        self.peek(),
                        "Can't have more than 255 parameters.",
                    ));
                }

                let variadic = self.matches(TokenType::ELLIPSIS);
                let name = self.consume(TokenType::IDENTIFIER, "Expect parameter name.")?;
                params.push(Param { name, variadic });

                if variadic && !self.check(TokenType::RIGHT_PAREN) {
                    return Err(LoxError::parse(
                        self.peek(),
                        "A variadic parameter must be the last one.",
                    ));
                }

                if !self.matches(TokenType::COMMA) {
                    break;
                }
            }
        }

        self.consume(TokenType::RIGHT_PAREN, "Expect ')' after parameters.")?;

        Ok(params)
    }

    fn var_declaration(&mut self) -> Result<UStmt> {
        let name = self.consume(TokenType::IDENTIFIER, "Expect variable name.")?;

        let initializer = if self.matches(TokenType::EQUAL) {
            Some(self.expression()?)
        } else {
            None
        };

        self.consume(
            TokenType::SEMICOLON,
            "Expect ';' after variable declaration.",
        )?;

        Ok(Stmt::Var { name, initializer })
    }

    // ───────────────────────── statement rules ────────────────────

    fn statement(&mut self) -> Result<UStmt> {
        debug!("Entering statement at line {}", self.peek().line);

        if self.matches(TokenType::FOR) {
            self.for_statement()
        } else if self.matches(TokenType::IF) {
            self.if_statement()
        } else if self.matches(TokenType::WHILE) {
            self.while_statement()
        } else if self.matches(TokenType::RETURN) {
            self.return_statement()
        } else if self.matches(TokenType::BREAK) {
            let keyword = self.previous().clone();
            self.consume(TokenType::SEMICOLON, "Expect ';' after 'break'.")?;
            Ok(Stmt::Break(keyword))
        } else if self.matches(TokenType::CONTINUE) {
            let keyword = self.previous().clone();
            self.consume(TokenType::SEMICOLON, "Expect ';' after 'continue'.")?;
            Ok(Stmt::Continue(keyword))
        } else if self.matches(TokenType::SWITCH) {
            self.switch_statement()
        } else if self.matches(TokenType::LEFT_BRACE) {
            Ok(Stmt::Block(self.block()?))
        } else if self.matches(TokenType::PRINT) {
            self.print_statement()
        } else {
            self.expression_statement()
        }
    }

    fn for_statement(&mut self) -> Result<UStmt> {
        let keyword = self.previous().clone();
        self.consume(TokenType::LEFT_PAREN, "Expect '(' after 'for'.")?;

        let initializer = if self.matches(TokenType::SEMICOLON) {
            None
        } else if self.matches(TokenType::VAR) {
            Some(Box::new(self.var_declaration()?))
        } else {
            Some(Box::new(self.expression_statement()?))
        };

        let condition = if !self.check(TokenType::SEMICOLON) {
            Some(self.expression()?)
        } else {
            None
        };
        self.consume(TokenType::SEMICOLON, "Expect ';' after loop condition.")?;

        let increment = if !self.check(TokenType::RIGHT_PAREN) {
            Some(self.expression()?)
        } else {
            None
        };
        self.consume(TokenType::RIGHT_PAREN, "Expect ')' after for clauses.")?;

        let body = Box::new(self.statement()?);

        Ok(Stmt::For {
            keyword,
            initializer,
            condition,
            increment,
            body,
        })
    }

    fn switch_statement(&mut self) -> Result<UStmt> {
        let keyword = self.previous().clone();

        self.consume(TokenType::LEFT_PAREN, "Expect '(' after 'switch'.")?;
        let subject = self.expression()?;
        self.consume(TokenType::RIGHT_PAREN, "Expect ')' after switch value.")?;
        self.consume(TokenType::LEFT_BRACE, "Expect '{' before switch body.")?;

        let mut cases = Vec::new();
        let mut default = None;

        while !self.check(TokenType::RIGHT_BRACE) && !self.is_at_end() {
            if self.matches(TokenType::CASE) {
                if default.is_some() {
                    return Err(LoxError::parse(
                        self.previous(),
                        "'default' must be the last clause of a switch.",
                    ));
                }

                let case_keyword = self.previous().clone();
                let mut values = vec![self.expression()?];

                while self.matches(TokenType::COMMA) {
                    values.push(self.expression()?);
                }

                self.consume(TokenType::COLON, "Expect ':' after case value.")?;

                cases.push(SwitchCase {
                    keyword: case_keyword,
                    values,
                    body: self.case_body()?,
                });
            } else if self.matches(TokenType::DEFAULT) {
                if default.is_some() {
                    return Err(LoxError::parse(
                        self.previous(),
                        "A switch can only have one 'default'.",
                    ));
                }

                let default_keyword = self.previous().clone();
                self.consume(TokenType::COLON, "Expect ':' after 'default'.")?;

                default = Some(DefaultCase {
                    keyword: default_keyword,
                    body: self.case_body()?,
                });
            } else {
                return Err(LoxError::parse(
                    self.peek(),
                    "Expect 'case' or 'default' in switch body.",
                ));
            }
        }

        self.consume(TokenType::RIGHT_BRACE, "Expect '}' after switch body.")?;

        Ok(Stmt::Switch {
            keyword,
            subject,
            cases,
            default,
        })
    }

    fn case_body(&mut self) -> Result<Vec<UStmt>> {
        let mut body = Vec::new();

        while !self.check(TokenType::CASE)
            && !self.check(TokenType::DEFAULT)
            && !self.check(TokenType::RIGHT_BRACE)
            && !self.is_at_end()
        {
            body.push(self.declaration()?);
        }

        Ok(body)
    }

    fn print_statement(&mut self) -> Result<UStmt> {
        let value = self.expression()?;

        self.consume(TokenType::SEMICOLON, "Expect ';' after value.")?;

        Ok(Stmt::Print(value))
    }

    fn expression_statement(&mut self) -> Result<UStmt> {
        let expr = self.expression()?;

        if self.trailing_expression && self.is_at_end() {
            return Ok(Stmt::Expression(expr));
        }

        self.consume(TokenType::SEMICOLON, "Expect ';' after expression.")?;

        Ok(Stmt::Expression(expr))
    }

    fn if_statement(&mut self) -> Result<UStmt> {
        self.consume(TokenType::LEFT_PAREN, "Expect '(' after 'if'.")?;
        let condition = self.expression()?;
        self.consume(TokenType::RIGHT_PAREN, "Expect ')' after if condition.")?;

        let then_branch = Box::new(self.statement()?);
        let else_branch = if self.matches(TokenType::ELSE) {
            Some(Box::new(self.statement()?))
        } else {
            None
        };

        Ok(Stmt::If {
            condition,
            then_branch,
            else_branch,
        })
    }

    fn while_statement(&mut self) -> Result<UStmt> {
        let keyword = self.previous().clone();

        self.consume(TokenType::LEFT_PAREN, "Expect '(' after 'while'.")?;
        let condition = self.expression()?;
        self.consume(TokenType::RIGHT_PAREN, "Expect ')' after condition.")?;
        let body = Box::new(self.statement()?);

        Ok(Stmt::While {
            keyword,
            condition,
            body,
        })
    }

    fn return_statement(&mut self) -> Result<UStmt> {
        let keyword = self.previous().clone();

        let value = if !self.check(TokenType::SEMICOLON) {
            Some(self.expression()?)
        } else {
            None
        };

        self.consume(TokenType::SEMICOLON, "Expect ';' after return value.")?;

        Ok(Stmt::Return { keyword, value })
    }

    /// Declarations up to and including the closing `}`.
    fn block(&mut self) -> Result<Vec<UStmt>> {
        let mut statements = Vec::new();

        while !self.check(TokenType::RIGHT_BRACE) && !self.is_at_end() {
            statements.push(self.declaration()?);
        }

        self.consume(TokenType::RIGHT_BRACE, "Expect '}' after block.")?;

        Ok(statements)
    }

    // ─────────────────────── expression rules ─────────────────────

    fn expression(&mut self) -> Result<UExpr> {
        self.assignment()
    }

    fn assignment(&mut self) -> Result<UExpr> {
        let expr = self.logical_or()?;

        if self.matches(TokenType::EQUAL) {
            let equals = self.previous().clone();
            let value = Box::new(self.assignment()?);

            return match expr {
                Expr::Variable(target) => Ok(Expr::Assign { target, value }),

                Expr::Get { object, name } => Ok(Expr::Set {
                    object,
                    name,
                    value,
                }),

                Expr::SubscriptGet {
                    object,
                    bracket,
                    index,
                } => Ok(Expr::SubscriptSet {
                    object,
                    bracket,
                    index,
                    value,
                }),

                _ => Err(LoxError::parse(&equals, "Invalid assignment target.")),
            };
        }

        Ok(expr)
    }

    fn logical_or(&mut self) -> Result<UExpr> {
        let mut expr = self.logical_and()?;

        while self.matches(TokenType::OR) {
            let operator = self.previous().clone();
            let right = self.logical_and()?;

            expr = Expr::Logical {
                left: Box::new(expr),
                operator,
                right: Box::new(right),
            };
        }

        Ok(expr)
    }

    fn logical_and(&mut self) -> Result<UExpr> {
        let mut expr = self.equality()?;

        while self.matches(TokenType::AND) {
            let operator = self.previous().clone();
            let right = self.equality()?;

            expr = Expr::Logical {
                left: Box::new(expr),
                operator,
                right: Box::new(right),
            };
        }

        Ok(expr)
    }

    /// Left‑associative binary level: `next ( op next )*`.
    fn binary_level(
        &mut self,
        operators: &[TokenType],
        next: fn(&mut Self) -> Result<UExpr>,
    ) -> Result<UExpr> {
        let mut expr = next(self)?;

        while operators.iter().any(|op| self.check(op.clone())) {
            let operator = self.advance().clone();
            let right = next(self)?;

            expr = Expr::Binary {
                left: Box::new(expr),
                operator,
                right: Box::new(right),
            };
        }

        Ok(expr)
    }

    fn equality(&mut self) -> Result<UExpr> {
        self.binary_level(
            &[TokenType::BANG_EQUAL, TokenType::EQUAL_EQUAL],
            Self::comparison,
        )
    }

    fn comparison(&mut self) -> Result<UExpr> {
        self.binary_level(
            &[
                TokenType::GREATER,
                TokenType::GREATER_EQUAL,
                TokenType::LESS,
                TokenType::LESS_EQUAL,
            ],
            Self::term,
        )
    }

    fn term(&mut self) -> Result<UExpr> {
        self.binary_level(&[TokenType::MINUS, TokenType::PLUS], Self::factor)
    }

    fn factor(&mut self) -> Result<UExpr> {
        self.binary_level(
            &[TokenType::STAR, TokenType::SLASH, TokenType::PERCENT],
            Self::unary,
        )
    }

    fn unary(&mut self) -> Result<UExpr> {
        if self.matches(TokenType::BANG) || self.matches(TokenType::MINUS) {
            let operator = self.previous().clone();
            let right = self.unary()?;

            return Ok(Expr::Unary {
                operator,
                right: Box::new(right),
            });
        }

        if self.matches(TokenType::ELLIPSIS) {
            let operator = self.previous().clone();
            let operand = self.unary()?;

            return Ok(Expr::Splat {
                operator,
                operand: Box::new(operand),
            });
        }

        self.call()
    }

    fn call(&mut self) -> Result<UExpr> {
        let mut expr = self.primary()?;

        loop {
            if self.matches(TokenType::LEFT_PAREN) {
                expr = self.finish_call(expr)?;
            } else if self.matches(TokenType::DOT) {
                let name = self.consume(TokenType::IDENTIFIER, "Expect property name after '.'.")?;

                expr = Expr::Get {
                    object: Box::new(expr),
                    name,
                };
            } else if self.matches(TokenType::LEFT_BRACKET) {
                let bracket = self.previous().clone();
                let index = self.expression()?;
                self.consume(TokenType::RIGHT_BRACKET, "Expect ']' after subscript.")?;

                expr = Expr::SubscriptGet {
                    object: Box::new(expr),
                    bracket,
                    index: Box::new(index),
                };
            } else {
                break;
            }
        }

        Ok(expr)
    }

    fn finish_call(&mut self, callee: UExpr) -> Result<UExpr> {
        let mut arguments = Vec::new();

        if !self.check(TokenType::RIGHT_PAREN) {
            loop {
                if arguments.len() >= MAX_ARGUMENTS {
                    return Err(LoxError::parse(
                        self.peek(),
                        "Can't have more than 255 arguments.",
                    ));
                }

                arguments.push(self.expression()?);

                if !self.matches(TokenType::COMMA) {
                    break;
                }
            }
        }

        let paren = self.consume(TokenType::RIGHT_PAREN, "Expect ')' after arguments.")?;

        Ok(Expr::Call {
            callee: Box::new(callee),
            paren,
            arguments,
        })
    }

    fn primary(&mut self) -> Result<UExpr> {
        let token = self.peek().clone();

        let literal = match &token.token_type {
            TokenType::FALSE => Some(LiteralValue::False),
            TokenType::TRUE => Some(LiteralValue::True),
            TokenType::NIL => Some(LiteralValue::Nil),
            TokenType::INTEGER(n) => Some(LiteralValue::Int(*n)),
            TokenType::DOUBLE(n) => Some(LiteralValue::Double(*n)),
            TokenType::STRING(s) => Some(LiteralValue::Str(Rc::from(s.as_str()))),
            _ => None,
        };

        if let Some(literal) = literal {
            self.advance();
            return Ok(Expr::Literal(literal));
        }

        if self.matches(TokenType::IDENTIFIER) {
            return Ok(Expr::Variable(VarRef {
                name: token,
                slot: Unresolved,
            }));
        }

        if self.matches(TokenType::THIS) {
            return Ok(Expr::This(VarRef {
                name: token,
                slot: Unresolved,
            }));
        }

        if self.matches(TokenType::SUPER) {
            self.consume(TokenType::DOT, "Expect '.' after 'super'.")?;
            let method = self.consume(TokenType::IDENTIFIER, "Expect superclass method name.")?;

            return Ok(Expr::Super {
                keyword: VarRef {
                    name: token,
                    slot: Unresolved,
                },
                method,
            });
        }

        if self.matches(TokenType::FUN) {
            return Ok(Expr::Lambda(Rc::new(self.function(true)?)));
        }

        if self.matches(TokenType::LEFT_PAREN) {
            let expr = self.expression()?;

            self.consume(TokenType::RIGHT_PAREN, "Expect ')' after expression.")?;

            return Ok(Expr::Grouping(Box::new(expr)));
        }

        if self.matches(TokenType::LEFT_BRACKET) {
            return self.collection_literal(token);
        }

        Err(LoxError::parse(&token, "Expect expression."))
    }

    /// List or dictionary literal after the opening `[`.
    fn collection_literal(&mut self, bracket: Token) -> Result<UExpr> {
        if self.matches(TokenType::RIGHT_BRACKET) {
            return Ok(Expr::List {
                bracket,
                elements: Vec::new(),
            });
        }

        if self.matches(TokenType::COLON) {
            self.consume(TokenType::RIGHT_BRACKET, "Expect ']' after '[:'.")?;

            return Ok(Expr::Dictionary {
                bracket,
                entries: Vec::new(),
            });
        }

        let first = self.expression()?;

        if self.matches(TokenType::COLON) {
            let mut entries = vec![(first, self.expression()?)];

            while self.matches(TokenType::COMMA) {
                if self.check(TokenType::RIGHT_BRACKET) {
                    break;
                }

                let key = self.expression()?;
                self.consume(TokenType::COLON, "Expect ':' after dictionary key.")?;
                entries.push((key, self.expression()?));
            }

            self.consume(TokenType::RIGHT_BRACKET, "Expect ']' after dictionary entries.")?;

            return Ok(Expr::Dictionary { bracket, entries });
        }

        let mut elements = vec![first];

        while self.matches(TokenType::COMMA) {
            if self.check(TokenType::RIGHT_BRACKET) {
                break;
            }

            elements.push(self.expression()?);
        }

        self.consume(TokenType::RIGHT_BRACKET, "Expect ']' after list elements.")?;

        Ok(Expr::List { bracket, elements })
    }

    // ────────────────────── utility helpers ───────────────────────

    #[inline(always)]
    fn matches(&mut self, ttype: TokenType) -> bool {
        if self.check(ttype) {
            self.advance();

            return true;
        }

        false
    }

    #[inline(always)]
    fn consume(&mut self, ttype: TokenType, message: &str) -> Result<Token> {
        if self.check(ttype) {
            return Ok(self.advance().clone());
        }

        Err(LoxError::parse(self.peek(), message))
    }

    #[inline(always)]
    fn check(&self, ttype: TokenType) -> bool {
        if self.is_at_end() {
            return false;
        }

        self.peek().token_type == ttype
    }

    fn check_next(&self, ttype: TokenType) -> bool {
        match self.tokens.get(self.current + 1) {
            Some(token) => token.token_type == ttype,
            None => false,
        }
    }

    #[inline(always)]
    fn advance(&mut self) -> &Token {
        if !self.is_at_end() {
            self.current += 1;
        }

        self.previous()
    }

    #[inline(always)]
    fn is_at_end(&self) -> bool {
        matches!(self.peek().token_type, TokenType::EOF)
    }

    #[inline(always)]
    fn peek(&self) -> &Token {
        &self.tokens[self.current]
    }

    #[inline(always)]
    fn previous(&self) -> &Token {
        &self.tokens[self.current.saturating_sub(1)]
    }
}
