//! Static resolver pass.
//!
//! One walk over the tree that does three things:
//! 1. Builds lexical scopes (a stack of `HashMap<&str, bool>` tracking
//!    declared vs. defined names).
//! 2. Reports static errors (redeclaration, reading a local in its own
//!    initializer, misplaced `return`/`this`/`super`, self-inheritance).
//! 3. Records, for every binding use, how many scopes out its binding lives.
//!    Uses that are not recorded are globals.
//!
//! The pass stops at the first error; nothing has executed at that point.

use crate::ast::{Expr, ExprId, FunctionDecl, Stmt};
use crate::error::{LoxError, Result};
use crate::token::Token;
use log::{debug, info};
use std::collections::{HashMap, HashSet};

/// Resolver output: binding-use handle → scope distance.
pub type Locals = HashMap<ExprId, usize>;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum FunctionKind {
    None,
    Function,
    Method,
    Initializer,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum ClassKind {
    None,
    Class,
    Subclass,
}

pub struct Resolver<'a> {
    scopes: Vec<HashMap<&'a str, bool>>, // false = declared, true = defined
    globals: HashSet<&'a str>,
    locals: Locals,
    current_function: FunctionKind,
    current_class: ClassKind,
}

impl<'a> Resolver<'a> {
    /// `globals` are the names already bound in the global scope (natives).
    pub fn new(globals: impl IntoIterator<Item = &'a str>) -> Self {
        info!("Resolver instantiated");

        Resolver {
            scopes: Vec::new(),
            globals: globals.into_iter().collect(),
            locals: HashMap::new(),
            current_function: FunctionKind::None,
            current_class: ClassKind::None,
        }
    }

    /// Walk all top‑level statements and return the distance table.
    pub fn resolve(mut self, statements: &[Stmt<'a>]) -> Result<Locals> {
        info!(
            "Beginning resolve pass over {} statement(s)",
            statements.len()
        );

        self.resolve_stmts(statements)?;

        info!("Resolved {} local binding use(s)", self.locals.len());

        Ok(self.locals)
    }

    /// Resolve a lone top-level expression.
    pub fn resolve_expression(mut self, expr: &Expr<'a>) -> Result<Locals> {
        self.resolve_expr(expr)?;
        Ok(self.locals)
    }

    fn resolve_stmts(&mut self, statements: &[Stmt<'a>]) -> Result<()> {
        statements.iter().try_for_each(|stmt| self.resolve_stmt(stmt))
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Statements
    // ─────────────────────────────────────────────────────────────────────────

    fn resolve_stmt(&mut self, stmt: &Stmt<'a>) -> Result<()> {
        match stmt {
            Stmt::Block(statements) => {
                self.begin_scope();
                let result = self.resolve_stmts(statements);
                self.end_scope();
                result?;
            }

            Stmt::Var { name, initializer } => {
                self.declare(name)?;
                if let Some(expr) = initializer {
                    self.resolve_expr(expr)?;
                }
                self.define(name);
            }

            Stmt::Function(declaration) => {
                // Defined before the body so the function can call itself.
                self.declare(declaration.name)?;
                self.define(declaration.name);
                self.resolve_function(declaration, FunctionKind::Function)?;
            }

            Stmt::Class {
                name,
                superclass,
                methods,
            } => self.resolve_class(name, superclass.as_ref(), methods)?,

            Stmt::Expression(expr) | Stmt::Print(expr) => self.resolve_expr(expr)?,

            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => {
                self.resolve_expr(condition)?;
                self.resolve_stmt(then_branch)?;
                if let Some(else_branch) = else_branch {
                    self.resolve_stmt(else_branch)?;
                }
            }

            Stmt::While { condition, body } => {
                self.resolve_expr(condition)?;
                self.resolve_stmt(body)?;
            }

            Stmt::Return { keyword, value } => {
                if self.current_function == FunctionKind::None {
                    return Err(LoxError::resolve(
                        keyword.line,
                        "Can't return from top-level code.",
                    ));
                }

                if let Some(value) = value {
                    if self.current_function == FunctionKind::Initializer {
                        return Err(LoxError::resolve(
                            keyword.line,
                            "Can't return a value from an initializer.",
                        ));
                    }
                    self.resolve_expr(value)?;
                }
            }
        }

        Ok(())
    }

    fn resolve_class(
        &mut self,
        name: &Token<'a>,
        superclass: Option<&Expr<'a>>,
        methods: &[FunctionDecl<'a>],
    ) -> Result<()> {
        let enclosing_class = self.current_class;
        self.current_class = ClassKind::Class;

        self.declare(name)?;
        self.define(name);

        if let Some(superclass) = superclass {
            let Expr::Variable { name: super_name, .. } = superclass else {
                return Err(LoxError::resolve(name.line, "Superclass must be a class name."));
            };

            if super_name.lexeme == name.lexeme {
                return Err(LoxError::resolve(
                    super_name.line,
                    "A class can't inherit from itself.",
                ));
            }

            self.current_class = ClassKind::Subclass;
            self.resolve_expr(superclass)?;

            self.begin_scope();
            self.bind_implicit("super");
        }

        self.begin_scope();
        self.bind_implicit("this");

        let result = methods.iter().try_for_each(|method| {
            let kind = if method.name.lexeme == "init" {
                FunctionKind::Initializer
            } else {
                FunctionKind::Method
            };
            self.resolve_function(method, kind)
        });

        self.end_scope();
        if superclass.is_some() {
            self.end_scope();
        }

        self.current_class = enclosing_class;
        result
    }

    /// Resolve a function body in a fresh scope holding its parameters.
    fn resolve_function(&mut self, declaration: &FunctionDecl<'a>, kind: FunctionKind) -> Result<()> {
        let enclosing = self.current_function;
        self.current_function = kind;

        self.begin_scope();
        let result = declaration
            .params
            .iter()
            .try_for_each(|param| {
                self.declare(param)?;
                self.define(param);
                Ok(())
            })
            .and_then(|()| self.resolve_stmts(&declaration.body));
        self.end_scope();

        self.current_function = enclosing;
        result
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Expressions
    // ─────────────────────────────────────────────────────────────────────────

    fn resolve_expr(&mut self, expr: &Expr<'a>) -> Result<()> {
        match expr {
            Expr::Literal(_) => {}

            Expr::Grouping(inner) => self.resolve_expr(inner)?,

            Expr::Unary { right, .. } => self.resolve_expr(right)?,

            Expr::Binary { left, right, .. } | Expr::Logical { left, right, .. } => {
                self.resolve_expr(left)?;
                self.resolve_expr(right)?;
            }

            Expr::Variable { id, name } => {
                let in_initializer = self
                    .scopes
                    .last()
                    .and_then(|scope| scope.get(name.lexeme))
                    == Some(&false);

                if in_initializer {
                    self.resolve_shadowed(*id, name)?;
                } else {
                    self.resolve_local(*id, name);
                }
            }

            Expr::Assign { id, name, value } => {
                self.resolve_expr(value)?;
                self.resolve_local(*id, name);
            }

            Expr::Call {
                callee, arguments, ..
            } => {
                self.resolve_expr(callee)?;
                for argument in arguments {
                    self.resolve_expr(argument)?;
                }
            }

            Expr::Get { object, .. } => self.resolve_expr(object)?,

            Expr::Set { object, value, .. } => {
                self.resolve_expr(value)?;
                self.resolve_expr(object)?;
            }

            Expr::This { id, keyword } => {
                if self.current_class == ClassKind::None {
                    return Err(LoxError::resolve(
                        keyword.line,
                        "Can't use 'this' outside of a class.",
                    ));
                }
                self.resolve_local(*id, keyword);
            }

            Expr::Super { id, keyword, .. } => {
                match self.current_class {
                    ClassKind::None => {
                        return Err(LoxError::resolve(
                            keyword.line,
                            "Can't use 'super' outside of a class.",
                        ))
                    }
                    ClassKind::Class => {
                        return Err(LoxError::resolve(
                            keyword.line,
                            "Can't use 'super' in a class with no superclass.",
                        ))
                    }
                    ClassKind::Subclass => {}
                }
                self.resolve_local(*id, keyword);
            }
        }

        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Scope management
    // ─────────────────────────────────────────────────────────────────────────

    #[inline]
    fn begin_scope(&mut self) {
        self.scopes.push(HashMap::new());
    }

    #[inline]
    fn end_scope(&mut self) {
        self.scopes.pop();
    }

    fn declare(&mut self, name: &Token<'a>) -> Result<()> {
        let Some(scope) = self.scopes.last_mut() else {
            self.globals.insert(name.lexeme);
            return Ok(());
        };

        if scope.contains_key(name.lexeme) {
            return Err(LoxError::resolve(
                name.line,
                "Already a variable with this name in this scope.",
            ));
        }

        scope.insert(name.lexeme, false);
        Ok(())
    }

    fn define(&mut self, name: &Token<'a>) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(name.lexeme, true);
        }
    }

    fn bind_implicit(&mut self, name: &'static str) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(name, true);
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Binding distances
    // ─────────────────────────────────────────────────────────────────────────

    /// Records the distance of the innermost scope binding `name`, or
    /// nothing when no local scope does (a global).
    fn resolve_local(&mut self, id: ExprId, name: &Token<'a>) {
        match self.find(name.lexeme, 0) {
            Some(distance) => {
                debug!("Resolved '{}' at distance {}", name.lexeme, distance);
                self.locals.insert(id, distance);
            }
            None => debug!("Resolved '{}' as global", name.lexeme),
        }
    }

    /// A read of `name` inside its own initializer. It refers to the
    /// binding being shadowed, so that binding must exist.
    fn resolve_shadowed(&mut self, id: ExprId, name: &Token<'a>) -> Result<()> {
        if let Some(distance) = self.find(name.lexeme, 1) {
            debug!("Resolved shadowed '{}' at distance {}", name.lexeme, distance);
            self.locals.insert(id, distance);
            return Ok(());
        }

        if self.globals.contains(name.lexeme) {
            debug!("Resolved shadowed '{}' as global", name.lexeme);
            return Ok(());
        }

        Err(LoxError::resolve(
            name.line,
            "Can't read local variable in its own initializer.",
        ))
    }

    /// Distance to the innermost scope binding `name`, ignoring the
    /// `skip` innermost scopes.
    fn find(&self, name: &str, skip: usize) -> Option<usize> {
        self.scopes
            .iter()
            .rev()
            .enumerate()
            .skip(skip)
            .find(|(_, scope)| scope.contains_key(name))
            .map(|(distance, _)| distance)
    }
}
