use std::cell::RefCell;
use std::collections::HashMap;
use std::io::{self, Write};
use std::rc::Rc;

use chrono::Utc;
use log::{debug, info};

use crate::ast::{Expr, ExprId, LiteralValue, Stmt};
use crate::callable::{Callable, LoxFunction, NativeFunction};
use crate::class::{LoxClass, LoxInstance};
use crate::environment::{EnvRef, Environment};
use crate::error::{Result, RuntimeError};
use crate::resolver::{Locals, Resolver};
use crate::token::{Token, TokenKind};
use crate::value::Value;

/// Convenient alias for evaluation results.
pub type IResult<T> = std::result::Result<T, RuntimeError>;

/// How a statement finished: fell through, or hit `return`.
///
/// Blocks and loops stop at the first `Return` and hand it upward
/// unchanged; only a function call turns it back into a value.
#[derive(Debug)]
pub enum Flow<'a> {
    Continue,
    Return(Value<'a>),
}

pub struct Interpreter<'a> {
    globals: EnvRef<'a>,
    locals: Locals,
    out: Box<dyn Write + 'a>,
}

/// Seconds since the Unix epoch.
fn clock<'a>(_arguments: &[Value<'a>]) -> Value<'a> {
    Value::Number(Utc::now().timestamp_millis() as f64 / 1000.0)
}

impl<'a> Interpreter<'a> {
    /// An interpreter printing to stdout.
    pub fn new() -> Self {
        Self::with_output(Box::new(io::stdout()))
    }

    /// An interpreter printing to `out`; native functions such as `clock`
    /// are defined before any user code runs.
    pub fn with_output(out: Box<dyn Write + 'a>) -> Self {
        info!("Initializing Interpreter");

        let globals: EnvRef<'a> = Rc::new(RefCell::new(Environment::new()));

        debug!("Defining native function 'clock'");
        globals.borrow_mut().define(
            "clock",
            Value::Native(NativeFunction {
                name: "clock",
                arity: 0,
                func: clock,
            }),
        );

        Self {
            globals,
            locals: HashMap::new(),
            out,
        }
    }

    /// Resolves `statements`, then executes them against the globals.
    /// Nothing runs if resolution fails.
    pub fn run(&mut self, statements: &'a [Stmt<'a>]) -> Result<()> {
        let locals = Resolver::new(self.global_names()).resolve(statements)?;
        self.locals.extend(locals);

        self.interpret(statements)?;

        Ok(())
    }

    /// Resolves and evaluates a single expression in the global scope.
    pub fn evaluate_expression(&mut self, expr: &'a Expr<'a>) -> Result<Value<'a>> {
        let locals = Resolver::new(self.global_names()).resolve_expression(expr)?;
        self.locals.extend(locals);

        let globals = Rc::clone(&self.globals);
        Ok(self.evaluate(expr, &globals)?)
    }

    fn global_names(&self) -> Vec<&'a str> {
        let names = self.globals.borrow().names().collect();
        names
    }

    /// Executes already-resolved statements (a "program").
    pub fn interpret(&mut self, statements: &'a [Stmt<'a>]) -> IResult<()> {
        debug!("Interpreting {} statements", statements.len());

        let globals = Rc::clone(&self.globals);
        self.execute_statements(statements, &globals)?;

        self.out.flush().map_err(|e| RuntimeError::Output {
            message: e.to_string(),
            line: 0,
        })?;

        info!("Interpretation completed successfully");
        Ok(())
    }

    /// Runs `statements` in `environment`, which the caller has already
    /// created as a child of the right scope.
    pub fn execute_block(&mut self, statements: &'a [Stmt<'a>], environment: EnvRef<'a>) -> IResult<Flow<'a>> {
        self.execute_statements(statements, &environment)
    }

    fn execute_statements(&mut self, statements: &'a [Stmt<'a>], env: &EnvRef<'a>) -> IResult<Flow<'a>> {
        for stmt in statements {
            if let Flow::Return(value) = self.execute(stmt, env)? {
                return Ok(Flow::Return(value));
            }
        }

        Ok(Flow::Continue)
    }

    fn execute(&mut self, stmt: &'a Stmt<'a>, env: &EnvRef<'a>) -> IResult<Flow<'a>> {
        match stmt {
            Stmt::Expression(expr) => {
                self.evaluate(expr, env)?;
            }

            Stmt::Print(expr) => {
                let value = self.evaluate(expr, env)?;
                writeln!(self.out, "{}", value).map_err(|e| RuntimeError::Output {
                    message: e.to_string(),
                    line: expr_line(expr),
                })?;
                debug!("Printed value: {}", value);
            }

            Stmt::Var { name, initializer } => {
                let value = match initializer {
                    Some(expr) => self.evaluate(expr, env)?,
                    None => Value::Nil,
                };
                debug!("Defining variable '{}' = {}", name.lexeme, value);
                env.borrow_mut().define(name.lexeme, value);
            }

            Stmt::Block(statements) => {
                debug!("Entering block with {} statements", statements.len());
                return self.execute_block(statements, Environment::child_of(env));
            }

            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => {
                if self.evaluate(condition, env)?.is_truthy() {
                    return self.execute(then_branch, env);
                } else if let Some(else_branch) = else_branch {
                    return self.execute(else_branch, env);
                }
            }

            Stmt::While { condition, body } => {
                while self.evaluate(condition, env)?.is_truthy() {
                    if let Flow::Return(value) = self.execute(body, env)? {
                        return Ok(Flow::Return(value));
                    }
                }
            }

            Stmt::Function(declaration) => {
                debug!("Defining function '{}'", declaration.name.lexeme);
                let function = LoxFunction::new(declaration, Rc::clone(env), false);
                env.borrow_mut()
                    .define(declaration.name.lexeme, Value::Function(Rc::new(function)));
            }

            Stmt::Return { value, .. } => {
                let value = match value {
                    Some(expr) => self.evaluate(expr, env)?,
                    None => Value::Nil,
                };
                debug!("Returning value: {}", value);
                return Ok(Flow::Return(value));
            }

            Stmt::Class {
                name,
                superclass,
                methods,
            } => {
                debug!("Defining class '{}'", name.lexeme);

                // Bound first so methods can refer to their own class.
                env.borrow_mut().define(name.lexeme, Value::Nil);

                let superclass = match superclass {
                    Some(expr) => match self.evaluate(expr, env)? {
                        Value::Class(class) => Some(class),
                        _ => return Err(RuntimeError::SuperclassNotClass { line: expr_line(expr) }),
                    },
                    None => None,
                };

                let method_env = match &superclass {
                    Some(class) => {
                        let method_env = Environment::child_of(env);
                        method_env
                            .borrow_mut()
                            .define("super", Value::Class(Rc::clone(class)));
                        method_env
                    }
                    None => Rc::clone(env),
                };

                let methods = methods
                    .iter()
                    .map(|method| {
                        let is_initializer = method.name.lexeme == "init";
                        let function = LoxFunction::new(method, Rc::clone(&method_env), is_initializer);
                        (method.name.lexeme, function)
                    })
                    .collect();

                let class = LoxClass::new(name.lexeme, superclass, methods);
                env.borrow_mut()
                    .assign(name.lexeme, Value::Class(Rc::new(class)), name.line)?;
            }
        }

        Ok(Flow::Continue)
    }

    /// Evaluates an expression and returns a Value.
    pub fn evaluate(&mut self, expr: &'a Expr<'a>, env: &EnvRef<'a>) -> IResult<Value<'a>> {
        match expr {
            Expr::Literal(literal) => Ok(match literal {
                LiteralValue::Number(n) => Value::Number(*n),
                LiteralValue::Str(s) => Value::String(s.to_string()),
                LiteralValue::True => Value::Bool(true),
                LiteralValue::False => Value::Bool(false),
                LiteralValue::Nil => Value::Nil,
            }),

            Expr::Grouping(inner) => self.evaluate(inner, env),

            Expr::Unary { operator, right } => {
                let right = self.evaluate(right, env)?;

                match operator.kind {
                    TokenKind::Minus => match right {
                        Value::Number(n) => Ok(Value::Number(-n)),
                        _ => Err(RuntimeError::OperandNotNumber {
                            line: operator.line,
                        }),
                    },
                    _ => Ok(Value::Bool(!right.is_truthy())),
                }
            }

            Expr::Binary {
                left,
                operator,
                right,
            } => {
                let left = self.evaluate(left, env)?;
                let right = self.evaluate(right, env)?;
                binary(operator, left, right)
            }

            Expr::Logical {
                left,
                operator,
                right,
            } => {
                let left = self.evaluate(left, env)?;

                let short_circuits = match operator.kind {
                    TokenKind::Or => left.is_truthy(),
                    _ => !left.is_truthy(),
                };

                if short_circuits {
                    Ok(left)
                } else {
                    self.evaluate(right, env)
                }
            }

            Expr::Variable { id, name } => self.look_up_variable(*id, name, env),

            Expr::Assign { id, name, value } => {
                let value = self.evaluate(value, env)?;

                match self.locals.get(id) {
                    Some(&distance) => {
                        if !env
                            .borrow_mut()
                            .assign_at(distance, name.lexeme, value.clone())
                        {
                            return Err(undefined_variable(name));
                        }
                    }
                    None => self
                        .globals
                        .borrow_mut()
                        .assign(name.lexeme, value.clone(), name.line)?,
                }

                Ok(value)
            }

            Expr::Call {
                callee,
                paren,
                arguments,
            } => {
                let callee = self.evaluate(callee, env)?;

                let mut values = Vec::with_capacity(arguments.len());
                for argument in arguments {
                    values.push(self.evaluate(argument, env)?);
                }

                let callable = callee
                    .as_callable()
                    .ok_or(RuntimeError::NotCallable { line: paren.line })?;

                if values.len() != callable.arity() {
                    return Err(RuntimeError::ArityMismatch {
                        expected: callable.arity(),
                        got: values.len(),
                        line: paren.line,
                    });
                }

                callable.call(self, values)
            }

            Expr::Get { object, name } => match self.evaluate(object, env)? {
                Value::Instance(instance) => LoxInstance::get(&instance, name),
                _ => Err(RuntimeError::PropertyOnNonInstance { line: name.line }),
            },

            Expr::Set {
                object,
                name,
                value,
            } => {
                let Value::Instance(instance) = self.evaluate(object, env)? else {
                    return Err(RuntimeError::FieldOnNonInstance { line: name.line });
                };

                let value = self.evaluate(value, env)?;
                instance.borrow_mut().set(name.lexeme, value.clone());

                Ok(value)
            }

            Expr::This { id, keyword } => self.look_up_variable(*id, keyword, env),

            Expr::Super {
                id,
                keyword,
                method,
            } => {
                let distance = self
                    .locals
                    .get(id)
                    .copied()
                    .ok_or_else(|| undefined_variable(keyword))?;

                // `this` lives in the scope just inside the one holding `super`.
                let superclass = env.borrow().get_at(distance, "super");
                let object = distance
                    .checked_sub(1)
                    .and_then(|distance| env.borrow().get_at(distance, "this"));

                let (Some(Value::Class(superclass)), Some(Value::Instance(object))) = (superclass, object) else {
                    return Err(undefined_variable(keyword));
                };

                let method = superclass.find_method(method.lexeme).ok_or_else(|| {
                    RuntimeError::UndefinedProperty {
                        name: method.lexeme.to_string(),
                        line: method.line,
                    }
                })?;

                Ok(Value::Function(Rc::new(method.bind(object))))
            }
        }
    }

    /// Resolved uses read the scope the resolver picked; the rest are globals.
    fn look_up_variable(&self, id: ExprId, name: &Token<'a>, env: &EnvRef<'a>) -> IResult<Value<'a>> {
        match self.locals.get(&id) {
            Some(&distance) => {
                let value = env.borrow().get_at(distance, name.lexeme);
                value.ok_or_else(|| undefined_variable(name))
            }
            None => self.globals.borrow().get(name.lexeme, name.line),
        }
    }
}

impl Default for Interpreter<'_> {
    fn default() -> Self {
        Self::new()
    }
}

fn undefined_variable(name: &Token<'_>) -> RuntimeError {
    RuntimeError::UndefinedVariable {
        name: name.lexeme.to_string(),
        line: name.line,
    }
}

fn binary<'a>(operator: &Token<'a>, left: Value<'a>, right: Value<'a>) -> IResult<Value<'a>> {
    let line = operator.line;

    match operator.kind {
        TokenKind::EqualEqual => return Ok(Value::Bool(left == right)),
        TokenKind::BangEqual => return Ok(Value::Bool(left != right)),
        TokenKind::Plus => {
            return match (left, right) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a + b)),
                (Value::String(a), Value::String(b)) => Ok(Value::String(a + &b)),
                _ => Err(RuntimeError::OperandsNotAddable { line }),
            }
        }
        _ => {}
    }

    let (Value::Number(a), Value::Number(b)) = (left, right) else {
        return Err(RuntimeError::OperandsNotNumbers { line });
    };

    Ok(match operator.kind {
        TokenKind::Minus => Value::Number(a - b),
        TokenKind::Star => Value::Number(a * b),
        TokenKind::Slash => Value::Number(a / b),
        TokenKind::Greater => Value::Bool(a > b),
        TokenKind::GreaterEqual => Value::Bool(a >= b),
        TokenKind::Less => Value::Bool(a < b),
        TokenKind::LessEqual => Value::Bool(a <= b),
        _ => return Err(RuntimeError::OperandsNotNumbers { line }),
    })
}

/// Best-effort source line of an expression, for errors that have no
/// operator token of their own.
fn expr_line(expr: &Expr<'_>) -> usize {
    match expr {
        Expr::Literal(_) => 0,
        Expr::Grouping(inner) => expr_line(inner),
        Expr::Unary { operator, .. }
        | Expr::Binary { operator, .. }
        | Expr::Logical { operator, .. } => operator.line,
        Expr::Variable { name, .. }
        | Expr::Assign { name, .. }
        | Expr::Get { name, .. }
        | Expr::Set { name, .. } => name.line,
        Expr::Call { paren, .. } => paren.line,
        Expr::This { keyword, .. } | Expr::Super { keyword, .. } => keyword.line,
    }
}
