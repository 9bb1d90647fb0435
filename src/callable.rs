use crate::ast::FunctionDecl;
use crate::class::LoxInstance;
use crate::environment::{EnvRef, Environment};
use crate::error::RuntimeError;
use crate::interpreter::{Flow, IResult, Interpreter};
use crate::value::Value;
use log::debug;
use std::cell::RefCell;
use std::rc::Rc;

/// Anything a call expression can invoke.
///
/// The interpreter checks `arity` against the argument count before
/// calling, so implementations may assume the two match.
pub trait Callable<'a> {
    fn arity(&self) -> usize;

    fn call(&self, interpreter: &mut Interpreter<'a>, arguments: Vec<Value<'a>>) -> IResult<Value<'a>>;
}

/// A function implemented by the host.
#[derive(Clone, Copy)]
pub struct NativeFunction<'a> {
    pub name: &'static str,
    pub arity: usize,
    pub func: fn(&[Value<'a>]) -> Value<'a>,
}

impl<'a> Callable<'a> for NativeFunction<'a> {
    fn arity(&self) -> usize {
        self.arity
    }

    fn call(&self, _interpreter: &mut Interpreter<'a>, arguments: Vec<Value<'a>>) -> IResult<Value<'a>> {
        debug!("Calling native function '{}'", self.name);
        Ok((self.func)(&arguments))
    }
}

/// A user-defined function or method together with its closure.
pub struct LoxFunction<'a> {
    declaration: &'a FunctionDecl<'a>,
    closure: EnvRef<'a>,
    is_initializer: bool,
}

impl<'a> LoxFunction<'a> {
    pub fn new(declaration: &'a FunctionDecl<'a>, closure: EnvRef<'a>, is_initializer: bool) -> Self {
        Self {
            declaration,
            closure,
            is_initializer,
        }
    }

    pub fn name(&self) -> &'a str {
        self.declaration.name.lexeme
    }

    /// A copy of this method whose closure additionally binds `this`.
    pub fn bind(&self, instance: Rc<RefCell<LoxInstance<'a>>>) -> LoxFunction<'a> {
        let environment = Environment::child_of(&self.closure);
        environment
            .borrow_mut()
            .define("this", Value::Instance(instance));

        LoxFunction {
            declaration: self.declaration,
            closure: environment,
            is_initializer: self.is_initializer,
        }
    }

    /// The `this` bound by [`bind`](Self::bind).
    fn bound_this(&self) -> IResult<Value<'a>> {
        self.closure
            .borrow()
            .get_at(0, "this")
            .ok_or_else(|| RuntimeError::UndefinedVariable {
                name: "this".to_string(),
                line: self.declaration.name.line,
            })
    }
}

impl<'a> Callable<'a> for LoxFunction<'a> {
    fn arity(&self) -> usize {
        self.declaration.params.len()
    }

    fn call(&self, interpreter: &mut Interpreter<'a>, arguments: Vec<Value<'a>>) -> IResult<Value<'a>> {
        debug!("Calling user-defined function '{}'", self.name());

        // Parameters live in a child of the closure, not of the caller's scope.
        let environment = Environment::child_of(&self.closure);
        {
            let mut scope = environment.borrow_mut();
            for (param, argument) in self.declaration.params.iter().zip(arguments) {
                scope.define(param.lexeme, argument);
            }
        }

        let declaration = self.declaration;
        let flow = interpreter.execute_block(&declaration.body, environment)?;

        if self.is_initializer {
            return self.bound_this();
        }

        match flow {
            Flow::Return(value) => Ok(value),
            Flow::Continue => Ok(Value::Nil),
        }
    }
}
