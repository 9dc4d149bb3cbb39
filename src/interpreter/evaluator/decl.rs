use std::{io::Write, rc::Rc};

use crate::{
    ast::{FnDecl, PatDecl, Stmt, VarDecl},
    interpreter::{
        env::{Closure, Env, EnvRef},
        evaluator::core::{EvalResult, Flow, Interp, flow_value},
        value::core::{FunctionValue, ModuleValue, Value},
        value::patdef::PatDef,
    },
};

impl<W: Write> Interp<'_, W> {
    /// Binds a function value — declaration, closure environment and name —
    /// under the function's name. Declarations evaluate to null.
    pub(crate) fn eval_fn_decl(&mut self, decl: &Rc<FnDecl>, env: &EnvRef) -> EvalResult<Flow> {
        let func = FunctionValue { decl:    Rc::clone(decl),
                                   closure: Closure::Env(Rc::clone(env)),
                                   name:    decl.name.clone(), };
        env.define(&decl.name, Value::Function(Rc::new(func)));
        Ok(Flow::Normal(Value::Null))
    }

    /// Binds a variable in the current frame: the initializer's value, or
    /// null without one.
    pub(crate) fn eval_var_decl(&mut self, decl: &VarDecl, env: &EnvRef) -> EvalResult<Flow> {
        let value = match &decl.init {
            Some(init) => flow_value!(self.eval_expr(init, env)?),
            None => Value::Null,
        };
        env.define(&decl.name, value);
        Ok(Flow::Normal(Value::Null))
    }

    /// Evaluates a pattern declaration.
    ///
    /// The `var` declarations of the body become the pattern's fields, in
    /// order. A pattern scope parented to the globals is created holding
    /// `__name__` and one function value per `fn` child; those methods
    /// capture the scope weakly — the module value owns it, which keeps the
    /// module→method→scope chain from becoming a cycle. The scope is wrapped
    /// in a module value carrying the `PatDef` and bound under the pattern
    /// name; calling that module instantiates the pattern.
    pub(crate) fn eval_pat_decl(&mut self, decl: &PatDecl, env: &EnvRef) -> EvalResult<Flow> {
        let body = decl.body.as_deref().unwrap_or(&[]);

        let field_names: Vec<String> = body.iter()
                                           .filter_map(|stmt| match stmt {
                                               Stmt::Var(var) => Some(var.name.clone()),
                                               _ => None,
                                           })
                                           .collect();
        let def = Rc::new(PatDef::new(decl.name.clone(), field_names));

        let pat_env = Env::with_parent(&self.globals);
        pat_env.define("__name__", Value::from(decl.name.as_str()));
        for stmt in body {
            if let Stmt::Fn(method) = stmt {
                let func = FunctionValue { decl:    Rc::clone(method),
                                           closure: Closure::Method(Rc::downgrade(&pat_env)),
                                           name:    method.name.clone(), };
                pat_env.define(&method.name, Value::Function(Rc::new(func)));
            }
        }

        let module = ModuleValue { name:   decl.name.clone(),
                                   env:    pat_env,
                                   patdef: Some(def), };
        env.define(&decl.name, Value::Module(Rc::new(module)));
        Ok(Flow::Normal(Value::Null))
    }
}
