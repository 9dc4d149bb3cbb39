use std::io::Write;

use crate::{
    ast::Expr,
    error::RuntimeError,
    interpreter::{
        env::EnvRef,
        evaluator::core::{EvalResult, Flow, Interp, flow_value},
        lexer::Pos,
        value::core::Value,
    },
};

impl<W: Write> Interp<'_, W> {
    /// Evaluates member access `object.field`.
    ///
    /// Pattern instances expose their fields, scopes and modules expose
    /// their environment bindings, named tuples expose their elements, and
    /// type values answer `name`, `is_pat` and `fields`.
    pub(crate) fn eval_member(&mut self,
                              object: &Expr,
                              field: &str,
                              pos: Pos,
                              env: &EnvRef)
                              -> EvalResult<Flow> {
        let object = flow_value!(self.eval_expr(object, env)?);

        match &object {
            Value::PatInstance(inst) => {
                if let Some(index) = inst.def.field_index(field) {
                    return Ok(Flow::Normal(inst.fields.borrow()[index].clone()));
                }
            },
            Value::Scope(scope) => {
                if let Some(value) = scope.get(field) {
                    return Ok(Flow::Normal(value));
                }
            },
            Value::Module(module) => {
                if let Some(value) = module.env.get(field) {
                    return Ok(Flow::Normal(value));
                }
            },
            Value::Tuple(tuple) => {
                if let Some(index) = tuple.name_index(field) {
                    return Ok(Flow::Normal(tuple.elems[index].clone()));
                }
            },
            Value::Type(ty) => match field {
                "name" => return Ok(Flow::Normal(Value::from(ty.name.as_str()))),
                "is_pat" => return Ok(Flow::Normal(Value::Bool(ty.patdef.is_some()))),
                "fields" => {
                    let fields = ty.patdef.as_ref().map_or_else(
                        || Value::tuple(Vec::new()),
                        |def| {
                            let elems =
                                def.field_names.iter().map(|n| Value::from(n.as_str())).collect();
                            Value::named_tuple(elems, def.field_names.clone())
                        },
                    );
                    return Ok(Flow::Normal(fields));
                },
                _ => {},
            },
            _ => {},
        }

        Err(RuntimeError::NoSuchMember { name: field.to_string(), pos })
    }

    /// Evaluates index access `object[index]`.
    ///
    /// Tuples index by integer; a negative index wraps once from the end.
    pub(crate) fn eval_index(&mut self,
                             object: &Expr,
                             index: &Expr,
                             pos: Pos,
                             env: &EnvRef)
                             -> EvalResult<Flow> {
        let object = flow_value!(self.eval_expr(object, env)?);
        let index = flow_value!(self.eval_expr(index, env)?);

        if let (Value::Tuple(tuple), Value::Int(i)) = (&object, &index) {
            let mut i = *i;
            if i < 0 {
                i += tuple.elems.len() as i64;
            }
            let Ok(i) = usize::try_from(i) else {
                return Err(RuntimeError::IndexOutOfRange { pos });
            };
            return match tuple.elems.get(i) {
                Some(value) => Ok(Flow::Normal(value.clone())),
                None => Err(RuntimeError::IndexOutOfRange { pos }),
            };
        }
        Err(RuntimeError::IndexUnsupported { pos })
    }

    /// Evaluates an assignment expression. The right-hand side evaluates
    /// first; the target must be an identifier, a member access on a pattern
    /// instance / scope / module, or an index (unsupported for now). The
    /// assignment's value is the assigned value.
    pub(crate) fn eval_assign(&mut self,
                              target: &Expr,
                              value: &Expr,
                              pos: Pos,
                              env: &EnvRef)
                              -> EvalResult<Flow> {
        let rhs = flow_value!(self.eval_expr(value, env)?);

        match target {
            Expr::Ident { name, .. } => {
                env.assign(name, rhs.clone());
                Ok(Flow::Normal(rhs))
            },
            Expr::Member { object, field, pos: member_pos } => {
                let object = flow_value!(self.eval_expr(object, env)?);
                match &object {
                    Value::PatInstance(inst) => {
                        if let Some(index) = inst.def.field_index(field) {
                            inst.fields.borrow_mut()[index] = rhs.clone();
                            return Ok(Flow::Normal(rhs));
                        }
                        Err(RuntimeError::CannotAssignMember { pos: *member_pos })
                    },
                    Value::Scope(scope) => {
                        scope.assign(field, rhs.clone());
                        Ok(Flow::Normal(rhs))
                    },
                    Value::Module(module) => {
                        module.env.assign(field, rhs.clone());
                        Ok(Flow::Normal(rhs))
                    },
                    _ => Err(RuntimeError::CannotAssignMember { pos: *member_pos }),
                }
            },
            Expr::Index { .. } => Err(RuntimeError::IndexAssignUnsupported { pos }),
            _ => Err(RuntimeError::InvalidAssignTarget { pos }),
        }
    }
}
