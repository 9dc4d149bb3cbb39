use std::{fs, io::Write, path::Path, rc::Rc};

use crate::{
    ast::ImportDecl,
    interpreter::{
        env::{Env, EnvRef},
        evaluator::core::{EvalResult, Flow, Interp},
        lexer::tokenize,
        parser::core::parse_program,
        value::core::{ModuleValue, Value},
    },
};

impl<W: Write> Interp<'_, W> {
    /// Resolves an `import` declaration.
    ///
    /// The dotted module path maps to a `.lang` file under the module root
    /// (`a.b.c` → `a/b/c.lang`). The module loads once and is cached by
    /// path. Without `of` items the module value binds under its alias (or
    /// the dotted path); with items, each listed name is looked up in the
    /// module environment and bound under its alias. Missing files and
    /// failed module runs report to stderr and bind a null module, so the
    /// importing file keeps going.
    pub(crate) fn resolve_import(&mut self, decl: &ImportDecl, env: &EnvRef) -> EvalResult<Flow> {
        let mut relative = decl.path.replace('.', "/");
        relative.push_str(".lang");
        let path = self.module_root.join(relative);

        let module = self.load_module(&path);

        if decl.items.is_empty() {
            let alias = decl.alias.as_deref().unwrap_or(&decl.path);
            env.define(alias, module);
        } else {
            for item in &decl.items {
                let value = match &module {
                    Value::Module(m) => m.env.get(&item.name),
                    _ => None,
                };
                if let Some(value) = value {
                    env.define(item.alias.as_deref().unwrap_or(&item.name), value);
                }
            }
        }

        Ok(Flow::Normal(Value::Null))
    }

    /// Loads and evaluates a module file, or returns the cached value.
    ///
    /// A fresh module environment parented to the globals runs the parsed
    /// program once; the environment is then wrapped in a module value named
    /// after the file stem. Any failure prints a diagnostic and produces
    /// null (which is not cached, so a later import retries).
    fn load_module(&mut self, path: &Path) -> Value {
        let key = path.to_string_lossy().into_owned();
        if let Some(module) = self.modules.get(&key) {
            return module.clone();
        }

        let Ok(source) = fs::read_to_string(path) else {
            eprintln!("Module not found: {}", path.display());
            return Value::Null;
        };

        let tokens = match tokenize(&source) {
            Ok(tokens) => tokens,
            Err(e) => {
                eprintln!("Parse error in module {}: {e}", path.display());
                return Value::Null;
            },
        };
        let program = match parse_program(&mut tokens.iter().peekable()) {
            Ok(program) => program,
            Err(e) => {
                eprintln!("Parse error in module {}: {e}", path.display());
                return Value::Null;
            },
        };

        let module_env = Env::with_parent(&self.globals);
        if let Err(e) = self.run_in(&program, &module_env) {
            eprintln!("Runtime error in module {}: {e}", path.display());
            return Value::Null;
        }

        let name = path.file_stem()
                       .map_or_else(|| "module".to_string(), |s| s.to_string_lossy().into_owned());
        let module = Value::Module(Rc::new(ModuleValue { name, env: module_env, patdef: None }));
        self.modules.insert(key, module.clone());
        module
    }
}
