use koinos_reflect_schema::{Fqn, Toplevel, Typeref};
use tracing::{debug, trace};

use crate::{
    error::ReflectError,
    typemap::SymbolTable,
    utils::{fq_name, quote},
    walker::{visit_mut, NamespaceStack},
};

/// Rewrites every type reference to the fully-qualified name it denotes.
///
/// A name written inside `a::b` is looked up as `a::b::name`, then
/// `a::name`, then `name`; the first hit wins.
pub struct ReferenceChecker<'t> {
    scope:    NamespaceStack,
    symbols:  &'t SymbolTable,
    resolved: usize,
}

impl<'t> ReferenceChecker<'t> {
    pub fn new(symbols: &'t SymbolTable) -> Self {
        ReferenceChecker {
            scope: NamespaceStack::new(),
            symbols,
            resolved: 0,
        }
    }

    pub fn check(symbols: &SymbolTable, tree: &mut Toplevel) -> Result<(), ReflectError> {
        let mut checker = ReferenceChecker::new(symbols);
        visit_mut::walk_toplevel(&mut checker, tree)?;
        debug!(typerefs = checker.resolved, "resolved references");
        Ok(())
    }

    /// Searches each enclosing scope, innermost first.
    pub fn search(&self, name: &[String]) -> Option<Fqn> {
        let mut ns = self.scope.path().to_vec();
        loop {
            let mut fqn = ns.clone();
            fqn.extend(name.iter().cloned());
            if self.symbols.contains(&fqn) {
                return Some(fqn);
            }
            if ns.pop().is_none() {
                return None;
            }
        }
    }
}

impl visit_mut::Listener for ReferenceChecker<'_> {
    fn scope(&mut self) -> Option<&mut NamespaceStack> {
        Some(&mut self.scope)
    }

    fn enter_typeref(&mut self, node: &mut Typeref) -> Result<(), ReflectError> {
        match self.search(&node.name) {
            Some(fqn) => {
                trace!(from = %fq_name(&node.name), to = %fq_name(&fqn), "resolved");
                node.name = fqn;
                self.resolved += 1;
                Ok(())
            }
            None => Err(ReflectError::AnalyzeError(format!(
                "unknown type {}",
                quote(&fq_name(&node.name))
            ))),
        }
    }
}
