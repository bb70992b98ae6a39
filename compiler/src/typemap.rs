use std::collections::HashMap;

use koinos_reflect_schema::{BaseType, Decl, EnumClass, Fqn, Struct, Toplevel, Typedef};
use tracing::{debug, trace};

use crate::{
    error::ReflectError,
    utils::{fq_name, quote},
    walker::{visit, NamespaceStack},
};

/// Insertion-ordered set of every fully-qualified name declared in a
/// compilation unit.
#[derive(Debug, Default, Clone)]
pub struct SymbolTable {
    names: Vec<Fqn>,
    index: HashMap<Fqn, usize>,
}

impl SymbolTable {
    pub fn new() -> Self {
        SymbolTable::default()
    }

    pub fn insert(&mut self, name: Fqn) -> Result<(), ReflectError> {
        if self.index.contains_key(&name) {
            return Err(ReflectError::AnalyzeError(format!(
                "multiple definition of {}",
                quote(&fq_name(&name))
            )));
        }
        trace!(name = %fq_name(&name), "declared");
        self.index.insert(name.clone(), self.names.len());
        self.names.push(name);
        Ok(())
    }

    pub fn contains(&self, name: &[String]) -> bool {
        self.index.contains_key(name)
    }

    pub fn names(&self) -> &[Fqn] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// Records every struct, enum class, typedef and base type under its
/// fully-qualified name. Base types carry their full name explicitly and
/// ignore the enclosing namespaces.
#[derive(Debug, Default)]
pub struct TypemapBuilder {
    scope:   NamespaceStack,
    symbols: SymbolTable,
}

impl TypemapBuilder {
    pub fn new() -> Self {
        TypemapBuilder::default()
    }

    pub fn build(tree: &Toplevel) -> Result<SymbolTable, ReflectError> {
        let mut builder = TypemapBuilder::new();
        visit::walk_toplevel(&mut builder, tree)?;
        debug!(decls = builder.symbols.len(), "built typemap");
        Ok(builder.symbols)
    }
}

impl visit::Listener for TypemapBuilder {
    fn scope(&mut self) -> Option<&mut NamespaceStack> {
        Some(&mut self.scope)
    }

    fn enter_base_type(&mut self, node: &BaseType) -> Result<(), ReflectError> {
        self.symbols.insert(node.name.clone())
    }

    fn enter_typedef(&mut self, node: &Typedef) -> Result<(), ReflectError> {
        self.symbols.insert(self.scope.qualify(&node.name))
    }

    fn enter_struct(&mut self, node: &Struct) -> Result<(), ReflectError> {
        self.symbols.insert(self.scope.qualify(&node.name))
    }

    fn enter_enum_class(&mut self, node: &EnumClass) -> Result<(), ReflectError> {
        self.symbols.insert(self.scope.qualify(&node.name))
    }
}

/// Fully-qualified names bound to the declarations that define them, in
/// declaration order until [`crate::sorter::sort_typemap`] reorders them.
#[derive(Debug, Clone, PartialEq)]
pub struct Typemap {
    entries: Vec<(Fqn, Decl)>,
}

impl Typemap {
    /// Moves the declarations out of `tree` and pairs each with the name the
    /// builder recorded for it. Both sides enumerate declarations in the same
    /// pre-order, namespaces excluded.
    pub fn bind(symbols: &SymbolTable, tree: Toplevel) -> Result<Typemap, ReflectError> {
        let decls = tree.into_declarations();
        if decls.len() != symbols.len() {
            return Err(ReflectError::AnalyzeError(format!(
                "typemap has {} names for {} declarations",
                symbols.len(),
                decls.len()
            )));
        }
        let entries = symbols.names().iter().cloned().zip(decls).collect();
        Ok(Typemap { entries })
    }

    pub fn from_entries(entries: Vec<(Fqn, Decl)>) -> Self {
        Typemap { entries }
    }

    pub fn entries(&self) -> &[(Fqn, Decl)] {
        &self.entries
    }

    pub fn into_entries(self) -> Vec<(Fqn, Decl)> {
        self.entries
    }

    pub fn get(&self, name: &[String]) -> Option<&Decl> {
        self.entries
            .iter()
            .find(|(fqn, _)| fqn.as_slice() == name)
            .map(|(_, decl)| decl)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
