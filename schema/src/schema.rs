use serde::{Deserialize, Serialize};

use crate::ast::{Decl, Fqn};

/// The dependency-ordered list of declarations handed to code generators.
///
/// Every declaration appears after all declarations it references.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub struct Schema {
    pub decls: Vec<(Fqn, Decl)>,
}

impl Schema {
    pub fn new(decls: Vec<(Fqn, Decl)>) -> Self {
        Schema { decls }
    }

    pub fn len(&self) -> usize {
        self.decls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.decls.is_empty()
    }

    pub fn get(&self, name: &[String]) -> Option<&Decl> {
        self.decls
            .iter()
            .find(|(fqn, _)| fqn.as_slice() == name)
            .map(|(_, decl)| decl)
    }

    pub fn names(&self) -> impl Iterator<Item = &Fqn> {
        self.decls.iter().map(|(fqn, _)| fqn)
    }
}
