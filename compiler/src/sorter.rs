use std::collections::HashMap;

use koinos_reflect_schema::{Decl, Fqn, Typeref};
use tracing::debug;

use crate::{
    error::ReflectError,
    typemap::Typemap,
    utils::{fq_name, quote},
    walker::visit,
};

/// Default bound on dependency-chain recursion while sorting.
pub const DEFAULT_MAX_SORT_DEPTH: usize = 20;

/// Collects the distinct type names referenced anywhere below a node, in
/// first-seen order.
#[derive(Debug, Default)]
pub struct DependencyCollector {
    deps: Vec<Fqn>,
}

impl visit::Listener for DependencyCollector {
    fn enter_typeref(&mut self, node: &Typeref) -> Result<(), ReflectError> {
        if !self.deps.contains(&node.name) {
            self.deps.push(node.name.clone());
        }
        Ok(())
    }
}

/// Immediate dependencies of a declaration.
pub fn immediate_deps(decl: &Decl) -> Result<Vec<Fqn>, ReflectError> {
    let mut collector = DependencyCollector::default();
    visit::walk_decl(&mut collector, decl)?;
    Ok(collector.deps)
}

struct TopoSort<'a> {
    deps:      Vec<Vec<usize>>,
    names:     &'a [(Fqn, Decl)],
    emitted:   Vec<bool>,
    order:     Vec<usize>,
    max_depth: usize,
}

impl TopoSort<'_> {
    fn visit(&mut self, item: usize, depth: usize) -> Result<(), ReflectError> {
        if depth > self.max_depth {
            return Err(ReflectError::AnalyzeError(format!(
                "topological sort depth exceeded on {}",
                quote(&fq_name(&self.names[item].0))
            )));
        }
        for i in 0..self.deps[item].len() {
            let dep = self.deps[item][i];
            if !self.emitted[dep] {
                self.visit(dep, depth + 1)?;
            }
        }
        if !self.emitted[item] {
            self.emitted[item] = true;
            self.order.push(item);
        }
        Ok(())
    }
}

/// Reorders the typemap so every declaration follows everything it
/// references. Independent declarations keep their original relative order.
///
/// Cycles are caught by bounding recursion at `max_depth`; a legitimate chain
/// longer than that is rejected the same way.
pub fn sort_typemap(typemap: Typemap, max_depth: usize) -> Result<Typemap, ReflectError> {
    let entries = typemap.into_entries();

    let index: HashMap<&[String], usize> = entries
        .iter()
        .enumerate()
        .map(|(i, (fqn, _))| (fqn.as_slice(), i))
        .collect();

    let mut deps = Vec::with_capacity(entries.len());
    for (fqn, decl) in &entries {
        let mut targets = Vec::new();
        for dep in immediate_deps(decl)? {
            match index.get(dep.as_slice()) {
                Some(&i) => targets.push(i),
                None => {
                    return Err(ReflectError::AnalyzeError(format!(
                        "unknown type {} referenced from {}",
                        quote(&fq_name(&dep)),
                        quote(&fq_name(fqn))
                    )))
                }
            }
        }
        deps.push(targets);
    }

    let order = {
        let mut sort = TopoSort {
            deps,
            names:     &entries,
            emitted:   vec![false; entries.len()],
            order:     Vec::with_capacity(entries.len()),
            max_depth,
        };
        for item in 0..entries.len() {
            if !sort.emitted[item] {
                sort.visit(item, 0)?;
            }
        }
        sort.order
    };

    let mut slots: Vec<Option<(Fqn, Decl)>> = entries.into_iter().map(Some).collect();
    let sorted: Vec<(Fqn, Decl)> = order.into_iter().filter_map(|i| slots[i].take()).collect();
    debug!(
        order = %sorted.iter().map(|(fqn, _)| fq_name(fqn)).collect::<Vec<_>>().join(", "),
        "sorted typemap"
    );
    Ok(Typemap::from_entries(sorted))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{parser::parse, resolver::ReferenceChecker, typemap::TypemapBuilder};

    fn typemap(text: &str) -> Typemap {
        let mut tree = parse(text).unwrap();
        let symbols = TypemapBuilder::build(&tree).unwrap();
        ReferenceChecker::check(&symbols, &mut tree).unwrap();
        Typemap::bind(&symbols, tree).unwrap()
    }

    fn sorted_names(text: &str) -> Result<Vec<String>, ReflectError> {
        let sorted = sort_typemap(typemap(text), DEFAULT_MAX_SORT_DEPTH)?;
        Ok(sorted.entries().iter().map(|(fqn, _)| fq_name(fqn)).collect())
    }

    #[test]
    fn test_immediate_deps_dedup_first_seen() {
        let map = typemap(
            "KOINOS_BASETYPE(u8) KOINOS_BASETYPE(vector) KOINOS_BASETYPE(fixed)\n\
             struct S { vector<u8> a; u8 b; fixed<vector<u8>, 4> c; };",
        );
        let deps = immediate_deps(map.get(&["S".to_string()]).unwrap()).unwrap();
        let deps: Vec<_> = deps.iter().map(|d| fq_name(d)).collect();
        assert_eq!(deps, vec!["vector", "u8", "fixed"]);
    }

    #[test]
    fn test_base_type_has_no_deps() {
        let map = typemap("KOINOS_BASETYPE(u8)");
        assert!(immediate_deps(&map.entries()[0].1).unwrap().is_empty());
    }

    #[test]
    fn test_dependencies_come_first() {
        let names = sorted_names(
            "struct Outer { Inner i; Leaf l; };\n\
             struct Inner { Leaf l; };\n\
             KOINOS_BASETYPE(Leaf)",
        )
        .unwrap();
        assert_eq!(names, vec!["Leaf", "Inner", "Outer"]);
    }

    #[test]
    fn test_independent_items_keep_order() {
        let names = sorted_names("KOINOS_BASETYPE(c) KOINOS_BASETYPE(a) KOINOS_BASETYPE(b)").unwrap();
        assert_eq!(names, vec!["c", "a", "b"]);
    }

    #[test]
    fn test_mutual_recursion_rejected() {
        let err = sorted_names("struct A { B b; }; struct B { A a; };").unwrap_err();
        match err {
            ReflectError::AnalyzeError(msg) => {
                assert!(msg.starts_with("topological sort depth exceeded on"), "{}", msg)
            }
            other => panic!("expected an AnalyzeError but got {:?}", other),
        }
    }

    #[test]
    fn test_self_reference_rejected() {
        let err = sorted_names("KOINOS_BASETYPE(vector) struct Node { vector<Node> children; };").unwrap_err();
        assert!(matches!(err, ReflectError::AnalyzeError(_)));
    }

    #[test]
    fn test_depth_bound_is_configurable() {
        let mut text = String::new();
        for i in (1..=5).rev() {
            text.push_str(&format!("typedef t{} t{};\n", i - 1, i));
        }
        text.push_str("KOINOS_BASETYPE(t0)\n");
        let map = typemap(&text);
        assert!(sort_typemap(map.clone(), 5).is_ok());
        assert!(sort_typemap(map, 4).is_err());
    }

    #[test]
    fn test_reversed_chain_sorted() {
        let mut text = String::new();
        for i in (1..=5).rev() {
            text.push_str(&format!("typedef t{} t{};\n", i - 1, i));
        }
        text.push_str("KOINOS_BASETYPE(t0)\n");
        assert_eq!(sorted_names(&text).unwrap(), vec!["t0", "t1", "t2", "t3", "t4", "t5"]);
    }
}
