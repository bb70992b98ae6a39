//! Depth-first traversal of the AST.
//!
//! A pass implements [`visit::Listener`] (read-only) or [`visit_mut::Listener`]
//! (may rewrite nodes in place) and overrides only the hooks it needs. For
//! every node the driver calls `enter_*`, walks the children, then calls
//! `exit_*`, each exactly once. Any hook may abort the walk by returning an
//! error.
//!
//! [`NamespaceStack`] tracks the enclosing namespace path for passes that need
//! scope. A pass hands its stack to the driver through `Listener::scope`; the
//! driver pushes before `enter_namespace` and pops after `exit_namespace`.

use crate::error::ReflectError;

macro_rules! define_walker {
    ($(#[$attr:meta])* $module:ident $(, $m:tt)?) => {
        $(#[$attr])*
        pub mod $module {
            use koinos_reflect_schema::{
                BaseType, Decl, EnumClass, EnumEntry, Field, IntLiteral, Namespace, Struct,
                Targ, Toplevel, Typedef, Typeref,
            };

            use super::NamespaceStack;
            use crate::error::ReflectError;

            #[allow(unused_variables)]
            pub trait Listener {
                /// Scope kept up to date by the driver while walking namespaces.
                fn scope(&mut self) -> Option<&mut NamespaceStack> { None }

                fn enter_toplevel(&mut self, node: &$($m)? Toplevel) -> Result<(), ReflectError> { Ok(()) }
                fn exit_toplevel(&mut self, node: &$($m)? Toplevel) -> Result<(), ReflectError> { Ok(()) }
                fn enter_namespace(&mut self, node: &$($m)? Namespace) -> Result<(), ReflectError> { Ok(()) }
                fn exit_namespace(&mut self, node: &$($m)? Namespace) -> Result<(), ReflectError> { Ok(()) }
                fn enter_typedef(&mut self, node: &$($m)? Typedef) -> Result<(), ReflectError> { Ok(()) }
                fn exit_typedef(&mut self, node: &$($m)? Typedef) -> Result<(), ReflectError> { Ok(()) }
                fn enter_struct(&mut self, node: &$($m)? Struct) -> Result<(), ReflectError> { Ok(()) }
                fn exit_struct(&mut self, node: &$($m)? Struct) -> Result<(), ReflectError> { Ok(()) }
                fn enter_field(&mut self, node: &$($m)? Field) -> Result<(), ReflectError> { Ok(()) }
                fn exit_field(&mut self, node: &$($m)? Field) -> Result<(), ReflectError> { Ok(()) }
                fn enter_enum_class(&mut self, node: &$($m)? EnumClass) -> Result<(), ReflectError> { Ok(()) }
                fn exit_enum_class(&mut self, node: &$($m)? EnumClass) -> Result<(), ReflectError> { Ok(()) }
                fn enter_enum_entry(&mut self, node: &$($m)? EnumEntry) -> Result<(), ReflectError> { Ok(()) }
                fn exit_enum_entry(&mut self, node: &$($m)? EnumEntry) -> Result<(), ReflectError> { Ok(()) }
                fn enter_base_type(&mut self, node: &$($m)? BaseType) -> Result<(), ReflectError> { Ok(()) }
                fn exit_base_type(&mut self, node: &$($m)? BaseType) -> Result<(), ReflectError> { Ok(()) }
                fn enter_typeref(&mut self, node: &$($m)? Typeref) -> Result<(), ReflectError> { Ok(()) }
                fn exit_typeref(&mut self, node: &$($m)? Typeref) -> Result<(), ReflectError> { Ok(()) }
                fn enter_int_literal(&mut self, node: &$($m)? IntLiteral) -> Result<(), ReflectError> { Ok(()) }
                fn exit_int_literal(&mut self, node: &$($m)? IntLiteral) -> Result<(), ReflectError> { Ok(()) }
            }

            pub fn walk_toplevel<L: Listener + ?Sized>(listener: &mut L, node: &$($m)? Toplevel) -> Result<(), ReflectError> {
                listener.enter_toplevel(node)?;
                for decl in &$($m)? node.decls {
                    walk_decl(listener, decl)?;
                }
                listener.exit_toplevel(node)
            }

            pub fn walk_decl<L: Listener + ?Sized>(listener: &mut L, node: &$($m)? Decl) -> Result<(), ReflectError> {
                match node {
                    Decl::Namespace(ns) => walk_namespace(listener, ns),
                    Decl::Typedef(td)   => walk_typedef(listener, td),
                    Decl::Struct(st)    => walk_struct(listener, st),
                    Decl::EnumClass(ec) => walk_enum_class(listener, ec),
                    Decl::BaseType(bt)  => walk_base_type(listener, bt),
                }
            }

            pub fn walk_namespace<L: Listener + ?Sized>(listener: &mut L, node: &$($m)? Namespace) -> Result<(), ReflectError> {
                if let Some(scope) = listener.scope() {
                    scope.push(&node.name);
                }
                listener.enter_namespace(node)?;
                for decl in &$($m)? node.decls {
                    walk_decl(listener, decl)?;
                }
                listener.exit_namespace(node)?;
                match listener.scope() {
                    Some(scope) => scope.pop(&node.name),
                    None => Ok(()),
                }
            }

            pub fn walk_typedef<L: Listener + ?Sized>(listener: &mut L, node: &$($m)? Typedef) -> Result<(), ReflectError> {
                listener.enter_typedef(node)?;
                walk_typeref(listener, &$($m)? node.tref)?;
                listener.exit_typedef(node)
            }

            pub fn walk_struct<L: Listener + ?Sized>(listener: &mut L, node: &$($m)? Struct) -> Result<(), ReflectError> {
                listener.enter_struct(node)?;
                for field in &$($m)? node.fields {
                    walk_field(listener, field)?;
                }
                listener.exit_struct(node)
            }

            pub fn walk_field<L: Listener + ?Sized>(listener: &mut L, node: &$($m)? Field) -> Result<(), ReflectError> {
                listener.enter_field(node)?;
                walk_typeref(listener, &$($m)? node.tref)?;
                listener.exit_field(node)
            }

            pub fn walk_enum_class<L: Listener + ?Sized>(listener: &mut L, node: &$($m)? EnumClass) -> Result<(), ReflectError> {
                listener.enter_enum_class(node)?;
                for entry in &$($m)? node.entries {
                    listener.enter_enum_entry(entry)?;
                    listener.exit_enum_entry(entry)?;
                }
                listener.exit_enum_class(node)
            }

            pub fn walk_base_type<L: Listener + ?Sized>(listener: &mut L, node: &$($m)? BaseType) -> Result<(), ReflectError> {
                listener.enter_base_type(node)?;
                listener.exit_base_type(node)
            }

            pub fn walk_typeref<L: Listener + ?Sized>(listener: &mut L, node: &$($m)? Typeref) -> Result<(), ReflectError> {
                listener.enter_typeref(node)?;
                if let Some(targs) = &$($m)? node.targs {
                    for targ in targs {
                        match targ {
                            Targ::Typeref(tref) => walk_typeref(listener, tref)?,
                            Targ::IntLiteral(lit) => {
                                listener.enter_int_literal(lit)?;
                                listener.exit_int_literal(lit)?;
                            }
                        }
                    }
                }
                listener.exit_typeref(node)
            }
        }
    };
}

define_walker!(
    /// Read-only traversal.
    visit
);

define_walker!(
    /// Traversal that hands out mutable node references.
    visit_mut, mut
);

/// The namespace path enclosing the node currently being visited.
#[derive(Debug, Default, Clone)]
pub struct NamespaceStack {
    path: Vec<String>,
}

impl NamespaceStack {
    pub fn new() -> Self {
        NamespaceStack::default()
    }

    pub fn path(&self) -> &[String] {
        &self.path
    }

    pub fn push(&mut self, name: &str) {
        self.path.push(name.to_string());
    }

    /// Pops `name`; anything else on top means enter/exit calls were unbalanced.
    pub fn pop(&mut self, name: &str) -> Result<(), ReflectError> {
        match self.path.pop() {
            Some(top) if top == name => Ok(()),
            Some(top) => Err(ReflectError::AnalyzeError(format!(
                "walker protocol violation: leaving namespace `{}` while inside `{}`",
                name, top
            ))),
            None => Err(ReflectError::AnalyzeError(format!(
                "walker protocol violation: leaving namespace `{}` at global scope",
                name
            ))),
        }
    }

    /// `path + local`, the key a declaration named `local` gets in this scope.
    pub fn qualify(&self, local: &str) -> Vec<String> {
        let mut fqn = self.path.clone();
        fqn.push(local.to_string());
        fqn
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;
    use koinos_reflect_schema::{Namespace, Struct, Toplevel, Typeref};

    #[derive(Default)]
    struct Recorder {
        events: Vec<String>,
    }

    impl visit::Listener for Recorder {
        fn enter_namespace(&mut self, node: &Namespace) -> Result<(), ReflectError> {
            self.events.push(format!("+ns {}", node.name));
            Ok(())
        }
        fn exit_namespace(&mut self, node: &Namespace) -> Result<(), ReflectError> {
            self.events.push(format!("-ns {}", node.name));
            Ok(())
        }
        fn enter_struct(&mut self, node: &Struct) -> Result<(), ReflectError> {
            self.events.push(format!("+struct {}", node.name));
            Ok(())
        }
        fn exit_struct(&mut self, node: &Struct) -> Result<(), ReflectError> {
            self.events.push(format!("-struct {}", node.name));
            Ok(())
        }
        fn enter_typeref(&mut self, node: &Typeref) -> Result<(), ReflectError> {
            self.events.push(format!("+ref {}", node.name.join("::")));
            Ok(())
        }
        fn exit_typeref(&mut self, node: &Typeref) -> Result<(), ReflectError> {
            self.events.push(format!("-ref {}", node.name.join("::")));
            Ok(())
        }
    }

    #[test]
    fn test_enter_exit_bracket_children() {
        let tree = parse("namespace a { struct S { vector<b::c> x; }; }").unwrap();
        let mut recorder = Recorder::default();
        visit::walk_toplevel(&mut recorder, &tree).unwrap();
        assert_eq!(
            recorder.events,
            vec![
                "+ns a",
                "+struct S",
                "+ref vector",
                "+ref b::c",
                "-ref b::c",
                "-ref vector",
                "-struct S",
                "-ns a",
            ]
        );
    }

    struct Renamer;

    impl visit_mut::Listener for Renamer {
        fn enter_typeref(&mut self, node: &mut Typeref) -> Result<(), ReflectError> {
            node.name.insert(0, "root".to_string());
            Ok(())
        }
    }

    #[test]
    fn test_mutable_walk_rewrites_in_place() {
        let mut tree = parse("typedef vector<u8> bytes;").unwrap();
        visit_mut::walk_toplevel(&mut Renamer, &mut tree).unwrap();
        let json = serde_json::to_string(&tree).unwrap();
        assert!(json.contains(r#"["root","vector"]"#), "{}", json);
        assert!(json.contains(r#"["root","u8"]"#), "{}", json);
    }

    struct FailOnStruct;

    impl visit::Listener for FailOnStruct {
        fn enter_struct(&mut self, node: &Struct) -> Result<(), ReflectError> {
            Err(ReflectError::AnalyzeError(format!("stop at {}", node.name)))
        }
    }

    #[test]
    fn test_hook_error_aborts_walk() {
        let tree: Toplevel = parse("struct A {}; struct B {};").unwrap();
        let err = visit::walk_toplevel(&mut FailOnStruct, &tree).unwrap_err();
        assert!(matches!(err, ReflectError::AnalyzeError(ref m) if m == "stop at A"));
    }

    #[derive(Default)]
    struct QualifiedStructs {
        scope: NamespaceStack,
        seen:  Vec<String>,
    }

    impl visit::Listener for QualifiedStructs {
        fn scope(&mut self) -> Option<&mut NamespaceStack> {
            Some(&mut self.scope)
        }

        fn enter_struct(&mut self, node: &Struct) -> Result<(), ReflectError> {
            self.seen.push(self.scope.qualify(&node.name).join("::"));
            Ok(())
        }
    }

    #[test]
    fn test_driver_maintains_scope() {
        let tree = parse("struct A {}; namespace x { namespace y { struct B {}; } struct C {}; } struct D {};").unwrap();
        let mut pass = QualifiedStructs::default();
        visit::walk_toplevel(&mut pass, &tree).unwrap();
        assert_eq!(pass.seen, vec!["A", "x::y::B", "x::C", "D"]);
        assert!(pass.scope.path().is_empty());
    }

    struct EarlyPop {
        scope: NamespaceStack,
    }

    impl visit::Listener for EarlyPop {
        fn scope(&mut self) -> Option<&mut NamespaceStack> {
            Some(&mut self.scope)
        }

        fn exit_namespace(&mut self, node: &Namespace) -> Result<(), ReflectError> {
            self.scope.pop(&node.name)
        }
    }

    #[test]
    fn test_unbalanced_scope_is_protocol_violation() {
        let tree = parse("namespace a { namespace b {} }").unwrap();
        let mut pass = EarlyPop { scope: NamespaceStack::new() };
        let err = visit::walk_toplevel(&mut pass, &tree).unwrap_err();
        match err {
            ReflectError::AnalyzeError(msg) => assert!(msg.starts_with("walker protocol violation"), "{}", msg),
            other => panic!("expected an AnalyzeError but got {:?}", other),
        }
    }

    #[test]
    fn test_namespace_stack_detects_imbalance() {
        let mut stack = NamespaceStack::new();
        stack.push("a");
        stack.push("b");
        assert_eq!(stack.qualify("T"), vec!["a", "b", "T"]);
        assert!(stack.pop("a").is_err());

        let mut empty = NamespaceStack::new();
        assert!(matches!(empty.pop("a"), Err(ReflectError::AnalyzeError(_))));
    }
}
