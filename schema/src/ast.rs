use serde::{Deserialize, Serialize};

/// A fully-qualified name: namespace components followed by the local identifier.
pub type Fqn = Vec<String>;

/// Root of a compilation unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub struct Toplevel {
    pub decls: Vec<Decl>,
}

/// Any declaration that may appear at top level or inside a namespace.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Decl {
    Namespace(Namespace),
    Typedef(Typedef),
    Struct(Struct),
    EnumClass(EnumClass),
    BaseType(BaseType),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Namespace {
    pub name:  String,
    pub decls: Vec<Decl>,
    pub doc:   String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Typedef {
    pub name: String,
    pub tref: Typeref,
    pub doc:  String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Struct {
    pub name:   String,
    pub fields: Vec<Field>,
    pub doc:    String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub struct Field {
    pub name: String,
    pub tref: Typeref,
    pub doc:  String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnumClass {
    pub name:    String,
    pub entries: Vec<EnumEntry>,
    pub doc:     String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub struct EnumEntry {
    pub name:  String,
    pub value: u64,
    pub doc:   String,
}

/// An opaque type supplied by the target runtime. Its name is always written
/// fully qualified, wherever the declaration appears.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BaseType {
    pub name: Fqn,
    pub doc:  String,
}

/// A reference to a named type, optionally with template arguments.
///
/// `targs` is `None` when no `<...>` was written and `Some(vec![])` for an
/// explicit `<>`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub struct Typeref {
    pub name:  Fqn,
    pub targs: Option<Vec<Targ>>,
}

/// A template argument. Both alternatives carry their own `"type"` tag, so the
/// enum itself is encoded untagged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Targ {
    Typeref(Typeref),
    IntLiteral(IntLiteral),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub struct IntLiteral {
    pub value: u64,
}

impl Decl {
    /// Local name of the declaration. Base types report their last component.
    pub fn name(&self) -> &str {
        match self {
            Decl::Namespace(ns) => &ns.name,
            Decl::Typedef(td)   => &td.name,
            Decl::Struct(st)    => &st.name,
            Decl::EnumClass(ec) => &ec.name,
            Decl::BaseType(bt)  => bt.name.last().map(String::as_str).unwrap_or(""),
        }
    }

    pub fn doc(&self) -> &str {
        match self {
            Decl::Namespace(ns) => &ns.doc,
            Decl::Typedef(td)   => &td.doc,
            Decl::Struct(st)    => &st.doc,
            Decl::EnumClass(ec) => &ec.doc,
            Decl::BaseType(bt)  => &bt.doc,
        }
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            Decl::Namespace(_) => "Namespace",
            Decl::Typedef(_)   => "Typedef",
            Decl::Struct(_)    => "Struct",
            Decl::EnumClass(_) => "EnumClass",
            Decl::BaseType(_)  => "BaseType",
        }
    }
}

impl Toplevel {
    /// Moves every non-namespace declaration out of the tree, in pre-order.
    /// Namespaces are dissolved; their members are yielded in place.
    pub fn into_declarations(self) -> Vec<Decl> {
        fn flatten(decls: Vec<Decl>, out: &mut Vec<Decl>) {
            for decl in decls {
                match decl {
                    Decl::Namespace(ns) => flatten(ns.decls, out),
                    other => out.push(other),
                }
            }
        }

        let mut out = Vec::new();
        flatten(self.decls, &mut out);
        out
    }
}

impl Typeref {
    pub fn new<S: Into<String>>(name: impl IntoIterator<Item = S>) -> Self {
        Typeref {
            name:  name.into_iter().map(Into::into).collect(),
            targs: None,
        }
    }

    pub fn with_targs(mut self, targs: Vec<Targ>) -> Self {
        self.targs = Some(targs);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_into_declarations_flattens_namespaces() {
        let tree = Toplevel {
            decls: vec![
                Decl::BaseType(BaseType { name: vec!["uint32".into()], doc: String::new() }),
                Decl::Namespace(Namespace {
                    name:  "a".into(),
                    decls: vec![Decl::Struct(Struct { name: "S".into(), fields: vec![], doc: String::new() })],
                    doc:   String::new(),
                }),
            ],
        };

        let names: Vec<_> = tree.into_declarations().iter().map(|d| d.name().to_string()).collect();
        assert_eq!(names, vec!["uint32", "S"]);
    }

    #[test]
    fn test_nodes_carry_type_tags() {
        let decl = Decl::Typedef(Typedef {
            name: "blob".into(),
            tref: Typeref::new(["vector"]).with_targs(vec![
                Targ::Typeref(Typeref::new(["uint8"])),
                Targ::IntLiteral(IntLiteral { value: 4 }),
            ]),
            doc:  String::new(),
        });

        let json = serde_json::to_value(&decl).unwrap();
        assert_eq!(json["type"], "Typedef");
        assert_eq!(json["tref"]["type"], "Typeref");
        assert_eq!(json["tref"]["targs"][0]["type"], "Typeref");
        assert_eq!(json["tref"]["targs"][1]["type"], "IntLiteral");
        assert_eq!(json["tref"]["targs"][1]["value"], 4);
    }

    #[test]
    fn test_absent_and_empty_targs_stay_distinct() {
        let absent = Typeref::new(["a"]);
        let empty  = Typeref::new(["a"]).with_targs(vec![]);

        let absent_json = serde_json::to_string(&absent).unwrap();
        let empty_json  = serde_json::to_string(&empty).unwrap();
        assert_ne!(absent_json, empty_json);

        let absent_back: Typeref = serde_json::from_str(&absent_json).unwrap();
        let empty_back:  Typeref = serde_json::from_str(&empty_json).unwrap();
        assert_eq!(absent_back.targs, None);
        assert_eq!(empty_back.targs, Some(vec![]));
    }
}
