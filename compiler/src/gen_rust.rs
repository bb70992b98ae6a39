use std::collections::HashMap;

use koinos_reflect_schema::{Decl, EnumClass, Fqn, Schema, Struct, Targ, Typedef, Typeref};

use crate::{
    error::ReflectError,
    traits::{GeneratedFiles, Generator},
    utils::{doc_lines, fq_name, quote},
};

/// Converts a string to PascalCase.
/// - If the string contains underscores, it splits on underscores and converts each word
///   so that its first letter is uppercase and the rest lowercase.
/// - If the string does not contain underscores and is fully uppercase, it converts it
///   so that only the first letter is uppercase and the rest are lowercase.
/// - Otherwise, it ensures only the first letter is uppercase.
fn to_pascal_case(s: &str) -> String {
    fn capitalize(word: &str, lower_rest: bool) -> String {
        let mut chars = word.chars();
        match chars.next() {
            None => String::new(),
            Some(first) if lower_rest => first.to_uppercase().to_string() + &chars.as_str().to_lowercase(),
            Some(first) => first.to_uppercase().to_string() + chars.as_str(),
        }
    }

    if s.contains('_') {
        s.split('_')
            .filter(|word| !word.is_empty())
            .map(|word| capitalize(word, true))
            .collect::<String>()
    } else {
        capitalize(s, s == s.to_uppercase())
    }
}

/// Converts a string to snake_case.
/// This implementation avoids inserting underscores between consecutive uppercase letters,
/// so that acronyms remain intact (e.g. "sessionID" becomes "session_id").
fn to_snake_case(s: &str) -> String {
    let chars: Vec<char> = s.chars().collect();
    let mut snake = String::new();
    for (i, &c) in chars.iter().enumerate() {
        if c.is_uppercase() {
            if i > 0 {
                let prev = chars[i - 1];
                if !prev.is_uppercase() || (i + 1 < chars.len() && chars[i + 1].is_lowercase()) {
                    snake.push('_');
                }
            }
            snake.extend(c.to_lowercase());
        } else {
            snake.push(c);
        }
    }
    snake
}

/// Escapes Rust reserved keywords by suffixing with an underscore.
fn escape_rust_keyword(s: &str) -> String {
    let keywords = [
        "as", "break", "const", "continue", "crate", "else",
        "enum", "extern", "false", "fn", "for", "if", "impl",
        "in", "let", "loop", "match", "mod", "move", "mut",
        "pub", "ref", "return", "self", "Self", "static",
        "struct", "super", "trait", "true", "type", "unsafe",
        "use", "where", "while", "async", "await", "dyn",
    ];
    if keywords.contains(&s) {
        format!("{}_", s)
    } else {
        s.to_string()
    }
}

/// Generates `mod.rs`: one nested `pub mod` per namespace, holding the
/// declarations of that namespace in schema order. Base types are re-exported
/// from an `rt` module the caller places next to the generated file.
#[derive(Debug, Default)]
pub struct RustGenerator;

impl Generator for RustGenerator {
    fn name(&self) -> &str {
        "rust"
    }

    fn description(&self) -> &str {
        "Rust type definitions in mod.rs"
    }

    fn generate(&self, schema: &Schema, package: &str) -> Result<GeneratedFiles, ReflectError> {
        let mut files = GeneratedFiles::new();
        files.insert("mod.rs".to_string(), compile_schema_to_rust(schema, package)?);
        Ok(files)
    }
}

#[derive(Default)]
struct Module {
    items:    Vec<String>,
    children: Vec<(String, Module)>,
}

impl Module {
    fn child(&mut self, path: &[String]) -> &mut Module {
        match path.split_first() {
            None => self,
            Some((head, rest)) => {
                let pos = match self.children.iter().position(|(name, _)| name == head) {
                    Some(pos) => pos,
                    None => {
                        self.children.push((head.clone(), Module::default()));
                        self.children.len() - 1
                    }
                };
                self.children[pos].1.child(rest)
            }
        }
    }

    fn render(&self, indent: usize, out: &mut Vec<String>) {
        let pad = "    ".repeat(indent);
        for item in &self.items {
            for line in item.lines() {
                if line.is_empty() {
                    out.push(String::new());
                } else {
                    out.push(format!("{}{}", pad, line));
                }
            }
            out.push(String::new());
        }
        for (name, module) in &self.children {
            out.push(format!("{}pub mod {} {{", pad, escape_rust_keyword(name)));
            module.render(indent + 1, out);
            while out.last().map_or(false, |l| l.is_empty()) {
                out.pop();
            }
            out.push(format!("{}}}", pad));
            out.push(String::new());
        }
    }
}

struct Emitter<'a> {
    decls: HashMap<&'a [String], &'a Decl>,
}

impl<'a> Emitter<'a> {
    fn new(schema: &'a Schema) -> Self {
        Emitter {
            decls: schema.decls.iter().map(|(fqn, decl)| (fqn.as_slice(), decl)).collect(),
        }
    }

    /// Rust identifier for the declaration named `fqn`. Base types keep their
    /// spelling so they line up with the runtime.
    fn type_name(&self, fqn: &[String]) -> Result<String, ReflectError> {
        let local = fqn.last().map(String::as_str).unwrap_or("");
        match self.decls.get(fqn) {
            Some(Decl::BaseType(_)) => Ok(escape_rust_keyword(local)),
            Some(_) => Ok(escape_rust_keyword(&to_pascal_case(local))),
            None => Err(ReflectError::CodegenError(format!(
                "reference to undeclared type {}",
                quote(&fq_name(fqn))
            ))),
        }
    }

    /// Path to `target` as seen from inside module `scope`.
    fn path_to(&self, scope: &[String], target: &[String]) -> Result<String, ReflectError> {
        let mut path = "super::".repeat(scope.len());
        for module in &target[..target.len().saturating_sub(1)] {
            path.push_str(&escape_rust_keyword(module));
            path.push_str("::");
        }
        path.push_str(&self.type_name(target)?);
        Ok(path)
    }

    fn typeref(&self, scope: &[String], tref: &Typeref) -> Result<String, ReflectError> {
        let mut out = self.path_to(scope, &tref.name)?;
        if let Some(targs) = &tref.targs {
            let mut args = Vec::with_capacity(targs.len());
            for targ in targs {
                match targ {
                    Targ::Typeref(inner) => args.push(self.typeref(scope, inner)?),
                    Targ::IntLiteral(lit) => args.push(lit.value.to_string()),
                }
            }
            out.push('<');
            out.push_str(&args.join(", "));
            out.push('>');
        }
        Ok(out)
    }

    fn item(&self, fqn: &Fqn, decl: &Decl) -> Result<String, ReflectError> {
        let scope = &fqn[..fqn.len().saturating_sub(1)];
        let body = match decl {
            Decl::Typedef(td)   => self.generate_typedef(scope, td)?,
            Decl::Struct(st)    => self.generate_struct(scope, st)?,
            Decl::EnumClass(ec) => generate_enum(ec)?,
            Decl::BaseType(_)   => {
                let mut path = if scope.is_empty() { "self::".to_string() } else { "super::".repeat(scope.len()) };
                path.push_str("rt::");
                path.push_str(&fqn.iter().map(|c| escape_rust_keyword(c)).collect::<Vec<_>>().join("::"));
                format!("pub use {};", path)
            }
            Decl::Namespace(ns) => {
                return Err(ReflectError::CodegenError(format!(
                    "namespace {} cannot appear in a schema",
                    quote(&ns.name)
                )))
            }
        };
        Ok(format!("{}{}", doc_comment(decl.doc(), ""), body))
    }

    fn generate_typedef(&self, scope: &[String], td: &Typedef) -> Result<String, ReflectError> {
        Ok(format!(
            "pub type {} = {};",
            escape_rust_keyword(&to_pascal_case(&td.name)),
            self.typeref(scope, &td.tref)?
        ))
    }

    fn generate_struct(&self, scope: &[String], st: &Struct) -> Result<String, ReflectError> {
        let mut fields = Vec::with_capacity(st.fields.len());
        for field in &st.fields {
            let rust_field_name = escape_rust_keyword(&to_snake_case(&field.name));
            fields.push(format!(
                "{}    pub {}: {},",
                doc_comment(&field.doc, "    "),
                rust_field_name,
                self.typeref(scope, &field.tref)?
            ));
        }

        let derived = "#[derive(Debug, Clone, PartialEq)]";
        let name = escape_rust_keyword(&to_pascal_case(&st.name));
        if fields.is_empty() {
            return Ok(format!("{}\npub struct {};", derived, name));
        }
        Ok(format!("{}\npub struct {} {{\n{}\n}}", derived, name, fields.join("\n")))
    }
}

/// Enum entries become variants with explicit discriminants.
fn generate_enum(ec: &EnumClass) -> Result<String, ReflectError> {
    let enum_name = escape_rust_keyword(&to_pascal_case(&ec.name));
    let mut seen_names: Vec<String> = Vec::new();
    let mut seen_values: Vec<u64> = Vec::new();
    let mut variants = Vec::new();

    for entry in &ec.entries {
        let variant_name = escape_rust_keyword(&to_pascal_case(&entry.name));
        if seen_names.contains(&variant_name) {
            return Err(ReflectError::CodegenError(format!(
                "enum {} has two entries named {} in Rust",
                quote(&ec.name),
                quote(&variant_name)
            )));
        }
        if seen_values.contains(&entry.value) {
            return Err(ReflectError::CodegenError(format!(
                "enum {} uses the value {} twice",
                quote(&ec.name),
                entry.value
            )));
        }
        variants.push(format!("{}    {} = {},", doc_comment(&entry.doc, "    "), variant_name, entry.value));
        seen_names.push(variant_name);
        seen_values.push(entry.value);
    }

    let derived = "#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]";
    if variants.is_empty() {
        return Ok(format!("{}\npub enum {} {{}}", derived, enum_name));
    }
    Ok(format!(
        "{}\n#[repr(u64)]\npub enum {} {{\n{}\n}}",
        derived,
        enum_name,
        variants.join("\n")
    ))
}

fn doc_comment(doc: &str, pad: &str) -> String {
    doc_lines(doc)
        .iter()
        .map(|line| {
            if line.is_empty() {
                format!("{}///\n", pad)
            } else {
                format!("{}/// {}\n", pad, line)
            }
        })
        .collect()
}

/// Compiles the entire schema into Rust type definitions as a string.
pub fn compile_schema_to_rust(schema: &Schema, package: &str) -> Result<String, ReflectError> {
    let emitter = Emitter::new(schema);
    let mut root = Module::default();

    for (fqn, decl) in &schema.decls {
        let scope = &fqn[..fqn.len().saturating_sub(1)];
        let item = emitter.item(fqn, decl)?;
        root.child(scope).items.push(item);
    }

    let mut rust_code: Vec<String> = vec![
        format!("//! Types generated from the `{}` schema. Do not edit.", package),
        "//!".to_string(),
        "//! Base types are re-exported from the sibling `rt` module.".to_string(),
        "#![allow(non_camel_case_types, dead_code)]".to_string(),
        String::new(),
        "pub mod rt;".to_string(),
        String::new(),
    ];
    root.render(0, &mut rust_code);
    while rust_code.last().map_or(false, |l| l.is_empty()) {
        rust_code.pop();
    }
    rust_code.push(String::new());

    Ok(rust_code.join("\n"))
}
