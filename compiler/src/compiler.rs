use std::{fs, path::Path};

use koinos_reflect_schema::{Schema, Toplevel};
use tracing::{debug, info};

use crate::{
    error::ReflectError,
    parser::parse,
    resolver::ReferenceChecker,
    sorter::{sort_typemap, DEFAULT_MAX_SORT_DEPTH},
    typemap::{SymbolTable, Typemap, TypemapBuilder},
};

/// Knobs for the analysis passes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompileOptions {
    /// Longest dependency chain the sorter follows before reporting a cycle.
    pub max_sort_depth: usize,
}

impl Default for CompileOptions {
    fn default() -> Self {
        CompileOptions { max_sort_depth: DEFAULT_MAX_SORT_DEPTH }
    }
}

/// Runs the analysis passes over a parsed tree and assembles the schema.
///
/// Each stage is exposed separately so tooling can stop part way.
pub struct Schemanator {
    options: CompileOptions,
    tree:    Option<Toplevel>,
    symbols: SymbolTable,
    typemap: Option<Typemap>,
}

impl Schemanator {
    pub fn new(tree: Toplevel) -> Self {
        Schemanator::with_options(tree, CompileOptions::default())
    }

    pub fn with_options(tree: Toplevel, options: CompileOptions) -> Self {
        Schemanator {
            options,
            tree:    Some(tree),
            symbols: SymbolTable::new(),
            typemap: None,
        }
    }

    fn tree_mut(&mut self) -> Result<&mut Toplevel, ReflectError> {
        self.tree
            .as_mut()
            .ok_or_else(|| ReflectError::AnalyzeError("tree already bound to the typemap".into()))
    }

    pub fn build_typemap(&mut self) -> Result<(), ReflectError> {
        let tree = self.tree_mut()?;
        self.symbols = TypemapBuilder::build(tree)?;
        Ok(())
    }

    pub fn check_references(&mut self) -> Result<(), ReflectError> {
        let symbols = &self.symbols;
        let tree = self
            .tree
            .as_mut()
            .ok_or_else(|| ReflectError::AnalyzeError("tree already bound to the typemap".into()))?;
        ReferenceChecker::check(symbols, tree)
    }

    pub fn sort_typemap(&mut self) -> Result<(), ReflectError> {
        let tree = self
            .tree
            .take()
            .ok_or_else(|| ReflectError::AnalyzeError("tree already bound to the typemap".into()))?;
        let typemap = Typemap::bind(&self.symbols, tree)?;
        self.typemap = Some(sort_typemap(typemap, self.options.max_sort_depth)?);
        Ok(())
    }

    pub fn create_schema(&mut self) -> Result<Schema, ReflectError> {
        let typemap = self
            .typemap
            .take()
            .ok_or_else(|| ReflectError::AnalyzeError("typemap has not been sorted".into()))?;
        Ok(Schema::new(typemap.into_entries()))
    }

    pub fn schemanate(mut self) -> Result<Schema, ReflectError> {
        self.build_typemap()?;
        self.check_references()?;
        self.sort_typemap()?;
        let schema = self.create_schema()?;
        debug!(decls = schema.len(), "assembled schema");
        Ok(schema)
    }
}

/// Compile a textual schema into `(Schema, String)`, the second element being
/// its JSON encoding.
/// Returns `Err(ReflectError)` if lexing/parsing/analysis fails.
pub fn compile_schema(text: &str) -> Result<(Schema, String), ReflectError> {
    compile_schema_with(text, CompileOptions::default())
}

pub fn compile_schema_with(
    text: &str,
    options: CompileOptions,
) -> Result<(Schema, String), ReflectError> {
    let tree = parse(text)?;
    let schema = Schemanator::with_options(tree, options).schemanate()?;
    let json = encode_schema_json(&schema)?;

    // Generators only ever see the JSON, so make sure it reads back intact.
    if decode_schema_json(&json)? != schema {
        return Err(ReflectError::AnalyzeError(
            "schema does not survive a JSON round trip".into(),
        ));
    }
    info!(decls = schema.len(), "compiled schema");
    Ok((schema, json))
}

/// Encode a `Schema` as compact JSON.
pub fn encode_schema_json(schema: &Schema) -> Result<String, ReflectError> {
    Ok(serde_json::to_string(schema)?)
}

/// Decode a JSON document back into a `Schema`.
pub fn decode_schema_json(json: &str) -> Result<Schema, ReflectError> {
    Ok(serde_json::from_str(json)?)
}

/// Joins source fragments into one compilation unit, making sure each
/// fragment ends with a newline.
pub fn concat_sources<S: AsRef<str>>(fragments: &[S]) -> String {
    let mut out = String::new();
    for fragment in fragments {
        let fragment = fragment.as_ref();
        out.push_str(fragment);
        if !fragment.ends_with('\n') {
            out.push('\n');
        }
    }
    out
}

/// Reads and concatenates source files, in order.
pub fn read_sources<P: AsRef<Path>>(paths: &[P]) -> Result<String, ReflectError> {
    let mut fragments = Vec::with_capacity(paths.len());
    for path in paths {
        debug!(path = %path.as_ref().display(), "reading source");
        fragments.push(fs::read_to_string(path)?);
    }
    Ok(concat_sources(&fragments))
}
