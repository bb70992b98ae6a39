//! koinos-reflect
//!
//! High-level entry points over the compiler front end.
//!
//! - Compiling one or more IDL files into a `Schema`
//! - Reading and writing the schema JSON artifact
//! - Running a code generator and writing its files under `<output>/<package>/`

use std::{
    fs,
    path::{Path, PathBuf},
};

use tracing::info;

pub use koinos_reflect_compiler::error::ReflectError;
pub use koinos_reflect_compiler::traits::{GeneratedFiles, Generator};
pub use koinos_reflect_compiler::{CompileOptions, GeneratorRegistry};
pub use koinos_reflect_schema::{Decl, Fqn, Schema};

/// Concatenate and compile IDL files, in the order given.
pub fn compile_files<P: AsRef<Path>>(paths: &[P], options: CompileOptions) -> Result<Schema, ReflectError> {
    let text = koinos_reflect_compiler::read_sources(paths)?;
    let (schema, _json) = koinos_reflect_compiler::compile_schema_with(&text, options)?;
    Ok(schema)
}

/// Encode a schema as pretty-printed JSON.
pub fn schema_to_json(schema: &Schema) -> Result<String, ReflectError> {
    Ok(serde_json::to_string_pretty(schema)?)
}

/// Decode a schema JSON document.
pub fn schema_from_json(json: &str) -> Result<Schema, ReflectError> {
    koinos_reflect_compiler::decode_schema_json(json)
}

/// Load a schema JSON file from disk.
pub fn load_schema<P: AsRef<Path>>(path: P) -> Result<Schema, ReflectError> {
    schema_from_json(&fs::read_to_string(path)?)
}

/// Run `target` from `registry` and write every generated file below
/// `output/package`. Returns the paths written, in name order.
pub fn generate_to_dir(
    registry: &GeneratorRegistry,
    target: &str,
    schema: &Schema,
    package: &str,
    output: &Path,
) -> Result<Vec<PathBuf>, ReflectError> {
    let files = registry.generate(target, schema, package)?;
    let root = output.join(package);

    let mut written = Vec::with_capacity(files.len());
    for (name, contents) in files {
        let path = root.join(&name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, contents)?;
        info!(path = %path.display(), "wrote generated file");
        written.push(path);
    }
    Ok(written)
}

pub mod error {
    pub use koinos_reflect_compiler::error::ReflectError;
}

pub mod schema {
    pub use koinos_reflect_schema::*;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("koinos-reflect-{}-{}", name, std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_compile_files_in_order() {
        let dir = scratch_dir("compile");
        let base = dir.join("base.idl");
        let types = dir.join("types.idl");
        fs::write(&base, "KOINOS_BASETYPE(uint64) // no newline at end").unwrap();
        fs::write(&types, "struct block { uint64 height; };").unwrap();

        let schema = compile_files(&[&base, &types], CompileOptions::default()).unwrap();
        let names: Vec<_> = schema.names().map(|n| n.join("::")).collect();
        assert_eq!(names, vec!["uint64", "block"]);

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = compile_files(&["/nonexistent/koinos.idl"], CompileOptions::default()).unwrap_err();
        assert!(matches!(err, ReflectError::Io(_)));
    }

    #[test]
    fn test_json_helpers_round_trip() {
        let (schema, _) = koinos_reflect_compiler::compile_schema(
            "KOINOS_BASETYPE(vector) KOINOS_BASETYPE(u8) typedef vector<u8> bytes;",
        )
        .unwrap();
        let json = schema_to_json(&schema).unwrap();
        assert!(json.contains('\n'));
        assert_eq!(schema_from_json(&json).unwrap(), schema);
    }

    #[test]
    fn test_generate_to_dir_writes_under_package() {
        let dir = scratch_dir("generate");
        let (schema, _) = koinos_reflect_compiler::compile_schema("struct empty {};").unwrap();
        let registry = GeneratorRegistry::with_builtins();

        let written = generate_to_dir(&registry, "json", &schema, "chain", &dir).unwrap();
        assert_eq!(written, vec![dir.join("chain").join("schema.json")]);
        let reread = load_schema(&written[0]).unwrap();
        assert_eq!(reread, schema);

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_generate_to_dir_rejects_unknown_target() {
        let dir = scratch_dir("unknown");
        let (schema, _) = koinos_reflect_compiler::compile_schema("struct empty {};").unwrap();
        let err = generate_to_dir(&GeneratorRegistry::with_builtins(), "cobol", &schema, "chain", &dir).unwrap_err();
        assert!(matches!(err, ReflectError::CodegenError(_)));
        let _ = fs::remove_dir_all(&dir);
    }
}
