use koinos_reflect_schema::Schema;
use tracing::debug;

use crate::{
    error::ReflectError,
    gen_rust::RustGenerator,
    traits::{GeneratedFiles, Generator},
    utils::quote,
};

/// Emits the schema itself as pretty-printed JSON.
#[derive(Debug, Default)]
pub struct JsonGenerator;

impl Generator for JsonGenerator {
    fn name(&self) -> &str {
        "json"
    }

    fn description(&self) -> &str {
        "schema.json with the dependency-ordered declarations"
    }

    fn generate(&self, schema: &Schema, _package: &str) -> Result<GeneratedFiles, ReflectError> {
        let mut files = GeneratedFiles::new();
        let mut json = serde_json::to_string_pretty(schema)?;
        json.push('\n');
        files.insert("schema.json".to_string(), json);
        Ok(files)
    }
}

/// Named code generators the driver can pick from.
#[derive(Default)]
pub struct GeneratorRegistry {
    generators: Vec<Box<dyn Generator>>,
}

impl GeneratorRegistry {
    pub fn new() -> Self {
        GeneratorRegistry::default()
    }

    /// Registry holding the `rust` and `json` generators.
    pub fn with_builtins() -> Self {
        let mut registry = GeneratorRegistry::new();
        registry.register(Box::new(RustGenerator));
        registry.register(Box::new(JsonGenerator));
        registry
    }

    /// Adds a generator, replacing any registered under the same name.
    pub fn register(&mut self, generator: Box<dyn Generator>) {
        self.generators.retain(|g| g.name() != generator.name());
        self.generators.push(generator);
    }

    pub fn get(&self, name: &str) -> Result<&dyn Generator, ReflectError> {
        self.generators
            .iter()
            .find(|g| g.name() == name)
            .map(|g| &**g)
            .ok_or_else(|| ReflectError::CodegenError(format!("unknown target {}", quote(name))))
    }

    pub fn names(&self) -> Vec<&str> {
        self.generators.iter().map(|g| g.name()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &dyn Generator> {
        self.generators.iter().map(|g| &**g)
    }

    pub fn generate(
        &self,
        target: &str,
        schema: &Schema,
        package: &str,
    ) -> Result<GeneratedFiles, ReflectError> {
        if package.is_empty() {
            return Err(ReflectError::CodegenError("output package name is required".into()));
        }
        let generator = self.get(target)?;
        let files = generator.generate(schema, package)?;
        debug!(generator = target, package, files = files.len(), "generated");
        Ok(files)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::{compile_schema, decode_schema_json};

    struct Fixed(&'static str);

    impl Generator for Fixed {
        fn name(&self) -> &str {
            "fixed"
        }

        fn generate(&self, _schema: &Schema, package: &str) -> Result<GeneratedFiles, ReflectError> {
            let mut files = GeneratedFiles::new();
            files.insert(format!("{}.txt", package), self.0.to_string());
            Ok(files)
        }
    }

    #[test]
    fn test_builtins_listed() {
        let registry = GeneratorRegistry::with_builtins();
        assert_eq!(registry.names(), vec!["rust", "json"]);
    }

    #[test]
    fn test_unknown_target() {
        let registry = GeneratorRegistry::with_builtins();
        let err = registry.get("cobol").err().expect("lookup should fail");
        assert_eq!(err.to_string(), "Codegen error: unknown target `cobol`");
    }

    #[test]
    fn test_register_replaces_same_name() {
        let mut registry = GeneratorRegistry::new();
        registry.register(Box::new(Fixed("one")));
        registry.register(Box::new(Fixed("two")));
        assert_eq!(registry.names(), vec!["fixed"]);

        let schema = Schema::new(vec![]);
        let files = registry.generate("fixed", &schema, "pkg").unwrap();
        assert_eq!(files.get("pkg.txt").map(String::as_str), Some("two"));
    }

    #[test]
    fn test_package_required() {
        let registry = GeneratorRegistry::with_builtins();
        let err = registry.generate("json", &Schema::new(vec![]), "").unwrap_err();
        assert!(matches!(err, ReflectError::CodegenError(_)));
    }

    #[test]
    fn test_json_generator_round_trips() {
        let (schema, _) = compile_schema("KOINOS_BASETYPE(u8) struct S { u8 a; };").unwrap();
        let files = GeneratorRegistry::with_builtins().generate("json", &schema, "pkg").unwrap();
        let json = files.get("schema.json").expect("schema.json");
        assert_eq!(decode_schema_json(json).unwrap(), schema);
    }
}
