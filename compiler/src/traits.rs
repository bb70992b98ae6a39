use std::collections::BTreeMap;

use koinos_reflect_schema::Schema;

use crate::error::ReflectError;

/// Relative output path mapped to file content.
pub type GeneratedFiles = BTreeMap<String, String>;

/// A code generation backend. Receives the finished, dependency-ordered
/// schema and the name of the output package.
pub trait Generator {
    /// Name the driver selects this generator by, e.g. `rust`.
    fn name(&self) -> &str;

    fn description(&self) -> &str {
        ""
    }

    fn generate(&self, schema: &Schema, package: &str) -> Result<GeneratedFiles, ReflectError>;
}
