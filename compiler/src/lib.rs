//! koinos-reflect-compiler
//!
//! This crate implements:
//!  1) A tokenizer + parser for the reflection IDL (`namespace`, `typedef`,
//!     `struct`, `enum class` and `KOINOS_BASETYPE` declarations),
//!  2) A listener-based tree walker shared by the analysis passes,
//!  3) Typemap building, reference resolution and dependency sorting,
//!  4) Schema assembly and its JSON encoding (`compile_schema` → `(Schema, String)`),
//!  5) Code generation through the `Generator` trait, and the `ReflectError` type.

pub mod error;
pub mod utils;
pub mod tokenizer;
pub mod parser;
pub mod walker;
pub mod typemap;
pub mod resolver;
pub mod sorter;
pub mod compiler;
pub mod traits;
pub mod codegen;
pub mod gen_rust;

pub use codegen::GeneratorRegistry;
pub use compiler::compile_schema;
pub use compiler::compile_schema_with;
pub use compiler::concat_sources;
pub use compiler::decode_schema_json;
pub use compiler::encode_schema_json;
pub use compiler::read_sources;
pub use compiler::CompileOptions;
pub use compiler::Schemanator;
pub use error::ReflectError;
pub use gen_rust::compile_schema_to_rust;
pub use parser::parse;
pub use tokenizer::tokenize;
pub use traits::Generator;
