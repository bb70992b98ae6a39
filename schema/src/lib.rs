//! Node types for the Koinos type IDL and the `Schema` artifact produced by
//! the compiler front end.
//!
//! ```
//! use koinos_reflect_schema::*;
//!
//! let schema = Schema::new(vec![
//!     (vec!["uint32".to_owned()], Decl::BaseType(BaseType {
//!         name: vec!["uint32".to_owned()],
//!         doc:  String::new(),
//!     })),
//! ]);
//!
//! assert_eq!(schema.len(), 1);
//! assert_eq!(schema.decls[0].1.kind_name(), "BaseType");
//! ```

pub mod ast;
pub mod schema;

pub use ast::*;
pub use schema::*;
