use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReflectError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Lex error at line {line}, column {column} (byte {position}): no token matches")]
    LexError {
        position: usize,
        line:     usize,
        column:   usize,
    },

    #[error("Parse error at line {line}, column {column}: {msg}")]
    ParseError {
        msg:    String,
        line:   usize,
        column: usize,
    },

    #[error("Analyze error: {0}")]
    AnalyzeError(String),

    #[error("Schema JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Codegen error: {0}")]
    CodegenError(String),
}
