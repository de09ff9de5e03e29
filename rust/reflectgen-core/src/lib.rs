pub mod cache;
pub mod error;
pub mod generator;
pub mod lexer;
pub mod parser;
pub mod pipeline;
pub mod token;
pub mod analyzer {
    pub mod extract;
    pub mod metadata;
}

// Re-export selected API for consumers
pub use analyzer::metadata::{ComponentReflectionInfo, VariableReflectionInfo};
pub use cache::{ReflectionCache, UnchangedScan};
pub use generator::{Generator, GeneratorConfig};
pub use lexer::{tokenize, Tokenized};
pub use parser::parse;
pub use pipeline::{run, RunSummary};
pub use token::{Token, TokenKind};
