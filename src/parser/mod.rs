pub mod lexer;
pub mod ast;
pub mod config;
pub mod grammar;

pub use config::ParserConfig;

use crate::error::Result;
use ast::ProtoFile;

/// Parse protobuf schema text into a `ProtoFile` with the default config.
///
/// This is the main entry point for the parser module.
pub fn parse(source: &str) -> Result<ProtoFile> {
    parse_with_config(source, &ParserConfig::default())
}

/// Parse with explicit [`ParserConfig`] settings.
///
/// Scanning happens eagerly and completely before the grammar runs; the
/// first lexical or syntax error aborts the whole call.
pub fn parse_with_config(source: &str, config: &ParserConfig) -> Result<ProtoFile> {
    let tokens = lexer::scan_tokens(source)?;
    let file = grammar::Parser::new(tokens, config).parse()?;
    Ok(file)
}
