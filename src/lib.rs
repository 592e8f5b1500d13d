//! Protoparse: a source-level parser for the Protocol Buffers schema language.
//!
//! Schema text (proto2 or proto3) is scanned into a complete token buffer and
//! parsed by recursive descent into a fully location-annotated AST. Every node
//! records its byte span, line/column endpoints and the indices of the first
//! and last tokens it consumed. A printer re-serializes the tree.
//!
//! Import resolution, type resolution and semantic checks are left to callers.
//!
//! # Quick Start
//!
//! ```rust
//! use protoparse::parser::ast::{MessageBody, TopLevelDirective};
//!
//! let file = protoparse::parse(r#"
//!     syntax = "proto3";
//!     message Person {
//!         string name = 1;
//!         map<string, int32> scores = 2;
//!     }
//! "#).unwrap();
//!
//! let TopLevelDirective::Message(person) = &file.body[0] else { panic!() };
//! assert_eq!(person.name, "Person");
//! assert!(matches!(person.body[1], MessageBody::MapField(_)));
//!
//! let printed = protoparse::print(&file);
//! assert!(printed.contains("map<string, int32> scores = 2;"));
//! ```

pub mod error;
pub mod parser;
pub mod printer;

pub use error::{LexError, ParseError, ProtoError, Result};
pub use parser::ast::ProtoFile;
pub use parser::lexer::{scan_tokens, Token, TokenKind};
pub use parser::{parse, parse_with_config, ParserConfig};
pub use printer::print;
