//! AST node types for a parsed protobuf schema.
//!
//! Every node carries a [`Location`]: its span plus the indices of the first
//! and last token it consumed, pointing into [`ProtoFile::tokens`].

use super::lexer::{Span, Token, TokenKind};

/// Where a node sits in the source and in the token buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Location {
    pub span: Span,
    pub first_token: usize,
    pub last_token: usize,
}

impl Location {
    /// Combine the spans of two tokens (inclusive) into a node location.
    pub fn new(tokens: &[Token], first_token: usize, last_token: usize) -> Self {
        Location {
            span: tokens[first_token].span.to(&tokens[last_token].span),
            first_token,
            last_token,
        }
    }

    pub fn line(&self) -> usize {
        self.span.start_pos.line
    }
}

/// The root of a parsed file. Owns the token buffer every node indexes into.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ProtoFile {
    pub syntax: Option<SyntaxStatement>,
    pub body: Vec<TopLevelDirective>,
    pub tokens: Vec<Token>,
    /// Covers the entire input.
    pub span: Span,
}

impl ProtoFile {
    pub fn token(&self, index: usize) -> Option<&Token> {
        self.tokens.get(index)
    }

    /// The tokens a node consumed, comments in between included.
    pub fn tokens_of(&self, loc: &Location) -> &[Token] {
        &self.tokens[loc.first_token..=loc.last_token]
    }

    /// Comment tokens in source order.
    pub fn comments(&self) -> impl Iterator<Item = &Token> {
        self.tokens
            .iter()
            .filter(|t| t.kind == TokenKind::Comment)
    }

    /// The `syntax` version, defaulting to proto2 when the statement is absent.
    pub fn version(&self) -> SyntaxVersion {
        self.syntax
            .as_ref()
            .map_or(SyntaxVersion::Proto2, |s| s.value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum SyntaxVersion {
    Proto2,
    Proto3,
}

impl SyntaxVersion {
    pub fn as_str(&self) -> &'static str {
        match self {
            SyntaxVersion::Proto2 => "proto2",
            SyntaxVersion::Proto3 => "proto3",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct SyntaxStatement {
    pub value: SyntaxVersion,
    pub loc: Location,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum ImportModifier {
    Weak,
    Public,
}

impl ImportModifier {
    pub fn as_str(&self) -> &'static str {
        match self {
            ImportModifier::Weak => "weak",
            ImportModifier::Public => "public",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ImportStatement {
    pub file: String,
    pub modifier: Option<ImportModifier>,
    pub loc: Location,
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Package {
    pub name: FullIdentifier,
    pub loc: Location,
}

/// An `option name = value` statement, or one entry of a `[...]` list.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct OptionStatement {
    pub name: OptionName,
    pub value: Constant,
    pub loc: Location,
}

/// A directive at file scope.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(tag = "type"))]
pub enum TopLevelDirective {
    Import(ImportStatement),
    Package(Package),
    Option(OptionStatement),
    Message(Message),
    Enum(Enum),
    Extend(Extend),
    Service(Service),
}

impl TopLevelDirective {
    pub fn kind_name(&self) -> &'static str {
        match self {
            TopLevelDirective::Import(_) => "import",
            TopLevelDirective::Package(_) => "package",
            TopLevelDirective::Option(_) => "option",
            TopLevelDirective::Message(_) => "message",
            TopLevelDirective::Enum(_) => "enum",
            TopLevelDirective::Extend(_) => "extend",
            TopLevelDirective::Service(_) => "service",
        }
    }

    pub fn loc(&self) -> &Location {
        match self {
            TopLevelDirective::Import(n) => &n.loc,
            TopLevelDirective::Package(n) => &n.loc,
            TopLevelDirective::Option(n) => &n.loc,
            TopLevelDirective::Message(n) => &n.loc,
            TopLevelDirective::Enum(n) => &n.loc,
            TopLevelDirective::Extend(n) => &n.loc,
            TopLevelDirective::Service(n) => &n.loc,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Message {
    pub name: String,
    pub body: Vec<MessageBody>,
    pub loc: Location,
}

/// A member of a message body. Nested messages and enums recurse.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(tag = "type"))]
pub enum MessageBody {
    Field(Field),
    Enum(Enum),
    Message(Message),
    Extend(Extend),
    Extensions(Extensions),
    Group(Group),
    Option(OptionStatement),
    OneOf(OneOf),
    MapField(MapField),
    Reserved(Reserved),
}

impl MessageBody {
    pub fn kind_name(&self) -> &'static str {
        match self {
            MessageBody::Field(_) => "field",
            MessageBody::Enum(_) => "enum",
            MessageBody::Message(_) => "message",
            MessageBody::Extend(_) => "extend",
            MessageBody::Extensions(_) => "extensions",
            MessageBody::Group(_) => "group",
            MessageBody::Option(_) => "option",
            MessageBody::OneOf(_) => "oneof",
            MessageBody::MapField(_) => "map",
            MessageBody::Reserved(_) => "reserved",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Enum {
    pub name: String,
    pub options: Vec<OptionStatement>,
    /// Enum values; these are [`Field`]s without a type.
    pub fields: Vec<Field>,
    pub reserved: Vec<Reserved>,
    pub loc: Location,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum Label {
    Required,
    Optional,
    Repeated,
}

impl Label {
    pub fn from_keyword(word: &str) -> Option<Label> {
        match word {
            "required" => Some(Label::Required),
            "optional" => Some(Label::Optional),
            "repeated" => Some(Label::Repeated),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Label::Required => "required",
            Label::Optional => "optional",
            Label::Repeated => "repeated",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Field {
    pub label: Option<Label>,
    /// Absent only for enum values.
    pub field_type: Option<ValueType>,
    pub name: String,
    /// Signed: the grammar accepts a leading `-`.
    pub field_number: i64,
    pub field_options: Vec<OptionStatement>,
    pub loc: Location,
}

/// A proto2 group: a field and a nested message type declared together.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Group {
    pub label: Label,
    pub name: String,
    pub field_number: i64,
    pub options: Vec<OptionStatement>,
    pub body: Vec<MessageBody>,
    pub loc: Location,
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct OneOf {
    pub oneof_name: String,
    pub options: Vec<OptionStatement>,
    pub fields: Vec<Field>,
    pub loc: Location,
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct MapField {
    /// Always one of the primitive type names.
    pub key_type: String,
    pub value_type: ValueType,
    pub map_name: String,
    pub field_number: i64,
    pub options: Vec<OptionStatement>,
    pub loc: Location,
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Extensions {
    /// Never empty.
    pub ranges: Vec<Range>,
    pub options: Vec<OptionStatement>,
    pub loc: Location,
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Reserved {
    pub items: ReservedItems,
    pub loc: Location,
}

impl Reserved {
    pub fn ranges(&self) -> Option<&[Range]> {
        match &self.items {
            ReservedItems::Ranges(r) => Some(r),
            ReservedItems::FieldNames(_) => None,
        }
    }

    pub fn field_names(&self) -> Option<&[String]> {
        match &self.items {
            ReservedItems::FieldNames(n) => Some(n),
            ReservedItems::Ranges(_) => None,
        }
    }
}

/// A `reserved` statement holds either numbers or names, never both.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum ReservedItems {
    Ranges(Vec<Range>),
    FieldNames(Vec<String>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum Range {
    /// `5`
    Single(i64),
    /// `5 to 10` or `5 to max`
    Span(i64, RangeEnd),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum RangeEnd {
    Value(i64),
    Max,
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Extend {
    pub extendee: ValueType,
    pub body: Vec<ExtendBody>,
    pub loc: Location,
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(tag = "type"))]
pub enum ExtendBody {
    Field(Field),
    Group(Group),
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Service {
    pub name: String,
    pub body: Vec<ServiceBody>,
    pub loc: Location,
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(tag = "type"))]
pub enum ServiceBody {
    Option(OptionStatement),
    Rpc(Rpc),
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Rpc {
    pub name: String,
    pub input_stream: bool,
    pub input: ValueType,
    pub output_stream: bool,
    pub output: ValueType,
    pub options: Vec<OptionStatement>,
    pub loc: Location,
}

/// A dot-joined qualified name such as `google.protobuf`.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct FullIdentifier {
    pub value: String,
    pub loc: Location,
}

/// `deprecated`, `(my.ext)` or `(my.ext).field`.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct OptionName {
    pub value: String,
    pub loc: Location,
}

/// A primitive type name or a (possibly dotted, possibly `.`-rooted) type reference.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ValueType {
    pub value: String,
    pub loc: Location,
}

impl ValueType {
    pub fn is_primitive(&self) -> bool {
        super::lexer::is_primitive_type(&self.value)
    }

    pub fn is_fully_qualified(&self) -> bool {
        self.value.starts_with('.')
    }
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(tag = "type"))]
pub enum Constant {
    Identifier(FullIdentifier),
    Literal(Literal),
}

impl Constant {
    pub fn loc(&self) -> &Location {
        match self {
            Constant::Identifier(n) => &n.loc,
            Constant::Literal(n) => &n.loc,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Literal {
    pub value: LiteralValue,
    pub loc: Location,
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum LiteralValue {
    /// Inner text of the string literal, escapes undecoded.
    String(String),
    Int { negative: bool, value: u64 },
    Float(f64),
    Bool(bool),
}
