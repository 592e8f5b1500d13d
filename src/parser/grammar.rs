use tracing::{debug, trace};

use crate::error::ParseError;
use super::ast::*;
use super::config::ParserConfig;
use super::lexer::{Number, Position, Span, Token, TokenKind};

/// Recursive-descent parser over a scanned token buffer.
///
/// Comment tokens stay in the buffer (and end up in [`ProtoFile::tokens`])
/// but the grammar never sees them.
pub struct Parser<'c> {
    tokens: Vec<Token>,
    /// Indices of the non-comment tokens; the last one is always `Eof`.
    significant: Vec<usize>,
    pos: usize,
    depth: usize,
    config: &'c ParserConfig,
}

impl<'c> Parser<'c> {
    pub fn new(mut tokens: Vec<Token>, config: &'c ParserConfig) -> Self {
        if tokens.last().map(|t| t.kind) != Some(TokenKind::Eof) {
            let end = tokens.last().map(|t| t.span).unwrap_or_default();
            tokens.push(Token {
                kind: TokenKind::Eof,
                lexeme: String::new(),
                value: None,
                span: Span {
                    start: end.end,
                    end: end.end,
                    start_pos: end.end_pos,
                    end_pos: end.end_pos,
                },
            });
        }
        let significant = tokens
            .iter()
            .enumerate()
            .filter(|(_, t)| t.kind != TokenKind::Comment)
            .map(|(i, _)| i)
            .collect();
        Parser {
            tokens,
            significant,
            pos: 0,
            depth: 0,
            config,
        }
    }

    /// proto = [syntax] { import | package | option | topLevelDef | ";" }
    pub fn parse(mut self) -> Result<ProtoFile, ParseError> {
        let syntax = if self.check_keyword("syntax") {
            Some(self.parse_syntax()?)
        } else {
            None
        };
        let body = self.parse_top_level_directives()?;
        debug!(directives = body.len(), "parsed file");

        let eof = self.tokens[self.tokens.len() - 1].span;
        let span = Span {
            start: 0,
            end: eof.end,
            start_pos: Position { line: 1, column: 0 },
            end_pos: eof.end_pos,
        };
        Ok(ProtoFile {
            syntax,
            body,
            tokens: self.tokens,
            span,
        })
    }

    fn parse_syntax(&mut self) -> Result<SyntaxStatement, ParseError> {
        let first = self.expect_keyword("syntax")?;
        self.expect(TokenKind::Equal)?;
        let line = self.peek().line();
        let value = self.expect_string()?;
        let value = match value.as_str() {
            "proto2" => SyntaxVersion::Proto2,
            "proto3" => SyntaxVersion::Proto3,
            _ => return Err(ParseError::UnknownSyntax { value, line }),
        };
        self.expect(TokenKind::Semicolon)?;
        Ok(SyntaxStatement {
            value,
            loc: self.loc_from(first),
        })
    }

    fn parse_top_level_directives(&mut self) -> Result<Vec<TopLevelDirective>, ParseError> {
        let mut directives = Vec::new();

        while !self.is_at_end() {
            if self.eat(TokenKind::Semicolon).is_some() {
                continue;
            }
            let directive = match self.keyword() {
                Some("import") => TopLevelDirective::Import(self.parse_import()?),
                Some("package") => TopLevelDirective::Package(self.parse_package()?),
                Some("option") => TopLevelDirective::Option(self.parse_option()?),
                Some("message") => TopLevelDirective::Message(self.parse_message()?),
                Some("enum") => TopLevelDirective::Enum(self.parse_enum()?),
                Some("extend") => TopLevelDirective::Extend(self.parse_extend()?),
                Some("service") => TopLevelDirective::Service(self.parse_service()?),
                _ => {
                    return Err(self.unexpected(
                        "'import', 'package', 'option', 'message', 'enum', 'extend', 'service' or ';'",
                    ))
                }
            };
            trace!(directive = directive.kind_name(), line = directive.loc().line(), "top-level directive");
            directives.push(directive);
        }

        Ok(directives)
    }

    /// import = "import" ["weak" | "public"] strLit ";"
    fn parse_import(&mut self) -> Result<ImportStatement, ParseError> {
        let first = self.expect_keyword("import")?;
        let modifier = if self.eat_keyword("weak").is_some() {
            Some(ImportModifier::Weak)
        } else if self.eat_keyword("public").is_some() {
            Some(ImportModifier::Public)
        } else {
            None
        };
        let file = self.expect_string()?;
        self.expect(TokenKind::Semicolon)?;
        Ok(ImportStatement {
            file,
            modifier,
            loc: self.loc_from(first),
        })
    }

    fn parse_package(&mut self) -> Result<Package, ParseError> {
        let first = self.expect_keyword("package")?;
        let name = self.parse_full_identifier()?;
        self.expect(TokenKind::Semicolon)?;
        Ok(Package {
            name,
            loc: self.loc_from(first),
        })
    }

    /// option = "option" optionName "=" constant ";"
    fn parse_option(&mut self) -> Result<OptionStatement, ParseError> {
        let first = self.expect_keyword("option")?;
        let name = self.parse_option_name()?;
        self.expect(TokenKind::Equal)?;
        let value = self.parse_constant()?;
        self.expect(TokenKind::Semicolon)?;
        Ok(OptionStatement {
            name,
            value,
            loc: self.loc_from(first),
        })
    }

    /// One `name = constant` entry of a bracketed option list.
    fn parse_option_entry(&mut self) -> Result<OptionStatement, ParseError> {
        let first = self.current_index();
        let name = self.parse_option_name()?;
        self.expect(TokenKind::Equal)?;
        let value = self.parse_constant()?;
        Ok(OptionStatement {
            name,
            value,
            loc: self.loc_from(first),
        })
    }

    /// Optional `[ entry { "," entry } ]`.
    fn parse_field_options(&mut self) -> Result<Vec<OptionStatement>, ParseError> {
        let mut options = Vec::new();
        if self.eat(TokenKind::LeftBracket).is_none() {
            return Ok(options);
        }
        options.push(self.parse_option_entry()?);
        while self.eat(TokenKind::Comma).is_some() {
            options.push(self.parse_option_entry()?);
        }
        self.expect(TokenKind::RightBracket)?;
        Ok(options)
    }

    /// optionName = ( ident | "(" ["."] fullIdent ")" ) { "." ident }
    fn parse_option_name(&mut self) -> Result<OptionName, ParseError> {
        let first = self.current_index();
        let mut value = String::new();
        if self.eat(TokenKind::LeftParen).is_some() {
            value.push('(');
            if self.eat(TokenKind::Dot).is_some() {
                value.push('.');
            }
            value.push_str(&self.parse_full_identifier()?.value);
            self.expect(TokenKind::RightParen)?;
            value.push(')');
        } else {
            value.push_str(&self.expect_name()?);
        }

        while self.eat(TokenKind::Dot).is_some() {
            value.push('.');
            value.push_str(&self.expect_name()?);
        }

        Ok(OptionName {
            value,
            loc: self.loc_from(first),
        })
    }

    /// constant = fullIdent | [("-" | "+")] (intLit | floatLit | "inf" | "nan")
    ///          | strLit | "true" | "false"
    fn parse_constant(&mut self) -> Result<Constant, ParseError> {
        let first = self.current_index();
        let tok = self.peek();
        match tok.kind {
            TokenKind::Identifier if tok.lexeme == "true" || tok.lexeme == "false" => {
                let value = tok.lexeme == "true";
                self.advance();
                Ok(self.literal(first, LiteralValue::Bool(value)))
            }
            TokenKind::Identifier => Ok(Constant::Identifier(self.parse_full_identifier()?)),
            TokenKind::String => {
                let value = self.expect_string()?;
                Ok(self.literal(first, LiteralValue::String(value)))
            }
            TokenKind::Number => {
                let value = self.parse_signed_number(false)?;
                Ok(self.literal(first, value))
            }
            TokenKind::Minus | TokenKind::Plus => {
                let negative = self.advance_kind() == TokenKind::Minus;
                let value = self.parse_signed_number(negative)?;
                Ok(self.literal(first, value))
            }
            _ => Err(self.unexpected("constant")),
        }
    }

    fn parse_signed_number(&mut self, negative: bool) -> Result<LiteralValue, ParseError> {
        let sign = if negative { -1.0 } else { 1.0 };
        if self.eat_keyword("inf").is_some() {
            return Ok(LiteralValue::Float(sign * f64::INFINITY));
        }
        if self.eat_keyword("nan").is_some() {
            return Ok(LiteralValue::Float(f64::NAN));
        }
        match self.peek().number_value() {
            Some(Number::Int(value)) => {
                self.advance();
                Ok(LiteralValue::Int { negative, value })
            }
            Some(Number::Float(value)) => {
                self.advance();
                Ok(LiteralValue::Float(sign * value))
            }
            None => Err(self.unexpected("number")),
        }
    }

    fn literal(&self, first: usize, value: LiteralValue) -> Constant {
        Constant::Literal(Literal {
            value,
            loc: self.loc_from(first),
        })
    }

    /// fullIdent = ident { "." ident }
    fn parse_full_identifier(&mut self) -> Result<FullIdentifier, ParseError> {
        let first = self.current_index();
        let mut value = self.expect_name()?;
        while self.eat(TokenKind::Dot).is_some() {
            value.push('.');
            value.push_str(&self.expect_name()?);
        }
        Ok(FullIdentifier {
            value,
            loc: self.loc_from(first),
        })
    }

    /// valueType = primitiveType | ["."] ident { "." ident }
    fn parse_value_type(&mut self) -> Result<ValueType, ParseError> {
        let first = self.current_index();
        if self.check(TokenKind::PrimitiveType) {
            let value = self.peek().lexeme.clone();
            self.advance();
            return Ok(ValueType {
                value,
                loc: self.loc_from(first),
            });
        }

        let mut value = String::new();
        if self.eat(TokenKind::Dot).is_some() {
            value.push('.');
        }
        if !self.check(TokenKind::Identifier) {
            return Err(self.unexpected("type name"));
        }
        value.push_str(&self.expect_name()?);
        while self.eat(TokenKind::Dot).is_some() {
            value.push('.');
            value.push_str(&self.expect_name()?);
        }
        Ok(ValueType {
            value,
            loc: self.loc_from(first),
        })
    }

    /// message = "message" ident "{" messageBody* "}"
    fn parse_message(&mut self) -> Result<Message, ParseError> {
        let first = self.expect_keyword("message")?;
        let name = self.expect_name()?;
        self.enter()?;
        let body = self.parse_message_block()?;
        self.leave();
        Ok(Message {
            name,
            body,
            loc: self.loc_from(first),
        })
    }

    /// "{" messageBody* "}", shared by messages and groups.
    fn parse_message_block(&mut self) -> Result<Vec<MessageBody>, ParseError> {
        self.expect(TokenKind::LeftBrace)?;
        let mut body = Vec::new();

        while !self.check(TokenKind::RightBrace) {
            if self.eat(TokenKind::Semicolon).is_some() {
                continue;
            }
            let element = self.parse_message_element()?;
            trace!(element = element.kind_name(), "message body element");
            body.push(element);
        }

        self.expect(TokenKind::RightBrace)?;
        Ok(body)
    }

    fn parse_message_element(&mut self) -> Result<MessageBody, ParseError> {
        let tok = self.peek();
        match tok.kind {
            TokenKind::Identifier | TokenKind::PrimitiveType | TokenKind::Dot => {}
            _ => return Err(self.unexpected("message body element or '}'")),
        }

        // A keyword followed by "." is the head of a dotted type reference.
        let keyword = if self.peek_next().kind == TokenKind::Dot {
            None
        } else {
            self.keyword()
        };

        let element = match keyword {
            Some("message") => MessageBody::Message(self.parse_message()?),
            Some("enum") => MessageBody::Enum(self.parse_enum()?),
            Some("extend") => MessageBody::Extend(self.parse_extend()?),
            Some("extensions") => MessageBody::Extensions(self.parse_extensions()?),
            Some("option") => MessageBody::Option(self.parse_option()?),
            Some("oneof") => MessageBody::OneOf(self.parse_oneof()?),
            Some("reserved") => MessageBody::Reserved(self.parse_reserved()?),
            Some("map") if self.peek_next().kind == TokenKind::Less => {
                MessageBody::MapField(self.parse_map_field()?)
            }
            Some(word) if Label::from_keyword(word).is_some() && self.peek_next().is_keyword("group") => {
                MessageBody::Group(self.parse_group()?)
            }
            _ => MessageBody::Field(self.parse_field()?),
        };
        Ok(element)
    }

    /// field = [label] valueType ident "=" ["-"] intLit ["[" fieldOpts "]"] ";"
    fn parse_field(&mut self) -> Result<Field, ParseError> {
        let first = self.current_index();
        // `optional .pkg.Foo` is a label before a fully-qualified type.
        let label = self.keyword().and_then(Label::from_keyword);
        if label.is_some() {
            self.advance();
        }
        let field_type = self.parse_value_type()?;
        let name = self.expect_name()?;
        self.expect(TokenKind::Equal)?;
        let field_number = self.parse_field_number()?;
        let field_options = self.parse_field_options()?;
        self.expect(TokenKind::Semicolon)?;
        Ok(Field {
            label,
            field_type: Some(field_type),
            name,
            field_number,
            field_options,
            loc: self.loc_from(first),
        })
    }

    /// group = label "group" ident "=" intLit ["[" fieldOpts "]"] "{" messageBody* "}"
    fn parse_group(&mut self) -> Result<Group, ParseError> {
        let first = self.current_index();
        let label = match self.keyword().and_then(Label::from_keyword) {
            Some(label) => {
                self.advance();
                label
            }
            None => return Err(self.unexpected("'required', 'optional' or 'repeated'")),
        };
        self.expect_keyword("group")?;
        let name = self.expect_name()?;
        self.expect(TokenKind::Equal)?;
        let field_number = self.parse_field_number()?;
        let options = self.parse_field_options()?;
        self.enter()?;
        let body = self.parse_message_block()?;
        self.leave();
        Ok(Group {
            label,
            name,
            field_number,
            options,
            body,
            loc: self.loc_from(first),
        })
    }

    /// mapField = "map" "<" primitiveType "," valueType ">" ident "=" intLit
    ///            ["[" fieldOpts "]"] ";"
    fn parse_map_field(&mut self) -> Result<MapField, ParseError> {
        let first = self.expect_keyword("map")?;
        self.expect(TokenKind::Less)?;
        let key_type = self.peek().lexeme.clone();
        self.expect(TokenKind::PrimitiveType)?;
        self.expect(TokenKind::Comma)?;
        let value_type = self.parse_value_type()?;
        self.expect(TokenKind::Greater)?;
        let map_name = self.expect_name()?;
        self.expect(TokenKind::Equal)?;
        let field_number = self.parse_field_number()?;
        let options = self.parse_field_options()?;
        self.expect(TokenKind::Semicolon)?;
        Ok(MapField {
            key_type,
            value_type,
            map_name,
            field_number,
            options,
            loc: self.loc_from(first),
        })
    }

    /// oneof = "oneof" ident "{" { option | field | ";" } "}"
    fn parse_oneof(&mut self) -> Result<OneOf, ParseError> {
        let first = self.expect_keyword("oneof")?;
        let oneof_name = self.expect_name()?;
        self.expect(TokenKind::LeftBrace)?;

        let mut options = Vec::new();
        let mut fields = Vec::new();
        while !self.check(TokenKind::RightBrace) {
            if self.eat(TokenKind::Semicolon).is_some() {
                continue;
            }
            if self.check_keyword("option") && self.peek_next().kind != TokenKind::Dot {
                options.push(self.parse_option()?);
            } else if self.peek().is_name() || self.check(TokenKind::Dot) {
                fields.push(self.parse_field()?);
            } else {
                return Err(self.unexpected("'option', field or '}'"));
            }
        }
        self.expect(TokenKind::RightBrace)?;

        Ok(OneOf {
            oneof_name,
            options,
            fields,
            loc: self.loc_from(first),
        })
    }

    /// enum = "enum" ident "{" { option | reserved | enumField | ";" } "}"
    fn parse_enum(&mut self) -> Result<Enum, ParseError> {
        let first = self.expect_keyword("enum")?;
        let name = self.expect_name()?;
        self.expect(TokenKind::LeftBrace)?;

        let mut options = Vec::new();
        let mut fields = Vec::new();
        let mut reserved = Vec::new();
        while !self.check(TokenKind::RightBrace) {
            if self.eat(TokenKind::Semicolon).is_some() {
                continue;
            }
            // `option = 1;` declares a value named "option".
            let statement = self.peek_next().kind != TokenKind::Equal;
            if statement && self.check_keyword("option") {
                options.push(self.parse_option()?);
            } else if statement && self.check_keyword("reserved") {
                reserved.push(self.parse_reserved()?);
            } else if self.peek().is_name() {
                fields.push(self.parse_enum_field()?);
            } else {
                return Err(self.unexpected("'option', 'reserved', enum value or '}'"));
            }
        }
        self.expect(TokenKind::RightBrace)?;

        Ok(Enum {
            name,
            options,
            fields,
            reserved,
            loc: self.loc_from(first),
        })
    }

    /// enumField = ident "=" ["-"] intLit ["[" fieldOpts "]"] ";"
    fn parse_enum_field(&mut self) -> Result<Field, ParseError> {
        let first = self.current_index();
        let name = self.expect_name()?;
        self.expect(TokenKind::Equal)?;
        let field_number = self.parse_signed_int()?;
        let field_options = self.parse_field_options()?;
        self.expect(TokenKind::Semicolon)?;
        Ok(Field {
            label: None,
            field_type: None,
            name,
            field_number,
            field_options,
            loc: self.loc_from(first),
        })
    }

    /// extensions = "extensions" ranges ["[" fieldOpts "]"] ";"
    fn parse_extensions(&mut self) -> Result<Extensions, ParseError> {
        let first = self.expect_keyword("extensions")?;
        let ranges = self.parse_ranges()?;
        let options = self.parse_field_options()?;
        self.expect(TokenKind::Semicolon)?;
        Ok(Extensions {
            ranges,
            options,
            loc: self.loc_from(first),
        })
    }

    /// reserved = "reserved" ( ranges | strLit { "," strLit } ) ";"
    fn parse_reserved(&mut self) -> Result<Reserved, ParseError> {
        let first = self.expect_keyword("reserved")?;
        let items = if self.check(TokenKind::String) {
            let mut names = vec![self.expect_string()?];
            while self.eat(TokenKind::Comma).is_some() {
                names.push(self.expect_string()?);
            }
            ReservedItems::FieldNames(names)
        } else {
            ReservedItems::Ranges(self.parse_ranges()?)
        };
        self.expect(TokenKind::Semicolon)?;
        Ok(Reserved {
            items,
            loc: self.loc_from(first),
        })
    }

    fn parse_ranges(&mut self) -> Result<Vec<Range>, ParseError> {
        let mut ranges = vec![self.parse_range()?];
        while self.eat(TokenKind::Comma).is_some() {
            ranges.push(self.parse_range()?);
        }
        Ok(ranges)
    }

    /// range = intLit [ "to" ( intLit | "max" ) ]
    fn parse_range(&mut self) -> Result<Range, ParseError> {
        let low = self.parse_signed_int()?;
        if self.eat_keyword("to").is_none() {
            return Ok(Range::Single(low));
        }
        if self.eat_keyword("max").is_some() {
            return Ok(Range::Span(low, RangeEnd::Max));
        }
        let high = self.parse_signed_int()?;
        Ok(Range::Span(low, RangeEnd::Value(high)))
    }

    /// extend = "extend" valueType "{" { field | group | ";" } "}"
    fn parse_extend(&mut self) -> Result<Extend, ParseError> {
        let first = self.expect_keyword("extend")?;
        let extendee = self.parse_value_type()?;
        self.enter()?;
        self.expect(TokenKind::LeftBrace)?;

        let mut body = Vec::new();
        while !self.check(TokenKind::RightBrace) {
            if self.eat(TokenKind::Semicolon).is_some() {
                continue;
            }
            if !(self.peek().is_name() || self.check(TokenKind::Dot)) {
                return Err(self.unexpected("field or '}'"));
            }
            let is_group = self.keyword().and_then(Label::from_keyword).is_some()
                && self.peek_next().is_keyword("group");
            if is_group {
                body.push(ExtendBody::Group(self.parse_group()?));
            } else {
                body.push(ExtendBody::Field(self.parse_field()?));
            }
        }
        self.expect(TokenKind::RightBrace)?;
        self.leave();

        Ok(Extend {
            extendee,
            body,
            loc: self.loc_from(first),
        })
    }

    /// service = "service" ident "{" { option | rpc | ";" } "}"
    fn parse_service(&mut self) -> Result<Service, ParseError> {
        let first = self.expect_keyword("service")?;
        let name = self.expect_name()?;
        self.expect(TokenKind::LeftBrace)?;

        let mut body = Vec::new();
        while !self.check(TokenKind::RightBrace) {
            if self.eat(TokenKind::Semicolon).is_some() {
                continue;
            }
            match self.keyword() {
                Some("option") => body.push(ServiceBody::Option(self.parse_option()?)),
                Some("rpc") => body.push(ServiceBody::Rpc(self.parse_rpc()?)),
                _ => return Err(self.unexpected("'option', 'rpc' or '}'")),
            }
        }
        self.expect(TokenKind::RightBrace)?;

        Ok(Service {
            name,
            body,
            loc: self.loc_from(first),
        })
    }

    /// rpc = "rpc" ident "(" ["stream"] valueType ")" "returns"
    ///       "(" ["stream"] valueType ")" ( ";" | "{" { option | ";" } "}" )
    fn parse_rpc(&mut self) -> Result<Rpc, ParseError> {
        let first = self.expect_keyword("rpc")?;
        let name = self.expect_name()?;
        let (input_stream, input) = self.parse_rpc_type()?;
        self.expect_keyword("returns")?;
        let (output_stream, output) = self.parse_rpc_type()?;

        let mut options = Vec::new();
        if self.eat(TokenKind::LeftBrace).is_some() {
            while !self.check(TokenKind::RightBrace) {
                if self.eat(TokenKind::Semicolon).is_some() {
                    continue;
                }
                if !self.check_keyword("option") {
                    return Err(self.unexpected("'option' or '}'"));
                }
                options.push(self.parse_option()?);
            }
            self.expect(TokenKind::RightBrace)?;
        } else {
            self.expect(TokenKind::Semicolon)?;
        }

        Ok(Rpc {
            name,
            input_stream,
            input,
            output_stream,
            output,
            options,
            loc: self.loc_from(first),
        })
    }

    fn parse_rpc_type(&mut self) -> Result<(bool, ValueType), ParseError> {
        self.expect(TokenKind::LeftParen)?;
        // `(stream)` names a message type called "stream"; `(stream.T)` streams `.T`.
        let stream = self.check_keyword("stream") && self.peek_next().kind != TokenKind::RightParen;
        if stream {
            self.advance();
        }
        let value_type = self.parse_value_type()?;
        self.expect(TokenKind::RightParen)?;
        Ok((stream, value_type))
    }

    fn parse_field_number(&mut self) -> Result<i64, ParseError> {
        let line = self.peek().line();
        let number = self.parse_signed_int()?;
        if number < 0 && !self.config.allow_negative_field_numbers {
            return Err(ParseError::NegativeFieldNumber { number, line });
        }
        Ok(number)
    }

    /// ["-"] intLit
    fn parse_signed_int(&mut self) -> Result<i64, ParseError> {
        let negative = self.eat(TokenKind::Minus).is_some();
        let tok = self.peek();
        let Some(Number::Int(magnitude)) = tok.number_value() else {
            return Err(self.unexpected("integer"));
        };
        let line = tok.line();
        let lexeme = tok.lexeme.clone();
        self.advance();

        let value = if negative {
            -i128::from(magnitude)
        } else {
            i128::from(magnitude)
        };
        i64::try_from(value).map_err(|_| ParseError::IntegerOutOfRange {
            lexeme: if negative { format!("-{}", lexeme) } else { lexeme },
            line,
        })
    }

    fn enter(&mut self) -> Result<(), ParseError> {
        self.depth += 1;
        if self.depth > self.config.max_depth {
            return Err(ParseError::NestingTooDeep {
                limit: self.config.max_depth,
                line: self.peek().line(),
            });
        }
        Ok(())
    }

    fn leave(&mut self) {
        self.depth -= 1;
    }

    // Cursor helpers

    fn peek(&self) -> &Token {
        &self.tokens[self.significant[self.pos]]
    }

    /// One token past the current one; used only to disambiguate keywords.
    fn peek_next(&self) -> &Token {
        let i = (self.pos + 1).min(self.significant.len() - 1);
        &self.tokens[self.significant[i]]
    }

    fn current_index(&self) -> usize {
        self.significant[self.pos]
    }

    fn last_consumed(&self) -> usize {
        self.significant[self.pos.saturating_sub(1)]
    }

    fn is_at_end(&self) -> bool {
        self.peek().kind == TokenKind::Eof
    }

    fn advance(&mut self) -> usize {
        let index = self.current_index();
        if !self.is_at_end() {
            self.pos += 1;
        }
        index
    }

    fn advance_kind(&mut self) -> TokenKind {
        let index = self.advance();
        self.tokens[index].kind
    }

    /// The current identifier's lexeme, for contextual keyword dispatch.
    fn keyword(&self) -> Option<&'static str> {
        const KEYWORDS: [&str; 17] = [
            "import", "package", "option", "message", "enum", "extend", "service", "extensions",
            "oneof", "reserved", "map", "required", "optional", "repeated", "group", "rpc",
            "syntax",
        ];
        let tok = self.peek();
        if tok.kind != TokenKind::Identifier {
            return None;
        }
        KEYWORDS.iter().copied().find(|k| *k == tok.lexeme)
    }

    fn check(&self, kind: TokenKind) -> bool {
        self.peek().kind == kind
    }

    fn check_keyword(&self, keyword: &str) -> bool {
        self.peek().is_keyword(keyword)
    }

    fn eat(&mut self, kind: TokenKind) -> Option<usize> {
        if self.check(kind) {
            Some(self.advance())
        } else {
            None
        }
    }

    fn eat_keyword(&mut self, keyword: &str) -> Option<usize> {
        if self.check_keyword(keyword) {
            Some(self.advance())
        } else {
            None
        }
    }

    fn expect(&mut self, kind: TokenKind) -> Result<usize, ParseError> {
        self.eat(kind).ok_or_else(|| self.unexpected(kind.to_string()))
    }

    fn expect_keyword(&mut self, keyword: &str) -> Result<usize, ParseError> {
        self.eat_keyword(keyword)
            .ok_or_else(|| self.unexpected(format!("'{}'", keyword)))
    }

    fn expect_name(&mut self) -> Result<String, ParseError> {
        if !self.peek().is_name() {
            return Err(self.unexpected("identifier"));
        }
        let name = self.peek().lexeme.clone();
        self.advance();
        Ok(name)
    }

    fn expect_string(&mut self) -> Result<String, ParseError> {
        let value = match self.peek().str_value() {
            Some(s) if self.check(TokenKind::String) => s.to_string(),
            _ => return Err(self.unexpected("string literal")),
        };
        self.advance();
        Ok(value)
    }

    fn unexpected(&self, expected: impl Into<String>) -> ParseError {
        let tok = self.peek();
        ParseError::UnexpectedToken {
            expected: expected.into(),
            found: tok.kind,
            lexeme: tok.lexeme.clone(),
            line: tok.line(),
            column: tok.column(),
        }
    }

    fn loc_from(&self, first: usize) -> Location {
        Location::new(&self.tokens, first, self.last_consumed())
    }
}
