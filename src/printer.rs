//! Re-serialize an AST back into schema text.
//!
//! The output is canonical rather than faithful: one statement per line,
//! one tab per nesting level, no comments. Parsing the printed text yields
//! the same tree modulo locations.
//!
//! ```rust
//! let file = protoparse::parse("message M{int32 a=1;}").unwrap();
//! assert_eq!(protoparse::print(&file), "message M {\n\tint32 a = 1;\n}\n");
//! ```

use crate::parser::ast::*;

/// A node that can be written as schema text.
pub trait Print {
    fn print_to(&self, printer: &mut Printer);
}

/// Serialize any node.
pub fn print<N: Print + ?Sized>(node: &N) -> String {
    let mut printer = Printer::new();
    node.print_to(&mut printer);
    printer.finish()
}

/// Indentation-aware output buffer.
#[derive(Debug, Default)]
pub struct Printer {
    out: String,
    indent: usize,
}

impl Printer {
    pub fn new() -> Self {
        Printer::default()
    }

    pub fn finish(self) -> String {
        self.out
    }

    fn line(&mut self, text: &str) {
        for _ in 0..self.indent {
            self.out.push('\t');
        }
        self.out.push_str(text);
        self.out.push('\n');
    }

    fn open(&mut self, header: &str) {
        self.line(&format!("{} {{", header));
        self.indent += 1;
    }

    fn close(&mut self) {
        self.indent -= 1;
        self.line("}");
    }

    fn nodes<N: Print>(&mut self, nodes: &[N]) {
        for node in nodes {
            node.print_to(self);
        }
    }
}

impl Print for ProtoFile {
    fn print_to(&self, p: &mut Printer) {
        if let Some(syntax) = &self.syntax {
            syntax.print_to(p);
        }
        p.nodes(&self.body);
    }
}

impl Print for TopLevelDirective {
    fn print_to(&self, p: &mut Printer) {
        match self {
            TopLevelDirective::Import(n) => n.print_to(p),
            TopLevelDirective::Package(n) => n.print_to(p),
            TopLevelDirective::Option(n) => n.print_to(p),
            TopLevelDirective::Message(n) => n.print_to(p),
            TopLevelDirective::Enum(n) => n.print_to(p),
            TopLevelDirective::Extend(n) => n.print_to(p),
            TopLevelDirective::Service(n) => n.print_to(p),
        }
    }
}

impl Print for SyntaxStatement {
    fn print_to(&self, p: &mut Printer) {
        p.line(&format!("syntax = \"{}\";", self.value.as_str()));
    }
}

impl Print for ImportStatement {
    fn print_to(&self, p: &mut Printer) {
        match self.modifier {
            Some(m) => p.line(&format!("import {} {};", m.as_str(), quote(&self.file))),
            None => p.line(&format!("import {};", quote(&self.file))),
        }
    }
}

impl Print for Package {
    fn print_to(&self, p: &mut Printer) {
        p.line(&format!("package {};", self.name.value));
    }
}

impl Print for OptionStatement {
    fn print_to(&self, p: &mut Printer) {
        p.line(&format!("option {};", option_entry(self)));
    }
}

impl Print for Message {
    fn print_to(&self, p: &mut Printer) {
        p.open(&format!("message {}", self.name));
        p.nodes(&self.body);
        p.close();
    }
}

impl Print for MessageBody {
    fn print_to(&self, p: &mut Printer) {
        match self {
            MessageBody::Field(n) => n.print_to(p),
            MessageBody::Enum(n) => n.print_to(p),
            MessageBody::Message(n) => n.print_to(p),
            MessageBody::Extend(n) => n.print_to(p),
            MessageBody::Extensions(n) => n.print_to(p),
            MessageBody::Group(n) => n.print_to(p),
            MessageBody::Option(n) => n.print_to(p),
            MessageBody::OneOf(n) => n.print_to(p),
            MessageBody::MapField(n) => n.print_to(p),
            MessageBody::Reserved(n) => n.print_to(p),
        }
    }
}

impl Print for Field {
    fn print_to(&self, p: &mut Printer) {
        let mut text = String::new();
        if let Some(label) = self.label {
            text.push_str(label.as_str());
            text.push(' ');
        }
        if let Some(ty) = &self.field_type {
            text.push_str(&ty.value);
            text.push(' ');
        }
        text.push_str(&format!(
            "{} = {}{};",
            self.name,
            self.field_number,
            field_options(&self.field_options)
        ));
        p.line(&text);
    }
}

impl Print for Group {
    fn print_to(&self, p: &mut Printer) {
        p.open(&format!(
            "{} group {} = {}{}",
            self.label.as_str(),
            self.name,
            self.field_number,
            field_options(&self.options)
        ));
        p.nodes(&self.body);
        p.close();
    }
}

impl Print for Enum {
    fn print_to(&self, p: &mut Printer) {
        p.open(&format!("enum {}", self.name));
        p.nodes(&self.options);
        p.nodes(&self.fields);
        p.nodes(&self.reserved);
        p.close();
    }
}

impl Print for OneOf {
    fn print_to(&self, p: &mut Printer) {
        p.open(&format!("oneof {}", self.oneof_name));
        p.nodes(&self.options);
        p.nodes(&self.fields);
        p.close();
    }
}

impl Print for MapField {
    fn print_to(&self, p: &mut Printer) {
        p.line(&format!(
            "map<{}, {}> {} = {}{};",
            self.key_type,
            self.value_type.value,
            self.map_name,
            self.field_number,
            field_options(&self.options)
        ));
    }
}

impl Print for Extensions {
    fn print_to(&self, p: &mut Printer) {
        p.line(&format!(
            "extensions {}{};",
            ranges(&self.ranges),
            field_options(&self.options)
        ));
    }
}

impl Print for Reserved {
    fn print_to(&self, p: &mut Printer) {
        let items = match &self.items {
            ReservedItems::Ranges(r) => ranges(r),
            ReservedItems::FieldNames(names) => names
                .iter()
                .map(|n| quote(n))
                .collect::<Vec<_>>()
                .join(", "),
        };
        p.line(&format!("reserved {};", items));
    }
}

impl Print for Extend {
    fn print_to(&self, p: &mut Printer) {
        p.open(&format!("extend {}", self.extendee.value));
        p.nodes(&self.body);
        p.close();
    }
}

impl Print for ExtendBody {
    fn print_to(&self, p: &mut Printer) {
        match self {
            ExtendBody::Field(n) => n.print_to(p),
            ExtendBody::Group(n) => n.print_to(p),
        }
    }
}

impl Print for Service {
    fn print_to(&self, p: &mut Printer) {
        p.open(&format!("service {}", self.name));
        p.nodes(&self.body);
        p.close();
    }
}

impl Print for ServiceBody {
    fn print_to(&self, p: &mut Printer) {
        match self {
            ServiceBody::Option(n) => n.print_to(p),
            ServiceBody::Rpc(n) => n.print_to(p),
        }
    }
}

impl Print for Rpc {
    fn print_to(&self, p: &mut Printer) {
        let stream = |s: bool| if s { "stream " } else { "" };
        let header = format!(
            "rpc {} ({}{}) returns ({}{})",
            self.name,
            stream(self.input_stream),
            self.input.value,
            stream(self.output_stream),
            self.output.value
        );
        if self.options.is_empty() {
            p.line(&format!("{};", header));
        } else {
            p.open(&header);
            p.nodes(&self.options);
            p.close();
        }
    }
}

impl Print for FullIdentifier {
    fn print_to(&self, p: &mut Printer) {
        p.out.push_str(&self.value);
    }
}

impl Print for OptionName {
    fn print_to(&self, p: &mut Printer) {
        p.out.push_str(&self.value);
    }
}

impl Print for ValueType {
    fn print_to(&self, p: &mut Printer) {
        p.out.push_str(&self.value);
    }
}

impl Print for Constant {
    fn print_to(&self, p: &mut Printer) {
        p.out.push_str(&constant(self));
    }
}

impl Print for Literal {
    fn print_to(&self, p: &mut Printer) {
        p.out.push_str(&literal(&self.value));
    }
}

fn option_entry(option: &OptionStatement) -> String {
    format!("{} = {}", option.name.value, constant(&option.value))
}

fn field_options(options: &[OptionStatement]) -> String {
    if options.is_empty() {
        return String::new();
    }
    let entries: Vec<_> = options.iter().map(option_entry).collect();
    format!(" [{}]", entries.join(", "))
}

fn constant(value: &Constant) -> String {
    match value {
        Constant::Identifier(id) => id.value.clone(),
        Constant::Literal(lit) => literal(&lit.value),
    }
}

fn literal(value: &LiteralValue) -> String {
    match value {
        LiteralValue::String(s) => quote(s),
        LiteralValue::Int { negative: true, value } => format!("-{}", value),
        LiteralValue::Int { negative: false, value } => value.to_string(),
        LiteralValue::Bool(b) => b.to_string(),
        // Bare `inf`/`nan` would read back as identifiers.
        LiteralValue::Float(f) if f.is_nan() => "+nan".to_string(),
        LiteralValue::Float(f) if f.is_infinite() => {
            let sign = if *f > 0.0 { '+' } else { '-' };
            format!("{}inf", sign)
        }
        // Debug keeps the fractional part so the value scans back as a float.
        LiteralValue::Float(f) => format!("{:?}", f),
    }
}

fn ranges(ranges: &[Range]) -> String {
    ranges
        .iter()
        .map(|r| match r {
            Range::Single(n) => n.to_string(),
            Range::Span(low, RangeEnd::Max) => format!("{} to max", low),
            Range::Span(low, RangeEnd::Value(high)) => format!("{} to {}", low, high),
        })
        .collect::<Vec<_>>()
        .join(", ")
}

/// Quote raw string text with whichever quote character it does not
/// contain unescaped.
fn quote(raw: &str) -> String {
    if has_unescaped(raw, '"') {
        format!("'{}'", raw)
    } else {
        format!("\"{}\"", raw)
    }
}

fn has_unescaped(raw: &str, quote: char) -> bool {
    let mut escaped = false;
    for c in raw.chars() {
        if escaped {
            escaped = false;
        } else if c == '\\' {
            escaped = true;
        } else if c == quote {
            return true;
        }
    }
    false
}
