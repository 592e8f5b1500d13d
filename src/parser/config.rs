//! Parser configuration knobs.

/// Options controlling how permissive the grammar layer is.
///
/// ```
/// use protoparse::parser::ParserConfig;
///
/// let config = ParserConfig::default()
///     .with_negative_field_numbers(false)
///     .with_max_depth(16);
/// assert!(!config.allow_negative_field_numbers);
/// assert_eq!(config.max_depth, 16);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParserConfig {
    /// Accept `int32 x = -1;`. Negative field numbers are meaningless to
    /// protobuf but syntactically allowed by the grammar.
    pub allow_negative_field_numbers: bool,
    /// Maximum nesting of message, group and extend bodies.
    ///
    /// Each level recurses through several parser frames. The default fits
    /// the 2 MiB stack of a spawned thread in debug builds; limits above
    /// roughly 128 need the caller to parse on a thread with a larger stack.
    pub max_depth: usize,
}

impl Default for ParserConfig {
    fn default() -> Self {
        ParserConfig {
            allow_negative_field_numbers: true,
            max_depth: 64,
        }
    }
}

impl ParserConfig {
    pub fn with_negative_field_numbers(mut self, allow: bool) -> Self {
        self.allow_negative_field_numbers = allow;
        self
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }
}
