/// Default maximum number of nested grammar productions for one parse call.
pub const DEFAULT_MAX_DEPTH: usize = 800;

/// Default maximum nesting of a tree walked after parsing, by the binder
/// and the JSON writers. Their frames are larger than the parser's, so the
/// bound is lower than [`DEFAULT_MAX_DEPTH`].
pub const DEFAULT_MAX_TREE_DEPTH: usize = 256;

/// Limits applied to a single parse operation.
///
/// # Examples
///
/// ```
/// use odata_query::ParserSettings;
///
/// let settings = ParserSettings::default().with_max_depth(64);
/// assert_eq!(settings.max_depth, 64);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParserSettings {
    /// Every production of the expression grammar counts one level, as does
    /// every operator of a binary chain and every `/` of a member path.
    pub max_depth: usize,
}

impl ParserSettings {
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }
}

impl Default for ParserSettings {
    fn default() -> Self {
        ParserSettings {
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}
