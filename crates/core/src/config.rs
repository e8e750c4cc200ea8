/// Characters at which panic-mode recovery stops skipping.
pub const DEFAULT_SYNC_CHARS: [char; 6] = ['\n', ';', ',', '}', ')', ']'];

/// Parser behavior knobs.
///
/// ```
/// use packrat_cst_core::ParserConfig;
///
/// let config = ParserConfig::default()
///     .with_sync_chars(['\n', ';'])
///     .with_max_input_size(Some(1 << 20));
/// assert!(config.memoize);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub struct ParserConfig {
    /// Cache rule outcomes per position. Turning this off gives the same
    /// results, only slower.
    pub memoize: bool,
    /// Characters at which recovery stops skipping.
    pub sync_chars: Vec<char>,
    /// Reject inputs longer than this many bytes without parsing them.
    pub max_input_size: Option<usize>,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            memoize: true,
            sync_chars: DEFAULT_SYNC_CHARS.to_vec(),
            max_input_size: None,
        }
    }
}

impl ParserConfig {
    /// Enable or disable the packrat cache.
    pub fn with_memoize(mut self, memoize: bool) -> Self {
        self.memoize = memoize;
        self
    }

    /// Replace the recovery synchronization characters.
    pub fn with_sync_chars(mut self, chars: impl IntoIterator<Item = char>) -> Self {
        self.sync_chars = chars.into_iter().collect();
        self
    }

    /// Set or clear the input size limit.
    pub fn with_max_input_size(mut self, limit: Option<usize>) -> Self {
        self.max_input_size = limit;
        self
    }

    pub(crate) fn is_sync(&self, c: char) -> bool {
        self.sync_chars.contains(&c)
    }
}
