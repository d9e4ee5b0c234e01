/// PostgreSQL's `NAMEDATALEN - 1`.
pub const POSTGRES_MAX_IDENTIFIER_LEN: usize = 63;

/// Capability profile of the SQL dialect targeted by the compiler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dialect {
    /// Dialect identifier (e.g. `postgres`).
    pub name: String,
    /// Maximum identifier length in bytes.
    pub max_identifier_len: usize,
    /// Whether `~` / `!~` regular expression matching is available.
    pub regex_match: bool,
    /// Whether `~*` / `!~*` case-insensitive matching is available.
    pub case_insensitive_regex: bool,
}

impl Dialect {
    /// The PostgreSQL profile.
    pub fn postgres() -> Self {
        Self {
            name: "postgres".to_string(),
            max_identifier_len: POSTGRES_MAX_IDENTIFIER_LEN,
            regex_match: true,
            case_insensitive_regex: true,
        }
    }

    pub fn with_max_identifier_len(mut self, len: usize) -> Self {
        self.max_identifier_len = len;
        self
    }
}

impl Default for Dialect {
    fn default() -> Self {
        Self::postgres()
    }
}
