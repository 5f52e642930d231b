use serde::{Deserialize, Serialize};

/// Source position within a file (1-based line/column, 0-based byte offset).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Position {
    /// 1-based line number.
    pub line: u32,
    /// 1-based column number.
    pub column: u32,
    /// 0-based byte offset from start of file.
    #[serde(default)]
    pub offset: u32,
}

impl Position {
    pub fn new(line: u32, column: u32, offset: u32) -> Self {
        Self {
            line,
            column,
            offset,
        }
    }
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_is_line_colon_column() {
        assert_eq!(Position::new(3, 14, 40).to_string(), "3:14");
    }

    #[test]
    fn offset_defaults_when_absent() {
        let pos: Position = toml::from_str("line = 2\ncolumn = 5").unwrap();
        assert_eq!(pos, Position::new(2, 5, 0));
    }
}
