use super::{quote_with, Grammar};

/// SQLite：双引号转义，`?` 占位符
#[derive(Debug, Clone, Copy, Default)]
pub struct SqliteGrammar;

impl Grammar for SqliteGrammar {
    fn name(&self) -> &'static str {
        "sqlite3"
    }

    fn quote(&self, identifier: &str) -> String {
        quote_with(identifier, '"')
    }

    fn placeholder(&self, _index: usize) -> String {
        "?".to_string()
    }

    fn insert_keyword(&self, or_ignore: bool) -> &'static str {
        if or_ignore {
            "INSERT OR IGNORE"
        } else {
            "INSERT"
        }
    }
}
