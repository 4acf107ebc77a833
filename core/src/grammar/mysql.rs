use super::{quote_with, Grammar};

/// MySQL：反引号转义，`?` 占位符
#[derive(Debug, Clone, Copy, Default)]
pub struct MySqlGrammar;

impl Grammar for MySqlGrammar {
    fn name(&self) -> &'static str {
        "mysql"
    }

    fn quote(&self, identifier: &str) -> String {
        quote_with(identifier, '`')
    }

    fn placeholder(&self, _index: usize) -> String {
        "?".to_string()
    }

    fn insert_keyword(&self, or_ignore: bool) -> &'static str {
        if or_ignore {
            "INSERT IGNORE"
        } else {
            "INSERT"
        }
    }

    // MySQL 没有 RETURNING
    fn supports_returning(&self) -> bool {
        false
    }
}
