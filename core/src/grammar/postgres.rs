use super::{quote_with, Grammar};

/// PostgreSQL：双引号转义，`$N` 占位符
#[derive(Debug, Clone, Copy, Default)]
pub struct PostgresGrammar;

impl Grammar for PostgresGrammar {
    fn name(&self) -> &'static str {
        "postgres"
    }

    fn quote(&self, identifier: &str) -> String {
        quote_with(identifier, '"')
    }

    fn placeholder(&self, index: usize) -> String {
        format!("${}", index)
    }

    /// 保留类型转换后缀：`created_at::date` -> `"created_at"::date`
    fn wrap_name(&self, name: &str) -> String {
        let (path, cast) = match name.split_once("::") {
            Some((path, cast)) => (path, Some(cast)),
            None => (name, None),
        };

        let wrapped = path
            .split('.')
            .map(|segment| {
                if segment == "*" {
                    segment.to_string()
                } else {
                    self.quote(segment)
                }
            })
            .collect::<Vec<_>>()
            .join(".");

        match cast {
            Some(cast) => format!("{}::{}", wrapped, cast),
            None => wrapped,
        }
    }

    fn on_conflict(&self, or_ignore: bool) -> &'static str {
        if or_ignore {
            "ON CONFLICT DO NOTHING"
        } else {
            ""
        }
    }
}
