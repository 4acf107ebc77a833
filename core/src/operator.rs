/// 允许出现在条件中的比较运算符
pub const OPERATORS: &[&str] = &[
    "=", "!=", "<", ">", "<=", ">=", "<>", "&", "|", "^", "<<", ">>", "LIKE", "NOT LIKE",
];

/// 判断运算符是否在白名单内（LIKE 不区分大小写）
pub fn is_operator(operator: &str) -> bool {
    lookup(operator).is_some()
}

/// 校验运算符并返回规范写法，未知运算符直接 panic
pub(crate) fn checked(operator: &str) -> &'static str {
    lookup(operator)
        .unwrap_or_else(|| panic!("sqlxfluent: operator \"{}\" is not allowed", operator))
}

fn lookup(operator: &str) -> Option<&'static str> {
    let normalized = operator
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_uppercase();
    OPERATORS.iter().copied().find(|op| *op == normalized)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_operators() {
        assert_eq!(checked("="), "=");
        assert_eq!(checked("<>"), "<>");
        assert_eq!(checked("like"), "LIKE");
        assert_eq!(checked("not  like"), "NOT LIKE");
        assert!(is_operator(">>"));
        assert!(!is_operator("=="));
    }

    #[test]
    #[should_panic(expected = "sqlxfluent: operator \"==\" is not allowed")]
    fn test_unknown_operator_panics() {
        checked("==");
    }

    #[test]
    #[should_panic(expected = "is not allowed")]
    fn test_sql_injection_operator_panics() {
        checked("= 1; DROP TABLE users; --");
    }
}
