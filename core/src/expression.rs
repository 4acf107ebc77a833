use crate::value::BindValue;
use std::fmt;

/// 原始 SQL 片段
///
/// 文本原样输出，不做标识符转义；片段中的每个 `?` 对应一个绑定值，
/// 编译时按方言改写为占位符。绑定值只能是标量，不能再嵌套表达式。
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Expression {
    text: String,
    bindings: Vec<BindValue>,
}

impl Expression {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            bindings: Vec::new(),
        }
    }

    /// 追加一个绑定值
    pub fn bind(mut self, value: impl Into<BindValue>) -> Self {
        self.bindings.push(value.into());
        self
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn bindings(&self) -> &[BindValue] {
        &self.bindings
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

impl From<&str> for Expression {
    fn from(text: &str) -> Self {
        Expression::new(text)
    }
}

impl From<String> for Expression {
    fn from(text: String) -> Self {
        Expression::new(text)
    }
}

/// 创建不带绑定值的原始片段
pub fn raw(text: impl Into<String>) -> Expression {
    Expression::new(text)
}

/// 创建原始片段并依次绑定参数
///
/// ```ignore
/// let expr = sqlxfluent::raw!("age > ? AND age < ?", 18, 60);
/// ```
#[macro_export]
macro_rules! raw {
    ($text:expr $(, $bind:expr)* $(,)?) => {
        $crate::Expression::new($text)$(.bind($bind))*
    };
}
