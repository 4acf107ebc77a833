use crate::builder::Builder;
use crate::error::SqlxFluentError;
use crate::expression::Expression;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// 绑定值，用于安全地传递参数
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum BindValue {
    String(String),
    Int64(i64),
    Int32(i32),
    Int16(i16),
    Float64(f64),
    Float32(f32),
    Bool(bool),
    Bytes(Vec<u8>),
    DateTime(NaiveDateTime),
    Null,
}

/// 条件右值、赋值、插入值的统一表示
///
/// - `Bind`：普通参数，编译为一个占位符
/// - `Raw`：原始片段，原样输出并带出自身的绑定值
/// - `Query`：子查询，编译为 `( ... )`
#[derive(Debug, Clone)]
pub enum Value {
    Bind(BindValue),
    Raw(Expression),
    Query(Box<Builder>),
}

impl Value {
    /// 按编译顺序展开的绑定值
    pub fn bindings(&self) -> Vec<BindValue> {
        match self {
            Value::Bind(v) => vec![v.clone()],
            Value::Raw(expr) => expr.bindings().to_vec(),
            Value::Query(sub) => sub.data(),
        }
    }
}

macro_rules! impl_from_scalar {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for BindValue {
                fn from(v: $ty) -> Self {
                    BindValue::$variant(v.into())
                }
            }

            impl From<$ty> for Value {
                fn from(v: $ty) -> Self {
                    Value::Bind(v.into())
                }
            }
        )*
    };
}

impl_from_scalar!(
    String => String,
    &str => String,
    &String => String,
    i64 => Int64,
    i32 => Int32,
    i16 => Int16,
    i8 => Int16,
    u32 => Int64,
    u16 => Int32,
    u8 => Int16,
    f64 => Float64,
    f32 => Float32,
    bool => Bool,
    Vec<u8> => Bytes,
    &[u8] => Bytes,
    NaiveDateTime => DateTime,
);

impl<T: Into<BindValue>> From<Option<T>> for BindValue {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(BindValue::Null)
    }
}

impl<T: Into<BindValue>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        Value::Bind(v.into())
    }
}

impl From<BindValue> for Value {
    fn from(v: BindValue) -> Self {
        Value::Bind(v)
    }
}

impl From<Expression> for Value {
    fn from(expr: Expression) -> Self {
        Value::Raw(expr)
    }
}

impl From<Builder> for Value {
    fn from(builder: Builder) -> Self {
        Value::Query(Box::new(builder))
    }
}

/// 列名到值的映射，用于 insert / update
///
/// 列按名称排序保存，编译与绑定顺序都以排序后的顺序为准。
#[derive(Debug, Clone, Default)]
pub struct Data(BTreeMap<String, Value>);

impl Data {
    pub fn new() -> Self {
        Self::default()
    }

    /// 链式写入一列
    pub fn set(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(column, value);
        self
    }

    pub fn insert(&mut self, column: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(column.into(), value.into());
    }

    pub fn get(&self, column: &str) -> Option<&Value> {
        self.0.get(column)
    }

    pub fn remove(&mut self, column: &str) -> Option<Value> {
        self.0.remove(column)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// 排序后的列名
    pub fn columns(&self) -> Vec<String> {
        self.0.keys().cloned().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    pub(crate) fn into_values(self) -> Vec<Value> {
        self.0.into_values().collect()
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Data {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut data = Data::new();
        for (column, value) in iter {
            data.insert(column, value);
        }
        data
    }
}

/// 从 JSON 对象构造数据载荷，嵌套数组/对象按 JSON 文本写入
impl TryFrom<serde_json::Value> for Data {
    type Error = SqlxFluentError;

    fn try_from(json: serde_json::Value) -> Result<Self, Self::Error> {
        let map = match json {
            serde_json::Value::Object(map) => map,
            other => {
                return Err(SqlxFluentError::InvalidData(format!(
                    "expected a JSON object, got: {}",
                    other
                )))
            }
        };

        let mut data = Data::new();
        for (column, value) in map {
            let bind = match value {
                serde_json::Value::Null => BindValue::Null,
                serde_json::Value::Bool(b) => BindValue::Bool(b),
                serde_json::Value::Number(n) => match n.as_i64() {
                    Some(i) => BindValue::Int64(i),
                    None => n
                        .as_f64()
                        .map(BindValue::Float64)
                        .ok_or_else(|| SqlxFluentError::InvalidData(format!("{column}: {n}")))?,
                },
                serde_json::Value::String(s) => BindValue::String(s),
                other => BindValue::String(other.to_string()),
            };
            data.insert(column, bind);
        }
        Ok(data)
    }
}

/// 构造 [`Data`]
///
/// ```ignore
/// let row = sqlxfluent::data! { "id" => 1, "name" => "Jack" };
/// ```
#[macro_export]
macro_rules! data {
    () => {
        $crate::Data::new()
    };
    ($($column:expr => $value:expr),+ $(,)?) => {{
        let mut data = $crate::Data::new();
        $(data.insert($column, $value);)+
        data
    }};
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_columns_are_sorted() {
        let data = crate::data! { "name" => "Jack", "city" => "Moscow", "age" => 20 };
        assert_eq!(data.columns(), vec!["age", "city", "name"]);
    }

    #[test]
    fn test_option_maps_to_null() {
        let none: Option<i64> = None;
        assert_eq!(BindValue::from(none), BindValue::Null);
        assert_eq!(BindValue::from(Some(3_i64)), BindValue::Int64(3));
    }

    #[test]
    fn test_from_json_object() {
        let data = Data::try_from(json!({
            "id": 7,
            "score": 1.5,
            "name": "Jack",
            "deleted": false,
            "tags": ["a", "b"],
            "note": null
        }))
        .unwrap();

        let bind = |c: &str| match data.get(c) {
            Some(Value::Bind(v)) => v.clone(),
            other => panic!("unexpected value for {c}: {other:?}"),
        };
        assert_eq!(bind("id"), BindValue::Int64(7));
        assert_eq!(bind("score"), BindValue::Float64(1.5));
        assert_eq!(bind("name"), BindValue::String("Jack".into()));
        assert_eq!(bind("deleted"), BindValue::Bool(false));
        assert_eq!(bind("tags"), BindValue::String("[\"a\",\"b\"]".into()));
        assert_eq!(bind("note"), BindValue::Null);
    }

    #[test]
    fn test_from_json_rejects_non_object() {
        let err = Data::try_from(json!([1, 2])).unwrap_err();
        assert!(matches!(err, SqlxFluentError::InvalidData(_)));
    }
}
