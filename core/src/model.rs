use crate::builder::{table, Builder};
use crate::value::{Data, Value};

/// Model trait 定义了模型的基本元数据
///
/// 通常由 `#[derive(Model)]` 生成：
/// ```ignore
/// #[derive(Model)]
/// #[model(table = "users", pk = "id")]
/// struct User {
///     id: i64,
///     name: String,
/// }
/// ```
pub trait Model {
    /// 表名
    const TABLE: &'static str;
    /// 主键字段名
    const PK: &'static str;

    /// 以模型表为数据源的构建器
    fn query() -> Builder {
        table(Self::TABLE)
    }

    /// 按主键查找
    fn find(id: impl Into<Value>) -> Builder {
        Self::query().and_where(Self::PK, "=", id)
    }
}

/// 转换为 insert / update 使用的数据载荷，通常由 `#[derive(IntoData)]` 生成
pub trait IntoData {
    fn into_data(self) -> Data;
}

impl IntoData for Data {
    fn into_data(self) -> Data {
        self
    }
}
