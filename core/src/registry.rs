//! 方言注册表与全局默认方言

use crate::grammar::{Grammar, MySqlGrammar, PostgresGrammar, SqliteGrammar};
use std::collections::HashMap;
use std::sync::{Arc, OnceLock, RwLock};

/// 方言构造函数
pub type GrammarFactory = fn() -> Arc<dyn Grammar>;

static REGISTRY: OnceLock<RwLock<HashMap<String, GrammarFactory>>> = OnceLock::new();
static DEFAULT_GRAMMAR: RwLock<Option<Arc<dyn Grammar>>> = RwLock::new(None);

fn registry() -> &'static RwLock<HashMap<String, GrammarFactory>> {
    REGISTRY.get_or_init(|| {
        let mut grammars: HashMap<String, GrammarFactory> = HashMap::new();
        grammars.insert("mysql".into(), || Arc::new(MySqlGrammar));
        grammars.insert("postgres".into(), || Arc::new(PostgresGrammar));
        grammars.insert("pgsql".into(), || Arc::new(PostgresGrammar));
        grammars.insert("sqlite3".into(), || Arc::new(SqliteGrammar));
        grammars.insert("sqlite".into(), || Arc::new(SqliteGrammar));
        RwLock::new(grammars)
    })
}

/// 注册方言，同名时覆盖
pub fn register_grammar(name: &str, factory: GrammarFactory) {
    registry()
        .write()
        .expect("grammar registry poisoned")
        .insert(name.to_string(), factory);
}

/// 按名称创建方言实例
pub fn grammar(name: &str) -> Option<Arc<dyn Grammar>> {
    let factory = registry()
        .read()
        .expect("grammar registry poisoned")
        .get(name)
        .copied();
    factory.map(|factory| factory())
}

/// 设置全局默认方言，名称未注册时 panic
pub fn use_grammar(name: &str) {
    let selected = grammar(name)
        .unwrap_or_else(|| panic!("sqlxfluent: grammar \"{}\" is not registered", name));
    tracing::info!(target: "sqlxfluent::registry", grammar = name, "default grammar selected");
    *DEFAULT_GRAMMAR.write().expect("default grammar poisoned") = Some(selected);
}

/// 当前全局默认方言
pub fn default_grammar() -> Option<Arc<dyn Grammar>> {
    DEFAULT_GRAMMAR
        .read()
        .expect("default grammar poisoned")
        .clone()
}
