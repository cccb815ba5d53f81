use crate::assertion::params::ParamBag;
use crate::assertion::types::AssertError;
use crate::assertion::validators;
use crate::variable::ValueStore;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// 单次断言求值的输入
///
/// 校验器看到的永远是同一份规范化视图：响应体字节 + 参数包（含注入的状态码与响应头）。
pub struct ValidationContext<'a> {
    pub body: &'a [u8],
    pub params: &'a ParamBag,
    /// 当前运行的值存储；未挂载时写入类校验器不产生副作用
    pub store: Option<&'a ValueStore>,
}

impl<'a> ValidationContext<'a> {
    pub fn new(body: &'a [u8], params: &'a ParamBag) -> Self {
        Self {
            body,
            params,
            store: None,
        }
    }

    pub fn with_store(mut self, store: &'a ValueStore) -> Self {
        self.store = Some(store);
        self
    }
}

/// 断言校验器
///
/// `Ok(())` 表示通过，`Err` 携带失败原因。
pub trait Validator: Send + Sync {
    fn validate(&self, ctx: &ValidationContext<'_>) -> Result<(), AssertError>;
}

impl<F> Validator for F
where
    F: Fn(&ValidationContext<'_>) -> Result<(), AssertError> + Send + Sync,
{
    fn validate(&self, ctx: &ValidationContext<'_>) -> Result<(), AssertError> {
        self(ctx)
    }
}

/// 断言类型名 → 校验器
///
/// 启动时集中注册一次，之后求值阶段只读；按运行实例持有，而不是进程级全局表。
#[derive(Clone, Default)]
pub struct AssertionRegistry {
    validators: HashMap<String, Arc<dyn Validator>>,
}

impl AssertionRegistry {
    /// 创建空注册表
    pub fn new() -> Self {
        Self::default()
    }

    /// 创建并注册全部内置断言
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        validators::register_builtins(&mut registry);
        registry
    }

    /// 注册校验器；同名时覆盖
    pub fn register(&mut self, name: impl Into<String>, validator: impl Validator + 'static) {
        self.validators.insert(name.into(), Arc::new(validator));
    }

    /// 按名称精确查找
    pub fn lookup(&self, name: &str) -> Option<Arc<dyn Validator>> {
        self.validators.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.validators.contains_key(name)
    }

    /// 已注册的名称（排序后）
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.validators.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.validators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.validators.is_empty()
    }
}

impl fmt::Debug for AssertionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AssertionRegistry")
            .field("validators", &self.names())
            .finish()
    }
}
