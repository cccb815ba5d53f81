use std::collections::HashMap;
use std::sync::RwLock;

/// 运行期共享的键值存储
///
/// 一次执行（run）对应一个实例，用于把前一个请求响应中提取的值
/// （例如登录 token）传给后续请求的占位符替换。
/// 多个 worker 并发读写，内部用一把读写锁串行化；同 key 后写覆盖先写。
#[derive(Debug, Default)]
pub struct ValueStore {
    values: RwLock<HashMap<String, String>>,
}

impl ValueStore {
    /// 创建新的空存储
    pub fn new() -> Self {
        Self::default()
    }

    /// 写入值
    pub fn set(&self, key: impl Into<String>, value: impl Into<String>) {
        let mut values = self.values.write().unwrap_or_else(|e| e.into_inner());
        values.insert(key.into(), value.into());
    }

    /// 读取值
    pub fn get(&self, key: &str) -> Option<String> {
        let values = self.values.read().unwrap_or_else(|e| e.into_inner());
        values.get(key).cloned()
    }

    /// 变量数量
    pub fn len(&self) -> usize {
        self.values.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    /// 是否为空
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// 当前内容的快照
    pub fn snapshot(&self) -> HashMap<String, String> {
        self.values.read().unwrap_or_else(|e| e.into_inner()).clone()
    }
}
