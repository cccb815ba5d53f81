use crate::variable::store::ValueStore;
use regex::{Captures, Regex};
use std::sync::OnceLock;

/// 占位符替换器
pub struct VariableResolver;

impl VariableResolver {
    fn placeholder_regex() -> &'static Regex {
        static VAR_REGEX: OnceLock<Regex> = OnceLock::new();
        VAR_REGEX.get_or_init(|| {
            Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_.\-]*)\}").expect("placeholder regex is valid")
        })
    }

    /// 替换文本中的所有 ${key} 占位符
    ///
    /// 存储中不存在的 key 保持原样，不报错。
    pub fn substitute(text: &str, store: &ValueStore) -> String {
        if !text.contains("${") {
            return text.to_string();
        }

        Self::placeholder_regex()
            .replace_all(text, |caps: &Captures| {
                let key = &caps[1];
                store.get(key).unwrap_or_else(|| caps[0].to_string())
            })
            .to_string()
    }

    /// 列出文本中引用的全部 key（按出现顺序，可能重复）
    pub fn placeholders(text: &str) -> Vec<String> {
        Self::placeholder_regex()
            .captures_iter(text)
            .map(|caps| caps[1].to_string())
            .collect()
    }
}
