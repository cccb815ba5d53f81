use std::fs;
use std::path::Path;

use serde::Deserialize;
use serde_yaml::Value;

use crate::parser::types::{ParseError, ParseResult, Suite};

/// 套件文件解析器
///
/// 支持三种顶层写法：套件列表、单个套件、`suites:` 包裹的列表。
pub struct SuiteFileParser;

#[derive(Deserialize)]
struct SuitesWrapper {
    suites: Vec<Suite>,
}

impl SuiteFileParser {
    /// 从文件路径解析
    pub fn parse_file<P: AsRef<Path>>(path: P) -> ParseResult<Vec<Suite>> {
        let path = path.as_ref();
        tracing::debug!(path = %path.display(), "Loading suite file");
        let content = fs::read_to_string(path)?;
        Self::parse_content(&content)
    }

    /// 从字符串内容解析
    pub fn parse_content(content: &str) -> ParseResult<Vec<Suite>> {
        if content.trim().is_empty() {
            return Err(ParseError::NoSuites);
        }

        let document: Value = serde_yaml::from_str(content)?;
        let suites = match document {
            Value::Null => return Err(ParseError::NoSuites),
            Value::Sequence(_) => serde_yaml::from_value::<Vec<Suite>>(document)?,
            Value::Mapping(ref map) if map.contains_key("suites") => {
                serde_yaml::from_value::<SuitesWrapper>(document)?.suites
            }
            Value::Mapping(_) => vec![serde_yaml::from_value::<Suite>(document)?],
            other => {
                return Err(ParseError::InvalidStructure(format!(
                    "expected a suite or a list of suites, found {}",
                    yaml_kind(&other)
                )));
            }
        };

        if suites.is_empty() {
            return Err(ParseError::NoSuites);
        }
        Ok(suites)
    }
}

fn yaml_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Sequence(_) => "a list",
        Value::Mapping(_) => "a mapping",
        Value::Tagged(_) => "a tagged value",
    }
}
