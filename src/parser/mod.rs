pub mod suite_file;
pub mod types;
pub mod validate;

// Re-export commonly used types
pub use suite_file::SuiteFileParser;
pub use types::{Expectation, ParseError, ParseResult, Suite, TestRequest};
pub use validate::{ValidationIssue, validate};

/// 从文件路径解析套件文件
pub fn parse_file<P: AsRef<std::path::Path>>(path: P) -> ParseResult<Vec<Suite>> {
    SuiteFileParser::parse_file(path)
}

/// 从字符串内容解析套件
pub fn parse_content(content: &str) -> ParseResult<Vec<Suite>> {
    SuiteFileParser::parse_content(content)
}
