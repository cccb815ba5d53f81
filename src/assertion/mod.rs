/// 断言模块 - 断言注册表与内置校验器
pub mod cookie;
pub mod extractor;
pub mod params;
pub mod registry;
mod types;
pub mod validators;

pub use cookie::{SameSite, SetCookie};
pub use params::{ParamBag, ParamValue};
pub use registry::{AssertionRegistry, ValidationContext, Validator};
pub use types::AssertError;
