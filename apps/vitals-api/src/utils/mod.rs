//! 工具模块：统一响应与输入校验

pub mod response;
pub mod validation;
