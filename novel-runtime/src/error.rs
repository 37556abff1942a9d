//! # Error 模块
//!
//! 定义 novel-runtime 中使用的错误类型。
//!
//! 注意：播放操作本身**不返回错误** —— 非法操作一律按无操作处理
//! （状态机在输入域上防御性全覆盖）。错误只出现在文档加载阶段。

use thiserror::Error;

/// 文档错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DocumentError {
    /// JSON 解析失败
    #[error("JSON 解析失败: {message}")]
    Parse { message: String },

    /// 序列化失败
    #[error("文档序列化失败: {message}")]
    Serialize { message: String },
}

impl DocumentError {
    /// 从解析错误构造
    ///
    /// serde_json::Error 不可 Clone，这里只保留消息文本。
    pub(crate) fn parse(err: serde_json::Error) -> Self {
        Self::Parse {
            message: err.to_string(),
        }
    }

    /// 从序列化错误构造
    pub(crate) fn serialize(err: serde_json::Error) -> Self {
        Self::Serialize {
            message: err.to_string(),
        }
    }
}

/// Result 类型别名
pub type DocumentResult<T> = Result<T, DocumentError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_error_message() {
        let err = crate::Novel::from_json("not json").unwrap_err();
        assert!(matches!(err, DocumentError::Parse { .. }));
        assert!(err.to_string().contains("JSON 解析失败"));
    }
}
