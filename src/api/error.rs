// ==========================================
// BMN 资产台账 - API 层错误类型
// ==========================================
// 职责: 定义 API 层错误类型，转换 Repository / Importer 错误为用户可读的消息
// 说明: 传输层错误（请求体过大、JSON 格式错误）为批次级错误，不产生逐行结果
// ==========================================

use crate::i18n::t_with_args;
use crate::importer::error::ImportError;
use crate::repository::error::RepositoryError;
use thiserror::Error;

/// API 层错误类型
#[derive(Error, Debug)]
pub enum ApiError {
    // ==========================================
    // 传输层错误
    // ==========================================
    #[error("请求体过大: {size} 字节（上限 {limit} 字节）")]
    PayloadTooLarge { size: usize, limit: usize },

    #[error("请求体格式错误: {0}")]
    MalformedPayload(String),

    // ==========================================
    // 业务输入错误
    // ==========================================
    #[error("无效输入: {0}")]
    InvalidInput(String),

    #[error("资源未找到: {0}")]
    NotFound(String),

    // ==========================================
    // 导入错误
    // ==========================================
    #[error("文件导入失败: {0}")]
    ImportError(#[from] ImportError),

    // ==========================================
    // 数据访问错误
    // ==========================================
    #[error("数据库错误: {0}")]
    DatabaseError(String),

    #[error("数据库连接失败: {0}")]
    DatabaseConnectionError(String),

    // ==========================================
    // 通用错误
    // ==========================================
    #[error("内部错误: {0}")]
    InternalError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

// ==========================================
// 从 RepositoryError 转换
// ==========================================
impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound { entity, id } => {
                ApiError::NotFound(format!("{}(id={})不存在", entity, id))
            }
            RepositoryError::DatabaseConnectionError(msg) => ApiError::DatabaseConnectionError(msg),
            RepositoryError::LockError(msg) => {
                ApiError::DatabaseConnectionError(format!("数据库锁获取失败: {}", msg))
            }
            RepositoryError::FieldValueError { field, message } => {
                ApiError::InvalidInput(format!("字段{}错误: {}", field, message))
            }
            RepositoryError::InternalError(msg) => ApiError::InternalError(msg),
            other => ApiError::DatabaseError(other.to_string()),
        }
    }
}

impl ApiError {
    /// 面向用户的本地化消息（按当前 locale）
    pub fn localized_message(&self) -> String {
        match self {
            ApiError::PayloadTooLarge { size, limit } => t_with_args(
                "api.payload_too_large",
                &[("size", size.to_string().as_str()), ("limit", limit.to_string().as_str())],
            ),
            ApiError::MalformedPayload(msg) => {
                t_with_args("api.malformed_payload", &[("error", msg.as_str())])
            }
            ApiError::ImportError(ImportError::FileNotFound(path)) => {
                t_with_args("import.file_not_found", &[("path", path.as_str())])
            }
            ApiError::ImportError(ImportError::UnsupportedFormat(ext)) => {
                t_with_args("import.unsupported_format", &[("ext", ext.as_str())])
            }
            other => other.to_string(),
        }
    }
}

/// Result 类型别名
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repository_error_mapping() {
        let err: ApiError = RepositoryError::NotFound {
            entity: "asset".to_string(),
            id: "7".to_string(),
        }
        .into();
        assert!(matches!(err, ApiError::NotFound(_)));

        let err: ApiError = RepositoryError::UniqueConstraintViolation("asset.code".to_string()).into();
        assert!(matches!(err, ApiError::DatabaseError(_)));
    }

    #[test]
    fn test_payload_too_large_message() {
        let err = ApiError::PayloadTooLarge {
            size: 20,
            limit: 10,
        };
        assert!(err.to_string().contains("20"));
        assert!(err.to_string().contains("10"));
    }
}
