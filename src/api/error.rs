// ==========================================
// 零售门店分货系统 - API层错误类型
// ==========================================
// 职责: 定义API层错误类型, 转换仓储/引擎错误为用户友好的错误消息
// 约束: 业务校验错误必须携带可读原因; 意外错误按内部错误上抛
// ==========================================

use crate::engine::orchestrator::RunError;
use crate::repository::error::RepositoryError;
use thiserror::Error;

/// API层错误类型
///
/// 两类错误:
/// - 业务校验错误 (NotFound/BusinessRuleViolation/InvalidStateTransition/
///   ValidationError/InvalidInput): 可预期, 调用方可恢复
/// - 意外错误 (Database*/Internal): 不透明上抛, 进行中的分货单被取消
#[derive(Error, Debug)]
pub enum ApiError {
    // ===== 业务规则错误 =====
    #[error("无效输入: {0}")]
    InvalidInput(String),

    #[error("资源未找到: {0}")]
    NotFound(String),

    #[error("业务规则违反: {0}")]
    BusinessRuleViolation(String),

    #[error("无效的状态转换: from={from} to={to}")]
    InvalidStateTransition { from: String, to: String },

    // ===== 数据质量错误 =====
    #[error("数据验证失败: {0}")]
    ValidationError(String),

    // ===== 数据访问错误 =====
    #[error("数据库错误: {0}")]
    DatabaseError(String),

    #[error("数据库连接失败: {0}")]
    DatabaseConnectionError(String),

    #[error("数据库事务失败: {0}")]
    DatabaseTransactionError(String),

    // ===== 通用错误 =====
    #[error("内部错误: {0}")]
    InternalError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ApiError {
    /// 判断是否为可预期的业务校验错误 (调用方可恢复)
    pub fn is_business_error(&self) -> bool {
        matches!(
            self,
            ApiError::InvalidInput(_)
                | ApiError::NotFound(_)
                | ApiError::BusinessRuleViolation(_)
                | ApiError::InvalidStateTransition { .. }
                | ApiError::ValidationError(_)
        )
    }
}

// ==========================================
// 从 RepositoryError 转换
// 目的: 将仓储层的技术错误转换为用户友好的业务错误
// ==========================================
impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        match err {
            // 数据库错误
            RepositoryError::NotFound { entity, id } => {
                ApiError::NotFound(format!("{}(id={})不存在", entity, id))
            }
            RepositoryError::DatabaseConnectionError(msg) => ApiError::DatabaseConnectionError(msg),
            RepositoryError::DatabaseTransactionError(msg) => {
                ApiError::DatabaseTransactionError(msg)
            }
            RepositoryError::LockError(msg) => {
                ApiError::DatabaseConnectionError(format!("数据库锁获取失败: {}", msg))
            }
            RepositoryError::DatabaseQueryError(msg) => ApiError::DatabaseError(msg),
            RepositoryError::UniqueConstraintViolation(msg) => {
                ApiError::BusinessRuleViolation(format!("唯一约束违反: {}", msg))
            }
            RepositoryError::ForeignKeyViolation(msg) => {
                ApiError::BusinessRuleViolation(format!("外键约束违反: {}", msg))
            }

            // 业务规则错误
            RepositoryError::BusinessRuleViolation(msg) => ApiError::BusinessRuleViolation(msg),
            RepositoryError::InvalidStateTransition { from, to } => {
                ApiError::InvalidStateTransition { from, to }
            }

            // 数据质量错误
            RepositoryError::ValidationError(msg) => ApiError::ValidationError(msg),
            RepositoryError::FieldValueError { field, message } => {
                ApiError::InvalidInput(format!("字段{}错误: {}", field, message))
            }

            // 通用错误
            RepositoryError::InternalError(msg) => ApiError::InternalError(msg),
            RepositoryError::Other(err) => ApiError::Other(err),
        }
    }
}

// ==========================================
// 从 RunError 转换
// 目的: 准入空集是业务错误, 其余按来源分类
// ==========================================
impl From<RunError> for ApiError {
    fn from(err: RunError) -> Self {
        match err {
            RunError::NoEligibleStores => ApiError::NotFound("没有符合条件的门店".to_string()),
            RunError::NoEligibleProducts => ApiError::NotFound("没有符合条件的商品".to_string()),
            RunError::Config(msg) => ApiError::InternalError(format!("配置读取失败: {}", msg)),
            RunError::Repository(e) => e.into(),
        }
    }
}

/// Result 类型别名
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repository_error_conversion() {
        let repo_err = RepositoryError::NotFound {
            entity: "AllocationHeader".to_string(),
            id: "42".to_string(),
        };
        let api_err: ApiError = repo_err.into();
        match api_err {
            ApiError::NotFound(msg) => {
                assert!(msg.contains("AllocationHeader"));
                assert!(msg.contains("42"));
            }
            _ => panic!("Expected NotFound"),
        }
    }

    #[test]
    fn test_run_error_conversion_is_business_error() {
        let api_err: ApiError = RunError::NoEligibleStores.into();
        assert!(api_err.is_business_error());

        let api_err: ApiError = RunError::Config("boom".to_string()).into();
        assert!(!api_err.is_business_error());
    }
}
