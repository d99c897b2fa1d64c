// ==========================================
// HTM Vault - API层错误类型
// ==========================================
// 职责: 定义生命周期门的错误类型，转换 Repository 错误
// 约定: 每个变体映射到稳定的 ErrorKind，供调用方分支处理
// ==========================================

use crate::repository::error::RepositoryError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// 错误大类
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    NotFound,
    InvalidAttribute,
    DuplicateDevice,
    ImmutableState,
    PreconditionFailed,
    Storage,
}

/// API层错误类型
#[derive(Error, Debug)]
pub enum ApiError {
    // ==========================================
    // 未找到
    // ==========================================
    #[error("设备不存在: control_number={0}")]
    DeviceNotFound(String),

    #[error("工单不存在: work_order_id={0}")]
    WorkOrderNotFound(String),

    // ==========================================
    // 输入校验
    // ==========================================
    #[error("无效属性 {field}: {reason}")]
    InvalidAttribute { field: String, reason: String },

    #[error("设备已存在: {manufacturer} {model} serial_number={serial_number} (control_number={existing_control_number})")]
    DuplicateDevice {
        manufacturer: String,
        model: String,
        serial_number: String,
        existing_control_number: String,
    },

    // ==========================================
    // 状态不可变
    // ==========================================
    #[error("设备已退役，仅允许重新启用: control_number={0}")]
    RetiredDeviceImmutable(String),

    #[error("工单已关闭，不可修改: work_order_id={0}")]
    ClosedWorkOrderImmutable(String),

    // ==========================================
    // 前置条件
    // ==========================================
    #[error("设备仍有 {open_count} 个未关闭工单，不可退役: control_number={control_number}")]
    OpenWorkOrdersExist {
        control_number: String,
        open_count: usize,
    },

    #[error("工单信息不完整，无法关闭: work_order_id={work_order_id}, 缺少 {missing}")]
    CloseNotComplete {
        work_order_id: String,
        missing: String,
    },

    #[error("工单已关闭: work_order_id={0}")]
    AlreadyClosed(String),

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

impl ApiError {
    pub fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        ApiError::InvalidAttribute {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// 配置读取失败
    pub fn config(err: impl std::fmt::Display) -> Self {
        ApiError::InternalError(format!("配置读取失败: {}", err))
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            ApiError::DeviceNotFound(_) | ApiError::WorkOrderNotFound(_) => ErrorKind::NotFound,
            ApiError::InvalidAttribute { .. } => ErrorKind::InvalidAttribute,
            ApiError::DuplicateDevice { .. } => ErrorKind::DuplicateDevice,
            ApiError::RetiredDeviceImmutable(_) | ApiError::ClosedWorkOrderImmutable(_) => {
                ErrorKind::ImmutableState
            }
            ApiError::OpenWorkOrdersExist { .. }
            | ApiError::CloseNotComplete { .. }
            | ApiError::AlreadyClosed(_) => ErrorKind::PreconditionFailed,
            ApiError::DatabaseError(_)
            | ApiError::DatabaseConnectionError(_)
            | ApiError::InternalError(_)
            | ApiError::Other(_) => ErrorKind::Storage,
        }
    }

    /// 变体名（用作指标结果名）
    pub fn code(&self) -> &'static str {
        match self {
            ApiError::DeviceNotFound(_) => "DeviceNotFound",
            ApiError::WorkOrderNotFound(_) => "WorkOrderNotFound",
            ApiError::InvalidAttribute { .. } => "InvalidAttribute",
            ApiError::DuplicateDevice { .. } => "DuplicateDevice",
            ApiError::RetiredDeviceImmutable(_) => "RetiredDeviceImmutable",
            ApiError::ClosedWorkOrderImmutable(_) => "ClosedWorkOrderImmutable",
            ApiError::OpenWorkOrdersExist { .. } => "OpenWorkOrdersExist",
            ApiError::CloseNotComplete { .. } => "CloseNotComplete",
            ApiError::AlreadyClosed(_) => "AlreadyClosed",
            ApiError::DatabaseError(_) => "DatabaseError",
            ApiError::DatabaseConnectionError(_) => "DatabaseConnectionError",
            ApiError::InternalError(_) => "InternalError",
            ApiError::Other(_) => "Other",
        }
    }
}

// ==========================================
// 从 RepositoryError 转换
// ==========================================
// 主键 NotFound 映射为对应的未找到变体；
// 参考数据的 NotFound 由生命周期门显式转为 InvalidAttribute，此处兜底同样处理
impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound { entity, id } => match entity.as_str() {
                "Device" => ApiError::DeviceNotFound(id),
                "WorkOrder" => ApiError::WorkOrderNotFound(id),
                _ => ApiError::invalid(entity, format!("'{}' 不存在", id)),
            },
            RepositoryError::DatabaseConnectionError(msg) => ApiError::DatabaseConnectionError(msg),
            RepositoryError::LockError(msg) => {
                ApiError::DatabaseConnectionError(format!("数据库锁获取失败: {}", msg))
            }
            RepositoryError::DatabaseTransactionError(msg)
            | RepositoryError::DatabaseQueryError(msg) => ApiError::DatabaseError(msg),
            RepositoryError::UniqueConstraintViolation(msg) => {
                ApiError::DatabaseError(format!("唯一约束违反: {}", msg))
            }
            RepositoryError::ForeignKeyViolation(msg) => {
                ApiError::DatabaseError(format!("外键约束违反: {}", msg))
            }
            RepositoryError::FieldValueError { field, message } => {
                ApiError::DatabaseError(format!("存储字段{}非法: {}", field, message))
            }
            RepositoryError::InternalError(msg) => ApiError::InternalError(msg),
            RepositoryError::Other(err) => ApiError::Other(err),
        }
    }
}

/// Result 类型别名
pub type ApiResult<T> = Result<T, ApiError>;
