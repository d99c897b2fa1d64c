// ==========================================
// HTM Vault - 导入模块错误类型
// ==========================================
// 工具: thiserror 派生宏
// 行号: 表头为第 1 行，首条数据为第 2 行
// ==========================================

use crate::repository::error::RepositoryError;
use thiserror::Error;

/// 导入模块错误类型
#[derive(Error, Debug)]
pub enum ImportError {
    // ===== 文件相关错误 =====
    #[error("文件不存在: {0}")]
    FileNotFound(String),

    #[error("文件格式不支持: {0}（仅支持 .csv）")]
    UnsupportedFormat(String),

    #[error("文件读取失败: {0}")]
    FileReadError(String),

    #[error("CSV 解析失败: {0}")]
    CsvParseError(String),

    #[error("缺少列 ({source_name}): {column}")]
    MissingColumn { source_name: String, column: String },

    // ===== 数据质量错误 =====
    #[error("字段非法 ({source_name} 行 {row}, 字段 {field}): {message}")]
    InvalidField {
        source_name: String,
        row: usize,
        field: String,
        message: String,
    },

    #[error("数值范围错误 ({source_name} 行 {row}, 字段 {field}): 值 {value} 超出范围 [{min}, {max}]")]
    ValueRangeError {
        source_name: String,
        row: usize,
        field: String,
        value: i64,
        min: i64,
        max: i64,
    },

    // ===== 数据库错误 =====
    #[error("写入参考数据失败: {0}")]
    Repository(#[from] RepositoryError),
}

impl From<csv::Error> for ImportError {
    fn from(err: csv::Error) -> Self {
        ImportError::CsvParseError(err.to_string())
    }
}

impl From<std::io::Error> for ImportError {
    fn from(err: std::io::Error) -> Self {
        ImportError::FileReadError(err.to_string())
    }
}

/// Result 类型别名
pub type ImportResult<T> = Result<T, ImportError>;
