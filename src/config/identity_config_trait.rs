// ==========================================
// HTM Vault - 标识生成配置读取 Trait
// ==========================================
// 职责: 定义生命周期门所需的配置读取接口（不包含实现）
// 红线: 不包含配置写入、不包含业务逻辑
// ==========================================

use crate::domain::types::SortOrder;
use std::error::Error;

pub type ConfigResult<T> = Result<T, Box<dyn Error + Send + Sync>>;

// ==========================================
// IdentityConfigReader Trait
// ==========================================
// 实现者: ConfigManager（从 config_kv 表读取）
pub trait IdentityConfigReader: Send + Sync {
    /// 设备编号前缀
    ///
    /// # 默认值
    /// - ""（无前缀）
    fn get_control_number_prefix(&self) -> ConfigResult<String>;

    /// 设备编号随机部分长度
    ///
    /// # 默认值
    /// - 6
    fn get_control_number_length(&self) -> ConfigResult<usize>;

    /// 工单号前缀
    ///
    /// # 默认值
    /// - "WR"
    fn get_work_order_id_prefix(&self) -> ConfigResult<String>;

    /// 工单号随机部分长度
    ///
    /// # 默认值
    /// - 8
    fn get_work_order_id_length(&self) -> ConfigResult<usize>;

    /// 请求未指定时的工单排序方向
    ///
    /// # 默认值
    /// - DESCENDING
    fn get_default_sort_order(&self) -> ConfigResult<SortOrder>;
}
