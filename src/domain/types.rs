// ==========================================
// HTM Vault - 领域类型定义
// ==========================================
// 职责: 设备服务状态、工单完成/等待状态、工单类型、排序方向
// 约束: 状态字段一律为封闭枚举，未知取值在边界处拒绝
// 序列化格式: SCREAMING_SNAKE_CASE (与数据库一致)
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// 枚举解析失败
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{type_name} 不支持取值 '{value}'，可选: {allowed}")]
pub struct UnknownVariant {
    pub type_name: &'static str,
    pub value: String,
    pub allowed: String,
}

impl UnknownVariant {
    fn new(type_name: &'static str, value: &str, allowed: &[&str]) -> Self {
        Self {
            type_name,
            value: value.to_string(),
            allowed: allowed.join(", "),
        }
    }
}

// ==========================================
// 设备服务状态 (Service Status)
// ==========================================
// IN_SERVICE --retire--> RETIRED --reactivate--> IN_SERVICE
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ServiceStatus {
    InService, // 在用
    Retired,   // 已退役（软删除）
}

impl ServiceStatus {
    pub const ALL: [&'static str; 2] = ["IN_SERVICE", "RETIRED"];

    /// 转换为数据库存储的字符串
    pub fn to_db_str(&self) -> &'static str {
        match self {
            ServiceStatus::InService => "IN_SERVICE",
            ServiceStatus::Retired => "RETIRED",
        }
    }
}

impl fmt::Display for ServiceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.to_db_str())
    }
}

impl FromStr for ServiceStatus {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "IN_SERVICE" => Ok(ServiceStatus::InService),
            "RETIRED" => Ok(ServiceStatus::Retired),
            other => Err(UnknownVariant::new("ServiceStatus", other, &Self::ALL)),
        }
    }
}

// ==========================================
// 工单完成状态 (Completion Status)
// ==========================================
// OPEN --close--> CLOSED, CLOSED 为终态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WorkOrderCompletionStatus {
    Open,   // 进行中
    Closed, // 已关闭
}

impl WorkOrderCompletionStatus {
    pub const ALL: [&'static str; 2] = ["OPEN", "CLOSED"];

    pub fn to_db_str(&self) -> &'static str {
        match self {
            WorkOrderCompletionStatus::Open => "OPEN",
            WorkOrderCompletionStatus::Closed => "CLOSED",
        }
    }
}

impl fmt::Display for WorkOrderCompletionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.to_db_str())
    }
}

impl FromStr for WorkOrderCompletionStatus {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "OPEN" => Ok(WorkOrderCompletionStatus::Open),
            "CLOSED" => Ok(WorkOrderCompletionStatus::Closed),
            other => Err(UnknownVariant::new(
                "WorkOrderCompletionStatus",
                other,
                &Self::ALL,
            )),
        }
    }
}

// ==========================================
// 工单等待状态 (Await Status)
// ==========================================
// 仅在 OPEN 时有意义，咨询性质，不参与任何门控
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WorkOrderAwaitStatus {
    AwaitingParts,  // 等待配件
    AwaitingRepair, // 等待维修
}

impl WorkOrderAwaitStatus {
    pub const ALL: [&'static str; 2] = ["AWAITING_PARTS", "AWAITING_REPAIR"];

    pub fn to_db_str(&self) -> &'static str {
        match self {
            WorkOrderAwaitStatus::AwaitingParts => "AWAITING_PARTS",
            WorkOrderAwaitStatus::AwaitingRepair => "AWAITING_REPAIR",
        }
    }
}

impl fmt::Display for WorkOrderAwaitStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.to_db_str())
    }
}

impl FromStr for WorkOrderAwaitStatus {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "AWAITING_PARTS" => Ok(WorkOrderAwaitStatus::AwaitingParts),
            "AWAITING_REPAIR" => Ok(WorkOrderAwaitStatus::AwaitingRepair),
            other => Err(UnknownVariant::new(
                "WorkOrderAwaitStatus",
                other,
                &Self::ALL,
            )),
        }
    }
}

// ==========================================
// 工单类型 (Work Order Type)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WorkOrderType {
    AcceptanceTesting,        // 验收测试
    PreventativeMaintenance,  // 预防性维护 (PM)
    Repair,                   // 维修
}

impl WorkOrderType {
    pub const ALL: [&'static str; 3] = ["ACCEPTANCE_TESTING", "PREVENTATIVE_MAINTENANCE", "REPAIR"];

    pub fn to_db_str(&self) -> &'static str {
        match self {
            WorkOrderType::AcceptanceTesting => "ACCEPTANCE_TESTING",
            WorkOrderType::PreventativeMaintenance => "PREVENTATIVE_MAINTENANCE",
            WorkOrderType::Repair => "REPAIR",
        }
    }

    /// 关闭后是否推进设备维保日期
    pub fn advances_maintenance(&self) -> bool {
        matches!(
            self,
            WorkOrderType::PreventativeMaintenance | WorkOrderType::AcceptanceTesting
        )
    }
}

impl fmt::Display for WorkOrderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.to_db_str())
    }
}

impl FromStr for WorkOrderType {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ACCEPTANCE_TESTING" => Ok(WorkOrderType::AcceptanceTesting),
            "PREVENTATIVE_MAINTENANCE" => Ok(WorkOrderType::PreventativeMaintenance),
            "REPAIR" => Ok(WorkOrderType::Repair),
            other => Err(UnknownVariant::new("WorkOrderType", other, &Self::ALL)),
        }
    }
}

// ==========================================
// 工单列表排序方向 (Sort Order)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SortOrder {
    #[default]
    Descending,
    Ascending,
}

impl SortOrder {
    pub const ALL: [&'static str; 2] = ["DESCENDING", "ASCENDING"];

    pub fn to_db_str(&self) -> &'static str {
        match self {
            SortOrder::Descending => "DESCENDING",
            SortOrder::Ascending => "ASCENDING",
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.to_db_str())
    }
}

impl FromStr for SortOrder {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "DESCENDING" => Ok(SortOrder::Descending),
            "ASCENDING" => Ok(SortOrder::Ascending),
            other => Err(UnknownVariant::new("SortOrder", other, &Self::ALL)),
        }
    }
}
