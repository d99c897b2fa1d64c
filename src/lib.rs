// ==========================================
// HTM Vault - 核心库
// ==========================================
// 职责: 医疗设备台账、维保工单与合规日期推算
// 技术栈: Rust + SQLite
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 数据仓储层 - 数据访问
pub mod repository;

// 引擎层 - 日期推算、搜索谓词、维保推进
pub mod engine;

// 导入层 - 参考数据
pub mod importer;

// 配置层 - 系统配置
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA/建表）
pub mod db;

// 日志系统
pub mod logging;

// 指标接收端
pub mod metrics;

// API 层 - 生命周期门
pub mod api;

// 应用层 - 组件装配
pub mod app;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{
    ServiceStatus, SortOrder, WorkOrderAwaitStatus, WorkOrderCompletionStatus, WorkOrderType,
};

// 领域实体
pub use domain::{Actor, Device, FacilityDepartment, ManufacturerModel, WorkOrder};

// 引擎
pub use engine::{ComplianceScheduler, MaintenanceAdvancer, SearchPredicate};

// API
pub use api::{ApiError, ApiResult, DeviceApi, ReferenceDataApi, WorkOrderApi};

// 指标
pub use metrics::{MetricsSink, NoOpMetricsSink, RecordingMetricsSink};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "HTM Vault";
