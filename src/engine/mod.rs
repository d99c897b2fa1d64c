// ==========================================
// HTM Vault - 引擎层
// ==========================================
// 职责: 实现业务规则（日期运算、合规调度、搜索谓词、维护推进、工单排序）
// 红线: Engine 不访问存储，纯函数式规则求值
// ==========================================

pub mod compliance;
pub mod date_math;
pub mod maintenance;
pub mod ordering;
pub mod search;

// 重导出核心引擎
pub use compliance::{ComplianceDates, ComplianceScheduler};
pub use date_math::{first_day_of_month, last_day_of_month_after};
pub use maintenance::MaintenanceAdvancer;
pub use ordering::sort_work_orders;
pub use search::{SearchField, SearchPredicate};
