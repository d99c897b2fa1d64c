// ==========================================
// HTM Vault - 应用层
// ==========================================
// 职责: 组件装配与共享状态
// ==========================================

pub mod state;

// 重导出
pub use state::{get_default_db_path, AppState, StoreStatus};
