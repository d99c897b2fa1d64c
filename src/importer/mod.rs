// ==========================================
// HTM Vault - 导入层
// ==========================================
// 职责: 参考数据（厂商/型号、院区/科室）CSV 导入
// ==========================================

pub mod error;
pub mod reference_importer;

// 重导出核心类型
pub use error::{ImportError, ImportResult};
pub use reference_importer::{
    parse_facility_departments, parse_manufacturer_models, ImportSummary, ReferenceDataImporter,
};
