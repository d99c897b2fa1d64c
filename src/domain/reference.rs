// ==========================================
// HTM Vault - 参考数据领域模型
// ==========================================
// 职责: 厂商/型号、院区/科室 两类只读参考数据
// 红线: 参考数据不可变，设备仅按值引用
// ==========================================

use serde::{Deserialize, Serialize};

// ==========================================
// ManufacturerModel - 厂商/型号
// ==========================================
// 主键: (manufacturer, model)
// 对齐: manufacturer_model 表
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ManufacturerModel {
    pub manufacturer: String,
    pub model: String,
    /// 预防性维护周期（月）；None 或 0 表示无需 PM
    pub required_maintenance_frequency_in_months: Option<u32>,
}

impl ManufacturerModel {
    pub fn new(
        manufacturer: impl Into<String>,
        model: impl Into<String>,
        required_maintenance_frequency_in_months: Option<u32>,
    ) -> Self {
        Self {
            manufacturer: manufacturer.into(),
            model: model.into(),
            required_maintenance_frequency_in_months,
        }
    }

    /// 有效维护周期（缺省视为 0）
    pub fn effective_frequency_months(&self) -> u32 {
        self.required_maintenance_frequency_in_months.unwrap_or(0)
    }

    /// 厂商与型号的组合文本（搜索时作为一个字段）
    pub fn combined(&self) -> String {
        format!("{} {}", self.manufacturer, self.model)
    }
}

// ==========================================
// FacilityDepartment - 院区/科室
// ==========================================
// 主键: (facility_name, assigned_department)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FacilityDepartment {
    pub facility_name: String,
    pub assigned_department: String,
}

impl FacilityDepartment {
    pub fn new(facility_name: impl Into<String>, assigned_department: impl Into<String>) -> Self {
        Self {
            facility_name: facility_name.into(),
            assigned_department: assigned_department.into(),
        }
    }
}

/// 厂商及其全部型号（型号去重且升序）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManufacturerModels {
    pub manufacturer: String,
    pub models: Vec<String>,
}

/// 院区及其全部科室（科室去重且升序）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FacilityDepartments {
    pub facility: String,
    pub departments: Vec<String>,
}
