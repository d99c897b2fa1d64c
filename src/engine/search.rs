// ==========================================
// HTM Vault - 设备搜索谓词
// ==========================================
// 语义: 每个检索词至少命中一个字段（字段间 OR），所有检索词都要命中（词间 AND）
// 匹配: 区分大小写的子串包含，不做任何归一化
// 输出: 结构化谓词，可在内存中求值，也可渲染为 SQLite WHERE 子句
// ==========================================

use crate::domain::device::Device;
use serde::{Deserialize, Serialize};

// ==========================================
// SearchField - 参与搜索的设备字段
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SearchField {
    ControlNumber,
    SerialNumber,
    ManufacturerModel, // 厂商 + 型号组合
    ServiceStatus,
    FacilityName,
    AssignedDepartment,
    ComplianceThroughDate,
    NextPmDueDate,
}

impl SearchField {
    pub const ALL: [SearchField; 8] = [
        SearchField::ControlNumber,
        SearchField::SerialNumber,
        SearchField::ManufacturerModel,
        SearchField::ServiceStatus,
        SearchField::FacilityName,
        SearchField::AssignedDepartment,
        SearchField::ComplianceThroughDate,
        SearchField::NextPmDueDate,
    ];

    /// 字段在设备上的文本值（日期为空时不参与匹配）
    pub fn text_of(&self, device: &Device) -> Option<String> {
        match self {
            SearchField::ControlNumber => Some(device.control_number.clone()),
            SearchField::SerialNumber => Some(device.serial_number.clone()),
            SearchField::ManufacturerModel => Some(device.manufacturer_model.combined()),
            SearchField::ServiceStatus => Some(device.service_status.to_db_str().to_string()),
            SearchField::FacilityName => Some(device.facility_name.clone()),
            SearchField::AssignedDepartment => Some(device.assigned_department.clone()),
            SearchField::ComplianceThroughDate => {
                device.compliance_through_date.map(|d| d.to_string())
            }
            SearchField::NextPmDueDate => device.next_pm_due_date.map(|d| d.to_string()),
        }
    }

    /// device 表上对应的 SQL 表达式
    pub fn sql_expr(&self) -> &'static str {
        match self {
            SearchField::ControlNumber => "control_number",
            SearchField::SerialNumber => "serial_number",
            SearchField::ManufacturerModel => "(manufacturer || ' ' || model)",
            SearchField::ServiceStatus => "service_status",
            SearchField::FacilityName => "facility_name",
            SearchField::AssignedDepartment => "assigned_department",
            SearchField::ComplianceThroughDate => "compliance_through_date",
            SearchField::NextPmDueDate => "next_pm_due_date",
        }
    }
}

// ==========================================
// SearchPredicate - 多词多字段谓词
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SearchPredicate {
    pub terms: Vec<String>,
    pub fields: Vec<SearchField>,
}

impl SearchPredicate {
    /// 由原始查询文本构造（按空白切分；空/缺省输入得到零个检索词）
    pub fn from_query(raw: Option<&str>) -> Self {
        let terms = raw
            .unwrap_or("")
            .split_whitespace()
            .map(str::to_string)
            .collect();
        Self {
            terms,
            fields: SearchField::ALL.to_vec(),
        }
    }

    /// 零个检索词时匹配全部设备
    pub fn matches_everything(&self) -> bool {
        self.terms.is_empty()
    }

    /// 内存求值
    pub fn matches(&self, device: &Device) -> bool {
        self.terms.iter().all(|term| {
            self.fields.iter().any(|field| {
                field
                    .text_of(device)
                    .map(|text| text.contains(term.as_str()))
                    .unwrap_or(false)
            })
        })
    }

    /// 渲染为 WHERE 子句与参数
    ///
    /// 第 N 个检索词绑定到 `?N`，同组内重复引用；`instr` 区分大小写，
    /// NULL 字段得到 NULL，不算命中。
    pub fn to_sql_where(&self) -> (String, Vec<String>) {
        if self.matches_everything() || self.fields.is_empty() {
            let clause = if self.matches_everything() { "1 = 1" } else { "1 = 0" };
            return (clause.to_string(), Vec::new());
        }

        let groups: Vec<String> = self
            .terms
            .iter()
            .enumerate()
            .map(|(idx, _)| {
                let placeholder = idx + 1;
                let ors: Vec<String> = self
                    .fields
                    .iter()
                    .map(|f| format!("instr({}, ?{}) > 0", f.sql_expr(), placeholder))
                    .collect();
                format!("({})", ors.join(" OR "))
            })
            .collect();

        (groups.join(" AND "), self.terms.clone())
    }
}
