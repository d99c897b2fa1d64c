// ==========================================
// HTM Vault - 存储协作方 Trait
// ==========================================
// 职责: 定义生命周期门所依赖的数据访问接口（不包含实现）
// 红线: 不含业务规则，只做加载/保存/查询
// 约定: 按主键加载查不到返回 RepositoryError::NotFound
// ==========================================

use crate::domain::device::Device;
use crate::domain::reference::{FacilityDepartment, ManufacturerModel};
use crate::domain::work_order::WorkOrder;
use crate::engine::search::SearchPredicate;
use crate::repository::error::RepositoryResult;

// ==========================================
// DeviceStore
// ==========================================
// 实现者: DeviceRepository（rusqlite）
pub trait DeviceStore: Send + Sync {
    /// 按 control_number 加载
    fn load(&self, control_number: &str) -> RepositoryResult<Device>;

    /// 保存（存在即覆盖）
    fn save(&self, device: &Device) -> RepositoryResult<Device>;

    /// 按 (厂商, 型号, 序列号) 查找
    fn find_by_manufacturer_model_and_serial(
        &self,
        manufacturer_model: &ManufacturerModel,
        serial_number: &str,
    ) -> RepositoryResult<Option<Device>>;

    /// 按谓词扫描
    fn scan(&self, predicate: &SearchPredicate) -> RepositoryResult<Vec<Device>>;

    fn exists(&self, control_number: &str) -> RepositoryResult<bool>;
}

// ==========================================
// WorkOrderStore
// ==========================================
// 实现者: WorkOrderRepository（rusqlite）
pub trait WorkOrderStore: Send + Sync {
    /// 按 work_order_id 加载
    fn load(&self, work_order_id: &str) -> RepositoryResult<WorkOrder>;

    /// 保存（存在即覆盖）
    fn save(&self, work_order: &WorkOrder) -> RepositoryResult<WorkOrder>;

    /// 设备的全部工单（顺序不保证）
    fn find_by_control_number(&self, control_number: &str) -> RepositoryResult<Vec<WorkOrder>>;

    fn exists(&self, work_order_id: &str) -> RepositoryResult<bool>;
}

// ==========================================
// ReferenceDataStore
// ==========================================
// 实现者: ReferenceDataRepository（rusqlite）
pub trait ReferenceDataStore: Send + Sync {
    fn resolve_manufacturer_model(
        &self,
        manufacturer: &str,
        model: &str,
    ) -> RepositoryResult<ManufacturerModel>;

    fn resolve_facility_department(
        &self,
        facility_name: &str,
        assigned_department: &str,
    ) -> RepositoryResult<FacilityDepartment>;

    fn list_manufacturer_models(&self) -> RepositoryResult<Vec<ManufacturerModel>>;

    fn list_facility_departments(&self) -> RepositoryResult<Vec<FacilityDepartment>>;
}
