// ==========================================
// HTM Vault - 设备生命周期门
// ==========================================
// 职责: 设备新增、更新、退役、重新启用、查询、搜索
// 状态机:
//   IN_SERVICE --retire--> RETIRED --reactivate--> IN_SERVICE
//   IN_SERVICE --update--> IN_SERVICE
//   RETIRED 拒绝除 reactivate 以外的一切修改
// 并发: 不做进程内加锁，存储层后写覆盖
// ==========================================

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::api::error::{ApiError, ApiResult};
use crate::api::id_generator::generate_unique_id;
use crate::api::record_outcome;
use crate::api::validator::{is_blank, parse_past_date, today, validate_attribute};
use crate::config::IdentityConfigReader;
use crate::domain::device::{Actor, Device};
use crate::domain::reference::ManufacturerModel;
use crate::domain::types::ServiceStatus;
use crate::engine::compliance::ComplianceScheduler;
use crate::engine::search::SearchPredicate;
use crate::metrics::MetricsSink;
use crate::repository::store::{DeviceStore, ReferenceDataStore, WorkOrderStore};

// ==========================================
// 请求结构体
// ==========================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddDeviceRequest {
    pub serial_number: String,
    pub manufacturer: String,
    pub model: String,
    pub facility_name: String,
    pub assigned_department: String,
    /// YYYY-MM-DD
    pub manufacture_date: Option<String>,
    pub notes: Option<String>,
    pub actor: Actor,
}

/// 可编辑字段整体覆盖（manufacture_date 与 notes 缺省即清空）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateDeviceRequest {
    pub control_number: String,
    pub serial_number: String,
    pub manufacturer: String,
    pub model: String,
    pub facility_name: String,
    pub assigned_department: String,
    pub manufacture_date: Option<String>,
    pub notes: Option<String>,
    pub actor: Actor,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetireDeviceRequest {
    pub control_number: String,
    pub actor: Actor,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReactivateDeviceRequest {
    pub control_number: String,
    pub actor: Actor,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetDeviceRequest {
    pub control_number: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchDevicesRequest {
    /// 空白分隔的检索词；缺省或空白返回全部设备
    pub criteria: Option<String>,
}

/// 已校验的可编辑字段
struct ValidatedAttributes {
    manufacturer_model: ManufacturerModel,
}

// ==========================================
// DeviceApi - 设备生命周期门
// ==========================================
pub struct DeviceApi {
    device_store: Arc<dyn DeviceStore>,
    work_order_store: Arc<dyn WorkOrderStore>,
    reference_store: Arc<dyn ReferenceDataStore>,
    identity_config: Arc<dyn IdentityConfigReader>,
    scheduler: ComplianceScheduler,
}

impl DeviceApi {
    pub fn new(
        device_store: Arc<dyn DeviceStore>,
        work_order_store: Arc<dyn WorkOrderStore>,
        reference_store: Arc<dyn ReferenceDataStore>,
        identity_config: Arc<dyn IdentityConfigReader>,
    ) -> Self {
        Self {
            device_store,
            work_order_store,
            reference_store,
            identity_config,
            scheduler: ComplianceScheduler::new(),
        }
    }

    // ==========================================
    // 新增设备
    // ==========================================

    /// 新增设备（IN_SERVICE，入账日期为今天）
    ///
    /// # 校验顺序
    /// 1. 序列号、厂商、型号字符集 → 厂商/型号存在 → 重复设备
    /// 2. 院区、科室字符集 → 院区/科室存在
    /// 3. 出厂日期格式与不晚于今天
    pub fn add_device(&self, request: AddDeviceRequest, metrics: &dyn MetricsSink) -> ApiResult<Device> {
        tracing::info!(
            serial_number = %request.serial_number,
            manufacturer = %request.manufacturer,
            model = %request.model,
            actor = %request.actor.id,
            "收到 AddDevice 请求"
        );
        let result = self.add_device_inner(request);
        record_outcome(metrics, "AddDevice", &result);
        result
    }

    fn add_device_inner(&self, request: AddDeviceRequest) -> ApiResult<Device> {
        let attrs = self.validate_attributes(
            &request.serial_number,
            &request.manufacturer,
            &request.model,
            &request.facility_name,
            &request.assigned_department,
            true,
        )?;

        let today = today();
        let manufacture_date = match request.manufacture_date.as_deref() {
            Some(raw) => Some(parse_past_date("manufacture_date", raw, today)?),
            None => None,
        };

        let prefix = self
            .identity_config
            .get_control_number_prefix()
            .map_err(ApiError::config)?;
        let length = self
            .identity_config
            .get_control_number_length()
            .map_err(ApiError::config)?;
        let control_number = generate_unique_id(&prefix, length, |candidate| {
            Ok(self.device_store.exists(candidate)?)
        })?;

        let dates = self.scheduler.recompute(
            attrs.manufacturer_model.required_maintenance_frequency_in_months,
            None,
            None,
            today,
        );

        let device = Device {
            control_number,
            serial_number: request.serial_number,
            manufacturer_model: attrs.manufacturer_model,
            manufacture_date,
            service_status: ServiceStatus::InService,
            facility_name: request.facility_name,
            assigned_department: request.assigned_department,
            compliance_through_date: dates.compliance_through_date,
            last_pm_completion_date: None,
            next_pm_due_date: dates.next_pm_due_date,
            inventory_add_date: today,
            added_by: request.actor,
            notes: request.notes.unwrap_or_default(),
        };

        let saved = self.device_store.save(&device)?;
        tracing::info!(control_number = %saved.control_number, "设备已入账");
        Ok(saved)
    }

    // ==========================================
    // 更新设备
    // ==========================================

    /// 更新设备可编辑字段并重算合规日期
    ///
    /// RETIRED 设备在任何字段校验之前即被拒绝
    pub fn update_device(
        &self,
        request: UpdateDeviceRequest,
        metrics: &dyn MetricsSink,
    ) -> ApiResult<Device> {
        tracing::info!(
            control_number = %request.control_number,
            actor = %request.actor.id,
            "收到 UpdateDevice 请求"
        );
        let result = self.update_device_inner(request);
        record_outcome(metrics, "UpdateDevice", &result);
        result
    }

    fn update_device_inner(&self, request: UpdateDeviceRequest) -> ApiResult<Device> {
        if is_blank(Some(&request.control_number)) {
            return Err(ApiError::invalid("control_number", "不能为空"));
        }

        let mut device = self.device_store.load(&request.control_number)?;
        if device.is_retired() {
            return Err(ApiError::RetiredDeviceImmutable(device.control_number));
        }

        let attrs = self.validate_attributes(
            &request.serial_number,
            &request.manufacturer,
            &request.model,
            &request.facility_name,
            &request.assigned_department,
            false,
        )?;

        // 缺省清空；给出的值（包括空串）必须是合法的过去日期
        let manufacture_date = match request.manufacture_date.as_deref() {
            Some(raw) => Some(parse_past_date("manufacture_date", raw, today())?),
            None => None,
        };

        let dates = self.scheduler.recompute(
            attrs.manufacturer_model.required_maintenance_frequency_in_months,
            device.last_pm_completion_date,
            device.next_pm_due_date,
            device.inventory_add_date,
        );

        device.serial_number = request.serial_number;
        device.manufacturer_model = attrs.manufacturer_model;
        device.manufacture_date = manufacture_date;
        device.facility_name = request.facility_name;
        device.assigned_department = request.assigned_department;
        device.notes = request.notes.unwrap_or_default();
        device.compliance_through_date = dates.compliance_through_date;
        device.next_pm_due_date = dates.next_pm_due_date;

        let saved = self.device_store.save(&device)?;
        Ok(saved)
    }

    // ==========================================
    // 退役 / 重新启用
    // ==========================================

    /// 退役设备（存在未关闭工单时拒绝；其他字段不变）
    pub fn retire_device(
        &self,
        request: RetireDeviceRequest,
        metrics: &dyn MetricsSink,
    ) -> ApiResult<Device> {
        tracing::info!(
            control_number = %request.control_number,
            actor = %request.actor.id,
            "收到 RetireDevice 请求"
        );
        let result = self.retire_device_inner(&request.control_number);
        record_outcome(metrics, "RetireDevice", &result);
        result
    }

    fn retire_device_inner(&self, control_number: &str) -> ApiResult<Device> {
        let mut device = self.device_store.load(control_number)?;

        let open_count = self
            .work_order_store
            .find_by_control_number(control_number)?
            .iter()
            .filter(|wo| wo.is_open())
            .count();
        if open_count > 0 {
            return Err(ApiError::OpenWorkOrdersExist {
                control_number: control_number.to_string(),
                open_count,
            });
        }

        device.service_status = ServiceStatus::Retired;
        Ok(self.device_store.save(&device)?)
    }

    /// 重新启用设备（无论原状态，仅翻转状态）
    pub fn reactivate_device(
        &self,
        request: ReactivateDeviceRequest,
        metrics: &dyn MetricsSink,
    ) -> ApiResult<Device> {
        tracing::info!(
            control_number = %request.control_number,
            actor = %request.actor.id,
            "收到 ReactivateDevice 请求"
        );
        let result = self.reactivate_device_inner(&request.control_number);
        record_outcome(metrics, "ReactivateDevice", &result);
        result
    }

    fn reactivate_device_inner(&self, control_number: &str) -> ApiResult<Device> {
        let mut device = self.device_store.load(control_number)?;
        device.service_status = ServiceStatus::InService;
        Ok(self.device_store.save(&device)?)
    }

    // ==========================================
    // 查询
    // ==========================================

    pub fn get_device(&self, request: GetDeviceRequest, metrics: &dyn MetricsSink) -> ApiResult<Device> {
        tracing::info!(control_number = %request.control_number, "收到 GetDevice 请求");
        let result = self
            .device_store
            .load(&request.control_number)
            .map_err(ApiError::from);
        record_outcome(metrics, "GetDevice", &result);
        result
    }

    /// 多词多字段搜索（词间 AND，字段间 OR，区分大小写）
    pub fn search_devices(
        &self,
        request: SearchDevicesRequest,
        metrics: &dyn MetricsSink,
    ) -> ApiResult<Vec<Device>> {
        let predicate = SearchPredicate::from_query(request.criteria.as_deref());
        tracing::info!(terms = ?predicate.terms, "收到 SearchDevices 请求");
        let result = self.device_store.scan(&predicate).map_err(ApiError::from);
        record_outcome(metrics, "SearchDevices", &result);
        if let Ok(devices) = &result {
            tracing::debug!(matched = devices.len(), "搜索完成");
        }
        result
    }

    // ==========================================
    // 内部校验
    // ==========================================

    /// 校验可编辑字段并解析参考数据
    ///
    /// 参考数据查不到一律转为 InvalidAttribute
    fn validate_attributes(
        &self,
        serial_number: &str,
        manufacturer: &str,
        model: &str,
        facility_name: &str,
        assigned_department: &str,
        check_duplicate: bool,
    ) -> ApiResult<ValidatedAttributes> {
        validate_attribute("serial_number", serial_number)?;
        validate_attribute("manufacturer", manufacturer)?;
        validate_attribute("model", model)?;

        let manufacturer_model = self
            .reference_store
            .resolve_manufacturer_model(manufacturer, model)
            .map_err(|e| {
                if e.is_not_found() {
                    ApiError::invalid(
                        "manufacturer_model",
                        format!("厂商/型号组合 {}/{} 不存在", manufacturer, model),
                    )
                } else {
                    ApiError::from(e)
                }
            })?;

        if check_duplicate {
            if let Some(existing) = self
                .device_store
                .find_by_manufacturer_model_and_serial(&manufacturer_model, serial_number)?
            {
                return Err(ApiError::DuplicateDevice {
                    manufacturer: manufacturer.to_string(),
                    model: model.to_string(),
                    serial_number: serial_number.to_string(),
                    existing_control_number: existing.control_number,
                });
            }
        }

        validate_attribute("facility_name", facility_name)?;
        validate_attribute("assigned_department", assigned_department)?;

        self.reference_store
            .resolve_facility_department(facility_name, assigned_department)
            .map_err(|e| {
                if e.is_not_found() {
                    ApiError::invalid(
                        "facility_department",
                        format!("院区/科室组合 {}/{} 不存在", facility_name, assigned_department),
                    )
                } else {
                    ApiError::from(e)
                }
            })?;

        Ok(ValidatedAttributes { manufacturer_model })
    }
}
