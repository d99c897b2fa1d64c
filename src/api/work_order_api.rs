// ==========================================
// HTM Vault - 工单生命周期门
// ==========================================
// 职责: 工单创建、更新、关闭、查询
// 状态机:
//   OPEN --update--> OPEN
//   OPEN --close--> CLOSED（终态，不可再修改）
// 关闭后: 对 PM / 验收测试工单推进设备维保日期
// ==========================================

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::api::error::{ApiError, ApiResult};
use crate::api::id_generator::generate_unique_id;
use crate::api::record_outcome;
use crate::api::validator::{
    is_blank, now_seconds, parse_enum, parse_past_date_time, require_non_blank,
};
use crate::config::IdentityConfigReader;
use crate::domain::device::Actor;
use crate::domain::types::{SortOrder, WorkOrderAwaitStatus, WorkOrderCompletionStatus, WorkOrderType};
use crate::domain::work_order::WorkOrder;
use crate::engine::maintenance::MaintenanceAdvancer;
use crate::engine::ordering::sort_work_orders;
use crate::metrics::MetricsSink;
use crate::repository::store::{DeviceStore, WorkOrderStore};

// ==========================================
// 请求 / 结果结构体
// ==========================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateWorkOrderRequest {
    pub control_number: String,
    pub work_order_type: String,
    pub problem_reported: String,
    pub problem_found: Option<String>,
    /// ASCENDING / DESCENDING；缺省取配置
    pub sort_order: Option<String>,
    pub actor: Actor,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateWorkOrderResult {
    pub work_order: WorkOrder,
    /// 设备的全部工单（含新建的），已排序
    pub device_work_orders: Vec<WorkOrder>,
}

/// 增量更新: None 表示不变；await_status / problem_found / summary /
/// completion_date_time 传空白表示清空
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateWorkOrderRequest {
    pub work_order_id: String,
    pub work_order_type: Option<String>,
    pub await_status: Option<String>,
    pub problem_reported: Option<String>,
    pub problem_found: Option<String>,
    pub summary: Option<String>,
    pub completion_date_time: Option<String>,
}

/// summary / completion_date_time 若提供则覆盖记录中的值
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CloseWorkOrderRequest {
    pub work_order_id: String,
    pub summary: Option<String>,
    pub completion_date_time: Option<String>,
    pub actor: Actor,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetWorkOrderRequest {
    pub work_order_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetDeviceWorkOrdersRequest {
    pub control_number: String,
    pub sort_order: Option<String>,
}

/// 可清空文本: 空白 → None
fn clearable_text(value: String) -> Option<String> {
    if value.trim().is_empty() {
        None
    } else {
        Some(value)
    }
}

// ==========================================
// WorkOrderApi - 工单生命周期门
// ==========================================
pub struct WorkOrderApi {
    work_order_store: Arc<dyn WorkOrderStore>,
    device_store: Arc<dyn DeviceStore>,
    identity_config: Arc<dyn IdentityConfigReader>,
    advancer: MaintenanceAdvancer,
}

impl WorkOrderApi {
    pub fn new(
        work_order_store: Arc<dyn WorkOrderStore>,
        device_store: Arc<dyn DeviceStore>,
        identity_config: Arc<dyn IdentityConfigReader>,
    ) -> Self {
        Self {
            work_order_store,
            device_store,
            identity_config,
            advancer: MaintenanceAdvancer::new(),
        }
    }

    // ==========================================
    // 创建工单
    // ==========================================

    /// 为设备创建 OPEN 工单，返回新工单及该设备的全部工单
    pub fn create_work_order(
        &self,
        request: CreateWorkOrderRequest,
        metrics: &dyn MetricsSink,
    ) -> ApiResult<CreateWorkOrderResult> {
        tracing::info!(
            control_number = %request.control_number,
            work_order_type = %request.work_order_type,
            actor = %request.actor.id,
            "收到 CreateWorkOrder 请求"
        );
        let result = self.create_work_order_inner(request);
        record_outcome(metrics, "CreateWorkOrder", &result);
        result
    }

    fn create_work_order_inner(&self, request: CreateWorkOrderRequest) -> ApiResult<CreateWorkOrderResult> {
        let device = self.device_store.load(&request.control_number)?;

        let work_order_type: WorkOrderType =
            parse_enum("work_order_type", &request.work_order_type)?;
        let problem_reported =
            require_non_blank("problem_reported", Some(&request.problem_reported))?;
        let sort_order = self.resolve_sort_order(request.sort_order.as_deref())?;

        let prefix = self
            .identity_config
            .get_work_order_id_prefix()
            .map_err(ApiError::config)?;
        let length = self
            .identity_config
            .get_work_order_id_length()
            .map_err(ApiError::config)?;
        let work_order_id = generate_unique_id(&prefix, length, |candidate| {
            Ok(self.work_order_store.exists(candidate)?)
        })?;

        let work_order = WorkOrder::open_for_device(
            work_order_id,
            work_order_type,
            &device,
            problem_reported,
            request.problem_found.and_then(clearable_text),
            request.actor,
            now_seconds(),
        );
        let saved = self.work_order_store.save(&work_order)?;
        tracing::info!(work_order_id = %saved.work_order_id, "工单已创建");

        let mut device_work_orders = self
            .work_order_store
            .find_by_control_number(&device.control_number)?;
        sort_work_orders(&mut device_work_orders, sort_order);

        Ok(CreateWorkOrderResult {
            work_order: saved,
            device_work_orders,
        })
    }

    // ==========================================
    // 更新工单
    // ==========================================

    /// 更新 OPEN 工单（不改变完成状态）
    ///
    /// CLOSED 工单在任何字段校验之前即被拒绝
    pub fn update_work_order(
        &self,
        request: UpdateWorkOrderRequest,
        metrics: &dyn MetricsSink,
    ) -> ApiResult<WorkOrder> {
        tracing::info!(work_order_id = %request.work_order_id, "收到 UpdateWorkOrder 请求");
        let result = self.update_work_order_inner(request);
        record_outcome(metrics, "UpdateWorkOrder", &result);
        result
    }

    fn update_work_order_inner(&self, request: UpdateWorkOrderRequest) -> ApiResult<WorkOrder> {
        if is_blank(Some(&request.work_order_id)) {
            return Err(ApiError::invalid("work_order_id", "不能为空"));
        }

        let mut work_order = self.work_order_store.load(&request.work_order_id)?;
        if work_order.is_closed() {
            return Err(ApiError::ClosedWorkOrderImmutable(work_order.work_order_id));
        }

        if let Some(raw) = request.work_order_type.as_deref() {
            work_order.work_order_type = parse_enum("work_order_type", raw)?;
        }

        if let Some(raw) = request.await_status.as_deref() {
            work_order.await_status = if raw.trim().is_empty() {
                None
            } else {
                Some(parse_enum::<WorkOrderAwaitStatus>("await_status", raw)?)
            };
        }

        if let Some(raw) = request.problem_reported {
            work_order.problem_reported = require_non_blank("problem_reported", Some(&raw))?;
        }

        if let Some(raw) = request.problem_found {
            work_order.problem_found = clearable_text(raw);
        }

        if let Some(raw) = request.summary {
            work_order.summary = clearable_text(raw);
        }

        if let Some(raw) = request.completion_date_time.as_deref() {
            work_order.completion_date_time = if raw.trim().is_empty() {
                None
            } else {
                Some(parse_past_date_time("completion_date_time", raw, now_seconds())?)
            };
        }

        Ok(self.work_order_store.save(&work_order)?)
    }

    // ==========================================
    // 关闭工单
    // ==========================================

    /// 关闭工单（OPEN → CLOSED，仅一次）
    ///
    /// # 步骤
    /// 1. 合并请求中的 summary / completion_date_time
    /// 2. 二者缺一 → CloseNotComplete
    /// 3. 标记 CLOSED，记录关闭人与时间，清空等待状态
    /// 4. 重新读取工单与设备，推进维保日期
    pub fn close_work_order(
        &self,
        request: CloseWorkOrderRequest,
        metrics: &dyn MetricsSink,
    ) -> ApiResult<WorkOrder> {
        tracing::info!(
            work_order_id = %request.work_order_id,
            actor = %request.actor.id,
            "收到 CloseWorkOrder 请求"
        );
        let result = self.close_work_order_inner(request);
        record_outcome(metrics, "CloseWorkOrder", &result);
        result
    }

    fn close_work_order_inner(&self, request: CloseWorkOrderRequest) -> ApiResult<WorkOrder> {
        let mut work_order = self.work_order_store.load(&request.work_order_id)?;
        if work_order.is_closed() {
            return Err(ApiError::AlreadyClosed(work_order.work_order_id));
        }

        let now = now_seconds();
        if let Some(summary) = request.summary.and_then(clearable_text) {
            work_order.summary = Some(summary);
        }
        if let Some(raw) = request.completion_date_time.as_deref() {
            if !raw.trim().is_empty() {
                work_order.completion_date_time =
                    Some(parse_past_date_time("completion_date_time", raw, now)?);
            }
        }

        if !work_order.has_completion_details() {
            let mut missing = Vec::new();
            if is_blank(work_order.summary.as_deref()) {
                missing.push("summary");
            }
            if work_order.completion_date_time.is_none() {
                missing.push("completion_date_time");
            }
            return Err(ApiError::CloseNotComplete {
                work_order_id: work_order.work_order_id,
                missing: missing.join(", "),
            });
        }

        work_order.completion_status = WorkOrderCompletionStatus::Closed;
        work_order.closed_by = Some(request.actor);
        work_order.closed_at = Some(now);
        work_order.await_status = None;

        let saved = self.work_order_store.save(&work_order)?;
        tracing::info!(work_order_id = %saved.work_order_id, "工单已关闭");

        if let Err(err) = self.advance_maintenance(&saved.work_order_id) {
            tracing::warn!(
                work_order_id = %saved.work_order_id,
                control_number = %saved.control_number,
                error = %err,
                "工单已关闭，但设备维保日期推进失败"
            );
            return Err(err);
        }
        Ok(saved)
    }

    /// 以存储中的工单与设备为准推进维保日期
    fn advance_maintenance(&self, work_order_id: &str) -> ApiResult<()> {
        let work_order = self.work_order_store.load(work_order_id)?;
        let device = self.device_store.load(&work_order.control_number)?;

        if let Some(updated) = self.advancer.advance(&device, &work_order) {
            self.device_store.save(&updated)?;
            tracing::info!(
                control_number = %updated.control_number,
                next_pm_due_date = ?updated.next_pm_due_date,
                "设备维保日期已推进"
            );
        }
        Ok(())
    }

    // ==========================================
    // 查询
    // ==========================================

    pub fn get_work_order(
        &self,
        request: GetWorkOrderRequest,
        metrics: &dyn MetricsSink,
    ) -> ApiResult<WorkOrder> {
        tracing::info!(work_order_id = %request.work_order_id, "收到 GetWorkOrder 请求");
        let result = self
            .work_order_store
            .load(&request.work_order_id)
            .map_err(ApiError::from);
        record_outcome(metrics, "GetWorkOrder", &result);
        result
    }

    /// 设备的全部工单（按排序方向）
    pub fn get_device_work_orders(
        &self,
        request: GetDeviceWorkOrdersRequest,
        metrics: &dyn MetricsSink,
    ) -> ApiResult<Vec<WorkOrder>> {
        tracing::info!(control_number = %request.control_number, "收到 GetDeviceWorkOrders 请求");
        let result = self.get_device_work_orders_inner(request);
        record_outcome(metrics, "GetDeviceWorkOrders", &result);
        result
    }

    fn get_device_work_orders_inner(&self, request: GetDeviceWorkOrdersRequest) -> ApiResult<Vec<WorkOrder>> {
        if is_blank(Some(&request.control_number)) {
            return Err(ApiError::invalid("control_number", "不能为空"));
        }
        let sort_order = self.resolve_sort_order(request.sort_order.as_deref())?;

        // 未知设备没有工单，返回空列表
        let mut work_orders = self
            .work_order_store
            .find_by_control_number(&request.control_number)?;
        sort_work_orders(&mut work_orders, sort_order);
        Ok(work_orders)
    }

    /// 缺省或空白取配置默认值，否则必须为 ASCENDING / DESCENDING
    fn resolve_sort_order(&self, raw: Option<&str>) -> ApiResult<SortOrder> {
        match raw {
            Some(value) if !value.trim().is_empty() => parse_enum("sort_order", value),
            _ => self
                .identity_config
                .get_default_sort_order()
                .map_err(ApiError::config),
        }
    }
}
