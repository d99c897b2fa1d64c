// ==========================================
// HTM Vault - API 层
// ==========================================
// 职责: 设备/工单生命周期门与参考数据查询
// 约定: 每个操作接收普通请求结构体与指标接收端，返回结果或 ApiError
// ==========================================

pub mod device_api;
pub mod error;
pub mod id_generator;
pub mod reference_api;
pub mod validator;
pub mod work_order_api;

// 重导出核心类型
pub use device_api::{
    AddDeviceRequest, DeviceApi, GetDeviceRequest, ReactivateDeviceRequest, RetireDeviceRequest,
    SearchDevicesRequest, UpdateDeviceRequest,
};
pub use error::{ApiError, ApiResult, ErrorKind};
pub use reference_api::ReferenceDataApi;
pub use work_order_api::{
    CloseWorkOrderRequest, CreateWorkOrderRequest, CreateWorkOrderResult,
    GetDeviceWorkOrdersRequest, GetWorkOrderRequest, UpdateWorkOrderRequest, WorkOrderApi,
};

use crate::metrics::{count_metric_name, MetricsSink, OUTCOME_SUCCESS};

/// 记录操作结果: 成功计入 `{op}.Success.Count`，失败计入 `{op}.{错误变体}.Count`
pub(crate) fn record_outcome<T>(metrics: &dyn MetricsSink, operation: &str, result: &ApiResult<T>) {
    match result {
        Ok(_) => metrics.add_count(&count_metric_name(operation, OUTCOME_SUCCESS), 1.0),
        Err(e) => {
            tracing::warn!(operation, code = e.code(), error = %e, "请求被拒绝");
            metrics.add_count(&count_metric_name(operation, e.code()), 1.0);
        }
    }
}
