// ==========================================
// API集成测试辅助工具
// ==========================================
// 职责: 提供生命周期门集成测试的通用环境与请求构造
// ==========================================

#![allow(dead_code)]

#[path = "../test_helpers.rs"]
mod test_helpers;

use std::sync::{Arc, Mutex};

use chrono::{Local, NaiveDate, NaiveDateTime};
use rusqlite::Connection;
use tempfile::NamedTempFile;

use htm_vault::api::{
    AddDeviceRequest, CloseWorkOrderRequest, CreateWorkOrderRequest, DeviceApi, ReferenceDataApi,
    WorkOrderApi,
};
use htm_vault::config::ConfigManager;
use htm_vault::db::open_sqlite_connection;
use htm_vault::domain::{Actor, Device, WorkOrder};
use htm_vault::metrics::RecordingMetricsSink;
use htm_vault::repository::{DeviceRepository, ReferenceDataRepository, WorkOrderRepository};

pub use test_helpers::create_test_db;

// ==========================================
// API测试环境
// ==========================================

/// API测试环境
///
/// 包含全部生命周期门、仓储与一个记录型指标接收端
pub struct ApiTestEnv {
    pub db_path: String,
    pub device_api: Arc<DeviceApi>,
    pub work_order_api: Arc<WorkOrderApi>,
    pub reference_api: Arc<ReferenceDataApi>,
    pub config: Arc<ConfigManager>,

    // Repository层（用于测试数据准备与断言）
    pub device_repo: Arc<DeviceRepository>,
    pub work_order_repo: Arc<WorkOrderRepository>,
    pub reference_repo: Arc<ReferenceDataRepository>,

    pub metrics: RecordingMetricsSink,

    pub conn: Arc<Mutex<Connection>>,

    // 临时文件（确保生命周期）
    _temp_file: Option<NamedTempFile>,
}

impl ApiTestEnv {
    /// 创建新的API测试环境（临时库 + 种子参考数据）
    pub fn new() -> Result<Self, String> {
        let (temp_file, db_path) =
            create_test_db().map_err(|e| format!("创建测试数据库失败: {}", e))?;
        let mut env = Self::open(db_path)?;
        test_helpers::seed_reference_data(env.conn.clone())
            .map_err(|e| format!("写入参考数据失败: {}", e))?;
        env._temp_file = Some(temp_file);
        Ok(env)
    }

    /// 在已存在的库上再开一套独立连接与 API 实例
    pub fn open(db_path: String) -> Result<Self, String> {
        let conn =
            open_sqlite_connection(&db_path).map_err(|e| format!("无法打开数据库: {}", e))?;
        let conn = Arc::new(Mutex::new(conn));

        // ==========================================
        // 初始化Repository层
        // ==========================================
        let device_repo = Arc::new(DeviceRepository::from_connection(conn.clone()));
        let work_order_repo = Arc::new(WorkOrderRepository::from_connection(conn.clone()));
        let reference_repo = Arc::new(ReferenceDataRepository::from_connection(conn.clone()));
        let config = Arc::new(
            ConfigManager::from_connection(conn.clone())
                .map_err(|e| format!("无法创建ConfigManager: {}", e))?,
        );

        // ==========================================
        // 初始化API层
        // ==========================================
        let device_api = Arc::new(DeviceApi::new(
            device_repo.clone(),
            work_order_repo.clone(),
            reference_repo.clone(),
            config.clone(),
        ));
        let work_order_api = Arc::new(WorkOrderApi::new(
            work_order_repo.clone(),
            device_repo.clone(),
            config.clone(),
        ));
        let reference_api = Arc::new(ReferenceDataApi::new(reference_repo.clone()));

        Ok(Self {
            db_path,
            device_api,
            work_order_api,
            reference_api,
            config,
            device_repo,
            work_order_repo,
            reference_repo,
            metrics: RecordingMetricsSink::new(),
            conn,
            _temp_file: None,
        })
    }

    // ==========================================
    // 便捷操作
    // ==========================================

    /// 以默认属性新增一台设备（Acme / Pump 5，North / ICU）
    pub fn add_device(&self, serial_number: &str) -> Device {
        self.device_api
            .add_device(add_request(serial_number, "Acme", "Pump 5"), &self.metrics)
            .expect("新增设备失败")
    }

    /// 为设备开一张工单
    pub fn open_work_order(&self, control_number: &str, work_order_type: &str) -> WorkOrder {
        self.work_order_api
            .create_work_order(create_request(control_number, work_order_type), &self.metrics)
            .expect("创建工单失败")
            .work_order
    }

    /// 以今天零点为完成时间关闭工单
    pub fn close_work_order(&self, work_order_id: &str) -> WorkOrder {
        self.work_order_api
            .close_work_order(
                close_request(work_order_id, Some("Replaced battery"), Some(&today_midnight_str())),
                &self.metrics,
            )
            .expect("关闭工单失败")
    }

    /// 某指标的累计值
    pub fn metric(&self, name: &str) -> f64 {
        self.metrics.total(name)
    }
}

// ==========================================
// 请求构造
// ==========================================

pub fn actor() -> Actor {
    Actor::new("u-100", "Pat Tech")
}

pub fn add_request(serial_number: &str, manufacturer: &str, model: &str) -> AddDeviceRequest {
    AddDeviceRequest {
        serial_number: serial_number.to_string(),
        manufacturer: manufacturer.to_string(),
        model: model.to_string(),
        facility_name: "North".to_string(),
        assigned_department: "ICU".to_string(),
        manufacture_date: None,
        notes: None,
        actor: actor(),
    }
}

pub fn create_request(control_number: &str, work_order_type: &str) -> CreateWorkOrderRequest {
    CreateWorkOrderRequest {
        control_number: control_number.to_string(),
        work_order_type: work_order_type.to_string(),
        problem_reported: "Alarm on startup".to_string(),
        problem_found: None,
        sort_order: None,
        actor: actor(),
    }
}

pub fn close_request(
    work_order_id: &str,
    summary: Option<&str>,
    completion_date_time: Option<&str>,
) -> CloseWorkOrderRequest {
    CloseWorkOrderRequest {
        work_order_id: work_order_id.to_string(),
        summary: summary.map(str::to_string),
        completion_date_time: completion_date_time.map(str::to_string),
        actor: Actor::new("u-200", "Sam Lead"),
    }
}

// ==========================================
// 日期辅助
// ==========================================

pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

pub fn today_midnight() -> NaiveDateTime {
    today().and_hms_opt(0, 0, 0).expect("合法时间")
}

pub fn today_midnight_str() -> String {
    today_midnight().format("%Y-%m-%dT%H:%M:%S").to_string()
}
