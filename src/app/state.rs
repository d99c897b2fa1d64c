// ==========================================
// HTM Vault - 应用状态
// ==========================================
// 职责: 管理应用级别的共享状态和API实例
// 约定: 全部仓储共享同一个 Arc<Mutex<Connection>>
// ==========================================

use std::sync::{Arc, Mutex};

use rusqlite::Connection;
use serde::Serialize;

use crate::api::{DeviceApi, ReferenceDataApi, WorkOrderApi};
use crate::config::config_manager::ConfigManager;
use crate::db::{init_schema, open_sqlite_connection, read_schema_version};
use crate::importer::ReferenceDataImporter;
use crate::repository::{DeviceRepository, ReferenceDataRepository, WorkOrderRepository};

/// 存储概况（启动日志与状态输出用）
#[derive(Debug, Clone, Serialize)]
pub struct StoreStatus {
    pub db_path: String,
    pub schema_version: Option<i64>,
    pub device_count: i64,
    pub work_order_count: i64,
    pub open_work_order_count: i64,
}

/// 应用状态
///
/// 包含所有API实例和共享资源
pub struct AppState {
    /// 数据库路径
    pub db_path: String,

    /// 设备生命周期 API
    pub device_api: Arc<DeviceApi>,

    /// 工单生命周期 API
    pub work_order_api: Arc<WorkOrderApi>,

    /// 参考数据查询 API
    pub reference_api: Arc<ReferenceDataApi>,

    /// 参考数据导入器
    pub reference_importer: Arc<ReferenceDataImporter>,

    /// 配置管理器
    pub config_manager: Arc<ConfigManager>,

    conn: Arc<Mutex<Connection>>,
    device_repo: Arc<DeviceRepository>,
    work_order_repo: Arc<WorkOrderRepository>,
}

impl AppState {
    /// 打开（必要时创建）数据库并装配全部组件
    pub fn new(db_path: String) -> Result<Self, String> {
        tracing::info!("初始化AppState，数据库路径: {}", db_path);

        let conn = open_sqlite_connection(&db_path)
            .map_err(|e| format!("无法打开数据库: {}", e))?;
        Self::from_connection(db_path, Arc::new(Mutex::new(conn)))
    }

    /// 基于已有连接装配（测试可传入内存库）
    pub fn from_connection(db_path: String, conn: Arc<Mutex<Connection>>) -> Result<Self, String> {
        {
            let c = conn
                .lock()
                .map_err(|e| format!("锁获取失败: {}", e))?;
            init_schema(&c).map_err(|e| format!("初始化数据库结构失败: {}", e))?;
        }

        // ==========================================
        // 初始化Repository层
        // ==========================================
        let device_repo = Arc::new(DeviceRepository::from_connection(conn.clone()));
        let work_order_repo = Arc::new(WorkOrderRepository::from_connection(conn.clone()));
        let reference_repo = Arc::new(ReferenceDataRepository::from_connection(conn.clone()));
        let config_manager = Arc::new(
            ConfigManager::from_connection(conn.clone())
                .map_err(|e| format!("无法初始化配置管理器: {}", e))?,
        );

        // ==========================================
        // 初始化API层
        // ==========================================
        let device_api = Arc::new(DeviceApi::new(
            device_repo.clone(),
            work_order_repo.clone(),
            reference_repo.clone(),
            config_manager.clone(),
        ));
        let work_order_api = Arc::new(WorkOrderApi::new(
            work_order_repo.clone(),
            device_repo.clone(),
            config_manager.clone(),
        ));
        let reference_api = Arc::new(ReferenceDataApi::new(reference_repo.clone()));
        let reference_importer = Arc::new(ReferenceDataImporter::new(reference_repo));

        tracing::info!("AppState初始化完成");

        Ok(Self {
            db_path,
            device_api,
            work_order_api,
            reference_api,
            reference_importer,
            config_manager,
            conn,
            device_repo,
            work_order_repo,
        })
    }

    pub fn get_db_path(&self) -> &str {
        &self.db_path
    }

    /// 汇总存储概况
    pub fn store_status(&self) -> Result<StoreStatus, String> {
        let schema_version = {
            let conn = self
                .conn
                .lock()
                .map_err(|e| format!("锁获取失败: {}", e))?;
            read_schema_version(&conn).map_err(|e| e.to_string())?
        };

        Ok(StoreStatus {
            db_path: self.db_path.clone(),
            schema_version,
            device_count: self.device_repo.count().map_err(|e| e.to_string())?,
            work_order_count: self.work_order_repo.count().map_err(|e| e.to_string())?,
            open_work_order_count: self.work_order_repo.count_open().map_err(|e| e.to_string())?,
        })
    }
}

/// 默认数据库路径
///
/// 优先使用环境变量 HTM_VAULT_DB_PATH，否则落在用户数据目录下
pub fn get_default_db_path() -> String {
    use std::path::PathBuf;

    if let Ok(path) = std::env::var("HTM_VAULT_DB_PATH") {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }

    let mut path = PathBuf::from("./htm_vault.db");
    if let Some(data_dir) = dirs::data_dir() {
        let dir = data_dir.join("htm-vault");
        // 目录创建失败时回退到当前目录
        if std::fs::create_dir_all(&dir).is_ok() {
            path = dir.join("htm_vault.db");
        }
    }

    path.to_string_lossy().to_string()
}
