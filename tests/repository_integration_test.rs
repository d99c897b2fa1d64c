// ==========================================
// Repository 层集成测试
// ==========================================
// 测试目标: 设备/工单/配置在 SQLite 中的完整往返
// ==========================================

mod helpers;

use std::sync::{Arc, Mutex};

use chrono::NaiveDate;
use helpers::api_test_helper::create_test_db;
use htm_vault::config::{config_keys, ConfigManager, IdentityConfigReader};
use htm_vault::db::{init_schema, open_sqlite_connection, read_schema_version, CURRENT_SCHEMA_VERSION};
use htm_vault::domain::{
    Actor, Device, ManufacturerModel, ServiceStatus, SortOrder, WorkOrder,
    WorkOrderAwaitStatus, WorkOrderCompletionStatus, WorkOrderType,
};
use htm_vault::repository::{
    DeviceRepository, DeviceStore, WorkOrderRepository, WorkOrderStore,
};
use rusqlite::Connection;

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

fn shared_conn(db_path: &str) -> Arc<Mutex<Connection>> {
    Arc::new(Mutex::new(open_sqlite_connection(db_path).expect("无法打开数据库")))
}

fn sample_device(control_number: &str) -> Device {
    Device {
        control_number: control_number.to_string(),
        serial_number: "SN-42".to_string(),
        manufacturer_model: ManufacturerModel::new("Acme", "Pump 5", Some(12)),
        manufacture_date: Some(d(2019, 2, 28)),
        service_status: ServiceStatus::InService,
        facility_name: "North".to_string(),
        assigned_department: "ICU".to_string(),
        compliance_through_date: Some(d(2025, 3, 31)),
        last_pm_completion_date: Some(d(2024, 3, 2)),
        next_pm_due_date: Some(d(2025, 3, 31)),
        inventory_add_date: d(2023, 1, 10),
        added_by: Actor::new("u-1", "Ada"),
        notes: "Loaner".to_string(),
    }
}

#[test]
fn test_schema_初始化幂等() {
    let (_temp, db_path) = create_test_db().expect("创建测试数据库失败");
    let conn = open_sqlite_connection(&db_path).unwrap();

    init_schema(&conn).expect("重复初始化应成功");
    assert_eq!(read_schema_version(&conn).unwrap(), Some(CURRENT_SCHEMA_VERSION));
}

#[test]
fn test_device_往返与覆盖写() {
    let (_temp, db_path) = create_test_db().expect("创建测试数据库失败");
    let repo = DeviceRepository::from_connection(shared_conn(&db_path));

    let device = sample_device("A1B2C3");
    repo.save(&device).unwrap();
    assert_eq!(repo.load("A1B2C3").unwrap(), device);
    assert!(repo.exists("A1B2C3").unwrap());
    assert!(!repo.exists("ZZZZZZ").unwrap());

    let mut changed = device.clone();
    changed.service_status = ServiceStatus::Retired;
    changed.manufacture_date = None;
    changed.compliance_through_date = None;
    repo.save(&changed).unwrap();

    assert_eq!(repo.load("A1B2C3").unwrap(), changed);
    assert_eq!(repo.count().unwrap(), 1);

    let found = repo
        .find_by_manufacturer_model_and_serial(&device.manufacturer_model, "SN-42")
        .unwrap();
    assert_eq!(found.map(|d| d.control_number).as_deref(), Some("A1B2C3"));
    assert!(repo
        .find_by_manufacturer_model_and_serial(&ManufacturerModel::new("Acme", "Pump 6", None), "SN-42")
        .unwrap()
        .is_none());

    let err = repo.load("MISSING").unwrap_err();
    assert!(err.is_not_found());
}

#[test]
fn test_work_order_往返() {
    let (_temp, db_path) = create_test_db().expect("创建测试数据库失败");
    let conn = shared_conn(&db_path);
    let device_repo = DeviceRepository::from_connection(conn.clone());
    let repo = WorkOrderRepository::from_connection(conn);

    let device = sample_device("C0FFEE");
    device_repo.save(&device).unwrap();

    let created_at = d(2024, 4, 1).and_hms_opt(9, 30, 0).unwrap();
    let mut open = WorkOrder::open_for_device(
        "WR0001".to_string(),
        WorkOrderType::Repair,
        &device,
        "No power".to_string(),
        None,
        Actor::new("u-2", "Bo"),
        created_at,
    );
    open.await_status = Some(WorkOrderAwaitStatus::AwaitingParts);
    repo.save(&open).unwrap();
    assert_eq!(repo.load("WR0001").unwrap(), open);

    let mut closed = WorkOrder::open_for_device(
        "WR0002".to_string(),
        WorkOrderType::PreventativeMaintenance,
        &device,
        "Scheduled PM".to_string(),
        Some("Worn seal".to_string()),
        Actor::new("u-2", "Bo"),
        created_at,
    );
    closed.summary = Some("Replaced seal".to_string());
    closed.completion_date_time = Some(d(2024, 4, 2).and_hms_opt(15, 0, 0).unwrap());
    closed.completion_status = WorkOrderCompletionStatus::Closed;
    closed.closed_by = Some(Actor::new("u-3", "Cy"));
    closed.closed_at = Some(d(2024, 4, 2).and_hms_opt(15, 5, 0).unwrap());
    repo.save(&closed).unwrap();
    assert_eq!(repo.load("WR0002").unwrap(), closed);

    let mut for_device: Vec<String> = repo
        .find_by_control_number("C0FFEE")
        .unwrap()
        .into_iter()
        .map(|wo| wo.work_order_id)
        .collect();
    for_device.sort();
    assert_eq!(for_device, vec!["WR0001", "WR0002"]);
    assert!(repo.find_by_control_number("OTHER").unwrap().is_empty());

    assert_eq!(repo.count().unwrap(), 2);
    assert_eq!(repo.count_open().unwrap(), 1);
    assert!(repo.exists("WR0002").unwrap());
    assert!(repo.load("WR9999").unwrap_err().is_not_found());
}

#[test]
fn test_config_快照与恢复() {
    let (_temp, db_path) = create_test_db().expect("创建测试数据库失败");
    let config = ConfigManager::from_connection(shared_conn(&db_path)).unwrap();

    assert_eq!(config.get_control_number_prefix().unwrap(), "");
    assert_eq!(config.get_control_number_length().unwrap(), 6);
    assert_eq!(config.get_work_order_id_prefix().unwrap(), "WR");
    assert_eq!(config.get_work_order_id_length().unwrap(), 8);
    assert_eq!(config.get_default_sort_order().unwrap(), SortOrder::Descending);

    config.set_global_config_value(config_keys::CONTROL_NUMBER_PREFIX, "HT").unwrap();
    let snapshot = config.get_config_snapshot().unwrap();

    config.set_global_config_value(config_keys::CONTROL_NUMBER_PREFIX, "XX").unwrap();
    config.set_global_config_value(config_keys::CONTROL_NUMBER_LENGTH, "99").unwrap();
    // 超出范围的长度回退默认值
    assert_eq!(config.get_control_number_length().unwrap(), 6);

    let restored = config.restore_config_from_snapshot(&snapshot).unwrap();
    assert!(restored >= config_keys::DEFAULTS.len());
    assert_eq!(config.get_control_number_prefix().unwrap(), "HT");
    assert_eq!(
        config.get_global_config_value(config_keys::CONTROL_NUMBER_LENGTH).unwrap().as_deref(),
        Some("6")
    );
}
