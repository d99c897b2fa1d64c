// ==========================================
// HTM Vault - 设备数据仓储
// ==========================================
// 红线: Repository 不含业务逻辑
// 并发: 同一设备的并发写入不做协调，后写覆盖先写
// ==========================================

use crate::domain::device::{Actor, Device};
use crate::domain::reference::ManufacturerModel;
use crate::engine::search::SearchPredicate;
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::row_util::get_enum;
use crate::repository::store::DeviceStore;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};
use std::sync::{Arc, Mutex};

const DEVICE_COLUMNS: &str = r#"
    control_number, serial_number, manufacturer, model,
    required_maintenance_frequency_in_months, manufacture_date,
    service_status, facility_name, assigned_department,
    compliance_through_date, last_pm_completion_date, next_pm_due_date,
    inventory_add_date, added_by_id, added_by_name, notes
"#;

// ==========================================
// DeviceRepository - 设备仓储
// ==========================================
/// 职责: 管理 device 表的读写
pub struct DeviceRepository {
    conn: Arc<Mutex<Connection>>,
}

impl DeviceRepository {
    /// 创建新的 DeviceRepository 实例
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = crate::db::open_sqlite_connection(db_path)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建仓储实例
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 获取数据库连接
    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 设备总数
    pub fn count(&self) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        let n = conn.query_row("SELECT COUNT(*) FROM device", [], |row| row.get(0))?;
        Ok(n)
    }

    fn map_row(row: &Row<'_>) -> rusqlite::Result<Device> {
        Ok(Device {
            control_number: row.get(0)?,
            serial_number: row.get(1)?,
            manufacturer_model: ManufacturerModel {
                manufacturer: row.get(2)?,
                model: row.get(3)?,
                required_maintenance_frequency_in_months: row.get(4)?,
            },
            manufacture_date: row.get(5)?,
            service_status: get_enum(row, 6)?,
            facility_name: row.get(7)?,
            assigned_department: row.get(8)?,
            compliance_through_date: row.get(9)?,
            last_pm_completion_date: row.get(10)?,
            next_pm_due_date: row.get(11)?,
            inventory_add_date: row.get(12)?,
            added_by: Actor {
                id: row.get(13)?,
                name: row.get(14)?,
            },
            notes: row.get(15)?,
        })
    }
}

impl DeviceStore for DeviceRepository {
    fn load(&self, control_number: &str) -> RepositoryResult<Device> {
        let conn = self.get_conn()?;
        let sql = format!("SELECT {} FROM device WHERE control_number = ?1", DEVICE_COLUMNS);
        conn.query_row(&sql, params![control_number], Self::map_row)
            .optional()?
            .ok_or_else(|| RepositoryError::not_found("Device", control_number))
    }

    fn save(&self, device: &Device) -> RepositoryResult<Device> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT OR REPLACE INTO device (
                control_number, serial_number, manufacturer, model,
                required_maintenance_frequency_in_months, manufacture_date,
                service_status, facility_name, assigned_department,
                compliance_through_date, last_pm_completion_date, next_pm_due_date,
                inventory_add_date, added_by_id, added_by_name, notes
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)
            "#,
            params![
                device.control_number,
                device.serial_number,
                device.manufacturer_model.manufacturer,
                device.manufacturer_model.model,
                device.manufacturer_model.required_maintenance_frequency_in_months,
                device.manufacture_date,
                device.service_status.to_db_str(),
                device.facility_name,
                device.assigned_department,
                device.compliance_through_date,
                device.last_pm_completion_date,
                device.next_pm_due_date,
                device.inventory_add_date,
                device.added_by.id,
                device.added_by.name,
                device.notes,
            ],
        )?;
        Ok(device.clone())
    }

    fn find_by_manufacturer_model_and_serial(
        &self,
        manufacturer_model: &ManufacturerModel,
        serial_number: &str,
    ) -> RepositoryResult<Option<Device>> {
        let conn = self.get_conn()?;
        let sql = format!(
            "SELECT {} FROM device WHERE manufacturer = ?1 AND model = ?2 AND serial_number = ?3 LIMIT 1",
            DEVICE_COLUMNS
        );
        let device = conn
            .query_row(
                &sql,
                params![
                    manufacturer_model.manufacturer,
                    manufacturer_model.model,
                    serial_number
                ],
                Self::map_row,
            )
            .optional()?;
        Ok(device)
    }

    fn scan(&self, predicate: &SearchPredicate) -> RepositoryResult<Vec<Device>> {
        let (where_clause, values) = predicate.to_sql_where();
        let conn = self.get_conn()?;
        let sql = format!(
            "SELECT {} FROM device WHERE {} ORDER BY control_number ASC",
            DEVICE_COLUMNS, where_clause
        );
        let mut stmt = conn.prepare(&sql)?;
        let devices = stmt
            .query_map(params_from_iter(values.iter()), Self::map_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(devices)
    }

    fn exists(&self, control_number: &str) -> RepositoryResult<bool> {
        let conn = self.get_conn()?;
        let found = conn
            .query_row(
                "SELECT 1 FROM device WHERE control_number = ?1",
                params![control_number],
                |_row| Ok(true),
            )
            .optional()?
            .unwrap_or(false);
        Ok(found)
    }
}
