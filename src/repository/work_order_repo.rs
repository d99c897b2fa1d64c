// ==========================================
// HTM Vault - 工单数据仓储
// ==========================================
// 红线: Repository 不含业务逻辑
// 索引: work_order.control_number（按设备查询工单）
// ==========================================

use crate::domain::device::Actor;
use crate::domain::reference::ManufacturerModel;
use crate::domain::work_order::WorkOrder;
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::row_util::{get_enum, get_optional_enum};
use crate::repository::store::WorkOrderStore;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::sync::{Arc, Mutex};

const WORK_ORDER_COLUMNS: &str = r#"
    work_order_id, work_order_type, control_number, serial_number,
    manufacturer, model, required_maintenance_frequency_in_months,
    facility_name, assigned_department,
    completion_status, await_status,
    problem_reported, problem_found, summary, completion_date_time,
    created_by_id, created_by_name, created_at,
    closed_by_id, closed_by_name, closed_at
"#;

// ==========================================
// WorkOrderRepository - 工单仓储
// ==========================================
pub struct WorkOrderRepository {
    conn: Arc<Mutex<Connection>>,
}

impl WorkOrderRepository {
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = crate::db::open_sqlite_connection(db_path)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 工单总数
    pub fn count(&self) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        let n = conn.query_row("SELECT COUNT(*) FROM work_order", [], |row| row.get(0))?;
        Ok(n)
    }

    /// 未关闭工单数
    pub fn count_open(&self) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        let n = conn.query_row(
            "SELECT COUNT(*) FROM work_order WHERE completion_status = 'OPEN'",
            [],
            |row| row.get(0),
        )?;
        Ok(n)
    }

    fn map_row(row: &Row<'_>) -> rusqlite::Result<WorkOrder> {
        let closed_by_id: Option<String> = row.get(18)?;
        let closed_by_name: Option<String> = row.get(19)?;
        let closed_by = match (closed_by_id, closed_by_name) {
            (Some(id), Some(name)) => Some(Actor { id, name }),
            (Some(id), None) => Some(Actor {
                id,
                name: String::new(),
            }),
            _ => None,
        };

        Ok(WorkOrder {
            work_order_id: row.get(0)?,
            work_order_type: get_enum(row, 1)?,
            control_number: row.get(2)?,
            serial_number: row.get(3)?,
            manufacturer_model: ManufacturerModel {
                manufacturer: row.get(4)?,
                model: row.get(5)?,
                required_maintenance_frequency_in_months: row.get(6)?,
            },
            facility_name: row.get(7)?,
            assigned_department: row.get(8)?,
            completion_status: get_enum(row, 9)?,
            await_status: get_optional_enum(row, 10)?,
            problem_reported: row.get(11)?,
            problem_found: row.get(12)?,
            summary: row.get(13)?,
            completion_date_time: row.get(14)?,
            created_by: Actor {
                id: row.get(15)?,
                name: row.get(16)?,
            },
            created_at: row.get(17)?,
            closed_by,
            closed_at: row.get(20)?,
        })
    }
}

impl WorkOrderStore for WorkOrderRepository {
    fn load(&self, work_order_id: &str) -> RepositoryResult<WorkOrder> {
        let conn = self.get_conn()?;
        let sql = format!(
            "SELECT {} FROM work_order WHERE work_order_id = ?1",
            WORK_ORDER_COLUMNS
        );
        conn.query_row(&sql, params![work_order_id], Self::map_row)
            .optional()?
            .ok_or_else(|| RepositoryError::not_found("WorkOrder", work_order_id))
    }

    fn save(&self, work_order: &WorkOrder) -> RepositoryResult<WorkOrder> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT OR REPLACE INTO work_order (
                work_order_id, work_order_type, control_number, serial_number,
                manufacturer, model, required_maintenance_frequency_in_months,
                facility_name, assigned_department,
                completion_status, await_status,
                problem_reported, problem_found, summary, completion_date_time,
                created_by_id, created_by_name, created_at,
                closed_by_id, closed_by_name, closed_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15,
                      ?16, ?17, ?18, ?19, ?20, ?21)
            "#,
            params![
                work_order.work_order_id,
                work_order.work_order_type.to_db_str(),
                work_order.control_number,
                work_order.serial_number,
                work_order.manufacturer_model.manufacturer,
                work_order.manufacturer_model.model,
                work_order.manufacturer_model.required_maintenance_frequency_in_months,
                work_order.facility_name,
                work_order.assigned_department,
                work_order.completion_status.to_db_str(),
                work_order.await_status.map(|s| s.to_db_str()),
                work_order.problem_reported,
                work_order.problem_found,
                work_order.summary,
                work_order.completion_date_time,
                work_order.created_by.id,
                work_order.created_by.name,
                work_order.created_at,
                work_order.closed_by.as_ref().map(|a| a.id.as_str()),
                work_order.closed_by.as_ref().map(|a| a.name.as_str()),
                work_order.closed_at,
            ],
        )?;
        Ok(work_order.clone())
    }

    fn find_by_control_number(&self, control_number: &str) -> RepositoryResult<Vec<WorkOrder>> {
        let conn = self.get_conn()?;
        let sql = format!(
            "SELECT {} FROM work_order WHERE control_number = ?1",
            WORK_ORDER_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let work_orders = stmt
            .query_map(params![control_number], Self::map_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(work_orders)
    }

    fn exists(&self, work_order_id: &str) -> RepositoryResult<bool> {
        let conn = self.get_conn()?;
        let found = conn
            .query_row(
                "SELECT 1 FROM work_order WHERE work_order_id = ?1",
                params![work_order_id],
                |_row| Ok(true),
            )
            .optional()?
            .unwrap_or(false);
        Ok(found)
    }
}
