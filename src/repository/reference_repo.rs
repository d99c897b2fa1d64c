// ==========================================
// HTM Vault - 参考数据仓储
// ==========================================
// 职责: manufacturer_model / facility_department 两张只读参考表
// 写入: 仅供导入器使用（单事务 upsert）
// ==========================================

use crate::domain::reference::{FacilityDepartment, ManufacturerModel};
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::store::ReferenceDataStore;
use rusqlite::{params, Connection, OptionalExtension, Transaction};
use std::sync::{Arc, Mutex};

/// 导入写入计数
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ReferenceUpsertCounts {
    pub manufacturer_models: usize,
    pub facility_departments: usize,
}

// ==========================================
// ReferenceDataRepository - 参考数据仓储
// ==========================================
pub struct ReferenceDataRepository {
    conn: Arc<Mutex<Connection>>,
}

impl ReferenceDataRepository {
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

    /// 单事务写入两类参考数据（主键冲突时覆盖）
    ///
    /// 任一条失败则整体回滚
    pub fn upsert_all(
        &self,
        manufacturer_models: &[ManufacturerModel],
        facility_departments: &[FacilityDepartment],
    ) -> RepositoryResult<ReferenceUpsertCounts> {
        let conn = self.get_conn()?;
        let tx = conn.unchecked_transaction()?;

        let counts = ReferenceUpsertCounts {
            manufacturer_models: Self::upsert_manufacturer_models_tx(&tx, manufacturer_models)?,
            facility_departments: Self::upsert_facility_departments_tx(&tx, facility_departments)?,
        };

        tx.commit()?;
        Ok(counts)
    }

    fn upsert_manufacturer_models_tx(
        tx: &Transaction<'_>,
        rows: &[ManufacturerModel],
    ) -> RepositoryResult<usize> {
        let mut stmt = tx.prepare(
            r#"
            INSERT INTO manufacturer_model (manufacturer, model, required_maintenance_frequency_in_months)
            VALUES (?1, ?2, ?3)
            ON CONFLICT (manufacturer, model)
            DO UPDATE SET required_maintenance_frequency_in_months = excluded.required_maintenance_frequency_in_months
            "#,
        )?;
        let mut count = 0;
        for mm in rows {
            count += stmt.execute(params![
                mm.manufacturer,
                mm.model,
                mm.required_maintenance_frequency_in_months
            ])?;
        }
        Ok(count)
    }

    fn upsert_facility_departments_tx(
        tx: &Transaction<'_>,
        rows: &[FacilityDepartment],
    ) -> RepositoryResult<usize> {
        let mut stmt = tx.prepare(
            "INSERT OR IGNORE INTO facility_department (facility_name, assigned_department) VALUES (?1, ?2)",
        )?;
        let mut count = 0;
        for fd in rows {
            stmt.execute(params![fd.facility_name, fd.assigned_department])?;
            count += 1;
        }
        Ok(count)
    }
}

impl ReferenceDataStore for ReferenceDataRepository {
    fn resolve_manufacturer_model(
        &self,
        manufacturer: &str,
        model: &str,
    ) -> RepositoryResult<ManufacturerModel> {
        let conn = self.get_conn()?;
        conn.query_row(
            r#"
            SELECT manufacturer, model, required_maintenance_frequency_in_months
            FROM manufacturer_model
            WHERE manufacturer = ?1 AND model = ?2
            "#,
            params![manufacturer, model],
            |row| {
                Ok(ManufacturerModel {
                    manufacturer: row.get(0)?,
                    model: row.get(1)?,
                    required_maintenance_frequency_in_months: row.get(2)?,
                })
            },
        )
        .optional()?
        .ok_or_else(|| {
            RepositoryError::not_found("ManufacturerModel", format!("{}/{}", manufacturer, model))
        })
    }

    fn resolve_facility_department(
        &self,
        facility_name: &str,
        assigned_department: &str,
    ) -> RepositoryResult<FacilityDepartment> {
        let conn = self.get_conn()?;
        conn.query_row(
            r#"
            SELECT facility_name, assigned_department
            FROM facility_department
            WHERE facility_name = ?1 AND assigned_department = ?2
            "#,
            params![facility_name, assigned_department],
            |row| {
                Ok(FacilityDepartment {
                    facility_name: row.get(0)?,
                    assigned_department: row.get(1)?,
                })
            },
        )
        .optional()?
        .ok_or_else(|| {
            RepositoryError::not_found(
                "FacilityDepartment",
                format!("{}/{}", facility_name, assigned_department),
            )
        })
    }

    fn list_manufacturer_models(&self) -> RepositoryResult<Vec<ManufacturerModel>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT manufacturer, model, required_maintenance_frequency_in_months
            FROM manufacturer_model
            ORDER BY manufacturer ASC, model ASC
            "#,
        )?;
        let rows = stmt
            .query_map([], |row| {
                Ok(ManufacturerModel {
                    manufacturer: row.get(0)?,
                    model: row.get(1)?,
                    required_maintenance_frequency_in_months: row.get(2)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    fn list_facility_departments(&self) -> RepositoryResult<Vec<FacilityDepartment>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT facility_name, assigned_department
            FROM facility_department
            ORDER BY facility_name ASC, assigned_department ASC
            "#,
        )?;
        let rows = stmt
            .query_map([], |row| {
                Ok(FacilityDepartment {
                    facility_name: row.get(0)?,
                    assigned_department: row.get(1)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }
}
