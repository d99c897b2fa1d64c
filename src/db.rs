// ==========================================
// HTM Vault - SQLite 连接与建库
// ==========================================
// 目标:
// - 统一所有 Connection::open 的 PRAGMA 行为（外键、busy_timeout）
// - 提供幂等建库，测试与二进制共用同一份 DDL
// ==========================================

use rusqlite::Connection;
use rusqlite::OptionalExtension;
use std::time::Duration;

/// 默认 busy_timeout（毫秒）
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// 当前代码所期望的 schema_version
pub const CURRENT_SCHEMA_VERSION: i64 = 1;

/// 建库 DDL（全部 IF NOT EXISTS，可重复执行）
pub const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS schema_version (
    version     INTEGER PRIMARY KEY,
    applied_at  TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE TABLE IF NOT EXISTS config_kv (
    scope_id    TEXT NOT NULL DEFAULT 'global',
    key         TEXT NOT NULL,
    value       TEXT NOT NULL,
    updated_at  TEXT NOT NULL DEFAULT (datetime('now')),
    PRIMARY KEY (scope_id, key)
);

CREATE TABLE IF NOT EXISTS manufacturer_model (
    manufacturer                              TEXT NOT NULL,
    model                                     TEXT NOT NULL,
    required_maintenance_frequency_in_months  INTEGER,
    PRIMARY KEY (manufacturer, model)
);

CREATE TABLE IF NOT EXISTS facility_department (
    facility_name        TEXT NOT NULL,
    assigned_department  TEXT NOT NULL,
    PRIMARY KEY (facility_name, assigned_department)
);

CREATE TABLE IF NOT EXISTS device (
    control_number                            TEXT PRIMARY KEY,
    serial_number                             TEXT NOT NULL,
    manufacturer                              TEXT NOT NULL,
    model                                     TEXT NOT NULL,
    required_maintenance_frequency_in_months  INTEGER,
    manufacture_date                          TEXT,
    service_status                            TEXT NOT NULL,
    facility_name                             TEXT NOT NULL,
    assigned_department                       TEXT NOT NULL,
    compliance_through_date                   TEXT,
    last_pm_completion_date                   TEXT,
    next_pm_due_date                          TEXT,
    inventory_add_date                        TEXT NOT NULL,
    added_by_id                               TEXT NOT NULL,
    added_by_name                             TEXT NOT NULL,
    notes                                     TEXT NOT NULL DEFAULT ''
);

CREATE INDEX IF NOT EXISTS idx_device_mm_serial
    ON device (manufacturer, model, serial_number);

CREATE TABLE IF NOT EXISTS work_order (
    work_order_id                             TEXT PRIMARY KEY,
    work_order_type                           TEXT NOT NULL,
    control_number                            TEXT NOT NULL,
    serial_number                             TEXT NOT NULL,
    manufacturer                              TEXT NOT NULL,
    model                                     TEXT NOT NULL,
    required_maintenance_frequency_in_months  INTEGER,
    facility_name                             TEXT NOT NULL,
    assigned_department                       TEXT NOT NULL,
    completion_status                         TEXT NOT NULL,
    await_status                              TEXT,
    problem_reported                          TEXT NOT NULL,
    problem_found                             TEXT,
    summary                                   TEXT,
    completion_date_time                      TEXT,
    created_by_id                             TEXT NOT NULL,
    created_by_name                           TEXT NOT NULL,
    created_at                                TEXT NOT NULL,
    closed_by_id                              TEXT,
    closed_by_name                            TEXT,
    closed_at                                 TEXT
);

CREATE INDEX IF NOT EXISTS idx_work_order_control_number
    ON work_order (control_number);
"#;

/// 配置 SQLite 连接的统一 PRAGMA
///
/// foreign_keys 与 busy_timeout 都需要"每个连接"单独设置
pub fn configure_sqlite_connection(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS))?;
    Ok(())
}

/// 打开 SQLite 连接并应用统一配置
pub fn open_sqlite_connection(db_path: &str) -> rusqlite::Result<Connection> {
    let conn = Connection::open(db_path)?;
    configure_sqlite_connection(&conn)?;
    Ok(conn)
}

/// 建表并登记 schema_version（幂等）
pub fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(SCHEMA_SQL)?;
    conn.execute(
        "INSERT OR IGNORE INTO schema_version (version) VALUES (?1)",
        [CURRENT_SCHEMA_VERSION],
    )?;
    Ok(())
}

/// 读取 schema_version（若表不存在则返回 None）
pub fn read_schema_version(conn: &Connection) -> rusqlite::Result<Option<i64>> {
    let has_table: bool = conn
        .query_row(
            "SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version' LIMIT 1",
            [],
            |_row| Ok(true),
        )
        .optional()?
        .unwrap_or(false);

    if !has_table {
        return Ok(None);
    }

    let v: Option<i64> = conn.query_row("SELECT MAX(version) FROM schema_version", [], |row| row.get(0))?;
    Ok(v)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_version_absent_before_init() {
        let conn = Connection::open_in_memory().unwrap();
        assert_eq!(read_schema_version(&conn).unwrap(), None);
    }

    #[test]
    fn test_init_schema_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        init_schema(&conn).unwrap();
        init_schema(&conn).unwrap();
        assert_eq!(read_schema_version(&conn).unwrap(), Some(CURRENT_SCHEMA_VERSION));

        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM schema_version", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 1);
    }
}
