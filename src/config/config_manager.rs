// ==========================================
// HTM Vault - 配置管理器
// ==========================================
// 职责: 配置加载、查询、覆写管理
// 存储: config_kv 表 (key-value + scope)
// ==========================================

use crate::config::identity_config_trait::{ConfigResult, IdentityConfigReader};
use crate::db::open_sqlite_connection;
use crate::domain::types::SortOrder;
use rusqlite::{params, Connection, OptionalExtension};
use serde_json::json;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

/// 编号随机部分长度的合法范围
const MIN_ID_LENGTH: usize = 4;
const MAX_ID_LENGTH: usize = 32;

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// 创建新的 ConfigManager 实例
    pub fn new(db_path: &str) -> ConfigResult<Self> {
        let conn = open_sqlite_connection(db_path)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建 ConfigManager
    ///
    /// 会对传入连接再次应用统一 PRAGMA（幂等）
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> ConfigResult<Self> {
        {
            let conn_guard = conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
            crate::db::configure_sqlite_connection(&conn_guard)?;
        }

        Ok(Self { conn })
    }

    /// 从 config_kv 表读取配置值（scope_id='global'）
    fn get_config_value(&self, key: &str) -> ConfigResult<Option<String>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        let value = conn
            .query_row(
                "SELECT value FROM config_kv WHERE scope_id = 'global' AND key = ?1",
                params![key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }

    /// 读取 global scope 的配置值
    pub fn get_global_config_value(&self, key: &str) -> ConfigResult<Option<String>> {
        self.get_config_value(key)
    }

    /// 写入 global scope 的配置值（存在即覆盖）
    pub fn set_global_config_value(&self, key: &str, value: &str) -> ConfigResult<()> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
        conn.execute(
            "INSERT INTO config_kv (scope_id, key, value) VALUES ('global', ?1, ?2)
             ON CONFLICT(scope_id, key) DO UPDATE SET value = ?2, updated_at = datetime('now')",
            params![key, value],
        )?;
        tracing::info!(key, value, "配置已更新");
        Ok(())
    }

    fn get_config_or_default(&self, key: &str, default: &str) -> ConfigResult<String> {
        Ok(self.get_config_value(key)?.unwrap_or_else(|| default.to_string()))
    }

    /// 读取长度类配置，越界或非法时回退默认值
    fn get_length_or_default(&self, key: &str, default: usize) -> ConfigResult<usize> {
        let raw = self.get_config_or_default(key, &default.to_string())?;
        match raw.trim().parse::<usize>() {
            Ok(n) if (MIN_ID_LENGTH..=MAX_ID_LENGTH).contains(&n) => Ok(n),
            _ => {
                tracing::warn!(config_key = key, raw_value = %raw, default, "长度配置非法，使用默认值");
                Ok(default)
            }
        }
    }

    /// 获取所有配置的快照（JSON格式）
    ///
    /// 包含全部已知键的生效值（未写入的键按默认值输出），以及库中其他 global 键
    pub fn get_config_snapshot(&self) -> ConfigResult<String> {
        let mut config_map: BTreeMap<String, String> = BTreeMap::new();
        {
            let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
            let mut stmt =
                conn.prepare("SELECT key, value FROM config_kv WHERE scope_id = 'global' ORDER BY key")?;
            let rows = stmt.query_map([], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
            })?;
            for row in rows {
                let (key, value) = row?;
                config_map.insert(key, value);
            }
        }

        for (key, default) in config_keys::DEFAULTS {
            config_map
                .entry(key.to_string())
                .or_insert_with(|| default.to_string());
        }

        let json_value = json!(config_map);
        Ok(serde_json::to_string(&json_value)?)
    }

    /// 从配置快照恢复配置
    ///
    /// # 返回
    /// - Ok(usize): 恢复的配置项数量
    ///
    /// # 注意
    /// - 覆盖现有的 global 配置，单事务执行
    pub fn restore_config_from_snapshot(&self, snapshot_json: &str) -> ConfigResult<usize> {
        let config_map: BTreeMap<String, String> = serde_json::from_str(snapshot_json)?;

        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
        let tx = conn.unchecked_transaction()?;

        let mut count = 0;
        for (key, value) in config_map.iter() {
            count += tx.execute(
                "INSERT INTO config_kv (scope_id, key, value) VALUES ('global', ?1, ?2)
                 ON CONFLICT(scope_id, key) DO UPDATE SET value = ?2",
                params![key, value],
            )?;
        }

        tx.commit()?;
        Ok(count)
    }
}

// ==========================================
// IdentityConfigReader Trait 实现
// ==========================================
impl IdentityConfigReader for ConfigManager {
    fn get_control_number_prefix(&self) -> ConfigResult<String> {
        self.get_config_or_default(config_keys::CONTROL_NUMBER_PREFIX, "")
    }

    fn get_control_number_length(&self) -> ConfigResult<usize> {
        self.get_length_or_default(config_keys::CONTROL_NUMBER_LENGTH, 6)
    }

    fn get_work_order_id_prefix(&self) -> ConfigResult<String> {
        self.get_config_or_default(config_keys::WORK_ORDER_ID_PREFIX, "WR")
    }

    fn get_work_order_id_length(&self) -> ConfigResult<usize> {
        self.get_length_or_default(config_keys::WORK_ORDER_ID_LENGTH, 8)
    }

    fn get_default_sort_order(&self) -> ConfigResult<SortOrder> {
        let value = self.get_config_or_default(config_keys::DEFAULT_SORT_ORDER, "DESCENDING")?;
        match value.trim().to_uppercase().parse::<SortOrder>() {
            Ok(order) => Ok(order),
            Err(e) => {
                tracing::warn!(error = %e, "排序配置非法，使用 DESCENDING");
                Ok(SortOrder::Descending)
            }
        }
    }
}

// ==========================================
// 配置键常量
// ==========================================
pub mod config_keys {
    // 设备编号
    pub const CONTROL_NUMBER_PREFIX: &str = "control_number_prefix";
    pub const CONTROL_NUMBER_LENGTH: &str = "control_number_length";

    // 工单号
    pub const WORK_ORDER_ID_PREFIX: &str = "work_order_id_prefix";
    pub const WORK_ORDER_ID_LENGTH: &str = "work_order_id_length";

    // 工单列表
    pub const DEFAULT_SORT_ORDER: &str = "default_sort_order";

    /// 全部已知键及默认值
    pub const DEFAULTS: [(&str, &str); 5] = [
        (CONTROL_NUMBER_PREFIX, ""),
        (CONTROL_NUMBER_LENGTH, "6"),
        (WORK_ORDER_ID_PREFIX, "WR"),
        (WORK_ORDER_ID_LENGTH, "8"),
        (DEFAULT_SORT_ORDER, "DESCENDING"),
    ];
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manager() -> ConfigManager {
        let conn = Connection::open_in_memory().unwrap();
        crate::db::init_schema(&conn).unwrap();
        ConfigManager::from_connection(Arc::new(Mutex::new(conn))).unwrap()
    }

    #[test]
    fn test_defaults_when_table_is_empty() {
        let cm = manager();
        assert_eq!(cm.get_control_number_prefix().unwrap(), "");
        assert_eq!(cm.get_control_number_length().unwrap(), 6);
        assert_eq!(cm.get_work_order_id_prefix().unwrap(), "WR");
        assert_eq!(cm.get_work_order_id_length().unwrap(), 8);
        assert_eq!(cm.get_default_sort_order().unwrap(), SortOrder::Descending);
    }

    #[test]
    fn test_overrides_are_read_back() {
        let cm = manager();
        cm.set_global_config_value(config_keys::WORK_ORDER_ID_PREFIX, "WO").unwrap();
        cm.set_global_config_value(config_keys::DEFAULT_SORT_ORDER, "ascending").unwrap();
        assert_eq!(cm.get_work_order_id_prefix().unwrap(), "WO");
        assert_eq!(cm.get_default_sort_order().unwrap(), SortOrder::Ascending);
    }

    #[test]
    fn test_out_of_range_length_falls_back() {
        let cm = manager();
        cm.set_global_config_value(config_keys::CONTROL_NUMBER_LENGTH, "1").unwrap();
        assert_eq!(cm.get_control_number_length().unwrap(), 6);
        cm.set_global_config_value(config_keys::CONTROL_NUMBER_LENGTH, "abc").unwrap();
        assert_eq!(cm.get_control_number_length().unwrap(), 6);
        cm.set_global_config_value(config_keys::CONTROL_NUMBER_LENGTH, "10").unwrap();
        assert_eq!(cm.get_control_number_length().unwrap(), 10);
    }

    #[test]
    fn test_snapshot_contains_defaults_and_restores() {
        let cm = manager();
        cm.set_global_config_value(config_keys::CONTROL_NUMBER_PREFIX, "BME").unwrap();
        let snapshot = cm.get_config_snapshot().unwrap();
        let parsed: BTreeMap<String, String> = serde_json::from_str(&snapshot).unwrap();
        assert_eq!(parsed.get("control_number_prefix").map(String::as_str), Some("BME"));
        assert_eq!(parsed.get("work_order_id_length").map(String::as_str), Some("8"));

        let other = manager();
        assert_eq!(other.restore_config_from_snapshot(&snapshot).unwrap(), 5);
        assert_eq!(other.get_control_number_prefix().unwrap(), "BME");
    }
}
