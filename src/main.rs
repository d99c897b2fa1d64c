// ==========================================
// HTM Vault - 主入口
// ==========================================
// 用法: htm-vault [db_path]
// 行为: 打开/初始化数据库，输出一行 JSON 存储概况
// 环境变量: HTM_VAULT_LOG_FORMAT=json 切换为 JSON 日志
// ==========================================

use anyhow::{anyhow, Context};
use htm_vault::app::{get_default_db_path, AppState};
use htm_vault::logging;

fn main() -> anyhow::Result<()> {
    // 初始化日志系统
    match std::env::var("HTM_VAULT_LOG_FORMAT") {
        Ok(format) if format.eq_ignore_ascii_case("json") => logging::init_json(),
        _ => logging::init(),
    }

    tracing::info!("==================================================");
    tracing::info!("{} - 医疗设备台账与维保工单", htm_vault::APP_NAME);
    tracing::info!("系统版本: {}", htm_vault::VERSION);
    tracing::info!("==================================================");

    let db_path = std::env::args().nth(1).unwrap_or_else(get_default_db_path);
    tracing::info!("使用数据库: {}", db_path);

    let state = AppState::new(db_path).map_err(|e| anyhow!(e))?;
    let status = state.store_status().map_err(|e| anyhow!(e))?;

    tracing::info!(
        schema_version = ?status.schema_version,
        devices = status.device_count,
        work_orders = status.work_order_count,
        open_work_orders = status.open_work_order_count,
        "存储就绪"
    );

    println!(
        "{}",
        serde_json::to_string(&status).context("序列化存储概况失败")?
    );
    Ok(())
}
