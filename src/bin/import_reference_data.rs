// ==========================================
// HTM Vault - 参考数据导入工具
// ==========================================
// 用法: import_reference_data <db_path> <manufacturer_models.csv> <facility_departments.csv>
// ==========================================

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use anyhow::{bail, Context};
use htm_vault::db::{init_schema, open_sqlite_connection};
use htm_vault::importer::ReferenceDataImporter;
use htm_vault::logging;
use htm_vault::repository::ReferenceDataRepository;

fn main() -> anyhow::Result<()> {
    logging::init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.len() != 3 {
        bail!("用法: import_reference_data <db_path> <manufacturer_models.csv> <facility_departments.csv>");
    }
    let db_path = &args[0];
    let mm_path = PathBuf::from(&args[1]);
    let fd_path = PathBuf::from(&args[2]);

    let conn = open_sqlite_connection(db_path)
        .with_context(|| format!("无法打开数据库: {}", db_path))?;
    init_schema(&conn).context("初始化数据库结构失败")?;

    let repo = Arc::new(ReferenceDataRepository::from_connection(Arc::new(Mutex::new(conn))));
    let importer = ReferenceDataImporter::new(repo);

    let summary = importer
        .import_files(&mm_path, &fd_path)
        .context("参考数据导入失败")?;

    println!("{}", serde_json::to_string(&summary)?);
    Ok(())
}
