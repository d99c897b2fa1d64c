// ==========================================
// HTM Vault - 参考数据导入器
// ==========================================
// 输入:
//   manufacturer_models.csv   : manufacturer,model,required_maintenance_frequency_in_months
//   facility_departments.csv  : facility_name,assigned_department
// 流程: 解析 → 逐行校验（任一行非法即中止）→ 单事务 upsert
// ==========================================

use crate::api::validator::validate_attribute;
use crate::domain::reference::{FacilityDepartment, ManufacturerModel};
use crate::importer::error::{ImportError, ImportResult};
use crate::repository::reference_repo::ReferenceDataRepository;
use csv::ReaderBuilder;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

/// 维护周期合法范围（月）
pub const MIN_MAINTENANCE_FREQUENCY_MONTHS: i64 = 0;
pub const MAX_MAINTENANCE_FREQUENCY_MONTHS: i64 = 24;

/// 导入结果统计
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportSummary {
    pub batch_id: String,
    pub manufacturer_models: usize,
    pub facility_departments: usize,
    pub elapsed_ms: u64,
}

/// 一行原始数据（列名 → 去空白后的值）及其行号
struct RawRow {
    row: usize,
    fields: HashMap<String, String>,
}

impl RawRow {
    fn get(&self, column: &str) -> &str {
        self.fields.get(column).map(String::as_str).unwrap_or("")
    }
}

// ==========================================
// ReferenceDataImporter
// ==========================================
pub struct ReferenceDataImporter {
    reference_repo: Arc<ReferenceDataRepository>,
}

impl ReferenceDataImporter {
    pub fn new(reference_repo: Arc<ReferenceDataRepository>) -> Self {
        Self { reference_repo }
    }

    /// 导入两份 CSV 文件
    pub fn import_files(
        &self,
        manufacturer_models_path: &Path,
        facility_departments_path: &Path,
    ) -> ImportResult<ImportSummary> {
        let mm_file = open_csv(manufacturer_models_path)?;
        let fd_file = open_csv(facility_departments_path)?;
        self.import_readers(
            mm_file,
            &manufacturer_models_path.display().to_string(),
            fd_file,
            &facility_departments_path.display().to_string(),
        )
    }

    /// 从任意读取器导入（两份数据都校验通过后才写库）
    pub fn import_readers<R1: Read, R2: Read>(
        &self,
        manufacturer_models: R1,
        manufacturer_models_source: &str,
        facility_departments: R2,
        facility_departments_source: &str,
    ) -> ImportResult<ImportSummary> {
        let started = Instant::now();
        let batch_id = uuid::Uuid::new_v4().to_string();
        tracing::info!(batch_id = %batch_id, "开始导入参考数据");

        let mms = parse_manufacturer_models(manufacturer_models, manufacturer_models_source)?;
        let fds = parse_facility_departments(facility_departments, facility_departments_source)?;

        let counts = self.reference_repo.upsert_all(&mms, &fds)?;

        let summary = ImportSummary {
            batch_id,
            manufacturer_models: counts.manufacturer_models,
            facility_departments: counts.facility_departments,
            elapsed_ms: started.elapsed().as_millis() as u64,
        };
        tracing::info!(
            batch_id = %summary.batch_id,
            manufacturer_models = summary.manufacturer_models,
            facility_departments = summary.facility_departments,
            elapsed_ms = summary.elapsed_ms,
            "参考数据导入完成"
        );
        Ok(summary)
    }
}

// ==========================================
// 解析与校验
// ==========================================

/// 解析厂商/型号 CSV
pub fn parse_manufacturer_models<R: Read>(reader: R, source: &str) -> ImportResult<Vec<ManufacturerModel>> {
    let rows = read_rows(
        reader,
        source,
        &["manufacturer", "model", "required_maintenance_frequency_in_months"],
    )?;

    rows.iter()
        .map(|raw| {
            let manufacturer = checked_text(source, raw, "manufacturer")?;
            let model = checked_text(source, raw, "model")?;
            let freq = parse_frequency(source, raw)?;
            Ok(ManufacturerModel::new(manufacturer, model, Some(freq)))
        })
        .collect()
}

/// 解析院区/科室 CSV
pub fn parse_facility_departments<R: Read>(reader: R, source: &str) -> ImportResult<Vec<FacilityDepartment>> {
    let rows = read_rows(reader, source, &["facility_name", "assigned_department"])?;

    rows.iter()
        .map(|raw| {
            let facility = checked_text(source, raw, "facility_name")?;
            let department = checked_text(source, raw, "assigned_department")?;
            Ok(FacilityDepartment::new(facility, department))
        })
        .collect()
}

fn open_csv(path: &Path) -> ImportResult<File> {
    if !path.exists() {
        return Err(ImportError::FileNotFound(path.display().to_string()));
    }
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("csv") => {}
        other => return Err(ImportError::UnsupportedFormat(other.unwrap_or("").to_string())),
    }
    Ok(File::open(path)?)
}

fn read_rows<R: Read>(reader: R, source: &str, required: &[&str]) -> ImportResult<Vec<RawRow>> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true) // 允许行长度不一致
        .from_reader(reader);

    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    for column in required {
        if !headers.iter().any(|h| h == column) {
            return Err(ImportError::MissingColumn {
                source_name: source.to_string(),
                column: column.to_string(),
            });
        }
    }

    let mut rows = Vec::new();
    for (idx, result) in reader.records().enumerate() {
        let record = result?;
        let fields: HashMap<String, String> = headers
            .iter()
            .cloned()
            .zip(record.iter().map(|v| v.trim().to_string()))
            .collect();

        // 跳过完全空白的行
        if fields.values().all(|v| v.is_empty()) {
            continue;
        }

        rows.push(RawRow { row: idx + 2, fields });
    }
    Ok(rows)
}

fn checked_text(source: &str, raw: &RawRow, column: &str) -> ImportResult<String> {
    let value = raw.get(column);
    validate_attribute(column, value).map_err(|e| ImportError::InvalidField {
        source_name: source.to_string(),
        row: raw.row,
        field: column.to_string(),
        message: e.to_string(),
    })?;
    Ok(value.to_string())
}

fn parse_frequency(source: &str, raw: &RawRow) -> ImportResult<u32> {
    const FIELD: &str = "required_maintenance_frequency_in_months";
    let value = raw.get(FIELD);
    if value.is_empty() {
        return Ok(0);
    }

    let parsed = value.parse::<i64>().map_err(|_| ImportError::InvalidField {
        source_name: source.to_string(),
        row: raw.row,
        field: FIELD.to_string(),
        message: format!("'{}' 不是整数", value),
    })?;

    if !(MIN_MAINTENANCE_FREQUENCY_MONTHS..=MAX_MAINTENANCE_FREQUENCY_MONTHS).contains(&parsed) {
        return Err(ImportError::ValueRangeError {
            source_name: source.to_string(),
            row: raw.row,
            field: FIELD.to_string(),
            value: parsed,
            min: MIN_MAINTENANCE_FREQUENCY_MONTHS,
            max: MAX_MAINTENANCE_FREQUENCY_MONTHS,
        });
    }
    Ok(parsed as u32)
}
