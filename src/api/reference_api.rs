// ==========================================
// HTM Vault - 参考数据 API
// ==========================================
// 职责: 厂商→型号、院区→科室 的分组列表（均去重升序）
// ==========================================

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use crate::api::error::ApiResult;
use crate::api::record_outcome;
use crate::domain::reference::{FacilityDepartments, ManufacturerModels};
use crate::metrics::MetricsSink;
use crate::repository::store::ReferenceDataStore;

pub struct ReferenceDataApi {
    reference_store: Arc<dyn ReferenceDataStore>,
}

impl ReferenceDataApi {
    pub fn new(reference_store: Arc<dyn ReferenceDataStore>) -> Self {
        Self { reference_store }
    }

    /// 厂商及其型号
    pub fn list_manufacturers_and_models(
        &self,
        metrics: &dyn MetricsSink,
    ) -> ApiResult<Vec<ManufacturerModels>> {
        tracing::info!("收到 GetManufacturersAndModels 请求");
        let result: ApiResult<Vec<ManufacturerModels>> = self
            .reference_store
            .list_manufacturer_models()
            .map(|rows| {
                group_sorted(rows.into_iter().map(|mm| (mm.manufacturer, mm.model)))
                    .into_iter()
                    .map(|(manufacturer, models)| ManufacturerModels {
                        manufacturer,
                        models,
                    })
                    .collect()
            })
            .map_err(Into::into);
        record_outcome(metrics, "GetManufacturersAndModels", &result);
        result
    }

    /// 院区及其科室
    pub fn list_facilities_and_departments(
        &self,
        metrics: &dyn MetricsSink,
    ) -> ApiResult<Vec<FacilityDepartments>> {
        tracing::info!("收到 GetFacilitiesAndDepartments 请求");
        let result: ApiResult<Vec<FacilityDepartments>> = self
            .reference_store
            .list_facility_departments()
            .map(|rows| {
                group_sorted(
                    rows.into_iter()
                        .map(|fd| (fd.facility_name, fd.assigned_department)),
                )
                .into_iter()
                .map(|(facility, departments)| FacilityDepartments {
                    facility,
                    departments,
                })
                .collect()
            })
            .map_err(Into::into);
        record_outcome(metrics, "GetFacilitiesAndDepartments", &result);
        result
    }
}

/// 按键分组，键与值均去重升序
fn group_sorted(pairs: impl Iterator<Item = (String, String)>) -> Vec<(String, Vec<String>)> {
    let mut grouped: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
    for (key, value) in pairs {
        grouped.entry(key).or_default().insert(value);
    }
    grouped
        .into_iter()
        .map(|(key, values)| (key, values.into_iter().collect()))
        .collect()
}
