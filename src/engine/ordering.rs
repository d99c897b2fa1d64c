// ==========================================
// HTM Vault - 工单排序
// ==========================================
// 主键: completion_date_time（未完成的工单在升序中排在所有已完成之后）
// 次键: created_at
// DESCENDING 为 ASCENDING 的完全反序
// ==========================================

use crate::domain::types::SortOrder;
use crate::domain::work_order::WorkOrder;
use std::cmp::Ordering;

/// 升序比较
fn compare_ascending(a: &WorkOrder, b: &WorkOrder) -> Ordering {
    let by_completion = match (a.completion_date_time, b.completion_date_time) {
        (Some(x), Some(y)) => x.cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    };
    by_completion.then_with(|| a.created_at.cmp(&b.created_at))
}

/// 按排序方向原地排序
pub fn sort_work_orders(work_orders: &mut [WorkOrder], order: SortOrder) {
    match order {
        SortOrder::Ascending => work_orders.sort_by(compare_ascending),
        SortOrder::Descending => work_orders.sort_by(|a, b| compare_ascending(b, a)),
    }
}
