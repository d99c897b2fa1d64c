// ==========================================
// DeviceApi 集成测试
// ==========================================
// 测试范围:
// 1. 新增: 入账、合规日期初始化、重复设备、属性校验
// 2. 更新: 字段覆盖、合规日期重算、RETIRED 不可修改
// 3. 退役 / 重新启用: 未关闭工单阻止退役
// 4. 查询与指标
// ==========================================

mod helpers;

use helpers::api_test_helper::*;
use htm_vault::api::{
    ApiError, ErrorKind, GetDeviceRequest, ReactivateDeviceRequest, RetireDeviceRequest,
    UpdateDeviceRequest,
};
use htm_vault::config::config_keys;
use htm_vault::domain::{Device, ServiceStatus};
use htm_vault::repository::DeviceStore;

fn update_request_from(device: &Device) -> UpdateDeviceRequest {
    UpdateDeviceRequest {
        control_number: device.control_number.clone(),
        serial_number: device.serial_number.clone(),
        manufacturer: device.manufacturer_model.manufacturer.clone(),
        model: device.manufacturer_model.model.clone(),
        facility_name: device.facility_name.clone(),
        assigned_department: device.assigned_department.clone(),
        manufacture_date: device.manufacture_date.map(|d| d.format("%Y-%m-%d").to_string()),
        notes: Some(device.notes.clone()),
        actor: actor(),
    }
}

// ==========================================
// 新增设备
// ==========================================

#[test]
fn test_add_device_初始状态() {
    let env = ApiTestEnv::new().expect("无法创建测试环境");

    let device = env.add_device("SN-1001");

    assert_eq!(device.control_number.len(), 6);
    assert_eq!(device.service_status, ServiceStatus::InService);
    assert_eq!(device.inventory_add_date, today());
    assert_eq!(device.added_by, actor());
    assert_eq!(device.manufacturer_model.required_maintenance_frequency_in_months, Some(12));
    // 无 PM 历史: 入账即到期
    assert_eq!(device.compliance_through_date, None);
    assert_eq!(device.next_pm_due_date, Some(today()));
    assert_eq!(device.last_pm_completion_date, None);
    assert_eq!(device.notes, "");

    let stored = env
        .device_api
        .get_device(GetDeviceRequest { control_number: device.control_number.clone() }, &env.metrics)
        .expect("查询失败");
    assert_eq!(stored, device);
    assert_eq!(env.metric("AddDevice.Success.Count"), 1.0);
    assert_eq!(env.metric("GetDevice.Success.Count"), 1.0);
}

#[test]
fn test_add_device_无需维护的型号() {
    let env = ApiTestEnv::new().expect("无法创建测试环境");

    let device = env
        .device_api
        .add_device(add_request("Z-1", "Zoll", "R Series"), &env.metrics)
        .expect("新增失败");

    assert_eq!(device.compliance_through_date, None);
    assert_eq!(device.next_pm_due_date, None);
}

#[test]
fn test_add_device_使用配置的控制号前缀与长度() {
    let env = ApiTestEnv::new().expect("无法创建测试环境");
    env.config
        .set_global_config_value(config_keys::CONTROL_NUMBER_PREFIX, "HT")
        .unwrap();
    env.config
        .set_global_config_value(config_keys::CONTROL_NUMBER_LENGTH, "10")
        .unwrap();

    let device = env.add_device("SN-1");

    assert!(device.control_number.starts_with("HT"));
    assert_eq!(device.control_number.len(), 12);
}

#[test]
fn test_add_device_重复设备被拒绝() {
    let env = ApiTestEnv::new().expect("无法创建测试环境");
    let first = env.add_device("SN-DUP");

    let err = env
        .device_api
        .add_device(add_request("SN-DUP", "Acme", "Pump 5"), &env.metrics)
        .unwrap_err();

    match err {
        ApiError::DuplicateDevice { existing_control_number, serial_number, .. } => {
            assert_eq!(existing_control_number, first.control_number);
            assert_eq!(serial_number, "SN-DUP");
        }
        other => panic!("期望 DuplicateDevice，实际: {:?}", other),
    }
    assert_eq!(env.metric("AddDevice.DuplicateDevice.Count"), 1.0);
    assert_eq!(env.device_repo.count().unwrap(), 1);
}

#[test]
fn test_add_device_同序列号不同型号允许() {
    let env = ApiTestEnv::new().expect("无法创建测试环境");
    env.add_device("SN-SHARED");

    let other = env
        .device_api
        .add_device(add_request("SN-SHARED", "Acme", "Pump 6"), &env.metrics)
        .expect("不同型号应允许");
    assert_eq!(other.manufacturer_model.model, "Pump 6");
}

#[test]
fn test_add_device_非法属性() {
    let env = ApiTestEnv::new().expect("无法创建测试环境");

    let cases = vec![
        add_request("SN#1", "Acme", "Pump 5"),
        add_request("  ", "Acme", "Pump 5"),
        add_request("SN-1", "Acme", "Pump 9"),
        add_request("SN-1", "acme", "Pump 5"),
        {
            let mut r = add_request("SN-1", "Acme", "Pump 5");
            r.assigned_department = "Radiology".to_string();
            r
        },
        {
            let mut r = add_request("SN-1", "Acme", "Pump 5");
            r.facility_name = "East".to_string();
            r
        },
        {
            let mut r = add_request("SN-1", "Acme", "Pump 5");
            r.manufacture_date = Some("2999-01-01".to_string());
            r
        },
        {
            let mut r = add_request("SN-1", "Acme", "Pump 5");
            r.manufacture_date = Some("01/02/2020".to_string());
            r
        },
    ];

    let total = cases.len() as f64;
    for request in cases {
        let label = format!("{:?}", request);
        let err = env.device_api.add_device(request, &env.metrics).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidAttribute, "{}", label);
    }
    assert_eq!(env.metric("AddDevice.InvalidAttribute.Count"), total);
    assert_eq!(env.device_repo.count().unwrap(), 0);
}

#[test]
fn test_add_device_出厂日期与备注() {
    let env = ApiTestEnv::new().expect("无法创建测试环境");
    let mut request = add_request("SN-MD", "Acme", "Pump 5");
    request.manufacture_date = Some("2019-06-30".to_string());
    request.notes = Some("Loaner unit".to_string());

    let device = env.device_api.add_device(request, &env.metrics).expect("新增失败");

    assert_eq!(device.manufacture_date.map(|d| d.to_string()).as_deref(), Some("2019-06-30"));
    assert_eq!(device.notes, "Loaner unit");
}

// ==========================================
// 更新设备
// ==========================================

#[test]
fn test_update_device_覆盖字段并重算日期() {
    let env = ApiTestEnv::new().expect("无法创建测试环境");
    let device = env.add_device("SN-U1");

    let mut request = update_request_from(&device);
    request.model = "Pump 6".to_string();
    request.assigned_department = "ER".to_string();
    request.notes = None;

    let updated = env.device_api.update_device(request, &env.metrics).expect("更新失败");

    assert_eq!(updated.control_number, device.control_number);
    assert_eq!(updated.manufacturer_model.required_maintenance_frequency_in_months, Some(6));
    assert_eq!(updated.assigned_department, "ER");
    assert_eq!(updated.notes, "");
    // 仍无 PM 历史
    assert_eq!(updated.next_pm_due_date, Some(device.inventory_add_date));
    assert_eq!(updated.inventory_add_date, device.inventory_add_date);
    assert_eq!(updated.added_by, device.added_by);

    // 换成无需维护的型号后日期清空
    let mut request = update_request_from(&updated);
    request.manufacturer = "Zoll".to_string();
    request.model = "R Series".to_string();
    let updated = env.device_api.update_device(request, &env.metrics).expect("更新失败");
    assert_eq!(updated.compliance_through_date, None);
    assert_eq!(updated.next_pm_due_date, None);
}

#[test]
fn test_update_device_不做重复检查() {
    let env = ApiTestEnv::new().expect("无法创建测试环境");
    let device = env.add_device("SN-U2");

    let updated = env
        .device_api
        .update_device(update_request_from(&device), &env.metrics)
        .expect("原样更新应成功");
    assert_eq!(updated.serial_number, "SN-U2");
}

#[test]
fn test_update_device_出厂日期缺省清空_空串非法() {
    let env = ApiTestEnv::new().expect("无法创建测试环境");
    let mut add = add_request("SN-U3", "Acme", "Pump 5");
    add.manufacture_date = Some("2020-01-15".to_string());
    let device = env.device_api.add_device(add, &env.metrics).unwrap();

    for raw in ["", "   "] {
        let mut request = update_request_from(&device);
        request.manufacture_date = Some(raw.to_string());
        let err = env.device_api.update_device(request, &env.metrics).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidAttribute);
    }
    assert_eq!(env.metric("UpdateDevice.InvalidAttribute.Count"), 2.0);
    let stored = env.device_repo.load(&device.control_number).unwrap();
    assert_eq!(stored.manufacture_date, device.manufacture_date);

    let mut request = update_request_from(&device);
    request.manufacture_date = None;
    let updated = env.device_api.update_device(request, &env.metrics).unwrap();
    assert_eq!(updated.manufacture_date, None);
}

#[test]
fn test_update_device_未找到() {
    let env = ApiTestEnv::new().expect("无法创建测试环境");
    let device = env.add_device("SN-U4");
    let mut request = update_request_from(&device);
    request.control_number = "NOPE01".to_string();

    let err = env.device_api.update_device(request, &env.metrics).unwrap_err();
    assert!(matches!(err, ApiError::DeviceNotFound(ref cn) if cn == "NOPE01"));
    assert_eq!(env.metric("UpdateDevice.DeviceNotFound.Count"), 1.0);
}

#[test]
fn test_update_device_退役设备先于校验被拒绝() {
    let env = ApiTestEnv::new().expect("无法创建测试环境");
    let device = env.add_device("SN-U5");
    env.device_api
        .retire_device(
            RetireDeviceRequest { control_number: device.control_number.clone(), actor: actor() },
            &env.metrics,
        )
        .unwrap();

    // 请求本身也是非法的，但退役检查优先
    let mut request = update_request_from(&device);
    request.serial_number = "bad!serial".to_string();

    let err = env.device_api.update_device(request, &env.metrics).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ImmutableState);
    assert!(matches!(err, ApiError::RetiredDeviceImmutable(_)));
}

// ==========================================
// 退役 / 重新启用
// ==========================================

#[test]
fn test_retire_device_存在未关闭工单() {
    let env = ApiTestEnv::new().expect("无法创建测试环境");
    let device = env.add_device("SN-R1");
    let work_order = env.open_work_order(&device.control_number, "REPAIR");

    let err = env
        .device_api
        .retire_device(
            RetireDeviceRequest { control_number: device.control_number.clone(), actor: actor() },
            &env.metrics,
        )
        .unwrap_err();
    assert!(matches!(err, ApiError::OpenWorkOrdersExist { open_count: 1, .. }));
    assert_eq!(err.kind(), ErrorKind::PreconditionFailed);

    env.close_work_order(&work_order.work_order_id);

    let retired = env
        .device_api
        .retire_device(
            RetireDeviceRequest { control_number: device.control_number.clone(), actor: actor() },
            &env.metrics,
        )
        .expect("关闭工单后应可退役");
    assert_eq!(retired, Device { service_status: ServiceStatus::Retired, ..device });
}

#[test]
fn test_retire_and_reactivate_往返() {
    let env = ApiTestEnv::new().expect("无法创建测试环境");
    let device = env.add_device("SN-R2");
    let cn = device.control_number.clone();

    env.device_api
        .retire_device(RetireDeviceRequest { control_number: cn.clone(), actor: actor() }, &env.metrics)
        .unwrap();
    // 再次退役保持幂等
    env.device_api
        .retire_device(RetireDeviceRequest { control_number: cn.clone(), actor: actor() }, &env.metrics)
        .unwrap();

    let retired = env.device_repo.load(&cn).unwrap();
    assert_eq!(retired, Device { service_status: ServiceStatus::Retired, ..device.clone() });

    let active = env
        .device_api
        .reactivate_device(ReactivateDeviceRequest { control_number: cn.clone(), actor: actor() }, &env.metrics)
        .unwrap();
    assert_eq!(active, device);
    assert_eq!(env.metric("RetireDevice.Success.Count"), 2.0);
    assert_eq!(env.metric("ReactivateDevice.Success.Count"), 1.0);

    // 重新启用后可以再次更新
    let updated = env
        .device_api
        .update_device(update_request_from(&active), &env.metrics)
        .expect("重新启用后应可更新");
    assert_eq!(updated.service_status, ServiceStatus::InService);
}

#[test]
fn test_retire_and_reactivate_未找到() {
    let env = ApiTestEnv::new().expect("无法创建测试环境");

    let err = env
        .device_api
        .retire_device(RetireDeviceRequest { control_number: "NOPE01".to_string(), actor: actor() }, &env.metrics)
        .unwrap_err();
    assert!(matches!(err, ApiError::DeviceNotFound(ref cn) if cn == "NOPE01"));
    assert_eq!(env.metric("RetireDevice.DeviceNotFound.Count"), 1.0);

    let err = env
        .device_api
        .reactivate_device(
            ReactivateDeviceRequest { control_number: "NOPE01".to_string(), actor: actor() },
            &env.metrics,
        )
        .unwrap_err();
    assert!(matches!(err, ApiError::DeviceNotFound(ref cn) if cn == "NOPE01"));
    assert_eq!(env.metric("ReactivateDevice.DeviceNotFound.Count"), 1.0);
}

#[test]
fn test_get_device_未找到() {
    let env = ApiTestEnv::new().expect("无法创建测试环境");

    let err = env
        .device_api
        .get_device(GetDeviceRequest { control_number: "MISSING".to_string() }, &env.metrics)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert_eq!(env.metric("GetDevice.DeviceNotFound.Count"), 1.0);
}

// ==========================================
// 并发: 后写覆盖
// ==========================================

#[test]
fn test_两个独立实例后写覆盖() {
    let env_a = ApiTestEnv::new().expect("无法创建测试环境");
    let env_b = ApiTestEnv::open(env_a.db_path.clone()).expect("无法打开第二个实例");
    let device = env_a.add_device("SN-LWW");

    let mut from_a = update_request_from(&device);
    from_a.notes = Some("edit from A".to_string());
    let mut from_b = update_request_from(&device);
    from_b.notes = Some("edit from B".to_string());

    env_a.device_api.update_device(from_a, &env_a.metrics).unwrap();
    env_b.device_api.update_device(from_b, &env_b.metrics).unwrap();

    let stored = env_a
        .device_api
        .get_device(GetDeviceRequest { control_number: device.control_number.clone() }, &env_a.metrics)
        .unwrap();
    assert_eq!(stored.notes, "edit from B");
}
