//! 受支持厂商/型号静态目录
//!
//! 纯查表，不访问外部服务；型号归属由设备注册服务维护，
//! 网关只回答"这一型号能不能用 RS485 协议栈驱动"。

use warden_types::{ProtocolType, VendorInfo};

/// 受支持的设备型号
pub const SUPPORTED_MODELS: &[&str] = &[
    // 变频器
    "ABB_ACS880_V1",
    "SIEMENS_G120_V1",
    "SCHNEIDER_ATV630_V1",
    "DELTA_VFD_MS300_V1",
    // PLC 控制器
    "SIEMENS_S7_1200_V1",
    "MITSUBISHI_FX3U_V1",
    "OMRON_CP1E_V1",
    "PANASONIC_FP_V1",
    // 传感器
    "TEMP_SENSOR_485_V1",
    "HUMIDITY_SENSOR_485_V1",
    "PRESSURE_SENSOR_485_V1",
    "FLOW_SENSOR_485_V1",
    // 仪表
    "ELECTRIC_METER_485_V1",
    "WATER_METER_485_V1",
    "POWER_ANALYZER_485_V1",
    // 执行器
    "VALVE_ACTUATOR_485_V1",
    "MOTOR_CONTROLLER_485_V1",
    "SERVO_DRIVE_485_V1",
];

/// 型号是否受支持（纯查表）
pub fn is_device_model_supported(device_model: &str) -> bool {
    SUPPORTED_MODELS.contains(&device_model)
}

/// 全部受支持型号
pub fn supported_device_models() -> Vec<String> {
    SUPPORTED_MODELS.iter().map(|s| s.to_string()).collect()
}

/// 按厂商分组的目录
pub fn vendor_catalog() -> Vec<VendorInfo> {
    let vendors: &[(&str, &[&str])] = &[
        ("abb", &["ABB_ACS880_V1"]),
        ("siemens", &["SIEMENS_G120_V1", "SIEMENS_S7_1200_V1"]),
        ("schneider", &["SCHNEIDER_ATV630_V1"]),
        ("delta", &["DELTA_VFD_MS300_V1"]),
        ("mitsubishi", &["MITSUBISHI_FX3U_V1"]),
        ("omron", &["OMRON_CP1E_V1"]),
        ("panasonic", &["PANASONIC_FP_V1"]),
        (
            "generic",
            &[
                "TEMP_SENSOR_485_V1",
                "HUMIDITY_SENSOR_485_V1",
                "PRESSURE_SENSOR_485_V1",
                "FLOW_SENSOR_485_V1",
                "ELECTRIC_METER_485_V1",
                "WATER_METER_485_V1",
                "POWER_ANALYZER_485_V1",
                "VALVE_ACTUATOR_485_V1",
                "MOTOR_CONTROLLER_485_V1",
                "SERVO_DRIVE_485_V1",
            ],
        ),
    ];

    vendors
        .iter()
        .map(|(vendor, models)| VendorInfo {
            vendor: vendor.to_string(),
            models: models.iter().map(|m| m.to_string()).collect(),
            protocol: ProtocolType::Rs485,
        })
        .collect()
}
