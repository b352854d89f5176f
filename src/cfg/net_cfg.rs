// Default values, overwritten by the persisted config.json and the portal
pub const MQTT_SERVER: &str = "10.0.1.50";
pub const MQTT_PORT: &str = "1883";
pub const MQTT_USER: &str = "";
pub const MQTT_PASS: &str = "";
pub const UNIT_ID: &str = "wesh0";
pub const GROUP_ID: &str = "weshgrp0";

// Maximum value lengths in bytes (firmware char buffers minus the terminator)
pub const MQTT_SERVER_LEN: usize = 39;
pub const MQTT_PORT_LEN: usize = 5;
pub const MQTT_USER_LEN: usize = 23;
pub const MQTT_PASS_LEN: usize = 23;
pub const UNIT_ID_LEN: usize = 15;
pub const GROUP_ID_LEN: usize = 15;
