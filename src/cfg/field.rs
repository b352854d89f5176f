use core::fmt;

use crate::cfg::net_cfg::*;

/// Configuration fields, keyed the same way in config.json and the portal form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigField {
    MqttServer,
    MqttPort,
    MqttUser,
    MqttPass,
    UnitId,
    GroupId,
}

impl ConfigField {
    pub const COUNT: usize = 6;

    pub const ALL: [ConfigField; Self::COUNT] = [
        ConfigField::MqttServer,
        ConfigField::MqttPort,
        ConfigField::MqttUser,
        ConfigField::MqttPass,
        ConfigField::UnitId,
        ConfigField::GroupId,
    ];

    pub const fn key(&self) -> &'static str {
        match self {
            ConfigField::MqttServer => "mqtt_server",
            ConfigField::MqttPort => "mqtt_port",
            ConfigField::MqttUser => "mqtt_user",
            ConfigField::MqttPass => "mqtt_pass",
            ConfigField::UnitId => "unit_id",
            ConfigField::GroupId => "group_id",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|field| field.key() == key)
    }

    /// Longest accepted value in bytes
    pub const fn max_len(&self) -> usize {
        match self {
            ConfigField::MqttServer => MQTT_SERVER_LEN,
            ConfigField::MqttPort => MQTT_PORT_LEN,
            ConfigField::MqttUser => MQTT_USER_LEN,
            ConfigField::MqttPass => MQTT_PASS_LEN,
            ConfigField::UnitId => UNIT_ID_LEN,
            ConfigField::GroupId => GROUP_ID_LEN,
        }
    }

    pub const fn default_value(&self) -> &'static str {
        match self {
            ConfigField::MqttServer => MQTT_SERVER,
            ConfigField::MqttPort => MQTT_PORT,
            ConfigField::MqttUser => MQTT_USER,
            ConfigField::MqttPass => MQTT_PASS,
            ConfigField::UnitId => UNIT_ID,
            ConfigField::GroupId => GROUP_ID,
        }
    }

    /// Prompt shown next to the field in the provisioning portal
    pub const fn label(&self) -> &'static str {
        match self {
            ConfigField::MqttServer => "mqtt server",
            ConfigField::MqttPort => "mqtt port",
            ConfigField::MqttUser => "mqtt user",
            ConfigField::MqttPass => "mqtt password",
            ConfigField::UnitId => "unit id",
            ConfigField::GroupId => "group id",
        }
    }

    pub const fn is_secret(&self) -> bool {
        matches!(self, ConfigField::MqttPass)
    }

    /// Unit and group ids feed the topic names
    pub const fn is_identifier(&self) -> bool {
        matches!(self, ConfigField::UnitId | ConfigField::GroupId)
    }
}

impl fmt::Display for ConfigField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}
