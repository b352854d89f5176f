use heapless::String;
use log::debug;

use crate::cfg::field::ConfigField;
use crate::cfg::net_cfg::*;
use crate::error::Error;

/// Broker and identity settings of the node.
///
/// Every field is a fixed capacity buffer sized after the firmware limits,
/// so a value that does not fit is refused at [`ConnectionConfig::set`]
/// instead of being cut short.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionConfig {
    mqtt_server: String<MQTT_SERVER_LEN>,
    mqtt_port: String<MQTT_PORT_LEN>,
    mqtt_user: String<MQTT_USER_LEN>,
    mqtt_pass: String<MQTT_PASS_LEN>,
    unit_id: String<UNIT_ID_LEN>,
    group_id: String<GROUP_ID_LEN>,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        let mut config = Self {
            mqtt_server: String::new(),
            mqtt_port: String::new(),
            mqtt_user: String::new(),
            mqtt_pass: String::new(),
            unit_id: String::new(),
            group_id: String::new(),
        };
        config.load_defaults();
        config
    }
}

impl ConnectionConfig {
    /// Reset every field to its built-in default
    pub fn load_defaults(&mut self) {
        for field in ConfigField::ALL {
            // defaults are checked against the limits in the field tests
            if self.set(field, field.default_value()).is_err() {
                debug!("[CFG] Default for {field} exceeds its limit");
            }
        }
    }

    /// Overwrite one field. An over-long value leaves the field untouched.
    pub fn set(&mut self, field: ConfigField, value: &str) -> Result<(), Error> {
        let result = match field {
            ConfigField::MqttServer => replace(&mut self.mqtt_server, value),
            ConfigField::MqttPort => replace(&mut self.mqtt_port, value),
            ConfigField::MqttUser => replace(&mut self.mqtt_user, value),
            ConfigField::MqttPass => replace(&mut self.mqtt_pass, value),
            ConfigField::UnitId => replace(&mut self.unit_id, value),
            ConfigField::GroupId => replace(&mut self.group_id, value),
        };
        result.map_err(|_| Error::ConfigValueTooLong {
            field,
            len: value.len(),
            max: field.max_len(),
        })
    }

    pub fn get(&self, field: ConfigField) -> &str {
        match field {
            ConfigField::MqttServer => self.mqtt_server.as_str(),
            ConfigField::MqttPort => self.mqtt_port.as_str(),
            ConfigField::MqttUser => self.mqtt_user.as_str(),
            ConfigField::MqttPass => self.mqtt_pass.as_str(),
            ConfigField::UnitId => self.unit_id.as_str(),
            ConfigField::GroupId => self.group_id.as_str(),
        }
    }

    pub fn mqtt_server(&self) -> &str {
        &self.mqtt_server
    }

    pub fn mqtt_port(&self) -> &str {
        &self.mqtt_port
    }

    /// Port as a number, `None` when the stored text is not a valid port
    pub fn mqtt_port_number(&self) -> Option<u16> {
        self.mqtt_port.parse().ok()
    }

    /// Empty user means anonymous login
    pub fn mqtt_user(&self) -> Option<&str> {
        Some(self.mqtt_user.as_str()).filter(|user| !user.is_empty())
    }

    pub fn mqtt_pass(&self) -> Option<&str> {
        Some(self.mqtt_pass.as_str()).filter(|pass| !pass.is_empty())
    }

    pub fn unit_id(&self) -> &str {
        &self.unit_id
    }

    pub fn group_id(&self) -> &str {
        &self.group_id
    }
}

fn replace<const N: usize>(slot: &mut String<N>, value: &str) -> Result<(), ()> {
    let fresh: String<N> = value.try_into()?;
    *slot = fresh;
    Ok(())
}
