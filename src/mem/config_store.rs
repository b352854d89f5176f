use core::fmt;

use embedded_storage::{ReadStorage, Storage};
use heapless::String;
use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize};

use crate::cfg::connection::ConnectionConfig;
use crate::cfg::field::ConfigField;
use crate::cfg::net_cfg::MQTT_SERVER_LEN;
use crate::error::{Error, Rejected};
use crate::identity::DeviceIdentity;

// Record layout: magic (4) | body length, little endian (2) | JSON body
pub const RECORD_MAGIC: [u8; 4] = *b"WCFG";
pub const HEADER_SIZE: usize = 6;
pub const MAX_BODY_SIZE: usize = 1024;
pub const RECORD_SIZE: usize = HEADER_SIZE + MAX_BODY_SIZE;

// Longest value any field accepts
const MAX_VALUE_LEN: usize = MQTT_SERVER_LEN;

// Every byte of a value may escape to `\u00XX`; per field the document adds
// `"key":"",` around it, plus the enclosing braces.
const _: () = {
    let mut worst = 2;
    let mut i = 0;
    while i < ConfigField::COUNT {
        let field = ConfigField::ALL[i];
        worst += field.key().len() + 6 + 6 * field.max_len();
        i += 1;
    }
    assert!(worst <= MAX_BODY_SIZE);
    assert!(MAX_BODY_SIZE <= u16::MAX as usize);
};

#[derive(Debug)]
pub enum StoreError<E> {
    Storage(E),
    OutOfBounds,
    RecordTooLarge(usize),
    Decode(serde_json_core::de::Error),
    Encode(serde_json_core::ser::Error),
}

impl<E: fmt::Debug> fmt::Display for StoreError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Storage(e) => write!(f, "Storage access failed: {e:?}"),
            Self::OutOfBounds => write!(f, "Config record does not fit the storage"),
            Self::RecordTooLarge(len) => write!(
                f,
                "Config record body is {len} bytes, at most {MAX_BODY_SIZE} bytes allowed"
            ),
            Self::Decode(e) => write!(f, "Invalid config JSON: {e:?}"),
            Self::Encode(e) => write!(f, "Failed to encode config JSON: {e:?}"),
        }
    }
}

/// The config.json document as written: a view of the current settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PersistedConfig<'a> {
    pub mqtt_server: &'a str,
    pub mqtt_port: &'a str,
    pub mqtt_user: &'a str,
    pub mqtt_pass: &'a str,
    pub unit_id: &'a str,
    pub group_id: &'a str,
}

impl<'a> PersistedConfig<'a> {
    pub fn from_config(config: &'a ConnectionConfig) -> Self {
        Self {
            mqtt_server: config.get(ConfigField::MqttServer),
            mqtt_port: config.get(ConfigField::MqttPort),
            mqtt_user: config.get(ConfigField::MqttUser),
            mqtt_pass: config.get(ConfigField::MqttPass),
            unit_id: config.get(ConfigField::UnitId),
            group_id: config.get(ConfigField::GroupId),
        }
    }

    pub fn encode(&self, buf: &mut [u8]) -> Result<usize, serde_json_core::ser::Error> {
        serde_json_core::to_slice(self, buf)
    }
}

/// One unescaped config.json value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoredValue {
    Text(String<MAX_VALUE_LEN>),
    /// Longer than any field, only the length is kept
    Oversized(usize),
}

impl<'de> Deserialize<'de> for StoredValue {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct ValueVisitor;

        impl Visitor<'_> for ValueVisitor {
            type Value = StoredValue;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a string")
            }

            fn visit_str<E: de::Error>(self, value: &str) -> Result<StoredValue, E> {
                Ok(match String::try_from(value) {
                    Ok(text) => StoredValue::Text(text),
                    Err(()) => StoredValue::Oversized(value.len()),
                })
            }
        }

        deserializer.deserialize_str(ValueVisitor)
    }
}

/// The config.json document as read back: every key is optional, missing
/// keys keep their current value.
#[derive(Debug, Default, Clone, PartialEq, Eq, Deserialize)]
pub struct StoredConfig {
    #[serde(default)]
    pub mqtt_server: Option<StoredValue>,
    #[serde(default)]
    pub mqtt_port: Option<StoredValue>,
    #[serde(default)]
    pub mqtt_user: Option<StoredValue>,
    #[serde(default)]
    pub mqtt_pass: Option<StoredValue>,
    #[serde(default)]
    pub unit_id: Option<StoredValue>,
    #[serde(default)]
    pub group_id: Option<StoredValue>,
}

impl StoredConfig {
    pub fn decode(json: &[u8]) -> Result<Self, serde_json_core::de::Error> {
        // an unescaped value is never longer than the document
        let mut unescape = [0u8; MAX_BODY_SIZE];
        let (config, _) = serde_json_core::from_slice_escaped(json, &mut unescape)?;
        Ok(config)
    }

    pub fn get(&self, field: ConfigField) -> Option<&StoredValue> {
        match field {
            ConfigField::MqttServer => self.mqtt_server.as_ref(),
            ConfigField::MqttPort => self.mqtt_port.as_ref(),
            ConfigField::MqttUser => self.mqtt_user.as_ref(),
            ConfigField::MqttPass => self.mqtt_pass.as_ref(),
            ConfigField::UnitId => self.unit_id.as_ref(),
            ConfigField::GroupId => self.group_id.as_ref(),
        }
    }

    /// Present values as `(key, value)` pairs, ready for provisioning
    pub fn entries(&self) -> impl Iterator<Item = (&'static str, &str)> + '_ {
        ConfigField::ALL
            .into_iter()
            .filter_map(|field| match self.get(field) {
                Some(StoredValue::Text(value)) => Some((field.key(), value.as_str())),
                _ => None,
            })
    }

    /// Values too long for any field, as rejections
    pub fn oversized(&self) -> impl Iterator<Item = Error> + '_ {
        ConfigField::ALL
            .into_iter()
            .filter_map(|field| match self.get(field) {
                Some(StoredValue::Oversized(len)) => Some(Error::ConfigValueTooLong {
                    field,
                    len: *len,
                    max: field.max_len(),
                }),
                _ => None,
            })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Loaded {
    /// No record found, e.g. erased flash
    Empty,
    Applied,
    /// Record applied, some of its values were refused
    Partial(Rejected),
}

/// Keeps the configuration record at a fixed offset of a storage region
pub struct ConfigStore<S> {
    storage: S,
    offset: u32,
}

impl<S> ConfigStore<S>
where
    S: Storage,
    S::Error: fmt::Debug,
{
    pub fn new(storage: S, offset: u32) -> Self {
        Self { storage, offset }
    }

    pub fn release(self) -> S {
        self.storage
    }

    fn check_bounds(&self) -> Result<(), StoreError<S::Error>> {
        let end = (self.offset as usize).checked_add(RECORD_SIZE);
        if end.map_or(true, |end| end > self.storage.capacity()) {
            log::error!(
                "[STORE] Record at offset {} exceeds storage capacity {}",
                self.offset,
                self.storage.capacity()
            );
            return Err(StoreError::OutOfBounds);
        }
        Ok(())
    }

    /// Read the stored record and apply it on top of the identity
    pub fn load(
        &mut self,
        identity: &mut DeviceIdentity,
    ) -> Result<Loaded, StoreError<S::Error>> {
        self.check_bounds()?;

        let mut header = [0u8; HEADER_SIZE];
        self.storage
            .read(self.offset, &mut header)
            .map_err(StoreError::Storage)?;
        if header[..4] != RECORD_MAGIC {
            log::info!("[STORE] No config record at offset {}", self.offset);
            return Ok(Loaded::Empty);
        }
        let len = u16::from_le_bytes([header[4], header[5]]) as usize;
        if len > MAX_BODY_SIZE {
            log::error!("[STORE] Config record length {len} is corrupt");
            return Err(StoreError::RecordTooLarge(len));
        }

        let mut body = [0u8; MAX_BODY_SIZE];
        self.storage
            .read(self.offset + HEADER_SIZE as u32, &mut body[..len])
            .map_err(StoreError::Storage)?;
        let stored = StoredConfig::decode(&body[..len]).map_err(|e| {
            log::error!("[STORE] Config record is not valid JSON: {e:?}");
            StoreError::Decode(e)
        })?;

        let mut rejected = match identity.apply_provisioned(stored.entries()) {
            Ok(()) => Rejected::default(),
            Err(rejected) => rejected,
        };
        for error in stored.oversized() {
            log::warn!("[CFG] {error}");
            rejected.push(error);
        }

        if rejected.is_empty() {
            log::info!("[STORE] Config record loaded ({len} bytes)");
            Ok(Loaded::Applied)
        } else {
            log::warn!("[STORE] Config record partially applied: {rejected}");
            Ok(Loaded::Partial(rejected))
        }
    }

    /// Write the identity's current configuration, returns the record size
    pub fn save(&mut self, identity: &DeviceIdentity) -> Result<usize, StoreError<S::Error>> {
        self.check_bounds()?;

        let mut record = [0u8; RECORD_SIZE];
        let len = PersistedConfig::from_config(identity.config())
            .encode(&mut record[HEADER_SIZE..])
            .map_err(StoreError::Encode)?;
        record[..4].copy_from_slice(&RECORD_MAGIC);
        record[4..HEADER_SIZE].copy_from_slice(&(len as u16).to_le_bytes());

        let size = HEADER_SIZE + len;
        self.storage
            .write(self.offset, &record[..size])
            .map_err(StoreError::Storage)?;
        log::info!("[STORE] Config record saved ({size} bytes)");
        Ok(size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct RamStorage {
        data: [u8; 4096],
    }

    impl RamStorage {
        fn erased() -> Self {
            Self { data: [0xFF; 4096] }
        }
    }

    impl ReadStorage for RamStorage {
        type Error = ();

        fn read(&mut self, offset: u32, bytes: &mut [u8]) -> Result<(), Self::Error> {
            let start = offset as usize;
            let src = self.data.get(start..start + bytes.len()).ok_or(())?;
            bytes.copy_from_slice(src);
            Ok(())
        }

        fn capacity(&self) -> usize {
            self.data.len()
        }
    }

    impl Storage for RamStorage {
        fn write(&mut self, offset: u32, bytes: &[u8]) -> Result<(), Self::Error> {
            let start = offset as usize;
            let dst = self.data.get_mut(start..start + bytes.len()).ok_or(())?;
            dst.copy_from_slice(bytes);
            Ok(())
        }
    }

    #[test]
    fn decodes_partial_document() {
        let json = br#"{"unit_id":"garage","mqtt_port":"8883"}"#;
        let stored = StoredConfig::decode(json).unwrap();
        assert_eq!(stored.mqtt_server, None);
        let entries: Vec<_> = stored.entries().collect();
        assert_eq!(entries, [("mqtt_port", "8883"), ("unit_id", "garage")]);
    }

    #[test]
    fn rejects_malformed_json() {
        assert!(StoredConfig::decode(b"{\"unit_id\":").is_err());
    }

    #[test]
    fn erased_region_is_empty() {
        let mut store = ConfigStore::new(RamStorage::erased(), 0);
        let mut identity = DeviceIdentity::new();
        assert_eq!(store.load(&mut identity).unwrap(), Loaded::Empty);
        assert_eq!(identity.config(), &ConnectionConfig::default());
    }

    #[test]
    fn saved_record_loads_back() {
        let mut identity = DeviceIdentity::new();
        identity
            .apply_provisioned([
                ("mqtt_server", "broker.home"),
                ("mqtt_pass", "hunter2"),
                ("group_id", "upstairs"),
            ])
            .unwrap();

        let mut store = ConfigStore::new(RamStorage::erased(), 128);
        let size = store.save(&identity).unwrap();
        assert!(size > HEADER_SIZE);

        let mut fresh = DeviceIdentity::new();
        assert_eq!(store.load(&mut fresh).unwrap(), Loaded::Applied);
        assert_eq!(fresh.config().mqtt_server(), "broker.home");
        assert_eq!(fresh.config().group_id(), "upstairs");
        assert_eq!(fresh.topics().group_action(), "wesh/group/upstairs/action");
    }

    #[test]
    fn oversized_value_is_partially_applied() {
        let mut storage = RamStorage::erased();
        let body = br#"{"unit_id":"a-very-long-unit-identifier","group_id":"cellar"}"#;
        storage.data[..4].copy_from_slice(&RECORD_MAGIC);
        storage.data[4..6].copy_from_slice(&(body.len() as u16).to_le_bytes());
        storage.data[6..6 + body.len()].copy_from_slice(body);

        let mut store = ConfigStore::new(storage, 0);
        let mut identity = DeviceIdentity::new();
        match store.load(&mut identity).unwrap() {
            Loaded::Partial(rejected) => assert!(rejected.contains(ConfigField::UnitId)),
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(identity.config().unit_id(), "wesh0");
        assert_eq!(identity.config().group_id(), "cellar");
    }

    #[test]
    fn corrupt_length_is_reported() {
        let mut storage = RamStorage::erased();
        storage.data[..4].copy_from_slice(&RECORD_MAGIC);
        storage.data[4..6].copy_from_slice(&2000u16.to_le_bytes());
        let mut store = ConfigStore::new(storage, 0);
        let result = store.load(&mut DeviceIdentity::new());
        assert!(matches!(result, Err(StoreError::RecordTooLarge(2000))));
    }

    #[test]
    fn escaped_credentials_load_back_unchanged() {
        let mut identity = DeviceIdentity::new();
        identity
            .apply_provisioned([("mqtt_user", "a\\b"), ("mqtt_pass", "pa\"ss\\\n")])
            .unwrap();

        let mut store = ConfigStore::new(RamStorage::erased(), 0);
        store.save(&identity).unwrap();

        let mut fresh = DeviceIdentity::new();
        assert_eq!(store.load(&mut fresh).unwrap(), Loaded::Applied);
        assert_eq!(fresh.config().mqtt_user(), Some("a\\b"));
        assert_eq!(fresh.config().mqtt_pass(), Some("pa\"ss\\\n"));
    }

    #[test]
    fn maximal_config_fits_the_record() {
        let server = "\\".repeat(39);
        let user = "\u{1}".repeat(23);
        let pass = "\"".repeat(23);
        let unit = "\u{1f}".repeat(15);
        let group = "\\".repeat(15);
        let mut identity = DeviceIdentity::new();
        identity
            .apply_provisioned([
                ("mqtt_server", server.as_str()),
                ("mqtt_port", "\u{7}\u{7}\u{7}\u{7}\u{7}"),
                ("mqtt_user", user.as_str()),
                ("mqtt_pass", pass.as_str()),
                ("unit_id", unit.as_str()),
                ("group_id", group.as_str()),
            ])
            .unwrap();

        let mut store = ConfigStore::new(RamStorage::erased(), 0);
        let size = store.save(&identity).unwrap();
        assert!(size <= RECORD_SIZE);

        let mut fresh = DeviceIdentity::new();
        assert_eq!(store.load(&mut fresh).unwrap(), Loaded::Applied);
        assert_eq!(fresh.config(), identity.config());
    }

    #[test]
    fn value_longer_than_any_field_is_rejected() {
        let mut storage = RamStorage::erased();
        let long = "p".repeat(60);
        let body = format!(r#"{{"mqtt_pass":"{long}","unit_id":"shed"}}"#);
        storage.data[..4].copy_from_slice(&RECORD_MAGIC);
        storage.data[4..6].copy_from_slice(&(body.len() as u16).to_le_bytes());
        storage.data[6..6 + body.len()].copy_from_slice(body.as_bytes());

        let mut store = ConfigStore::new(storage, 0);
        let mut identity = DeviceIdentity::new();
        match store.load(&mut identity).unwrap() {
            Loaded::Partial(rejected) => {
                assert_eq!(
                    rejected.iter().next(),
                    Some(&Error::ConfigValueTooLong {
                        field: ConfigField::MqttPass,
                        len: 60,
                        max: 23,
                    })
                );
            }
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(identity.config().mqtt_pass(), None);
        assert_eq!(identity.config().unit_id(), "shed");
    }

    #[test]
    fn offset_near_address_limit_is_refused() {
        let mut store = ConfigStore::new(RamStorage::erased(), u32::MAX - 2);
        let result = store.load(&mut DeviceIdentity::new());
        assert!(matches!(result, Err(StoreError::OutOfBounds)));
    }

    #[test]
    fn record_past_capacity_is_refused() {
        let mut store = ConfigStore::new(RamStorage::erased(), 3500);
        let result = store.save(&DeviceIdentity::new());
        assert!(matches!(result, Err(StoreError::OutOfBounds)));
    }
}
