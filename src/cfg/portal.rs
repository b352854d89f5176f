use crate::cfg::connection::ConnectionConfig;
use crate::cfg::field::ConfigField;

/// One extra input of the Wi-Fi captive portal form.
///
/// `length` is the size of the firmware input buffer, one byte more than
/// the longest accepted value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PortalParameter<'a> {
    pub id: &'static str,
    pub label: &'static str,
    pub value: &'a str,
    pub length: usize,
}

impl<'a> PortalParameter<'a> {
    pub fn new(field: ConfigField, config: &'a ConnectionConfig) -> Self {
        Self {
            id: field.key(),
            label: field.label(),
            value: config.get(field),
            length: field.max_len() + 1,
        }
    }

    pub fn field(&self) -> Option<ConfigField> {
        ConfigField::from_key(self.id)
    }
}

/// Portal parameters prefilled with the current configuration, in form order
pub fn portal_parameters(
    config: &ConnectionConfig,
) -> impl Iterator<Item = PortalParameter<'_>> + Clone {
    ConfigField::ALL
        .into_iter()
        .map(move |field| PortalParameter::new(field, config))
}
