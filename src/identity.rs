use log::{info, warn};

use crate::cfg::connection::ConnectionConfig;
use crate::cfg::field::ConfigField;
use crate::cfg::portal::{portal_parameters, PortalParameter};
use crate::error::{Error, Rejected};
use crate::topic::registry::SubscriptionRegistry;
use crate::topic::topics::{TopicKind, TopicSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Built-in defaults, nothing provisioned yet
    Default,
    /// At least one value came from config.json or the portal
    Provisioned,
}

/// Device identity and topic registry.
///
/// Owns the connection settings, the topics derived from them and the list
/// of active subscriptions. Startup code provisions it through `&mut`; the
/// MQTT client afterwards only gets a shared borrow.
#[derive(Debug, Clone)]
pub struct DeviceIdentity {
    config: ConnectionConfig,
    topics: TopicSet,
    subscriptions: SubscriptionRegistry,
    phase: Phase,
}

impl Default for DeviceIdentity {
    fn default() -> Self {
        Self::new()
    }
}

impl DeviceIdentity {
    /// Identity with default settings and topics already built
    pub fn new() -> Self {
        let config = ConnectionConfig::default();
        let topics = TopicSet::from_config(&config);
        Self {
            config,
            topics,
            subscriptions: SubscriptionRegistry::new(),
            phase: Phase::Default,
        }
    }

    /// Reset the configuration to its defaults and rebuild the topics
    pub fn load_defaults(&mut self) {
        self.config.load_defaults();
        self.build_topics();
        self.phase = Phase::Default;
        info!("[CFG] Defaults loaded");
    }

    /// Apply provisioned `(key, value)` pairs.
    ///
    /// Values that do not fit their field are rejected one by one while the
    /// rest still get applied. Unknown keys are skipped. Topics are rebuilt
    /// when the unit or group id changed.
    pub fn apply_provisioned<'k, 'v, I>(&mut self, values: I) -> Result<(), Rejected>
    where
        I: IntoIterator<Item = (&'k str, &'v str)>,
    {
        let mut rejected = Rejected::default();
        let mut accepted = 0usize;
        let mut identifiers_changed = false;

        for (key, value) in values {
            let Some(field) = ConfigField::from_key(key) else {
                warn!("[CFG] Ignoring unknown key {key:?}");
                continue;
            };
            let changed = self.config.get(field) != value;
            match self.config.set(field, value) {
                Ok(()) => {
                    accepted += 1;
                    identifiers_changed |= changed && field.is_identifier();
                    if field.is_secret() {
                        info!("[CFG] {field} set");
                    } else {
                        info!("[CFG] {field} = {value:?}");
                    }
                }
                Err(e) => {
                    warn!("[CFG] {e}");
                    rejected.push(e);
                }
            }
        }

        if accepted > 0 {
            self.phase = Phase::Provisioned;
        }
        if identifiers_changed {
            self.build_topics();
        }

        if rejected.is_empty() {
            Ok(())
        } else {
            Err(rejected)
        }
    }

    /// Derive every topic from the current unit and group id
    pub fn build_topics(&mut self) {
        self.topics.build(&self.config);
    }

    pub fn register_subscription(&mut self, kind: TopicKind) -> Result<(), Error> {
        self.subscriptions.register(kind)
    }

    /// Registered topics in subscribe order. The iterator can be cloned to
    /// walk the list again.
    pub fn list_subscriptions(&self) -> Subscriptions<'_> {
        Subscriptions {
            topics: &self.topics,
            kinds: self.subscriptions.kinds().iter(),
        }
    }

    pub fn clear_subscriptions(&mut self) {
        info!(
            "[SUB] Clearing {} registered subscription(s)",
            self.subscriptions.len()
        );
        self.subscriptions.clear();
    }

    /// Copy of the current settings, to roll back an aborted provisioning
    pub fn snapshot(&self) -> ConnectionConfig {
        self.config.clone()
    }

    pub fn restore(&mut self, config: ConnectionConfig) {
        self.config = config;
        self.build_topics();
        info!("[CFG] Configuration restored");
    }

    pub fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    pub fn topics(&self) -> &TopicSet {
        &self.topics
    }

    pub fn topic(&self, kind: TopicKind) -> &str {
        self.topics.get(kind)
    }

    pub fn subscriptions(&self) -> &SubscriptionRegistry {
        &self.subscriptions
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn portal_parameters(&self) -> impl Iterator<Item = PortalParameter<'_>> + Clone {
        portal_parameters(&self.config)
    }
}

/// Iterator over the registered subscription topics
#[derive(Debug, Clone)]
pub struct Subscriptions<'a> {
    topics: &'a TopicSet,
    kinds: core::slice::Iter<'a, TopicKind>,
}

impl<'a> Iterator for Subscriptions<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<Self::Item> {
        self.kinds.next().map(|kind| self.topics.get(*kind))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.kinds.size_hint()
    }
}

impl ExactSizeIterator for Subscriptions<'_> {}
