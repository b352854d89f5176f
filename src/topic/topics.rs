use core::fmt::Write;

use heapless::String;
use log::{error, info};

use crate::cfg::connection::ConnectionConfig;
use crate::cfg::net_cfg::{GROUP_ID_LEN, UNIT_ID_LEN};

pub const TOPIC_ROOT: &str = "wesh";
pub const TOPIC_LEN: usize = 48;

pub type Topic = String<TOPIC_LEN>;

/// Which identifier a topic is namespaced by
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    /// `wesh/{unit_id}/...`
    Unit,
    /// `wesh/group/{group_id}/...`
    Group,
    /// `wesh/node/{unit_id}/...`
    Node,
}

impl Scope {
    const fn prefix(&self) -> &'static str {
        match self {
            Scope::Unit => "",
            Scope::Group => "group/",
            Scope::Node => "node/",
        }
    }

    const fn id_len(&self) -> usize {
        match self {
            Scope::Group => GROUP_ID_LEN,
            Scope::Unit | Scope::Node => UNIT_ID_LEN,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TopicKind {
    /// published when the switch is touched
    Event,
    /// published when the switch was long touched
    GroupEvent,
    /// published when the relay changes state without a touch
    Status,
    SensorTemperature,
    SensorHumidity,
    SensorPressure,
    /// node status, answer to a ping
    PongStatus,
    /// node meta data, answer to a ping
    PongMeta,
    PingSubscribe,
    /// relay commands for this unit
    ActionSubscribe,
    /// relay commands for the whole group
    GroupActionSubscribe,
    /// LED matrix data "SXYXYXY", S=0 off, S=1 on, x/y = 0..7
    MatrixActionSubscribe,
    AccelActionSubscribe,
}

impl TopicKind {
    pub const COUNT: usize = 13;

    pub const ALL: [TopicKind; Self::COUNT] = [
        TopicKind::Event,
        TopicKind::GroupEvent,
        TopicKind::Status,
        TopicKind::SensorTemperature,
        TopicKind::SensorHumidity,
        TopicKind::SensorPressure,
        TopicKind::PongStatus,
        TopicKind::PongMeta,
        TopicKind::PingSubscribe,
        TopicKind::ActionSubscribe,
        TopicKind::GroupActionSubscribe,
        TopicKind::MatrixActionSubscribe,
        TopicKind::AccelActionSubscribe,
    ];

    /// Topics the node subscribes to after connecting, in subscribe order
    pub const SUBSCRIBED: [TopicKind; 5] = [
        TopicKind::PingSubscribe,
        TopicKind::ActionSubscribe,
        TopicKind::GroupActionSubscribe,
        TopicKind::MatrixActionSubscribe,
        TopicKind::AccelActionSubscribe,
    ];

    pub const fn scope(&self) -> Scope {
        match self {
            TopicKind::GroupEvent | TopicKind::GroupActionSubscribe => Scope::Group,
            TopicKind::PongStatus | TopicKind::PongMeta => Scope::Node,
            _ => Scope::Unit,
        }
    }

    pub const fn suffix(&self) -> &'static str {
        match self {
            TopicKind::Event | TopicKind::GroupEvent => "event",
            TopicKind::Status | TopicKind::PongStatus => "status",
            TopicKind::SensorTemperature => "sensor/temperature",
            TopicKind::SensorHumidity => "sensor/humidity",
            TopicKind::SensorPressure => "sensor/pressure",
            TopicKind::PongMeta => "meta",
            TopicKind::PingSubscribe => "ping",
            TopicKind::ActionSubscribe | TopicKind::GroupActionSubscribe => "action",
            TopicKind::MatrixActionSubscribe => "matrix/action",
            TopicKind::AccelActionSubscribe => "accel/action",
        }
    }

    pub const fn is_subscription(&self) -> bool {
        matches!(
            self,
            TopicKind::PingSubscribe
                | TopicKind::ActionSubscribe
                | TopicKind::GroupActionSubscribe
                | TopicKind::MatrixActionSubscribe
                | TopicKind::AccelActionSubscribe
        )
    }

    const fn index(&self) -> usize {
        *self as usize
    }

    // root + '/' + prefix + id + '/' + suffix
    const fn max_len(&self) -> usize {
        let scope = self.scope();
        TOPIC_ROOT.len() + 1 + scope.prefix().len() + scope.id_len() + 1 + self.suffix().len()
    }
}

// Every topic fits its buffer for any identifier within the field limits
const _: () = {
    let mut i = 0;
    while i < TopicKind::COUNT {
        assert!(TopicKind::ALL[i].max_len() <= TOPIC_LEN);
        i += 1;
    }
};

/// MQTT topic names derived from the unit and group ids
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicSet {
    topics: [Topic; TopicKind::COUNT],
}

impl TopicSet {
    /// Empty until [`TopicSet::build`] runs
    pub fn new() -> Self {
        Self {
            topics: core::array::from_fn(|_| Topic::new()),
        }
    }

    pub fn from_config(config: &ConnectionConfig) -> Self {
        let mut topics = Self::new();
        topics.build(config);
        topics
    }

    pub fn build(&mut self, config: &ConnectionConfig) {
        for kind in TopicKind::ALL {
            let id = match kind.scope() {
                Scope::Group => config.group_id(),
                Scope::Unit | Scope::Node => config.unit_id(),
            };
            self.topics[kind.index()] = compose(kind, id);
        }
        info!(
            "[TOPIC] Topics built for unit {} group {}",
            config.unit_id(),
            config.group_id()
        );
    }

    pub fn get(&self, kind: TopicKind) -> &str {
        &self.topics[kind.index()]
    }

    pub fn is_built(&self) -> bool {
        self.topics.iter().all(|topic| !topic.is_empty())
    }

    pub fn iter(&self) -> impl Iterator<Item = (TopicKind, &str)> {
        TopicKind::ALL.into_iter().map(|kind| (kind, self.get(kind)))
    }

    pub fn event(&self) -> &str {
        self.get(TopicKind::Event)
    }

    pub fn group_event(&self) -> &str {
        self.get(TopicKind::GroupEvent)
    }

    pub fn status(&self) -> &str {
        self.get(TopicKind::Status)
    }

    pub fn ping(&self) -> &str {
        self.get(TopicKind::PingSubscribe)
    }

    pub fn action(&self) -> &str {
        self.get(TopicKind::ActionSubscribe)
    }

    pub fn group_action(&self) -> &str {
        self.get(TopicKind::GroupActionSubscribe)
    }
}

impl Default for TopicSet {
    fn default() -> Self {
        Self::new()
    }
}

fn compose(kind: TopicKind, id: &str) -> Topic {
    let mut topic = Topic::new();
    if write!(
        &mut topic,
        "{TOPIC_ROOT}/{}{id}/{}",
        kind.scope().prefix(),
        kind.suffix()
    )
    .is_err()
    {
        error!("[TOPIC] Failed to format {kind:?} topic for {id}");
    }
    topic
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cfg::field::ConfigField;

    #[test]
    fn default_topic_layout() {
        let topics = TopicSet::from_config(&ConnectionConfig::default());
        let expected = [
            (TopicKind::Event, "wesh/wesh0/event"),
            (TopicKind::GroupEvent, "wesh/group/weshgrp0/event"),
            (TopicKind::Status, "wesh/wesh0/status"),
            (TopicKind::SensorTemperature, "wesh/wesh0/sensor/temperature"),
            (TopicKind::SensorHumidity, "wesh/wesh0/sensor/humidity"),
            (TopicKind::SensorPressure, "wesh/wesh0/sensor/pressure"),
            (TopicKind::PongStatus, "wesh/node/wesh0/status"),
            (TopicKind::PongMeta, "wesh/node/wesh0/meta"),
            (TopicKind::PingSubscribe, "wesh/wesh0/ping"),
            (TopicKind::ActionSubscribe, "wesh/wesh0/action"),
            (TopicKind::GroupActionSubscribe, "wesh/group/weshgrp0/action"),
            (TopicKind::MatrixActionSubscribe, "wesh/wesh0/matrix/action"),
            (TopicKind::AccelActionSubscribe, "wesh/wesh0/accel/action"),
        ];
        for (kind, topic) in expected {
            assert_eq!(topics.get(kind), topic, "{kind:?}");
        }
    }

    #[test]
    fn longest_ids_fit() {
        let mut config = ConnectionConfig::default();
        config.set(ConfigField::UnitId, &"u".repeat(UNIT_ID_LEN)).unwrap();
        config.set(ConfigField::GroupId, &"g".repeat(GROUP_ID_LEN)).unwrap();
        let topics = TopicSet::from_config(&config);
        assert_eq!(
            topics.get(TopicKind::SensorTemperature),
            format!("wesh/{}/sensor/temperature", "u".repeat(UNIT_ID_LEN))
        );
        assert!(topics.group_action().contains(&"g".repeat(GROUP_ID_LEN)));
    }

    #[test]
    fn new_set_is_not_built() {
        let topics = TopicSet::new();
        assert!(!topics.is_built());
        assert_eq!(topics.event(), "");
    }

    #[test]
    fn subscribed_kinds_are_subscriptions() {
        let count = TopicKind::ALL.iter().filter(|k| k.is_subscription()).count();
        assert_eq!(count, TopicKind::SUBSCRIBED.len());
        assert!(TopicKind::SUBSCRIBED.iter().all(|k| k.is_subscription()));
    }
}
