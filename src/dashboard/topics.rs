use std::fmt;

/// Logical names of the four values the dashboard shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Sensor {
    Temperature,
    Infrared,
    Servo,
    Led,
}

impl fmt::Display for Sensor {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            Sensor::Temperature => "Temperature",
            Sensor::Infrared => "Infrared",
            Sensor::Servo => "Servo",
            Sensor::Led => "LED",
        };
        write!(f, "{}", name)
    }
}

/// Fixed sensor to topic mapping, never changed at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TopicRegistry {
    entries: [(Sensor, &'static str); 4],
}

impl TopicRegistry {
    pub const DEFAULT: TopicRegistry = TopicRegistry {
        entries: [
            (Sensor::Temperature, "sensor/dht"),
            (Sensor::Infrared, "sensor/infrared"),
            (Sensor::Servo, "aktuator/servo"),
            (Sensor::Led, "aktuator/led"),
        ],
    };

    pub fn topic(&self, sensor: Sensor) -> &'static str {
        self.entries
            .iter()
            .find(|(s, _)| *s == sensor)
            .map(|(_, topic)| *topic)
            .unwrap_or_default()
    }

    /// Exact match only, no wildcards.
    pub fn sensor_for(&self, topic: &str) -> Option<Sensor> {
        self.entries
            .iter()
            .find(|(_, t)| *t == topic)
            .map(|(sensor, _)| *sensor)
    }

    pub fn topics(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.entries.iter().map(|(_, topic)| *topic)
    }

    pub fn sensors(&self) -> impl Iterator<Item = Sensor> + '_ {
        self.entries.iter().map(|(sensor, _)| *sensor)
    }
}

impl Default for TopicRegistry {
    fn default() -> Self {
        Self::DEFAULT
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_is_exact() {
        let registry = TopicRegistry::default();

        assert_eq!(registry.sensor_for("sensor/dht"), Some(Sensor::Temperature));
        assert_eq!(registry.sensor_for("sensor/dht2"), None);
        assert_eq!(registry.sensor_for("sensor/DHT"), None);
        assert_eq!(registry.sensor_for("sensor/#"), None);
        assert_eq!(registry.sensor_for(""), None);
    }

    #[test]
    fn test_every_sensor_has_a_topic() {
        let registry = TopicRegistry::default();
        for sensor in registry.sensors() {
            let topic = registry.topic(sensor);
            assert_eq!(registry.sensor_for(topic), Some(sensor));
        }
        assert_eq!(registry.topics().count(), 4);
    }
}
