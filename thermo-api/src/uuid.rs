use alloc::string::{String, ToString};

#[cfg(feature = "std")]
use uuid::Uuid;

/// Source of the `id` field carried by each notification.
pub trait IdGenerator: Send + Sync {
    /// Produce the identifier for the next message
    fn generate(&self) -> String;
}

/// Fresh random identifier per message, so every notification is a distinct event.
#[cfg(feature = "std")]
#[derive(Debug, Clone, Default)]
pub struct RandomUuidGenerator;

#[cfg(feature = "std")]
impl IdGenerator for RandomUuidGenerator {
    fn generate(&self) -> String {
        Uuid::new_v4().to_string()
    }
}

/// Stable identifier, so all notifications belong to one logical stream.
#[derive(Debug, Clone)]
pub struct FixedIdGenerator {
    id: String,
}

impl FixedIdGenerator {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }
}

impl IdGenerator for FixedIdGenerator {
    fn generate(&self) -> String {
        self.id.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_unique_uuids() {
        let generator = RandomUuidGenerator;

        let id1 = generator.generate();
        let id2 = generator.generate();

        assert_ne!(id1, id2, "Identifiers should be unique");
        assert!(Uuid::parse_str(&id1).is_ok());
    }

    #[test]
    fn test_fixed_id_is_stable() {
        let generator = FixedIdGenerator::new("raspi-thermo-deadbeef");

        assert_eq!(generator.generate(), "raspi-thermo-deadbeef");
        assert_eq!(generator.generate(), generator.generate());
    }
}
