/// Network type identification.
///
/// A closed set of four variants: the three networks a node can actually
/// run against, plus `Fakechain`, a test-harness-only network where every
/// protocol version activates at height 0 (never reachable from
/// `from_str`, never constructed outside test code).
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NetworkType {
    Mainnet,
    Testnet,
    Stagenet,
    Fakechain,
}

impl NetworkType {
    /// Human-readable network name (used in logs and the CLI).
    pub fn name(&self) -> &'static str {
        match self {
            NetworkType::Mainnet => "mainnet",
            NetworkType::Testnet => "testnet",
            NetworkType::Stagenet => "stagenet",
            NetworkType::Fakechain => "fakechain",
        }
    }

    /// Parse from a CLI string. `Fakechain` is deliberately not reachable
    /// here — it is constructed directly by test code only.
    pub fn from_str(s: &str) -> Result<Self, String> {
        match s.to_lowercase().as_str() {
            "mainnet" | "main" => Ok(NetworkType::Mainnet),
            "testnet" | "test" => Ok(NetworkType::Testnet),
            "stagenet" | "stage" => Ok(NetworkType::Stagenet),
            _ => Err(format!(
                "Unknown network '{}'. Use 'mainnet', 'testnet', or 'stagenet'.",
                s
            )),
        }
    }
}

impl fmt::Display for NetworkType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_network_type_names() {
        assert_eq!(NetworkType::Testnet.name(), "testnet");
        assert_eq!(NetworkType::Mainnet.name(), "mainnet");
        assert_eq!(NetworkType::Stagenet.name(), "stagenet");
    }

    #[test]
    fn test_parse_network() {
        assert_eq!(NetworkType::from_str("testnet").unwrap(), NetworkType::Testnet);
        assert_eq!(NetworkType::from_str("MAINNET").unwrap(), NetworkType::Mainnet);
        assert_eq!(NetworkType::from_str("test").unwrap(), NetworkType::Testnet);
        assert_eq!(NetworkType::from_str("stage").unwrap(), NetworkType::Stagenet);
        assert!(NetworkType::from_str("invalid").is_err());
        assert!(NetworkType::from_str("fakechain").is_err());
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", NetworkType::Testnet), "testnet");
        assert_eq!(format!("{}", NetworkType::Mainnet), "mainnet");
    }
}
