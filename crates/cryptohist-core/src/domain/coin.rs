use std::fmt::{Display, Formatter};

use crate::ValidationError;

const MAX_COIN_LEN: usize = 64;

/// Upstream coin identifier such as `btc-bitcoin`, normalized to lowercase.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Coin(String);

impl Coin {
    /// Parse and normalize a coin id.
    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::EmptyCoin);
        }

        let normalized = trimmed.to_ascii_lowercase();
        let len = normalized.chars().count();
        if len > MAX_COIN_LEN {
            return Err(ValidationError::CoinTooLong {
                len,
                max: MAX_COIN_LEN,
            });
        }

        if let Some(first) = normalized.chars().next() {
            if !first.is_ascii_alphanumeric() {
                return Err(ValidationError::CoinInvalidStart { ch: first });
            }
        }

        for (index, ch) in normalized.chars().enumerate() {
            let valid = ch.is_ascii_alphanumeric() || ch == '-' || ch == '_';
            if !valid {
                return Err(ValidationError::CoinInvalidChar { ch, index });
            }
        }

        Ok(Self(normalized))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for Coin {
    fn default() -> Self {
        Self(String::from(crate::DEFAULT_COIN))
    }
}

impl Display for Coin {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<String> for Coin {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl TryFrom<&str> for Coin {
    type Error = ValidationError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<Coin> for String {
    fn from(value: Coin) -> Self {
        value.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_and_normalizes_coin() {
        let parsed = Coin::parse(" BTC-Bitcoin ").expect("coin should parse");
        assert_eq!(parsed.as_str(), "btc-bitcoin");
    }

    #[test]
    fn default_is_bitcoin() {
        assert_eq!(Coin::default().as_str(), "btc-bitcoin");
    }

    #[test]
    fn rejects_path_characters() {
        let err = Coin::parse("btc/../eth").expect_err("must fail");
        assert!(matches!(err, ValidationError::CoinInvalidChar { ch: '/', index: 3 }));
    }

    #[test]
    fn rejects_invalid_start() {
        let err = Coin::parse("-btc").expect_err("must fail");
        assert!(matches!(err, ValidationError::CoinInvalidStart { .. }));
    }

    #[test]
    fn converts_to_and_from_strings() {
        let coin = Coin::try_from(String::from("ETH-Ethereum")).expect("coin");
        assert_eq!(String::from(coin), "eth-ethereum");
        assert!(Coin::try_from("").is_err());
    }
}
