use serde::{Deserialize, Serialize};

use crate::EngineError;

/// Currency of an account.
///
/// Every amount stored for an account (transactions, saving goals) is an `i64`
/// number of **minor units** of this currency. New accounts default to `EUR`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    #[default]
    Eur,
    Usd,
    Gbp,
    Brl,
}

impl Currency {
    /// Canonical currency code.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Currency::Eur => "EUR",
            Currency::Usd => "USD",
            Currency::Gbp => "GBP",
            Currency::Brl => "BRL",
        }
    }
}

impl core::fmt::Display for Currency {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.code())
    }
}

impl TryFrom<&str> for Currency {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_uppercase().as_str() {
            "EUR" => Ok(Currency::Eur),
            "USD" => Ok(Currency::Usd),
            "GBP" => Ok(Currency::Gbp),
            "BRL" => Ok(Currency::Brl),
            other => Err(EngineError::InvalidInput(format!(
                "unsupported currency: {other}"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_is_case_insensitive() {
        assert_eq!(Currency::try_from(" usd ").unwrap(), Currency::Usd);
        assert_eq!(Currency::try_from("EUR").unwrap(), Currency::Eur);
    }

    #[test]
    fn unknown_code_is_invalid_input() {
        let err = Currency::try_from("XYZ").unwrap_err();
        assert_eq!(
            err,
            EngineError::InvalidInput("unsupported currency: XYZ".to_string())
        );
    }

    #[test]
    fn default_is_eur() {
        assert_eq!(Currency::default().code(), "EUR");
    }
}
