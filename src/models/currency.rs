//! Supported currencies and the smallest-unit conversion table.
//!
//! Payment providers charge in integer minor units (cents for most
//! currencies, whole dong for VND). The table below is the only place the
//! multiplier exists; intent creation, confirmation verification and both
//! gateway adapters all call through [`to_minor_units`], so the two charge
//! paths cannot drift apart.

use std::fmt;
use std::str::FromStr;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::errors::ServiceError;

/// Charges below this many minor units (roughly one unit of major
/// currency) are rejected outright.
pub const MIN_CHARGE_MINOR_UNITS: i64 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    Myr,
    Inr,
    Usd,
    Sgd,
    Vnd,
}

impl Currency {
    /// Minor units per major unit. VND is the one zero-decimal currency in
    /// the supported set.
    pub fn minor_unit_multiplier(self) -> i64 {
        match self {
            Currency::Vnd => 1,
            _ => 100,
        }
    }

    pub fn code(self) -> &'static str {
        match self {
            Currency::Myr => "MYR",
            Currency::Inr => "INR",
            Currency::Usd => "USD",
            Currency::Sgd => "SGD",
            Currency::Vnd => "VND",
        }
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Currency {
    type Err = ServiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "MYR" => Ok(Currency::Myr),
            "INR" => Ok(Currency::Inr),
            "USD" => Ok(Currency::Usd),
            "SGD" => Ok(Currency::Sgd),
            "VND" => Ok(Currency::Vnd),
            other => Err(ServiceError::ValidationError(format!(
                "unsupported currency code: {other}"
            ))),
        }
    }
}

/// Converts a decimal amount into the provider's smallest currency unit,
/// rounding to the nearest integer (half away from zero).
pub fn to_minor_units(amount: Decimal, currency: Currency) -> Result<i64, ServiceError> {
    let scaled = amount * Decimal::from(currency.minor_unit_multiplier());
    scaled
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_i64()
        .ok_or_else(|| {
            ServiceError::ValidationError(format!(
                "amount {amount} {currency} is outside the chargeable range"
            ))
        })
}

/// Inverse of [`to_minor_units`]; used when reporting provider-settled
/// amounts back in major units.
pub fn from_minor_units(minor_units: i64, currency: Currency) -> Decimal {
    Decimal::from(minor_units) / Decimal::from(currency.minor_unit_multiplier())
}
