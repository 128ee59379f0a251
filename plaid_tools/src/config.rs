use std::{fmt, fmt::Display, str::FromStr};

use fsb_common::Secret;
use log::*;
use serde::{Deserialize, Serialize};

use crate::PlaidApiError;

pub const DEFAULT_CLIENT_NAME: &str = "FinSight";
pub const DEFAULT_LANGUAGE: &str = "en";
pub const DEFAULT_PRODUCTS: &str = "transactions,auth";
pub const DEFAULT_COUNTRY_CODES: &str = "US";

/// The aggregator environment to run against. Each environment maps to a fixed API host; there is no free-form
/// host configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PlaidEnvironment {
    #[default]
    Sandbox,
    Development,
    Production,
}

impl PlaidEnvironment {
    pub fn base_url(&self) -> &'static str {
        match self {
            PlaidEnvironment::Sandbox => "https://sandbox.plaid.com",
            PlaidEnvironment::Development => "https://development.plaid.com",
            PlaidEnvironment::Production => "https://production.plaid.com",
        }
    }
}

impl FromStr for PlaidEnvironment {
    type Err = PlaidApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "sandbox" => Ok(PlaidEnvironment::Sandbox),
            "development" => Ok(PlaidEnvironment::Development),
            "production" => Ok(PlaidEnvironment::Production),
            other => Err(PlaidApiError::Config(format!("{other} is not a valid aggregator environment"))),
        }
    }
}

impl Display for PlaidEnvironment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PlaidEnvironment::Sandbox => "sandbox",
            PlaidEnvironment::Development => "development",
            PlaidEnvironment::Production => "production",
        };
        f.write_str(s)
    }
}

/// The closed set of aggregator products this backend can request. Configured product strings must map onto one of
/// these variants; unknown strings are a configuration error, never silently dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Product {
    Auth,
    Transactions,
    Identity,
    Assets,
    Investments,
    Liabilities,
}

impl FromStr for Product {
    type Err = PlaidApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "auth" => Ok(Product::Auth),
            "transactions" => Ok(Product::Transactions),
            "identity" => Ok(Product::Identity),
            "assets" => Ok(Product::Assets),
            "investments" => Ok(Product::Investments),
            "liabilities" => Ok(Product::Liabilities),
            other => Err(PlaidApiError::Config(format!("{other} is not a supported aggregator product"))),
        }
    }
}

impl Display for Product {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Product::Auth => "auth",
            Product::Transactions => "transactions",
            Product::Identity => "identity",
            Product::Assets => "assets",
            Product::Investments => "investments",
            Product::Liabilities => "liabilities",
        };
        f.write_str(s)
    }
}

/// The closed set of country codes the linking UI may be scoped to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CountryCode {
    Us,
    Gb,
    Ca,
    De,
    Fr,
    Es,
    Nl,
    Ie,
}

impl FromStr for CountryCode {
    type Err = PlaidApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "US" => Ok(CountryCode::Us),
            "GB" => Ok(CountryCode::Gb),
            "CA" => Ok(CountryCode::Ca),
            "DE" => Ok(CountryCode::De),
            "FR" => Ok(CountryCode::Fr),
            "ES" => Ok(CountryCode::Es),
            "NL" => Ok(CountryCode::Nl),
            "IE" => Ok(CountryCode::Ie),
            other => Err(PlaidApiError::Config(format!("{other} is not a supported country code"))),
        }
    }
}

impl Display for CountryCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CountryCode::Us => "US",
            CountryCode::Gb => "GB",
            CountryCode::Ca => "CA",
            CountryCode::De => "DE",
            CountryCode::Fr => "FR",
            CountryCode::Es => "ES",
            CountryCode::Nl => "NL",
            CountryCode::Ie => "IE",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Default)]
pub struct PlaidConfig {
    pub environment: PlaidEnvironment,
    pub client_id: String,
    pub secret: Secret<String>,
    /// The application name shown to the end user in the aggregator's linking UI.
    pub client_name: String,
    pub products: Vec<Product>,
    pub country_codes: Vec<CountryCode>,
    pub language: String,
}

impl PlaidConfig {
    /// Loads the aggregator configuration from environment variables. Missing credentials produce warnings and
    /// useless defaults (the aggregator will reject them at request time); an unrecognised environment, product or
    /// country code is a hard error.
    pub fn try_from_env() -> Result<Self, PlaidApiError> {
        let environment = match std::env::var("FSB_PLAID_ENV") {
            Ok(s) => s.parse::<PlaidEnvironment>()?,
            Err(_) => {
                warn!("FSB_PLAID_ENV not set, using sandbox as default");
                PlaidEnvironment::Sandbox
            },
        };
        let client_id = std::env::var("FSB_PLAID_CLIENT_ID").unwrap_or_else(|_| {
            warn!("FSB_PLAID_CLIENT_ID not set, using (probably useless) default");
            String::default()
        });
        let secret = Secret::new(std::env::var("FSB_PLAID_SECRET").unwrap_or_else(|_| {
            warn!("FSB_PLAID_SECRET not set, using (probably useless) default");
            String::default()
        }));
        let client_name = std::env::var("FSB_PLAID_CLIENT_NAME").unwrap_or_else(|_| DEFAULT_CLIENT_NAME.to_string());
        let products = parse_products(&std::env::var("FSB_PLAID_PRODUCTS").unwrap_or_else(|_| {
            info!("FSB_PLAID_PRODUCTS not set, using '{DEFAULT_PRODUCTS}' as default");
            DEFAULT_PRODUCTS.to_string()
        }))?;
        let country_codes = parse_country_codes(&std::env::var("FSB_PLAID_COUNTRY_CODES").unwrap_or_else(|_| {
            info!("FSB_PLAID_COUNTRY_CODES not set, using '{DEFAULT_COUNTRY_CODES}' as default");
            DEFAULT_COUNTRY_CODES.to_string()
        }))?;
        let language = std::env::var("FSB_PLAID_LANGUAGE").unwrap_or_else(|_| DEFAULT_LANGUAGE.to_string());
        Ok(Self { environment, client_id, secret, client_name, products, country_codes, language })
    }
}

/// Maps a comma-separated product list onto the closed [`Product`] set.
pub fn parse_products(s: &str) -> Result<Vec<Product>, PlaidApiError> {
    let products =
        s.split(',').map(str::trim).filter(|p| !p.is_empty()).map(Product::from_str).collect::<Result<Vec<_>, _>>()?;
    if products.is_empty() {
        return Err(PlaidApiError::Config("at least one aggregator product must be configured".to_string()));
    }
    Ok(products)
}

/// Maps a comma-separated country-code list onto the closed [`CountryCode`] set.
pub fn parse_country_codes(s: &str) -> Result<Vec<CountryCode>, PlaidApiError> {
    let codes = s
        .split(',')
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .map(CountryCode::from_str)
        .collect::<Result<Vec<_>, _>>()?;
    if codes.is_empty() {
        return Err(PlaidApiError::Config("at least one country code must be configured".to_string()));
    }
    Ok(codes)
}
