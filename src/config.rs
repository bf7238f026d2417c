use std::env;
use std::fmt::Display;
use std::net::SocketAddr;
use std::str::FromStr;

use crate::entities::PackageCatalog;
use crate::error::Error;
use crate::pricing::PricingConfig;

/// One week.
pub const MAX_FARE_TTL_MINUTES: i64 = 7 * 24 * 60;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RoutingProvider {
    Osrm,
    StraightLine,
}

impl FromStr for RoutingProvider {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "osrm" => Ok(Self::Osrm),
            "straight_line" => Ok(Self::StraightLine),
            _ => Err(Error::Environment(format!("unknown routing provider: {}", s))),
        }
    }
}

#[derive(Clone, Debug)]
pub struct Config {
    pub http_addr: SocketAddr,
    pub routing_provider: RoutingProvider,
    pub osrm_api_base: String,
    pub engine: EngineConfig,
}

/// Tunables of the negotiation engine.
#[derive(Clone, Debug)]
pub struct EngineConfig {
    pub fare_ttl: chrono::Duration,
    pub routing_timeout: std::time::Duration,
    pub catalog: PackageCatalog,
    pub pricing: PricingConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            fare_ttl: chrono::Duration::minutes(10),
            routing_timeout: std::time::Duration::from_secs(5),
            catalog: PackageCatalog::default(),
            pricing: PricingConfig::default(),
        }
    }
}

impl Config {
    /// Reads the process environment. Call `dotenv::dotenv()` first to pick up a `.env` file.
    pub fn from_env() -> Result<Self, Error> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = EngineConfig::default();

        let fare_ttl_minutes: i64 = parse_or(&lookup, "FARE_TTL_MINUTES", 10)?;
        let routing_timeout_seconds: u64 = parse_or(&lookup, "ROUTING_TIMEOUT_SECONDS", 5)?;

        if !(1..=MAX_FARE_TTL_MINUTES).contains(&fare_ttl_minutes) {
            return Err(Error::Environment(format!(
                "FARE_TTL_MINUTES must be within 1..={}",
                MAX_FARE_TTL_MINUTES
            )));
        }

        if routing_timeout_seconds == 0 {
            return Err(Error::Environment("ROUTING_TIMEOUT_SECONDS must be positive".into()));
        }

        let catalog = match lookup("FARE_BASE_PRICES") {
            Some(value) => value
                .parse()
                .map_err(|err| Error::Environment(format!("FARE_BASE_PRICES: {}", err)))?,
            None => defaults.catalog,
        };

        Ok(Self {
            http_addr: parse_or(&lookup, "HTTP_ADDR", SocketAddr::from(([127, 0, 0, 1], 8083)))?,
            routing_provider: parse_or(&lookup, "ROUTING_PROVIDER", RoutingProvider::Osrm)?,
            osrm_api_base: lookup("OSRM_API_BASE")
                .unwrap_or_else(|| "http://router.project-osrm.org".into()),
            engine: EngineConfig {
                fare_ttl: chrono::Duration::minutes(fare_ttl_minutes),
                routing_timeout: std::time::Duration::from_secs(routing_timeout_seconds),
                catalog,
                pricing: PricingConfig {
                    price_per_meter: parse_rate(
                        &lookup,
                        "PRICE_PER_METER",
                        defaults.pricing.price_per_meter,
                    )?,
                    price_per_second: parse_rate(
                        &lookup,
                        "PRICE_PER_SECOND",
                        defaults.pricing.price_per_second,
                    )?,
                },
            },
        })
    }
}

/// Rates are finite and non-negative.
fn parse_rate<F>(lookup: &F, key: &str, default: f64) -> Result<f64, Error>
where
    F: Fn(&str) -> Option<String>,
{
    let rate: f64 = parse_or(lookup, key, default)?;

    if !rate.is_finite() || rate < 0.0 {
        return Err(Error::Environment(format!(
            "{} must be a finite, non-negative number",
            key
        )));
    }

    Ok(rate)
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T, Error>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: Display,
{
    match lookup(key) {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|err| Error::Environment(format!("{}: {}", key, err))),
        None => Ok(default),
    }
}

#[test]
fn defaults_apply_when_environment_is_empty() {
    let config = Config::from_lookup(|_| None).unwrap();

    assert_eq!(config.http_addr, SocketAddr::from(([127, 0, 0, 1], 8083)));
    assert_eq!(config.routing_provider, RoutingProvider::Osrm);
    assert_eq!(config.osrm_api_base, "http://router.project-osrm.org");
    assert_eq!(config.engine.fare_ttl, chrono::Duration::minutes(10));
    assert_eq!(config.engine.routing_timeout, std::time::Duration::from_secs(5));
    assert_eq!(config.engine.catalog, PackageCatalog::default());
    assert_eq!(config.engine.pricing, PricingConfig::default());
}

#[test]
fn environment_overrides_defaults() {
    use std::collections::HashMap;

    let vars: HashMap<&str, &str> = HashMap::from([
        ("HTTP_ADDR", "0.0.0.0:9000"),
        ("ROUTING_PROVIDER", "straight_line"),
        ("FARE_TTL_MINUTES", "3"),
        ("PRICE_PER_METER", "0.02"),
        ("FARE_BASE_PRICES", "sedan=150,van=350"),
    ]);

    let config = Config::from_lookup(|key| vars.get(key).map(|value| value.to_string())).unwrap();

    assert_eq!(config.http_addr.port(), 9000);
    assert_eq!(config.routing_provider, RoutingProvider::StraightLine);
    assert_eq!(config.engine.fare_ttl, chrono::Duration::minutes(3));
    assert_eq!(config.engine.pricing.price_per_meter, 0.02);
    assert_eq!(config.engine.pricing.price_per_second, 0.05);
    assert_eq!(config.engine.catalog.len(), 2);
}

#[test]
fn malformed_values_fail_startup() {
    let err = Config::from_lookup(|key| (key == "FARE_TTL_MINUTES").then(|| "soon".to_string()))
        .unwrap_err();
    assert!(matches!(err, Error::Environment(_)));

    let err = Config::from_lookup(|key| (key == "FARE_TTL_MINUTES").then(|| "0".to_string()))
        .unwrap_err();
    assert!(matches!(err, Error::Environment(_)));

    let err = Config::from_lookup(|key| (key == "FARE_BASE_PRICES").then(|| "scooter=5".to_string()))
        .unwrap_err();
    assert!(matches!(err, Error::Environment(_)));

    for rate in ["-5", "NaN", "inf"] {
        let err = Config::from_lookup(|key| (key == "PRICE_PER_METER").then(|| rate.to_string()))
            .unwrap_err();
        assert!(matches!(err, Error::Environment(_)), "PRICE_PER_METER={}", rate);

        let err = Config::from_lookup(|key| (key == "PRICE_PER_SECOND").then(|| rate.to_string()))
            .unwrap_err();
        assert!(matches!(err, Error::Environment(_)), "PRICE_PER_SECOND={}", rate);
    }

    let config = Config::from_lookup(|key| (key == "PRICE_PER_SECOND").then(|| "0".to_string()))
        .unwrap();
    assert_eq!(config.engine.pricing.price_per_second, 0.0);
}

#[test]
fn oversized_fare_ttl_fails_startup() {
    for minutes in ["1000000000000", "9223372036854775807"] {
        let err = Config::from_lookup(|key| (key == "FARE_TTL_MINUTES").then(|| minutes.to_string()))
            .unwrap_err();
        assert!(matches!(err, Error::Environment(_)), "FARE_TTL_MINUTES={}", minutes);
    }

    let config = Config::from_lookup(|key| {
        (key == "FARE_TTL_MINUTES").then(|| MAX_FARE_TTL_MINUTES.to_string())
    })
    .unwrap();
    assert_eq!(config.engine.fare_ttl, chrono::Duration::minutes(MAX_FARE_TTL_MINUTES));
}
