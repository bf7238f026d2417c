use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Vehicle service tiers. Declaration order is the catalog order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Package {
    Sedan,
    Suv,
    Van,
    Luxury,
}

impl Package {
    pub fn slug(&self) -> &'static str {
        match self {
            Self::Sedan => "sedan",
            Self::Suv => "suv",
            Self::Van => "van",
            Self::Luxury => "luxury",
        }
    }
}

impl fmt::Display for Package {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

impl FromStr for Package {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sedan" => Ok(Self::Sedan),
            "suv" => Ok(Self::Suv),
            "van" => Ok(Self::Van),
            "luxury" => Ok(Self::Luxury),
            _ => Err(Error::InvalidRequest(format!("unknown package: {}", s))),
        }
    }
}

/// Base price (minor currency units) per offered package, iterated in
/// package order regardless of insertion order.
#[derive(Clone, Debug, PartialEq)]
pub struct PackageCatalog {
    base_prices: BTreeMap<Package, i64>,
}

impl PackageCatalog {
    pub fn new(base_prices: impl IntoIterator<Item = (Package, i64)>) -> Self {
        Self {
            base_prices: base_prices.into_iter().collect(),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (Package, i64)> + '_ {
        self.base_prices.iter().map(|(package, price)| (*package, *price))
    }

    pub fn base_price(&self, package: Package) -> Option<i64> {
        self.base_prices.get(&package).copied()
    }

    pub fn len(&self) -> usize {
        self.base_prices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.base_prices.is_empty()
    }
}

impl Default for PackageCatalog {
    fn default() -> Self {
        Self::new([
            (Package::Sedan, 200),
            (Package::Suv, 300),
            (Package::Van, 400),
            (Package::Luxury, 1000),
        ])
    }
}

/// Parses `sedan=200,suv=300` style lists.
impl FromStr for PackageCatalog {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut base_prices = BTreeMap::new();

        for entry in s.split(',').map(str::trim).filter(|entry| !entry.is_empty()) {
            let (slug, price) = entry
                .split_once('=')
                .ok_or_else(|| Error::InvalidRequest(format!("malformed catalog entry: {}", entry)))?;

            let package: Package = slug.trim().parse()?;
            let price: i64 = price
                .trim()
                .parse()
                .map_err(|_| Error::InvalidRequest(format!("malformed base price: {}", entry)))?;

            if price < 0 {
                return Err(Error::InvalidRequest(format!("negative base price: {}", entry)));
            }

            base_prices.insert(package, price);
        }

        if base_prices.is_empty() {
            return Err(Error::InvalidRequest("catalog is empty".into()));
        }

        Ok(Self { base_prices })
    }
}

#[test]
fn catalog_iterates_in_package_order() {
    let catalog = PackageCatalog::new([
        (Package::Luxury, 1000),
        (Package::Sedan, 200),
        (Package::Van, 400),
    ]);

    let packages: Vec<Package> = catalog.iter().map(|(package, _)| package).collect();
    assert_eq!(packages, vec![Package::Sedan, Package::Van, Package::Luxury]);
}

#[test]
fn catalog_parses_slug_price_pairs() {
    let catalog: PackageCatalog = "suv=300, sedan=200".parse().unwrap();

    assert_eq!(catalog.len(), 2);
    assert_eq!(catalog.base_price(Package::Sedan), Some(200));
    assert_eq!(catalog.base_price(Package::Suv), Some(300));
    assert_eq!(catalog.base_price(Package::Van), None);

    assert!("sedan".parse::<PackageCatalog>().is_err());
    assert!("bicycle=10".parse::<PackageCatalog>().is_err());
    assert!("sedan=-1".parse::<PackageCatalog>().is_err());
    assert!("".parse::<PackageCatalog>().is_err());
}

#[test]
fn package_slugs_round_trip_through_serde() {
    let json = serde_json::to_string(&Package::Luxury).unwrap();
    assert_eq!(json, "\"luxury\"");
    assert_eq!("suv".parse::<Package>().unwrap(), Package::Suv);
}
