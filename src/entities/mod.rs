mod fare;
mod location;
mod package;
mod preview;
mod route;
mod trip;

pub use fare::{FareOffer, Status as FareStatus};
pub use location::Coordinates;
pub use package::{Package, PackageCatalog};
pub use preview::TripPreview;
pub use route::Route;
pub use trip::{Status as TripStatus, Trip};

#[cfg(test)]
pub(crate) use fare::test_offer;
