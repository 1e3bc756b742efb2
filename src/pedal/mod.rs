mod core;

pub use self::core::{PedalCapabilities, PedalDirection, PedalMeter, PedalSnapshot};
