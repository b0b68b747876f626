mod lot_resolver;

pub use lot_resolver::{is_quantity_significant, resolve, Lot, LotResolution};
