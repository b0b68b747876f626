/// Account used when the caller does not name one.
pub const DEFAULT_ACCOUNT_ID: &str = "default";

/// Currency every value is reported in unless configured otherwise.
pub const DEFAULT_HOME_CURRENCY: &str = "RUB";

/// Face value assumed for bonds whose nominal is unknown.
pub const DEFAULT_BOND_FACE_VALUE: i64 = 1000;

/// Upper bound for a single quote or reference lookup, in milliseconds.
pub const DEFAULT_LOOKUP_TIMEOUT_MS: u64 = 5000;

/// Decimal precision for display
pub const DISPLAY_DECIMAL_PRECISION: u32 = 2;

/// Quantity threshold below which a position counts as closed.
pub const QUANTITY_THRESHOLD: &str = "0.00000001";

/// How many samples per requested day the unfiltered price history returns.
pub const PRICE_HISTORY_TICKERS_PER_DAY: i64 = 50;

/// Accepted trade date formats, most specific first.
pub const TRADE_DATE_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%d"];
