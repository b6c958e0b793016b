/// Minimum pixel count (h*w) to use row-level Rayon parallelism.
pub const PARALLEL_PIXEL_THRESHOLD: usize = 65_536;

/// Upper bound of the normalized display range.
pub const NORMALIZED_MAX: f64 = 65_535.0;

/// Number of channels in a composite frame (one per measurement unit).
pub const COMPOSITE_CHANNEL_COUNT: usize = 3;

/// Measurement units a thermal sequence must support to build RGB frames.
pub const REQUIRED_UNIT_COUNT: usize = COMPOSITE_CHANNEL_COUNT;

/// Default equal-pixel ratio below which a frame counts as changed.
pub const DEFAULT_SIMILARITY_THRESHOLD: f64 = 0.8;

/// Default interval for interval-mode extraction (every frame).
pub const DEFAULT_INTERVAL: usize = 1;

/// Offset between kelvin and degrees Celsius.
pub const KELVIN_OFFSET: f64 = 273.15;

/// Temperature samples are stored as centi-kelvin.
pub const TEMPERATURE_SCALE: f64 = 100.0;
