// Runtime parameters
pub const DEFAULT_NUM_THREADS: usize = 3;
pub const DEFAULT_OUT_FILE: &'static str = "./out.ppm";

// Floating point comparisons
pub const FEQ_EPSILON: f64 = 0.000001;
pub const ZERO_EPSILON: f64 = 1e-10;

// Distance a secondary ray origin is moved off its surface
pub const DELTA: f64 = 0.1;

// Recursion limits for global effects
pub const MAX_CALC_COLOR_LEVEL: usize = 10;
pub const MIN_CALC_COLOR_K: f64 = 0.001;

// Seeds for the per-light area jitter and the per-pixel sample jitter
pub const AREA_SAMPLE_SEED: u64 = 0x5eed_11e5;
pub const PIXEL_SAMPLE_SEED: u64 = 0x91e1_5eed;

// Percentage step between progress reports
pub const PROGRESS_STEP: usize = 10;
