// Height of the horizontal stripes every coding pass scans (ISO/IEC 15444-1, D.1).
pub const STRIPE_HEIGHT: usize = 4;

// Number of arithmetic coder contexts used by the bit-plane passes.
pub const NUM_CONTEXTS: usize = 19;

// Context labels. Zero coding uses 0..=8, sign coding 10..=14 and magnitude
// refinement 15..=17.
pub const RUN_LENGTH_CONTEXT: usize = 9;
pub const UNIFORM_CONTEXT: usize = 18;

// Context map values for significant coefficients.
pub const SIGNIFICANT_ISOLATED: i8 = 15;
pub const SIGNIFICANT_WITH_NEIGHBOR: i8 = 16;
pub const REFINED: i8 = 17;

// Largest zero coding label a not-yet-significant coefficient can carry.
pub const MAX_ZERO_CODING_CONTEXT: i8 = 8;

// Startup probability states (ISO/IEC 15444-1, table D.7).
pub const ZERO_CODING_START_STATE: u8 = 4;
pub const RUN_LENGTH_START_STATE: u8 = 3;
pub const UNIFORM_START_STATE: u8 = 46;

// With selective arithmetic coding bypass the significance propagation and
// magnitude refinement passes from this index on are raw coded.
pub const FIRST_BYPASS_PASS: usize = 10;

// Code-block limits from ISO/IEC 15444-1, A.6.1.
pub const MAXIMUM_CODE_BLOCK_DIMENSION: u32 = 1024;
pub const MAXIMUM_CODE_BLOCK_AREA: u32 = 4096;

// Magnitudes are accumulated in a u32 with a half-step bit below the current plane.
pub const MAXIMUM_BIT_PLANE: i32 = 30;

// Symbol sequence terminating a cleanup pass when segmentation symbols are enabled.
pub const SEGMENTATION_SYMBOL: u8 = 0b1010;
