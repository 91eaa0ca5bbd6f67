/// One sample as produced by the ADC and consumed by the DAC.
pub type Sample = u16;

/// Sample value that corresponds to a silent (DC-centred) signal.
pub const VALUE_ZERO: Sample = 2000;

/// Largest sample value the signal path is expected to reach.
pub const VALUE_RANGE: Sample = 3300;

/// Number of user-facing parameter steps ("percent" scale).
pub const NUMBER_OF_STEPS: u16 = 100;

/// Sample units per parameter step: `VALUE_RANGE / NUMBER_OF_STEPS`.
pub const ADC_STEP: u16 = VALUE_RANGE / NUMBER_OF_STEPS;

/// Capacity of the filter-node pool.
pub const FILTER_POOL_SIZE: usize = 100;

/// Capacity of the execution-queue link pool.
pub const QUEUE_POOL_SIZE: usize = 100;

/// Samples per sample-arena block. Buffer requests are rounded up to this.
pub const BUF_BLOCK_LENGTH: usize = 1 << 7;

/// Blocks in the primary sample region.
pub const PRIMARY_REGION_BLOCKS: usize = 36;

/// Blocks in the secondary sample region, used once the primary is full.
pub const SECONDARY_REGION_BLOCKS: usize = (1 << 14) / BUF_BLOCK_LENGTH;

/// Fields per specification record.
pub const RECORD_FIELDS: usize = 8;

/// Largest number of records one graph specification may carry.
pub const MAX_RECORDS: usize = FILTER_POOL_SIZE;

/// Number of slots offered by the configuration store.
pub const STORAGE_SLOTS: usize = 10;

/// Tick rate in Hz used until the command layer sets another.
pub const DEFAULT_TICK_RATE: u32 = 20_000;

/// History kept by most filter kinds.
pub const REGULAR_HISTORY: usize = 16;

/// History kept by delay and reverb, bounding their longest lag.
pub const DELAY_HISTORY: usize = 4096;

/// History kept by flange, bounding its sweep depth.
pub const FLANGE_HISTORY: usize = 256;

/// History kept by the biquad family.
pub const BIQUAD_HISTORY: usize = 32;

/// History kept by the noise gate's averaging window.
pub const NOISE_HISTORY: usize = 2048;
