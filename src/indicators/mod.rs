// =============================================================================
// Indicator Calculator
// =============================================================================
//
// Pure, side-effect-free functions mapping a validated `Series` to
// index-aligned indicator sequences. Insufficient history never errors here:
// RSI falls back to a neutral 50.0 sequence, MACD to all-zero sequences, and
// moving averages simply leave undefined indices as NaN for callers to treat
// as "not yet comparable".

pub mod ema;
pub mod macd;
pub mod rsi;
pub mod sma;

pub use macd::{macd, MacdSeries};
pub use rsi::rsi;
pub use sma::{moving_averages, MovingAverages};
