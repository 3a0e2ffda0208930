//! Glasscalc Calculation Engine
//!
//! Turns discrete key presses into a formatted display string with
//! classic four-function, left-to-right semantics.
//!
//! # Example
//!
//! ```rust
//! use glasscalc_calc::{CalculationEngine, Operator};
//!
//! let mut engine = CalculationEngine::new();
//! engine.input_digit('3');
//! engine.input_operator(Operator::Add);
//! engine.input_digit('4');
//! engine.input_operator(Operator::Multiply);
//! engine.input_digit('2');
//! engine.calculate();
//!
//! assert_eq!(engine.display(), "14");
//! ```

pub mod engine;
pub mod error;
pub mod features;
pub mod format;
pub mod history;
pub mod operator;

pub use engine::{CalculationEngine, CalculationState, Key};
pub use error::{CalcError, CalcResult};
pub use format::{format_value, normalize, parse_display, ERROR_DISPLAY, MAX_DIGITS};
pub use history::{Category, CountingUsage, HistoryEntry, HistorySink, InMemoryHistory, UsageCounter};
pub use operator::Operator;
