//! Immediate-execution calculation engine.
//!
//! Operators are resolved strictly left to right as they are entered:
//! `3 + 4 × 2 =` shows `14`. There is no operator precedence.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use tracing::{debug, error, warn};

use crate::error::CalcError;
use crate::format::{
    digit_count, format_value, is_plain, parse_display, DECIMAL_SEPARATOR, ERROR_DISPLAY,
    MAX_DIGITS,
};
use crate::history::{Category, HistoryEntry, HistorySink, UsageCounter};
use crate::operator::Operator;

/// State behind the calculator display.
#[derive(Debug, Clone, PartialEq)]
pub struct CalculationState {
    /// Canonical on-screen text.
    pub display: String,
    /// Trace of the last operation, display only.
    pub expression: String,
    /// Running left operand.
    pub accumulated_value: f64,
    pub pending_operator: Option<Operator>,
    /// Next digit starts a new number.
    pub is_fresh_entry: bool,
    /// Current number already has a decimal separator.
    pub has_decimal_point: bool,
}

impl Default for CalculationState {
    fn default() -> Self {
        Self {
            display: "0".to_string(),
            expression: String::new(),
            accumulated_value: 0.0,
            pending_operator: None,
            is_fresh_entry: true,
            has_decimal_point: false,
        }
    }
}

/// A single calculator key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    /// `0`-`9` or the decimal separator.
    Digit(char),
    Operator(Operator),
    Equals,
    Percent,
    ToggleSign,
    Clear,
    Backspace,
}

impl FromStr for Key {
    type Err = CalcError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let token = s.trim();
        match token {
            "=" => return Ok(Key::Equals),
            "%" => return Ok(Key::Percent),
            "+/-" | "±" | "neg" => return Ok(Key::ToggleSign),
            "C" | "c" | "AC" | "clear" => return Ok(Key::Clear),
            "<" | "⌫" | "back" => return Ok(Key::Backspace),
            _ => {}
        }

        let mut chars = token.chars();
        if let (Some(c), None) = (chars.next(), chars.next()) {
            if c.is_ascii_digit() || c == DECIMAL_SEPARATOR {
                return Ok(Key::Digit(c));
            }
        }

        token
            .parse::<Operator>()
            .map(Key::Operator)
            .map_err(|_| CalcError::InvalidInput(format!("unknown key '{token}'")))
    }
}

/// Four-function calculator owned by a single session.
pub struct CalculationEngine {
    state: CalculationState,
    category: Category,
    history: Option<Arc<dyn HistorySink>>,
    usage: Option<Arc<dyn UsageCounter>>,
}

impl CalculationEngine {
    /// Create an engine in the cleared state.
    pub fn new() -> Self {
        Self {
            state: CalculationState::default(),
            category: Category::Standard,
            history: None,
            usage: None,
        }
    }

    /// Send completed calculations to `sink`.
    pub fn with_history(mut self, sink: Arc<dyn HistorySink>) -> Self {
        self.history = Some(sink);
        self
    }

    /// Signal `counter` on every completed calculation.
    pub fn with_usage_counter(mut self, counter: Arc<dyn UsageCounter>) -> Self {
        self.usage = Some(counter);
        self
    }

    /// Category recorded on history entries.
    pub fn with_category(mut self, category: Category) -> Self {
        self.category = category;
        self
    }

    pub fn state(&self) -> &CalculationState {
        &self.state
    }

    pub fn display(&self) -> &str {
        &self.state.display
    }

    pub fn expression(&self) -> &str {
        &self.state.expression
    }

    /// Whether the error sentinel is showing.
    pub fn is_error(&self) -> bool {
        self.state.display == ERROR_DISPLAY
    }

    /// Numeric value of the display, `None` while showing the error sentinel.
    pub fn value(&self) -> Option<f64> {
        if self.is_error() {
            return None;
        }
        match parse_display(&self.state.display) {
            Ok(value) => Some(value),
            Err(e) => {
                error!(display = %self.state.display, error = %e, "Display is not parseable");
                None
            }
        }
    }

    /// Dispatch a key press.
    pub fn press(&mut self, key: Key) {
        match key {
            Key::Digit(d) => self.input_digit(d),
            Key::Operator(op) => self.input_operator(op),
            Key::Equals => self.calculate(),
            Key::Percent => self.percentage(),
            Key::ToggleSign => self.toggle_sign(),
            Key::Clear => self.clear(),
            Key::Backspace => self.backspace(),
        }
    }

    /// Enter a digit or the decimal separator.
    pub fn input_digit(&mut self, digit: char) {
        if !digit.is_ascii_digit() && digit != DECIMAL_SEPARATOR {
            debug!(digit = %digit, "Ignoring non-digit input");
            return;
        }

        if self.is_error() {
            self.state = CalculationState::default();
        }

        let state = &mut self.state;
        if state.is_fresh_entry || !is_plain(&state.display) {
            if digit == DECIMAL_SEPARATOR {
                state.display = format!("0{DECIMAL_SEPARATOR}");
                state.has_decimal_point = true;
            } else {
                state.display = digit.to_string();
                state.has_decimal_point = false;
            }
            state.is_fresh_entry = false;
            return;
        }

        if digit == DECIMAL_SEPARATOR {
            if state.has_decimal_point {
                return;
            }
            state.display.push(DECIMAL_SEPARATOR);
            state.has_decimal_point = true;
            return;
        }

        if digit_count(&state.display) >= MAX_DIGITS {
            debug!(display = %state.display, "Digit limit reached");
            return;
        }

        state.display.push(digit);
        if !state.has_decimal_point {
            self.regroup();
        }
    }

    /// Record `op` as the pending operator, resolving any pending one first.
    pub fn input_operator(&mut self, op: Operator) {
        if self.is_error() {
            return;
        }

        if self.state.pending_operator.is_some() && !self.state.is_fresh_entry {
            self.calculate();
            if self.is_error() {
                return;
            }
        }

        let Some(value) = self.value() else {
            return;
        };

        let state = &mut self.state;
        state.accumulated_value = value;
        state.pending_operator = Some(op);
        state.expression = format!("{} {}", format_value(value), op.symbol());
        state.is_fresh_entry = true;
        state.has_decimal_point = false;
    }

    /// Apply the pending operator to the accumulated value and the display.
    pub fn calculate(&mut self) {
        let Some(op) = self.state.pending_operator else {
            return;
        };
        let Some(rhs) = self.value() else {
            return;
        };

        let lhs = self.state.accumulated_value;
        let trace = format!("{} {} {}", format_value(lhs), op.symbol(), format_value(rhs));

        let outcome = op.apply(lhs, rhs);

        let state = &mut self.state;
        state.expression = trace;
        state.pending_operator = None;
        state.is_fresh_entry = true;
        state.has_decimal_point = false;

        match outcome {
            Ok(result) => {
                state.accumulated_value = result;
                state.display = format_value(result);
                debug!(expression = %state.expression, result = %state.display, "Calculation completed");
                self.emit_completed();
            }
            Err(e) => {
                warn!(expression = %state.expression, error = %e, "Calculation failed");
                state.accumulated_value = 0.0;
                state.display = ERROR_DISPLAY.to_string();
            }
        }
    }

    /// Negate the displayed value. Entry and operator state are unchanged.
    pub fn toggle_sign(&mut self) {
        let Some(value) = self.value() else {
            return;
        };
        if value == 0.0 {
            return;
        }

        let display = &mut self.state.display;
        if display.starts_with('-') {
            display.remove(0);
        } else {
            display.insert(0, '-');
        }
    }

    /// Divide the displayed value by 100.
    pub fn percentage(&mut self) {
        let Some(value) = self.value() else {
            return;
        };

        let state = &mut self.state;
        state.display = format_value(value / 100.0);
        state.is_fresh_entry = true;
        state.has_decimal_point = false;
    }

    /// Reset to the initial zero state.
    pub fn clear(&mut self) {
        self.state = CalculationState::default();
    }

    /// Remove the last typed character.
    pub fn backspace(&mut self) {
        let state = &mut self.state;
        if state.is_fresh_entry {
            return;
        }

        if state.display.pop() == Some(DECIMAL_SEPARATOR) {
            state.has_decimal_point = false;
        }

        if state.display.is_empty() || state.display == "-" {
            state.display = "0".to_string();
            state.is_fresh_entry = true;
            state.has_decimal_point = false;
            return;
        }

        if !state.has_decimal_point {
            self.regroup();
        }
    }

    /// Recompute group separators from the display's numeric value.
    fn regroup(&mut self) {
        match parse_display(&self.state.display) {
            Ok(value) => self.state.display = format_value(value),
            Err(e) => {
                error!(display = %self.state.display, error = %e, "Display failed to round-trip");
            }
        }
    }

    fn emit_completed(&self) {
        if let Some(history) = &self.history {
            history.save(HistoryEntry::new(
                self.state.display.clone(),
                self.state.expression.clone(),
                self.category,
            ));
        }
        if let Some(usage) = &self.usage {
            usage.calculation_completed();
        }
    }
}

impl Default for CalculationEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for CalculationEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CalculationEngine")
            .field("state", &self.state)
            .field("category", &self.category)
            .finish()
    }
}
