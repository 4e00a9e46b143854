use std::fmt;

use num_bigint::BigUint;

/// Named slippage tolerances.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Slippage {
    /// 1%
    One,
    /// 0.1%
    OneTenth,
    /// 0.2%
    TwoTenth,
    /// 2%
    Quarter,
}

/// Which bound of the tolerance window to compute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Increase,
    Decrease,
}

impl Slippage {
    pub const DEFAULT: Slippage = Slippage::One;

    /// Resolve a tolerance from its wire name (`"ONE_TENTH"`) or percentage
    /// alias (`"0.1%"`). Returns `None` for anything else.
    pub fn from_spec(spec: &str) -> Option<Self> {
        match spec.trim() {
            "ONE" | "1.0%" | "1%" => Some(Slippage::One),
            "ONE_TENTH" | "0.1%" => Some(Slippage::OneTenth),
            "TWO_TENTH" | "0.2%" => Some(Slippage::TwoTenth),
            "QUARTER" | "2.0%" | "2%" => Some(Slippage::Quarter),
            _ => None,
        }
    }

    /// Like [`Slippage::from_spec`], but unknown specs fall back to 1%.
    pub fn from_spec_or_default(spec: &str) -> Self {
        Self::from_spec(spec).unwrap_or(Self::DEFAULT)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Slippage::One => "ONE",
            Slippage::OneTenth => "ONE_TENTH",
            Slippage::TwoTenth => "TWO_TENTH",
            Slippage::Quarter => "QUARTER",
        }
    }

    pub fn basis_points(&self) -> u32 {
        match self {
            Slippage::One => 100,
            Slippage::OneTenth => 10,
            Slippage::TwoTenth => 20,
            Slippage::Quarter => 200,
        }
    }

    /// `amount * (10000 ± bps) / 10000`, truncated.
    pub fn apply(&self, amount: &BigUint, direction: Direction) -> BigUint {
        apply_bps(amount, self.basis_points(), direction)
    }

    pub fn label(&self) -> &'static str {
        match self {
            Slippage::One => "1.0",
            Slippage::OneTenth => "0.1",
            Slippage::TwoTenth => "0.2",
            Slippage::Quarter => "2.0",
        }
    }
}

impl fmt::Display for Slippage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

const BPS_SCALE: u32 = 10_000;

/// Scale `amount` by `(10000 ± bps) / 10000` with integer math.
///
/// The result is floored, so a decrease rounds the bound down and an
/// increase never exceeds the exact value.
pub fn apply_bps(amount: &BigUint, bps: u32, direction: Direction) -> BigUint {
    let numerator = match direction {
        Direction::Increase => BPS_SCALE + bps,
        Direction::Decrease => BPS_SCALE.saturating_sub(bps),
    };
    amount * numerator / BPS_SCALE
}

/// Apply the named tolerance `spec`; unknown specs use 1%.
pub fn apply_tolerance(amount: &BigUint, spec: &str, direction: Direction) -> BigUint {
    Slippage::from_spec_or_default(spec).apply(amount, direction)
}

pub fn add_slippage(amount: &BigUint, spec: &str) -> BigUint {
    apply_tolerance(amount, spec, Direction::Increase)
}

pub fn subtract_slippage(amount: &BigUint, spec: &str) -> BigUint {
    apply_tolerance(amount, spec, Direction::Decrease)
}

/// Human-readable percentage for `spec`, or `"N/A"` when unrecognized.
pub fn format_tolerance_label(spec: &str) -> String {
    Slippage::from_spec(spec)
        .map(|s| s.label().to_string())
        .unwrap_or_else(|| "N/A".to_string())
}
