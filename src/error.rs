// captable-engine — Engine error taxonomy
// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (C) 2026 captable-engine contributors

use chrono::NaiveDate;

/// Deterministic computation errors reported synchronously to the caller.
///
/// Nothing here is fatal: a failed computation for one company never
/// affects another invocation.  Foreign-key validation (does a holder id
/// exist) is an external-layer responsibility and is not reported here.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EngineError {
    /// Non-positive principal, out-of-range rate, or malformed terms.
    #[error("invalid instrument: {0}")]
    InvalidInstrument(&'static str),

    /// Conversion dated before the instrument was issued.
    #[error("conversion date {conversion} precedes issue date {issue}")]
    InvalidConversionDate {
        issue: NaiveDate,
        conversion: NaiveDate,
    },

    /// Zero or negative denominator, or a snapshot the engine cannot
    /// price (e.g. a due convertible with no round context).
    #[error("invalid cap table state: {0}")]
    InvalidCapTableState(&'static str),

    /// Checked decimal arithmetic overflowed safe range.
    #[error("precision overflow in {0}")]
    PrecisionOverflow(&'static str),
}

/// Convenience alias used by every calculator in the crate.
pub type EngineResult<T> = Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_messages() {
        let e = EngineError::InvalidInstrument("principal must be positive");
        assert_eq!(
            e.to_string(),
            "invalid instrument: principal must be positive"
        );

        let e = EngineError::InvalidConversionDate {
            issue: NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
            conversion: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
        };
        assert_eq!(
            e.to_string(),
            "conversion date 2024-01-01 precedes issue date 2024-06-01"
        );
    }

    #[test]
    fn error_equality() {
        assert_eq!(
            EngineError::InvalidCapTableState("zero denominator"),
            EngineError::InvalidCapTableState("zero denominator")
        );
        assert_ne!(
            EngineError::PrecisionOverflow("shares"),
            EngineError::PrecisionOverflow("money")
        );
    }
}
