//! Sequential business code generation
//!
//! Branch codes, warranty numbers and claim numbers share one shape: a
//! deterministic prefix followed by a zero-padded counter.
//!
//! | Sequence | Prefix | Example |
//! |----------|--------|---------|
//! | Branch code | state code | `JH07` |
//! | Warranty number | `<branch>-<YYMMDD>` | `PJ01-24112501` |
//! | Claim number | `C<YYMMDD>-<warranty no>-` | `C241201-PJ01-24112501-01` |
//!
//! [`next_code`] is pure. [`preview_code`] and [`reserve_code`] read the
//! current maximum through a [`SequenceSource`]; only [`reserve_code`] takes
//! the per-prefix lock that makes concurrent generation safe.

use async_trait::async_trait;
use std::fmt;
use tracing::{debug, warn};

use crate::ports::PortError;

/// Width of the zero-padded counter
pub const SEQUENCE_WIDTH: usize = 2;

/// The business code families that are generated sequentially
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CodeSequence {
    BranchCode,
    WarrantyNo,
    ClaimNo,
}

impl CodeSequence {
    pub fn as_str(&self) -> &'static str {
        match self {
            CodeSequence::BranchCode => "branch_code",
            CodeSequence::WarrantyNo => "warranty_no",
            CodeSequence::ClaimNo => "claim_no",
        }
    }
}

impl fmt::Display for CodeSequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Derives the code following `latest` within `prefix`
///
/// With no prior code the result is `prefix + "01"`. Otherwise the suffix
/// after the prefix is parsed as an unsigned integer, incremented and padded
/// to two digits; suffixes past 99 simply grow wider. An unparsable suffix
/// counts as zero.
pub fn next_code(prefix: &str, latest: Option<&str>) -> String {
    let current = match latest {
        None => 0,
        Some(code) => parse_suffix(prefix, code),
    };
    format!(
        "{}{:0width$}",
        prefix,
        current.saturating_add(1),
        width = SEQUENCE_WIDTH
    )
}

fn parse_suffix(prefix: &str, code: &str) -> u64 {
    let suffix = code.strip_prefix(prefix).unwrap_or(code);
    match suffix.parse::<u64>() {
        Ok(value) => value,
        Err(_) => {
            warn!(prefix, code, "existing code has a non-numeric suffix, restarting count");
            0
        }
    }
}

/// Read access to the highest existing code per prefix, plus prefix locking
#[async_trait]
pub trait SequenceSource: Send {
    /// Returns the highest code of `sequence` starting with `prefix`
    ///
    /// `Ok(None)` means no code exists yet. Any other failure is an error and
    /// must never be reported as `Ok(None)`.
    async fn latest_code(
        &mut self,
        sequence: CodeSequence,
        prefix: &str,
    ) -> Result<Option<String>, PortError>;

    /// Serializes generation for `prefix` until the enclosing unit of work ends
    async fn lock_prefix(&mut self, sequence: CodeSequence, prefix: &str) -> Result<(), PortError>;
}

/// Computes the next code without reserving it
///
/// Two concurrent previews for the same prefix can return the same code.
pub async fn preview_code<S>(
    source: &mut S,
    sequence: CodeSequence,
    prefix: &str,
) -> Result<String, PortError>
where
    S: SequenceSource + ?Sized,
{
    let latest = source.latest_code(sequence, prefix).await?;
    let code = next_code(prefix, latest.as_deref());
    debug!(%sequence, prefix, code = %code, "previewed next code");
    Ok(code)
}

/// Locks the prefix, then computes the next code
///
/// The code is safe to insert in the same unit of work: no other unit of
/// work can generate for this prefix until this one commits or rolls back.
pub async fn reserve_code<S>(
    source: &mut S,
    sequence: CodeSequence,
    prefix: &str,
) -> Result<String, PortError>
where
    S: SequenceSource + ?Sized,
{
    source.lock_prefix(sequence, prefix).await?;
    let latest = source.latest_code(sequence, prefix).await?;
    let code = next_code(prefix, latest.as_deref());
    debug!(%sequence, prefix, code = %code, "reserved next code");
    Ok(code)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cold_start() {
        assert_eq!(next_code("JH", None), "JH01");
        assert_eq!(next_code("PJ01-241125", None), "PJ01-24112501");
    }

    #[test]
    fn test_increment() {
        assert_eq!(next_code("JH", Some("JH07")), "JH08");
        assert_eq!(next_code("C241201-PJ01-24112501-", Some("C241201-PJ01-24112501-09")), "C241201-PJ01-24112501-10");
    }

    #[test]
    fn test_widens_past_ninety_nine() {
        assert_eq!(next_code("KL", Some("KL99")), "KL100");
        assert_eq!(next_code("KL", Some("KL100")), "KL101");
    }

    #[test]
    fn test_unparsable_suffix_counts_as_zero() {
        assert_eq!(next_code("JH", Some("JHxx")), "JH01");
        assert_eq!(next_code("JH", Some("JH")), "JH01");
    }

    struct Fixed(Result<Option<String>, ()>, bool);

    #[async_trait]
    impl SequenceSource for Fixed {
        async fn latest_code(&mut self, _: CodeSequence, _: &str) -> Result<Option<String>, PortError> {
            self.0.clone().map_err(|_| PortError::connection("lookup failed"))
        }

        async fn lock_prefix(&mut self, _: CodeSequence, _: &str) -> Result<(), PortError> {
            self.1 = true;
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_lookup_failure_is_not_a_cold_start() {
        let mut source = Fixed(Err(()), false);
        let result = preview_code(&mut source, CodeSequence::ClaimNo, "C241201-X-").await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_reserve_locks_before_reading() {
        let mut source = Fixed(Ok(Some("PJ03".to_string())), false);
        let code = reserve_code(&mut source, CodeSequence::BranchCode, "PJ").await.unwrap();
        assert_eq!(code, "PJ04");
        assert!(source.1);
    }
}
