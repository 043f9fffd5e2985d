//! Highest-code lookups and per-prefix advisory locks
//!
//! Codes share a prefix and differ in a zero-padded counter that may grow
//! past two digits, so "highest" orders by length first and then by text:
//! `JH100` sorts above `JH99`.

use sqlx::PgConnection;

use core_kernel::CodeSequence;

use crate::error::DatabaseError;

pub struct SequenceRepository;

impl SequenceRepository {
    /// Returns the highest existing code of `sequence` starting with `prefix`
    ///
    /// The prefix is compared with `left()` rather than `LIKE` so codes
    /// containing `_` or `%` match literally.
    pub async fn latest_code(
        conn: &mut PgConnection,
        sequence: CodeSequence,
        prefix: &str,
    ) -> Result<Option<String>, DatabaseError> {
        let sql = match sequence {
            CodeSequence::BranchCode => {
                "SELECT branch_code FROM shops \
                 WHERE left(branch_code, length($1)) = $1 \
                 ORDER BY length(branch_code) DESC, branch_code DESC LIMIT 1"
            }
            CodeSequence::WarrantyNo => {
                "SELECT warranty_no FROM warranties \
                 WHERE left(warranty_no, length($1)) = $1 \
                 ORDER BY length(warranty_no) DESC, warranty_no DESC LIMIT 1"
            }
            CodeSequence::ClaimNo => {
                "SELECT claim_no FROM claims \
                 WHERE left(claim_no, length($1)) = $1 \
                 ORDER BY length(claim_no) DESC, claim_no DESC LIMIT 1"
            }
        };

        let code = sqlx::query_scalar::<_, String>(sql)
            .bind(prefix)
            .fetch_optional(&mut *conn)
            .await?;
        Ok(code)
    }

    /// Takes a transaction-scoped advisory lock on `sequence:prefix`
    ///
    /// The lock is released by PostgreSQL when the transaction commits or
    /// rolls back.
    pub async fn lock_prefix(
        conn: &mut PgConnection,
        sequence: CodeSequence,
        prefix: &str,
    ) -> Result<(), DatabaseError> {
        sqlx::query("SELECT pg_advisory_xact_lock(hashtext($1))")
            .bind(lock_key(sequence, prefix))
            .execute(&mut *conn)
            .await?;
        Ok(())
    }
}

fn lock_key(sequence: CodeSequence, prefix: &str) -> String {
    format!("{}:{}", sequence, prefix)
}
