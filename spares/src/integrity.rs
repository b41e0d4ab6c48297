//! `fix_integrity` (`spec.md` §5, §8): rebuilds caches, removes orphaned
//! cards/notes, clamps out-of-range intervals, and re-seats `due` values
//! that have drifted past [`crate::model::MAX_DUE`] back to
//! [`crate::model::INTEGRITY_REPAIR_DUE`]. Callers invoke this after an
//! I/O or integrity error surfaces from the store; it runs with autocommit
//! toggled on, matching the store's maintenance-task convention.

use crate::model::{CardQueue, INTEGRITY_REPAIR_DUE, MAX_DUE};
use crate::Error;
use log::{info, warn};
use sqlx::SqlitePool;

/// Counts of repairs made, returned so callers can log/report a summary.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct IntegrityReport {
    pub orphaned_cards_removed: usize,
    pub orphaned_notes_removed: usize,
    pub dues_clamped: usize,
    pub intervals_clamped: usize,
}

/// Runs the full repair pass. Matches `spec.md` §5's maintenance-task note
/// that integrity checks run synchronously with autocommit on: each step
/// here is its own statement rather than a single wrapping transaction.
pub async fn fix_integrity(db: &SqlitePool) -> Result<IntegrityReport, Error> {
    let mut report = IntegrityReport::default();

    let orphaned_cards = sqlx::query(
        "DELETE FROM card WHERE note_id NOT IN (SELECT id FROM note) OR deck_id NOT IN (SELECT id FROM deck)",
    )
    .execute(db)
    .await?;
    report.orphaned_cards_removed = orphaned_cards.rows_affected() as usize;

    let orphaned_notes = sqlx::query(
        "DELETE FROM note WHERE id NOT IN (SELECT note_id FROM card) OR note_type_id NOT IN (SELECT id FROM note_type)",
    )
    .execute(db)
    .await?;
    report.orphaned_notes_removed = orphaned_notes.rows_affected() as usize;

    let clamped_due = sqlx::query("UPDATE card SET due = ? WHERE due > ? OR due < 0")
        .bind(INTEGRITY_REPAIR_DUE)
        .bind(MAX_DUE)
        .execute(db)
        .await?;
    report.dues_clamped = clamped_due.rows_affected() as usize;

    let clamped_interval = sqlx::query("UPDATE card SET interval = 1 WHERE interval < 1 AND queue = ?")
        .bind(CardQueue::Review)
        .execute(db)
        .await?;
    report.intervals_clamped = clamped_interval.rows_affected() as usize;

    if report.orphaned_cards_removed > 0 || report.orphaned_notes_removed > 0 {
        warn!(
            "Integrity repair removed {} orphaned card(s), {} orphaned note(s)",
            report.orphaned_cards_removed, report.orphaned_notes_removed
        );
    }
    if report.dues_clamped > 0 || report.intervals_clamped > 0 {
        warn!(
            "Integrity repair clamped {} due value(s), {} interval(s)",
            report.dues_clamped, report.intervals_clamped
        );
    }
    info!("Integrity repair complete: {:?}", report);

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[sqlx::test(migrations = "./migrations")]
    async fn test_fix_integrity_removes_orphaned_card(db: SqlitePool) -> sqlx::Result<()> {
        let mut conn = db.acquire().await?;
        sqlx::query("PRAGMA foreign_keys = OFF").execute(&mut *conn).await?;
        sqlx::query(
            "INSERT INTO card (id, note_id, deck_id, template_ord, type, queue, due, interval, factor, reps, lapses, left, original_due, original_deck_id, flags, mod, usn, data) \
             VALUES (1, 999, 1, 0, 0, 0, 0, 0, 2500, 0, 0, 0, 0, 0, 0, 0, 0, '{}')",
        )
        .execute(&mut *conn)
        .await?;
        drop(conn);

        let report = fix_integrity(&db).await.unwrap();
        assert_eq!(report.orphaned_cards_removed, 1);

        let remaining: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM card")
            .fetch_one(&db)
            .await?;
        assert_eq!(remaining, 0);
        Ok(())
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_fix_integrity_clamps_due_past_max(db: SqlitePool) -> sqlx::Result<()> {
        sqlx::query(
            "INSERT INTO note_type (id, name, kind, fields, templates, sort_field_idx, default_deck_id, requirements, mod, usn) \
             VALUES (1, 'Basic', 0, '[]', '[]', 0, 1, NULL, 0, 0)",
        )
        .execute(&db)
        .await?;
        sqlx::query(
            "INSERT INTO note (id, guid, note_type_id, mod, usn, tags, fields, sort_field, checksum, flags, data) \
             VALUES (1, 'g', 1, 0, 0, '', '[]', '', 0, 0, '{}')",
        )
        .execute(&db)
        .await?;
        sqlx::query(
            "INSERT INTO card (id, note_id, deck_id, template_ord, type, queue, due, interval, factor, reps, lapses, left, original_due, original_deck_id, flags, mod, usn, data) \
             VALUES (1, 1, 1, 0, 2, 2, ?, 10, 2500, 1, 0, 0, 0, 0, 0, 0, 0, '{}')",
        )
        .bind(MAX_DUE + 1)
        .execute(&db)
        .await?;

        let report = fix_integrity(&db).await.unwrap();
        assert_eq!(report.dues_clamped, 1);

        let due: i64 = sqlx::query_scalar("SELECT due FROM card WHERE id = 1")
            .fetch_one(&db)
            .await?;
        assert_eq!(due, INTEGRITY_REPAIR_DUE);
        Ok(())
    }
}
