use anyhow::Result;
use rusqlite::{params, Row};

use crate::db::{
    helpers::{parse_advice, parse_datetime, parse_skill_level, to_i64, to_u64},
    models::{Point, SessionDraft, SessionRecord, SessionSummary, Shot, ShotMetrics},
    Database,
};

fn row_to_shot(row: &Row) -> Result<Shot> {
    let fired_at: String = row.get("fired_at")?;
    Ok(Shot {
        x: row.get("x")?,
        y: row.get("y")?,
        detection_id: row.get("detection_id")?,
        fired_at: parse_datetime(&fired_at, "fired_at")?,
        width: row.get("width")?,
        height: row.get("height")?,
        confidence: row.get("confidence")?,
    })
}

fn row_to_summary(row: &Row) -> Result<SessionSummary> {
    let date: String = row.get("date")?;
    let elapsed_secs: i64 = row.get("elapsed_secs")?;
    let shot_count: i64 = row.get("shot_count")?;

    Ok(SessionSummary {
        id: row.get("id")?,
        date: parse_datetime(&date, "date")?,
        shot_count: shot_count.max(0) as usize,
        group_size: row.get("group_size")?,
        group_offset: row.get("group_offset")?,
        consistency: row.get("consistency")?,
        cadence: row.get("cadence")?,
        elapsed_secs: to_u64(elapsed_secs, "elapsed_secs")?,
    })
}

impl Database {
    /// Persists a finished run and its shots in one transaction. Session ids
    /// come from the autoincrement column, so they are issued in creation
    /// order.
    pub async fn insert_session(&self, draft: SessionDraft) -> Result<SessionRecord> {
        self.execute(move |conn| {
            let tx = conn.transaction()?;
            let advice_json = serde_json::to_string(&draft.advice)?;
            let created_at = draft.date;

            tx.execute(
                "INSERT INTO sessions (date, elapsed_secs, group_size, group_center_x,
                                       group_center_y, group_offset, consistency, cadence,
                                       advice, skill_level, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
                params![
                    draft.date.to_rfc3339(),
                    to_i64(draft.metrics.elapsed_secs)?,
                    draft.metrics.group_size,
                    draft.metrics.group_center.x,
                    draft.metrics.group_center.y,
                    draft.metrics.group_offset,
                    draft.metrics.consistency,
                    draft.metrics.cadence,
                    advice_json,
                    draft.skill_level.as_str(),
                    created_at.to_rfc3339(),
                ],
            )?;
            let session_id = tx.last_insert_rowid();

            {
                let mut stmt = tx.prepare(
                    "INSERT INTO shots (session_id, x, y, detection_id, fired_at,
                                        width, height, confidence)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                )?;
                for shot in &draft.shots {
                    stmt.execute(params![
                        session_id,
                        shot.x,
                        shot.y,
                        shot.detection_id,
                        shot.fired_at.to_rfc3339(),
                        shot.width,
                        shot.height,
                        shot.confidence,
                    ])?;
                }
            }

            tx.commit()?;

            Ok(SessionRecord {
                id: session_id,
                date: draft.date,
                shots: draft.shots,
                metrics: draft.metrics,
                advice: draft.advice,
                skill_level: draft.skill_level,
                created_at,
            })
        })
        .await
    }

    pub async fn get_session(&self, session_id: i64) -> Result<Option<SessionRecord>> {
        self.execute(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT id, date, elapsed_secs, group_size, group_center_x, group_center_y,
                        group_offset, consistency, cadence, advice, skill_level, created_at
                 FROM sessions
                 WHERE id = ?1",
            )?;

            let mut rows = stmt.query(params![session_id])?;
            let Some(row) = rows.next()? else {
                return Ok(None);
            };

            let date: String = row.get("date")?;
            let created_at: String = row.get("created_at")?;
            let elapsed_secs: i64 = row.get("elapsed_secs")?;
            let advice: Option<String> = row.get("advice")?;
            let skill_level: String = row.get("skill_level")?;

            let metrics = ShotMetrics {
                group_size: row.get("group_size")?,
                group_center: Point::new(row.get("group_center_x")?, row.get("group_center_y")?),
                group_offset: row.get("group_offset")?,
                consistency: row.get("consistency")?,
                elapsed_secs: to_u64(elapsed_secs, "elapsed_secs")?,
                cadence: row.get("cadence")?,
            };

            let mut record = SessionRecord {
                id: row.get("id")?,
                date: parse_datetime(&date, "date")?,
                shots: Vec::new(),
                metrics,
                advice: parse_advice(advice)?,
                skill_level: parse_skill_level(&skill_level)?,
                created_at: parse_datetime(&created_at, "created_at")?,
            };

            let mut shot_stmt = conn.prepare(
                "SELECT x, y, detection_id, fired_at, width, height, confidence
                 FROM shots
                 WHERE session_id = ?1
                 ORDER BY fired_at ASC, id ASC",
            )?;
            let mut shot_rows = shot_stmt.query(params![session_id])?;
            while let Some(shot_row) = shot_rows.next()? {
                record.shots.push(row_to_shot(shot_row)?);
            }

            Ok(Some(record))
        })
        .await
    }

    pub async fn list_sessions(&self) -> Result<Vec<SessionSummary>> {
        self.execute(|conn| {
            let mut stmt = conn.prepare(
                "SELECT s.id, s.date, s.elapsed_secs, s.group_size, s.group_offset,
                        s.consistency, s.cadence,
                        (SELECT COUNT(*) FROM shots WHERE shots.session_id = s.id) AS shot_count
                 FROM sessions s
                 ORDER BY s.date DESC, s.id DESC",
            )?;

            let mut rows = stmt.query([])?;
            let mut summaries = Vec::new();
            while let Some(row) = rows.next()? {
                summaries.push(row_to_summary(row)?);
            }

            Ok(summaries)
        })
        .await
    }

    /// Removes a session; its shots go with it via ON DELETE CASCADE.
    /// Returns false when no such session existed.
    pub async fn delete_session(&self, session_id: i64) -> Result<bool> {
        self.execute(move |conn| {
            let rows_affected =
                conn.execute("DELETE FROM sessions WHERE id = ?1", params![session_id])?;
            Ok(rows_affected > 0)
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::SkillLevel;
    use chrono::{Duration, TimeZone, Utc};
    use tempfile::TempDir;

    fn draft(shot_count: usize) -> SessionDraft {
        let date = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
        let shots = (0..shot_count)
            .map(|i| Shot {
                x: i as f64,
                y: -(i as f64),
                detection_id: format!("det-{i}"),
                fired_at: date + Duration::seconds(i as i64),
                width: Some(4.0),
                height: Some(4.0),
                confidence: Some(0.9),
            })
            .collect();

        SessionDraft {
            date,
            shots,
            metrics: ShotMetrics {
                group_size: 2.5,
                group_center: Point::new(1.0, -1.0),
                group_offset: 3.0,
                consistency: 0.5,
                elapsed_secs: 90,
                cadence: 12.0,
            },
            advice: vec!["Work on reducing trigger anticipation.".to_string()],
            skill_level: SkillLevel::Intermediate,
        }
    }

    async fn open_database(dir: &TempDir) -> Database {
        Database::new(dir.path().join("gmshooter.db")).expect("database should open")
    }

    #[tokio::test]
    async fn insert_then_get_round_trips_session_and_shots() {
        let dir = TempDir::new().unwrap();
        let db = open_database(&dir).await;

        let stored = db.insert_session(draft(3)).await.unwrap();
        let fetched = db.get_session(stored.id).await.unwrap().unwrap();

        assert_eq!(fetched.id, stored.id);
        assert_eq!(fetched.shots.len(), 3);
        assert_eq!(fetched.shots[0].detection_id, "det-0");
        assert_eq!(fetched.metrics, stored.metrics);
        assert_eq!(fetched.advice, stored.advice);
        assert_eq!(fetched.skill_level, SkillLevel::Intermediate);
    }

    #[tokio::test]
    async fn session_ids_are_issued_in_creation_order() {
        let dir = TempDir::new().unwrap();
        let db = open_database(&dir).await;

        let first = db.insert_session(draft(1)).await.unwrap();
        let second = db.insert_session(draft(2)).await.unwrap();
        assert!(second.id > first.id);
    }

    #[tokio::test]
    async fn get_session_returns_none_for_unknown_id() {
        let dir = TempDir::new().unwrap();
        let db = open_database(&dir).await;

        assert!(db.get_session(42).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn list_sessions_is_newest_first_with_shot_counts() {
        let dir = TempDir::new().unwrap();
        let db = open_database(&dir).await;

        let mut older = draft(2);
        older.date = Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap();
        db.insert_session(older).await.unwrap();
        let newer = db.insert_session(draft(5)).await.unwrap();

        let summaries = db.list_sessions().await.unwrap();
        assert_eq!(summaries.len(), 2);
        assert_eq!(summaries[0].id, newer.id);
        assert_eq!(summaries[0].shot_count, 5);
        assert_eq!(summaries[1].shot_count, 2);
    }

    #[tokio::test]
    async fn delete_session_cascades_to_shots() {
        let dir = TempDir::new().unwrap();
        let db = open_database(&dir).await;

        let stored = db.insert_session(draft(4)).await.unwrap();
        assert!(db.delete_session(stored.id).await.unwrap());

        assert!(db.get_session(stored.id).await.unwrap().is_none());
        let orphaned: i64 = db
            .execute(|conn| {
                Ok(conn.query_row("SELECT COUNT(*) FROM shots", [], |row| row.get(0))?)
            })
            .await
            .unwrap();
        assert_eq!(orphaned, 0);
    }

    #[tokio::test]
    async fn delete_session_reports_unknown_id() {
        let dir = TempDir::new().unwrap();
        let db = open_database(&dir).await;

        assert!(!db.delete_session(7).await.unwrap());
    }
}
