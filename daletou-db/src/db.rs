use anyhow::{Context, Result};
use rusqlite::{Connection, Row};
use std::path::Path;

use crate::models::Draw;

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS draws (
    issue   TEXT PRIMARY KEY,
    date    TEXT NOT NULL,
    f1      INTEGER NOT NULL,
    f2      INTEGER NOT NULL,
    f3      INTEGER NOT NULL,
    f4      INTEGER NOT NULL,
    f5      INTEGER NOT NULL,
    b1      INTEGER NOT NULL,
    b2      INTEGER NOT NULL,
    sales   TEXT NOT NULL DEFAULT '',
    pool    TEXT NOT NULL DEFAULT ''
);
";

const SELECT_COLUMNS: &str = "SELECT issue, date, f1, f2, f3, f4, f5, b1, b2, sales, pool FROM draws";

pub fn db_path() -> std::path::PathBuf {
    let mut path = std::env::current_dir().unwrap_or_default();
    path.push("data");
    path.push("daletou.db");
    path
}

pub fn open_db(path: &Path) -> Result<Connection> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Impossible de créer le répertoire {:?}", parent))?;
    }
    let conn = Connection::open(path)
        .with_context(|| format!("Impossible d'ouvrir la base {:?}", path))?;
    Ok(conn)
}

pub fn migrate(conn: &Connection) -> Result<()> {
    conn.execute_batch(SCHEMA)
        .context("Échec de la migration")?;
    Ok(())
}

/// Insère un tirage ; un numéro de tirage déjà présent est ignoré.
pub fn insert_draw(conn: &Connection, draw: &Draw) -> Result<bool> {
    let changed = conn.execute(
        "INSERT OR IGNORE INTO draws (issue, date, f1, f2, f3, f4, f5, b1, b2, sales, pool)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
        rusqlite::params![
            draw.issue,
            draw.date,
            draw.front[0],
            draw.front[1],
            draw.front[2],
            draw.front[3],
            draw.front[4],
            draw.back[0],
            draw.back[1],
            draw.sales,
            draw.pool,
        ],
    ).context("Échec de l'insertion")?;
    Ok(changed > 0)
}

fn draw_from_row(row: &Row<'_>) -> rusqlite::Result<Draw> {
    Ok(Draw {
        issue: row.get(0)?,
        date: row.get(1)?,
        front: [
            row.get::<_, u8>(2)?,
            row.get::<_, u8>(3)?,
            row.get::<_, u8>(4)?,
            row.get::<_, u8>(5)?,
            row.get::<_, u8>(6)?,
        ],
        back: [
            row.get::<_, u8>(7)?,
            row.get::<_, u8>(8)?,
        ],
        sales: row.get(9)?,
        pool: row.get(10)?,
    })
}

/// Derniers tirages, le plus récent en premier.
pub fn fetch_last_draws(conn: &Connection, limit: u32) -> Result<Vec<Draw>> {
    let mut stmt = conn.prepare(&format!(
        "{SELECT_COLUMNS} ORDER BY date DESC, CAST(issue AS INTEGER) DESC LIMIT ?1"
    ))?;
    let draws = stmt
        .query_map([limit], draw_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(draws)
}

/// Tirages dont le numéro est compris entre `from` et `to` (inclus), le plus récent en premier.
pub fn fetch_draws_between(conn: &Connection, from: &str, to: &str) -> Result<Vec<Draw>> {
    let from: i64 = from.trim().parse()
        .with_context(|| format!("Numéro de tirage invalide : '{}'", from))?;
    let to: i64 = to.trim().parse()
        .with_context(|| format!("Numéro de tirage invalide : '{}'", to))?;
    let mut stmt = conn.prepare(&format!(
        "{SELECT_COLUMNS} WHERE CAST(issue AS INTEGER) BETWEEN ?1 AND ?2
         ORDER BY date DESC, CAST(issue AS INTEGER) DESC"
    ))?;
    let draws = stmt
        .query_map([from, to], draw_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(draws)
}

pub fn count_draws(conn: &Connection) -> Result<u32> {
    let count: u32 = conn.query_row("SELECT COUNT(*) FROM draws", [], |row| row.get(0))?;
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_draw(issue: &str, date: &str) -> Draw {
        Draw {
            issue: issue.to_string(),
            date: date.to_string(),
            front: [1, 2, 3, 4, 5],
            back: [1, 2],
            sales: "300000000".to_string(),
            pool: "800000000".to_string(),
        }
    }

    fn memory_db() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        migrate(&conn).unwrap();
        conn
    }

    #[test]
    fn test_insert_and_count() {
        let conn = memory_db();
        assert_eq!(count_draws(&conn).unwrap(), 0);

        insert_draw(&conn, &test_draw("25001", "2025-01-01")).unwrap();
        assert_eq!(count_draws(&conn).unwrap(), 1);
    }

    #[test]
    fn test_duplicate_ignored() {
        let conn = memory_db();

        let inserted = insert_draw(&conn, &test_draw("25001", "2025-01-01")).unwrap();
        assert!(inserted);
        let inserted = insert_draw(&conn, &test_draw("25001", "2025-01-01")).unwrap();
        assert!(!inserted);
        assert_eq!(count_draws(&conn).unwrap(), 1);
    }

    #[test]
    fn test_fetch_order() {
        let conn = memory_db();

        insert_draw(&conn, &test_draw("25001", "2025-01-01")).unwrap();
        insert_draw(&conn, &test_draw("25003", "2025-01-06")).unwrap();
        insert_draw(&conn, &test_draw("25002", "2025-01-04")).unwrap();

        let draws = fetch_last_draws(&conn, 10).unwrap();
        assert_eq!(draws.len(), 3);
        assert_eq!(draws[0].issue, "25003");
        assert_eq!(draws[1].issue, "25002");
        assert_eq!(draws[2].issue, "25001");
        assert_eq!(draws[0].sales, "300000000");

        let limited = fetch_last_draws(&conn, 2).unwrap();
        assert_eq!(limited.len(), 2);
        assert_eq!(limited[1].issue, "25002");
    }

    #[test]
    fn test_fetch_between() {
        let conn = memory_db();
        for (i, issue) in ["25001", "25002", "25003", "25004"].iter().enumerate() {
            insert_draw(&conn, &test_draw(issue, &format!("2025-01-{:02}", i + 1))).unwrap();
        }

        let draws = fetch_draws_between(&conn, "25002", "25003").unwrap();
        let issues: Vec<&str> = draws.iter().map(|d| d.issue.as_str()).collect();
        assert_eq!(issues, vec!["25003", "25002"]);

        assert!(fetch_draws_between(&conn, "abc", "25003").is_err());
    }
}
