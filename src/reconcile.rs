use anyhow::Result;
use rusqlite::Connection;
use tracing::debug;

use crate::db;

/// Walk `path` from the root, creating missing categories, and return the leaf id.
///
/// Lookups match on (name, parent) so the same name under different parents
/// stays distinct, and re-walking a path lands on the same chain. Inserts go
/// through `conn`, so each one is visible to the next step of the walk even
/// inside an open transaction. An empty path resolves to `None`.
pub fn resolve_category_path(conn: &Connection, path: &[String]) -> Result<Option<i64>> {
    let mut parent: Option<i64> = None;
    for name in path {
        let id = match db::find_category(conn, name, parent)? {
            Some(id) => id,
            None => {
                let id = db::insert_category(conn, name, parent)?;
                debug!(category = %name, ?parent, id, "created category");
                id
            }
        };
        parent = Some(id);
    }
    Ok(parent)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_conn;

    fn path(names: &[&str]) -> Vec<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    fn categories(conn: &Connection) -> Vec<(i64, String, Option<i64>)> {
        let mut stmt = conn
            .prepare("SELECT id, name, parent_id FROM categories ORDER BY id")
            .unwrap();
        stmt.query_map([], |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?)))
            .unwrap()
            .collect::<Result<Vec<_>, _>>()
            .unwrap()
    }

    #[test]
    fn empty_path_is_none() {
        let conn = test_conn();
        assert_eq!(resolve_category_path(&conn, &[]).unwrap(), None);
        assert!(categories(&conn).is_empty());
    }

    #[test]
    fn creates_chain_then_reuses_root() {
        let conn = test_conn();
        let sneakers = resolve_category_path(&conn, &path(&["Shoes", "Sneakers"]))
            .unwrap()
            .unwrap();
        let rows = categories(&conn);
        assert_eq!(rows.len(), 2);
        let shoes = rows[0].0;
        assert_eq!(rows[0], (shoes, "Shoes".to_string(), None));
        assert_eq!(rows[1], (sneakers, "Sneakers".to_string(), Some(shoes)));

        let boots = resolve_category_path(&conn, &path(&["Shoes", "Boots"]))
            .unwrap()
            .unwrap();
        let rows = categories(&conn);
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[2], (boots, "Boots".to_string(), Some(shoes)));
    }

    #[test]
    fn same_path_twice_is_idempotent() {
        let conn = test_conn();
        let p = path(&["Dames", "Schoenen", "Sneakers"]);
        let first = resolve_category_path(&conn, &p).unwrap();
        let second = resolve_category_path(&conn, &p).unwrap();
        assert_eq!(first, second);
        assert_eq!(categories(&conn).len(), 3);
    }

    #[test]
    fn same_name_under_different_parents() {
        let conn = test_conn();
        let dames = resolve_category_path(&conn, &path(&["Dames", "Sneakers"])).unwrap();
        let heren = resolve_category_path(&conn, &path(&["Heren", "Sneakers"])).unwrap();
        assert_ne!(dames, heren);
        assert_eq!(categories(&conn).len(), 4);
    }

    #[test]
    fn repeated_name_within_one_path() {
        let conn = test_conn();
        let leaf = resolve_category_path(&conn, &path(&["Sale", "Sale"])).unwrap().unwrap();
        let rows = categories(&conn);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1], (leaf, "Sale".to_string(), Some(rows[0].0)));
    }

    #[test]
    fn visible_inside_transaction() {
        let mut conn = test_conn();
        let tx = conn.transaction().unwrap();
        let a = resolve_category_path(&tx, &path(&["A", "B"])).unwrap();
        let b = resolve_category_path(&tx, &path(&["A", "B"])).unwrap();
        tx.commit().unwrap();
        assert_eq!(a, b);
        assert_eq!(categories(&conn).len(), 2);
    }
}
