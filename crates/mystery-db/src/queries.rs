use crate::models::{CharacterRow, SessionRow, UserRow};
use crate::Database;
use anyhow::Result;
use rusqlite::{Connection, Row};

impl Database {
    // -- Users --

    pub fn create_user(&self, id: &str, username: &str, email: &str, password_hash: &str) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO users (id, username, email, password) VALUES (?1, ?2, ?3, ?4)",
                (id, username, email, password_hash),
            )?;
            Ok(())
        })
    }

    pub fn get_user_by_email(&self, email: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user_by_email(conn, email))
    }

    // -- Sessions --

    pub fn insert_session(&self, session: &SessionRow) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO sessions (id, name, host_user_id, player_count, current_phase, is_active)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                rusqlite::params![
                    session.id,
                    session.name,
                    session.host_user_id,
                    session.player_count,
                    session.current_phase,
                    session.is_active,
                ],
            )?;
            Ok(())
        })
    }

    /// Active sessions in insertion order.
    pub fn list_active_sessions(&self) -> Result<Vec<SessionRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, name, host_user_id, player_count, current_phase, is_active
                 FROM sessions
                 WHERE is_active = 1
                 ORDER BY rowid",
            )?;

            let rows = stmt
                .query_map([], session_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            Ok(rows)
        })
    }

    // -- Characters --

    pub fn insert_character(&self, character: &CharacterRow) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO characters
                    (id, session_id, user_id, first_name, last_name, profession, relationship_to_host, is_murderer)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                rusqlite::params![
                    character.id,
                    character.session_id,
                    character.user_id,
                    character.first_name,
                    character.last_name,
                    character.profession,
                    character.relationship_to_host,
                    character.is_murderer,
                ],
            )?;
            Ok(())
        })
    }

    /// Characters of one session in insertion order.
    pub fn list_characters_for_session(&self, session_id: &str) -> Result<Vec<CharacterRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, session_id, user_id, first_name, last_name, profession, relationship_to_host, is_murderer
                 FROM characters
                 WHERE session_id = ?1
                 ORDER BY rowid",
            )?;

            let rows = stmt
                .query_map([session_id], character_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            Ok(rows)
        })
    }
}

fn query_user_by_email(conn: &Connection, email: &str) -> Result<Option<UserRow>> {
    let mut stmt = conn
        .prepare("SELECT id, username, email, password, created_at FROM users WHERE email = ?1")?;

    let row = stmt
        .query_row([email], |row| {
            Ok(UserRow {
                id: row.get(0)?,
                username: row.get(1)?,
                email: row.get(2)?,
                password: row.get(3)?,
                created_at: row.get(4)?,
            })
        })
        .optional()?;

    Ok(row)
}

fn session_from_row(row: &Row<'_>) -> rusqlite::Result<SessionRow> {
    Ok(SessionRow {
        id: row.get(0)?,
        name: row.get(1)?,
        host_user_id: row.get(2)?,
        player_count: row.get(3)?,
        current_phase: row.get(4)?,
        is_active: row.get(5)?,
    })
}

fn character_from_row(row: &Row<'_>) -> rusqlite::Result<CharacterRow> {
    Ok(CharacterRow {
        id: row.get(0)?,
        session_id: row.get(1)?,
        user_id: row.get(2)?,
        first_name: row.get(3)?,
        last_name: row.get(4)?,
        profession: row.get(5)?,
        relationship_to_host: row.get(6)?,
        is_murderer: row.get(7)?,
    })
}

/// Extension trait for optional query results
trait OptionalExt<T> {
    fn optional(self) -> Result<Option<T>>;
}

impl<T> OptionalExt<T> for std::result::Result<T, rusqlite::Error> {
    fn optional(self) -> Result<Option<T>> {
        match self {
            Ok(val) => Ok(Some(val)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::is_constraint_violation;

    fn session(id: &str, name: &str, active: bool) -> SessionRow {
        SessionRow {
            id: id.to_string(),
            name: name.to_string(),
            host_user_id: "host".to_string(),
            player_count: 5,
            current_phase: 0,
            is_active: active,
        }
    }

    fn character(id: &str, session_id: &str) -> CharacterRow {
        CharacterRow {
            id: id.to_string(),
            session_id: session_id.to_string(),
            user_id: "player".to_string(),
            first_name: "Edith".to_string(),
            last_name: "Crane".to_string(),
            profession: "Gardener".to_string(),
            relationship_to_host: "Neighbour".to_string(),
            is_murderer: false,
        }
    }

    #[test]
    fn finds_user_by_email() {
        let db = Database::open_in_memory().unwrap();
        db.create_user("u1", "poirot", "hercule@example.com", "$argon2id$fake").unwrap();

        let user = db.get_user_by_email("hercule@example.com").unwrap().unwrap();
        assert_eq!(user.id, "u1");
        assert_eq!(user.username, "poirot");
        assert!(db.get_user_by_email("nobody@example.com").unwrap().is_none());
    }

    #[test]
    fn duplicate_email_is_a_constraint_violation() {
        let db = Database::open_in_memory().unwrap();
        db.create_user("u1", "a", "same@example.com", "h").unwrap();

        let err = db.create_user("u2", "b", "same@example.com", "h").unwrap_err();
        assert!(is_constraint_violation(&err));
    }

    #[test]
    fn lists_only_active_sessions_in_insertion_order() {
        let db = Database::open_in_memory().unwrap();
        db.insert_session(&session("s1", "Manor", true)).unwrap();
        db.insert_session(&session("s2", "Train", false)).unwrap();
        db.insert_session(&session("s3", "Yacht", true)).unwrap();

        let ids: Vec<String> = db.list_active_sessions().unwrap().into_iter().map(|s| s.id).collect();
        assert_eq!(ids, vec!["s1", "s3"]);
    }

    #[test]
    fn lists_characters_of_one_session() {
        let db = Database::open_in_memory().unwrap();
        db.insert_character(&character("c1", "s1")).unwrap();
        db.insert_character(&character("c2", "s2")).unwrap();
        db.insert_character(&character("c3", "s1")).unwrap();

        let ids: Vec<String> = db
            .list_characters_for_session("s1")
            .unwrap()
            .into_iter()
            .map(|c| c.id)
            .collect();
        assert_eq!(ids, vec!["c1", "c3"]);
        assert!(db.list_characters_for_session("missing").unwrap().is_empty());
    }

    #[test]
    fn character_flags_survive_storage() {
        let db = Database::open_in_memory().unwrap();
        let mut row = character("c1", "s1");
        row.is_murderer = true;
        db.insert_character(&row).unwrap();

        let stored = db.list_characters_for_session("s1").unwrap();
        assert!(stored[0].is_murderer);
        assert_eq!(stored[0].relationship_to_host, "Neighbour");
    }
}
