use rusqlite::{params, Connection, OptionalExtension, Row};

use super::{is_unique_violation, new_id, required, RepoError, RepoResult};
use crate::db::models::User;
use crate::db::NOW;
use crate::state::DbPool;

const SELECT_USER: &str = "SELECT id, username, email, full_name, password_hash, avatar,
        cover_image, refresh_token, created_at, updated_at
     FROM users";

/// Fields for a new account. The password arrives already hashed.
#[derive(Debug, Clone)]
pub struct NewUser<'a> {
    pub username: &'a str,
    pub email: &'a str,
    pub full_name: &'a str,
    pub password_hash: &'a str,
    pub avatar: &'a str,
    pub cover_image: Option<&'a str>,
}

#[derive(Clone)]
pub struct UserRepository {
    pool: DbPool,
}

impl UserRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn create(&self, new: NewUser<'_>) -> RepoResult<User> {
        let username = required("username", new.username)?.to_lowercase();
        let email = required("email", new.email)?.to_lowercase();
        let full_name = required("fullName", new.full_name)?;
        let password_hash = required("password", new.password_hash)?;
        let avatar = required("avatar", new.avatar)?;
        let cover_image = new
            .cover_image
            .map(str::trim)
            .filter(|s| !s.is_empty());

        let conn = self.pool.get()?;
        let id = new_id();
        conn.execute(
            "INSERT INTO users (id, username, email, full_name, password_hash, avatar, cover_image)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![id, username, email, full_name, password_hash, avatar, cover_image],
        )
        .map_err(|e| {
            if is_unique_violation(&e) {
                RepoError::Conflict("User with email or username already exists".into())
            } else {
                e.into()
            }
        })?;

        load(&conn, "id", &id)
    }

    pub fn find_by_id(&self, id: &str) -> RepoResult<User> {
        let conn = self.pool.get()?;
        load(&conn, "id", id)
    }

    pub fn find_by_username(&self, username: &str) -> RepoResult<User> {
        let conn = self.pool.get()?;
        load(&conn, "username", &username.trim().to_lowercase())
    }

    /// Login lookup: matches either handle or email, both case-insensitive.
    pub fn find_by_login(
        &self,
        username: Option<&str>,
        email: Option<&str>,
    ) -> RepoResult<Option<User>> {
        let username = username.map(|u| u.trim().to_lowercase());
        let email = email.map(|e| e.trim().to_lowercase());
        let conn = self.pool.get()?;
        let user = conn
            .query_row(
                &format!("{SELECT_USER} WHERE username = ?1 OR email = ?2 LIMIT 1"),
                params![username, email],
                user_from_row,
            )
            .optional()?;
        Ok(user)
    }

    pub fn update_account(&self, id: &str, full_name: &str, email: &str) -> RepoResult<User> {
        let full_name = required("fullName", full_name)?;
        let email = required("email", email)?.to_lowercase();

        let conn = self.pool.get()?;
        let changed = conn
            .execute(
                &format!(
                    "UPDATE users SET full_name = ?1, email = ?2, updated_at = {NOW} WHERE id = ?3"
                ),
                params![full_name, email, id],
            )
            .map_err(|e| {
                if is_unique_violation(&e) {
                    RepoError::Conflict("Email is already in use".into())
                } else {
                    e.into()
                }
            })?;
        if changed == 0 {
            return Err(RepoError::NotFound("User"));
        }
        load(&conn, "id", id)
    }

    pub fn set_password_hash(&self, id: &str, password_hash: &str) -> RepoResult<()> {
        self.set_column(id, "password_hash", Some(password_hash))?;
        Ok(())
    }

    pub fn set_avatar(&self, id: &str, avatar: &str) -> RepoResult<User> {
        self.set_column(id, "avatar", Some(avatar))
    }

    pub fn set_cover_image(&self, id: &str, cover_image: &str) -> RepoResult<User> {
        self.set_column(id, "cover_image", Some(cover_image))
    }

    /// Store the latest issued refresh token, or clear it on logout.
    pub fn set_refresh_token(&self, id: &str, token: Option<&str>) -> RepoResult<()> {
        self.set_column(id, "refresh_token", token)?;
        Ok(())
    }

    /// Replace the stored refresh token only if it still equals `current`.
    /// Returns false when another rotation or a logout got there first.
    pub fn swap_refresh_token(&self, id: &str, current: &str, next: &str) -> RepoResult<bool> {
        let conn = self.pool.get()?;
        let changed = conn.execute(
            &format!(
                "UPDATE users SET refresh_token = ?1, updated_at = {NOW}
                 WHERE id = ?2 AND refresh_token = ?3"
            ),
            params![next, id, current],
        )?;
        Ok(changed == 1)
    }

    fn set_column(&self, id: &str, column: &'static str, value: Option<&str>) -> RepoResult<User> {
        let conn = self.pool.get()?;
        let changed = conn.execute(
            &format!("UPDATE users SET {column} = ?1, updated_at = {NOW} WHERE id = ?2"),
            params![value, id],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound("User"));
        }
        load(&conn, "id", id)
    }
}

fn load(conn: &Connection, column: &'static str, value: &str) -> RepoResult<User> {
    conn.query_row(
        &format!("{SELECT_USER} WHERE {column} = ?1"),
        [value],
        user_from_row,
    )
    .optional()?
    .ok_or(RepoError::NotFound("User"))
}

pub(crate) fn user_from_row(row: &Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        username: row.get(1)?,
        email: row.get(2)?,
        full_name: row.get(3)?,
        password_hash: row.get(4)?,
        avatar: row.get(5)?,
        cover_image: row.get(6)?,
        refresh_token: row.get(7)?,
        created_at: row.get(8)?,
        updated_at: row.get(9)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_support;

    fn alice() -> NewUser<'static> {
        NewUser {
            username: "  Alice ",
            email: "Alice@Example.com",
            full_name: "Alice Liddell",
            password_hash: "hash",
            avatar: "http://media/a.png",
            cover_image: None,
        }
    }

    #[test]
    fn create_then_find_returns_same_fields() {
        let (_tmp, pool) = test_support::pool();
        let repo = UserRepository::new(pool);

        let created = repo.create(alice()).unwrap();
        assert_eq!(created.username, "alice");
        assert_eq!(created.email, "alice@example.com");
        assert_eq!(created.full_name, "Alice Liddell");
        assert_eq!(created.avatar, "http://media/a.png");
        assert!(created.cover_image.is_none());
        assert!(!created.created_at.is_empty());

        let found = repo.find_by_id(&created.id).unwrap();
        assert_eq!(found, created);
    }

    #[test]
    fn duplicate_username_or_email_conflicts() {
        let (_tmp, pool) = test_support::pool();
        let repo = UserRepository::new(pool);
        repo.create(alice()).unwrap();

        let same_handle = NewUser {
            email: "other@example.com",
            ..alice()
        };
        assert!(matches!(
            repo.create(same_handle),
            Err(RepoError::Conflict(_))
        ));

        let same_email = NewUser {
            username: "bob",
            ..alice()
        };
        assert!(matches!(repo.create(same_email), Err(RepoError::Conflict(_))));
    }

    #[test]
    fn blank_required_field_is_rejected() {
        let (_tmp, pool) = test_support::pool();
        let repo = UserRepository::new(pool);
        let blank = NewUser {
            full_name: "   ",
            ..alice()
        };
        assert!(matches!(repo.create(blank), Err(RepoError::Validation(_))));
    }

    #[test]
    fn login_lookup_matches_handle_or_email() {
        let (_tmp, pool) = test_support::pool();
        let repo = UserRepository::new(pool);
        let created = repo.create(alice()).unwrap();

        let by_name = repo.find_by_login(Some("ALICE"), None).unwrap().unwrap();
        assert_eq!(by_name.id, created.id);
        let by_email = repo
            .find_by_login(None, Some("alice@example.com"))
            .unwrap()
            .unwrap();
        assert_eq!(by_email.id, created.id);
        assert!(repo.find_by_login(Some("nobody"), None).unwrap().is_none());

        assert_eq!(repo.find_by_username(" Alice").unwrap().id, created.id);
        assert!(matches!(
            repo.find_by_username("nobody"),
            Err(RepoError::NotFound("User"))
        ));
    }

    #[test]
    fn refresh_token_round_trip_and_clear() {
        let (_tmp, pool) = test_support::pool();
        let repo = UserRepository::new(pool);
        let user = repo.create(alice()).unwrap();

        repo.set_refresh_token(&user.id, Some("tok")).unwrap();
        assert_eq!(
            repo.find_by_id(&user.id).unwrap().refresh_token.as_deref(),
            Some("tok")
        );
        repo.set_refresh_token(&user.id, None).unwrap();
        assert!(repo.find_by_id(&user.id).unwrap().refresh_token.is_none());
    }

    #[test]
    fn refresh_token_swap_requires_current_value() {
        let (_tmp, pool) = test_support::pool();
        let repo = UserRepository::new(pool);
        let user = repo.create(alice()).unwrap();
        repo.set_refresh_token(&user.id, Some("one")).unwrap();

        assert!(!repo.swap_refresh_token(&user.id, "stale", "two").unwrap());
        assert!(repo.swap_refresh_token(&user.id, "one", "two").unwrap());
        assert!(!repo.swap_refresh_token(&user.id, "one", "three").unwrap());
        assert_eq!(
            repo.find_by_id(&user.id).unwrap().refresh_token.as_deref(),
            Some("two")
        );
    }

    #[test]
    fn update_missing_user_is_not_found() {
        let (_tmp, pool) = test_support::pool();
        let repo = UserRepository::new(pool);
        assert!(matches!(
            repo.set_avatar("missing", "x"),
            Err(RepoError::NotFound("User"))
        ));
    }

    #[test]
    fn serialized_user_hides_secrets() {
        let (_tmp, pool) = test_support::pool();
        let repo = UserRepository::new(pool);
        let user = repo.create(alice()).unwrap();
        repo.set_refresh_token(&user.id, Some("tok")).unwrap();
        let json = serde_json::to_value(repo.find_by_id(&user.id).unwrap()).unwrap();
        assert!(json.get("passwordHash").is_none());
        assert!(json.get("refreshToken").is_none());
        assert_eq!(json["username"], "alice");
    }
}
