//! Handshake authentication for `/ws`.
//!
//! Runs before the upgrade completes, so a connection is never attached or
//! registered until its identity is known.

use crate::auth::cookie;
use crate::auth::jwt;
use crate::auth::middleware::SessionKeys;
use crate::db::models::Identity;
use crate::db::{users, DbPool};
use crate::error::AuthError;

/// Credentials presented when opening a connection.
#[derive(Debug, Clone, Default)]
pub struct Handshake {
    /// Explicit `?token=` field
    pub token: Option<String>,
    /// Raw `Cookie` header
    pub cookie_header: Option<String>,
}

impl Handshake {
    /// The credential to verify, if any.
    pub fn credential(&self, cookie_name: &str) -> Option<&str> {
        cookie::credential_from(
            self.token.as_deref(),
            self.cookie_header.as_deref(),
            cookie_name,
        )
    }
}

/// Verify the handshake credential and resolve it to an identity.
pub async fn authenticate(
    db: &DbPool,
    keys: &SessionKeys,
    handshake: &Handshake,
) -> Result<Identity, AuthError> {
    let token = handshake
        .credential(&keys.cookie_name)
        .ok_or(AuthError::AuthenticationRequired)?;

    let claims = jwt::validate_session_token(&keys.secret, token).map_err(|e| {
        tracing::debug!(error = %e, "Handshake token rejected");
        AuthError::AuthenticationInvalid
    })?;

    let db = db.clone();
    let user_id = claims.sub;
    let lookup = tokio::task::spawn_blocking(move || -> Result<Option<Identity>, String> {
        let conn = db
            .lock()
            .map_err(|e| format!("DB lock error: {}", e))?;
        users::find_identity(&conn, &user_id).map_err(|e| e.to_string())
    })
    .await;

    match lookup {
        Ok(Ok(Some(identity))) => Ok(identity),
        Ok(Ok(None)) => Err(AuthError::AuthenticationInvalid),
        Ok(Err(e)) => {
            tracing::warn!(error = %e, "Identity lookup failed during handshake");
            Err(AuthError::AuthenticationInvalid)
        }
        Err(e) => {
            tracing::warn!(error = %e, "Identity lookup task failed during handshake");
            Err(AuthError::AuthenticationInvalid)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init_db;
    use crate::db::models::{NewUser, ROLE_USER};

    fn keys() -> SessionKeys {
        SessionKeys {
            secret: vec![9u8; 32],
            cookie_name: "token".to_string(),
        }
    }

    fn seeded() -> (tempfile::TempDir, DbPool, String) {
        let dir = tempfile::tempdir().unwrap();
        let db = init_db(dir.path().to_str().unwrap()).unwrap();
        let id = {
            let conn = db.lock().unwrap();
            users::insert_user(
                &conn,
                &NewUser {
                    display_name: "Alice",
                    email: "alice@example.com",
                    password_hash: "hash",
                    role: ROLE_USER,
                },
            )
            .unwrap()
        };
        (dir, db, id)
    }

    #[tokio::test]
    async fn missing_credential_is_required_error() {
        let (_dir, db, _) = seeded();
        let handshake = Handshake {
            token: None,
            cookie_header: Some("theme=dark; nonsense".to_string()),
        };
        assert_eq!(
            authenticate(&db, &keys(), &handshake).await,
            Err(AuthError::AuthenticationRequired)
        );
    }

    #[tokio::test]
    async fn bad_token_is_invalid() {
        let (_dir, db, _) = seeded();
        let handshake = Handshake {
            token: Some("not-a-jwt".to_string()),
            cookie_header: None,
        };
        assert_eq!(
            authenticate(&db, &keys(), &handshake).await,
            Err(AuthError::AuthenticationInvalid)
        );
    }

    #[tokio::test]
    async fn token_for_deleted_identity_is_invalid() {
        let (_dir, db, _) = seeded();
        let token = jwt::issue_session_token(&keys().secret, "gone", ROLE_USER).unwrap();
        let handshake = Handshake {
            token: Some(token),
            cookie_header: None,
        };
        assert_eq!(
            authenticate(&db, &keys(), &handshake).await,
            Err(AuthError::AuthenticationInvalid)
        );
    }

    #[tokio::test]
    async fn cookie_credential_resolves_identity() {
        let (_dir, db, id) = seeded();
        let token = jwt::issue_session_token(&keys().secret, &id, ROLE_USER).unwrap();
        let handshake = Handshake {
            token: None,
            cookie_header: Some(format!("theme=dark; token={}", token)),
        };
        let identity = authenticate(&db, &keys(), &handshake).await.unwrap();
        assert_eq!(identity.id, id);
        assert_eq!(identity.display_name, "Alice");
    }
}
