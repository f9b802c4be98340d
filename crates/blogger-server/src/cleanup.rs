use std::time::Duration;

use chrono::Utc;
use tracing::{info, warn};

use blogger_api::state::AppState;
use blogger_db::queries::{refresh_tokens, users};
use blogger_db::{Database, timestamp};

/// Background task that ends stale sessions.
///
/// Guests whose refresh token has lapsed are deleted along with everything
/// they own, then every expired refresh token is dropped.
pub async fn run_cleanup_loop(state: AppState, interval_secs: u64) {
    let mut interval = tokio::time::interval(Duration::from_secs(interval_secs));

    loop {
        interval.tick().await;

        match cleanup_expired(&state.db) {
            Ok((guests, tokens)) => {
                if guests > 0 || tokens > 0 {
                    info!(
                        "Cleanup: removed {} expired guests and {} expired refresh tokens",
                        guests, tokens
                    );
                }
            }
            Err(e) => {
                warn!("Cleanup error: {:#}", e);
            }
        }
    }
}

fn cleanup_expired(db: &Database) -> anyhow::Result<(usize, usize)> {
    let now = timestamp(Utc::now());

    db.with_tx(|tx| {
        let mut guests = 0;
        for id in refresh_tokens::expired_guest_ids(tx, &now)? {
            if users::delete_user(tx, &id)? {
                guests += 1;
            }
        }
        let tokens = refresh_tokens::delete_expired_refresh_tokens(tx, &now)?;
        Ok((guests, tokens))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use blogger_db::models::{RefreshTokenRow, UserRow};

    fn user(db: &Database, name: &str, is_guest: bool, token_expires: chrono::DateTime<Utc>) -> String {
        let id = format!("{name}-id");
        let now = Utc::now();
        let row = UserRow {
            id: id.clone(),
            username: name.to_string(),
            email: format!("{name}@example.com"),
            password: "unused".to_string(),
            bio: None,
            is_guest,
            created_at: timestamp(now),
        };
        let token = RefreshTokenRow {
            token_hash: format!("{name}-token"),
            user_id: id.clone(),
            created_at: timestamp(now),
            expires_at: timestamp(token_expires),
        };
        db.with_conn(|conn| {
            users::insert_user(conn, &row)?;
            refresh_tokens::insert_refresh_token(conn, &token)
        })
        .unwrap();
        id
    }

    fn exists(db: &Database, id: &str) -> bool {
        db.with_conn(|conn| users::find_user_by_id(conn, id))
            .unwrap()
            .is_some()
    }

    #[test]
    fn prunes_only_expired() {
        let db = Database::open_in_memory().unwrap();
        let past = Utc::now() - chrono::Duration::hours(1);
        let future = Utc::now() + chrono::Duration::hours(1);

        let stale_guest = user(&db, "staleguest", true, past);
        let live_guest = user(&db, "liveguest", true, future);
        let stale_member = user(&db, "stalemember", false, past);

        let (guests, tokens) = cleanup_expired(&db).unwrap();
        assert_eq!(guests, 1);
        // The stale guest's token went with the account; only the member's is left to prune.
        assert_eq!(tokens, 1);

        assert!(!exists(&db, &stale_guest));
        assert!(exists(&db, &live_guest));
        assert!(exists(&db, &stale_member));
    }
}
