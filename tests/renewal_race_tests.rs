//! Two requests racing to renew with the same refresh token: exactly one
//! wins. Runs against an on-disk database so the requests really use
//! separate pooled connections.

mod common;

use std::sync::Arc;

use axum::http::StatusCode;
use common::*;
use marquee::db::{Database, hash_token};

struct TempDb(std::path::PathBuf);

impl TempDb {
    fn new() -> Self {
        Self(std::env::temp_dir().join(format!("marquee-race-{}.db", uuid::Uuid::new_v4())))
    }
}

impl Drop for TempDb {
    fn drop(&mut self) {
        for suffix in ["", "-wal", "-shm"] {
            let mut path = self.0.clone().into_os_string();
            path.push(suffix);
            std::fs::remove_file(path).ok();
        }
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_renewal_has_one_winner() {
    let file = TempDb::new();
    let db = Database::open(file.0.to_str().unwrap()).await.unwrap();
    let t = app_for(db, Arc::new(FakeSource::empty()), 10_000);
    let (_, mut refresh) = register_and_login(&t.app, "alice", "pw123").await;
    let user = t.db.users().get_by_username("alice").await.unwrap().unwrap();

    for _ in 0..5 {
        let expired = t.codec.issue_access_token_at(user.id, 1_000).unwrap();
        let cookie = auth_cookies(&expired.token, &refresh);

        let (a, b) = tokio::join!(
            send(&t.app, get("/", Some(&cookie))),
            send(&t.app, get("/", Some(&cookie)))
        );
        let statuses = [a.status(), b.status()];
        let wins = statuses.iter().filter(|s| **s == StatusCode::OK).count();
        let losses = statuses.iter().filter(|s| **s == StatusCode::FOUND).count();
        assert_eq!((wins, losses), (1, 1), "statuses: {:?}", statuses);

        // The token is spent and exactly one successor was minted from it.
        let winner = if a.status() == StatusCode::OK { &a } else { &b };
        let successor = cookie_value(&extract_set_cookies(winner), "refreshToken").unwrap();
        let records = t.db.refresh_tokens().list_by_user(user.id).await.unwrap();
        let unused: Vec<_> = records.iter().filter(|r| !r.is_used).collect();
        assert_eq!(unused.len(), 1);
        assert_eq!(unused[0].token_hash, hash_token(&successor));

        refresh = successor;
    }
}
