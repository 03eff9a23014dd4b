//! Watchlist, favorites, movie edits and comments through the protected
//! routes.

mod common;

use std::sync::Arc;

use axum::http::StatusCode;
use common::*;

async fn signed_in_with_movie() -> (TestApp, String) {
    let source = Arc::new(FakeSource::new(&[&[("tt0078346", "Superman")]]));
    let t = create_test_app_with(source, 10_000).await;
    send(&t.app, get("/movies", None)).await;
    let (access, refresh) = register_and_login(&t.app, "alice", "pw123").await;
    (t, auth_cookies(&access, &refresh))
}

#[tokio::test]
async fn test_add_to_watchlist_once() {
    let (t, cookie) = signed_in_with_movie().await;

    let response = send(
        &t.app,
        post_form("/addTowatchlist", "btnAddWatchlist=tt0078346", Some(&cookie)),
    )
    .await;
    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(
        redirect_message(&response).as_deref(),
        Some("Movie Added To Watchlist!")
    );

    let response = send(
        &t.app,
        post_form("/addTowatchlist", "btnAddWatchlist=tt0078346", Some(&cookie)),
    )
    .await;
    assert_eq!(
        redirect_message(&response).as_deref(),
        Some("Movie Already In Watchlist!")
    );

    let response = send(&t.app, get("/watchlist", Some(&cookie))).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        body_json(response).await,
        serde_json::json!([{
            "movie_id": "tt0078346",
            "poster_url": "https://img.example/tt0078346.jpg",
            "title": "Superman"
        }])
    );
}

#[tokio::test]
async fn test_favorites_are_separate_from_watchlist() {
    let (t, cookie) = signed_in_with_movie().await;

    let response = send(
        &t.app,
        post_form("/addToFavorites", "btnAddFavorite=tt0078346", Some(&cookie)),
    )
    .await;
    assert_eq!(
        redirect_message(&response).as_deref(),
        Some("Movie Added To Favorites!")
    );

    let favorites = body_json(send(&t.app, get("/favorites", Some(&cookie))).await).await;
    let watchlist = body_json(send(&t.app, get("/watchlist", Some(&cookie))).await).await;
    assert_eq!(favorites.as_array().unwrap().len(), 1);
    assert!(watchlist.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_add_unknown_movie() {
    let (t, cookie) = signed_in_with_movie().await;

    let response = send(
        &t.app,
        post_form("/addToFavorites", "btnAddFavorite=tt9999999", Some(&cookie)),
    )
    .await;
    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(redirect_message(&response).as_deref(), Some("Movie not found"));
}

#[tokio::test]
async fn test_lists_require_session() {
    let (t, _) = signed_in_with_movie().await;

    let response = send(
        &t.app,
        post_form("/addTowatchlist", "btnAddWatchlist=tt0078346", None),
    )
    .await;
    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(location(&response), "/login");
}

#[tokio::test]
async fn test_edit_movie() {
    let (t, cookie) = signed_in_with_movie().await;

    let response = send(&t.app, get("/movie/edit?movieId=tt0078346", Some(&cookie))).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["title"], "Superman");

    let response = send(
        &t.app,
        post_form(
            "/movie/edit",
            "movie_id=tt0078346&title=Superman%3A+The+Movie&description=&genre=Action&release_date=1978-12-15&director=Richard+Donner&user_rating=9",
            Some(&cookie),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(
        redirect_message(&response).as_deref(),
        Some("Movie successfully updated!")
    );

    let movie = t.db.movies().get("tt0078346").await.unwrap().unwrap();
    assert_eq!(movie.title, "Superman: The Movie");
    assert_eq!(movie.description, None);
    assert_eq!(movie.release_date.as_deref(), Some("1978-12-15"));
    assert_eq!(movie.director.as_deref(), Some("Richard Donner"));
    assert_eq!(movie.user_rating, Some(9));
}

#[tokio::test]
async fn test_edit_unknown_movie() {
    let (t, cookie) = signed_in_with_movie().await;

    let response = send(&t.app, get("/movie/edit?movieId=tt9999999", Some(&cookie))).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = send(
        &t.app,
        post_form("/movie/edit", "movie_id=tt9999999&title=X", Some(&cookie)),
    )
    .await;
    assert_eq!(redirect_message(&response).as_deref(), Some("Movie not found"));
}

#[tokio::test]
async fn test_edit_rejects_bad_rating() {
    let (t, cookie) = signed_in_with_movie().await;

    let response = send(
        &t.app,
        post_form(
            "/movie/edit",
            "movie_id=tt0078346&title=Superman&user_rating=great",
            Some(&cookie),
        ),
    )
    .await;
    assert_eq!(
        redirect_message(&response).as_deref(),
        Some("Rating must be a whole number")
    );
    let movie = t.db.movies().get("tt0078346").await.unwrap().unwrap();
    assert_eq!(movie.user_rating, None);
}

#[tokio::test]
async fn test_comment_uses_signed_in_username() {
    let (t, cookie) = signed_in_with_movie().await;

    let response = send(&t.app, get("/addComment?movie_id=tt0078346", Some(&cookie))).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["username"], "alice");
    assert_eq!(body["movie"]["title"], "Superman");

    // A username field in the form is ignored.
    let response = send(
        &t.app,
        post_form(
            "/addComment",
            "movie_id=tt0078346&username=mallory&newComment=Still+the+best",
            Some(&cookie),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::FOUND);
    assert!(location(&response).starts_with("/addComment?movie_id=tt0078346&"));
    assert_eq!(redirect_message(&response).as_deref(), Some("Comment Added!"));

    let comments = t.db.comments().list_for_movie("tt0078346").await.unwrap();
    assert_eq!(comments.len(), 1);
    assert_eq!(comments[0].username, "alice");
    assert_eq!(comments[0].comment, "Still the best");
}

#[tokio::test]
async fn test_empty_comment_is_rejected() {
    let (t, cookie) = signed_in_with_movie().await;

    let response = send(
        &t.app,
        post_form("/addComment", "movie_id=tt0078346&newComment=+++", Some(&cookie)),
    )
    .await;
    assert_eq!(
        redirect_message(&response).as_deref(),
        Some("Comment cannot be empty")
    );
    assert!(
        t.db.comments()
            .list_for_movie("tt0078346")
            .await
            .unwrap()
            .is_empty()
    );
}
