mod common;

use common::*;
use movie_review_backend::api::error::AppError;
use movie_review_backend::entities::movies::MovieStatus;
use movie_review_backend::entities::prelude::*;
use movie_review_backend::entities::users::UserRole;
use movie_review_backend::models::movie::{MovieListQuery, MovieRequest};
use movie_review_backend::services::access::Identity;
use movie_review_backend::services::movie_service::MovieService;
use sea_orm::EntityTrait;

fn request(title: &str, year: i32, genre_ids: Vec<i32>) -> MovieRequest {
    MovieRequest {
        title: title.to_string(),
        description: Some("A film".to_string()),
        release_year: year,
        duration_min: 120,
        genre_ids,
    }
}

async fn titles(service: &MovieService, q: &str) -> Vec<String> {
    let query = MovieListQuery {
        genre_id: None,
        q: Some(q.to_string()),
    };
    service
        .list(&query, &Identity::anonymous())
        .await
        .unwrap()
        .into_iter()
        .map(|m| m.title)
        .collect()
}

#[tokio::test]
async fn test_initial_status_depends_on_creator_role() {
    let db = setup_test_db().await;
    let service = MovieService::new(db.clone());
    let user = create_user(&db, "uploader", UserRole::User).await;
    let admin = create_user(&db, "admin", UserRole::Admin).await;

    let pending = service
        .create(request("Pending Film", 2020, vec![]), &identity_of(&user))
        .await
        .unwrap();
    assert_eq!(pending.status, MovieStatus::Pending);
    assert_eq!(pending.uploaded_by_user_id, user.id);

    let approved = service
        .create(request("Admin Film", 2020, vec![]), &identity_of(&admin))
        .await
        .unwrap();
    assert_eq!(approved.status, MovieStatus::Approved);
}

#[tokio::test]
async fn test_anonymous_create_is_unauthorized() {
    let db = setup_test_db().await;
    let service = MovieService::new(db.clone());

    let err = service
        .create(request("Nobody's Film", 2020, vec![]), &Identity::anonymous())
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Unauthorized(_)));
}

#[tokio::test]
async fn test_list_hides_unapproved_movies_from_non_admins() {
    let db = setup_test_db().await;
    let service = MovieService::new(db.clone());
    let user = create_user(&db, "viewer", UserRole::User).await;
    let admin = create_user(&db, "admin", UserRole::Admin).await;

    insert_movie(&db, "Approved", 2001, MovieStatus::Approved, user.id, &[]).await;
    insert_movie(&db, "Pending", 2002, MovieStatus::Pending, user.id, &[]).await;
    insert_movie(&db, "Rejected", 2003, MovieStatus::Rejected, user.id, &[]).await;

    let query = MovieListQuery::default();

    for identity in [Identity::anonymous(), identity_of(&user)] {
        let movies = service.list(&query, &identity).await.unwrap();
        assert_eq!(movies.len(), 1);
        assert!(movies.iter().all(|m| m.status == MovieStatus::Approved));
    }

    let all = service.list(&query, &identity_of(&admin)).await.unwrap();
    assert_eq!(all.len(), 3);
    // Newest first
    assert_eq!(all[0].title, "Rejected");
}

#[tokio::test]
async fn test_list_filters_by_genre_and_title() {
    let db = setup_test_db().await;
    let service = MovieService::new(db.clone());
    let user = create_user(&db, "viewer", UserRole::User).await;
    let scifi = create_genre(&db, "Sci-Fi").await;
    let drama = create_genre(&db, "Drama").await;

    insert_movie(&db, "Interstellar", 2014, MovieStatus::Approved, user.id, &[scifi.id, drama.id]).await;
    insert_movie(&db, "Titanic", 1997, MovieStatus::Approved, user.id, &[drama.id]).await;
    insert_movie(&db, "Hidden Sci-Fi", 2020, MovieStatus::Pending, user.id, &[scifi.id]).await;

    let by_genre = service
        .list(
            &MovieListQuery {
                genre_id: Some(scifi.id),
                q: None,
            },
            &Identity::anonymous(),
        )
        .await
        .unwrap();
    assert_eq!(by_genre.len(), 1);
    assert_eq!(by_genre[0].title, "Interstellar");
    assert_eq!(by_genre[0].genres, vec!["Drama".to_string(), "Sci-Fi".to_string()]);

    let by_title = service
        .list(
            &MovieListQuery {
                genre_id: None,
                q: Some("TITAN".to_string()),
            },
            &Identity::anonymous(),
        )
        .await
        .unwrap();
    assert_eq!(by_title.len(), 1);
    assert_eq!(by_title[0].title, "Titanic");
}

#[tokio::test]
async fn test_title_search_treats_wildcards_literally() {
    let db = setup_test_db().await;
    let service = MovieService::new(db.clone());
    let user = create_user(&db, "viewer", UserRole::User).await;

    insert_movie(&db, "Alpha", 2001, MovieStatus::Approved, user.id, &[]).await;
    insert_movie(&db, "Beta", 2002, MovieStatus::Approved, user.id, &[]).await;
    insert_movie(&db, "100% Wolf", 2020, MovieStatus::Approved, user.id, &[]).await;
    insert_movie(&db, "Snake_Eyes", 1998, MovieStatus::Approved, user.id, &[]).await;

    assert_eq!(titles(&service, "%").await, vec!["100% Wolf".to_string()]);
    assert_eq!(titles(&service, "_").await, vec!["Snake_Eyes".to_string()]);
    assert!(titles(&service, "a_p").await.is_empty());
    assert!(titles(&service, "\\").await.is_empty());
    assert_eq!(titles(&service, "E_EY").await, vec!["Snake_Eyes".to_string()]);
}

#[tokio::test]
async fn test_average_score_is_mean_or_zero() {
    let db = setup_test_db().await;
    let service = MovieService::new(db.clone());
    let owner = create_user(&db, "owner", UserRole::User).await;
    let a = create_user(&db, "a", UserRole::User).await;
    let b = create_user(&db, "b", UserRole::User).await;

    let reviewed = insert_movie(&db, "Reviewed", 2010, MovieStatus::Approved, owner.id, &[]).await;
    insert_movie(&db, "Unreviewed", 2011, MovieStatus::Approved, owner.id, &[]).await;
    insert_review(&db, reviewed.id, a.id, 7).await;
    insert_review(&db, reviewed.id, b.id, 10).await;

    let movies = service
        .list(&MovieListQuery::default(), &Identity::anonymous())
        .await
        .unwrap();
    let find = |title: &str| movies.iter().find(|m| m.title == title).unwrap().average_score;
    assert_eq!(find("Reviewed"), 8.5);
    assert_eq!(find("Unreviewed"), 0.0);

    let details = service.get(reviewed.id, &Identity::anonymous()).await.unwrap();
    assert_eq!(details.average_score, 8.5);
}

#[tokio::test]
async fn test_get_unapproved_movie_visibility() {
    let db = setup_test_db().await;
    let service = MovieService::new(db.clone());
    let owner = create_user(&db, "owner", UserRole::User).await;
    let other = create_user(&db, "other", UserRole::User).await;
    let admin = create_user(&db, "admin", UserRole::Admin).await;
    let movie = insert_movie(&db, "Draft", 2022, MovieStatus::Pending, owner.id, &[]).await;

    assert!(service.get(movie.id, &identity_of(&owner)).await.is_ok());
    assert!(service.get(movie.id, &identity_of(&admin)).await.is_ok());
    assert!(matches!(
        service.get(movie.id, &identity_of(&other)).await,
        Err(AppError::Forbidden(_))
    ));
    assert!(matches!(
        service.get(movie.id, &Identity::anonymous()).await,
        Err(AppError::Forbidden(_))
    ));
    assert!(matches!(
        service.get(9999, &identity_of(&admin)).await,
        Err(AppError::NotFound(_))
    ));
}

#[tokio::test]
async fn test_create_rejects_unknown_genres() {
    let db = setup_test_db().await;
    let service = MovieService::new(db.clone());
    let user = create_user(&db, "uploader", UserRole::User).await;
    let genre = create_genre(&db, "Action").await;

    let err = service
        .create(request("Bad Genres", 2020, vec![genre.id, 4242]), &identity_of(&user))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    // Nothing was written
    assert!(Movies::find().all(&db).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_title_year_conflict_is_case_insensitive_and_excludes_self() {
    let db = setup_test_db().await;
    let service = MovieService::new(db.clone());
    let user = create_user(&db, "uploader", UserRole::User).await;
    let identity = identity_of(&user);

    let first = service
        .create(request("Inception", 2010, vec![]), &identity)
        .await
        .unwrap();

    let err = service
        .create(request("inception", 2010, vec![]), &identity)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));

    // Same title, different year is fine
    service
        .create(request("Inception", 2011, vec![]), &identity)
        .await
        .unwrap();

    // Updating a movie in place does not conflict with itself
    service
        .update(first.id, request("Inception", 2010, vec![]), &identity)
        .await
        .unwrap();

    let err = service
        .update(first.id, request("INCEPTION", 2011, vec![]), &identity)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));
}

#[tokio::test]
async fn test_non_admin_edit_of_approved_movie_returns_to_pending() {
    let db = setup_test_db().await;
    let service = MovieService::new(db.clone());
    let owner = create_user(&db, "owner", UserRole::User).await;
    let admin = create_user(&db, "admin", UserRole::Admin).await;
    let genre = create_genre(&db, "Drama").await;

    let created = service
        .create(request("Edited", 2015, vec![]), &identity_of(&owner))
        .await
        .unwrap();
    let approved = service.approve(created.id, &identity_of(&admin)).await.unwrap();
    assert_eq!(approved.status, MovieStatus::Approved);

    let edited = service
        .update(
            created.id,
            request("Edited", 2015, vec![genre.id, genre.id]),
            &identity_of(&owner),
        )
        .await
        .unwrap();
    assert_eq!(edited.status, MovieStatus::Pending);
    assert_eq!(edited.genre_ids, vec![genre.id]);

    // Admin edits keep the current status
    service.approve(created.id, &identity_of(&admin)).await.unwrap();
    let admin_edit = service
        .update(created.id, request("Edited", 2015, vec![]), &identity_of(&admin))
        .await
        .unwrap();
    assert_eq!(admin_edit.status, MovieStatus::Approved);
    assert!(admin_edit.genre_ids.is_empty());
}

#[tokio::test]
async fn test_only_owner_or_admin_can_modify() {
    let db = setup_test_db().await;
    let service = MovieService::new(db.clone());
    let owner = create_user(&db, "owner", UserRole::User).await;
    let other = create_user(&db, "other", UserRole::User).await;
    let movie = insert_movie(&db, "Mine", 2019, MovieStatus::Approved, owner.id, &[]).await;

    let err = service
        .update(movie.id, request("Stolen", 2019, vec![]), &identity_of(&other))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Forbidden(_)));

    let err = service.delete(movie.id, &identity_of(&other)).await.unwrap_err();
    assert!(matches!(err, AppError::Forbidden(_)));

    let err = service.delete(movie.id, &Identity::anonymous()).await.unwrap_err();
    assert!(matches!(err, AppError::Unauthorized(_)));
}

#[tokio::test]
async fn test_moderation_is_admin_only() {
    let db = setup_test_db().await;
    let service = MovieService::new(db.clone());
    let owner = create_user(&db, "owner", UserRole::User).await;
    let admin = create_user(&db, "admin", UserRole::Admin).await;
    let movie = insert_movie(&db, "Queued", 2018, MovieStatus::Pending, owner.id, &[]).await;

    assert!(matches!(
        service.approve(movie.id, &identity_of(&owner)).await,
        Err(AppError::Forbidden(_))
    ));

    let rejected = service.reject(movie.id, &identity_of(&admin)).await.unwrap();
    assert_eq!(rejected.status, MovieStatus::Rejected);

    assert!(matches!(
        service.approve(9999, &identity_of(&admin)).await,
        Err(AppError::NotFound(_))
    ));
}

#[tokio::test]
async fn test_delete_removes_reviews_and_genre_links() {
    let db = setup_test_db().await;
    let service = MovieService::new(db.clone());
    let owner = create_user(&db, "owner", UserRole::User).await;
    let reviewer = create_user(&db, "reviewer", UserRole::User).await;
    let genre = create_genre(&db, "Horror").await;
    let movie = insert_movie(&db, "Doomed", 2017, MovieStatus::Approved, owner.id, &[genre.id]).await;
    insert_review(&db, movie.id, reviewer.id, 6).await;

    service.delete(movie.id, &identity_of(&owner)).await.unwrap();

    assert!(Movies::find_by_id(movie.id).one(&db).await.unwrap().is_none());
    assert!(Reviews::find().all(&db).await.unwrap().is_empty());
    assert!(MovieGenres::find().all(&db).await.unwrap().is_empty());
    assert!(Genres::find_by_id(genre.id).one(&db).await.unwrap().is_some());
}

#[tokio::test]
async fn test_movie_reviews_hide_text_unless_requested() {
    let db = setup_test_db().await;
    let service = MovieService::new(db.clone());
    let owner = create_user(&db, "owner", UserRole::User).await;
    let reviewer = create_user(&db, "reviewer", UserRole::User).await;
    let movie = insert_movie(&db, "Talked About", 2016, MovieStatus::Approved, owner.id, &[]).await;
    insert_review(&db, movie.id, reviewer.id, 9).await;

    let bare = service
        .reviews(movie.id, false, &Identity::anonymous())
        .await
        .unwrap();
    assert_eq!(bare.movie_id, movie.id);
    assert_eq!(bare.reviews.len(), 1);
    assert!(bare.reviews[0].title.is_none());
    assert!(bare.reviews[0].body.is_none());

    let full = service
        .reviews(movie.id, true, &Identity::anonymous())
        .await
        .unwrap();
    assert_eq!(full.reviews[0].title.as_deref(), Some("Review"));
}

#[tokio::test]
async fn test_list_uploaded_by_caller_includes_all_statuses() {
    let db = setup_test_db().await;
    let service = MovieService::new(db.clone());
    let owner = create_user(&db, "owner", UserRole::User).await;
    let other = create_user(&db, "other", UserRole::User).await;
    insert_movie(&db, "Mine Pending", 2020, MovieStatus::Pending, owner.id, &[]).await;
    insert_movie(&db, "Mine Rejected", 2020, MovieStatus::Rejected, owner.id, &[]).await;
    insert_movie(&db, "Theirs", 2020, MovieStatus::Approved, other.id, &[]).await;

    let mine = service
        .list_uploaded_by_caller(&identity_of(&owner))
        .await
        .unwrap();
    assert_eq!(mine.len(), 2);
    assert!(mine.iter().all(|m| m.uploaded_by_user_id == owner.id));
}
