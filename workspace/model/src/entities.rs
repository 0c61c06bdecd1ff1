//! This file serves as the root for all SeaORM entity modules.
//! The catalog side (categories, genres, titles) and the user-generated
//! side (reviews, comments) are kept as separate module groups, tied
//! together by the `genre_title` join entity and the author references.

pub mod category;
pub mod comment;
pub mod genre;
pub mod genre_title;
pub mod review;
pub mod title;
pub mod user;

pub mod prelude {
    //! A prelude module for easy importing of all entities.
    pub use super::category::Entity as Category;
    pub use super::comment::Entity as Comment;
    pub use super::genre::Entity as Genre;
    pub use super::genre_title::Entity as GenreTitle;
    pub use super::review::Entity as Review;
    pub use super::title::Entity as Title;
    pub use super::user::Entity as User;
}

#[cfg(test)]
mod test {
    use chrono::Utc;
    use migration::{Migrator, MigratorTrait};
    use sea_orm::{
        ActiveModelTrait, ColumnTrait, ConnectionTrait, Database, DatabaseConnection, DbErr,
        EntityTrait, QueryFilter, Set,
    };

    use super::*;
    use prelude::*;

    async fn setup_db() -> Result<DatabaseConnection, DbErr> {
        // Connect to the SQLite database
        let db = Database::connect("sqlite::memory:").await?;

        // Enable foreign keys
        db.execute_unprepared("PRAGMA foreign_keys = ON;").await?;

        // Try to apply migrations first
        Migrator::up(&db, None).await.expect("Migrations failed.");
        Ok(db)
    }

    async fn insert_user(db: &DatabaseConnection, username: &str) -> Result<user::Model, DbErr> {
        user::ActiveModel {
            username: Set(username.to_string()),
            email: Set(format!("{username}@example.com")),
            first_name: Set(String::new()),
            last_name: Set(String::new()),
            bio: Set(String::new()),
            role: Set(user::Role::User),
            is_superuser: Set(false),
            ..Default::default()
        }
        .insert(db)
        .await
    }

    #[tokio::test]
    async fn test_entity_integration() -> Result<(), DbErr> {
        let db = setup_db().await?;

        let alice = insert_user(&db, "alice").await?;
        let bob = insert_user(&db, "bob").await?;

        let books = category::ActiveModel {
            name: Set("Books".to_string()),
            slug: Set("books".to_string()),
            ..Default::default()
        }
        .insert(&db)
        .await?;

        let drama = genre::ActiveModel {
            name: Set("Drama".to_string()),
            slug: Set("drama".to_string()),
            ..Default::default()
        }
        .insert(&db)
        .await?;

        let satire = genre::ActiveModel {
            name: Set("Satire".to_string()),
            slug: Set("satire".to_string()),
            ..Default::default()
        }
        .insert(&db)
        .await?;

        let title = title::ActiveModel {
            name: Set("Dead Souls".to_string()),
            year: Set(1842),
            description: Set(String::new()),
            category_id: Set(Some(books.id)),
            ..Default::default()
        }
        .insert(&db)
        .await?;

        for genre_id in [drama.id, satire.id] {
            genre_title::ActiveModel {
                title_id: Set(title.id),
                genre_id: Set(genre_id),
            }
            .insert(&db)
            .await?;
        }

        let review = review::ActiveModel {
            title_id: Set(title.id),
            author_id: Set(alice.id),
            text: Set("A classic.".to_string()),
            score: Set(9),
            pub_date: Set(Utc::now()),
            ..Default::default()
        }
        .insert(&db)
        .await?;

        comment::ActiveModel {
            review_id: Set(review.id),
            author_id: Set(bob.id),
            text: Set("Agreed.".to_string()),
            pub_date: Set(Utc::now()),
            ..Default::default()
        }
        .insert(&db)
        .await?;

        // Read back and verify data
        assert_eq!(User::find().all(&db).await?.len(), 2);
        assert_eq!(title.genres(&db).await?.len(), 2);
        assert_eq!(title.category(&db).await?.unwrap().slug, "books");
        assert_eq!(Comment::find().all(&db).await?.len(), 1);

        Ok(())
    }

    #[tokio::test]
    async fn test_duplicate_review_rejected_by_storage() -> Result<(), DbErr> {
        let db = setup_db().await?;
        let alice = insert_user(&db, "alice").await?;

        let title = title::ActiveModel {
            name: Set("Hamlet".to_string()),
            year: Set(1601),
            description: Set(String::new()),
            category_id: Set(None),
            ..Default::default()
        }
        .insert(&db)
        .await?;

        review::ActiveModel {
            title_id: Set(title.id),
            author_id: Set(alice.id),
            text: Set("First take.".to_string()),
            score: Set(7),
            pub_date: Set(Utc::now()),
            ..Default::default()
        }
        .insert(&db)
        .await?;

        // The unique (title, author) index is the authority, not any
        // application-level pre-check.
        let second = review::ActiveModel {
            title_id: Set(title.id),
            author_id: Set(alice.id),
            text: Set("Second take.".to_string()),
            score: Set(2),
            pub_date: Set(Utc::now()),
            ..Default::default()
        }
        .insert(&db)
        .await;
        assert!(second.is_err());

        Ok(())
    }

    #[tokio::test]
    async fn test_category_delete_nulls_title_reference() -> Result<(), DbErr> {
        let db = setup_db().await?;

        let films = category::ActiveModel {
            name: Set("Films".to_string()),
            slug: Set("films".to_string()),
            ..Default::default()
        }
        .insert(&db)
        .await?;

        let title = title::ActiveModel {
            name: Set("Stalker".to_string()),
            year: Set(1979),
            description: Set(String::new()),
            category_id: Set(Some(films.id)),
            ..Default::default()
        }
        .insert(&db)
        .await?;

        Category::delete_by_id(films.id).exec(&db).await?;

        let survivor = Title::find_by_id(title.id).one(&db).await?.unwrap();
        assert_eq!(survivor.category_id, None);

        Ok(())
    }

    #[tokio::test]
    async fn test_user_delete_cascades_to_reviews_and_comments() -> Result<(), DbErr> {
        let db = setup_db().await?;
        let alice = insert_user(&db, "alice").await?;
        let bob = insert_user(&db, "bob").await?;

        let title = title::ActiveModel {
            name: Set("Solaris".to_string()),
            year: Set(1972),
            description: Set(String::new()),
            category_id: Set(None),
            ..Default::default()
        }
        .insert(&db)
        .await?;

        let review = review::ActiveModel {
            title_id: Set(title.id),
            author_id: Set(alice.id),
            text: Set("Slow but rewarding.".to_string()),
            score: Set(8),
            pub_date: Set(Utc::now()),
            ..Default::default()
        }
        .insert(&db)
        .await?;

        comment::ActiveModel {
            review_id: Set(review.id),
            author_id: Set(bob.id),
            text: Set("Slow is the point.".to_string()),
            pub_date: Set(Utc::now()),
            ..Default::default()
        }
        .insert(&db)
        .await?;

        // Deleting the author takes the review down, and the review
        // takes its comments down even though bob still exists.
        User::delete_by_id(alice.id).exec(&db).await?;

        assert_eq!(Review::find().all(&db).await?.len(), 0);
        assert_eq!(Comment::find().all(&db).await?.len(), 0);
        assert!(User::find_by_id(bob.id).one(&db).await?.is_some());

        Ok(())
    }

    #[tokio::test]
    async fn test_genre_delete_drops_join_rows_only() -> Result<(), DbErr> {
        let db = setup_db().await?;

        let drama = genre::ActiveModel {
            name: Set("Drama".to_string()),
            slug: Set("drama".to_string()),
            ..Default::default()
        }
        .insert(&db)
        .await?;

        let title = title::ActiveModel {
            name: Set("Ikiru".to_string()),
            year: Set(1952),
            description: Set(String::new()),
            category_id: Set(None),
            ..Default::default()
        }
        .insert(&db)
        .await?;

        genre_title::ActiveModel {
            title_id: Set(title.id),
            genre_id: Set(drama.id),
        }
        .insert(&db)
        .await?;

        Genre::delete_by_id(drama.id).exec(&db).await?;

        let join_rows = GenreTitle::find()
            .filter(genre_title::Column::TitleId.eq(title.id))
            .all(&db)
            .await?;
        assert!(join_rows.is_empty());
        assert!(Title::find_by_id(title.id).one(&db).await?.is_some());

        Ok(())
    }
}
