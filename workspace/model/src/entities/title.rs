use sea_orm::entity::prelude::*;
use sea_orm::{DatabaseConnection, ModelTrait};

/// A cataloged work. The category reference is nullable and survives
/// category deletion (set-null at the storage layer); genres attach
/// through the `genre_title` join entity.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "titles")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub name: String,
    pub year: i32,
    #[sea_orm(column_type = "Text")]
    pub description: String,
    pub category_id: Option<i32>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::category::Entity",
        from = "Column::CategoryId",
        to = "super::category::Column::Id",
        on_update = "Cascade",
        on_delete = "SetNull"
    )]
    Category,
    #[sea_orm(has_many = "super::review::Entity")]
    Review,
}

impl Related<super::category::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Category.def()
    }
}

impl Related<super::review::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Review.def()
    }
}

impl Related<super::genre::Entity> for Entity {
    fn to() -> RelationDef {
        super::genre_title::Relation::Genre.def()
    }

    fn via() -> Option<RelationDef> {
        Some(super::genre_title::Relation::Title.def().rev())
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Mean of the scores of this title's reviews, truncated to an
    /// integer. Recomputed on every call; `None` when no reviews exist,
    /// never zero.
    pub async fn rating(&self, db: &DatabaseConnection) -> Result<Option<i32>, DbErr> {
        let reviews = self.find_related(super::review::Entity).all(db).await?;
        if reviews.is_empty() {
            return Ok(None);
        }
        let sum: i64 = reviews.iter().map(|r| r.score as i64).sum();
        Ok(Some((sum / reviews.len() as i64) as i32))
    }

    /// The genres attached to this title through the join table.
    pub async fn genres(
        &self,
        db: &DatabaseConnection,
    ) -> Result<Vec<super::genre::Model>, DbErr> {
        self.find_related(super::genre::Entity).all(db).await
    }

    pub async fn category(
        &self,
        db: &DatabaseConnection,
    ) -> Result<Option<super::category::Model>, DbErr> {
        match self.category_id {
            Some(_) => self.find_related(super::category::Entity).one(db).await,
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{review, user};
    use chrono::Utc;
    use migration::{Migrator, MigratorTrait};
    use sea_orm::{ActiveModelTrait, ConnectionTrait, Database, Set};

    async fn setup_db() -> DatabaseConnection {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        db.execute_unprepared("PRAGMA foreign_keys = ON;")
            .await
            .unwrap();
        Migrator::up(&db, None).await.expect("Migrations failed.");
        db
    }

    async fn create_user(db: &DatabaseConnection, username: &str) -> user::Model {
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
        .unwrap()
    }

    async fn create_title(db: &DatabaseConnection, name: &str) -> Model {
        ActiveModel {
            name: Set(name.to_string()),
            year: Set(1994),
            description: Set(String::new()),
            category_id: Set(None),
            ..Default::default()
        }
        .insert(db)
        .await
        .unwrap()
    }

    async fn create_review(
        db: &DatabaseConnection,
        title: &Model,
        author: &user::Model,
        score: i16,
    ) -> review::Model {
        review::ActiveModel {
            title_id: Set(title.id),
            author_id: Set(author.id),
            text: Set("fine".to_string()),
            score: Set(score),
            pub_date: Set(Utc::now()),
            ..Default::default()
        }
        .insert(db)
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn rating_is_absent_without_reviews() {
        let db = setup_db().await;
        let title = create_title(&db, "Pulp Fiction").await;

        assert_eq!(title.rating(&db).await.unwrap(), None);
    }

    #[tokio::test]
    async fn rating_is_mean_of_scores() {
        let db = setup_db().await;
        let title = create_title(&db, "Pulp Fiction").await;
        let alice = create_user(&db, "alice").await;
        let bob = create_user(&db, "bob").await;

        create_review(&db, &title, &alice, 4).await;
        create_review(&db, &title, &bob, 8).await;

        assert_eq!(title.rating(&db).await.unwrap(), Some(6));
    }

    #[tokio::test]
    async fn rating_truncates_toward_zero() {
        let db = setup_db().await;
        let title = create_title(&db, "Pulp Fiction").await;
        let alice = create_user(&db, "alice").await;
        let bob = create_user(&db, "bob").await;
        let carol = create_user(&db, "carol").await;

        create_review(&db, &title, &alice, 10).await;
        create_review(&db, &title, &bob, 10).await;
        create_review(&db, &title, &carol, 9).await;

        // 29 / 3 = 9.66…, reported as 9
        assert_eq!(title.rating(&db).await.unwrap(), Some(9));
    }

    #[tokio::test]
    async fn rating_only_counts_own_reviews() {
        let db = setup_db().await;
        let rated = create_title(&db, "Rated").await;
        let other = create_title(&db, "Unrated").await;
        let alice = create_user(&db, "alice").await;

        create_review(&db, &rated, &alice, 3).await;

        assert_eq!(rated.rating(&db).await.unwrap(), Some(3));
        assert_eq!(other.rating(&db).await.unwrap(), None);
    }
}
