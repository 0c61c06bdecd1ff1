use super::{genre, title};
use sea_orm::entity::prelude::*;

/// Join entity for the many-to-many title/genre association. Rows are
/// dropped by the storage layer when either side is deleted.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "genre_title")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub title_id: i32,
    #[sea_orm(primary_key)]
    pub genre_id: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "title::Entity",
        from = "Column::TitleId",
        to = "title::Column::Id"
    )]
    Title,
    #[sea_orm(
        belongs_to = "genre::Entity",
        from = "Column::GenreId",
        to = "genre::Column::Id"
    )]
    Genre,
}

impl Related<title::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Title.def()
    }
}

impl Related<genre::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Genre.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
