use sea_orm::entity::prelude::*;

/// The role an account holds. Stored as a string column but closed on the
/// Rust side so nothing ever branches on raw strings.
#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
pub enum Role {
    #[sea_orm(string_value = "user")]
    User,
    #[sea_orm(string_value = "moderator")]
    Moderator,
    #[sea_orm(string_value = "admin")]
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Moderator => "moderator",
            Role::Admin => "admin",
        }
    }

    /// Parses the wire representation. Unknown values are rejected at the
    /// validation layer, so this returns `None` rather than defaulting.
    pub fn parse(value: &str) -> Option<Role> {
        match value {
            "user" => Some(Role::User),
            "moderator" => Some(Role::Moderator),
            "admin" => Some(Role::Admin),
            _ => None,
        }
    }
}

/// Represents a registered account.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub username: String,
    #[sea_orm(unique)]
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    #[sea_orm(column_type = "Text")]
    pub bio: String,
    pub role: Role,
    pub is_superuser: bool,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::review::Entity")]
    Review,
    #[sea_orm(has_many = "super::comment::Entity")]
    Comment,
}

impl Related<super::review::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Review.def()
    }
}

impl Related<super::comment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Comment.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Admin capability: the admin role, or the superuser flag set at the
    /// database level. All admin gating goes through this single check.
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin || self.is_superuser
    }

    pub fn is_moderator(&self) -> bool {
        self.role == Role::Moderator
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn account(role: Role, is_superuser: bool) -> Model {
        Model {
            id: 1,
            username: "somebody".to_string(),
            email: "somebody@example.com".to_string(),
            first_name: String::new(),
            last_name: String::new(),
            bio: String::new(),
            role,
            is_superuser,
        }
    }

    #[test]
    fn admin_capability_from_role() {
        assert!(account(Role::Admin, false).is_admin());
        assert!(!account(Role::User, false).is_admin());
        assert!(!account(Role::Moderator, false).is_admin());
    }

    #[test]
    fn admin_capability_from_superuser_flag() {
        // A superuser is an admin regardless of the stored role.
        assert!(account(Role::User, true).is_admin());
        assert!(account(Role::Moderator, true).is_admin());
    }

    #[test]
    fn moderator_is_not_admin() {
        let moderator = account(Role::Moderator, false);
        assert!(moderator.is_moderator());
        assert!(!moderator.is_admin());
    }

    #[test]
    fn role_round_trips_through_wire_form() {
        for role in [Role::User, Role::Moderator, Role::Admin] {
            assert_eq!(Role::parse(role.as_str()), Some(role));
        }
        assert_eq!(Role::parse("owner"), None);
    }
}
