//! The access-control decision function. Pure given the actor, the action
//! class, and the ownership fact; handlers call it before touching the
//! store.

use model::entities::user;

use crate::errors::AppError;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Action {
    Read,
    Create,
    /// Update and delete share one rule everywhere.
    Modify,
}

#[derive(Clone, Copy, Debug)]
pub enum Resource {
    /// Category, genre or title: world-readable, admin-writable.
    Catalog,
    /// Review or comment: world-readable, created by any authenticated
    /// actor, modified by its author, a moderator, or an admin.
    Content { author_id: i32 },
    /// The admin user-management surface.
    Users,
    /// The actor's own profile.
    OwnProfile { owner_id: i32 },
}

pub fn authorize(
    actor: Option<&user::Model>,
    action: Action,
    resource: Resource,
) -> Result<(), AppError> {
    match resource {
        Resource::Catalog => match action {
            Action::Read => Ok(()),
            Action::Create | Action::Modify => require_admin(actor),
        },
        Resource::Content { author_id } => match action {
            Action::Read => Ok(()),
            Action::Create => actor.map(|_| ()).ok_or(AppError::Unauthorized),
            Action::Modify => {
                let actor = actor.ok_or(AppError::Unauthorized)?;
                if actor.id == author_id || actor.is_moderator() || actor.is_admin() {
                    Ok(())
                } else {
                    Err(AppError::PermissionDenied)
                }
            }
        },
        Resource::Users => require_admin(actor),
        Resource::OwnProfile { owner_id } => {
            let actor = actor.ok_or(AppError::Unauthorized)?;
            if actor.id == owner_id {
                Ok(())
            } else {
                Err(AppError::PermissionDenied)
            }
        }
    }
}

fn require_admin(actor: Option<&user::Model>) -> Result<(), AppError> {
    let actor = actor.ok_or(AppError::Unauthorized)?;
    if actor.is_admin() {
        Ok(())
    } else {
        Err(AppError::PermissionDenied)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use model::entities::user::Role;

    fn account(id: i32, role: Role, is_superuser: bool) -> user::Model {
        user::Model {
            id,
            username: format!("user{id}"),
            email: format!("user{id}@example.com"),
            first_name: String::new(),
            last_name: String::new(),
            bio: String::new(),
            role,
            is_superuser,
        }
    }

    #[test]
    fn catalog_reads_are_open() {
        assert!(authorize(None, Action::Read, Resource::Catalog).is_ok());
        let user = account(1, Role::User, false);
        assert!(authorize(Some(&user), Action::Read, Resource::Catalog).is_ok());
    }

    #[test]
    fn catalog_writes_are_admin_only() {
        let user = account(1, Role::User, false);
        let moderator = account(2, Role::Moderator, false);
        let admin = account(3, Role::Admin, false);
        let superuser = account(4, Role::User, true);

        assert!(matches!(
            authorize(None, Action::Create, Resource::Catalog),
            Err(AppError::Unauthorized)
        ));
        assert!(matches!(
            authorize(Some(&user), Action::Create, Resource::Catalog),
            Err(AppError::PermissionDenied)
        ));
        assert!(matches!(
            authorize(Some(&moderator), Action::Modify, Resource::Catalog),
            Err(AppError::PermissionDenied)
        ));
        assert!(authorize(Some(&admin), Action::Create, Resource::Catalog).is_ok());
        assert!(authorize(Some(&superuser), Action::Modify, Resource::Catalog).is_ok());
    }

    #[test]
    fn content_creation_requires_authentication_only() {
        let user = account(1, Role::User, false);
        let content = Resource::Content { author_id: 99 };

        assert!(matches!(
            authorize(None, Action::Create, content),
            Err(AppError::Unauthorized)
        ));
        assert!(authorize(Some(&user), Action::Create, content).is_ok());
    }

    #[test]
    fn content_modification_is_author_moderator_or_admin() {
        let author = account(1, Role::User, false);
        let stranger = account(2, Role::User, false);
        let moderator = account(3, Role::Moderator, false);
        let admin = account(4, Role::Admin, false);
        let content = Resource::Content { author_id: 1 };

        assert!(authorize(Some(&author), Action::Modify, content).is_ok());
        assert!(matches!(
            authorize(Some(&stranger), Action::Modify, content),
            Err(AppError::PermissionDenied)
        ));
        assert!(authorize(Some(&moderator), Action::Modify, content).is_ok());
        assert!(authorize(Some(&admin), Action::Modify, content).is_ok());
        assert!(matches!(
            authorize(None, Action::Modify, content),
            Err(AppError::Unauthorized)
        ));

        // Denied actors can still read.
        assert!(authorize(Some(&stranger), Action::Read, content).is_ok());
    }

    #[test]
    fn user_directory_is_admin_only_even_to_read() {
        let user = account(1, Role::User, false);
        let moderator = account(2, Role::Moderator, false);
        let admin = account(3, Role::Admin, false);

        assert!(matches!(
            authorize(None, Action::Read, Resource::Users),
            Err(AppError::Unauthorized)
        ));
        assert!(matches!(
            authorize(Some(&user), Action::Read, Resource::Users),
            Err(AppError::PermissionDenied)
        ));
        assert!(matches!(
            authorize(Some(&moderator), Action::Read, Resource::Users),
            Err(AppError::PermissionDenied)
        ));
        assert!(authorize(Some(&admin), Action::Read, Resource::Users).is_ok());
    }

    #[test]
    fn own_profile_is_owner_only() {
        let owner = account(1, Role::User, false);
        let stranger = account(2, Role::User, false);
        let profile = Resource::OwnProfile { owner_id: 1 };

        assert!(authorize(Some(&owner), Action::Read, profile).is_ok());
        assert!(authorize(Some(&owner), Action::Modify, profile).is_ok());
        assert!(matches!(
            authorize(Some(&stranger), Action::Modify, profile),
            Err(AppError::PermissionDenied)
        ));
        assert!(matches!(
            authorize(None, Action::Read, profile),
            Err(AppError::Unauthorized)
        ));
    }
}
