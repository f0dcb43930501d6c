//! User Service
//!
//! Read-only access to the user directory.

use std::sync::Arc;

use async_trait::async_trait;

use crate::application::dto::UserListItem;
use crate::domain::UserRepository;
use crate::shared::error::AppError;

/// User service trait
#[async_trait]
pub trait UserService: Send + Sync {
    /// Every account, oldest first
    async fn list_users(&self) -> Result<Vec<UserListItem>, AppError>;
}

/// UserService implementation
pub struct UserServiceImpl<U>
where
    U: UserRepository + ?Sized,
{
    user_repo: Arc<U>,
}

impl<U> UserServiceImpl<U>
where
    U: UserRepository + ?Sized,
{
    pub fn new(user_repo: Arc<U>) -> Self {
        Self { user_repo }
    }
}

#[async_trait]
impl<U> UserService for UserServiceImpl<U>
where
    U: UserRepository + ?Sized + 'static,
{
    async fn list_users(&self) -> Result<Vec<UserListItem>, AppError> {
        let users = self.user_repo.list().await?;
        Ok(users.into_iter().map(UserListItem::from).collect())
    }
}
