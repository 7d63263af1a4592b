//! User profiles as seen by other users.
//!
//! Password hashing and tokens belong to the HTTP layer; this module only
//! stores and renders user rows.

use common::{Page, UserView};
use model::entities::{prelude::*, user};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set,
};
use tracing::{info, instrument};

use crate::error::{PipelineError, Result};
use crate::paging::page_index;
use crate::render::{render_users, user_view};
use crate::viewer::Viewer;

/// Registration data with the password already hashed.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub password_hash: String,
}

/// Stores a new user. Email and username must be unused.
#[instrument(skip(db, new_user), fields(username = %new_user.username))]
pub async fn create_user<C: ConnectionTrait>(db: &C, new_user: NewUser) -> Result<UserView> {
    let email_taken = User::find()
        .filter(user::Column::Email.eq(new_user.email.as_str()))
        .count(db)
        .await?
        > 0;
    if email_taken {
        return Err(PipelineError::validation(
            "email",
            "A user with that email already exists",
        ));
    }

    let username_taken = User::find()
        .filter(user::Column::Username.eq(new_user.username.as_str()))
        .count(db)
        .await?
        > 0;
    if username_taken {
        return Err(PipelineError::validation(
            "username",
            "A user with that username already exists",
        ));
    }

    let user = user::ActiveModel {
        email: Set(new_user.email),
        username: Set(new_user.username),
        first_name: Set(new_user.first_name),
        last_name: Set(new_user.last_name),
        password_hash: Set(new_user.password_hash),
        ..Default::default()
    }
    .insert(db)
    .await?;

    info!("Registered user {} ({})", user.id, user.username);
    Ok(user_view(&user, false))
}

pub async fn find_user<C: ConnectionTrait>(db: &C, user_id: i32) -> Result<user::Model> {
    User::find_by_id(user_id)
        .one(db)
        .await?
        .ok_or_else(|| PipelineError::NotFound(format!("User {user_id} not found")))
}

#[instrument(skip(db))]
pub async fn get_user<C: ConnectionTrait>(db: &C, viewer: Viewer, user_id: i32) -> Result<UserView> {
    let user = find_user(db, user_id).await?;
    let mut views = render_users(db, viewer, vec![user]).await?;
    views
        .pop()
        .ok_or_else(|| PipelineError::NotFound(format!("User {user_id} not found")))
}

/// All users ordered by id. `page` is 1-based.
#[instrument(skip(db))]
pub async fn list_users<C: ConnectionTrait>(
    db: &C,
    viewer: Viewer,
    page: u64,
    limit: u64,
) -> Result<Page<UserView>> {
    let paginator = User::find().order_by_asc(user::Column::Id).paginate(db, limit);
    let count = paginator.num_items().await?;
    let users = match page_index(page, limit) {
        Some(index) => paginator.fetch_page(index).await?,
        None => Vec::new(),
    };
    Ok(Page::new(count, render_users(db, viewer, users).await?))
}
