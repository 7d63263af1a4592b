use chrono::Utc;
use model::entities::{auth_token, prelude::*, user};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, Set,
};
use tracing::{debug, info};

use super::crypto::{generate_token, hash_token};

/// Stores a new token for the user and returns its plain value.
pub async fn issue_token(db: &DatabaseConnection, user_id: i32) -> Result<String, DbErr> {
    let token = generate_token();

    auth_token::ActiveModel {
        user_id: Set(user_id),
        token_hash: Set(hash_token(&token)),
        created_at: Set(Utc::now().naive_utc()),
        ..Default::default()
    }
    .insert(db)
    .await?;

    info!("Issued auth token for user {}", user_id);
    Ok(token)
}

pub async fn user_for_token(
    db: &DatabaseConnection,
    token: &str,
) -> Result<Option<user::Model>, DbErr> {
    let found = AuthToken::find()
        .filter(auth_token::Column::TokenHash.eq(hash_token(token)))
        .find_also_related(User)
        .one(db)
        .await?;

    Ok(found.and_then(|(_, user)| user))
}

/// Returns whether a token was deleted.
pub async fn revoke_token(db: &DatabaseConnection, token: &str) -> Result<bool, DbErr> {
    let deleted = AuthToken::delete_many()
        .filter(auth_token::Column::TokenHash.eq(hash_token(token)))
        .exec(db)
        .await?
        .rows_affected;
    debug!("Revoked {} token(s)", deleted);
    Ok(deleted > 0)
}
