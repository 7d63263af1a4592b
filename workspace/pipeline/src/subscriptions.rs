//! Following authors.

use common::{Page, SubscriptionView};
use model::entities::{prelude::*, recipe, subscription, user};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, sea_query::Query,
};
use tracing::{debug, info, instrument, warn};

use crate::error::{PipelineError, Result};
use crate::paging::page_index;
use crate::render::recipe_short_view;
use crate::users::find_user;
use crate::viewer::Viewer;

/// Makes the viewer follow `author_id`.
#[instrument(skip(db))]
pub async fn subscribe<C: ConnectionTrait>(
    db: &C,
    viewer: Viewer,
    author_id: i32,
    recipes_limit: Option<u64>,
) -> Result<SubscriptionView> {
    let user_id = viewer.require()?;
    let author = find_user(db, author_id).await?;

    if author.id == user_id {
        return Err(PipelineError::Conflict(
            "You cannot subscribe to yourself".to_string(),
        ));
    }

    if find_subscription(db, user_id, author_id).await?.is_some() {
        warn!("User {} already follows {}", user_id, author_id);
        return Err(PipelineError::Conflict(format!(
            "You are already subscribed to {}",
            author.username
        )));
    }

    subscription::ActiveModel {
        user_id: Set(user_id),
        author_id: Set(author_id),
        ..Default::default()
    }
    .insert(db)
    .await?;

    info!("User {} subscribed to {}", user_id, author_id);
    subscription_view(db, &author, recipes_limit).await
}

#[instrument(skip(db))]
pub async fn unsubscribe<C: ConnectionTrait>(db: &C, viewer: Viewer, author_id: i32) -> Result<()> {
    let user_id = viewer.require()?;
    let author = find_user(db, author_id).await?;

    let deleted = Subscription::delete_many()
        .filter(subscription::Column::UserId.eq(user_id))
        .filter(subscription::Column::AuthorId.eq(author.id))
        .exec(db)
        .await?
        .rows_affected;

    if deleted == 0 {
        return Err(PipelineError::Conflict(format!(
            "You are not subscribed to {}",
            author.username
        )));
    }

    info!("User {} unsubscribed from {}", user_id, author_id);
    Ok(())
}

/// Authors the viewer follows, ordered by id. `page` is 1-based.
#[instrument(skip(db))]
pub async fn list_subscriptions<C: ConnectionTrait>(
    db: &C,
    viewer: Viewer,
    page: u64,
    limit: u64,
    recipes_limit: Option<u64>,
) -> Result<Page<SubscriptionView>> {
    let user_id = viewer.require()?;

    let paginator = User::find()
        .filter(
            user::Column::Id.in_subquery(
                Query::select()
                    .column(subscription::Column::AuthorId)
                    .from(subscription::Entity)
                    .and_where(subscription::Column::UserId.eq(user_id))
                    .to_owned(),
            ),
        )
        .order_by_asc(user::Column::Id)
        .paginate(db, limit);
    let count = paginator.num_items().await?;
    let authors = match page_index(page, limit) {
        Some(index) => paginator.fetch_page(index).await?,
        None => Vec::new(),
    };
    debug!("User {} follows {} authors", user_id, count);

    let mut results = Vec::with_capacity(authors.len());
    for author in &authors {
        results.push(subscription_view(db, author, recipes_limit).await?);
    }
    Ok(Page::new(count, results))
}

/// Renders a followed author with a preview of their newest recipes.
pub async fn subscription_view<C: ConnectionTrait>(
    db: &C,
    author: &user::Model,
    recipes_limit: Option<u64>,
) -> Result<SubscriptionView> {
    let by_author = Recipe::find().filter(recipe::Column::AuthorId.eq(author.id));
    let recipes_count = by_author.clone().count(db).await?;

    let mut preview = by_author
        .order_by_desc(recipe::Column::CreatedAt)
        .order_by_desc(recipe::Column::Id);
    if let Some(limit) = recipes_limit {
        preview = preview.limit(limit);
    }
    let recipes = preview.all(db).await?;

    Ok(SubscriptionView {
        email: author.email.clone(),
        id: author.id,
        username: author.username.clone(),
        first_name: author.first_name.clone(),
        last_name: author.last_name.clone(),
        is_subscribed: true,
        recipes: recipes.iter().map(recipe_short_view).collect(),
        recipes_count,
    })
}

async fn find_subscription<C: ConnectionTrait>(
    db: &C,
    user_id: i32,
    author_id: i32,
) -> Result<Option<subscription::Model>> {
    Ok(Subscription::find()
        .filter(subscription::Column::UserId.eq(user_id))
        .filter(subscription::Column::AuthorId.eq(author_id))
        .one(db)
        .await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::*;

    #[tokio::test]
    async fn test_cannot_subscribe_twice_or_to_self() -> Result<()> {
        let db = setup_db().await?;
        let author = new_user(&db, "author").await?;
        let reader = new_user(&db, "reader").await?;

        let err = subscribe(&db, Viewer::user(reader.id), reader.id, None).await.unwrap_err();
        assert!(matches!(err, PipelineError::Conflict(_)));
        assert_eq!(Subscription::find().count(&db).await?, 0);

        let view = subscribe(&db, Viewer::user(reader.id), author.id, None).await?;
        assert_eq!(view.id, author.id);
        assert!(view.is_subscribed);

        let err = subscribe(&db, Viewer::user(reader.id), author.id, None).await.unwrap_err();
        assert!(matches!(err, PipelineError::Conflict(_)));
        assert_eq!(Subscription::find().count(&db).await?, 1);

        let err = subscribe(&db, Viewer::user(reader.id), 999, None).await.unwrap_err();
        assert!(matches!(err, PipelineError::NotFound(_)));

        Ok(())
    }

    #[tokio::test]
    async fn test_unsubscribe() -> Result<()> {
        let db = setup_db().await?;
        let author = new_user(&db, "author").await?;
        let reader = new_user(&db, "reader").await?;

        let err = unsubscribe(&db, Viewer::user(reader.id), author.id).await.unwrap_err();
        assert!(matches!(err, PipelineError::Conflict(_)));

        subscribe(&db, Viewer::user(reader.id), author.id, None).await?;
        unsubscribe(&db, Viewer::user(reader.id), author.id).await?;
        assert_eq!(Subscription::find().count(&db).await?, 0);

        Ok(())
    }

    #[tokio::test]
    async fn test_list_subscriptions_caps_recipes() -> Result<()> {
        let db = setup_db().await?;
        let alice = new_user(&db, "alice").await?;
        let bob = new_user(&db, "bob").await?;
        let reader = new_user(&db, "reader").await?;

        let _old = new_recipe(&db, &alice, &[], &[]).await?;
        let newest = new_recipe(&db, &alice, &[], &[]).await?;
        new_recipe(&db, &bob, &[], &[]).await?;

        let viewer = Viewer::user(reader.id);
        subscribe(&db, viewer, bob.id, None).await?;
        subscribe(&db, viewer, alice.id, None).await?;

        let page = list_subscriptions(&db, viewer, 1, 10, Some(1)).await?;
        assert_eq!(page.count, 2);
        assert_eq!(page.results[0].id, alice.id);
        assert_eq!(page.results[0].recipes_count, 2);
        assert_eq!(page.results[0].recipes.len(), 1);
        assert_eq!(page.results[0].recipes[0].id, newest.id);
        assert_eq!(page.results[1].id, bob.id);

        let uncapped = list_subscriptions(&db, viewer, 1, 10, None).await?;
        assert_eq!(uncapped.results[0].recipes.len(), 2);

        // Only the viewer's own subscriptions
        let empty = list_subscriptions(&db, Viewer::user(alice.id), 1, 10, None).await?;
        assert_eq!(empty.count, 0);

        Ok(())
    }
}
