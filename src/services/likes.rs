// Like toggling. The like relationship is symmetric: the target's like-set
// and the liker's reciprocal liked-set must always agree, so both writes
// happen inside one transaction.

use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{Comment, Principal, Reply, User};
use crate::store::EntityStore;

#[derive(Debug, Clone, Copy)]
pub struct ToggleOutcome {
    pub liked: bool,
    pub total_likes: usize,
}

#[derive(Clone)]
pub struct LikeEngine {
    store: EntityStore,
}

impl LikeEngine {
    pub fn new(store: EntityStore) -> Self {
        Self { store }
    }

    pub async fn toggle_comment_like(
        &self,
        comment_id: Uuid,
        principal: Principal,
    ) -> AppResult<ToggleOutcome> {
        let mut tx = self.store.begin().await?;

        let mut comment: Comment = match tx.find_by_id(comment_id).await? {
            Some(comment) => comment,
            None => {
                tx.rollback().await?;
                return Err(AppError::NotFound(format!("Comment {} not found", comment_id)));
            }
        };
        let mut user: User = match tx.find_by_id(principal.id).await? {
            Some(user) => user,
            None => {
                tx.rollback().await?;
                return Err(AppError::Unauthorized("Unknown principal".to_string()));
            }
        };

        let has_liked = comment.likes.contains(&principal.id);
        if has_liked {
            comment.likes.remove(&principal.id);
            user.liked_comments.remove(&comment_id);
        } else {
            comment.likes.insert(principal.id);
            user.liked_comments.insert(comment_id);
        }

        tx.update_by_id(&comment).await?;
        tx.update_by_id(&user).await?;
        tx.commit().await?;

        Ok(ToggleOutcome {
            liked: !has_liked,
            total_likes: comment.likes.len(),
        })
    }

    pub async fn toggle_reply_like(
        &self,
        reply_id: Uuid,
        principal: Principal,
    ) -> AppResult<ToggleOutcome> {
        let mut tx = self.store.begin().await?;

        let mut reply: Reply = match tx.find_by_id(reply_id).await? {
            Some(reply) => reply,
            None => {
                tx.rollback().await?;
                return Err(AppError::NotFound(format!("Reply {} not found", reply_id)));
            }
        };
        let mut user: User = match tx.find_by_id(principal.id).await? {
            Some(user) => user,
            None => {
                tx.rollback().await?;
                return Err(AppError::Unauthorized("Unknown principal".to_string()));
            }
        };

        let has_liked = reply.reply_likes.contains(&principal.id);
        if has_liked {
            reply.reply_likes.remove(&principal.id);
            user.liked_replies.remove(&reply_id);
        } else {
            reply.reply_likes.insert(principal.id);
            user.liked_replies.insert(reply_id);
        }

        tx.update_by_id(&reply).await?;
        tx.update_by_id(&user).await?;
        tx.commit().await?;

        Ok(ToggleOutcome {
            liked: !has_liked,
            total_likes: reply.reply_likes.len(),
        })
    }
}
