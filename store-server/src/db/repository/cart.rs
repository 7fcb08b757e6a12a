//! Cart Repository
//!
//! The order core's view of the cart subsystem: read a user's selected
//! lines, delete lines once their order is paid.

use super::{record_id, BaseRepository, RepoError, RepoResult};
use crate::db::models::{CartLine, CartLineCreate};
use surrealdb::engine::local::Db;
use surrealdb::{RecordId, Surreal};

const CART_TABLE: &str = "cart_line";

#[derive(Clone)]
pub struct CartRepository {
    base: BaseRepository,
}

impl CartRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    /// Find the given cart lines, scoped to the owning user
    ///
    /// Lines belonging to other users are silently absent from the result;
    /// the caller decides whether a partial hit is an error.
    pub async fn find_by_user_and_ids(
        &self,
        user_id: i64,
        ids: &[String],
    ) -> RepoResult<Vec<CartLine>> {
        let id_things: Vec<RecordId> = ids.iter().map(|id| record_id(CART_TABLE, id)).collect();
        let lines: Vec<CartLine> = self
            .base
            .db()
            .query("SELECT * FROM cart_line WHERE user_id = $user AND id IN $ids")
            .bind(("user", user_id))
            .bind(("ids", id_things))
            .await?
            .take(0)?;
        Ok(lines)
    }

    /// Delete the given cart lines, scoped to the owning user
    pub async fn remove_by_user_and_ids(&self, user_id: i64, ids: &[String]) -> RepoResult<()> {
        let id_things: Vec<RecordId> = ids.iter().map(|id| record_id(CART_TABLE, id)).collect();
        self.base
            .db()
            .query("DELETE cart_line WHERE user_id = $user AND id IN $ids")
            .bind(("user", user_id))
            .bind(("ids", id_things))
            .await?;
        Ok(())
    }

    /// Create a cart line
    pub async fn create(&self, data: CartLineCreate) -> RepoResult<CartLine> {
        if data.quantity == 0 {
            return Err(RepoError::Validation("quantity must be positive".into()));
        }

        let line = CartLine {
            id: None,
            user_id: data.user_id,
            product: data.product,
            quantity: data.quantity,
            created_at: shared::util::now_millis(),
        };

        let created: Option<CartLine> = self.base.db().create(CART_TABLE).content(line).await?;
        created.ok_or_else(|| RepoError::Database("Failed to create cart line".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::DbService;

    async fn setup() -> CartRepository {
        let svc = DbService::new_in_memory().await.unwrap();
        CartRepository::new(svc.db.clone())
    }

    fn product_ref(key: &str) -> RecordId {
        RecordId::from_table_key("product", key)
    }

    #[tokio::test]
    async fn test_create_and_find_scoped_to_user() {
        let repo = setup().await;

        let mine = repo
            .create(CartLineCreate {
                user_id: 7,
                product: product_ref("x"),
                quantity: 2,
            })
            .await
            .unwrap();
        let theirs = repo
            .create(CartLineCreate {
                user_id: 8,
                product: product_ref("y"),
                quantity: 1,
            })
            .await
            .unwrap();

        let ids = vec![
            mine.id.clone().unwrap().to_string(),
            theirs.id.clone().unwrap().to_string(),
        ];
        let lines = repo.find_by_user_and_ids(7, &ids).await.unwrap();

        // The other user's line is invisible to user 7
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].user_id, 7);
        assert_eq!(lines[0].quantity, 2);
    }

    #[tokio::test]
    async fn test_remove_by_user_and_ids() {
        let repo = setup().await;

        let a = repo
            .create(CartLineCreate {
                user_id: 7,
                product: product_ref("x"),
                quantity: 2,
            })
            .await
            .unwrap();
        let b = repo
            .create(CartLineCreate {
                user_id: 7,
                product: product_ref("y"),
                quantity: 1,
            })
            .await
            .unwrap();

        let a_id = a.id.clone().unwrap().to_string();
        let b_id = b.id.clone().unwrap().to_string();

        repo.remove_by_user_and_ids(7, std::slice::from_ref(&a_id))
            .await
            .unwrap();

        let remaining = repo
            .find_by_user_and_ids(7, &[a_id, b_id])
            .await
            .unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].id.clone().unwrap().to_string(), b.id.unwrap().to_string());
    }

    #[tokio::test]
    async fn test_create_rejects_zero_quantity() {
        let repo = setup().await;
        let result = repo
            .create(CartLineCreate {
                user_id: 7,
                product: product_ref("x"),
                quantity: 0,
            })
            .await;
        assert!(matches!(result, Err(RepoError::Validation(_))));
    }
}
