//! Catalog administration. Reads are public, writes are admin only.

use tracing::info;

use bazaar_core::catalog::{apply_patch, build_product, NewProduct, ProductPatch};
use bazaar_core::{authorize, Caller, CoreError, Product, Role};
use bazaar_db::ProductRepository;

use super::EngineResult;

const ADMIN_ONLY: &[Role] = &[Role::Admin];

#[derive(Debug, Clone)]
pub struct CatalogEngine {
    products: ProductRepository,
}

impl CatalogEngine {
    pub fn new(products: ProductRepository) -> Self {
        CatalogEngine { products }
    }

    pub async fn create_product(&self, caller: &Caller, input: NewProduct) -> EngineResult<Product> {
        authorize(caller, Some(ADMIN_ONLY), None)?;

        let product = build_product(input, &caller.user_id)?;
        let product = self.products.insert(&product).await?;

        info!(product_id = %product.id, name = %product.name, "Product created");
        Ok(product)
    }

    pub async fn update_product(
        &self,
        caller: &Caller,
        id: &str,
        patch: ProductPatch,
    ) -> EngineResult<Product> {
        authorize(caller, Some(ADMIN_ONLY), None)?;

        let current = self.get_product(id).await?;
        let updated = apply_patch(&current, patch)?;
        self.products.update(&updated).await?;

        info!(product_id = %id, "Product updated");
        Ok(updated)
    }

    /// Removes the product. Returns what was deleted.
    pub async fn delete_product(&self, caller: &Caller, id: &str) -> EngineResult<Product> {
        authorize(caller, Some(ADMIN_ONLY), None)?;

        let product = self.get_product(id).await?;
        self.products.delete(id).await?;

        info!(product_id = %id, "Product removed");
        Ok(product)
    }

    pub async fn get_product(&self, id: &str) -> EngineResult<Product> {
        Ok(self
            .products
            .get_by_id(id)
            .await?
            .ok_or_else(|| CoreError::not_found("product", id))?)
    }

    pub async fn list_products(&self) -> EngineResult<Vec<Product>> {
        Ok(self.products.list().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::test_support::{admin, customer, memory_db};
    use crate::engine::EngineError;

    fn desk() -> NewProduct {
        NewProduct {
            name: "Desk".to_string(),
            description: "Oak desk".to_string(),
            price_cents: Some(19999),
            category: "office".to_string(),
            company: "marcos".to_string(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_admin_crud() {
        let db = memory_db().await;
        let engine = CatalogEngine::new(db.products());

        let created = engine.create_product(&admin(), desk()).await.unwrap();
        assert_eq!(created.created_by, "admin-1");
        assert_eq!(created.inventory, bazaar_core::DEFAULT_INVENTORY);

        let updated = engine
            .update_product(
                &admin(),
                &created.id,
                ProductPatch {
                    price_cents: Some(17999),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.price_cents, 17999);
        assert_eq!(engine.get_product(&created.id).await.unwrap().price_cents, 17999);

        assert_eq!(engine.list_products().await.unwrap().len(), 1);

        engine.delete_product(&admin(), &created.id).await.unwrap();
        assert!(matches!(
            engine.get_product(&created.id).await,
            Err(EngineError::Core(CoreError::NotFound { .. }))
        ));
    }

    #[tokio::test]
    async fn test_customers_cannot_write() {
        let db = memory_db().await;
        let engine = CatalogEngine::new(db.products());

        assert!(matches!(
            engine.create_product(&customer("u-1"), desk()).await,
            Err(EngineError::Core(CoreError::Forbidden(_)))
        ));
        assert_eq!(db.products().count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_validation_reports_every_field() {
        let db = memory_db().await;
        let engine = CatalogEngine::new(db.products());

        let err = engine
            .create_product(
                &admin(),
                NewProduct {
                    name: String::new(),
                    price_cents: Some(-5),
                    category: "garage".to_string(),
                    ..desk()
                },
            )
            .await
            .unwrap_err();

        let EngineError::Core(CoreError::InvalidArgument { fields, .. }) = err else {
            panic!("expected InvalidArgument, got {err:?}");
        };
        let names: Vec<_> = fields.iter().map(|f| f.field.as_str()).collect();
        assert!(names.contains(&"name"));
        assert!(names.contains(&"price"));
        assert!(names.contains(&"category"));
    }

    #[tokio::test]
    async fn test_update_missing_product() {
        let db = memory_db().await;
        let engine = CatalogEngine::new(db.products());

        assert!(matches!(
            engine
                .update_product(&admin(), "missing", ProductPatch::default())
                .await,
            Err(EngineError::Core(CoreError::NotFound { .. }))
        ));
    }
}
