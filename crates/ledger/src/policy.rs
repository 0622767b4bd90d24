use eximhub_auth::Role;
use eximhub_catalog::Product;
use eximhub_core::{ActorId, DomainError, DomainResult};

/// Decide whether `actor` may import from `product`.
///
/// Pure check over already-fetched records; the caller resolves the role
/// (`None` when the directory has no entry for the actor).
///
/// Self-import is checked before capability, so an exporter hitting their own
/// listing hears `SelfImportForbidden` rather than a capability refusal.
pub fn authorize_import(product: &Product, actor: ActorId, role: Option<Role>) -> DomainResult<()> {
    if product.is_owned_by(actor) {
        return Err(DomainError::SelfImportForbidden);
    }
    match role {
        Some(Role::Importer) => Ok(()),
        Some(Role::Exporter) => Err(DomainError::forbidden("importer capability required")),
        None => Err(DomainError::forbidden("actor is not registered")),
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use eximhub_catalog::ListingDraft;

    use super::*;

    fn product_owned_by(owner: ActorId) -> Product {
        Product::from_draft(
            owner,
            ListingDraft {
                name: "Olive oil".into(),
                origin: "Crete".into(),
                price_cents: 1200,
                rating: None,
                initial_quantity: 10,
            },
            Utc::now(),
        )
        .unwrap()
    }

    #[test]
    fn importer_may_import_foreign_product() {
        let product = product_owned_by(ActorId::new());
        assert!(authorize_import(&product, ActorId::new(), Some(Role::Importer)).is_ok());
    }

    #[test]
    fn owner_is_rejected_with_self_import() {
        let owner = ActorId::new();
        let product = product_owned_by(owner);
        assert_eq!(
            authorize_import(&product, owner, Some(Role::Importer)),
            Err(DomainError::SelfImportForbidden)
        );
    }

    #[test]
    fn self_import_wins_over_missing_capability() {
        // An exporter probing their own listing must hear "self-import",
        // not a generic capability refusal.
        let owner = ActorId::new();
        let product = product_owned_by(owner);
        assert_eq!(
            authorize_import(&product, owner, Some(Role::Exporter)),
            Err(DomainError::SelfImportForbidden)
        );
    }

    #[test]
    fn exporter_lacking_import_capability_is_forbidden() {
        let product = product_owned_by(ActorId::new());
        assert!(matches!(
            authorize_import(&product, ActorId::new(), Some(Role::Exporter)),
            Err(DomainError::Forbidden(_))
        ));
    }

    #[test]
    fn unregistered_actor_is_forbidden() {
        let product = product_owned_by(ActorId::new());
        assert!(matches!(
            authorize_import(&product, ActorId::new(), None),
            Err(DomainError::Forbidden(_))
        ));
    }
}
