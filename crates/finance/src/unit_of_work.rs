use contentmart_catalog::CatalogUnitOfWork;
use contentmart_core::Repository;

use crate::model::{Order, UserProfile};

/// Catalog tables plus the finance ledger, committed together.
pub trait FinanceUnitOfWork: CatalogUnitOfWork {
    fn profiles(&mut self) -> &mut dyn Repository<UserProfile>;
    fn orders(&mut self) -> &mut dyn Repository<Order>;
}
