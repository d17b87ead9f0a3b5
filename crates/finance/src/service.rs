use chrono::Utc;
use tracing::{info, warn};

use contentmart_catalog::ContentPackage;
use contentmart_core::{DomainError, DomainResult, PackageId, UserId};

use crate::model::{Order, UserProfile};
use crate::unit_of_work::FinanceUnitOfWork;

pub struct FinanceService<'a, U: FinanceUnitOfWork + ?Sized> {
    uow: &'a mut U,
}

impl<'a, U: FinanceUnitOfWork + ?Sized> FinanceService<'a, U> {
    pub fn new(uow: &'a mut U) -> Self {
        Self { uow }
    }

    /// Whether `profile` can afford `package`. The boundary is inclusive.
    pub fn is_order_available(&self, profile: &UserProfile, package: &ContentPackage) -> bool {
        package.price <= profile.balance
    }

    /// Record a purchase: debit the buyer, credit the package owner, commit.
    ///
    /// Affordability is the caller's job (see [`Self::is_order_available`]);
    /// this does not re-check it. The owner must have a profile, otherwise
    /// `NotFound` is returned and nothing is committed.
    pub fn make_order(
        &mut self,
        buyer_profile: &UserProfile,
        package: &ContentPackage,
    ) -> DomainResult<Order> {
        let mut buyer = self
            .uow
            .profiles()
            .get_by_id(buyer_profile.id)
            .ok_or_else(|| DomainError::not_found(format!("profile {}", buyer_profile.id)))?;

        let owner_id = package.owner;
        let mut seller = self
            .uow
            .profiles()
            .first(&|p: &UserProfile| p.user_id == owner_id)
            .ok_or_else(|| DomainError::not_found(format!("profile of user {owner_id}")))?;

        let order = Order {
            id: self.uow.orders().next_id(),
            profile_id: buyer.id,
            package_id: package.id,
            price: package.price,
            placed_at: Utc::now(),
        };

        buyer.balance = debit(buyer.balance, package.price)?;
        if buyer.balance < 0 {
            warn!(
                profile_id = %buyer.id,
                balance = buyer.balance,
                package_id = %package.id,
                "order drove balance negative"
            );
        }

        if seller.id == buyer.id {
            seller = buyer;
        } else {
            self.uow.profiles().update(buyer)?;
        }
        seller.balance = credit(seller.balance, package.price)?;
        self.uow.profiles().update(seller)?;

        self.uow.orders().insert(order.clone())?;
        self.uow.save()?;

        info!(
            order_id = %order.id,
            profile_id = %order.profile_id,
            package_id = %order.package_id,
            price = order.price,
            "order placed"
        );
        Ok(order)
    }

    /// Owners can always access their package; anyone else needs an order.
    pub fn user_has_permissions(&mut self, user_id: UserId, package: &ContentPackage) -> bool {
        package.owner == user_id || self.user_has_order(user_id, package.id).is_some()
    }

    /// The user's order for `package_id`, if any.
    pub fn user_has_order(&mut self, user_id: UserId, package_id: PackageId) -> Option<Order> {
        let profile = self.profile_of(user_id)?;
        self.uow
            .orders()
            .first(&|o: &Order| o.profile_id == profile.id && o.package_id == package_id)
    }

    pub fn profile_of(&mut self, user_id: UserId) -> Option<UserProfile> {
        self.uow
            .profiles()
            .first(&|p: &UserProfile| p.user_id == user_id)
    }

    /// Open a profile for `user_id`. One profile per user.
    pub fn create_profile(
        &mut self,
        user_id: UserId,
        initial_balance: i64,
    ) -> DomainResult<UserProfile> {
        if self.profile_of(user_id).is_some() {
            return Err(DomainError::conflict(format!(
                "user {user_id} already has a profile"
            )));
        }

        let profile = UserProfile {
            id: self.uow.profiles().next_id(),
            user_id,
            balance: initial_balance,
        };
        self.uow.profiles().insert(profile.clone())?;
        self.uow.save()?;

        info!(profile_id = %profile.id, %user_id, balance = initial_balance, "profile created");
        Ok(profile)
    }

    /// Orders placed by `user_id`, oldest first. Empty without a profile.
    pub fn orders_of(&mut self, user_id: UserId) -> Vec<Order> {
        let Some(profile) = self.profile_of(user_id) else {
            return Vec::new();
        };
        self.uow
            .orders()
            .get(&|o: &Order| o.profile_id == profile.id)
    }
}

fn debit(balance: i64, amount: i64) -> DomainResult<i64> {
    balance
        .checked_sub(amount)
        .ok_or_else(|| DomainError::validation("balance underflow"))
}

fn credit(balance: i64, amount: i64) -> DomainResult<i64> {
    balance
        .checked_add(amount)
        .ok_or_else(|| DomainError::validation("balance overflow"))
}
