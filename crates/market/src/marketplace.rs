use std::collections::BTreeSet;
use std::io::Read;

use tracing::{debug, info, warn};

use contentmart_auth::{MembershipProvider, Role, RoleProvider, User};
use contentmart_catalog::{
    CatalogUnitOfWork, ContentFile, ContentPackage, Facet, Property, PropertyState,
    PropertyStateService, SearchService,
};
use contentmart_core::{
    ContentFileId, DomainError, DomainResult, PackageId, PropertyId, PropertyStateId, UserId,
};
use contentmart_finance::{FinanceService, Order};
use contentmart_infra::{InMemoryStore, MarketConfig};
use contentmart_storage::{
    FileStorageManager, FileStorageProvider, FileUpload, LocalFileStorage, StoredFile,
};

use crate::error::{MarketError, MarketResult};
use crate::limit::SizeLimited;
use crate::request::{Selection, UploadRequest, UploadedPackage};

const MAX_CAPTION_LENGTH: usize = 200;

/// The marketplace: one store, one file storage, one membership provider.
///
/// All methods take `&self`; each call opens its own unit of work, so a
/// `Marketplace` can be shared across threads behind an `Arc`.
pub struct Marketplace<P, M> {
    config: MarketConfig,
    store: InMemoryStore,
    storage: FileStorageManager<P>,
    membership: M,
}

impl<M> Marketplace<LocalFileStorage, M>
where
    M: MembershipProvider + RoleProvider,
{
    /// Files live under `config.storage_root`, which is created if missing.
    pub fn open_local(config: MarketConfig, membership: M) -> MarketResult<Self> {
        let provider = LocalFileStorage::new(&config.storage_root)?;
        Ok(Self::new(config, provider, membership))
    }
}

impl<P, M> Marketplace<P, M>
where
    P: FileStorageProvider,
    M: MembershipProvider + RoleProvider,
{
    pub fn new(config: MarketConfig, provider: P, membership: M) -> Self {
        Self {
            config,
            store: InMemoryStore::new(),
            storage: FileStorageManager::new(provider),
            membership,
        }
    }

    pub fn config(&self) -> &MarketConfig {
        &self.config
    }

    pub fn store(&self) -> &InMemoryStore {
        &self.store
    }

    pub fn storage(&self) -> &FileStorageManager<P> {
        &self.storage
    }

    pub fn membership(&self) -> &M {
        &self.membership
    }

    /// Create an account and its finance profile with the starting balance.
    pub fn register(&self, username: &str, email: &str, password: &str) -> MarketResult<User> {
        let user = self.membership.create_user(username, email, password)?;

        let balance = self.config.starting_balance;
        self.store
            .transact(|uow| FinanceService::new(uow).create_profile(user.id, balance))?;

        info!(user_id = %user.id, "user registered");
        Ok(user)
    }

    /// Add a facet to the chain. Admins only.
    pub fn define_property(&self, actor: UserId, name: &str, order: u32) -> MarketResult<Property> {
        self.require_role(actor, &Role::ADMIN)?;

        let mut uow = self.store.begin();
        Ok(PropertyStateService::new(&mut uow).create_property(name, order)?)
    }

    /// The facet chain, lowest order first.
    pub fn properties(&self) -> Vec<Property> {
        let mut uow = self.store.begin();
        PropertyStateService::new(&mut uow).properties()
    }

    pub fn states_of(&self, property_id: PropertyId) -> Vec<PropertyState> {
        let mut uow = self.store.begin();
        PropertyStateService::new(&mut uow).states_of(property_id)
    }

    /// Publish a package.
    ///
    /// Input is validated before anything is written. Each non-blank selection
    /// is resolved to a state of its property, creating the state if the value
    /// is new. Files land in the facet directory and never replace existing
    /// ones; if recording the package fails afterwards, exactly the files this
    /// upload wrote are removed again.
    pub fn upload(&self, owner: UserId, request: UploadRequest) -> MarketResult<UploadedPackage> {
        self.require_user(owner)?;

        let UploadRequest {
            caption,
            description,
            price,
            selections,
            files,
        } = request;
        validate_listing(&caption, price, &files)?;
        FileStorageManager::<P>::validate_uploads(&files)?;

        let mut uow = self.store.begin();
        let chosen = resolve_properties(&mut uow, &selections)?;

        let mut states = Vec::with_capacity(chosen.len());
        let mut facets = Vec::with_capacity(chosen.len());
        {
            let mut service = PropertyStateService::new(&mut uow);
            for (property, value) in &chosen {
                let state = match service.get_state(property.id, value) {
                    Some(state) => state,
                    None => service.create_state(property, value)?,
                };
                facets.push(Facet::of(property, &state));
                states.push(state);
            }
        }

        let id = uow.packages().next_id();
        let mut package = ContentPackage::new(id, caption.trim(), description, price, owner);

        let limit = self.config.max_file_size;
        let uploads = files
            .into_iter()
            .map(|f| FileUpload {
                name: f.name,
                is_preview: f.is_preview,
                content: Box::new(SizeLimited::new(f.content, limit)),
            })
            .collect();

        let stored = self.storage.store(&mut package, &facets, uploads)?;

        let files = match record_package(&mut uow, &package, &states, &stored) {
            Ok(files) => files,
            Err(e) => {
                warn!(package_id = %package.id, error = %e, "upload not recorded; removing files");
                self.storage.discard(&package, &stored);
                return Err(e.into());
            }
        };

        info!(
            package_id = %package.id,
            %owner,
            price = package.price,
            states = states.len(),
            files = files.len(),
            "package uploaded"
        );
        Ok(UploadedPackage {
            package,
            states,
            files,
        })
    }

    /// Packages tagged with every chosen value.
    ///
    /// Blank selections are ignored. A value no package was ever tagged with
    /// matches nothing, and so does a selection with nothing chosen.
    pub fn search(&self, selections: &[Selection]) -> MarketResult<Vec<ContentPackage>> {
        let mut uow = self.store.begin();

        let mut states = Vec::with_capacity(selections.len());
        {
            let mut service = PropertyStateService::new(&mut uow);
            for selection in selections {
                let Some(value) = selection.chosen() else {
                    continue;
                };
                match service.get_state(selection.property_id, value) {
                    Some(state) => states.push(state),
                    None => {
                        debug!(property_id = %selection.property_id, value, "unknown facet value");
                        return Ok(Vec::new());
                    }
                }
            }
        }

        Ok(SearchService::new(&mut uow).find_packages_with_same_property_states(Some(&states))?)
    }

    /// Values of `property_id` still reachable once `state_id` is chosen.
    pub fn narrow(
        &self,
        property_id: PropertyId,
        state_id: PropertyStateId,
    ) -> MarketResult<Vec<PropertyState>> {
        let mut uow = self.store.begin();
        let property = uow
            .properties()
            .get_by_id(property_id)
            .ok_or_else(|| DomainError::not_found(format!("property {property_id}")))?;
        let state = uow
            .states()
            .get_by_id(state_id)
            .ok_or_else(|| DomainError::not_found(format!("property state {state_id}")))?;

        Ok(PropertyStateService::new(&mut uow).get_bounded_states(&property, &state))
    }

    /// Buy a package. Owners can't buy their own and nobody buys twice.
    pub fn purchase(&self, buyer: UserId, package_id: PackageId) -> MarketResult<Order> {
        self.require_user(buyer)?;

        let mut uow = self.store.begin();
        let package = find_package(&mut uow, package_id)?;
        if package.owner == buyer {
            return Err(DomainError::conflict("owners cannot buy their own package").into());
        }

        let mut finance = FinanceService::new(&mut uow);
        if finance.user_has_order(buyer, package_id).is_some() {
            return Err(
                DomainError::conflict(format!("package {package_id} already purchased")).into(),
            );
        }
        let profile = finance
            .profile_of(buyer)
            .ok_or_else(|| DomainError::not_found(format!("profile of user {buyer}")))?;
        if !finance.is_order_available(&profile, &package) {
            return Err(DomainError::validation(format!(
                "insufficient balance: {} < {}",
                profile.balance, package.price
            ))
            .into());
        }

        Ok(finance.make_order(&profile, &package)?)
    }

    /// Open a file for reading.
    ///
    /// Previews are public. Anything else needs the owner or a buyer; `None`
    /// is an anonymous caller.
    pub fn download(
        &self,
        user: Option<UserId>,
        file_id: ContentFileId,
    ) -> MarketResult<(ContentFile, Box<dyn Read + Send>)> {
        let mut uow = self.store.begin();
        let file = uow
            .files()
            .get_by_id(file_id)
            .ok_or_else(|| DomainError::not_found(format!("file {file_id}")))?;
        let package = uow.packages().get_by_id(file.package_id).ok_or_else(|| {
            DomainError::invariant(format!(
                "file {} references missing package {}",
                file.id, file.package_id
            ))
        })?;

        if !file.is_preview {
            let allowed = match user {
                Some(user_id) => {
                    FinanceService::new(&mut uow).user_has_permissions(user_id, &package)
                }
                None => false,
            };
            if !allowed {
                warn!(file_id = %file.id, package_id = %package.id, "download refused");
                return Err(DomainError::Unauthorized.into());
            }
        }

        let stream = self.storage.file_stream(&package, &file)?;
        Ok((file, stream))
    }

    pub fn package(&self, package_id: PackageId) -> MarketResult<ContentPackage> {
        let mut uow = self.store.begin();
        Ok(find_package(&mut uow, package_id)?)
    }

    pub fn package_files(&self, package_id: PackageId) -> MarketResult<Vec<ContentFile>> {
        let mut uow = self.store.begin();
        find_package(&mut uow, package_id)?;
        Ok(uow
            .files()
            .get(&|f: &ContentFile| f.package_id == package_id))
    }

    pub fn package_states(&self, package_id: PackageId) -> MarketResult<Vec<PropertyState>> {
        let mut uow = self.store.begin();
        find_package(&mut uow, package_id)?;
        Ok(PropertyStateService::new(&mut uow).states_of_package(package_id))
    }

    pub fn balance(&self, user: UserId) -> MarketResult<i64> {
        let mut uow = self.store.begin();
        let profile = FinanceService::new(&mut uow)
            .profile_of(user)
            .ok_or_else(|| DomainError::not_found(format!("profile of user {user}")))?;
        Ok(profile.balance)
    }

    pub fn orders(&self, user: UserId) -> Vec<Order> {
        let mut uow = self.store.begin();
        FinanceService::new(&mut uow).orders_of(user)
    }

    fn require_user(&self, user_id: UserId) -> MarketResult<User> {
        self.membership
            .get_user_by_id(user_id)
            .ok_or(MarketError::Domain(DomainError::Unauthorized))
    }

    fn require_role(&self, user_id: UserId, role: &Role) -> MarketResult<User> {
        let user = self.require_user(user_id)?;
        if !self.membership.is_user_in_role(&user.username, role) {
            warn!(%user_id, %role, "missing role");
            return Err(DomainError::Unauthorized.into());
        }
        Ok(user)
    }
}

fn validate_listing(caption: &str, price: i64, files: &[FileUpload]) -> DomainResult<()> {
    let caption = caption.trim();
    if caption.is_empty() {
        return Err(DomainError::validation("caption must not be blank"));
    }
    if caption.chars().count() > MAX_CAPTION_LENGTH {
        return Err(DomainError::validation(format!(
            "caption must be at most {MAX_CAPTION_LENGTH} characters"
        )));
    }
    if price < 0 {
        return Err(DomainError::validation("price must not be negative"));
    }
    if files.is_empty() {
        return Err(DomainError::validation("a package needs at least one file"));
    }
    Ok(())
}

/// Properties behind the non-blank selections, paired with the trimmed value.
fn resolve_properties<'s, U: CatalogUnitOfWork + ?Sized>(
    uow: &mut U,
    selections: &'s [Selection],
) -> DomainResult<Vec<(Property, &'s str)>> {
    let mut seen = BTreeSet::new();
    let mut chosen = Vec::with_capacity(selections.len());
    for selection in selections {
        let Some(value) = selection.chosen() else {
            continue;
        };
        if !seen.insert(selection.property_id) {
            return Err(DomainError::validation(format!(
                "property {} selected more than once",
                selection.property_id
            )));
        }
        let property = uow
            .properties()
            .get_by_id(selection.property_id)
            .ok_or_else(|| DomainError::not_found(format!("property {}", selection.property_id)))?;
        chosen.push((property, value));
    }
    Ok(chosen)
}

/// Insert the package, its tags and file rows, then commit.
fn record_package<U: CatalogUnitOfWork + ?Sized>(
    uow: &mut U,
    package: &ContentPackage,
    states: &[PropertyState],
    stored: &[StoredFile],
) -> DomainResult<Vec<ContentFile>> {
    uow.packages().insert(package.clone())?;
    PropertyStateService::new(&mut *uow).tag_package(package.id, states)?;

    let mut files = Vec::with_capacity(stored.len());
    for file in stored {
        let record = ContentFile {
            id: uow.files().next_id(),
            package_id: package.id,
            name: file.name.clone(),
            is_preview: file.is_preview,
        };
        uow.files().insert(record.clone())?;
        files.push(record);
    }

    uow.save()?;
    Ok(files)
}

fn find_package<U: CatalogUnitOfWork + ?Sized>(
    uow: &mut U,
    package_id: PackageId,
) -> DomainResult<ContentPackage> {
    uow.packages()
        .get_by_id(package_id)
        .ok_or_else(|| DomainError::not_found(format!("package {package_id}")))
}
