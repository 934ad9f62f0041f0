//! Persistence seam. Services talk to `ProfileStore` / `TemplateStore` only;
//! one adapter per backend lives next to this file.

pub mod memory;
pub mod password;
pub mod postgres;

use std::sync::Arc;

use async_trait::async_trait;

use crate::errors::AppResult;
use crate::models::profile::{
    ChildCollection, CompleteProfile, NewProfile, Profile, ProfilePatch, ProfileUpdate,
};
use crate::models::template::Template;
use password::PasswordHash;

/// Profiles and their owned child collections.
///
/// Every method that replaces a collection is all-or-nothing: either the
/// whole new collection is visible afterwards or the old one is untouched.
#[async_trait]
pub trait ProfileStore: Send + Sync {
    /// Hashes the password and inserts the profile. `DuplicateEmail` if taken.
    async fn create_profile(&self, new: NewProfile) -> AppResult<i64>;

    async fn get_profile_by_email(&self, email: &str) -> AppResult<Profile>;

    // Handlers read through `get_complete_profile`; tests use the flat row.
    #[allow(dead_code)]
    async fn get_profile_by_id(&self, id: i64) -> AppResult<Profile>;

    async fn update_profile(&self, id: i64, update: ProfileUpdate) -> AppResult<()>;

    async fn get_complete_profile(&self, id: i64) -> AppResult<CompleteProfile>;

    /// Single-collection form of `save_complete_profile`. Only tests call it
    /// directly today.
    #[allow(dead_code)]
    async fn replace_child_collection(
        &self,
        profile_id: i64,
        collection: ChildCollection,
    ) -> AppResult<()>;

    /// Merges the basic-field patch and applies any number of collection
    /// replacements in one atomic write.
    async fn save_complete_profile(
        &self,
        profile_id: i64,
        patch: ProfilePatch,
        collections: Vec<ChildCollection>,
    ) -> AppResult<()>;

    /// Removes the profile and every child row it owns.
    async fn delete_profile(&self, id: i64) -> AppResult<()>;

    async fn password_hash(&self, id: i64) -> AppResult<PasswordHash>;
}

#[async_trait]
pub trait TemplateStore: Send + Sync {
    /// Active templates ordered by profession, then name, then id.
    async fn active_templates(&self) -> AppResult<Vec<Template>>;
}

/// The pair of store handles carried in `AppState`.
#[derive(Clone)]
pub struct Stores {
    pub profiles: Arc<dyn ProfileStore>,
    pub templates: Arc<dyn TemplateStore>,
}

impl Stores {
    pub fn from_backend<S>(backend: S) -> Self
    where
        S: ProfileStore + TemplateStore + 'static,
    {
        let backend = Arc::new(backend);
        Stores {
            profiles: backend.clone(),
            templates: backend,
        }
    }
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_ascii_lowercase()
}
