//! In-process backend. Used for local development (`STORE_BACKEND=memory`)
//! and by every async test in the crate.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use tracing::info;

use crate::errors::{AppError, AppResult};
use crate::models::profile::{
    non_empty, ChildCollection, CompleteProfile, Education, Experience, NewProfile, Profile,
    ProfilePatch, ProfileUpdate, Project, Skill,
};
use crate::models::template::{seed_templates, Template};
use crate::store::password::{hash_password_blocking, PasswordHash};
use crate::store::{normalize_email, ProfileStore, TemplateStore};

struct StoredProfile {
    profile: Profile,
    password: PasswordHash,
    skills: Vec<Skill>,
    experience: Vec<Experience>,
    education: Vec<Education>,
    projects: Vec<Project>,
}

#[derive(Default)]
struct Tables {
    last_profile_id: i64,
    last_row_id: i64,
    profiles: BTreeMap<i64, StoredProfile>,
}

impl Tables {
    fn next_row_id(&mut self) -> i64 {
        self.last_row_id += 1;
        self.last_row_id
    }

    fn stored_mut(&mut self, id: i64) -> AppResult<&mut StoredProfile> {
        self.profiles
            .get_mut(&id)
            .ok_or_else(AppError::user_not_found)
    }

    /// Builds the replacement rows first, then swaps them in. The caller
    /// holds the write guard for the whole call.
    fn replace(&mut self, profile_id: i64, collection: ChildCollection) -> AppResult<()> {
        self.stored_mut(profile_id)?;
        match collection {
            ChildCollection::Skills(items) => {
                let rows: Vec<Skill> = items
                    .into_iter()
                    .map(|s| Skill {
                        id: self.next_row_id(),
                        skill_name: s.name,
                        skill_type: s.skill_type,
                        proficiency_level: s.proficiency,
                    })
                    .collect();
                self.stored_mut(profile_id)?.skills = rows;
            }
            ChildCollection::Experience(items) => {
                let rows: Vec<Experience> = items
                    .into_iter()
                    .map(|e| Experience {
                        id: self.next_row_id(),
                        job_title: e.title,
                        company: e.company,
                        start_date: e.start_date,
                        end_date: e.end_date,
                        is_current: e.is_current,
                        description: e.description,
                    })
                    .collect();
                self.stored_mut(profile_id)?.experience = rows;
            }
            ChildCollection::Education(items) => {
                let rows: Vec<Education> = items
                    .into_iter()
                    .map(|e| Education {
                        id: self.next_row_id(),
                        degree: e.degree,
                        institution: e.institution,
                        start_date: e.start_date,
                        end_date: e.end_date,
                        grade: e.grade,
                        location: e.location,
                    })
                    .collect();
                self.stored_mut(profile_id)?.education = rows;
            }
            ChildCollection::Projects(items) => {
                let rows: Vec<Project> = items
                    .into_iter()
                    .map(|p| Project {
                        id: self.next_row_id(),
                        project_name: p.name,
                        project_url: non_empty(p.url),
                        technologies: p.technologies,
                        duration: p.duration,
                        description: p.description,
                        project_image: non_empty(p.image),
                    })
                    .collect();
                self.stored_mut(profile_id)?.projects = rows;
            }
        }
        Ok(())
    }
}

fn apply_update(profile: &mut Profile, update: ProfileUpdate) {
    let update = update.normalized();
    profile.full_name = update.full_name;
    profile.profession = update.profession;
    profile.phone = update.phone;
    profile.location = update.location;
    profile.website = update.website;
    profile.profile_photo = update.profile_photo;
    profile.summary = update.summary;
    profile.updated_at = Utc::now();
}

pub struct MemoryStore {
    tables: RwLock<Tables>,
    templates: RwLock<Vec<Template>>,
}

impl MemoryStore {
    /// Empty profile tables and the default template catalog.
    pub fn new() -> Self {
        Self::with_templates(seed_templates())
    }

    pub fn with_templates(templates: Vec<Template>) -> Self {
        MemoryStore {
            tables: RwLock::new(Tables::default()),
            templates: RwLock::new(templates),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ProfileStore for MemoryStore {
    async fn create_profile(&self, new: NewProfile) -> AppResult<i64> {
        new.validate()?;
        let email = normalize_email(&new.email);
        // Hash before taking the lock; argon2 is slow on purpose.
        let password = hash_password_blocking(new.password.clone()).await?;
        let details = new.details();

        let mut tables = self.tables.write().await;
        if tables.profiles.values().any(|p| p.profile.email == email) {
            return Err(AppError::DuplicateEmail);
        }
        tables.last_profile_id += 1;
        let id = tables.last_profile_id;
        let now = Utc::now();
        tables.profiles.insert(
            id,
            StoredProfile {
                profile: Profile {
                    id,
                    full_name: details.full_name,
                    email,
                    profession: details.profession,
                    phone: details.phone,
                    location: details.location,
                    website: details.website,
                    profile_photo: details.profile_photo,
                    summary: details.summary,
                    created_at: now,
                    updated_at: now,
                },
                password,
                skills: Vec::new(),
                experience: Vec::new(),
                education: Vec::new(),
                projects: Vec::new(),
            },
        );
        info!("Created profile {id}");
        Ok(id)
    }

    async fn get_profile_by_email(&self, email: &str) -> AppResult<Profile> {
        let email = normalize_email(email);
        let tables = self.tables.read().await;
        tables
            .profiles
            .values()
            .find(|p| p.profile.email == email)
            .map(|p| p.profile.clone())
            .ok_or_else(AppError::user_not_found)
    }

    async fn get_profile_by_id(&self, id: i64) -> AppResult<Profile> {
        let tables = self.tables.read().await;
        tables
            .profiles
            .get(&id)
            .map(|p| p.profile.clone())
            .ok_or_else(AppError::user_not_found)
    }

    async fn update_profile(&self, id: i64, update: ProfileUpdate) -> AppResult<()> {
        update.validate()?;
        let mut tables = self.tables.write().await;
        let stored = tables.stored_mut(id)?;
        apply_update(&mut stored.profile, update);
        info!("Updated profile {id}");
        Ok(())
    }

    async fn get_complete_profile(&self, id: i64) -> AppResult<CompleteProfile> {
        let tables = self.tables.read().await;
        let stored = tables.profiles.get(&id).ok_or_else(AppError::user_not_found)?;

        let mut skills = stored.skills.clone();
        skills.sort_by_key(|s| s.id);

        let mut experience = stored.experience.clone();
        experience.sort_by(|a, b| b.start_date.cmp(&a.start_date).then(a.id.cmp(&b.id)));

        let mut education = stored.education.clone();
        education.sort_by(|a, b| b.start_date.cmp(&a.start_date).then(a.id.cmp(&b.id)));

        let mut projects = stored.projects.clone();
        projects.sort_by(|a, b| b.id.cmp(&a.id));

        Ok(CompleteProfile {
            profile: stored.profile.clone(),
            skills,
            experience,
            education,
            projects,
        })
    }

    async fn replace_child_collection(
        &self,
        profile_id: i64,
        collection: ChildCollection,
    ) -> AppResult<()> {
        collection.validate()?;
        let kind = collection.kind();
        let count = collection.len();
        let cleared = collection.is_empty();
        let mut tables = self.tables.write().await;
        tables.replace(profile_id, collection)?;
        if cleared {
            info!("Cleared {kind} for profile {profile_id}");
        } else {
            info!("Replaced {kind} for profile {profile_id} ({count} items)");
        }
        Ok(())
    }

    async fn save_complete_profile(
        &self,
        profile_id: i64,
        patch: ProfilePatch,
        collections: Vec<ChildCollection>,
    ) -> AppResult<()> {
        patch.validate()?;
        for collection in &collections {
            collection.validate()?;
        }

        let mut tables = self.tables.write().await;
        let stored = tables.stored_mut(profile_id)?;
        if !patch.is_empty() {
            let update = patch.apply_to(&stored.profile);
            apply_update(&mut stored.profile, update);
        }
        for collection in collections {
            tables.replace(profile_id, collection)?;
        }
        info!("Saved complete profile {profile_id}");
        Ok(())
    }

    async fn delete_profile(&self, id: i64) -> AppResult<()> {
        let mut tables = self.tables.write().await;
        tables
            .profiles
            .remove(&id)
            .ok_or_else(AppError::user_not_found)?;
        info!("Deleted profile {id} with all child collections");
        Ok(())
    }

    async fn password_hash(&self, id: i64) -> AppResult<PasswordHash> {
        let tables = self.tables.read().await;
        tables
            .profiles
            .get(&id)
            .map(|p| p.password.clone())
            .ok_or_else(AppError::user_not_found)
    }
}

#[async_trait]
impl TemplateStore for MemoryStore {
    async fn active_templates(&self) -> AppResult<Vec<Template>> {
        let mut active: Vec<Template> = self
            .templates
            .read()
            .await
            .iter()
            .filter(|t| t.is_active)
            .cloned()
            .collect();
        active.sort_by(|a, b| {
            a.profession
                .cmp(&b.profession)
                .then_with(|| a.template_name.cmp(&b.template_name))
                .then(a.id.cmp(&b.id))
        });
        Ok(active)
    }
}
