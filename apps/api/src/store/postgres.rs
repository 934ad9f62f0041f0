//! PostgreSQL backend.
//!
//! Every collection replace runs inside one transaction that first locks the
//! owning `users` row (`FOR UPDATE`), so concurrent saves to the same profile
//! are serialized and a failed insert rolls the delete back with it.

use async_trait::async_trait;
use sqlx::{FromRow, PgConnection, PgPool};
use tracing::{info, warn};

use crate::errors::{AppError, AppResult};
use crate::models::profile::{
    non_empty, normalize_profession, ChildCollection, CompleteProfile, Education, Experience,
    NewProfile, Profile, ProfilePatch, ProfileUpdate, Project, Skill, SkillType,
};
use crate::models::template::Template;
use crate::store::password::{hash_password_blocking, PasswordHash};
use crate::store::{normalize_email, ProfileStore, TemplateStore};

const PROFILE_COLUMNS: &str = "id, full_name, email, profession, phone, location, website, \
                               profile_photo, summary, created_at, updated_at";

#[derive(FromRow)]
struct SkillRow {
    id: i64,
    skill_name: String,
    skill_type: String,
    proficiency_level: i16,
}

impl SkillRow {
    fn into_skill(self) -> Option<Skill> {
        match self.skill_type.parse::<SkillType>() {
            Ok(skill_type) => Some(Skill {
                id: self.id,
                skill_name: self.skill_name,
                skill_type,
                proficiency_level: self.proficiency_level,
            }),
            Err(_) => {
                warn!(
                    "Skipping skill {} with unknown type '{}'",
                    self.id, self.skill_type
                );
                None
            }
        }
    }
}

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        PgStore { pool }
    }
}

fn db_err(err: sqlx::Error) -> AppError {
    AppError::from_sqlx(err)
}

/// Takes the per-profile write lock for the current transaction.
async fn lock_profile(conn: &mut PgConnection, profile_id: i64) -> AppResult<()> {
    let locked: Option<i64> = sqlx::query_scalar("SELECT id FROM users WHERE id = $1 FOR UPDATE")
        .bind(profile_id)
        .fetch_optional(&mut *conn)
        .await
        .map_err(db_err)?;
    locked.map(|_| ()).ok_or_else(AppError::user_not_found)
}

async fn write_profile_update(
    conn: &mut PgConnection,
    id: i64,
    update: ProfileUpdate,
) -> AppResult<u64> {
    let update = update.normalized();
    let result = sqlx::query(
        r#"
        UPDATE users
        SET full_name = $1, profession = $2, phone = $3, location = $4,
            website = $5, profile_photo = $6, summary = $7, updated_at = NOW()
        WHERE id = $8
        "#,
    )
    .bind(&update.full_name)
    .bind(&update.profession)
    .bind(&update.phone)
    .bind(&update.location)
    .bind(&update.website)
    .bind(&update.profile_photo)
    .bind(&update.summary)
    .bind(id)
    .execute(&mut *conn)
    .await
    .map_err(db_err)?;
    Ok(result.rows_affected())
}

/// Absent patch fields keep the stored value. An empty `profile_photo`
/// clears the photo.
async fn write_profile_patch(
    conn: &mut PgConnection,
    id: i64,
    patch: &ProfilePatch,
) -> AppResult<()> {
    sqlx::query(
        r#"
        UPDATE users
        SET full_name = COALESCE($1, full_name),
            profession = COALESCE($2, profession),
            phone = COALESCE($3, phone),
            location = COALESCE($4, location),
            website = COALESCE($5, website),
            profile_photo = CASE WHEN $6::TEXT IS NULL THEN profile_photo
                                 ELSE NULLIF(TRIM($6), '') END,
            summary = COALESCE($7, summary),
            updated_at = NOW()
        WHERE id = $8
        "#,
    )
    .bind(patch.full_name.as_deref().map(str::trim))
    .bind(patch.profession.as_deref().map(normalize_profession))
    .bind(&patch.phone)
    .bind(&patch.location)
    .bind(&patch.website)
    .bind(&patch.profile_photo)
    .bind(&patch.summary)
    .bind(id)
    .execute(&mut *conn)
    .await
    .map_err(db_err)?;
    Ok(())
}

/// Delete-then-insert for one collection. Only call inside a transaction
/// holding `lock_profile`.
async fn replace_in_tx(
    conn: &mut PgConnection,
    profile_id: i64,
    collection: ChildCollection,
) -> AppResult<()> {
    match collection {
        ChildCollection::Skills(items) => {
            sqlx::query("DELETE FROM skills WHERE user_id = $1")
                .bind(profile_id)
                .execute(&mut *conn)
                .await
                .map_err(db_err)?;
            for skill in items {
                sqlx::query(
                    "INSERT INTO skills (user_id, skill_name, skill_type, proficiency_level) \
                     VALUES ($1, $2, $3, $4)",
                )
                .bind(profile_id)
                .bind(&skill.name)
                .bind(skill.skill_type.as_str())
                .bind(skill.proficiency)
                .execute(&mut *conn)
                .await
                .map_err(db_err)?;
            }
        }
        ChildCollection::Experience(items) => {
            sqlx::query("DELETE FROM experience WHERE user_id = $1")
                .bind(profile_id)
                .execute(&mut *conn)
                .await
                .map_err(db_err)?;
            for exp in items {
                sqlx::query(
                    r#"
                    INSERT INTO experience
                        (user_id, job_title, company, start_date, end_date, is_current, description)
                    VALUES ($1, $2, $3, $4, $5, $6, $7)
                    "#,
                )
                .bind(profile_id)
                .bind(&exp.title)
                .bind(&exp.company)
                .bind(exp.start_date)
                .bind(exp.end_date)
                .bind(exp.is_current)
                .bind(&exp.description)
                .execute(&mut *conn)
                .await
                .map_err(db_err)?;
            }
        }
        ChildCollection::Education(items) => {
            sqlx::query("DELETE FROM education WHERE user_id = $1")
                .bind(profile_id)
                .execute(&mut *conn)
                .await
                .map_err(db_err)?;
            for edu in items {
                sqlx::query(
                    r#"
                    INSERT INTO education
                        (user_id, degree, institution, start_date, end_date, grade, location)
                    VALUES ($1, $2, $3, $4, $5, $6, $7)
                    "#,
                )
                .bind(profile_id)
                .bind(&edu.degree)
                .bind(&edu.institution)
                .bind(edu.start_date)
                .bind(edu.end_date)
                .bind(&edu.grade)
                .bind(&edu.location)
                .execute(&mut *conn)
                .await
                .map_err(db_err)?;
            }
        }
        ChildCollection::Projects(items) => {
            sqlx::query("DELETE FROM projects WHERE user_id = $1")
                .bind(profile_id)
                .execute(&mut *conn)
                .await
                .map_err(db_err)?;
            for project in items {
                sqlx::query(
                    r#"
                    INSERT INTO projects
                        (user_id, project_name, project_url, technologies, duration,
                         description, project_image)
                    VALUES ($1, $2, $3, $4, $5, $6, $7)
                    "#,
                )
                .bind(profile_id)
                .bind(&project.name)
                .bind(non_empty(project.url))
                .bind(&project.technologies)
                .bind(&project.duration)
                .bind(&project.description)
                .bind(non_empty(project.image))
                .execute(&mut *conn)
                .await
                .map_err(db_err)?;
            }
        }
    }
    Ok(())
}

#[async_trait]
impl ProfileStore for PgStore {
    async fn create_profile(&self, new: NewProfile) -> AppResult<i64> {
        new.validate()?;
        let email = normalize_email(&new.email);
        let password = hash_password_blocking(new.password.clone()).await?;
        let details = new.details();

        // The unique index on email turns a duplicate into SQLSTATE 23505.
        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO users
                (full_name, email, password_hash, profession, phone, location,
                 website, profile_photo, summary)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING id
            "#,
        )
        .bind(&details.full_name)
        .bind(&email)
        .bind(password.as_stored())
        .bind(&details.profession)
        .bind(&details.phone)
        .bind(&details.location)
        .bind(&details.website)
        .bind(&details.profile_photo)
        .bind(&details.summary)
        .fetch_one(&self.pool)
        .await
        .map_err(db_err)?;

        info!("Created profile {id}");
        Ok(id)
    }

    async fn get_profile_by_email(&self, email: &str) -> AppResult<Profile> {
        sqlx::query_as::<_, Profile>(&format!(
            "SELECT {PROFILE_COLUMNS} FROM users WHERE email = $1 LIMIT 1"
        ))
        .bind(normalize_email(email))
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?
        .ok_or_else(AppError::user_not_found)
    }

    async fn get_profile_by_id(&self, id: i64) -> AppResult<Profile> {
        sqlx::query_as::<_, Profile>(&format!(
            "SELECT {PROFILE_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?
        .ok_or_else(AppError::user_not_found)
    }

    async fn update_profile(&self, id: i64, update: ProfileUpdate) -> AppResult<()> {
        update.validate()?;
        let mut conn = self.pool.acquire().await.map_err(db_err)?;
        let updated = write_profile_update(&mut conn, id, update).await?;
        if updated == 0 {
            return Err(AppError::user_not_found());
        }
        info!("Updated profile {id}");
        Ok(())
    }

    async fn get_complete_profile(&self, id: i64) -> AppResult<CompleteProfile> {
        // One read-only transaction so all five reads see the same snapshot.
        let mut tx = self.pool.begin().await.map_err(db_err)?;
        sqlx::query("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ READ ONLY")
            .execute(&mut *tx)
            .await
            .map_err(db_err)?;

        let profile = sqlx::query_as::<_, Profile>(&format!(
            "SELECT {PROFILE_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(db_err)?
        .ok_or_else(AppError::user_not_found)?;

        let skills: Vec<Skill> = sqlx::query_as::<_, SkillRow>(
            "SELECT id, skill_name, skill_type, proficiency_level FROM skills \
             WHERE user_id = $1 ORDER BY id ASC",
        )
        .bind(id)
        .fetch_all(&mut *tx)
        .await
        .map_err(db_err)?
        .into_iter()
        .filter_map(SkillRow::into_skill)
        .collect();

        let experience = sqlx::query_as::<_, Experience>(
            "SELECT id, job_title, company, start_date, end_date, is_current, description \
             FROM experience WHERE user_id = $1 ORDER BY start_date DESC, id ASC",
        )
        .bind(id)
        .fetch_all(&mut *tx)
        .await
        .map_err(db_err)?;

        let education = sqlx::query_as::<_, Education>(
            "SELECT id, degree, institution, start_date, end_date, grade, location \
             FROM education WHERE user_id = $1 ORDER BY start_date DESC, id ASC",
        )
        .bind(id)
        .fetch_all(&mut *tx)
        .await
        .map_err(db_err)?;

        let projects = sqlx::query_as::<_, Project>(
            "SELECT id, project_name, project_url, technologies, duration, description, \
             project_image FROM projects WHERE user_id = $1 ORDER BY id DESC",
        )
        .bind(id)
        .fetch_all(&mut *tx)
        .await
        .map_err(db_err)?;

        tx.commit().await.map_err(db_err)?;

        Ok(CompleteProfile {
            profile,
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

        let mut tx = self.pool.begin().await.map_err(db_err)?;
        lock_profile(&mut tx, profile_id).await?;
        replace_in_tx(&mut tx, profile_id, collection).await?;
        tx.commit().await.map_err(db_err)?;

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

        let mut tx = self.pool.begin().await.map_err(db_err)?;
        lock_profile(&mut tx, profile_id).await?;
        if !patch.is_empty() {
            write_profile_patch(&mut tx, profile_id, &patch).await?;
        }
        for collection in collections {
            replace_in_tx(&mut tx, profile_id, collection).await?;
        }
        tx.commit().await.map_err(db_err)?;

        info!("Saved complete profile {profile_id}");
        Ok(())
    }

    async fn delete_profile(&self, id: i64) -> AppResult<()> {
        // Child tables reference users(id) ON DELETE CASCADE.
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(db_err)?;
        if result.rows_affected() == 0 {
            return Err(AppError::user_not_found());
        }
        info!("Deleted profile {id} with all child collections");
        Ok(())
    }

    async fn password_hash(&self, id: i64) -> AppResult<PasswordHash> {
        let phc: String = sqlx::query_scalar("SELECT password_hash FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?
            .ok_or_else(AppError::user_not_found)?;
        Ok(PasswordHash::from_stored(phc))
    }
}

#[async_trait]
impl TemplateStore for PgStore {
    async fn active_templates(&self) -> AppResult<Vec<Template>> {
        sqlx::query_as::<_, Template>(
            r#"
            SELECT id, profession, template_name, template_data, is_active
            FROM portfolio_templates
            WHERE is_active = TRUE
            ORDER BY profession, template_name, id
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::create_pool;
    use crate::models::profile::{NewSkill, ProjectInput};
    use crate::store::memory::tests::new_profile;
    use std::sync::Arc;
    use uuid::Uuid;

    async fn pg_store() -> PgStore {
        let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
        PgStore::new(create_pool(&url).await.unwrap())
    }

    async fn fresh_profile(store: &PgStore) -> i64 {
        let email = format!("{}@pg.example.com", Uuid::new_v4());
        store
            .create_profile(new_profile(&email, "developer"))
            .await
            .unwrap()
    }

    fn project(name: &str) -> ProjectInput {
        ProjectInput {
            name: name.to_string(),
            url: None,
            technologies: "Rust".to_string(),
            duration: "1 month".to_string(),
            description: String::new(),
            image: None,
        }
    }

    #[tokio::test]
    #[ignore = "needs DATABASE_URL"]
    async fn test_concurrent_replaces_never_interleave() {
        let store = Arc::new(pg_store().await);
        let id = fresh_profile(&store).await;

        let mut handles = Vec::new();
        for writer in 0..8 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                let items = (0..5)
                    .map(|n| project(&format!("w{writer}-p{n}")))
                    .collect();
                store
                    .replace_child_collection(id, ChildCollection::Projects(items))
                    .await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let projects = store.get_complete_profile(id).await.unwrap().projects;
        assert_eq!(projects.len(), 5);
        let writer = projects[0]
            .project_name
            .split('-')
            .next()
            .unwrap()
            .to_string();
        assert!(projects.iter().all(|p| p.project_name.starts_with(&writer)));

        store.delete_profile(id).await.unwrap();
    }

    #[tokio::test]
    #[ignore = "needs DATABASE_URL"]
    async fn test_rejected_save_keeps_old_collection() {
        let store = pg_store().await;
        let id = fresh_profile(&store).await;
        store
            .replace_child_collection(id, ChildCollection::Projects(vec![project("kept")]))
            .await
            .unwrap();

        let result = store
            .save_complete_profile(
                id,
                ProfilePatch::default(),
                vec![
                    ChildCollection::Projects(vec![]),
                    ChildCollection::Skills(vec![NewSkill {
                        name: "Rust".to_string(),
                        skill_type: SkillType::Technical,
                        proficiency: 101,
                    }]),
                ],
            )
            .await;
        assert!(matches!(result, Err(AppError::Validation(_))));

        let projects = store.get_complete_profile(id).await.unwrap().projects;
        assert_eq!(projects.len(), 1);
        assert_eq!(projects[0].project_name, "kept");

        store.delete_profile(id).await.unwrap();
    }

    #[tokio::test]
    #[ignore = "needs DATABASE_URL"]
    async fn test_replace_for_missing_profile() {
        let store = pg_store().await;
        let id = fresh_profile(&store).await;
        store.delete_profile(id).await.unwrap();

        let result = store
            .replace_child_collection(id, ChildCollection::Projects(vec![project("orphan")]))
            .await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }
}
