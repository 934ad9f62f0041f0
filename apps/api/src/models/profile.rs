use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use sqlx::FromRow;

use crate::errors::{AppError, AppResult};

pub const DEFAULT_PROFICIENCY: i16 = 50;

// ────────────────────────────────────────────────────────────────────────────
// Stored records
// ────────────────────────────────────────────────────────────────────────────

/// Base profile row. The credential is kept by the store and never appears here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Profile {
    pub id: i64,
    pub full_name: String,
    pub email: String,
    pub profession: String,
    pub phone: String,
    pub location: String,
    pub website: String,
    pub profile_photo: Option<String>,
    pub summary: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SkillType {
    Technical,
    Tools,
    Soft,
}

impl SkillType {
    pub const ALL: [SkillType; 3] = [SkillType::Technical, SkillType::Tools, SkillType::Soft];

    pub fn as_str(&self) -> &'static str {
        match self {
            SkillType::Technical => "technical",
            SkillType::Tools => "tools",
            SkillType::Soft => "soft",
        }
    }
}

impl fmt::Display for SkillType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SkillType {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "technical" => Ok(SkillType::Technical),
            "tools" => Ok(SkillType::Tools),
            "soft" => Ok(SkillType::Soft),
            other => Err(AppError::Validation(format!(
                "Unknown skill type '{other}' (expected technical, tools or soft)"
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Skill {
    pub id: i64,
    pub skill_name: String,
    pub skill_type: SkillType,
    pub proficiency_level: i16,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Experience {
    pub id: i64,
    pub job_title: String,
    pub company: String,
    pub start_date: NaiveDate,
    /// `None` means the position is ongoing.
    pub end_date: Option<NaiveDate>,
    pub is_current: bool,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Education {
    pub id: i64,
    pub degree: String,
    pub institution: String,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub grade: String,
    pub location: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Project {
    pub id: i64,
    pub project_name: String,
    pub project_url: Option<String>,
    pub technologies: String,
    pub duration: String,
    pub description: String,
    pub project_image: Option<String>,
}

/// A profile merged with all of its child collections.
///
/// Ordering: skills by insertion, experience and education by start date
/// (newest first), projects most recently created first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompleteProfile {
    #[serde(flatten)]
    pub profile: Profile,
    pub skills: Vec<Skill>,
    pub experience: Vec<Experience>,
    pub education: Vec<Education>,
    pub projects: Vec<Project>,
}

// ────────────────────────────────────────────────────────────────────────────
// Write-side inputs
// ────────────────────────────────────────────────────────────────────────────

/// Registration payload.
#[derive(Clone, Deserialize)]
pub struct NewProfile {
    pub full_name: String,
    pub email: String,
    pub password: String,
    pub profession: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub website: String,
    #[serde(default)]
    pub profile_photo: Option<String>,
    #[serde(default)]
    pub summary: String,
}

impl fmt::Debug for NewProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NewProfile")
            .field("full_name", &self.full_name)
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .field("profession", &self.profession)
            .finish_non_exhaustive()
    }
}

impl NewProfile {
    pub fn validate(&self) -> AppResult<()> {
        require("full_name", &self.full_name)?;
        require("email", &self.email)?;
        if !self.email.contains('@') {
            return Err(AppError::Validation("email is not a valid address".to_string()));
        }
        require("password", &self.password)?;
        require("profession", &self.profession)?;
        Ok(())
    }

    /// The mutable part of a registration, as stored on the profile row.
    pub fn details(&self) -> ProfileUpdate {
        ProfileUpdate {
            full_name: self.full_name.trim().to_string(),
            profession: normalize_profession(&self.profession),
            phone: self.phone.clone(),
            location: self.location.clone(),
            website: self.website.clone(),
            profile_photo: non_empty(self.profile_photo.clone()),
            summary: self.summary.clone(),
        }
    }
}

/// Full replacement of a profile's basic fields. Email is immutable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileUpdate {
    pub full_name: String,
    pub profession: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub website: String,
    #[serde(default)]
    pub profile_photo: Option<String>,
    #[serde(default)]
    pub summary: String,
}

impl ProfileUpdate {
    pub fn validate(&self) -> AppResult<()> {
        require("full_name", &self.full_name)?;
        require("profession", &self.profession)?;
        Ok(())
    }

    pub fn normalized(mut self) -> Self {
        self.full_name = self.full_name.trim().to_string();
        self.profession = normalize_profession(&self.profession);
        self.profile_photo = non_empty(self.profile_photo);
        self
    }
}

/// Partial basic-field update sent along with a complete-profile save.
/// Absent fields keep their stored value.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfilePatch {
    pub full_name: Option<String>,
    pub profession: Option<String>,
    pub phone: Option<String>,
    pub location: Option<String>,
    pub website: Option<String>,
    pub profile_photo: Option<String>,
    pub summary: Option<String>,
}

impl ProfilePatch {
    pub fn is_empty(&self) -> bool {
        self.full_name.is_none()
            && self.profession.is_none()
            && self.phone.is_none()
            && self.location.is_none()
            && self.website.is_none()
            && self.profile_photo.is_none()
            && self.summary.is_none()
    }

    pub fn validate(&self) -> AppResult<()> {
        if let Some(full_name) = &self.full_name {
            require("full_name", full_name)?;
        }
        if let Some(profession) = &self.profession {
            require("profession", profession)?;
        }
        Ok(())
    }

    pub fn apply_to(&self, current: &Profile) -> ProfileUpdate {
        let pick = |patch: &Option<String>, stored: &str| {
            patch.clone().unwrap_or_else(|| stored.to_string())
        };
        ProfileUpdate {
            full_name: pick(&self.full_name, &current.full_name),
            profession: pick(&self.profession, &current.profession),
            phone: pick(&self.phone, &current.phone),
            location: pick(&self.location, &current.location),
            website: pick(&self.website, &current.website),
            profile_photo: match &self.profile_photo {
                Some(photo) => Some(photo.clone()),
                None => current.profile_photo.clone(),
            },
            summary: pick(&self.summary, &current.summary),
        }
        .normalized()
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SkillInput {
    pub name: String,
    #[serde(rename = "type", default)]
    pub skill_type: Option<SkillType>,
    #[serde(default)]
    pub level: Option<i16>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ExperienceInput {
    pub title: String,
    pub company: String,
    pub start_date: NaiveDate,
    #[serde(default, deserialize_with = "optional_date")]
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub is_current: bool,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct EducationInput {
    pub degree: String,
    pub institution: String,
    pub start_date: NaiveDate,
    #[serde(default, deserialize_with = "optional_date")]
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub grade: String,
    #[serde(default)]
    pub location: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ProjectInput {
    pub name: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub technologies: String,
    #[serde(default)]
    pub duration: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub image: Option<String>,
}

/// Skills arrive either as a flat list or grouped by type
/// (`{"technical": [..], "tools": [..], "soft": [..]}`).
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum SkillsPayload {
    Flat(Vec<SkillInput>),
    Grouped(BTreeMap<String, Vec<SkillInput>>),
}

/// A skill after payload resolution: type and proficiency are settled.
#[derive(Debug, Clone, PartialEq)]
pub struct NewSkill {
    pub name: String,
    pub skill_type: SkillType,
    pub proficiency: i16,
}

impl SkillsPayload {
    pub fn resolve(self) -> AppResult<Vec<NewSkill>> {
        let mut resolved = Vec::new();
        match self {
            SkillsPayload::Flat(items) => {
                for item in items {
                    let skill_type = item.skill_type.ok_or_else(|| {
                        AppError::Validation(format!("Skill '{}' is missing a type", item.name))
                    })?;
                    resolved.push(new_skill(item, skill_type));
                }
            }
            SkillsPayload::Grouped(groups) => {
                for (group, items) in groups {
                    for item in items {
                        let skill_type = match item.skill_type {
                            Some(t) => t,
                            None => group.parse()?,
                        };
                        resolved.push(new_skill(item, skill_type));
                    }
                }
            }
        }
        Ok(resolved)
    }
}

fn new_skill(item: SkillInput, skill_type: SkillType) -> NewSkill {
    NewSkill {
        name: item.name.trim().to_string(),
        skill_type,
        proficiency: item.level.unwrap_or(DEFAULT_PROFICIENCY),
    }
}

/// One child collection with the complete set of items that should replace it.
#[derive(Debug, Clone, PartialEq)]
pub enum ChildCollection {
    Skills(Vec<NewSkill>),
    Experience(Vec<ExperienceInput>),
    Education(Vec<EducationInput>),
    Projects(Vec<ProjectInput>),
}

impl ChildCollection {
    pub fn kind(&self) -> &'static str {
        match self {
            ChildCollection::Skills(_) => "skills",
            ChildCollection::Experience(_) => "experience",
            ChildCollection::Education(_) => "education",
            ChildCollection::Projects(_) => "projects",
        }
    }

    pub fn len(&self) -> usize {
        match self {
            ChildCollection::Skills(items) => items.len(),
            ChildCollection::Experience(items) => items.len(),
            ChildCollection::Education(items) => items.len(),
            ChildCollection::Projects(items) => items.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Checks every item before anything is written, so a bad item never
    /// leaves the stored collection half replaced.
    pub fn validate(&self) -> AppResult<()> {
        match self {
            ChildCollection::Skills(items) => {
                for skill in items {
                    require("skill name", &skill.name)?;
                    if !(0..=100).contains(&skill.proficiency) {
                        return Err(AppError::Validation(format!(
                            "Skill '{}' has proficiency {} outside 0-100",
                            skill.name, skill.proficiency
                        )));
                    }
                }
            }
            ChildCollection::Experience(items) => {
                for exp in items {
                    require("experience title", &exp.title)?;
                    require("experience company", &exp.company)?;
                    check_date_range(exp.start_date, exp.end_date, &exp.title)?;
                }
            }
            ChildCollection::Education(items) => {
                for edu in items {
                    require("education degree", &edu.degree)?;
                    require("education institution", &edu.institution)?;
                    check_date_range(edu.start_date, edu.end_date, &edu.degree)?;
                }
            }
            ChildCollection::Projects(items) => {
                for project in items {
                    require("project name", &project.name)?;
                }
            }
        }
        Ok(())
    }
}

/// Body of a complete-profile save. Each collection key that is present,
/// even as `[]`, replaces that collection wholesale.
#[derive(Debug, Clone, Deserialize)]
pub struct SaveProfileRequest {
    /// Checked by the accounts service so a missing id gets its own message.
    #[serde(default)]
    pub user_id: Option<i64>,
    #[serde(flatten)]
    pub details: ProfilePatch,
    #[serde(default)]
    pub skills: Option<SkillsPayload>,
    #[serde(default)]
    pub experience: Option<Vec<ExperienceInput>>,
    #[serde(default)]
    pub education: Option<Vec<EducationInput>>,
    #[serde(default)]
    pub projects: Option<Vec<ProjectInput>>,
}

impl SaveProfileRequest {
    pub fn into_collections(self) -> AppResult<(ProfilePatch, Vec<ChildCollection>)> {
        let mut collections = Vec::new();
        if let Some(skills) = self.skills {
            collections.push(ChildCollection::Skills(skills.resolve()?));
        }
        if let Some(experience) = self.experience {
            collections.push(ChildCollection::Experience(experience));
        }
        if let Some(education) = self.education {
            collections.push(ChildCollection::Education(education));
        }
        if let Some(projects) = self.projects {
            collections.push(ChildCollection::Projects(projects));
        }
        for collection in &collections {
            collection.validate()?;
        }
        Ok((self.details, collections))
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Helpers
// ────────────────────────────────────────────────────────────────────────────

fn require(field: &str, value: &str) -> AppResult<()> {
    if value.trim().is_empty() {
        return Err(AppError::Validation(format!("{field} is required")));
    }
    Ok(())
}

fn check_date_range(start: NaiveDate, end: Option<NaiveDate>, label: &str) -> AppResult<()> {
    match end {
        Some(end) if end < start => Err(AppError::Validation(format!(
            "'{label}' ends before it starts"
        ))),
        _ => Ok(()),
    }
}

pub fn normalize_profession(profession: &str) -> String {
    profession.trim().to_ascii_lowercase()
}

/// Empty optional references are stored as absent.
pub fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Accepts `null`, `""` or an ISO date.
fn optional_date<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) => NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .map(Some)
            .map_err(serde::de::Error::custom),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_flat_skills_require_type() {
        let payload: SkillsPayload =
            serde_json::from_value(json!([{ "name": "Go", "type": "technical" }])).unwrap();
        let skills = payload.resolve().unwrap();
        assert_eq!(skills.len(), 1);
        assert_eq!(skills[0].skill_type, SkillType::Technical);
        assert_eq!(skills[0].proficiency, DEFAULT_PROFICIENCY);

        let missing: SkillsPayload = serde_json::from_value(json!([{ "name": "Go" }])).unwrap();
        assert!(matches!(missing.resolve(), Err(AppError::Validation(_))));
    }

    #[test]
    fn test_grouped_skills_fall_back_to_group_key() {
        let payload: SkillsPayload = serde_json::from_value(json!({
            "tools": [{ "name": "Docker", "level": 80 }],
            "soft": [{ "name": "Mentoring", "type": "soft" }]
        }))
        .unwrap();
        let skills = payload.resolve().unwrap();
        let docker = skills.iter().find(|s| s.name == "Docker").unwrap();
        assert_eq!(docker.skill_type, SkillType::Tools);
        assert_eq!(docker.proficiency, 80);
    }

    #[test]
    fn test_unknown_skill_type_is_rejected() {
        let result: Result<SkillsPayload, _> =
            serde_json::from_value(json!([{ "name": "Juggling", "type": "circus" }]));
        // Neither untagged variant accepts an unknown tag.
        assert!(result.is_err());
        assert!("circus".parse::<SkillType>().is_err());
    }

    #[test]
    fn test_empty_end_date_means_ongoing() {
        let exp: ExperienceInput = serde_json::from_value(json!({
            "title": "Eng",
            "company": "Acme",
            "start_date": "2020-01-01",
            "end_date": ""
        }))
        .unwrap();
        assert!(exp.end_date.is_none());

        let exp: ExperienceInput = serde_json::from_value(json!({
            "title": "Eng",
            "company": "Acme",
            "start_date": "2020-01-01",
            "end_date": null
        }))
        .unwrap();
        assert!(exp.end_date.is_none());
    }

    #[test]
    fn test_validation_rejects_out_of_range_proficiency() {
        let collection = ChildCollection::Skills(vec![NewSkill {
            name: "Rust".to_string(),
            skill_type: SkillType::Technical,
            proficiency: 150,
        }]);
        assert!(matches!(collection.validate(), Err(AppError::Validation(_))));
    }

    #[test]
    fn test_validation_rejects_inverted_dates() {
        let collection = ChildCollection::Experience(vec![ExperienceInput {
            title: "Eng".to_string(),
            company: "Acme".to_string(),
            start_date: NaiveDate::from_ymd_opt(2022, 1, 1).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2021, 1, 1),
            is_current: false,
            description: String::new(),
        }]);
        assert!(collection.validate().is_err());
    }

    #[test]
    fn test_save_request_keeps_present_empty_collections() {
        let request: SaveProfileRequest = serde_json::from_value(json!({
            "user_id": 5,
            "summary": "Hello",
            "experience": []
        }))
        .unwrap();
        let (patch, collections) = request.into_collections().unwrap();
        assert_eq!(patch.summary.as_deref(), Some("Hello"));
        assert_eq!(collections, vec![ChildCollection::Experience(vec![])]);
        assert!(collections[0].is_empty());
        assert_eq!(collections[0].len(), 0);
    }

    #[test]
    fn test_new_profile_debug_redacts_password() {
        let profile = NewProfile {
            full_name: "Ada".to_string(),
            email: "ada@example.com".to_string(),
            password: "hunter2".to_string(),
            profession: "developer".to_string(),
            phone: String::new(),
            location: String::new(),
            website: String::new(),
            profile_photo: None,
            summary: String::new(),
        };
        assert!(!format!("{profile:?}").contains("hunter2"));
    }
}
