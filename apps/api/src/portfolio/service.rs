use serde::Serialize;
use tracing::{info, warn};

use crate::envelope::Envelope;
use crate::errors::AppResult;
use crate::models::profile::{normalize_profession, CompleteProfile};
use crate::models::template::Template;
use crate::portfolio::render::render;
use crate::portfolio::selector::select_template;
use crate::store::{ProfileStore, TemplateStore};

#[derive(Debug, Serialize)]
pub struct GeneratedPortfolio {
    pub html: String,
    pub profile: CompleteProfile,
    pub template: Template,
}

#[derive(Debug, Serialize)]
pub struct PortfolioView {
    pub profile: CompleteProfile,
    pub template: Template,
}

#[derive(Debug, Serialize)]
pub struct TemplateList {
    pub templates: Vec<Template>,
}

/// Loads the profile, picks its template and renders the page.
///
/// `template_hint` is accepted from callers but the profile's own
/// profession always decides the template.
pub async fn generate_portfolio(
    profiles: &dyn ProfileStore,
    templates: &dyn TemplateStore,
    user_id: i64,
    template_hint: Option<&str>,
) -> Envelope<GeneratedPortfolio> {
    let result = generate(profiles, templates, user_id, template_hint).await;
    log_failure("generate_portfolio", user_id, result).into()
}

/// Same lookup and selection as `generate_portfolio`, without rendering.
pub async fn get_portfolio(
    profiles: &dyn ProfileStore,
    templates: &dyn TemplateStore,
    user_id: i64,
) -> Envelope<PortfolioView> {
    let result = resolve(profiles, templates, user_id, None).await;
    log_failure("get_portfolio", user_id, result).into()
}

/// All active templates, ordered by profession then name.
pub async fn list_templates(templates: &dyn TemplateStore) -> Envelope<TemplateList> {
    templates
        .active_templates()
        .await
        .map(|templates| TemplateList { templates })
        .into()
}

async fn generate(
    profiles: &dyn ProfileStore,
    templates: &dyn TemplateStore,
    user_id: i64,
    template_hint: Option<&str>,
) -> AppResult<GeneratedPortfolio> {
    let PortfolioView { profile, template } =
        resolve(profiles, templates, user_id, template_hint).await?;
    let html = render(&profile, &template);
    info!(
        user_id,
        template = %template.template_name,
        bytes = html.len(),
        "Portfolio generated"
    );
    Ok(GeneratedPortfolio {
        html,
        profile,
        template,
    })
}

async fn resolve(
    profiles: &dyn ProfileStore,
    templates: &dyn TemplateStore,
    user_id: i64,
    template_hint: Option<&str>,
) -> AppResult<PortfolioView> {
    let profile = profiles.get_complete_profile(user_id).await?;
    let catalog = templates.active_templates().await?;
    let template = select_template(&catalog, &profile.profile.profession)?.clone();

    if let Some(hint) = template_hint {
        if normalize_profession(hint) != template.profession {
            info!(
                user_id,
                hint,
                selected = %template.profession,
                "Template hint ignored, profile profession decides"
            );
        }
    }
    Ok(PortfolioView { profile, template })
}

fn log_failure<T>(operation: &str, user_id: i64, result: AppResult<T>) -> AppResult<T> {
    if let Err(err) = &result {
        warn!(operation, user_id, code = err.code(), "Portfolio request failed: {err}");
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::AppError;
    use crate::models::profile::{ChildCollection, ExperienceInput};
    use crate::store::memory::tests::new_profile;
    use crate::store::memory::MemoryStore;
    use chrono::NaiveDate;
    use serde_json::json;

    #[tokio::test]
    async fn test_generate_for_missing_user_fails_without_html() {
        let store = MemoryStore::new();
        let envelope = generate_portfolio(&store, &store, 404, None).await;
        assert!(matches!(envelope, Envelope::Failure(AppError::NotFound(_))));

        let value = serde_json::to_value(&envelope).unwrap();
        assert_eq!(value["success"], json!(false));
        assert_eq!(value["message"], json!("User not found"));
        assert!(value.get("html").is_none());
    }

    #[tokio::test]
    async fn test_generate_renders_current_experience_as_present() {
        let store = MemoryStore::new();
        let id = store
            .create_profile(new_profile("eng@example.com", "developer"))
            .await
            .unwrap();

        store
            .replace_child_collection(id, ChildCollection::Experience(vec![]))
            .await
            .unwrap();
        store
            .replace_child_collection(
                id,
                ChildCollection::Experience(vec![ExperienceInput {
                    title: "Eng".to_string(),
                    company: "Acme".to_string(),
                    start_date: NaiveDate::from_ymd_opt(2020, 1, 1).unwrap(),
                    end_date: None,
                    is_current: false,
                    description: String::new(),
                }]),
            )
            .await
            .unwrap();

        let generated = generate_portfolio(&store, &store, id, None)
            .await
            .into_result()
            .unwrap();
        assert_eq!(generated.profile.experience.len(), 1);
        assert!(generated.html.contains("Present"));
        assert!(generated.html.contains("Acme"));
    }

    #[tokio::test]
    async fn test_unknown_profession_uses_developer_template() {
        let store = MemoryStore::new();
        let id = store
            .create_profile(new_profile("art@example.com", "sculptor"))
            .await
            .unwrap();

        let generated = generate_portfolio(&store, &store, id, None)
            .await
            .into_result()
            .unwrap();
        assert_eq!(generated.template.profession, "developer");
        assert!(generated.html.contains("Developer Portfolio"));
    }

    #[tokio::test]
    async fn test_hint_does_not_override_profession() {
        let store = MemoryStore::new();
        let id = store
            .create_profile(new_profile("doc@example.com", "doctor"))
            .await
            .unwrap();

        let generated = generate_portfolio(&store, &store, id, Some("photographer"))
            .await
            .into_result()
            .unwrap();
        assert_eq!(generated.template.profession, "doctor");
        assert!(generated.html.contains("Medical Professional"));
    }

    #[tokio::test]
    async fn test_generate_envelope_carries_html_and_profile() {
        let store = MemoryStore::new();
        let id = store
            .create_profile(new_profile("shape@example.com", "photographer"))
            .await
            .unwrap();

        let value =
            serde_json::to_value(generate_portfolio(&store, &store, id, None).await).unwrap();
        assert_eq!(value["success"], json!(true));
        assert!(value["html"].as_str().unwrap().starts_with("<!DOCTYPE html>"));
        assert_eq!(value["profile"]["email"], json!("shape@example.com"));
        assert_eq!(value["template"]["profession"], json!("photographer"));
        assert!(value["profile"].get("password_hash").is_none());
    }

    #[tokio::test]
    async fn test_missing_default_template_fails_generation() {
        let store = MemoryStore::with_templates(vec![]);
        let id = store
            .create_profile(new_profile("x@example.com", "sculptor"))
            .await
            .unwrap();

        let envelope = generate_portfolio(&store, &store, id, None).await;
        assert!(matches!(
            envelope.into_result(),
            Err(AppError::NoDefaultTemplate)
        ));
    }

    #[tokio::test]
    async fn test_get_portfolio_returns_selection_without_html() {
        let store = MemoryStore::new();
        let id = store
            .create_profile(new_profile("view@example.com", "doctor"))
            .await
            .unwrap();

        let value = serde_json::to_value(get_portfolio(&store, &store, id).await).unwrap();
        assert_eq!(value["success"], json!(true));
        assert_eq!(value["template"]["profession"], json!("doctor"));
        assert!(value.get("html").is_none());

        let missing = get_portfolio(&store, &store, id + 1).await;
        assert!(matches!(missing.into_result(), Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_list_templates_is_ordered() {
        let store = MemoryStore::new();
        let listed = list_templates(&store).await.into_result().unwrap();
        let keys: Vec<(&str, &str)> = listed
            .templates
            .iter()
            .map(|t| (t.profession.as_str(), t.template_name.as_str()))
            .collect();
        let mut sorted = keys.clone();
        sorted.sort();
        assert_eq!(keys, sorted);
        assert_eq!(listed.templates.len(), 8);
    }
}
