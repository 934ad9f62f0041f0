use tracing::{debug, info};

use crate::errors::{AppError, AppResult};
use crate::models::profile::normalize_profession;
use crate::models::template::{Template, DEFAULT_PROFESSION};
use crate::store::TemplateStore;

/// Picks the template for a profession.
///
/// Only active templates count. Several active templates for one profession
/// resolve to the lowest id. With no match the active `developer` template
/// is used; with no `developer` either the catalog is misconfigured.
pub fn select_template<'a>(templates: &'a [Template], profession: &str) -> AppResult<&'a Template> {
    let profession = normalize_profession(profession);
    let lowest = |key: &str| {
        templates
            .iter()
            .filter(|t| t.is_active && t.profession == key)
            .min_by_key(|t| t.id)
    };

    if let Some(template) = lowest(profession.as_str()) {
        return Ok(template);
    }
    debug!("No active template for profession '{profession}', using default");
    lowest(DEFAULT_PROFESSION).ok_or(AppError::NoDefaultTemplate)
}

/// Startup check: the default template must exist and be active.
pub async fn ensure_default_template(store: &dyn TemplateStore) -> AppResult<Template> {
    let templates = store.active_templates().await?;
    let default = templates
        .iter()
        .filter(|t| t.profession == DEFAULT_PROFESSION)
        .min_by_key(|t| t.id)
        .cloned()
        .ok_or(AppError::NoDefaultTemplate)?;
    info!(
        "Default portfolio template: {} (id {})",
        default.template_name, default.id
    );
    Ok(default)
}
