//! Portfolio HTML rendering.
//!
//! `render` is pure: same profile and template in, same document out.
//! Every user-supplied string passes through `escape_html` before it is
//! embedded, in text and in attribute position alike.

use std::borrow::Cow;

use chrono::NaiveDate;

use crate::models::profile::{CompleteProfile, Education, Experience, Project, Skill, SkillType};
use crate::models::template::Template;
use crate::portfolio::layout::{Layout, LayoutConfig, SectionKind, SectionSpec};

const ICON_FONT_CDN: &str =
    "https://cdnjs.cloudflare.com/ajax/libs/font-awesome/6.0.0/css/all.min.css";

/// Replaces `& < > " '` with entities.
pub fn escape_html(raw: &str) -> Cow<'_, str> {
    if !raw.contains(['&', '<', '>', '"', '\'']) {
        return Cow::Borrowed(raw);
    }
    let mut out = String::with_capacity(raw.len() + 16);
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#039;"),
            other => out.push(other),
        }
    }
    Cow::Owned(out)
}

/// Renders a complete, self-contained HTML document.
///
/// The layout follows the profile's own profession; `template` has already
/// been chosen by the selector and is recorded in the document metadata.
pub fn render(profile: &CompleteProfile, template: &Template) -> String {
    let layout = Layout::for_profession(&profile.profile.profession);
    let config = layout.config();

    let mut html = String::with_capacity(8 * 1024);
    html.push_str(&render_head(profile, template, config));
    html.push_str("<body>\n");
    html.push_str(&render_hero(profile, config));
    for spec in config.sections {
        html.push_str(&render_section(profile, spec));
    }
    html.push_str("</body>\n</html>\n");
    html
}

fn render_head(profile: &CompleteProfile, template: &Template, config: &LayoutConfig) -> String {
    let (from, to) = config.gradient;
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <meta name="portfolio-template" content="{template_name}">
    <title>{prefix}{name} - {suffix}</title>
    <link href="{cdn}" rel="stylesheet">
    <style>
        * {{ margin: 0; padding: 0; box-sizing: border-box; }}
        body {{ font-family: {font}; line-height: 1.6; color: #333; }}
        .container {{ max-width: 1200px; margin: 0 auto; padding: 0 20px; }}
        .hero {{ background: linear-gradient(135deg, {from} 0%, {to} 100%); color: white; padding: 100px 0; text-align: center; }}
        .hero h1 {{ font-size: 3.5rem; margin-bottom: 1rem; }}
        .hero p {{ font-size: 1.3rem; margin-bottom: 2rem; }}
        .hero .profile-photo {{ width: 200px; height: 200px; border-radius: 50%; object-fit: cover; margin-bottom: 2rem; box-shadow: 0 10px 30px rgba(0,0,0,0.3); }}
        .section {{ padding: 80px 0; }}
        .section.shaded {{ background: #f8f9fa; }}
        .section h2 {{ text-align: center; margin-bottom: 3rem; font-size: 2.5rem; color: {heading}; }}
        .contact-info {{ background: {contact_bg}; color: #333; padding: 2rem; border-radius: 10px; text-align: center; }}
        .contact-info a {{ color: inherit; }}
        .placeholder {{ text-align: center; color: #777; }}
{extra}    </style>
</head>
"#,
        template_name = escape_html(&template.template_name),
        prefix = config.name_prefix,
        name = escape_html(&profile.profile.full_name),
        suffix = config.title_suffix,
        cdn = ICON_FONT_CDN,
        font = config.font_family,
        heading = config.heading_color,
        contact_bg = config.contact_background,
        extra = config.extra_css,
    )
}

fn render_hero(profile: &CompleteProfile, config: &LayoutConfig) -> String {
    let p = &profile.profile;
    let mut html = String::from("<section class=\"hero\">\n<div class=\"container\">\n");

    if config.show_photo {
        if let Some(photo) = p.profile_photo.as_deref().filter(|s| !s.trim().is_empty()) {
            html.push_str(&format!(
                "<img class=\"profile-photo\" src=\"{}\" alt=\"Profile Photo\">\n",
                escape_html(photo)
            ));
        }
    }
    html.push_str(&format!(
        "<h1>{}{}</h1>\n<p>{}</p>\n",
        config.name_prefix,
        escape_html(&p.full_name),
        escape_html(&p.summary)
    ));

    html.push_str("<div class=\"contact-info\">\n");
    html.push_str(&format!(
        "<p><i class=\"fas fa-envelope\"></i> {}</p>\n",
        escape_html(&p.email)
    ));
    if !p.phone.trim().is_empty() {
        html.push_str(&format!(
            "<p><i class=\"fas fa-phone\"></i> {}</p>\n",
            escape_html(&p.phone)
        ));
    }
    if !p.location.trim().is_empty() {
        html.push_str(&format!(
            "<p><i class=\"fas fa-map-marker-alt\"></i> {}</p>\n",
            escape_html(&p.location)
        ));
    }
    if !p.website.trim().is_empty() {
        let website = escape_html(&p.website);
        html.push_str(&format!(
            "<p><i class=\"fas fa-globe\"></i> <a href=\"{website}\" target=\"_blank\" rel=\"noopener\">{website}</a></p>\n"
        ));
    }
    html.push_str("</div>\n</div>\n</section>\n");
    html
}

fn render_section(profile: &CompleteProfile, spec: &SectionSpec) -> String {
    let body = match spec.kind {
        SectionKind::GroupedSkills => render_grouped_skills(&profile.skills),
        SectionKind::SkillTags => render_skill_tags(profile.skills.iter()),
        SectionKind::Experience => render_experience(&profile.experience),
        SectionKind::Projects => render_projects(&profile.projects),
        SectionKind::Gallery => render_gallery(&profile.projects),
        SectionKind::Education => render_education(&profile.education),
    };
    let class = if spec.shaded { "section shaded" } else { "section" };
    format!(
        "<section class=\"{class}\">\n<div class=\"container\">\n<h2>{}</h2>\n{body}</div>\n</section>\n",
        spec.heading
    )
}

fn placeholder(text: &str) -> String {
    format!("<p class=\"placeholder\">{text}</p>\n")
}

fn skill_group_heading(skill_type: SkillType) -> &'static str {
    match skill_type {
        SkillType::Technical => "Technical Skills",
        SkillType::Tools => "Tools &amp; Technologies",
        SkillType::Soft => "Soft Skills",
    }
}

fn render_grouped_skills(skills: &[Skill]) -> String {
    let mut html = String::from("<div class=\"skills-grid\">\n");
    for skill_type in SkillType::ALL {
        html.push_str(&format!(
            "<div class=\"skill-category\">\n<h3>{}</h3>\n",
            skill_group_heading(skill_type)
        ));
        html.push_str(&render_skill_tags(
            skills.iter().filter(|s| s.skill_type == skill_type),
        ));
        html.push_str("</div>\n");
    }
    html.push_str("</div>\n");
    html
}

fn render_skill_tags<'a>(skills: impl Iterator<Item = &'a Skill>) -> String {
    let tags: String = skills
        .map(|s| {
            format!(
                "<span class=\"skill-tag\">{}</span>",
                escape_html(&s.skill_name)
            )
        })
        .collect();
    if tags.is_empty() {
        return placeholder("No skills listed");
    }
    format!("<div class=\"skill-tags\">{tags}</div>\n")
}

fn date_range(start: NaiveDate, end: Option<NaiveDate>, ongoing: bool) -> String {
    let end = match end {
        Some(end) if !ongoing => end.format("%Y-%m-%d").to_string(),
        _ => "Present".to_string(),
    };
    format!("{} - {}", start.format("%Y-%m-%d"), end)
}

fn render_experience(experience: &[Experience]) -> String {
    if experience.is_empty() {
        return placeholder("No experience listed");
    }
    experience
        .iter()
        .map(|exp| {
            format!(
                "<div class=\"experience-item\">\n<h3>{}</h3>\n<h4>{}</h4>\n<p><strong>Duration:</strong> {}</p>\n<p>{}</p>\n</div>\n",
                escape_html(&exp.job_title),
                escape_html(&exp.company),
                date_range(exp.start_date, exp.end_date, exp.is_current),
                escape_html(&exp.description),
            )
        })
        .collect()
}

fn render_education(education: &[Education]) -> String {
    if education.is_empty() {
        return placeholder("No education listed");
    }
    education
        .iter()
        .map(|edu| {
            let mut item = format!(
                "<div class=\"education-item\">\n<h3>{}</h3>\n<h4>{}</h4>\n<p><strong>Duration:</strong> {}</p>\n",
                escape_html(&edu.degree),
                escape_html(&edu.institution),
                date_range(edu.start_date, edu.end_date, false),
            );
            if !edu.grade.trim().is_empty() {
                item.push_str(&format!(
                    "<p><strong>Grade:</strong> {}</p>\n",
                    escape_html(&edu.grade)
                ));
            }
            if !edu.location.trim().is_empty() {
                item.push_str(&format!(
                    "<p><strong>Location:</strong> {}</p>\n",
                    escape_html(&edu.location)
                ));
            }
            item.push_str("</div>\n");
            item
        })
        .collect()
}

fn project_link(project: &Project) -> Option<String> {
    let url = project.project_url.as_deref().filter(|u| !u.trim().is_empty())?;
    Some(format!(
        "<a href=\"{}\" target=\"_blank\" rel=\"noopener\">View Project</a>\n",
        escape_html(url)
    ))
}

fn render_projects(projects: &[Project]) -> String {
    if projects.is_empty() {
        return placeholder("No projects listed");
    }
    projects
        .iter()
        .map(|project| {
            let mut card = format!(
                "<div class=\"project-card\">\n<h3>{}</h3>\n<p><strong>Technologies:</strong> {}</p>\n<p><strong>Duration:</strong> {}</p>\n<p>{}</p>\n",
                escape_html(&project.project_name),
                escape_html(&project.technologies),
                escape_html(&project.duration),
                escape_html(&project.description),
            );
            if let Some(link) = project_link(project) {
                card.push_str(&link);
            }
            card.push_str("</div>\n");
            card
        })
        .collect()
}

fn render_gallery(projects: &[Project]) -> String {
    if projects.is_empty() {
        return placeholder("No projects to display");
    }
    let mut html = String::from("<div class=\"gallery\">\n");
    for project in projects {
        html.push_str("<div class=\"gallery-item\">\n");
        if let Some(image) = project.project_image.as_deref().filter(|i| !i.trim().is_empty()) {
            html.push_str(&format!(
                "<img src=\"{}\" alt=\"{}\">\n",
                escape_html(image),
                escape_html(&project.project_name)
            ));
        }
        html.push_str(&format!(
            "<div style=\"padding: 1rem;\">\n<h3>{}</h3>\n<p>{}</p>\n<p><strong>Technologies:</strong> {}</p>\n<p><strong>Duration:</strong> {}</p>\n",
            escape_html(&project.project_name),
            escape_html(&project.description),
            escape_html(&project.technologies),
            escape_html(&project.duration),
        ));
        if let Some(link) = project_link(project) {
            html.push_str(&link);
        }
        html.push_str("</div>\n</div>\n");
    }
    html.push_str("</div>\n");
    html
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::models::profile::Profile;
    use crate::models::template::seed_templates;
    use chrono::Utc;

    pub(crate) fn sample_profile(profession: &str) -> CompleteProfile {
        let now = Utc::now();
        CompleteProfile {
            profile: Profile {
                id: 1,
                full_name: "Ada Lovelace".to_string(),
                email: "ada@example.com".to_string(),
                profession: profession.to_string(),
                phone: "+44 20 0000".to_string(),
                location: "London".to_string(),
                website: String::new(),
                profile_photo: None,
                summary: "First programmer".to_string(),
                created_at: now,
                updated_at: now,
            },
            skills: vec![],
            experience: vec![],
            education: vec![],
            projects: vec![],
        }
    }

    fn default_template() -> Template {
        seed_templates().remove(0)
    }

    fn skill(id: i64, name: &str, skill_type: SkillType) -> Skill {
        Skill {
            id,
            skill_name: name.to_string(),
            skill_type,
            proficiency_level: 50,
        }
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn project(name: &str, url: Option<&str>, image: Option<&str>) -> Project {
        Project {
            id: 1,
            project_name: name.to_string(),
            project_url: url.map(str::to_string),
            technologies: "Rust".to_string(),
            duration: "6 months".to_string(),
            description: "A thing".to_string(),
            project_image: image.map(str::to_string),
        }
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(
            escape_html(r#"<a href="x">Tom & 'Jerry'</a>"#),
            "&lt;a href=&quot;x&quot;&gt;Tom &amp; &#039;Jerry&#039;&lt;/a&gt;"
        );
        assert!(matches!(escape_html("plain"), Cow::Borrowed(_)));
    }

    #[test]
    fn test_document_is_complete() {
        let html = render(&sample_profile("developer"), &default_template());
        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.trim_end().ends_with("</html>"));
        assert_eq!(html.matches("<section").count(), html.matches("</section>").count());
        assert_eq!(html.matches("<div").count(), html.matches("</div>").count());
        assert!(html.contains(ICON_FONT_CDN));
        assert!(html.contains("Ada Lovelace - Developer Portfolio"));
    }

    #[test]
    fn test_user_input_is_escaped_everywhere() {
        let mut profile = sample_profile("developer");
        profile.profile.full_name = "<script>alert(1)</script>".to_string();
        profile.profile.summary = "Fish & Chips".to_string();
        profile.profile.website = "https://x.dev/?a=1&b=\"2\"".to_string();
        profile.skills = vec![skill(1, "<b>Rust</b>", SkillType::Technical)];
        profile.experience = vec![Experience {
            id: 1,
            job_title: "Eng <lead>".to_string(),
            company: "A&B".to_string(),
            start_date: date(2020, 1, 1),
            end_date: None,
            is_current: false,
            description: "\"quoted\"".to_string(),
        }];
        profile.projects = vec![project("p<1>", Some("javascript:\"x\""), None)];

        let html = render(&profile, &default_template());
        assert!(!html.contains("<script>"));
        assert!(!html.contains("<b>Rust</b>"));
        assert!(!html.contains("<lead>"));
        assert!(!html.contains("A&B"));
        assert!(html.contains("&lt;script&gt;alert(1)&lt;/script&gt;"));
        assert!(html.contains("Fish &amp; Chips"));
        assert!(html.contains("&lt;b&gt;Rust&lt;/b&gt;"));
        assert!(html.contains("A&amp;B"));
        assert!(html.contains("&quot;quoted&quot;"));
        assert!(html.contains("href=\"javascript:&quot;x&quot;\""));
        assert!(html.contains("a=1&amp;b=&quot;2&quot;"));
    }

    #[test]
    fn test_empty_collections_render_placeholders() {
        let html = render(&sample_profile("developer"), &default_template());
        // Three skill buckets, each empty.
        assert_eq!(html.matches("No skills listed").count(), 3);
        assert!(html.contains("No experience listed"));
        assert!(html.contains("No projects listed"));
        assert!(html.contains("No education listed"));

        let html = render(&sample_profile("photographer"), &default_template());
        assert!(html.contains("No projects to display"));
        assert!(html.contains("No skills listed"));
    }

    #[test]
    fn test_missing_end_date_renders_present() {
        let mut profile = sample_profile("developer");
        profile.experience = vec![
            Experience {
                id: 1,
                job_title: "Eng".to_string(),
                company: "Acme".to_string(),
                start_date: date(2020, 1, 1),
                end_date: None,
                is_current: false,
                description: String::new(),
            },
            Experience {
                id: 2,
                job_title: "Intern".to_string(),
                company: "Acme".to_string(),
                start_date: date(2018, 6, 1),
                end_date: Some(date(2019, 9, 30)),
                is_current: false,
                description: String::new(),
            },
        ];
        let html = render(&profile, &default_template());
        assert!(html.contains("2020-01-01 - Present"));
        assert!(html.contains("2018-06-01 - 2019-09-30"));
    }

    #[test]
    fn test_current_flag_renders_present() {
        assert_eq!(
            date_range(date(2021, 1, 1), Some(date(2023, 1, 1)), true),
            "2021-01-01 - Present"
        );
    }

    #[test]
    fn test_optional_fields_leave_no_broken_markup() {
        let mut profile = sample_profile("developer");
        profile.projects = vec![project("No link", None, None), project("Blank", Some("  "), None)];
        let html = render(&profile, &default_template());
        assert!(!html.contains("src=\"\""));
        assert!(!html.contains("href=\"\""));
        assert!(!html.contains("View Project"));
        assert!(!html.contains("profile-photo\" src"));
        assert!(!html.contains("fa-globe"));

        let mut photographer = sample_profile("photographer");
        photographer.projects = vec![project("Dunes", None, None)];
        let html = render(&photographer, &default_template());
        assert!(!html.contains("<img"));
        assert!(html.contains("Dunes"));
    }

    #[test]
    fn test_optional_fields_render_when_present() {
        let mut profile = sample_profile("developer");
        profile.profile.profile_photo = Some("uploads/me.png".to_string());
        profile.profile.website = "https://ada.dev".to_string();
        profile.projects = vec![project("Engine", Some("https://example.com"), None)];
        let html = render(&profile, &default_template());
        assert!(html.contains("src=\"uploads/me.png\""));
        assert!(html.contains("href=\"https://example.com\""));
        assert!(html.contains("href=\"https://ada.dev\""));
    }

    #[test]
    fn test_developer_groups_skills_by_type() {
        let mut profile = sample_profile("developer");
        profile.skills = vec![
            skill(1, "Rust", SkillType::Technical),
            skill(2, "Docker", SkillType::Tools),
        ];
        let html = render(&profile, &default_template());
        let technical = html.find("Technical Skills").unwrap();
        let tools = html.find("Tools &amp; Technologies").unwrap();
        let soft = html.find("Soft Skills").unwrap();
        let rust = html.find(">Rust<").unwrap();
        let docker = html.find(">Docker<").unwrap();
        assert!(technical < rust && rust < tools);
        assert!(tools < docker && docker < soft);
        // Only the soft bucket is empty.
        assert_eq!(html.matches("No skills listed").count(), 1);
    }

    #[test]
    fn test_developer_section_order() {
        let html = render(&sample_profile("developer"), &default_template());
        let order = [
            html.find("class=\"hero\"").unwrap(),
            html.find("Skills &amp; Technologies").unwrap(),
            html.find("Professional Experience").unwrap(),
            html.find("<h2>Projects</h2>").unwrap(),
            html.find("<h2>Education</h2>").unwrap(),
        ];
        assert!(order.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_doctor_layout() {
        let mut profile = sample_profile("doctor");
        profile.profile.profile_photo = Some("uploads/me.png".to_string());
        profile.projects = vec![project("ClinicTracker", Some("https://clinic.example"), None)];
        let html = render(&profile, &default_template());
        assert!(html.contains("<title>Dr. Ada Lovelace - Medical Professional</title>"));
        assert!(html.contains("<h1>Dr. Ada Lovelace</h1>"));
        assert!(html.contains("Georgia"));
        // Doctor pages carry no photo.
        assert!(!html.contains("uploads/me.png"));
        let order = [
            html.find("Specializations").unwrap(),
            html.find("Education &amp; Training").unwrap(),
            html.find("Professional Experience").unwrap(),
            html.find("<h2>Research &amp; Projects</h2>").unwrap(),
            html.find("ClinicTracker").unwrap(),
        ];
        assert!(order.windows(2).all(|w| w[0] < w[1]));
        assert!(html.contains("<strong>Technologies:</strong> Rust"));
        assert!(html.contains("href=\"https://clinic.example\""));
    }

    #[test]
    fn test_photographer_gallery() {
        let mut profile = sample_profile("photographer");
        profile.projects = vec![project(
            "Dunes",
            Some("https://dunes.example"),
            Some("uploads/dunes.jpg"),
        )];
        profile.experience = vec![Experience {
            id: 1,
            job_title: "Staff Photographer".to_string(),
            company: "Daily Planet".to_string(),
            start_date: date(2019, 3, 1),
            end_date: Some(date(2022, 8, 31)),
            is_current: false,
            description: "Front pages".to_string(),
        }];
        profile.education = vec![Education {
            id: 1,
            degree: "BA Photography".to_string(),
            institution: "Arts College".to_string(),
            start_date: date(2015, 9, 1),
            end_date: Some(date(2018, 6, 30)),
            grade: "First".to_string(),
            location: "Leeds".to_string(),
        }];
        let html = render(&profile, &default_template());
        assert!(html.contains("Ada Lovelace - Photographer"));
        assert!(html.contains("<img src=\"uploads/dunes.jpg\" alt=\"Dunes\">"));
        assert!(html.contains("<strong>Technologies:</strong> Rust"));
        assert!(html.contains("<strong>Duration:</strong> 6 months"));
        assert!(html.contains("href=\"https://dunes.example\""));
        let order = [
            html.find("Portfolio Gallery").unwrap(),
            html.find("Services").unwrap(),
            html.find("<h2>Experience</h2>").unwrap(),
            html.find("Daily Planet").unwrap(),
            html.find("<h2>Education</h2>").unwrap(),
            html.find("Arts College").unwrap(),
        ];
        assert!(order.windows(2).all(|w| w[0] < w[1]));
        assert!(html.contains("2019-03-01 - 2022-08-31"));
        assert!(html.contains("Leeds"));
    }

    #[test]
    fn test_unknown_profession_uses_developer_layout() {
        let html = render(&sample_profile("sculptor"), &default_template());
        assert!(html.contains("Ada Lovelace - Developer Portfolio"));
        assert!(html.contains("Technical Skills"));
    }

    #[test]
    fn test_render_is_deterministic() {
        let profile = sample_profile("doctor");
        let template = default_template();
        assert_eq!(render(&profile, &template), render(&profile, &template));
    }
}
