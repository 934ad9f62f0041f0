//! Profession → layout configuration.
//!
//! Every profession renders with one of these layouts. Each
//! layout fixes its palette, title decoration and section order.

use serde::Serialize;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Layout {
    Developer,
    Doctor,
    Photographer,
}

/// Professions that have a catalog entry but no layout of their own. They
/// render with the developer layout.
pub const PROFESSIONS_WITHOUT_LAYOUT: &[&str] =
    &["video_editor", "marketing", "designer", "writer", "consultant"];

impl Layout {
    /// Unknown professions and those in `PROFESSIONS_WITHOUT_LAYOUT` fall
    /// back to `Developer`.
    pub fn for_profession(profession: &str) -> Layout {
        match profession.trim().to_ascii_lowercase().as_str() {
            "doctor" => Layout::Doctor,
            "photographer" => Layout::Photographer,
            "developer" => Layout::Developer,
            other => {
                if !PROFESSIONS_WITHOUT_LAYOUT.contains(&other) {
                    debug!("No layout for profession '{other}', rendering as developer");
                }
                Layout::Developer
            }
        }
    }

    pub fn config(&self) -> &'static LayoutConfig {
        match self {
            Layout::Developer => &DEVELOPER,
            Layout::Doctor => &DOCTOR,
            Layout::Photographer => &PHOTOGRAPHER,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectionKind {
    /// Skills bucketed into technical / tools / soft.
    GroupedSkills,
    /// Skills as a flat row of tags.
    SkillTags,
    Experience,
    Projects,
    /// Projects as image cards.
    Gallery,
    Education,
}

#[derive(Debug, Clone, Copy)]
pub struct SectionSpec {
    pub kind: SectionKind,
    pub heading: &'static str,
    pub shaded: bool,
}

#[derive(Debug)]
pub struct LayoutConfig {
    pub name_prefix: &'static str,
    pub title_suffix: &'static str,
    pub font_family: &'static str,
    pub gradient: (&'static str, &'static str),
    pub heading_color: &'static str,
    pub contact_background: &'static str,
    pub show_photo: bool,
    /// Rendered after the hero, in this order.
    pub sections: &'static [SectionSpec],
    pub extra_css: &'static str,
}

const fn section(kind: SectionKind, heading: &'static str, shaded: bool) -> SectionSpec {
    SectionSpec {
        kind,
        heading,
        shaded,
    }
}

static DEVELOPER: LayoutConfig = LayoutConfig {
    name_prefix: "",
    title_suffix: "Developer Portfolio",
    font_family: r#""Segoe UI", Tahoma, Geneva, Verdana, sans-serif"#,
    gradient: ("#667eea", "#764ba2"),
    heading_color: "#333",
    contact_background: "#f8f9fa",
    show_photo: true,
    sections: &[
        section(SectionKind::GroupedSkills, "Skills &amp; Technologies", false),
        section(SectionKind::Experience, "Professional Experience", true),
        section(SectionKind::Projects, "Projects", false),
        section(SectionKind::Education, "Education", true),
    ],
    extra_css: "\
        .skills-grid { display: grid; grid-template-columns: repeat(auto-fit, minmax(300px, 1fr)); gap: 2rem; }\n\
        .skill-category h3 { color: #667eea; margin-bottom: 1rem; }\n\
        .skill-tag { display: inline-block; background: #667eea; color: white; padding: 8px 16px; margin: 5px; border-radius: 20px; font-size: 0.9rem; }\n\
        .experience-item { border-left: 3px solid #667eea; padding-left: 20px; margin-bottom: 2rem; }\n\
        .project-card { background: #f8f9fa; padding: 2rem; border-radius: 10px; margin-bottom: 2rem; box-shadow: 0 2px 10px rgba(0,0,0,0.1); }\n",
};

static DOCTOR: LayoutConfig = LayoutConfig {
    name_prefix: "Dr. ",
    title_suffix: "Medical Professional",
    font_family: r#""Georgia", serif"#,
    gradient: ("#2c5aa0", "#1e3a8a"),
    heading_color: "#2c5aa0",
    contact_background: "#f0f8ff",
    show_photo: false,
    sections: &[
        section(SectionKind::SkillTags, "Specializations", false),
        section(SectionKind::Education, "Education &amp; Training", true),
        section(SectionKind::Experience, "Professional Experience", false),
        section(SectionKind::Projects, "Research &amp; Projects", true),
    ],
    extra_css: "\
        .skill-tag { display: inline-block; background: #f0f8ff; color: #2c5aa0; border-left: 5px solid #2c5aa0; padding: 8px 16px; margin: 5px; border-radius: 6px; }\n\
        .education-item { background: white; padding: 2rem; border-radius: 10px; margin-bottom: 2rem; box-shadow: 0 2px 10px rgba(0,0,0,0.1); }\n\
        .experience-item { border-left: 3px solid #2c5aa0; padding-left: 20px; margin-bottom: 2rem; }\n\
        .project-card { background: white; border-left: 5px solid #2c5aa0; padding: 2rem; border-radius: 10px; margin-bottom: 2rem; }\n",
};

static PHOTOGRAPHER: LayoutConfig = LayoutConfig {
    name_prefix: "",
    title_suffix: "Photographer",
    font_family: r#""Helvetica Neue", Arial, sans-serif"#,
    gradient: ("#ff6b6b", "#ee5a52"),
    heading_color: "#333",
    contact_background: "#f8f9fa",
    show_photo: false,
    sections: &[
        section(SectionKind::Gallery, "Portfolio Gallery", false),
        section(SectionKind::SkillTags, "Services", true),
        section(SectionKind::Experience, "Experience", false),
        section(SectionKind::Education, "Education", true),
    ],
    extra_css: "\
        .gallery { display: grid; grid-template-columns: repeat(auto-fit, minmax(300px, 1fr)); gap: 2rem; }\n\
        .gallery-item { position: relative; overflow: hidden; border-radius: 10px; box-shadow: 0 4px 15px rgba(0,0,0,0.1); }\n\
        .gallery-item img { width: 100%; height: 300px; object-fit: cover; transition: transform 0.3s; }\n\
        .gallery-item:hover img { transform: scale(1.05); }\n\
        .gallery-item a { color: #ee5a52; }\n\
        .skill-tag { display: inline-block; background: #ff6b6b; color: white; padding: 8px 16px; margin: 5px; border-radius: 20px; }\n\
        .experience-item { border-left: 3px solid #ff6b6b; padding-left: 20px; margin-bottom: 2rem; }\n\
        .education-item { padding: 1rem 0; border-bottom: 1px solid #eee; }\n",
};
