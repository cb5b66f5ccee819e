//! Document snapshots for the three generators, the typed commands that edit
//! them, and the versioned store that owns the current snapshot.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use serde_json::Value;

use crate::error::{Error, Result};
use crate::flow::CharBudget;
use crate::geometry::GeometryProfile;
use crate::model::{Guide, ImageData, Member};
use crate::style::StyleSheet;

#[derive(Deserialize)]
#[serde(untagged)]
enum ImageSource {
    Path(PathBuf),
    File { path: PathBuf },
}

impl TryFrom<ImageSource> for ImageData {
    type Error = Error;

    fn try_from(source: ImageSource) -> Result<Self> {
        let path = match source {
            ImageSource::Path(path) | ImageSource::File { path } => path,
        };
        ImageData::open(&path)
    }
}

/// Snapshot fields that hold an image path.
const IMAGE_FIELDS: [&str; 4] = ["image", "university_logo", "certificate_logo", "profile_pic"];

/// Rewrite relative image paths in a raw snapshot to sit under `base`.
fn rebase_image_paths(value: &mut Value, base: &Path) {
    match value {
        Value::Object(map) => {
            for (key, v) in map.iter_mut() {
                if !IMAGE_FIELDS.contains(&key.as_str()) {
                    rebase_image_paths(v, base);
                    continue;
                }
                let target = match v {
                    Value::Object(source) => source.get_mut("path"),
                    other => Some(other),
                };
                if let Some(Value::String(path)) = target {
                    let rebased = Path::new(path.as_str())
                        .is_relative()
                        .then(|| base.join(path.as_str()).to_string_lossy().into_owned());
                    if let Some(rebased) = rebased {
                        *path = rebased;
                    }
                }
            }
        }
        Value::Array(items) => {
            for item in items {
                rebase_image_paths(item, base);
            }
        }
        _ => {}
    }
}

impl<'de> Deserialize<'de> for ImageData {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let source = ImageSource::deserialize(deserializer)?;
        ImageData::try_from(source).map_err(serde::de::Error::custom)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Faculty {
    pub name: String,
    pub designation: String,
    pub department: String,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ChapterItem {
    Text {
        #[serde(default)]
        title: String,
        #[serde(default)]
        content: String,
    },
    Diagram {
        image: ImageData,
        #[serde(default)]
        caption: String,
        #[serde(default = "default_figure_width")]
        width_percent: u8,
    },
}

fn default_figure_width() -> u8 {
    75
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Chapter {
    pub title: String,
    pub items: Vec<ChapterItem>,
}

impl Chapter {
    pub fn new(title: impl Into<String>) -> Self {
        Chapter {
            title: title.into(),
            items: Vec::new(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct Report {
    pub project_title: String,
    pub academic_year: String,
    pub course: String,
    pub college_name: String,
    pub college_address: String,
    pub university_name: String,
    pub department_name: String,
    pub report_type: String,
    pub degree_name: String,
    pub members: Vec<Member>,
    pub guide: Faculty,
    pub coordinator1: Faculty,
    pub coordinator2: Faculty,
    pub hod: Faculty,
    pub university_logo: Option<ImageData>,
    pub certificate_logo: Option<ImageData>,
    pub show_border: bool,
    pub include_contents: bool,
    pub certificate_text: String,
    pub declaration_text: String,
    pub acknowledgement: String,
    pub abstract_text: String,
    pub chapters: Vec<Chapter>,
    pub references: String,
}

impl Default for Report {
    fn default() -> Self {
        Report {
            project_title: String::new(),
            academic_year: String::new(),
            course: "B.Tech CSE".to_string(),
            college_name: String::new(),
            college_address: String::new(),
            university_name: String::new(),
            department_name: String::new(),
            report_type: "MINI PROJECT REPORT".to_string(),
            degree_name: String::new(),
            members: vec![Member::default()],
            guide: Faculty::default(),
            coordinator1: Faculty::default(),
            coordinator2: Faculty::default(),
            hod: Faculty::default(),
            university_logo: None,
            certificate_logo: None,
            show_border: true,
            include_contents: false,
            certificate_text: String::new(),
            declaration_text: String::new(),
            acknowledgement: String::new(),
            abstract_text: String::new(),
            chapters: [
                "Introduction",
                "Literature Survey",
                "Methodology",
                "Results",
                "Analysis",
                "Conclusion",
            ]
            .into_iter()
            .map(Chapter::new)
            .collect(),
            references: String::new(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct AbstractDoc {
    pub title: String,
    pub abstract_text: String,
    pub domain: String,
    pub keywords: String,
    pub members: Vec<Member>,
    pub guide: Guide,
    pub show_border: bool,
}

impl Default for AbstractDoc {
    fn default() -> Self {
        AbstractDoc {
            title: String::new(),
            abstract_text: String::new(),
            domain: String::new(),
            keywords: String::new(),
            members: vec![Member::default()],
            guide: Guide::default(),
            show_border: true,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Personal {
    pub first_name: String,
    pub last_name: String,
    pub job_title: String,
    pub email: String,
    pub phone: String,
    pub linkedin: String,
    pub country: String,
    pub city: String,
    pub address: String,
    pub postal_code: String,
    /// Photo shown at the top right of the header.
    pub profile_pic: Option<ImageData>,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Social {
    pub network: String,
    pub url: String,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Experience {
    pub job_title: String,
    pub employer: String,
    pub city: String,
    pub country: String,
    pub start_date: String,
    pub end_date: String,
    pub desc: String,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Education {
    pub institution: String,
    pub degree: String,
    pub city: String,
    pub country: String,
    pub start_date: String,
    pub end_date: String,
    pub score: String,
    pub desc: String,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Skill {
    pub name: String,
    pub level: String,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Language {
    pub language: String,
    pub proficiency: String,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Project {
    pub title: String,
    pub link: String,
    pub desc: String,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Certification {
    pub name: String,
    pub issuer: String,
    pub date: String,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Award {
    pub name: String,
    pub date: String,
    pub desc: String,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Referee {
    pub name: String,
    pub contact: String,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct CustomSection {
    pub title: String,
    pub content: String,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Resume {
    pub personal: Personal,
    pub socials: Vec<Social>,
    pub summary: String,
    pub experience: Vec<Experience>,
    pub education: Vec<Education>,
    pub skills: Vec<Skill>,
    pub languages: Vec<Language>,
    pub projects: Vec<Project>,
    pub certifications: Vec<Certification>,
    pub awards: Vec<Award>,
    pub interests: String,
    pub references: Vec<Referee>,
    pub custom: Vec<CustomSection>,
    pub show_border: bool,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Document {
    Report(Report),
    Abstract(AbstractDoc),
    Resume(Resume),
}

impl Document {
    /// Parse a snapshot. Relative image paths resolve against the working
    /// directory.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Parse a snapshot with relative image paths resolved against `base`.
    pub fn from_json_in(json: &str, base: &Path) -> Result<Self> {
        let mut value: Value = serde_json::from_str(json)?;
        rebase_image_paths(&mut value, base);
        Ok(serde_json::from_value(value)?)
    }

    /// Read a snapshot file; its image paths are relative to the file.
    pub fn open(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        let base = path.parent().unwrap_or(Path::new(""));
        Self::from_json_in(&json, base)
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            Document::Report(_) => "report",
            Document::Abstract(_) => "abstract",
            Document::Resume(_) => "resume",
        }
    }

    pub fn style_sheet(&self) -> StyleSheet {
        match self {
            Document::Report(_) => StyleSheet::report(),
            Document::Abstract(_) => StyleSheet::abstract_page(),
            Document::Resume(_) => StyleSheet::resume(),
        }
    }

    pub fn geometry(&self) -> GeometryProfile {
        match self {
            Document::Report(r) => GeometryProfile::report(r.show_border),
            Document::Abstract(a) => GeometryProfile::abstract_page(a.show_border),
            Document::Resume(r) => GeometryProfile::resume(r.show_border),
        }
    }

    /// Character budget for the heuristic measurer. Only the abstract page
    /// reserves first-page room for its signature block.
    pub fn char_budget(&self) -> CharBudget {
        match self {
            Document::Abstract(a) => {
                let members = a.members.iter().filter(|m| !m.name.trim().is_empty()).count();
                CharBudget::abstract_page(members, !a.guide.name.trim().is_empty())
            }
            _ => CharBudget::default(),
        }
    }

    /// Base file name for exports, e.g. `Jane_Doe_Resume`.
    pub fn file_stem(&self) -> String {
        let raw = match self {
            Document::Report(r) if !r.project_title.trim().is_empty() => r.project_title.clone(),
            Document::Report(_) => "Project_Report".to_string(),
            Document::Abstract(a) if !a.title.trim().is_empty() => format!("{}_Abstract", a.title),
            Document::Abstract(_) => "Abstract".to_string(),
            Document::Resume(r) => {
                let name = format!("{} {}", r.personal.first_name, r.personal.last_name);
                if name.trim().is_empty() {
                    "Resume".to_string()
                } else {
                    format!("{}_Resume", name.trim())
                }
            }
        };
        raw.split_whitespace()
            .collect::<Vec<_>>()
            .join("_")
            .chars()
            .filter(|c| c.is_alphanumeric() || matches!(c, '_' | '-' | '.'))
            .collect()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReportField {
    ProjectTitle,
    AcademicYear,
    Course,
    CollegeName,
    CollegeAddress,
    UniversityName,
    DepartmentName,
    ReportType,
    DegreeName,
    CertificateText,
    DeclarationText,
    Acknowledgement,
    Abstract,
    References,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FacultySlot {
    Guide,
    Coordinator1,
    Coordinator2,
    Hod,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogoSlot {
    University,
    Certificate,
}

#[derive(Clone, Debug, PartialEq)]
pub enum ReportCommand {
    Set(ReportField, String),
    SetShowBorder(bool),
    SetIncludeContents(bool),
    AddMember(Member),
    UpdateMember { index: usize, member: Member },
    RemoveMember(usize),
    SetFaculty { slot: FacultySlot, faculty: Faculty },
    SetLogo { slot: LogoSlot, image: Option<ImageData> },
    AddChapter(String),
    RenameChapter { chapter: usize, title: String },
    RemoveChapter(usize),
    AddItem { chapter: usize, item: ChapterItem },
    UpdateItem { chapter: usize, index: usize, item: ChapterItem },
    RemoveItem { chapter: usize, index: usize },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AbstractField {
    Title,
    Abstract,
    Domain,
    Keywords,
    GuideName,
    GuideDesignation,
    GuideDepartment,
    GuideCollege,
}

#[derive(Clone, Debug, PartialEq)]
pub enum AbstractCommand {
    Set(AbstractField, String),
    SetShowBorder(bool),
    AddMember(Member),
    UpdateMember { index: usize, member: Member },
    RemoveMember(usize),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ResumeField {
    FirstName,
    LastName,
    JobTitle,
    Email,
    Phone,
    Linkedin,
    Country,
    City,
    Address,
    PostalCode,
    Summary,
    Interests,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ResumeList {
    Socials,
    Experience,
    Education,
    Skills,
    Languages,
    Projects,
    Certifications,
    Awards,
    References,
    Custom,
}

#[derive(Clone, Debug, PartialEq)]
pub enum ResumeEntry {
    Social(Social),
    Experience(Experience),
    Education(Education),
    Skill(Skill),
    Language(Language),
    Project(Project),
    Certification(Certification),
    Award(Award),
    Reference(Referee),
    Custom(CustomSection),
}

#[derive(Clone, Debug, PartialEq)]
pub enum ResumeCommand {
    Set(ResumeField, String),
    SetShowBorder(bool),
    SetProfilePic(Option<ImageData>),
    Add(ResumeEntry),
    Update { index: usize, entry: ResumeEntry },
    Remove { list: ResumeList, index: usize },
}

/// A typed edit. Commands for a different document kind are rejected.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    Replace(Document),
    Report(ReportCommand),
    Abstract(AbstractCommand),
    Resume(ResumeCommand),
}

fn slot<'a, T>(list: &'a mut [T], index: usize, what: &str) -> Result<&'a mut T> {
    let len = list.len();
    list.get_mut(index)
        .ok_or_else(|| Error::InvalidCommand(format!("{what} index {index} out of range (len {len})")))
}

fn remove<T>(list: &mut Vec<T>, index: usize, what: &str) -> Result<T> {
    if index < list.len() {
        Ok(list.remove(index))
    } else {
        Err(Error::InvalidCommand(format!(
            "{what} index {index} out of range (len {})",
            list.len()
        )))
    }
}

fn apply_report(r: &mut Report, cmd: ReportCommand) -> Result<()> {
    match cmd {
        ReportCommand::Set(field, value) => {
            let target = match field {
                ReportField::ProjectTitle => &mut r.project_title,
                ReportField::AcademicYear => &mut r.academic_year,
                ReportField::Course => &mut r.course,
                ReportField::CollegeName => &mut r.college_name,
                ReportField::CollegeAddress => &mut r.college_address,
                ReportField::UniversityName => &mut r.university_name,
                ReportField::DepartmentName => &mut r.department_name,
                ReportField::ReportType => &mut r.report_type,
                ReportField::DegreeName => &mut r.degree_name,
                ReportField::CertificateText => &mut r.certificate_text,
                ReportField::DeclarationText => &mut r.declaration_text,
                ReportField::Acknowledgement => &mut r.acknowledgement,
                ReportField::Abstract => &mut r.abstract_text,
                ReportField::References => &mut r.references,
            };
            *target = value;
        }
        ReportCommand::SetShowBorder(on) => r.show_border = on,
        ReportCommand::SetIncludeContents(on) => r.include_contents = on,
        ReportCommand::AddMember(member) => r.members.push(member),
        ReportCommand::UpdateMember { index, member } => {
            *slot(&mut r.members, index, "member")? = member;
        }
        ReportCommand::RemoveMember(index) => {
            remove(&mut r.members, index, "member")?;
        }
        ReportCommand::SetFaculty { slot: which, faculty } => {
            let target = match which {
                FacultySlot::Guide => &mut r.guide,
                FacultySlot::Coordinator1 => &mut r.coordinator1,
                FacultySlot::Coordinator2 => &mut r.coordinator2,
                FacultySlot::Hod => &mut r.hod,
            };
            *target = faculty;
        }
        ReportCommand::SetLogo { slot: which, image } => match which {
            LogoSlot::University => r.university_logo = image,
            LogoSlot::Certificate => r.certificate_logo = image,
        },
        ReportCommand::AddChapter(title) => r.chapters.push(Chapter::new(title)),
        ReportCommand::RenameChapter { chapter, title } => {
            slot(&mut r.chapters, chapter, "chapter")?.title = title;
        }
        ReportCommand::RemoveChapter(chapter) => {
            remove(&mut r.chapters, chapter, "chapter")?;
        }
        ReportCommand::AddItem { chapter, item } => {
            slot(&mut r.chapters, chapter, "chapter")?.items.push(item);
        }
        ReportCommand::UpdateItem {
            chapter,
            index,
            item,
        } => {
            let ch = slot(&mut r.chapters, chapter, "chapter")?;
            *slot(&mut ch.items, index, "chapter item")? = item;
        }
        ReportCommand::RemoveItem { chapter, index } => {
            let ch = slot(&mut r.chapters, chapter, "chapter")?;
            remove(&mut ch.items, index, "chapter item")?;
        }
    }
    Ok(())
}

fn apply_abstract(a: &mut AbstractDoc, cmd: AbstractCommand) -> Result<()> {
    match cmd {
        AbstractCommand::Set(field, value) => {
            let target = match field {
                AbstractField::Title => &mut a.title,
                AbstractField::Abstract => &mut a.abstract_text,
                AbstractField::Domain => &mut a.domain,
                AbstractField::Keywords => &mut a.keywords,
                AbstractField::GuideName => &mut a.guide.name,
                AbstractField::GuideDesignation => &mut a.guide.designation,
                AbstractField::GuideDepartment => &mut a.guide.department,
                AbstractField::GuideCollege => &mut a.guide.college,
            };
            *target = value;
        }
        AbstractCommand::SetShowBorder(on) => a.show_border = on,
        AbstractCommand::AddMember(member) => a.members.push(member),
        AbstractCommand::UpdateMember { index, member } => {
            *slot(&mut a.members, index, "member")? = member;
        }
        AbstractCommand::RemoveMember(index) => {
            remove(&mut a.members, index, "member")?;
        }
    }
    Ok(())
}

fn update_entry(r: &mut Resume, index: usize, entry: ResumeEntry) -> Result<()> {
    match entry {
        ResumeEntry::Social(e) => *slot(&mut r.socials, index, "social")? = e,
        ResumeEntry::Experience(e) => *slot(&mut r.experience, index, "experience")? = e,
        ResumeEntry::Education(e) => *slot(&mut r.education, index, "education")? = e,
        ResumeEntry::Skill(e) => *slot(&mut r.skills, index, "skill")? = e,
        ResumeEntry::Language(e) => *slot(&mut r.languages, index, "language")? = e,
        ResumeEntry::Project(e) => *slot(&mut r.projects, index, "project")? = e,
        ResumeEntry::Certification(e) => {
            *slot(&mut r.certifications, index, "certification")? = e
        }
        ResumeEntry::Award(e) => *slot(&mut r.awards, index, "award")? = e,
        ResumeEntry::Reference(e) => *slot(&mut r.references, index, "reference")? = e,
        ResumeEntry::Custom(e) => *slot(&mut r.custom, index, "custom section")? = e,
    }
    Ok(())
}

fn apply_resume(r: &mut Resume, cmd: ResumeCommand) -> Result<()> {
    match cmd {
        ResumeCommand::Set(field, value) => {
            let p = &mut r.personal;
            let target = match field {
                ResumeField::FirstName => &mut p.first_name,
                ResumeField::LastName => &mut p.last_name,
                ResumeField::JobTitle => &mut p.job_title,
                ResumeField::Email => &mut p.email,
                ResumeField::Phone => &mut p.phone,
                ResumeField::Linkedin => &mut p.linkedin,
                ResumeField::Country => &mut p.country,
                ResumeField::City => &mut p.city,
                ResumeField::Address => &mut p.address,
                ResumeField::PostalCode => &mut p.postal_code,
                ResumeField::Summary => &mut r.summary,
                ResumeField::Interests => &mut r.interests,
            };
            *target = value;
        }
        ResumeCommand::SetShowBorder(on) => r.show_border = on,
        ResumeCommand::SetProfilePic(image) => r.personal.profile_pic = image,
        ResumeCommand::Add(entry) => match entry {
            ResumeEntry::Social(e) => r.socials.push(e),
            ResumeEntry::Experience(e) => r.experience.push(e),
            ResumeEntry::Education(e) => r.education.push(e),
            ResumeEntry::Skill(e) => r.skills.push(e),
            ResumeEntry::Language(e) => r.languages.push(e),
            ResumeEntry::Project(e) => r.projects.push(e),
            ResumeEntry::Certification(e) => r.certifications.push(e),
            ResumeEntry::Award(e) => r.awards.push(e),
            ResumeEntry::Reference(e) => r.references.push(e),
            ResumeEntry::Custom(e) => r.custom.push(e),
        },
        ResumeCommand::Update { index, entry } => update_entry(r, index, entry)?,
        ResumeCommand::Remove { list, index } => {
            let what = format!("{list:?}").to_lowercase();
            match list {
                ResumeList::Socials => drop(remove(&mut r.socials, index, &what)?),
                ResumeList::Experience => drop(remove(&mut r.experience, index, &what)?),
                ResumeList::Education => drop(remove(&mut r.education, index, &what)?),
                ResumeList::Skills => drop(remove(&mut r.skills, index, &what)?),
                ResumeList::Languages => drop(remove(&mut r.languages, index, &what)?),
                ResumeList::Projects => drop(remove(&mut r.projects, index, &what)?),
                ResumeList::Certifications => drop(remove(&mut r.certifications, index, &what)?),
                ResumeList::Awards => drop(remove(&mut r.awards, index, &what)?),
                ResumeList::References => drop(remove(&mut r.references, index, &what)?),
                ResumeList::Custom => drop(remove(&mut r.custom, index, &what)?),
            }
        }
    }
    Ok(())
}

/// Owns the current snapshot. Every successful command bumps the version;
/// a rejected command leaves both untouched.
#[derive(Clone, Debug)]
pub struct DocumentStore {
    document: Document,
    version: u64,
}

impl DocumentStore {
    pub fn new(document: Document) -> Self {
        DocumentStore {
            document,
            version: 0,
        }
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn apply(&mut self, cmd: Command) -> Result<u64> {
        let mut next = self.document.clone();
        let outcome = match cmd {
            Command::Replace(doc) => {
                next = doc;
                Ok(())
            }
            cmd => match (&mut next, cmd) {
                (Document::Report(r), Command::Report(c)) => apply_report(r, c),
                (Document::Abstract(a), Command::Abstract(c)) => apply_abstract(a, c),
                (Document::Resume(r), Command::Resume(c)) => apply_resume(r, c),
                (doc, _) => Err(Error::InvalidCommand(format!(
                    "command does not apply to a {} document",
                    doc.kind_name()
                ))),
            },
        };
        if let Err(e) = outcome {
            log::warn!("Rejected command: {e}");
            return Err(e);
        }
        self.document = next;
        self.version += 1;
        Ok(self.version)
    }
}
