#![allow(dead_code)]

use std::io::Cursor;
use std::sync::Arc;

use reportflow::document::{
    AbstractDoc, Chapter, ChapterItem, Education, Experience, Faculty, Personal, Report, Resume,
    Skill,
};
use reportflow::model::{ContentBlock, Guide, ImageData, Member, Region};
use reportflow::style::Role;
use reportflow::{BlockMeasurer, Document, FontSet, Layout};

/// Built-in Times metrics, so results do not depend on installed fonts.
pub fn fonts() -> Arc<FontSet> {
    let _ = env_logger::builder().is_test(true).try_init();
    Arc::new(FontSet::builtin())
}

/// Solid-colour PNG of the given pixel size.
pub fn png(width: u32, height: u32) -> ImageData {
    let img = image::RgbImage::from_pixel(width, height, image::Rgb([180, 40, 40]));
    let mut buf = Vec::new();
    image::DynamicImage::ImageRgb8(img)
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .expect("encode png fixture");
    ImageData::from_bytes(buf).expect("decode png fixture")
}

/// Roughly `chars` characters of prose; every sentence ends with a period.
pub fn prose(chars: usize) -> String {
    const SENTENCES: [&str; 4] = [
        "The sensor network reports soil moisture every ten minutes.",
        "Readings are filtered before the controller opens a valve.",
        "Field trials ran over two seasons on three test plots.",
        "Water use dropped while crop yield stayed within tolerance.",
    ];
    let mut out = String::new();
    let mut i = 0;
    while out.chars().count() < chars {
        if !out.is_empty() {
            out.push(' ');
        }
        out.push_str(SENTENCES[i % SENTENCES.len()]);
        i += 1;
    }
    out
}

pub fn member(name: &str, reg_no: &str) -> Member {
    Member {
        name: name.to_string(),
        reg_no: reg_no.to_string(),
    }
}

fn faculty(name: &str, designation: &str) -> Faculty {
    Faculty {
        name: name.to_string(),
        designation: designation.to_string(),
        department: String::new(),
    }
}

fn chapter(title: &str, sections: &[&str], body_chars: usize) -> Chapter {
    Chapter {
        title: title.to_string(),
        items: sections
            .iter()
            .map(|s| ChapterItem::Text {
                title: s.to_string(),
                content: format!("{}\n\n{}", prose(body_chars), prose(body_chars / 2)),
            })
            .collect(),
    }
}

pub fn report() -> Report {
    Report {
        project_title: "Smart Irrigation Controller".to_string(),
        academic_year: "2024-2025".to_string(),
        college_name: "Government Engineering College".to_string(),
        college_address: "Thrissur".to_string(),
        university_name: "State Technological University".to_string(),
        department_name: "Computer Science and Engineering".to_string(),
        degree_name: "Bachelor of Technology in Computer Science".to_string(),
        members: vec![
            member("Asha Menon", "GEC21CS004"),
            member("Rahul Das", "GEC21CS031"),
        ],
        guide: faculty("Dr. Priya Nair", "Associate Professor"),
        coordinator1: faculty("Prof. Anil Kumar", "Assistant Professor"),
        coordinator2: faculty("Prof. Meera Thomas", "Assistant Professor"),
        hod: faculty("Dr. Joseph Mathew", "Head of Department"),
        include_contents: true,
        acknowledgement: prose(400),
        abstract_text: prose(900),
        chapters: vec![
            chapter("Introduction", &["Background", "Objectives"], 1200),
            chapter("Design", &["Architecture", "Hardware", "Firmware"], 2500),
            chapter("Conclusion", &["Summary"], 600),
        ],
        references: "Smith, J. Soil moisture sensing. 2019.\nLee, K. Drip irrigation control. 2021."
            .to_string(),
        ..Report::default()
    }
}

pub fn abstract_doc(text: String) -> AbstractDoc {
    AbstractDoc {
        title: "Smart Irrigation Controller".to_string(),
        abstract_text: text,
        domain: "Internet of Things".to_string(),
        keywords: "irrigation, sensors, embedded control".to_string(),
        members: vec![
            member("Asha Menon", "GEC21CS004"),
            member("Rahul Das", "GEC21CS031"),
        ],
        guide: Guide {
            name: "Dr. Priya Nair".to_string(),
            designation: "Associate Professor".to_string(),
            department: "Computer Science and Engineering".to_string(),
            college: "Government Engineering College".to_string(),
        },
        show_border: true,
    }
}

pub fn resume() -> Resume {
    Resume {
        personal: Personal {
            first_name: "Jane".to_string(),
            last_name: "Doe".to_string(),
            job_title: "Embedded Engineer".to_string(),
            email: "jane@example.com".to_string(),
            phone: "+1 555 0100".to_string(),
            city: "Austin".to_string(),
            country: "USA".to_string(),
            ..Personal::default()
        },
        summary: prose(300),
        experience: vec![Experience {
            job_title: "Firmware Engineer".to_string(),
            employer: "Acme Controls".to_string(),
            city: "Austin".to_string(),
            start_date: "2021".to_string(),
            end_date: "Present".to_string(),
            desc: format!("{}\n{}", prose(150), prose(200)),
            ..Experience::default()
        }],
        education: vec![Education {
            institution: "State University".to_string(),
            degree: "B.S. Electrical Engineering".to_string(),
            start_date: "2016".to_string(),
            end_date: "2020".to_string(),
            score: "3.8 GPA".to_string(),
            ..Education::default()
        }],
        skills: vec![
            Skill {
                name: "Rust".to_string(),
                level: "Advanced".to_string(),
            },
            Skill {
                name: "C".to_string(),
                level: String::new(),
            },
        ],
        show_border: false,
        ..Resume::default()
    }
}

/// Linear height model: paragraphs cost `per_char` points per character,
/// every other block a fixed `block` height. Spacers keep their own height.
pub struct FixedMeasurer {
    pub per_char: f32,
    pub block: f32,
}

impl BlockMeasurer for FixedMeasurer {
    fn measure(&self, block: &ContentBlock, _width: f32) -> f32 {
        match block {
            ContentBlock::Paragraph { text, .. } => text.chars().count() as f32 * self.per_char,
            ContentBlock::Spacer { height, .. } => *height,
            ContentBlock::Section { .. } => 0.0,
            _ => self.block,
        }
    }
}

pub fn section(region: Region) -> ContentBlock {
    ContentBlock::Section {
        region,
        title: String::new(),
    }
}

pub fn para(text: impl Into<String>) -> ContentBlock {
    ContentBlock::paragraph(text, Role::BodyText)
}

/// Paragraph texts in order, with continuation fragments joined back onto
/// the paragraph they were cut from.
pub fn joined_paragraphs<'a>(blocks: impl Iterator<Item = &'a ContentBlock>) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for block in blocks {
        if let ContentBlock::Paragraph {
            text, continuation, ..
        } = block
        {
            match out.last_mut() {
                Some(last) if *continuation => last.push_str(text),
                _ => out.push(text.clone()),
            }
        }
    }
    out
}

pub fn heading_texts<'a>(blocks: impl Iterator<Item = &'a ContentBlock>) -> Vec<String> {
    blocks
        .filter_map(|b| match b {
            ContentBlock::Heading { text, .. } => Some(text.clone()),
            _ => None,
        })
        .collect()
}

pub fn paginate_with_metrics(document: &Document) -> Layout {
    reportflow::paginate_document(
        document,
        &reportflow::SectionFilter::All,
        reportflow::MeasurerKind::Metrics,
        &fonts(),
    )
}
