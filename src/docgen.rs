//! Builds the design-document skeleton as a minimal `.docx` package.

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use ::zip as zip_crate;
use anyhow::{Context, Result};
use clap::Parser;
use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use regex::Regex;
use tracing::{debug, info};

use crate::config::{DocsConfig, UatConfig};

const CONTENT_TYPES_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/><Override PartName="/word/styles.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.styles+xml"/></Types>"#;

const PACKAGE_RELS_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/></Relationships>"#;

const DOCUMENT_RELS_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles" Target="styles.xml"/></Relationships>"#;

const STYLES_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:styles xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:style w:type="paragraph" w:default="1" w:styleId="Normal"><w:name w:val="Normal"/><w:rPr><w:sz w:val="22"/></w:rPr></w:style><w:style w:type="paragraph" w:styleId="Title"><w:name w:val="Title"/><w:basedOn w:val="Normal"/><w:next w:val="Normal"/><w:pPr><w:spacing w:after="240"/></w:pPr><w:rPr><w:b/><w:sz w:val="56"/></w:rPr></w:style><w:style w:type="paragraph" w:styleId="Heading1"><w:name w:val="heading 1"/><w:basedOn w:val="Normal"/><w:next w:val="Normal"/><w:pPr><w:keepNext/><w:spacing w:before="480" w:after="120"/><w:outlineLvl w:val="0"/></w:pPr><w:rPr><w:b/><w:color w:val="365F91"/><w:sz w:val="32"/></w:rPr></w:style></w:styles>"#;

const W_NAMESPACE: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    /// Level 0 is the document title, level 1 a section heading.
    Heading { text: String, level: u8 },
    Paragraph(String),
}

/// Returns the bodies of fenced ```mermaid blocks, in order.
pub fn find_mermaid_blocks(text: &str) -> Vec<String> {
    let re = Regex::new(r"(?s)```mermaid(.*?)```").expect("valid regex");
    re.captures_iter(text)
        .map(|c| c[1].to_string())
        .collect()
}

/// Lays out the document: title, then per section a heading, a pointer
/// paragraph and placeholders for the section's diagrams.
pub fn build_outline(docs: &DocsConfig, root: &Path) -> Result<Vec<Block>> {
    let mut blocks = vec![Block::Heading {
        text: docs.title.clone(),
        level: 0,
    }];

    for section in &docs.sections {
        let source = &section.source;
        blocks.push(Block::Heading {
            text: section.heading.clone(),
            level: 1,
        });
        blocks.push(Block::Paragraph(format!("See {source} for full details.")));

        if !docs.diagram_sources.contains(source) {
            continue;
        }

        let source_path = root.join(source);
        if source_path.exists() {
            let content = fs::read_to_string(&source_path)
                .with_context(|| format!("cannot read {}", source_path.display()))?;
            let diagrams = find_mermaid_blocks(&content);
            debug!(source = %source, diagrams = diagrams.len(), "scanned diagram source");
            for index in 1..=diagrams.len() {
                blocks.push(Block::Paragraph(format!(
                    "Insert exported diagram from {source} (diagram {index}) PNG/SVG from Mermaid here."
                )));
            }
        } else {
            blocks.push(Block::Paragraph(format!(
                "Insert exported diagrams from {source} (PNG/SVG from Mermaid) here."
            )));
        }
    }

    Ok(blocks)
}

fn write_paragraph(
    writer: &mut Writer<Vec<u8>>,
    style: Option<&str>,
    text: &str,
) -> Result<()> {
    writer.write_event(Event::Start(BytesStart::new("w:p")))?;
    if let Some(style) = style {
        writer.write_event(Event::Start(BytesStart::new("w:pPr")))?;
        let mut p_style = BytesStart::new("w:pStyle");
        p_style.push_attribute(("w:val", style));
        writer.write_event(Event::Empty(p_style))?;
        writer.write_event(Event::End(BytesEnd::new("w:pPr")))?;
    }
    writer.write_event(Event::Start(BytesStart::new("w:r")))?;
    let mut t = BytesStart::new("w:t");
    t.push_attribute(("xml:space", "preserve"));
    writer.write_event(Event::Start(t))?;
    writer.write_event(Event::Text(BytesText::new(text)))?;
    writer.write_event(Event::End(BytesEnd::new("w:t")))?;
    writer.write_event(Event::End(BytesEnd::new("w:r")))?;
    writer.write_event(Event::End(BytesEnd::new("w:p")))?;
    Ok(())
}

pub fn document_xml(blocks: &[Block]) -> Result<Vec<u8>> {
    let mut writer = Writer::new(Vec::new());
    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), Some("yes"))))?;

    let mut document = BytesStart::new("w:document");
    document.push_attribute(("xmlns:w", W_NAMESPACE));
    writer.write_event(Event::Start(document))?;
    writer.write_event(Event::Start(BytesStart::new("w:body")))?;

    for block in blocks {
        match block {
            Block::Heading { text, level: 0 } => write_paragraph(&mut writer, Some("Title"), text)?,
            Block::Heading { text, level } => {
                write_paragraph(&mut writer, Some(&format!("Heading{level}")), text)?
            }
            Block::Paragraph(text) => write_paragraph(&mut writer, None, text)?,
        }
    }

    writer.write_event(Event::Empty(BytesStart::new("w:sectPr")))?;
    writer.write_event(Event::End(BytesEnd::new("w:body")))?;
    writer.write_event(Event::End(BytesEnd::new("w:document")))?;
    Ok(writer.into_inner())
}

pub fn write_docx(blocks: &[Block], dst: &Path) -> Result<()> {
    let document = document_xml(blocks)?;

    let file =
        File::create(dst).with_context(|| format!("cannot create {}", dst.display()))?;
    let mut zout = zip_crate::ZipWriter::new(file);
    let opt: zip_crate::write::FileOptions<'_, ()> = zip_crate::write::FileOptions::default()
        .compression_method(zip_crate::CompressionMethod::Deflated);

    let parts: [(&str, &[u8]); 5] = [
        ("[Content_Types].xml", CONTENT_TYPES_XML.as_bytes()),
        ("_rels/.rels", PACKAGE_RELS_XML.as_bytes()),
        ("word/_rels/document.xml.rels", DOCUMENT_RELS_XML.as_bytes()),
        ("word/document.xml", &document),
        ("word/styles.xml", STYLES_XML.as_bytes()),
    ];
    for (name, content) in parts {
        zout.start_file(name, opt)?;
        zout.write_all(content)?;
    }
    zout.finish()
        .with_context(|| format!("cannot finish {}", dst.display()))?;
    Ok(())
}

#[derive(Debug, Parser)]
#[command(name = "uat-docgen")]
#[command(about = "Assemble the design document skeleton from the markdown sources")]
struct DocgenCli {
    /// Configuration file (defaults to ./uat.toml, then built-in defaults)
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Directory the section sources are relative to
    #[arg(long, default_value = ".")]
    root: PathBuf,
    /// Output path, overriding docs.output
    #[arg(short, long)]
    output: Option<PathBuf>,
}

pub fn run(args: impl IntoIterator<Item = std::ffi::OsString>) -> Result<()> {
    let cli = DocgenCli::parse_from(args);
    let config = UatConfig::load(cli.config.as_deref())?;
    let output = cli
        .output
        .unwrap_or_else(|| cli.root.join(&config.docs.output));

    let blocks = build_outline(&config.docs, &cli.root)?;
    write_docx(&blocks, &output)?;
    info!(blocks = blocks.len(), "document assembled");
    println!("Generated {}", output.display());
    Ok(())
}
