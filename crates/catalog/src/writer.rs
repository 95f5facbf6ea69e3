use std::fs;
use std::path::Path;

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;

use crate::error::CatalogError;
use crate::model::{Catalog, Context, Message, Translation};

type XmlWriter = Writer<Vec<u8>>;

const INDENT: &str = "    ";

impl Catalog {
    /// Serializes the catalog as a `.ts` document.
    pub fn to_ts_string(&self) -> Result<String, quick_xml::Error> {
        let mut writer = Writer::new(Vec::new());
        writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)))?;
        newline(&mut writer, 0)?;
        writer.write_event(Event::DocType(BytesText::from_escaped("TS")))?;
        newline(&mut writer, 0)?;

        let mut root = BytesStart::new("TS");
        root.push_attribute(("version", self.version()));
        if !self.language().is_empty() {
            root.push_attribute(("language", self.language()));
        }
        if let Some(source_language) = self.source_language() {
            root.push_attribute(("sourcelanguage", source_language));
        }
        writer.write_event(Event::Start(root))?;
        for context in self.contexts() {
            write_context(&mut writer, context)?;
        }
        newline(&mut writer, 0)?;
        writer.write_event(Event::End(BytesEnd::new("TS")))?;
        newline(&mut writer, 0)?;

        Ok(String::from_utf8_lossy(&writer.into_inner()).into_owned())
    }

    /// Writes the catalog to `path` through a temporary file.
    pub fn write_to_path(&self, path: impl AsRef<Path>) -> Result<(), CatalogError> {
        let path = path.as_ref();
        let xml = self.to_ts_string().map_err(|source| CatalogError::Encode {
            path: path.to_path_buf(),
            source,
        })?;
        if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|source| CatalogError::Write {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        let tmp_path = path.with_extension("ts.tmp");
        fs::write(&tmp_path, xml.as_bytes()).map_err(|source| CatalogError::Write {
            path: tmp_path.clone(),
            source,
        })?;
        fs::rename(&tmp_path, path).map_err(|source| CatalogError::Write {
            path: path.to_path_buf(),
            source,
        })
    }
}

fn write_context(writer: &mut XmlWriter, context: &Context) -> Result<(), quick_xml::Error> {
    newline(writer, 0)?;
    writer.write_event(Event::Start(BytesStart::new("context")))?;
    newline(writer, 1)?;
    write_text_element(writer, BytesStart::new("name"), context.name())?;
    if let Some(comment) = context.comment() {
        newline(writer, 1)?;
        write_text_element(writer, BytesStart::new("comment"), comment)?;
    }
    for message in context.messages() {
        newline(writer, 1)?;
        write_message(writer, message)?;
    }
    newline(writer, 0)?;
    writer.write_event(Event::End(BytesEnd::new("context")))
}

fn write_message(writer: &mut XmlWriter, message: &Message) -> Result<(), quick_xml::Error> {
    let mut start = BytesStart::new("message");
    if let Some(id) = &message.id {
        start.push_attribute(("id", id.as_str()));
    }
    if message.is_plural {
        start.push_attribute(("numerus", "yes"));
    }
    if let Some(encoding) = &message.encoding {
        start.push_attribute(("encoding", encoding.as_str()));
    }
    writer.write_event(Event::Start(start))?;

    for location in &message.locations {
        newline(writer, 2)?;
        let mut element = BytesStart::new("location");
        element.push_attribute(("filename", location.filename.as_str()));
        if let Some(line) = location.line {
            element.push_attribute(("line", line.to_string().as_str()));
        }
        writer.write_event(Event::Empty(element))?;
    }
    newline(writer, 2)?;
    write_text_element(writer, BytesStart::new("source"), &message.source)?;
    let optional = [
        ("oldsource", &message.old_source),
        ("comment", &message.comment),
        ("oldcomment", &message.old_comment),
        ("extracomment", &message.extra_comment),
        ("translatorcomment", &message.translator_comment),
    ];
    for (name, value) in optional {
        if let Some(value) = value {
            newline(writer, 2)?;
            write_text_element(writer, BytesStart::new(name), value)?;
        }
    }

    let mut translation = BytesStart::new("translation");
    if let Some(kind) = message.status.type_attr() {
        translation.push_attribute(("type", kind));
    }
    newline(writer, 2)?;
    match &message.translation {
        Translation::Single(text) => write_text_element(writer, translation, text)?,
        Translation::Plural(forms) if forms.is_empty() => {
            writer.write_event(Event::Empty(translation))?;
        }
        Translation::Plural(forms) => {
            writer.write_event(Event::Start(translation))?;
            for form in forms {
                write_text_element(writer, BytesStart::new("numerusform"), form)?;
            }
            writer.write_event(Event::End(BytesEnd::new("translation")))?;
        }
    }

    newline(writer, 1)?;
    writer.write_event(Event::End(BytesEnd::new("message")))
}

/// Whitespace between elements only; text content is never padded.
fn newline(writer: &mut XmlWriter, depth: usize) -> Result<(), quick_xml::Error> {
    let padding = format!("\n{}", INDENT.repeat(depth));
    writer.write_event(Event::Text(BytesText::from_escaped(padding)))
}

fn write_text_element(
    writer: &mut XmlWriter,
    start: BytesStart<'_>,
    text: &str,
) -> Result<(), quick_xml::Error> {
    if text.is_empty() {
        return writer.write_event(Event::Empty(start));
    }
    let end = start.to_end().into_owned();
    writer.write_event(Event::Start(start))?;
    write_text(writer, text)?;
    writer.write_event(Event::End(end))
}

/// Control characters XML 1.0 cannot carry become `<byte value="xNN"/>`.
fn write_text(writer: &mut XmlWriter, text: &str) -> Result<(), quick_xml::Error> {
    let mut run_start = 0;
    for (offset, ch) in text.char_indices() {
        if !is_restricted(ch) {
            continue;
        }
        if run_start < offset {
            writer.write_event(Event::Text(BytesText::new(&text[run_start..offset])))?;
        }
        let mut byte = BytesStart::new("byte");
        byte.push_attribute(("value", format!("x{:x}", ch as u32).as_str()));
        writer.write_event(Event::Empty(byte))?;
        run_start = offset + ch.len_utf8();
    }
    if run_start < text.len() {
        writer.write_event(Event::Text(BytesText::new(&text[run_start..])))?;
    }
    Ok(())
}

fn is_restricted(ch: char) -> bool {
    (ch as u32) < 0x20 && !matches!(ch, '\t' | '\n' | '\r')
}
