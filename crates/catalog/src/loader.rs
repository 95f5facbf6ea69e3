use std::borrow::Cow;
use std::collections::HashMap;
use std::fmt::Display;
use std::fs;
use std::path::{Path, PathBuf};

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::error::{CatalogError, CatalogParseError, CatalogWarning};
use crate::model::{Catalog, Location, Message, Translation, TranslationStatus};

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";
const IN_MEMORY: &str = "<memory>";

impl Catalog {
    /// Reads and parses a `.ts` file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let path = path.as_ref();
        let bytes = fs::read(path).map_err(|source| CatalogError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::from_ts_bytes(&bytes, path)?)
    }

    pub fn from_ts_str(xml: &str) -> Result<Self, CatalogParseError> {
        Self::from_ts_bytes(xml.as_bytes(), IN_MEMORY)
    }

    /// Parses a `.ts` document; `path` only labels errors and log events.
    pub fn from_ts_bytes(
        bytes: &[u8],
        path: impl Into<PathBuf>,
    ) -> Result<Self, CatalogParseError> {
        let input = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
        TsParser::new(input, path.into()).parse()
    }
}

struct TsParser<'i> {
    reader: Reader<&'i [u8]>,
    input: &'i [u8],
    path: PathBuf,
    catalog: Catalog,
    /// Last resolved line per file, the base for relative `line="+N"`.
    location_lines: HashMap<String, u32>,
    /// File of the previous `<location>`, used when `filename` is omitted.
    location_file: Option<String>,
}

impl<'i> TsParser<'i> {
    fn new(input: &'i [u8], path: PathBuf) -> Self {
        let mut reader = Reader::from_reader(input);
        reader.expand_empty_elements(true);
        reader.trim_text(false);
        Self {
            reader,
            input,
            path,
            catalog: Catalog::new(""),
            location_lines: HashMap::new(),
            location_file: None,
        }
    }

    fn parse(mut self) -> Result<Catalog, CatalogParseError> {
        let mut seen_root = false;
        loop {
            match self.next_event()? {
                Event::Start(start) if !seen_root && start.name().as_ref() == b"TS" => {
                    self.read_root(&start)?;
                    seen_root = true;
                }
                Event::Start(start) => {
                    let name = element_name(&start);
                    return Err(self.error(format!("unexpected top-level element <{name}>")));
                }
                Event::Eof if seen_root => return Ok(self.catalog),
                Event::Eof => return Err(self.error("missing <TS> root element")),
                _ => {}
            }
        }
    }

    fn read_root(&mut self, start: &BytesStart<'i>) -> Result<(), CatalogParseError> {
        let mut language = String::new();
        let mut source_language = None;
        let mut version = None;
        for (key, value) in self.attributes(start)? {
            match key.as_str() {
                "language" => language = value,
                "sourcelanguage" => source_language = Some(value),
                "version" => version = Some(value),
                _ => {}
            }
        }
        self.catalog = Catalog::new(language);
        self.catalog.set_source_language(source_language);
        if let Some(version) = version {
            self.catalog.set_version(version);
        }

        loop {
            match self.next_event()? {
                Event::Start(child) if child.name().as_ref() == b"context" => {
                    self.read_context()?;
                }
                Event::Start(child) => self.skip_element(&child)?,
                Event::End(_) => return Ok(()),
                Event::Eof => return Err(self.unexpected_eof("TS")),
                _ => {}
            }
        }
    }

    fn read_context(&mut self) -> Result<(), CatalogParseError> {
        let opened_at = self.reader.buffer_position();
        let mut name = None;
        let mut comment = None;
        let mut messages = Vec::new();

        loop {
            match self.next_event()? {
                Event::Start(child) => match child.name().as_ref() {
                    b"name" => name = Some(self.read_text("name")?),
                    b"comment" => comment = Some(self.read_text("comment")?),
                    b"message" => messages.push(self.read_message(&child)?),
                    _ => self.skip_element(&child)?,
                },
                Event::End(_) => break,
                Event::Eof => return Err(self.unexpected_eof("context")),
                _ => {}
            }
        }

        let Some(name) = name else {
            return Err(self.error_at(opened_at, "<context> without <name>"));
        };

        let expected = self.catalog.plural_rule().form_count();
        for message in &messages {
            if let Translation::Plural(forms) = &message.translation {
                if forms.len() != expected && !message.status.is_obsolete() {
                    self.warn(CatalogWarning::PluralFormMismatch {
                        context: name.clone(),
                        source: message.source.clone(),
                        expected,
                        found: forms.len(),
                    });
                }
            }
        }

        let context = self.catalog.context_entry(&name);
        context.set_comment(comment);
        for message in messages {
            context.push(message);
        }
        Ok(())
    }

    fn read_message(&mut self, start: &BytesStart<'i>) -> Result<Message, CatalogParseError> {
        let opened_at = self.reader.buffer_position();
        let mut numerus = false;
        let mut encoding = None;
        let mut id = None;
        for (key, value) in self.attributes(start)? {
            match key.as_str() {
                "numerus" => numerus = value == "yes",
                "encoding" => encoding = Some(value),
                "id" => id = Some(value),
                _ => {}
            }
        }

        let mut source = None;
        let mut translation = None;
        let mut old_source = None;
        let mut comment = None;
        let mut old_comment = None;
        let mut extra_comment = None;
        let mut translator_comment = None;
        let mut locations = Vec::new();

        loop {
            match self.next_event()? {
                Event::Start(child) => match child.name().as_ref() {
                    b"location" => locations.push(self.read_location(&child)?),
                    b"source" => source = Some(self.read_text("source")?),
                    b"oldsource" => old_source = Some(self.read_text("oldsource")?),
                    b"comment" => comment = Some(self.read_text("comment")?),
                    b"oldcomment" => old_comment = Some(self.read_text("oldcomment")?),
                    b"extracomment" => extra_comment = Some(self.read_text("extracomment")?),
                    b"translatorcomment" => {
                        translator_comment = Some(self.read_text("translatorcomment")?)
                    }
                    b"translation" => translation = Some(self.read_translation(&child, numerus)?),
                    _ => self.skip_element(&child)?,
                },
                Event::End(_) => break,
                Event::Eof => return Err(self.unexpected_eof("message")),
                _ => {}
            }
        }

        let Some(source) = source else {
            return Err(self.error_at(opened_at, "<message> without <source>"));
        };
        let Some((translation, status)) = translation else {
            return Err(self.error_at(
                opened_at,
                format!("<message> '{source}' without <translation>"),
            ));
        };

        Ok(Message {
            id,
            source,
            old_source,
            comment,
            old_comment,
            extra_comment,
            translator_comment,
            locations,
            is_plural: numerus,
            translation,
            status,
            encoding,
        })
    }

    fn read_translation(
        &mut self,
        start: &BytesStart<'i>,
        numerus: bool,
    ) -> Result<(Translation, TranslationStatus), CatalogParseError> {
        let mut status = TranslationStatus::Translated;
        for (key, value) in self.attributes(start)? {
            if key == "type" {
                match TranslationStatus::from_type_attr(&value) {
                    Some(parsed) => status = parsed,
                    None => {
                        let line = self.line();
                        self.warn(CatalogWarning::UnknownStatus { value, line });
                    }
                }
            }
        }

        let mut text = String::new();
        let mut forms = Vec::new();
        loop {
            match self.next_event()? {
                Event::Text(chunk) => text.push_str(&self.unescape(chunk.unescape())?),
                Event::CData(chunk) => {
                    let decoded = self.reader.decoder().decode(&chunk);
                    text.push_str(&self.unescape(decoded)?);
                }
                Event::Start(child) => match child.name().as_ref() {
                    b"numerusform" => forms.push(self.read_text("numerusform")?),
                    b"byte" => self.read_byte(&child, &mut text)?,
                    _ => self.skip_element(&child)?,
                },
                Event::End(_) => break,
                Event::Eof => return Err(self.unexpected_eof("translation")),
                _ => {}
            }
        }

        let translation = if numerus {
            if forms.is_empty() && !text.trim().is_empty() {
                forms.push(text);
            }
            Translation::Plural(forms)
        } else if let Some(first) = forms.into_iter().next() {
            Translation::Single(first)
        } else {
            Translation::Single(text)
        };
        Ok((translation, status))
    }

    fn read_location(&mut self, start: &BytesStart<'i>) -> Result<Location, CatalogParseError> {
        let mut filename = None;
        let mut line_attr = None;
        for (key, value) in self.attributes(start)? {
            match key.as_str() {
                "filename" => filename = Some(value),
                "line" => line_attr = Some(value),
                _ => {}
            }
        }
        self.reader
            .read_to_end(start.name())
            .map_err(|err| self.error(err))?;

        let filename = filename
            .or_else(|| self.location_file.clone())
            .unwrap_or_default();
        let base = self.location_lines.get(&filename).copied().unwrap_or(0);

        let line = match line_attr {
            None => None,
            Some(value) => match resolve_line(&value, base) {
                Some(line) => Some(line),
                None => {
                    let at = self.line();
                    self.warn(CatalogWarning::InvalidLocation { value, line: at });
                    None
                }
            },
        };
        if let Some(line) = line {
            self.location_lines.insert(filename.clone(), line);
        }
        self.location_file = Some(filename.clone());
        Ok(Location { filename, line })
    }

    fn read_text(&mut self, element: &str) -> Result<String, CatalogParseError> {
        let mut text = String::new();
        loop {
            match self.next_event()? {
                Event::Text(chunk) => text.push_str(&self.unescape(chunk.unescape())?),
                Event::CData(chunk) => {
                    let decoded = self.reader.decoder().decode(&chunk);
                    text.push_str(&self.unescape(decoded)?);
                }
                Event::Start(child) if child.name().as_ref() == b"byte" => {
                    self.read_byte(&child, &mut text)?;
                }
                Event::Start(child) => self.skip_element(&child)?,
                Event::End(_) => return Ok(text),
                Event::Eof => return Err(self.unexpected_eof(element)),
                _ => {}
            }
        }
    }

    /// `<byte value="x1b"/>` carries a character XML cannot hold literally.
    fn read_byte(
        &mut self,
        start: &BytesStart<'i>,
        text: &mut String,
    ) -> Result<(), CatalogParseError> {
        let value = self
            .attributes(start)?
            .into_iter()
            .find(|(key, _)| key == "value")
            .map(|(_, value)| value);
        self.reader
            .read_to_end(start.name())
            .map_err(|err| self.error(err))?;

        let decoded = value.as_deref().and_then(|value| {
            let hex = value.strip_prefix("0x").or_else(|| value.strip_prefix('x'));
            let code = match hex {
                Some(hex) => u32::from_str_radix(hex, 16).ok(),
                None => value.parse::<u32>().ok(),
            };
            code.and_then(char::from_u32)
        });
        match decoded {
            Some(ch) => text.push(ch),
            None => {
                let line = self.line();
                self.warn(CatalogWarning::UnknownElement {
                    element: format!("byte value=\"{}\"", value.unwrap_or_default()),
                    line,
                });
            }
        }
        Ok(())
    }

    fn skip_element(&mut self, start: &BytesStart<'i>) -> Result<(), CatalogParseError> {
        let element = element_name(start).into_owned();
        let line = self.line();
        self.reader
            .read_to_end(start.name())
            .map_err(|err| self.error(err))?;
        self.warn(CatalogWarning::UnknownElement { element, line });
        Ok(())
    }

    fn attributes(
        &self,
        start: &BytesStart<'i>,
    ) -> Result<Vec<(String, String)>, CatalogParseError> {
        let mut attributes = Vec::new();
        for attribute in start.attributes() {
            let attribute = attribute.map_err(|err| self.error(err))?;
            let key = String::from_utf8_lossy(attribute.key.as_ref()).into_owned();
            let value = attribute
                .decode_and_unescape_value(&self.reader)
                .map_err(|err| self.error(err))?;
            attributes.push((key, value.into_owned()));
        }
        Ok(attributes)
    }

    fn next_event(&mut self) -> Result<Event<'i>, CatalogParseError> {
        self.reader.read_event().map_err(|err| self.error(err))
    }

    fn unescape<'a>(
        &self,
        result: Result<Cow<'a, str>, quick_xml::Error>,
    ) -> Result<Cow<'a, str>, CatalogParseError> {
        result.map_err(|err| self.error(err))
    }

    fn warn(&mut self, warning: CatalogWarning) {
        tracing::warn!(catalog = %self.path.display(), "{warning}");
        self.catalog.push_warning(warning);
    }

    fn line(&self) -> usize {
        line_at(self.input, self.reader.buffer_position())
    }

    fn error(&self, message: impl Display) -> CatalogParseError {
        self.error_at(self.reader.buffer_position(), message)
    }

    fn error_at(&self, position: usize, message: impl Display) -> CatalogParseError {
        CatalogParseError {
            path: self.path.clone(),
            line: line_at(self.input, position),
            message: message.to_string(),
        }
    }

    fn unexpected_eof(&self, element: &str) -> CatalogParseError {
        self.error(format!("unexpected end of document inside <{element}>"))
    }
}

fn element_name<'a>(start: &'a BytesStart<'_>) -> Cow<'a, str> {
    String::from_utf8_lossy(start.name().into_inner())
}

/// Absolute (`"57"`) or relative (`"+3"`, `"-2"`) location lines.
fn resolve_line(value: &str, base: u32) -> Option<u32> {
    let value = value.trim();
    if let Some(delta) = value.strip_prefix('+') {
        return base.checked_add(delta.parse().ok()?);
    }
    if let Some(delta) = value.strip_prefix('-') {
        return base.checked_sub(delta.parse().ok()?);
    }
    value.parse().ok()
}

fn line_at(input: &[u8], position: usize) -> usize {
    let end = position.min(input.len());
    input[..end].iter().filter(|byte| **byte == b'\n').count() + 1
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = r#"<?xml version="1.0" ?><!DOCTYPE TS><TS version="2.0" language="uk">"#;

    fn parse(body: &str) -> Catalog {
        Catalog::from_ts_str(&format!("{HEADER}\n{body}\n</TS>")).expect("parse")
    }

    #[test]
    fn relative_locations_resolve_against_previous_entry() {
        let catalog = parse(
            r#"<context>
    <name>ListView</name>
    <message>
        <location filename="ListView.py" line="100"/>
        <location line="+5"/>
        <location filename="Other.py" line="+2"/>
        <source>Delete</source>
        <translation>Видалити</translation>
    </message>
</context>"#,
        );
        let message = &catalog.contexts()[0].messages()[0];
        assert_eq!(
            message.locations,
            vec![
                Location::new("ListView.py", 100),
                Location::new("ListView.py", 105),
                Location::new("Other.py", 2),
            ]
        );
    }

    #[test]
    fn relative_locations_track_each_file_separately() {
        let catalog = parse(
            r#"<context>
    <name>ListView</name>
    <message>
        <location filename="ListView.py" line="+100"/>
        <source>Delete</source>
        <translation>Видалити</translation>
    </message>
    <message>
        <location filename="Collection.py" line="+5"/>
        <source>Open</source>
        <translation>Відкрити</translation>
    </message>
    <message>
        <location filename="ListView.py" line="+2"/>
        <location line="-1"/>
        <source>Copy</source>
        <translation>Копіювати</translation>
    </message>
</context>"#,
        );
        let locations: Vec<_> = catalog.contexts()[0]
            .messages()
            .iter()
            .flat_map(|message| message.locations.iter().cloned())
            .collect();
        assert_eq!(
            locations,
            vec![
                Location::new("ListView.py", 100),
                Location::new("Collection.py", 5),
                Location::new("ListView.py", 102),
                Location::new("ListView.py", 101),
            ]
        );
    }

    #[test]
    fn unknown_elements_are_skipped_with_warning() {
        let catalog = parse(
            r#"<dependencies><dependency catalog="qtbase"/></dependencies>
<context>
    <name>MainWindow</name>
    <message>
        <source>Exit</source>
        <userdata>x</userdata>
        <translation>Вихід</translation>
    </message>
</context>"#,
        );
        assert_eq!(catalog.message_count(), 1);
        let skipped: Vec<_> = catalog
            .warnings()
            .iter()
            .filter_map(|warning| match warning {
                CatalogWarning::UnknownElement { element, .. } => Some(element.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(skipped, vec!["dependencies", "userdata"]);
    }

    #[test]
    fn byte_elements_decode_control_characters() {
        let catalog = parse(
            r#"<context>
    <name>Escape</name>
    <message>
        <source>a<byte value="x9"/>b</source>
        <translation>c<byte value="10"/>d<byte value="0x1b"/></translation>
    </message>
</context>"#,
        );
        let message = &catalog.contexts()[0].messages()[0];
        assert_eq!(message.source, "a\tb");
        assert_eq!(message.translation, Translation::Single("c\nd\u{1b}".into()));
    }

    #[test]
    fn message_without_translation_reports_line() {
        let xml = format!(
            "{HEADER}\n<context>\n<name>A</name>\n<message>\n<source>Oops</source>\n</message>\n</context>\n</TS>"
        );
        let error = Catalog::from_ts_str(&xml).unwrap_err();
        assert_eq!(error.line, 4);
        assert!(error.message.contains("Oops"), "{}", error.message);
        assert_eq!(error.path, PathBuf::from("<memory>"));
    }

    #[test]
    fn utf8_bom_is_ignored() {
        let mut bytes = UTF8_BOM.to_vec();
        bytes.extend_from_slice(
            format!("{HEADER}<context><name>A</name></context></TS>").as_bytes(),
        );
        let catalog = Catalog::from_ts_bytes(&bytes, "lang_uk.ts").expect("parse");
        assert_eq!(catalog.language(), "uk");
    }

    #[test]
    fn resolve_line_handles_signs() {
        assert_eq!(resolve_line("12", 0), Some(12));
        assert_eq!(resolve_line("+3", 10), Some(13));
        assert_eq!(resolve_line("-3", 10), Some(7));
        assert_eq!(resolve_line("-30", 10), None);
        assert_eq!(resolve_line("abc", 10), None);
    }
}
