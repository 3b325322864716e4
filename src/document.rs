use std::collections::HashMap;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use quick_xml::events::Event;
use quick_xml::Reader;
use walkdir::WalkDir;

use crate::error::Error;

/// Metadata fields present in the corpus export that the pipeline never uses.
pub const IGNORED_FIELDS: &[&str] = &[
    "show",
    "hide_url",
    "hide_blurb",
    "modified",
    "date_modified",
    "_version_",
];

/// A typed field of a case document. Dates stay as strings.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Str(String),
    Bool(bool),
    Long(i64),
    Float(f64),
    Arr(Vec<FieldValue>),
}

fn str2bool(text: &str) -> bool {
    matches!(text.to_lowercase().as_str(), "yes" | "true" | "t" | "1")
}

fn parse_field_value(tag: &str, text: String) -> Result<FieldValue, String> {
    match tag {
        "str" | "date" => Ok(FieldValue::Str(text)),
        "bool" => Ok(FieldValue::Bool(str2bool(&text))),
        "long" => text
            .trim()
            .parse()
            .map(FieldValue::Long)
            .map_err(|e| format!("bad long value {:?}: {}", text, e)),
        "float" => text
            .trim()
            .parse()
            .map(FieldValue::Float)
            .map_err(|e| format!("bad float value {:?}: {}", text, e)),
        other => Err(format!("unsupported field tag <{}>", other)),
    }
}

/// Extracts every non-ignored field of a case document. The corpus format is
/// a flat element whose children are `<str name="...">`, `<long name="...">`
/// and so on; `<arr>` nests one level of the same typed elements.
pub fn extract_fields(path: &Path) -> Result<HashMap<String, FieldValue>, Error> {
    let corpus_err = |message: String| Error::Corpus {
        path: path.to_path_buf(),
        message,
    };

    let file = File::open(path).map_err(|e| corpus_err(e.to_string()))?;
    let mut xml_reader = Reader::from_reader(BufReader::new(file));
    xml_reader.trim_text(true);

    let mut fields = HashMap::new();
    let mut buf = Vec::new();
    let mut depth = 0usize;
    // (field name, element tag) of the field currently being read.
    let mut current_field: Option<(String, String)> = None;
    let mut current_text = String::new();
    let mut arr_items: Vec<FieldValue> = Vec::new();
    let mut arr_item_tag = String::new();

    loop {
        match xml_reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => {
                depth += 1;
                let tag = String::from_utf8_lossy(e.name().as_ref()).to_string();
                if depth == 2 {
                    let name = e
                        .try_get_attribute("name")
                        .map_err(|e| corpus_err(e.to_string()))?
                        .map(|attr| {
                            attr.unescape_value()
                                .map(|v| v.to_string())
                                .map_err(|e| corpus_err(e.to_string()))
                        })
                        .transpose()?
                        .unwrap_or_default();
                    if tag != "arr" && tag != "str" && tag != "date" && tag != "bool"
                        && tag != "long" && tag != "float"
                    {
                        return Err(corpus_err(format!("unsupported field tag <{}>", tag)));
                    }
                    current_field = Some((name, tag));
                    current_text.clear();
                    arr_items.clear();
                } else if depth == 3 {
                    arr_item_tag = tag;
                    current_text.clear();
                }
            }
            Ok(Event::Text(e)) => {
                let text = e.unescape().map_err(|e| corpus_err(e.to_string()))?;
                current_text.push_str(&text);
            }
            Ok(Event::End(_)) => {
                if depth == 3 {
                    let value = parse_field_value(&arr_item_tag, std::mem::take(&mut current_text))
                        .map_err(corpus_err)?;
                    arr_items.push(value);
                } else if depth == 2 {
                    if let Some((name, tag)) = current_field.take() {
                        let value = if tag == "arr" {
                            FieldValue::Arr(std::mem::take(&mut arr_items))
                        } else {
                            parse_field_value(&tag, std::mem::take(&mut current_text))
                                .map_err(corpus_err)?
                        };
                        if !IGNORED_FIELDS.contains(&name.as_str()) {
                            fields.insert(name, value);
                        }
                    }
                }
                depth = depth.saturating_sub(1);
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(corpus_err(e.to_string())),
            _ => {}
        }
        buf.clear();
    }

    Ok(fields)
}

/// The `content` field of a case document, the only field the index consumes.
pub fn extract_content(path: &Path) -> Result<String, Error> {
    let mut fields = extract_fields(path)?;
    match fields.remove("content") {
        Some(FieldValue::Str(content)) => Ok(content),
        _ => Err(Error::Corpus {
            path: path.to_path_buf(),
            message: "missing content field".to_string(),
        }),
    }
}

/// All `<doc_id>.xml` files under the corpus directory, ascending by integer
/// id. Files whose stem is not an integer are not corpus documents and are
/// skipped. The ascending order is what lets merged postings stay sorted.
pub fn collect_case_files(directory: &Path) -> Vec<(u32, PathBuf)> {
    let mut files: Vec<(u32, PathBuf)> = WalkDir::new(directory)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter(|e| e.path().extension().map_or(false, |ext| ext == "xml"))
        .filter_map(|e| {
            let doc_id = e.path().file_stem()?.to_str()?.parse().ok()?;
            Some((doc_id, e.path().to_path_buf()))
        })
        .collect();
    files.sort_by_key(|(doc_id, _)| *doc_id);
    files
}
