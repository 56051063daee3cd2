//! Doc comment parsing.
//!
//! Extracts per-parameter type names and descriptions from a callable's doc
//! comment. Two layouts are understood.
//!
//! Google style:
//!
//! ```text
//! Train the model.
//!
//! Args:
//!     lr (float): learning rate
//!     epochs (int, optional): number of passes
//!         over the data
//! ```
//!
//! Rustdoc style:
//!
//! ```text
//! Train the model.
//!
//! # Arguments
//!
//! * `lr` (float) - learning rate
//! * `epochs` - number of passes
//! ```
//!
//! Type names are kept as text; they are only turned into a
//! [`TypeExpr`](crate::TypeExpr) when the signature declares no type.

/// One documented parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocParam {
    pub name: String,
    pub type_name: Option<String>,
    pub description: String,
}

/// The parts of a doc comment relevant to argument synthesis.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocComment {
    /// First paragraph, joined into one line.
    pub summary: Option<String>,
    pub params: Vec<DocParam>,
}

impl DocComment {
    /// Looks up a documented parameter by name.
    pub fn param(&self, name: &str) -> Option<&DocParam> {
        self.params.iter().find(|p| p.name == name)
    }
}

const GOOGLE_HEADERS: &[&str] = &["Args:", "Arguments:", "Parameters:", "Params:"];
const RUSTDOC_HEADERS: &[&str] = &["arguments", "args", "parameters", "params"];

/// Parses a doc comment. An absent or empty comment yields no parameters.
pub fn parse_doc(text: &str) -> DocComment {
    let lines = normalize(text);
    DocComment {
        summary: summary(&lines),
        params: params(&lines),
    }
}

fn indent_of(line: &str) -> usize {
    line.len() - line.trim_start().len()
}

fn normalize(text: &str) -> Vec<String> {
    // sections are read by relative indentation, so only the first line,
    // which often sits right after the opening `///`, needs trimming
    text.lines()
        .enumerate()
        .map(|(i, l)| {
            if i == 0 {
                l.trim().to_string()
            } else {
                l.trim_end().to_string()
            }
        })
        .collect()
}

fn summary(lines: &[String]) -> Option<String> {
    let paragraph: Vec<&str> = lines
        .iter()
        .map(|l| l.trim())
        .skip_while(|l| l.is_empty())
        .take_while(|l| !l.is_empty())
        .collect();
    let first = paragraph.first()?;
    if GOOGLE_HEADERS.contains(first) || first.starts_with('#') {
        return None;
    }
    Some(paragraph.join(" "))
}

fn rustdoc_header(line: &str) -> Option<bool> {
    let title = line.strip_prefix('#')?.trim_start_matches('#').trim();
    Some(RUSTDOC_HEADERS.contains(&title.to_ascii_lowercase().as_str()))
}

#[derive(Clone, Copy)]
enum Section {
    None,
    Google { header_indent: usize },
    Rustdoc,
}

fn params(lines: &[String]) -> Vec<DocParam> {
    let mut section = Section::None;
    let mut params: Vec<DocParam> = Vec::new();
    let mut entry_indent: Option<usize> = None;

    for line in lines {
        let trimmed = line.trim();
        let indent = indent_of(line);

        if let Some(is_args) = rustdoc_header(trimmed) {
            section = if is_args {
                Section::Rustdoc
            } else {
                Section::None
            };
            entry_indent = None;
            continue;
        }
        if GOOGLE_HEADERS.contains(&trimmed) {
            section = Section::Google {
                header_indent: indent,
            };
            entry_indent = None;
            continue;
        }
        if trimmed.is_empty() {
            continue;
        }

        match section {
            Section::None => {}
            Section::Google { header_indent } => {
                if indent <= header_indent {
                    section = Section::None;
                    entry_indent = None;
                    continue;
                }
                match entry_indent {
                    Some(level) if indent > level => append(&mut params, trimmed),
                    _ => {
                        if let Some(param) = google_entry(trimmed) {
                            entry_indent = Some(indent);
                            params.push(param);
                        }
                    }
                }
            }
            Section::Rustdoc => {
                if let Some(param) = rustdoc_entry(trimmed) {
                    entry_indent = Some(indent);
                    params.push(param);
                } else if entry_indent.is_some_and(|level| indent > level) {
                    append(&mut params, trimmed);
                }
            }
        }
    }

    params
}

fn append(params: &mut [DocParam], text: &str) {
    if let Some(last) = params.last_mut() {
        if !last.description.is_empty() {
            last.description.push(' ');
        }
        last.description.push_str(text);
    }
}

fn is_name_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '*'
}

/// Splits a leading `(type)` off `rest`, honouring nested brackets.
fn split_type(rest: &str) -> Option<(String, &str)> {
    let inner = rest.strip_prefix('(')?;
    let mut depth = 0usize;
    for (i, c) in inner.char_indices() {
        match c {
            '(' | '[' | '<' => depth += 1,
            ']' | '>' => depth = depth.saturating_sub(1),
            ')' if depth == 0 => {
                let ty = inner[..i].trim();
                let ty = ty.strip_suffix(", optional").unwrap_or(ty).trim();
                return Some((ty.to_string(), inner[i + 1..].trim_start()));
            }
            ')' => depth -= 1,
            _ => {}
        }
    }
    None
}

fn google_entry(line: &str) -> Option<DocParam> {
    let name_end = line.find(|c: char| !is_name_char(c)).unwrap_or(line.len());
    if name_end == 0 {
        return None;
    }
    let name = line[..name_end].trim_start_matches('*').to_string();
    let rest = line[name_end..].trim_start();
    let (type_name, rest) = match split_type(rest) {
        Some((ty, rest)) => (Some(ty), rest),
        None => (None, rest),
    };
    let description = rest.strip_prefix(':')?.trim().to_string();
    Some(DocParam {
        name,
        type_name: type_name.filter(|t| !t.is_empty()),
        description,
    })
}

fn rustdoc_entry(line: &str) -> Option<DocParam> {
    let rest = line
        .strip_prefix('*')
        .or_else(|| line.strip_prefix('-'))?
        .trim_start();
    let rest = rest.strip_prefix('`')?;
    let close = rest.find('`')?;
    let name = rest[..close].to_string();
    let rest = rest[close + 1..].trim_start();
    let (type_name, rest) = match split_type(rest) {
        Some((ty, rest)) => (Some(ty), rest),
        None => (None, rest),
    };
    let description = rest
        .strip_prefix('-')
        .or_else(|| rest.strip_prefix(':'))
        .unwrap_or(rest)
        .trim()
        .to_string();
    Some(DocParam {
        name,
        type_name: type_name.filter(|t| !t.is_empty()),
        description,
    })
}
