use std::collections::HashMap;

/// Line/column lookup for JSON-pointer paths into block-style YAML.
///
/// Positions come from a line scan, not from the YAML parser. Flow
/// collections (`{...}`, `[...]`) are not descended into; pointers that land
/// inside one resolve to the closest located ancestor. Document markers are
/// skipped, so a multi-document stream is mapped as if it were one document.
#[derive(Debug, Clone, Default)]
pub struct SourceMap {
    positions: HashMap<String, (usize, usize)>,
}

#[derive(Debug)]
struct Frame {
    indent: usize,
    pointer: String,
    is_item: bool,
}

impl SourceMap {
    pub fn from_yaml(text: &str) -> Self {
        let mut positions = HashMap::new();
        let mut stack: Vec<Frame> = Vec::new();
        let mut item_counters: HashMap<String, usize> = HashMap::new();

        for (index, raw) in text.lines().enumerate() {
            let line = index + 1;
            let trimmed = raw.trim_start();
            if trimmed.is_empty() || trimmed.starts_with('#') || trimmed.starts_with("---") {
                continue;
            }
            let mut indent = raw.len() - trimmed.len();
            let mut content = trimmed;

            while let Some(rest) = content.strip_prefix("- ").or_else(|| {
                if content == "-" { Some("") } else { None }
            }) {
                while stack
                    .last()
                    .is_some_and(|f| f.indent > indent || (f.indent == indent && f.is_item))
                {
                    stack.pop();
                }
                let parent = stack.last().map(|f| f.pointer.clone()).unwrap_or_default();
                let counter = item_counters.entry(parent.clone()).or_insert(0);
                let pointer = format!("{parent}/{counter}");
                *counter += 1;
                positions.entry(pointer.clone()).or_insert((line, indent + 1));
                stack.push(Frame {
                    indent,
                    pointer,
                    is_item: true,
                });
                let skipped = content.len() - rest.len();
                let rest_trimmed = rest.trim_start();
                indent += skipped + (rest.len() - rest_trimmed.len());
                content = rest_trimmed;
                if content.is_empty() {
                    break;
                }
            }

            let Some(key) = mapping_key(content) else {
                continue;
            };
            while stack.last().is_some_and(|f| f.indent >= indent) {
                stack.pop();
            }
            let parent = stack.last().map(|f| f.pointer.as_str()).unwrap_or("");
            let pointer = format!("{parent}/{}", escape_segment(&key));
            positions.entry(pointer.clone()).or_insert((line, indent + 1));
            item_counters.remove(&pointer);
            stack.push(Frame {
                indent,
                pointer,
                is_item: false,
            });
        }

        Self { positions }
    }

    /// Position of `pointer`, falling back to the nearest located ancestor.
    pub fn locate(&self, pointer: &str) -> Option<(usize, usize)> {
        let mut current = pointer;
        loop {
            if let Some(position) = self.positions.get(current) {
                return Some(*position);
            }
            let (parent, _) = current.rsplit_once('/')?;
            current = parent;
        }
    }
}

/// Escapes a key for use as a JSON-pointer segment.
pub fn escape_segment(key: &str) -> String {
    key.replace('~', "~0").replace('/', "~1")
}

fn mapping_key(content: &str) -> Option<String> {
    if content.starts_with('{') || content.starts_with('[') {
        return None;
    }
    if let Some(quote) = content.chars().next().filter(|c| *c == '"' || *c == '\'') {
        let body = &content[1..];
        let end = body.find(quote)?;
        let after = &body[end + 1..];
        return after
            .starts_with(':')
            .then(|| body[..end].to_string());
    }
    let bytes = content.as_bytes();
    for (i, b) in bytes.iter().enumerate() {
        if *b == b':' && (i + 1 == bytes.len() || bytes[i + 1] == b' ') {
            return Some(content[..i].trim_end().to_string());
        }
    }
    None
}
