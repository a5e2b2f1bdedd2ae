//! Image-transformation URL builder
//!
//! The CDN applies transformations encoded directly in a hosted file's URL:
//! `scheme://host/<project>/<file>/[op1,op2,.../]<stem><ext>`. [`UplyImage`]
//! accumulates operation tokens through chainable methods and reassembles
//! the URL on demand. Operation order is insertion order; the CDN applies
//! operations left to right.

use crate::{Error, Result};
use url::Url;

/// Builder for transformation URLs of one hosted image.
///
/// Parsing strips any operation segment already embedded in the URL, so a
/// previously transformed URL re-parses to a clean builder.
#[derive(Debug, Clone, PartialEq)]
pub struct UplyImage {
    base_url: String,
    stem: String,
    extension: String,
    operations: Vec<String>,
}

fn is_path_word(segment: &str) -> bool {
    !segment.is_empty()
        && segment
            .chars()
            .all(|c| c.is_alphanumeric() || c == '_')
}

/// Split a file name into `(stem, extension)`; the extension keeps its
/// leading dot. Leading dots alone never count as an extension.
fn split_extension(name: &str) -> (String, String) {
    let first_non_dot = name.find(|c| c != '.');
    match (first_non_dot, name.rfind('.')) {
        (Some(start), Some(dot)) if dot > start => {
            (name[..dot].to_string(), name[dot..].to_string())
        }
        _ => (name.to_string(), String::new()),
    }
}

impl UplyImage {
    /// Parse a hosted file's URL.
    ///
    /// The first two path segments are the project and file identifiers and
    /// must be word characters; anything between them and the trailing file
    /// name (an old operation segment, for instance) is discarded.
    pub fn parse(input: &str) -> Result<Self> {
        let parsed = Url::parse(input)
            .map_err(|e| Error::InvalidPath(format!("{}: {}", input, e)))?;

        let mut segments = parsed
            .path_segments()
            .ok_or_else(|| Error::InvalidPath(format!("{} has no path", input)))?;

        let project = segments
            .next()
            .filter(|s| is_path_word(s))
            .ok_or_else(|| Error::InvalidPath(format!("{} is missing a project segment", input)))?;
        let file_id = segments
            .next()
            .filter(|s| is_path_word(s))
            .ok_or_else(|| Error::InvalidPath(format!("{} is missing a file segment", input)))?;

        let rest: Vec<&str> = segments.collect();
        // The identifier prefix must end in '/', i.e. a third path
        // component exists even if it is empty.
        let file_name = *rest
            .last()
            .ok_or_else(|| Error::InvalidPath(format!("{} is missing a file name slot", input)))?;

        let host = parsed
            .host_str()
            .ok_or_else(|| Error::InvalidPath(format!("{} has no host", input)))?;
        let authority = match parsed.port() {
            Some(port) => format!("{}:{}", host, port),
            None => host.to_string(),
        };

        let base_url = format!("{}://{}/{}/{}/", parsed.scheme(), authority, project, file_id);
        let (stem, extension) = split_extension(file_name);

        Ok(Self {
            base_url,
            stem,
            extension,
            operations: Vec::new(),
        })
    }

    /// Clean URL prefix, always ending in `/`.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn stem(&self) -> &str {
        &self.stem
    }

    /// Current extension including the leading dot, or empty.
    pub fn extension(&self) -> &str {
        &self.extension
    }

    pub fn operations(&self) -> &[String] {
        &self.operations
    }

    /// Reassemble the transformation URL. Pure and repeatable; with no
    /// operations the clean file URL comes back unchanged.
    pub fn url(&self) -> String {
        if self.operations.is_empty() {
            format!("{}{}{}", self.base_url, self.stem, self.extension)
        } else {
            format!(
                "{}{}/{}{}",
                self.base_url,
                self.operations.join(","),
                self.stem,
                self.extension
            )
        }
    }

    fn push(mut self, token: String) -> Self {
        self.operations.push(token);
        self
    }

    fn strength_op(self, name: &str, strength: Option<i64>) -> Self {
        match strength {
            Some(value) => self.push(format!("{}:{}", name, value)),
            None => self.push(name.to_string()),
        }
    }

    // Faces

    pub fn avatar(self, size: Option<i64>) -> Self {
        self.strength_op("avatar", size)
    }

    pub fn face_mark(self) -> Self {
        self.push("face_mark".to_string())
    }

    pub fn face_crop(self, face_index: Option<i64>, align: bool) -> Self {
        let mut token = String::from("face_crop");
        if let Some(index) = face_index {
            token.push_str(&format!(":{}", index));
        }
        if align {
            token.push_str(":align");
        }
        self.push(token)
    }

    // File options

    pub fn autoformat(self) -> Self {
        self.push("autoformat".to_string())
    }

    pub fn download(self) -> Self {
        self.push("download".to_string())
    }

    pub fn quality(self, value: &str) -> Self {
        self.push(format!("quality:{}", value))
    }

    pub fn progressive(self) -> Self {
        self.push("progressive".to_string())
    }

    // Filters

    pub fn blur(self, strength: Option<i64>) -> Self {
        self.strength_op("blur", strength)
    }

    pub fn median(self, strength: Option<i64>) -> Self {
        self.strength_op("median", strength)
    }

    pub fn bilateral(self, strength: Option<i64>) -> Self {
        self.strength_op("bilateral", strength)
    }

    pub fn sharpen(self, strength: Option<i64>) -> Self {
        self.strength_op("sharpen", strength)
    }

    pub fn autocontrast(self, strength: Option<i64>) -> Self {
        self.strength_op("autocontrast", strength)
    }

    /// Token is `bw`, not the method name.
    pub fn black_and_white(self) -> Self {
        self.push("bw".to_string())
    }

    pub fn invert(self) -> Self {
        self.push("invert".to_string())
    }

    // Art filters

    pub fn duotone(self, first: &str, second: &str) -> Self {
        self.push(format!("duotone:{}:{}", first, second))
    }

    pub fn pixelate(
        self,
        strength: Option<i64>,
        colors: Option<i64>,
        marker: Option<&str>,
    ) -> Self {
        let mut token = String::from("pixelate");
        if let Some(value) = strength {
            token.push_str(&format!(":{}", value));
        }
        if let Some(value) = colors {
            token.push_str(&format!(":{}", value));
        }
        if let Some(value) = marker {
            token.push_str(&format!(":{}", value));
        }
        self.push(token)
    }

    pub fn enhance(self) -> Self {
        self.push("enhance".to_string())
    }

    pub fn mono(self) -> Self {
        self.push("mono".to_string())
    }

    pub fn golden(self) -> Self {
        self.push("golden".to_string())
    }

    // Resizing

    pub fn resize(self, width: i64, height: i64) -> Self {
        self.push(format!("resize:{}:{}", width, height))
    }

    /// One-dimension resize from a spec like `w200`, `200w`, `h100` or
    /// `100h`; the marker is canonicalized to the front. A spec without a
    /// `w`/`h` marker appends nothing.
    pub fn resize_edge(self, spec: &str) -> Self {
        let value = spec.trim_matches(|c: char| c == 'w' || c == 'h');
        if spec.starts_with('w') || spec.ends_with('w') {
            self.push(format!("resize:w{}", value))
        } else if spec.starts_with('h') || spec.ends_with('h') {
            self.push(format!("resize:h{}", value))
        } else {
            tracing::warn!("resize spec {:?} has no w/h marker, skipping", spec);
            self
        }
    }

    pub fn crop(self, width: i64, height: i64) -> Self {
        self.push(format!("crop:{}:{}", width, height))
    }

    /// Anchored crop. Only `center` is a valid anchor; any other value
    /// appends nothing.
    pub fn crop_anchored(self, width: i64, height: i64, anchor: &str) -> Self {
        if anchor == "center" {
            self.push(format!("crop:{}:{}:center", width, height))
        } else {
            tracing::warn!("crop anchor {:?} is not supported, skipping", anchor);
            self
        }
    }

    pub fn crop_region(self, width: i64, height: i64, x: i64, y: i64) -> Self {
        self.push(format!("crop:{}:{}:{}:{}", width, height, x, y))
    }

    pub fn fit(self, width: i64, height: i64) -> Self {
        self.push(format!("fit:{}:{}", width, height))
    }

    pub fn fit_crop(self, width: i64, height: i64) -> Self {
        self.push(format!("fit_crop:{}:{}", width, height))
    }

    // Transformation

    pub fn rotate(self, angle: Option<i64>) -> Self {
        self.strength_op("rotate", angle)
    }

    pub fn mirror(self) -> Self {
        self.push("mirror".to_string())
    }

    pub fn flip(self) -> Self {
        self.push("flip".to_string())
    }

    pub fn autorotate(self) -> Self {
        self.push("autorotate".to_string())
    }

    // Editing

    pub fn bg_color(self, value: Option<&str>) -> Self {
        match value {
            Some(color) => self.push(format!("bg_color:{}", color)),
            None => self,
        }
    }

    // Format

    /// Override the output extension. Never enters the operation list;
    /// repeat calls keep the last non-empty value.
    pub fn format(mut self, new_extension: Option<&str>) -> Self {
        if let Some(ext) = new_extension {
            if !ext.is_empty() {
                self.extension = format!(".{}", ext);
            }
        }
        self
    }
}
