//! Field-level validation for the two submission forms. An invalid submission never
//! reaches the datastore: handlers answer 200 with the field errors in the body, the way
//! the original pages re-render the form inline, and persist nothing.
use crate::datastore::structs::ImageKind;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Field errors keyed by field name.
#[derive(Debug, Default, Serialize, PartialEq, Eq)]
pub struct FormErrors {
    pub errors: BTreeMap<&'static str, &'static str>,
}

impl FormErrors {
    /// An error set with a single field error, for checks done outside the form itself.
    pub fn single(field: &'static str, message: &'static str) -> Self {
        let mut errors = Self::default();
        errors.add(field, message);
        errors
    }

    fn add(&mut self, field: &'static str, message: &'static str) {
        self.errors.insert(field, message);
    }

    fn or_valid<T>(self, input: T) -> Result<T, FormErrors> {
        if self.errors.is_empty() {
            Ok(input)
        } else {
            Err(self)
        }
    }
}

/// The new/edit post form. `group` holds a group slug, `image` a base64-encoded file.
/// Empty strings count as absent, which is how HTML forms submit untouched fields.
#[derive(Debug, Deserialize)]
pub struct PostForm {
    pub text: String,
    pub group: Option<String>,
    pub image: Option<String>,
}

/// A post form that passed validation, with the image decoded and format-checked.
#[derive(Debug)]
pub struct PostInput {
    pub text: String,
    pub group_slug: Option<String>,
    pub image: Option<(Vec<u8>, ImageKind)>,
}

impl PostForm {
    pub fn validate(self) -> Result<PostInput, FormErrors> {
        let mut errors = FormErrors::default();

        let text = self.text.trim().to_owned();
        if text.is_empty() {
            errors.add("text", "This field is required.");
        }

        let group_slug = self.group.filter(|slug| !slug.is_empty());

        let image = match self.image.filter(|encoded| !encoded.is_empty()) {
            None => None,
            Some(encoded) => match base64::decode(&encoded) {
                Err(_) => {
                    errors.add("image", "Couldn't decode the uploaded file.");
                    None
                }
                Ok(bytes) => match sniff_image(&bytes) {
                    Some(kind) => Some((bytes, kind)),
                    None => {
                        errors.add("image", "Upload a GIF, PNG or JPEG image.");
                        None
                    }
                },
            },
        };

        errors.or_valid(PostInput {
            text,
            group_slug,
            image,
        })
    }
}

/// The add-comment form.
#[derive(Debug, Deserialize)]
pub struct CommentForm {
    pub text: String,
}

impl CommentForm {
    pub fn validate(self) -> Result<String, FormErrors> {
        let mut errors = FormErrors::default();
        let text = self.text.trim().to_owned();
        if text.is_empty() {
            errors.add("text", "This field is required.");
        }
        errors.or_valid(text)
    }
}

/// Identify an image format from its magic number. Anything unrecognized is rejected.
pub fn sniff_image(bytes: &[u8]) -> Option<ImageKind> {
    if bytes.starts_with(b"GIF87a") || bytes.starts_with(b"GIF89a") {
        Some(ImageKind::Gif)
    } else if bytes.starts_with(&[0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a]) {
        Some(ImageKind::Png)
    } else if bytes.starts_with(&[0xff, 0xd8, 0xff]) {
        Some(ImageKind::Jpeg)
    } else {
        None
    }
}
